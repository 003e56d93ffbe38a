//! Core configuration → wgpu descriptors.

use std::num::NonZeroU64;

use resample_core::mesh::{AttributeFormat, MeshVertexLayout};
use resample_core::{AddressMode, BindingLayout, FilterMode, ResourceKind, SamplerConfig, ShaderStage};

pub fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Single-level sampler: the mipmap filter is never consulted.
pub fn sampler_descriptor(config: &SamplerConfig) -> wgpu::SamplerDescriptor<'static> {
    let filter = filter_mode(config.filter);
    wgpu::SamplerDescriptor {
        label: Some(match config.filter {
            FilterMode::Nearest => "resample_sampler_nearest",
            FilterMode::Linear => "resample_sampler_linear",
        }),
        address_mode_u: address_mode(config.address_u),
        address_mode_v: address_mode(config.address_v),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

pub fn shader_stages(stage: ShaderStage) -> wgpu::ShaderStages {
    let mut out = wgpu::ShaderStages::NONE;
    if stage.contains(ShaderStage::VERTEX) {
        out |= wgpu::ShaderStages::VERTEX;
    }
    if stage.contains(ShaderStage::FRAGMENT) {
        out |= wgpu::ShaderStages::FRAGMENT;
    }
    out
}

pub fn binding_type(kind: ResourceKind) -> wgpu::BindingType {
    match kind {
        ResourceKind::Texture2d { filterable } => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        ResourceKind::Sampler { filtering: true } => {
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
        }
        ResourceKind::Sampler { filtering: false } => {
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering)
        }
        ResourceKind::UniformBuffer { min_size } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(min_size),
        },
    }
}

pub fn layout_entries(layout: &BindingLayout) -> Vec<wgpu::BindGroupLayoutEntry> {
    layout
        .slots()
        .iter()
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: shader_stages(slot.visibility),
            ty: binding_type(slot.kind),
            count: None,
        })
        .collect()
}

pub fn create_bind_group_layout(
    device: &wgpu::Device,
    layout: &BindingLayout,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(layout.label()),
        entries: &layout_entries(layout),
    })
}

pub fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

pub fn vertex_attributes(layout: &MeshVertexLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .attributes()
        .iter()
        .map(|a| wgpu::VertexAttribute {
            format: vertex_format(a.format),
            offset: a.offset,
            shader_location: a.location,
        })
        .collect()
}
