use std::collections::hash_map::Entry;
use std::collections::HashMap;

use bitflags::bitflags;
use glam::Vec4;
use resample_core::{BindingLayout, FilterMode, FullscreenGeometry, SamplerConfig, Viewport};
use wgpu::{BindGroup, BindGroupLayout, Device, PipelineLayout, RenderPipeline, ShaderModule};

use crate::convert;
use crate::error::GpuError;
use crate::shaders::{
    FS_PLACEHOLDER, FS_RESAMPLE, PLACEHOLDER_CONSTANTS, RESAMPLE_WGSL, VS_FULLSCREEN_QUAD,
    VS_FULLSCREEN_TRIANGLE,
};

// ---------------------------------------------------------------------------
// Pipeline key
// ---------------------------------------------------------------------------

/// What the fragment stage does. The discriminant is packed into the top
/// bits of [`ResamplePipelineKey`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResampleMode {
    Filtering = 0,
    Nearest = 1,
    /// Sampling is bypassed; every pixel gets the placeholder colour.
    Placeholder = 2,
}

impl ResampleMode {
    pub fn from_filter(filter: FilterMode) -> Self {
        match filter {
            FilterMode::Linear => ResampleMode::Filtering,
            FilterMode::Nearest => ResampleMode::Nearest,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct ResamplePipelineKey: u32 {
        const NONE               = 0;
        const QUAD               = 1 << 0;
        const MODE_RESERVED_BITS = Self::MODE_MASK_BITS << Self::MODE_SHIFT_BITS;
    }
}

impl ResamplePipelineKey {
    const MODE_MASK_BITS: u32 = 0b1111; // room for 16 modes
    const MODE_SHIFT_BITS: u32 = 32 - 4;

    pub fn from_parts(mode: ResampleMode, geometry: FullscreenGeometry) -> Self {
        let mode_bits = ((mode as u32) & Self::MODE_MASK_BITS) << Self::MODE_SHIFT_BITS;
        let mut key = Self::from_bits_retain(mode_bits);
        if geometry == FullscreenGeometry::Quad {
            key |= Self::QUAD;
        }
        key
    }

    pub fn mode(&self) -> Result<ResampleMode, GpuError> {
        match (self.bits() >> Self::MODE_SHIFT_BITS) & Self::MODE_MASK_BITS {
            0 => Ok(ResampleMode::Filtering),
            1 => Ok(ResampleMode::Nearest),
            2 => Ok(ResampleMode::Placeholder),
            other => Err(GpuError::InvalidKey(other)),
        }
    }

    pub fn geometry(&self) -> FullscreenGeometry {
        if self.contains(Self::QUAD) {
            FullscreenGeometry::Quad
        } else {
            FullscreenGeometry::Triangle
        }
    }
}

// ---------------------------------------------------------------------------
// Per-draw settings
// ---------------------------------------------------------------------------

/// How one fullscreen draw samples its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResamplePass {
    pub sampler: SamplerConfig,
    pub geometry: FullscreenGeometry,
    pub placeholder: bool,
}

impl ResamplePass {
    pub fn mode(&self) -> ResampleMode {
        if self.placeholder {
            ResampleMode::Placeholder
        } else {
            ResampleMode::from_filter(self.sampler.filter)
        }
    }

    pub fn key(&self) -> ResamplePipelineKey {
        ResamplePipelineKey::from_parts(self.mode(), self.geometry)
    }
}

/// Where a draw lands.
#[derive(Debug, Clone, Copy)]
pub struct ResampleTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Restrict the draw to this rectangle and keep the rest of the target.
    pub viewport: Option<Viewport>,
}

impl<'a> ResampleTarget<'a> {
    pub fn whole(view: &'a wgpu::TextureView, format: wgpu::TextureFormat) -> Self {
        Self {
            view,
            format,
            viewport: None,
        }
    }

    pub fn tile(view: &'a wgpu::TextureView, format: wgpu::TextureFormat, viewport: Viewport) -> Self {
        Self {
            view,
            format,
            viewport: Some(viewport),
        }
    }
}

// ---------------------------------------------------------------------------
// ResamplePipeline
// ---------------------------------------------------------------------------

struct CachedBindGroup {
    view: wgpu::Id<wgpu::TextureView>,
    sampler: SamplerConfig,
    bind_group: BindGroup,
}

/// Fullscreen resample stage: one draw, one output colour per pixel, no
/// blending. Pipelines are specialized lazily per (key, target format).
pub struct ResamplePipeline {
    bind_group_layout: BindGroupLayout,
    resample_layout: PipelineLayout,
    /// The placeholder reads no bindings, so its layout is empty.
    placeholder_layout: PipelineLayout,
    module: ShaderModule,
    placeholder_color: Vec4,

    pipelines: HashMap<(ResamplePipelineKey, wgpu::TextureFormat), RenderPipeline>,
    samplers: HashMap<SamplerConfig, wgpu::Sampler>,
    cached_bind_group: Option<CachedBindGroup>,
    bind_group_builds: usize,
}

impl ResamplePipeline {
    pub fn new(device: &Device, placeholder_color: Vec4) -> Result<Self, GpuError> {
        let bindings = BindingLayout::resample();
        let bindings = BindingLayout::new(bindings.label(), bindings.slots().to_vec())?;
        let bind_group_layout = convert::create_bind_group_layout(device, &bindings);

        let resample_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("resample_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let placeholder_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("placeholder_pl"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("resample"),
            source: wgpu::ShaderSource::Wgsl(RESAMPLE_WGSL.into()),
        });

        Ok(Self {
            bind_group_layout,
            resample_layout,
            placeholder_layout,
            module,
            placeholder_color,
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            cached_bind_group: None,
            bind_group_builds: 0,
        })
    }

    pub fn cached_pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// How many bind groups have been created so far.
    pub fn bind_group_builds(&self) -> usize {
        self.bind_group_builds
    }

    /// Build (or fetch) the pipeline for `key` writing to `format`.
    pub fn specialize(
        &mut self,
        device: &Device,
        key: ResamplePipelineKey,
        format: wgpu::TextureFormat,
    ) -> Result<&RenderPipeline, GpuError> {
        let mode = key.mode()?;
        match self.pipelines.entry((key, format)) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                log::debug!(
                    "specializing resample pipeline: {mode:?} {} -> {format:?}",
                    key.geometry()
                );
                let pipeline = build_pipeline(
                    device,
                    &self.module,
                    if mode == ResampleMode::Placeholder {
                        &self.placeholder_layout
                    } else {
                        &self.resample_layout
                    },
                    mode,
                    key.geometry(),
                    format,
                    self.placeholder_color,
                );
                Ok(e.insert(pipeline))
            }
        }
    }

    /// Record one fullscreen draw of `pass` from `source` into `target`.
    ///
    /// With a viewport the draw covers only that rectangle and the rest of
    /// the target keeps its contents, which is how tiles are accumulated.
    /// Without one the whole target is cleared and overwritten. In
    /// placeholder mode `source` is ignored.
    pub fn encode(
        &mut self,
        device: &Device,
        encoder: &mut wgpu::CommandEncoder,
        pass: &ResamplePass,
        source: &wgpu::TextureView,
        target: ResampleTarget<'_>,
    ) -> Result<(), GpuError> {
        let key = pass.key();
        let target_format = target.format;
        let viewport = target.viewport;
        self.specialize(device, key, target_format)?;
        if !pass.placeholder {
            self.prepare_bind_group(device, source, pass.sampler);
        }

        let pipeline = &self.pipelines[&(key, target_format)];
        let bind_group = match (pass.placeholder, &self.cached_bind_group) {
            (false, Some(cached)) => Some(&cached.bind_group),
            _ => None,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("resample_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: match viewport {
                        Some(_) => wgpu::LoadOp::Load,
                        // Every pixel is overwritten by the draw.
                        None => wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    },
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if let Some(vp) = viewport {
            rpass.set_viewport(
                vp.x as f32,
                vp.y as f32,
                vp.width as f32,
                vp.height as f32,
                0.0,
                1.0,
            );
            rpass.set_scissor_rect(vp.x, vp.y, vp.width, vp.height);
        }
        rpass.set_pipeline(pipeline);
        if let Some(bind_group) = bind_group {
            rpass.set_bind_group(0, bind_group, &[]);
        }
        rpass.draw(0..pass.geometry.vertex_count(), 0..1);
        Ok(())
    }

    /// Reuse the last bind group while the source view and sampler stay the
    /// same.
    fn prepare_bind_group(
        &mut self,
        device: &Device,
        source: &wgpu::TextureView,
        sampler: SamplerConfig,
    ) {
        let view = source.global_id();
        if let Some(cached) = &self.cached_bind_group {
            if cached.view == view && cached.sampler == sampler {
                return;
            }
        }

        let sampler_obj = self
            .samplers
            .entry(sampler)
            .or_insert_with(|| device.create_sampler(&convert::sampler_descriptor(&sampler)));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("resample_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler_obj),
                },
            ],
        });
        log::debug!("resample bind group rebuilt ({} / {})", sampler.filter, sampler.address_u);
        self.bind_group_builds += 1;

        self.cached_bind_group = Some(CachedBindGroup {
            view,
            sampler,
            bind_group,
        });
    }
}

fn build_pipeline(
    device: &Device,
    module: &ShaderModule,
    layout: &PipelineLayout,
    mode: ResampleMode,
    geometry: FullscreenGeometry,
    format: wgpu::TextureFormat,
    placeholder_color: Vec4,
) -> RenderPipeline {
    let (vs_entry, topology) = match geometry {
        FullscreenGeometry::Triangle => (VS_FULLSCREEN_TRIANGLE, wgpu::PrimitiveTopology::TriangleList),
        FullscreenGeometry::Quad => (VS_FULLSCREEN_QUAD, wgpu::PrimitiveTopology::TriangleStrip),
    };
    let fs_entry = match mode {
        ResampleMode::Placeholder => FS_PLACEHOLDER,
        ResampleMode::Filtering | ResampleMode::Nearest => FS_RESAMPLE,
    };

    // Only fs_placeholder reads the override constants.
    let constants: HashMap<String, f64> = if mode == ResampleMode::Placeholder {
        PLACEHOLDER_CONSTANTS
            .iter()
            .zip(placeholder_color.to_array())
            .map(|(name, value)| (name.to_string(), f64::from(value)))
            .collect()
    } else {
        HashMap::new()
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("resample_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: vs_entry,
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: fs_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
