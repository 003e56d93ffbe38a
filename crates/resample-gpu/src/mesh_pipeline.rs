use std::collections::HashMap;

use glam::{Mat4, Vec4};
use resample_core::mesh::{MeshVertex, MeshVertexLayout, VertexFeatures};
use resample_core::{BindingLayout, LayoutError, ResourceKind, ViewUniforms};
use wgpu::util::DeviceExt;
use wgpu::{BindGroupLayout, Buffer, Device, RenderPipeline};

use crate::convert;
use crate::error::GpuError;
use crate::shaders::{
    mesh_shader_source, FS_PLACEHOLDER, FS_VERTEX_COLOR, PLACEHOLDER_CONSTANTS, VS_MESH,
};
use crate::view::{MeshUniform, ViewUniform};

const VIEW_SIZE: u64 = std::mem::size_of::<ViewUniform>() as u64;
const MESH_SIZE: u64 = std::mem::size_of::<MeshUniform>() as u64;

/// Uploaded vertex data for one mesh.
pub struct MeshBuffer {
    pub vertices: Buffer,
    pub vertex_count: u32,
}

/// View and transform uniforms plus their bind group.
pub struct MeshBindings {
    pub view_buf: Buffer,
    pub mesh_buf: Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MeshBindings {
    /// Point the camera somewhere else. The write lands before the next
    /// submitted command buffer runs.
    pub fn update_view(&self, queue: &wgpu::Queue, view: &dyn ViewUniforms) {
        queue.write_buffer(&self.view_buf, 0, bytemuck::bytes_of(&ViewUniform::from_view(view)));
    }

    pub fn update_model(&self, queue: &wgpu::Queue, model: Mat4) {
        queue.write_buffer(&self.mesh_buf, 0, bytemuck::bytes_of(&MeshUniform::from_model(model)));
    }
}

/// What the mesh fragment stage writes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshFragment {
    /// One constant colour for every covered pixel.
    Placeholder(Vec4),
    /// The interpolated vertex colour. Needs [`VertexFeatures::COLORS`].
    VertexColor,
}

/// Mesh vertex stage with a placeholder or vertex-colour fragment. Which
/// optional vertex attributes exist is fixed by `features` when the pipeline
/// is built.
pub struct MeshPipeline {
    layout: MeshVertexLayout,
    bindings: BindingLayout,
    bind_group_layout: BindGroupLayout,
    pipeline: RenderPipeline,
    format: wgpu::TextureFormat,
}

impl MeshPipeline {
    pub fn new(
        device: &Device,
        features: VertexFeatures,
        format: wgpu::TextureFormat,
        fragment: MeshFragment,
    ) -> Result<Self, GpuError> {
        if fragment == MeshFragment::VertexColor && !features.contains(VertexFeatures::COLORS) {
            return Err(LayoutError::ColorsDisabled.into());
        }
        let layout = MeshVertexLayout::new(features);
        let bindings = BindingLayout::mesh(VIEW_SIZE, MESH_SIZE);
        let bindings = BindingLayout::new(bindings.label(), bindings.slots().to_vec())?;
        let bind_group_layout = convert::create_bind_group_layout(device, &bindings);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh"),
            source: wgpu::ShaderSource::Wgsl(mesh_shader_source(&layout).into()),
        });

        let attributes = convert::vertex_attributes(&layout);
        let (fs_entry, constants): (_, HashMap<String, f64>) = match fragment {
            MeshFragment::Placeholder(color) => (
                FS_PLACEHOLDER,
                PLACEHOLDER_CONSTANTS
                    .iter()
                    .zip(color.to_array())
                    .map(|(name, value)| (name.to_string(), f64::from(value)))
                    .collect(),
            ),
            MeshFragment::VertexColor => (FS_VERTEX_COLOR, HashMap::new()),
        };

        log::debug!("building mesh pipeline {features:?} -> {format:?}");
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: VS_MESH,
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride(),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
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
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            layout,
            bindings,
            bind_group_layout,
            pipeline,
            format,
        })
    }

    /// Pack and upload `vertices`. Fails if any vertex disagrees with the
    /// pipeline's feature flags.
    pub fn upload(&self, device: &Device, vertices: &[MeshVertex]) -> Result<MeshBuffer, GpuError> {
        let packed = self.layout.pack(vertices)?;
        let vertices_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&packed),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Ok(MeshBuffer {
            vertices: vertices_buf,
            vertex_count: vertices.len() as u32,
        })
    }

    pub fn bindings(
        &self,
        device: &Device,
        view: &dyn ViewUniforms,
        model: Mat4,
    ) -> Result<MeshBindings, GpuError> {
        self.bindings.check(&[
            (BindingLayout::VIEW, ResourceKind::UniformBuffer { min_size: VIEW_SIZE }),
            (BindingLayout::MESH, ResourceKind::UniformBuffer { min_size: MESH_SIZE }),
        ])?;

        let view_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_view_uniform"),
            contents: bytemuck::bytes_of(&ViewUniform::from_view(view)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let mesh_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_transform_uniform"),
            contents: bytemuck::bytes_of(&MeshUniform::from_model(model)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: view_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: mesh_buf.as_entire_binding(),
                },
            ],
        });

        Ok(MeshBindings {
            view_buf,
            mesh_buf,
            bind_group,
        })
    }

    /// Record a draw of `mesh` into `target`, cleared to `clear` first.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear: wgpu::Color,
        mesh: &MeshBuffer,
        bindings: &MeshBindings,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("mesh_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &bindings.bind_group, &[]);
        rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
        rpass.draw(0..mesh.vertex_count, 0..1);
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
