use glam::{Mat3, Mat4};
use resample_core::ViewUniforms;

/// GPU copy of the host's view. Must match `View` in the mesh shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    pub view_proj: [[f32; 4]; 4],
    pub world_position: [f32; 3],
    pub _pad: f32, // vec3 is padded to 16 bytes
    /// x, y, width, height in physical pixels.
    pub viewport: [f32; 4],
}

impl ViewUniform {
    pub fn from_view(view: &dyn ViewUniforms) -> Self {
        let size = view.viewport_size();
        Self {
            view_proj: view.view_proj().to_cols_array_2d(),
            world_position: view.world_position().to_array(),
            _pad: 0.0,
            viewport: [0.0, 0.0, size.x as f32, size.y as f32],
        }
    }
}

/// Per-mesh transform. Must match `Mesh` in the mesh shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl MeshUniform {
    pub fn from_model(model: Mat4) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: Mat4::from_mat3(normal).to_cols_array_2d(),
        }
    }
}
