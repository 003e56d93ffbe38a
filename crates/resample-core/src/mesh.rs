//! Mesh vertex input with optional attributes.
//!
//! Whether tangents and vertex colours are present is decided by
//! [`VertexFeatures`] when the pipeline is built. The layout and the vertex
//! data are checked against those flags once, up front.

use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::error::LayoutError;
use crate::view::ViewUniforms;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexFeatures: u8 {
        const TANGENTS = 1 << 0;
        const COLORS   = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    pub fn size(self) -> u64 {
        match self {
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
        }
    }

    pub fn wgsl_type(self) -> &'static str {
        match self {
            AttributeFormat::Float32x2 => "vec2<f32>",
            AttributeFormat::Float32x3 => "vec3<f32>",
            AttributeFormat::Float32x4 => "vec4<f32>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub location: u32,
    pub format: AttributeFormat,
    pub offset: u64,
}

/// Interleaved attribute layout for one vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshVertexLayout {
    features: VertexFeatures,
    attributes: Vec<VertexAttribute>,
    stride: u64,
}

impl MeshVertexLayout {
    pub fn new(features: VertexFeatures) -> Self {
        let mut wanted = vec![
            ("position", AttributeFormat::Float32x3),
            ("normal", AttributeFormat::Float32x3),
            ("uv", AttributeFormat::Float32x2),
        ];
        if features.contains(VertexFeatures::TANGENTS) {
            wanted.push(("tangent", AttributeFormat::Float32x4));
        }
        if features.contains(VertexFeatures::COLORS) {
            wanted.push(("color", AttributeFormat::Float32x4));
        }

        let mut offset = 0;
        let attributes = wanted
            .into_iter()
            .enumerate()
            .map(|(location, (name, format))| {
                let attr = VertexAttribute {
                    name,
                    location: location as u32,
                    format,
                    offset,
                };
                offset += format.size();
                attr
            })
            .collect();

        Self {
            features,
            attributes,
            stride: offset,
        }
    }

    pub fn features(&self) -> VertexFeatures {
        self.features
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Pack vertices into interleaved `f32`s following this layout, after
    /// checking each one carries exactly the enabled optional attributes.
    pub fn pack(&self, vertices: &[MeshVertex]) -> Result<Vec<f32>, LayoutError> {
        let mut out = Vec::with_capacity(vertices.len() * (self.stride / 4) as usize);
        for (index, v) in vertices.iter().enumerate() {
            v.check(index, self.features)?;
            out.extend_from_slice(&v.position.to_array());
            out.extend_from_slice(&v.normal.to_array());
            out.extend_from_slice(&v.uv.to_array());
            if let Some(t) = v.tangent {
                out.extend_from_slice(&t.to_array());
            }
            if let Some(c) = v.color {
                out.extend_from_slice(&c.to_array());
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Option<Vec4>,
    pub color: Option<Vec4>,
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: None,
            color: None,
        }
    }

    pub fn check(&self, index: usize, features: VertexFeatures) -> Result<(), LayoutError> {
        let optional = [
            ("tangent", VertexFeatures::TANGENTS, self.tangent.is_some()),
            ("color", VertexFeatures::COLORS, self.color.is_some()),
        ];
        for (attribute, flag, present) in optional {
            match (features.contains(flag), present) {
                (true, false) => return Err(LayoutError::Missing { index, attribute }),
                (false, true) => return Err(LayoutError::Unexpected { index, attribute }),
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertexOutput {
    pub clip_position: Vec4,
    pub world_position: Vec4,
    pub world_normal: Vec3,
    pub uv: Vec2,
    pub world_tangent: Option<Vec4>,
    pub color: Option<Vec4>,
}

/// CPU counterpart of the mesh vertex shader.
pub fn transform_vertex(
    view: &dyn ViewUniforms,
    model: Mat4,
    vertex: &MeshVertex,
) -> MeshVertexOutput {
    let world_position = model * vertex.position.extend(1.0);
    let model3 = Mat3::from_mat4(model);
    let normal_matrix = model3.inverse().transpose();

    MeshVertexOutput {
        clip_position: view.view_proj() * world_position,
        world_position,
        world_normal: (normal_matrix * vertex.normal).normalize_or_zero(),
        uv: vertex.uv,
        world_tangent: vertex
            .tangent
            .map(|t| (model3 * t.truncate()).normalize_or_zero().extend(t.w)),
        color: vertex.color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::OrthographicView;

    #[test]
    fn base_layout_has_three_attributes() {
        let layout = MeshVertexLayout::new(VertexFeatures::empty());
        let locs: Vec<_> = layout.attributes().iter().map(|a| (a.name, a.location, a.offset)).collect();
        assert_eq!(locs, vec![("position", 0, 0), ("normal", 1, 12), ("uv", 2, 24)]);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    fn optional_attributes_take_consecutive_locations() {
        let layout = MeshVertexLayout::new(VertexFeatures::COLORS);
        let color = layout.attribute("color").unwrap();
        assert_eq!((color.location, color.offset), (3, 32));
        assert!(layout.attribute("tangent").is_none());

        let full = MeshVertexLayout::new(VertexFeatures::all());
        assert_eq!(full.attribute("tangent").unwrap().location, 3);
        assert_eq!(full.attribute("color").unwrap().location, 4);
        assert_eq!(full.stride(), 64);
    }

    #[test]
    fn vertex_check_matches_flags() {
        let mut v = MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO);
        assert!(v.check(0, VertexFeatures::empty()).is_ok());
        assert_eq!(
            v.check(3, VertexFeatures::TANGENTS),
            Err(LayoutError::Missing { index: 3, attribute: "tangent" })
        );
        v.color = Some(Vec4::ONE);
        assert_eq!(
            v.check(1, VertexFeatures::empty()),
            Err(LayoutError::Unexpected { index: 1, attribute: "color" })
        );
    }

    #[test]
    fn pack_interleaves_in_layout_order() {
        let layout = MeshVertexLayout::new(VertexFeatures::COLORS);
        let mut v = MeshVertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec2::new(0.5, 0.25));
        v.color = Some(Vec4::new(0.1, 0.2, 0.3, 0.4));
        let packed = layout.pack(&[v, v]).unwrap();
        assert_eq!(packed.len() as u64 * 4, layout.stride() * 2);
        assert_eq!(&packed[..12], &[1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 0.5, 0.25, 0.1, 0.2, 0.3, 0.4]);
        assert!(layout.pack(&[MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO)]).is_err());
    }

    #[test]
    fn transform_applies_model_then_view() {
        let view = OrthographicView::new(100, 100);
        let model = Mat4::from_translation(Vec3::new(25.0, 0.0, 0.0));
        let out = transform_vertex(&view, model, &MeshVertex::new(Vec3::new(25.0, 50.0, 0.0), Vec3::Z, Vec2::ONE));
        assert_eq!(out.world_position, Vec4::new(50.0, 50.0, 0.0, 1.0));
        assert!((out.clip_position.x - 1.0).abs() < 1e-6);
        assert!((out.clip_position.y - 1.0).abs() < 1e-6);
        assert_eq!(out.uv, Vec2::ONE);
        assert!(out.world_tangent.is_none() && out.color.is_none());
    }

    #[test]
    fn normals_use_inverse_transpose() {
        // Non-uniform scale: a 45° normal must tilt towards the squashed axis.
        let view = OrthographicView::new(10, 10);
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = Vec3::new(1.0, 1.0, 0.0).normalize();
        let out = transform_vertex(&view, model, &MeshVertex::new(Vec3::ZERO, n, Vec2::ZERO));
        let expected = Vec3::new(0.5, 1.0, 0.0).normalize();
        assert!((out.world_normal - expected).abs().max_element() < 1e-6);
    }

    #[test]
    fn tangent_keeps_handedness() {
        let view = OrthographicView::new(10, 10);
        let mut v = MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO);
        v.tangent = Some(Vec4::new(1.0, 0.0, 0.0, -1.0));
        let out = transform_vertex(&view, Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2), &v);
        let t = out.world_tangent.unwrap();
        assert!((t.truncate() - Vec3::Y).abs().max_element() < 1e-6);
        assert_eq!(t.w, -1.0);
    }
}
