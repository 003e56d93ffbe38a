//! WGSL sources.
//!
//! The resample stage is a fixed file. The mesh vertex shader's input and
//! output structs depend on which optional attributes are enabled, so it is
//! composed from a [`MeshVertexLayout`] instead of being toggled with a
//! textual preprocessor.

use std::fmt::Write;

use resample_core::mesh::{MeshVertexLayout, VertexFeatures};

pub const RESAMPLE_WGSL: &str = include_str!("../shaders/resample.wgsl");

pub const VS_FULLSCREEN_TRIANGLE: &str = "vs_fullscreen_triangle";
pub const VS_FULLSCREEN_QUAD: &str = "vs_fullscreen_quad";
pub const FS_RESAMPLE: &str = "fs_resample";
pub const FS_PLACEHOLDER: &str = "fs_placeholder";

pub const VS_MESH: &str = "vs_mesh";
/// Only present when the layout carries vertex colours.
pub const FS_VERTEX_COLOR: &str = "fs_vertex_color";

/// Names of the override constants holding the placeholder colour, in RGBA
/// order.
pub const PLACEHOLDER_CONSTANTS: [&str; 4] =
    ["placeholder_r", "placeholder_g", "placeholder_b", "placeholder_a"];

const MESH_PRELUDE: &str = r#"struct View {
    view_proj:      mat4x4<f32>,
    world_position: vec3<f32>,
    viewport:       vec4<f32>,
};

struct Mesh {
    model:         mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> view: View;
@group(0) @binding(1) var<uniform> mesh: Mesh;

override placeholder_r: f32 = 0.0;
override placeholder_g: f32 = 1.0;
override placeholder_b: f32 = 0.0;
override placeholder_a: f32 = 1.0;
"#;

/// Compose the mesh shader (`vs_mesh`, `fs_placeholder` and, with colours,
/// `fs_vertex_color`) for `layout`.
pub fn mesh_shader_source(layout: &MeshVertexLayout) -> String {
    let features = layout.features();
    let tangents = features.contains(VertexFeatures::TANGENTS);
    let colors = features.contains(VertexFeatures::COLORS);

    let mut src = String::from(MESH_PRELUDE);

    src.push_str("\nstruct Vertex {\n");
    for attr in layout.attributes() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            src,
            "    @location({}) {}: {},",
            attr.location,
            attr.name,
            attr.format.wgsl_type()
        );
    }
    src.push_str("};\n");

    src.push_str(
        "\nstruct VertexOutput {\n    @builtin(position) clip_position: vec4<f32>,\n    \
         @location(0) world_position: vec4<f32>,\n    \
         @location(1) world_normal: vec3<f32>,\n    \
         @location(2) uv: vec2<f32>,\n",
    );
    let mut next = 3;
    if tangents {
        let _ = writeln!(src, "    @location({next}) world_tangent: vec4<f32>,");
        next += 1;
    }
    if colors {
        let _ = writeln!(src, "    @location({next}) color: vec4<f32>,");
    }
    src.push_str("};\n");

    src.push_str(
        "\n@vertex\nfn vs_mesh(vertex: Vertex) -> VertexOutput {\n    \
         var out: VertexOutput;\n    \
         out.world_position = mesh.model * vec4<f32>(vertex.position, 1.0);\n    \
         out.clip_position = view.view_proj * out.world_position;\n    \
         out.world_normal = normalize((mesh.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz);\n    \
         out.uv = vertex.uv;\n",
    );
    if tangents {
        src.push_str(
            "    out.world_tangent = vec4<f32>(\n        \
             normalize((mesh.model * vec4<f32>(vertex.tangent.xyz, 0.0)).xyz),\n        \
             vertex.tangent.w,\n    );\n",
        );
    }
    if colors {
        src.push_str("    out.color = vertex.color;\n");
    }
    src.push_str("    return out;\n}\n");

    src.push_str(
        "\n@fragment\nfn fs_placeholder(in: VertexOutput) -> @location(0) vec4<f32> {\n    \
         return vec4<f32>(placeholder_r, placeholder_g, placeholder_b, placeholder_a);\n}\n",
    );
    if colors {
        src.push_str(
            "\n@fragment\nfn fs_vertex_color(in: VertexOutput) -> @location(0) vec4<f32> {\n    \
             return in.color;\n}\n",
        );
    }

    src
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_source_declares_every_entry_point() {
        for entry in [VS_FULLSCREEN_TRIANGLE, VS_FULLSCREEN_QUAD, FS_RESAMPLE, FS_PLACEHOLDER] {
            assert!(
                RESAMPLE_WGSL.contains(&format!("fn {entry}(")),
                "missing entry point {entry}"
            );
        }
        for name in PLACEHOLDER_CONSTANTS {
            assert!(RESAMPLE_WGSL.contains(&format!("override {name}")));
        }
    }

    #[test]
    fn mesh_source_follows_feature_flags() {
        let base = mesh_shader_source(&MeshVertexLayout::new(VertexFeatures::empty()));
        assert!(base.contains("@location(2) uv: vec2<f32>"));
        assert!(!base.contains("tangent"));
        assert!(!base.contains("color"));
        assert!(!base.contains(FS_VERTEX_COLOR));

        let full = mesh_shader_source(&MeshVertexLayout::new(VertexFeatures::all()));
        assert!(full.contains("@location(3) tangent: vec4<f32>"));
        assert!(full.contains("@location(4) color: vec4<f32>"));
        assert!(full.contains("@location(3) world_tangent: vec4<f32>"));
        assert!(full.contains("@location(4) color: vec4<f32>,\n};"));
    }

    #[test]
    fn colour_only_output_takes_location_three() {
        let src = mesh_shader_source(&MeshVertexLayout::new(VertexFeatures::COLORS));
        assert!(src.contains("@location(3) color: vec4<f32>"));
        assert!(!src.contains("world_tangent"));
        assert!(src.contains(&format!("fn {FS_VERTEX_COLOR}(in: VertexOutput)")));
    }
}
