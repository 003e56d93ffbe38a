//! Procedural layout-style scene: thin wires and vias on a few coloured
//! layers. Many wires are narrower than an output pixel, so the scene only
//! reads correctly once it has been supersampled and filtered down.
//!
//! World units are output pixels, origin at the window centre, y up.

use glam::{Vec2, Vec3, Vec4};
use resample_core::mesh::MeshVertex;

/// Colour-blind safe layer colours: ultramarine, indigo, magenta, orange,
/// gold.
pub const PALETTE: [u32; 5] = [0x648FFF, 0x785EF0, 0xDC267F, 0xFE6100, 0xFFB000];

/// Distance between neighbouring wires on one layer.
const WIRE_PITCH: f32 = 24.0;

pub fn rgb(hex: u32) -> Vec4 {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    Vec4::new(channel(16), channel(8), channel(0), 1.0)
}

/// Colour of `layer`, cycling through [`PALETTE`].
pub fn layer_color(layer: usize) -> Vec4 {
    rgb(PALETTE[layer % PALETTE.len()])
}

/// Two triangles covering the axis-aligned box `min..max`.
pub fn rect(min: Vec2, max: Vec2, color: Vec4) -> [MeshVertex; 6] {
    let corner = |x: f32, y: f32| {
        let mut v = MeshVertex::new(Vec3::new(x, y, 0.0), Vec3::Z, Vec2::ZERO);
        v.color = Some(color);
        v
    };
    [
        corner(min.x, min.y),
        corner(max.x, min.y),
        corner(min.x, max.y),
        corner(min.x, max.y),
        corner(max.x, min.y),
        corner(max.x, max.y),
    ]
}

/// Vertices for a `width` x `height` window. Every vertex carries a colour.
pub fn build_scene(width: u32, height: u32) -> Vec<MeshVertex> {
    let half = Vec2::new(width as f32, height as f32) * 0.5;
    let mut vertices = Vec::new();

    for layer in 0..PALETTE.len() {
        let color = layer_color(layer);
        // Widths from a quarter pixel up to a pixel and a quarter.
        let wire = 0.25 + 0.25 * layer as f32;
        let offset = layer as f32 * WIRE_PITCH / PALETTE.len() as f32;

        if layer % 2 == 0 {
            let mut y = -half.y + offset;
            while y < half.y {
                vertices.extend(rect(
                    Vec2::new(-half.x, y),
                    Vec2::new(half.x, y + wire),
                    color,
                ));
                y += WIRE_PITCH;
            }
        } else {
            let mut x = -half.x + offset;
            while x < half.x {
                vertices.extend(rect(
                    Vec2::new(x, -half.y),
                    Vec2::new(x + wire, half.y),
                    color,
                ));
                x += WIRE_PITCH;
            }
        }
    }

    // A diagonal via chain on top, one triangle per step, to show edge
    // antialiasing at every angle.
    let top = layer_color(PALETTE.len() - 1);
    let mut x = -half.x;
    while x < half.x {
        let y = x * half.y / half.x.max(1.0);
        for (i, p) in [
            Vec2::new(x, y - 3.0),
            Vec2::new(x + 6.0, y),
            Vec2::new(x, y + 3.0),
        ]
        .into_iter()
        .enumerate()
        {
            let mut v = MeshVertex::new(p.extend(0.0), Vec3::Z, Vec2::new(i as f32 * 0.5, 0.0));
            v.color = Some(top);
            vertices.push(v);
        }
        x += WIRE_PITCH * 0.5;
    }

    log::debug!("scene for {width}x{height}: {} vertices", vertices.len());
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use resample_core::mesh::{MeshVertexLayout, VertexFeatures};

    #[test]
    fn hex_colours_unpack_in_rgb_order() {
        assert_eq!(rgb(0xFF0080), Vec4::new(1.0, 0.0, 128.0 / 255.0, 1.0));
        assert_eq!(layer_color(0), rgb(0x648FFF));
        assert_eq!(layer_color(PALETTE.len()), layer_color(0));
    }

    #[test]
    fn rect_is_two_triangles_of_one_colour() {
        let quad = rect(Vec2::ZERO, Vec2::ONE, Vec4::ONE);
        assert!(quad.iter().all(|v| v.color == Some(Vec4::ONE)));
        assert_eq!(quad[0].position, Vec3::ZERO);
        assert_eq!(quad[5].position, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn scene_packs_with_colour_layout() {
        let scene = build_scene(200, 120);
        assert!(!scene.is_empty());
        assert_eq!(scene.len() % 3, 0);
        let layout = MeshVertexLayout::new(VertexFeatures::COLORS);
        assert!(layout.pack(&scene).is_ok());
    }

    #[test]
    fn scene_uses_every_layer_colour() {
        let scene = build_scene(200, 120);
        for layer in 0..PALETTE.len() {
            let color = layer_color(layer);
            assert!(scene.iter().any(|v| v.color == Some(color)), "layer {layer}");
        }
    }
}
