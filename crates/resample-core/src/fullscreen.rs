//! Procedural fullscreen geometry.
//!
//! Vertices are derived from the invocation index alone, so no vertex buffer
//! is bound. Both variants share one affine mapping from clip space to the
//! normalized position: uv (0, 0) is the top-left corner of the viewport and
//! uv (1, 1) the bottom-right, matching wgpu's texture origin.

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec4};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FullscreenGeometry {
    /// One oversized triangle, clipped by the rasterizer. No diagonal seam.
    #[default]
    Triangle,
    /// Four vertices drawn as a triangle strip.
    Quad,
}

impl FullscreenGeometry {
    pub fn vertex_count(self) -> u32 {
        match self {
            FullscreenGeometry::Triangle => 3,
            FullscreenGeometry::Quad => 4,
        }
    }

    /// Vertex index triples of the rasterized primitives.
    pub fn primitives(self) -> &'static [[u32; 3]] {
        match self {
            FullscreenGeometry::Triangle => &[[0, 1, 2]],
            FullscreenGeometry::Quad => &[[0, 1, 2], [2, 1, 3]],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FullscreenGeometry::Triangle => "triangle",
            FullscreenGeometry::Quad => "quad",
        }
    }
}

impl FromStr for FullscreenGeometry {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangle" => Ok(FullscreenGeometry::Triangle),
            "quad" => Ok(FullscreenGeometry::Quad),
            _ => Err(ConfigError::UnknownGeometry(s.to_string())),
        }
    }
}

impl fmt::Display for FullscreenGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-vertex output consumed by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullscreenVertex {
    pub clip_position: Vec4,
    pub uv: Vec2,
}

/// Same math as `vs_fullscreen_triangle` / `vs_fullscreen_quad` in
/// `resample.wgsl`. Indices outside `0..vertex_count()` are only masked,
/// never checked.
pub fn generate_fullscreen_vertex(geometry: FullscreenGeometry, index: u32) -> FullscreenVertex {
    let uv = match geometry {
        FullscreenGeometry::Triangle => {
            Vec2::new(((index << 1) & 2) as f32, (index & 2) as f32)
        }
        FullscreenGeometry::Quad => Vec2::new((index & 1) as f32, ((index >> 1) & 1) as f32),
    };
    FullscreenVertex {
        clip_position: Vec4::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0),
        uv,
    }
}

/// Interpolated normalized position at a clip-space point, or `None` when no
/// primitive covers it.
pub fn uv_at_clip(geometry: FullscreenGeometry, clip: Vec2) -> Option<Vec2> {
    const EPS: f32 = 1e-6;

    geometry.primitives().iter().find_map(|&[ia, ib, ic]| {
        let a = generate_fullscreen_vertex(geometry, ia);
        let b = generate_fullscreen_vertex(geometry, ib);
        let c = generate_fullscreen_vertex(geometry, ic);

        let pa = a.clip_position.truncate().truncate();
        let v0 = b.clip_position.truncate().truncate() - pa;
        let v1 = c.clip_position.truncate().truncate() - pa;
        let v2 = clip - pa;

        let denom = v0.perp_dot(v1);
        let wb = v2.perp_dot(v1) / denom;
        let wc = v0.perp_dot(v2) / denom;
        let wa = 1.0 - wb - wc;

        (wa >= -EPS && wb >= -EPS && wc >= -EPS).then(|| a.uv * wa + b.uv * wb + c.uv * wc)
    })
}

/// Normalized position the rasterizer hands to the fragment at pixel
/// `(x, y)`: the pixel centre divided by the viewport size.
pub fn uv_at_pixel(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / width as f32,
        (y as f32 + 0.5) / height as f32,
    )
}

/// Clip-space position of a pixel centre (y up).
pub fn pixel_to_clip(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    let uv = uv_at_pixel(x, y, width, height);
    Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn quad_vertices_are_the_four_corners_once_each() {
        let uvs: Vec<Vec2> = (0..FullscreenGeometry::Quad.vertex_count())
            .map(|i| generate_fullscreen_vertex(FullscreenGeometry::Quad, i).uv)
            .collect();
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ];
        for corner in corners {
            let hits = uvs.iter().filter(|&&uv| uv == corner).count();
            assert_eq!(hits, 1, "corner {corner:?} appears {hits} times in {uvs:?}");
        }
    }

    #[test]
    fn quad_clip_positions_cover_ndc_square() {
        for i in 0..4 {
            let v = generate_fullscreen_vertex(FullscreenGeometry::Quad, i);
            assert_eq!(v.clip_position.x.abs(), 1.0);
            assert_eq!(v.clip_position.y.abs(), 1.0);
            assert_eq!(v.clip_position.w, 1.0);
        }
    }

    #[test]
    fn triangle_vertices_are_oversized() {
        let clip: Vec<Vec4> = (0..3)
            .map(|i| generate_fullscreen_vertex(FullscreenGeometry::Triangle, i).clip_position)
            .collect();
        assert_eq!(clip[0], Vec4::new(-1.0, 1.0, 0.0, 1.0));
        assert_eq!(clip[1], Vec4::new(3.0, 1.0, 0.0, 1.0));
        assert_eq!(clip[2], Vec4::new(-1.0, -3.0, 0.0, 1.0));
    }

    #[test]
    fn viewport_corners_map_to_uv_corners() {
        for geometry in [FullscreenGeometry::Triangle, FullscreenGeometry::Quad] {
            let cases = [
                (Vec2::new(-1.0, 1.0), Vec2::new(0.0, 0.0)),
                (Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)),
                (Vec2::new(-1.0, -1.0), Vec2::new(0.0, 1.0)),
                (Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0)),
            ];
            for (clip, expected) in cases {
                let uv = uv_at_clip(geometry, clip).expect("corner must be covered");
                assert!(approx(uv, expected), "{geometry}: {clip:?} -> {uv:?}");
            }
        }
    }

    #[test]
    fn every_pixel_centre_is_covered_with_affine_uv() {
        let (w, h) = (7, 5);
        for geometry in [FullscreenGeometry::Triangle, FullscreenGeometry::Quad] {
            for y in 0..h {
                for x in 0..w {
                    let clip = pixel_to_clip(x, y, w, h);
                    let uv = uv_at_clip(geometry, clip)
                        .unwrap_or_else(|| panic!("{geometry}: pixel ({x}, {y}) not covered"));
                    assert!(approx(uv, uv_at_pixel(x, y, w, h)), "{geometry}: ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn triangle_is_one_primitive() {
        // A single primitive means no pixel is shaded twice.
        assert_eq!(FullscreenGeometry::Triangle.primitives().len(), 1);
        assert!(uv_at_clip(FullscreenGeometry::Triangle, Vec2::new(2.5, -2.5)).is_none());
    }

    #[test]
    fn generation_is_deterministic() {
        for i in 0..3 {
            assert_eq!(
                generate_fullscreen_vertex(FullscreenGeometry::Triangle, i),
                generate_fullscreen_vertex(FullscreenGeometry::Triangle, i)
            );
        }
    }

    #[test]
    fn geometry_parses() {
        assert_eq!("Quad".parse::<FullscreenGeometry>(), Ok(FullscreenGeometry::Quad));
        assert!("hexagon".parse::<FullscreenGeometry>().is_err());
    }
}
