//! Tiled supersampling.
//!
//! A large output is produced tile by tile: each tile is first rendered at
//! `scale` times its size into a small hi-res target, then resampled into
//! its own viewport of the accumulation target. Only one tile's hi-res
//! image exists at a time.

use glam::Vec2;

use crate::error::{BuildError, ConfigError, TextureError};
use crate::texture::SourceTexture;
use crate::view::OrthographicView;

/// Edge length of a full tile, in output pixels.
pub const TILE_SIZE: u32 = 64;

/// A rectangle of the output target in physical pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    /// Camera over the part of the world this viewport shows, when the whole
    /// `target_width` x `target_height` output maps one world unit to one
    /// pixel with the world origin at its centre. `scale` is the
    /// supersampling factor of the hi-res pass.
    pub fn view(&self, target_width: u32, target_height: u32, scale: u32) -> OrthographicView {
        let centre_px = Vec2::new(
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        );
        let half_target = Vec2::new(target_width as f32, target_height as f32) * 0.5;
        OrthographicView {
            width: self.width,
            height: self.height,
            // Pixel rows grow downwards, world y grows upwards.
            center: Vec2::new(centre_px.x - half_target.x, half_target.y - centre_px.y),
            pixels_per_unit: scale.max(1),
        }
    }
}

/// Row-major split of a `width` x `height` target into tiles. Tiles on the
/// right and bottom edges are cut to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tile_size: u32) -> Result<Self, BuildError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height }.into());
        }
        if tile_size == 0 {
            return Err(ConfigError::InvalidTileSize(tile_size).into());
        }
        Ok(Self {
            width,
            height,
            tile_size,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn columns(&self) -> u32 {
        self.width.div_ceil(self.tile_size)
    }

    pub fn rows(&self) -> u32 {
        self.height.div_ceil(self.tile_size)
    }

    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tiles(&self) -> impl Iterator<Item = Viewport> + '_ {
        let size = self.tile_size;
        (0..self.rows()).flat_map(move |row| {
            (0..self.columns()).map(move |col| {
                let (x, y) = (col * size, row * size);
                Viewport::new(x, y, size.min(self.width - x), size.min(self.height - y))
            })
        })
    }

    /// CPU accumulation: `render_tile` produces the final pixels of one
    /// viewport, which are written into place.
    pub fn accumulate<E>(
        &self,
        mut render_tile: impl FnMut(Viewport) -> Result<SourceTexture, E>,
    ) -> Result<SourceTexture, E>
    where
        E: From<TextureError>,
    {
        let mut texels = vec![glam::Vec4::ZERO; self.width as usize * self.height as usize];
        for tile in self.tiles() {
            let pixels = render_tile(tile)?;
            if pixels.dimensions() != (tile.width, tile.height) {
                return Err(TextureError::TexelCount {
                    expected: tile.width as usize * tile.height as usize,
                    actual: pixels.texels().len(),
                }
                .into());
            }
            for (row, chunk) in pixels.texels().chunks_exact(tile.width as usize).enumerate() {
                let start = (tile.y as usize + row) * self.width as usize + tile.x as usize;
                texels[start..start + chunk.len()].copy_from_slice(chunk);
            }
        }
        Ok(SourceTexture::new(self.width, self.height, texels)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::downscale;
    use crate::sampler::SamplerConfig;
    use crate::view::ViewUniforms;
    use glam::Vec4;

    #[test]
    fn tiles_cover_every_pixel_once() {
        let grid = TileGrid::new(10, 7, 4).unwrap();
        assert_eq!((grid.columns(), grid.rows(), grid.len()), (3, 2, 6));
        for y in 0..7 {
            for x in 0..10 {
                let hits = grid.tiles().filter(|t| t.contains(x, y)).count();
                assert_eq!(hits, 1, "pixel ({x}, {y})");
            }
        }
        let last = grid.tiles().last().unwrap();
        assert_eq!(last, Viewport::new(8, 4, 2, 3));
    }

    #[test]
    fn rejects_empty_target_and_zero_tile() {
        assert!(matches!(
            TileGrid::new(0, 4, 8),
            Err(BuildError::Texture(TextureError::ZeroSize { .. }))
        ));
        assert!(matches!(
            TileGrid::new(4, 4, 0),
            Err(BuildError::Config(ConfigError::InvalidTileSize(0)))
        ));
    }

    #[test]
    fn tile_view_maps_its_rect_onto_clip_space() {
        let (w, h) = (100, 60);
        let tile = Viewport::new(64, 0, 36, 60);
        let view = tile.view(w, h, 4);
        assert_eq!(view.viewport_size(), glam::UVec2::new(144, 240));

        // Top-left and bottom-right corners of the tile, in world units.
        let top_left = Vec4::new(64.0 - 50.0, 30.0, 0.0, 1.0);
        let bottom_right = Vec4::new(100.0 - 50.0, -30.0, 0.0, 1.0);
        let a = view.view_proj() * top_left;
        let b = view.view_proj() * bottom_right;
        assert!((a.truncate().truncate() - Vec2::new(-1.0, 1.0)).abs().max_element() < 1e-5);
        assert!((b.truncate().truncate() - Vec2::new(1.0, -1.0)).abs().max_element() < 1e-5);
    }

    #[test]
    fn tiled_downscale_matches_single_pass() {
        let scale = 3;
        let (w, h) = (10, 7);
        let hires = |x: u32, y: u32| {
            Vec4::new((x % 5) as f32 / 4.0, (y % 3) as f32 / 2.0, ((x ^ y) & 1) as f32, 1.0)
        };
        let whole = SourceTexture::from_fn(w * scale, h * scale, hires).unwrap();

        for sampler in [SamplerConfig::linear(), SamplerConfig::nearest()] {
            let expected = downscale(&whole, sampler, scale).unwrap();
            let grid = TileGrid::new(w, h, 4).unwrap();
            let tiled = grid
                .accumulate(|tile| {
                    let part = SourceTexture::from_fn(
                        tile.width * scale,
                        tile.height * scale,
                        |x, y| hires(tile.x * scale + x, tile.y * scale + y),
                    )?;
                    downscale(&part, sampler, scale)
                })
                .unwrap();
            // Tile-local and whole-image uv differ in the last bit for
            // non-power-of-two sizes.
            for (a, b) in tiled.texels().iter().zip(expected.texels()) {
                assert!((*a - *b).abs().max_element() < 1e-4, "{}: {a:?} vs {b:?}", sampler.filter);
            }
        }
    }

    #[test]
    fn accumulate_rejects_wrongly_sized_tiles() {
        let grid = TileGrid::new(4, 4, 2).unwrap();
        let err = grid
            .accumulate(|_| SourceTexture::filled(1, 1, Vec4::ONE))
            .unwrap_err();
        assert_eq!(err, TextureError::TexelCount { expected: 4, actual: 1 });
    }
}
