use glam::{Vec2, Vec4};

use crate::error::{BuildError, ConfigError, TextureError};
use crate::fullscreen::uv_at_pixel;
use crate::sampler::{FilterMode, SamplerConfig};
use crate::texture::SourceTexture;

/// Opaque green, the colour the sprite placeholder writes.
pub const PLACEHOLDER_GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);

/// Texel-space coordinates are clamped to this magnitude before they are
/// turned into indices. Every f32 below it is an exact integer step, and
/// `index + 1` cannot overflow.
const MAX_TEXEL_COORD: f32 = (1u32 << 24) as f32;

/// One filtered lookup into `source` at normalized position `uv`.
///
/// Matches what the GPU sampler does for a single mip level: nearest picks
/// `floor(uv * size)`, linear blends the four texels around
/// `uv * size - 0.5`. Every texel index goes through the sampler's address
/// mode first. Channel values are returned untouched.
pub fn resample(source: &SourceTexture, sampler: &SamplerConfig, uv: Vec2) -> Vec4 {
    let (w, h) = source.dimensions();
    let fetch = |x: i64, y: i64| {
        source.texel(sampler.address_u.resolve(x, w), sampler.address_v.resolve(y, h))
    };

    // NaN collapses onto the lower bound; infinities onto the edges.
    let p = (uv * Vec2::new(w as f32, h as f32))
        .clamp(Vec2::splat(-MAX_TEXEL_COORD), Vec2::splat(MAX_TEXEL_COORD));
    match sampler.filter {
        FilterMode::Nearest => fetch(p.x.floor() as i64, p.y.floor() as i64),
        FilterMode::Linear => {
            let p = p - 0.5;
            let base = p.floor();
            let t = p - base;
            let (x0, y0) = (base.x as i64, base.y as i64);

            let top = fetch(x0, y0).lerp(fetch(x0 + 1, y0), t.x);
            let bottom = fetch(x0, y0 + 1).lerp(fetch(x0 + 1, y0 + 1), t.x);
            top.lerp(bottom, t.y)
        }
    }
}

// ---------------------------------------------------------------------------
// Fragment stages
// ---------------------------------------------------------------------------

/// A per-fragment function evaluated once per output pixel. Implementations
/// must be pure: no state may carry between invocations.
pub trait FragmentStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn shade(&self, uv: Vec2) -> Vec4;
}

pub struct TextureResample<'a> {
    pub source: &'a SourceTexture,
    pub sampler: SamplerConfig,
}

impl FragmentStage for TextureResample<'_> {
    fn name(&self) -> &'static str {
        "resample"
    }

    fn shade(&self, uv: Vec2) -> Vec4 {
        resample(self.source, &self.sampler, uv)
    }
}

/// Placeholder stage: sampling is bypassed and every fragment gets `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantColor {
    pub color: Vec4,
}

impl Default for ConstantColor {
    fn default() -> Self {
        Self {
            color: PLACEHOLDER_GREEN,
        }
    }
}

impl FragmentStage for ConstantColor {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn shade(&self, _uv: Vec2) -> Vec4 {
        self.color
    }
}

// ---------------------------------------------------------------------------
// CPU fullscreen pass
// ---------------------------------------------------------------------------

/// Evaluate `stage` for every pixel of a `width` x `height` target.
pub fn render_fullscreen(
    stage: &dyn FragmentStage,
    width: u32,
    height: u32,
) -> Result<SourceTexture, TextureError> {
    SourceTexture::from_fn(width, height, |x, y| {
        stage.shade(uv_at_pixel(x, y, width, height))
    })
}

/// Resample `source` down to `max(1, size / factor)` in each axis.
pub fn downscale(
    source: &SourceTexture,
    sampler: SamplerConfig,
    factor: u32,
) -> Result<SourceTexture, BuildError> {
    if factor == 0 {
        return Err(ConfigError::InvalidScale(factor).into());
    }
    let width = (source.width() / factor).max(1);
    let height = (source.height() / factor).max(1);
    log::debug!(
        "downscale {}x{} -> {}x{} ({})",
        source.width(),
        source.height(),
        width,
        height,
        sampler.filter
    );
    let stage = TextureResample { source, sampler };
    Ok(render_fullscreen(&stage, width, height)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::AddressMode;

    const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
    const GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
    const BLUE: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);
    const WHITE: Vec4 = Vec4::ONE;

    fn quad_texture() -> SourceTexture {
        SourceTexture::new(2, 2, vec![RED, GREEN, BLUE, WHITE]).unwrap()
    }

    fn gradient(w: u32, h: u32) -> SourceTexture {
        SourceTexture::from_fn(w, h, |x, y| {
            Vec4::new(x as f32 * 0.25, y as f32 * 0.125, (x * y) as f32 * 0.01, 1.0)
        })
        .unwrap()
    }

    fn approx(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn nearest_at_quarter_is_top_left() {
        let got = resample(&quad_texture(), &SamplerConfig::nearest(), Vec2::splat(0.25));
        assert_eq!(got, RED);
    }

    #[test]
    fn linear_at_centre_averages_all_four() {
        let got = resample(&quad_texture(), &SamplerConfig::linear(), Vec2::splat(0.5));
        assert_eq!(got, (RED + GREEN + BLUE + WHITE) / 4.0);
    }

    #[test]
    fn nearest_returns_exact_texels_without_blending() {
        let tex = gradient(5, 3);
        let sampler = SamplerConfig::nearest();
        for i in 1..40 {
            let uv = Vec2::new(i as f32 / 40.0, (i as f32 * 0.37).fract().clamp(0.01, 0.99));
            let (x, y) = ((uv.x * 5.0).floor() as u32, (uv.y * 3.0).floor() as u32);
            assert_eq!(resample(&tex, &sampler, uv), tex.texel(x, y), "uv {uv:?}");
        }
    }

    #[test]
    fn linear_matches_manual_bilinear_weights() {
        let tex = gradient(4, 4);
        let sampler = SamplerConfig::linear();
        // uv chosen so p = uv*4 - 0.5 = (1.3, 2.6): texels (1,2)..(2,3).
        let uv = Vec2::new(1.8 / 4.0, 3.1 / 4.0);
        let (fx, fy) = (0.3, 0.6);
        let expected = tex.texel(1, 2) * (1.0 - fx) * (1.0 - fy)
            + tex.texel(2, 2) * fx * (1.0 - fy)
            + tex.texel(1, 3) * (1.0 - fx) * fy
            + tex.texel(2, 3) * fx * fy;
        let got = resample(&tex, &sampler, uv);
        assert!(approx(got, expected), "got {got:?}, expected {expected:?}");
    }

    #[test]
    fn linear_at_texel_centre_is_exact() {
        let tex = gradient(4, 2);
        let uv = Vec2::new(2.5 / 4.0, 0.5 / 2.0);
        assert_eq!(resample(&tex, &SamplerConfig::linear(), uv), tex.texel(2, 0));
    }

    #[test]
    fn clamp_holds_edge_colour_outside_unit_square() {
        let tex = quad_texture();
        let s = SamplerConfig::nearest();
        assert_eq!(resample(&tex, &s, Vec2::new(-0.2, 0.1)), RED);
        assert_eq!(resample(&tex, &s, Vec2::new(1.3, 1.01)), WHITE);
        // Linear clamped at the very corner collapses onto the corner texel.
        assert_eq!(resample(&tex, &SamplerConfig::linear(), Vec2::ZERO), RED);
    }

    #[test]
    fn repeat_wraps_outside_unit_square() {
        let tex = quad_texture();
        let s = SamplerConfig::nearest().with_address_mode(AddressMode::Repeat);
        assert_eq!(resample(&tex, &s, Vec2::new(1.25, 0.25)), RED);
        assert_eq!(resample(&tex, &s, Vec2::new(-0.25, 0.25)), GREEN);
    }

    #[test]
    fn mirror_reflects_outside_unit_square() {
        let tex = quad_texture();
        let s = SamplerConfig::nearest().with_address_mode(AddressMode::MirrorRepeat);
        assert_eq!(resample(&tex, &s, Vec2::new(1.25, 0.25)), GREEN);
        assert_eq!(resample(&tex, &s, Vec2::new(1.75, 0.25)), RED);
    }

    #[test]
    fn non_finite_positions_resolve_like_far_away_ones() {
        let tex = gradient(4, 3);
        for sampler in [SamplerConfig::linear(), SamplerConfig::nearest()] {
            let at_inf = resample(&tex, &sampler, Vec2::new(f32::INFINITY, 0.5));
            assert_eq!(at_inf, resample(&tex, &sampler, Vec2::new(100.0, 0.5)));
            let at_neg_inf = resample(&tex, &sampler, Vec2::new(0.5, f32::NEG_INFINITY));
            assert_eq!(at_neg_inf, resample(&tex, &sampler, Vec2::new(0.5, -100.0)));
        }
        for mode in [AddressMode::Repeat, AddressMode::MirrorRepeat] {
            let s = SamplerConfig::linear().with_address_mode(mode);
            let c = resample(&tex, &s, Vec2::new(f32::INFINITY, f32::NAN));
            assert!(c.is_finite(), "{mode}: {c:?}");
        }
    }

    #[test]
    fn resample_is_bit_identical_across_calls() {
        let tex = gradient(6, 6);
        for sampler in [SamplerConfig::linear(), SamplerConfig::nearest()] {
            let uv = Vec2::new(0.3711, 0.8123);
            let a = resample(&tex, &sampler, uv);
            let b = resample(&tex, &sampler, uv);
            assert_eq!(a.to_array().map(f32::to_bits), b.to_array().map(f32::to_bits));
        }
    }

    #[test]
    fn placeholder_ignores_texture_and_position() {
        let stage = ConstantColor::default();
        for uv in [Vec2::ZERO, Vec2::splat(0.5), Vec2::new(0.9, 0.1), Vec2::splat(4.0)] {
            assert_eq!(stage.shade(uv), PLACEHOLDER_GREEN);
        }
        let out = render_fullscreen(&ConstantColor { color: BLUE }, 3, 2).unwrap();
        assert!(out.texels().iter().all(|&c| c == BLUE));
    }

    #[test]
    fn render_fullscreen_writes_each_pixel_once_at_its_centre() {
        let tex = gradient(4, 4);
        let stage = TextureResample {
            source: &tex,
            sampler: SamplerConfig::nearest(),
        };
        // Same size + nearest is an identity copy.
        let out = render_fullscreen(&stage, 4, 4).unwrap();
        assert_eq!(out, tex);
    }

    #[test]
    fn render_fullscreen_rejects_empty_target() {
        let err = render_fullscreen(&ConstantColor::default(), 0, 4).unwrap_err();
        assert_eq!(err, TextureError::ZeroSize { width: 0, height: 4 });
    }

    #[test]
    fn downscale_by_two_linear_averages_blocks() {
        let tex = SourceTexture::from_fn(4, 2, |x, _| if x % 2 == 0 { RED } else { BLUE }).unwrap();
        let out = downscale(&tex, SamplerConfig::linear(), 2).unwrap();
        assert_eq!(out.dimensions(), (2, 1));
        for &c in out.texels() {
            assert!(approx(c, (RED + BLUE) / 2.0), "got {c:?}");
        }
    }

    #[test]
    fn downscale_clamps_to_one_pixel_and_rejects_zero() {
        let tex = quad_texture();
        assert_eq!(downscale(&tex, SamplerConfig::nearest(), 8).unwrap().dimensions(), (1, 1));
        assert!(matches!(
            downscale(&tex, SamplerConfig::nearest(), 0),
            Err(BuildError::Config(ConfigError::InvalidScale(0)))
        ));
    }
}
