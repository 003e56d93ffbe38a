use glam::Vec4;

use crate::error::TextureError;

/// A single-level 2-D grid of RGBA float texels, row-major with row 0 at
/// the top (v = 0).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTexture {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl SourceTexture {
    pub fn new(width: u32, height: u32, texels: Vec<Vec4>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(TextureError::TexelCount {
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> Vec4,
    ) -> Result<Self, TextureError> {
        let texels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, texels)
    }

    pub fn filled(width: u32, height: u32, color: Vec4) -> Result<Self, TextureError> {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Texel at integer coordinates. Out-of-range coordinates are a caller
    /// bug; the sampler resolves address modes before fetching.
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        debug_assert!(x < self.width && y < self.height);
        self.texels[y as usize * self.width as usize + x as usize]
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            SourceTexture::new(0, 4, Vec::new()),
            Err(TextureError::ZeroSize { width: 0, height: 4 })
        );
        assert!(SourceTexture::filled(3, 0, Vec4::ONE).is_err());
    }

    #[test]
    fn rejects_wrong_texel_count() {
        let err = SourceTexture::new(2, 2, vec![Vec4::ONE; 3]).unwrap_err();
        assert_eq!(err, TextureError::TexelCount { expected: 4, actual: 3 });
    }

    #[test]
    fn from_fn_is_row_major() {
        let tex = SourceTexture::from_fn(3, 2, |x, y| Vec4::new(x as f32, y as f32, 0.0, 1.0))
            .unwrap();
        assert_eq!(tex.texel(2, 0), Vec4::new(2.0, 0.0, 0.0, 1.0));
        assert_eq!(tex.texel(0, 1), Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(tex.texels()[4], Vec4::new(1.0, 1.0, 0.0, 1.0));
    }
}
