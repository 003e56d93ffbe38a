use glam::{Mat4, UVec2, Vec2, Vec3};

/// The view/camera values a stage may read, supplied by the host.
pub trait ViewUniforms {
    fn viewport_size(&self) -> UVec2;
    fn view_proj(&self) -> Mat4;
    fn world_position(&self) -> Vec3;
}

/// 2-D camera looking down -Z at `center`, y up. `width` x `height` world
/// units are visible, each covering `pixels_per_unit` physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicView {
    pub width: u32,
    pub height: u32,
    pub center: Vec2,
    pub pixels_per_unit: u32,
}

impl OrthographicView {
    const DEPTH: f32 = 1000.0;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            center: Vec2::ZERO,
            pixels_per_unit: 1,
        }
    }
}

impl ViewUniforms for OrthographicView {
    fn viewport_size(&self) -> UVec2 {
        UVec2::new(self.width, self.height) * self.pixels_per_unit
    }

    fn view_proj(&self) -> Mat4 {
        let half = Vec2::new(self.width as f32, self.height as f32) * 0.5;
        Mat4::orthographic_rh(
            self.center.x - half.x,
            self.center.x + half.x,
            self.center.y - half.y,
            self.center.y + half.y,
            -Self::DEPTH,
            Self::DEPTH,
        )
    }

    fn world_position(&self) -> Vec3 {
        self.center.extend(0.0)
    }
}
