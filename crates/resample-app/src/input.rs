use resample_core::{FilterMode, FullscreenGeometry};
use resample_gpu::ResamplePass;

// ---------------------------------------------------------------------------
// Key: windowing-library-independent key representation
// ---------------------------------------------------------------------------

/// A keyboard key, independent of any windowing library.
///
/// `main.rs` maps `winit::keyboard::PhysicalKey` → `Key`; everything else
/// in the input pipeline works purely with this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    F,
    P,
    G,
    Equal, // = / + (same physical key; Shift state ignored)
    Minus, // - / _ (same physical key; Shift state ignored)
    Q,
    Escape,
}

// ---------------------------------------------------------------------------
// InputAction: what the app does in response to input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    ToggleFilter,
    TogglePlaceholder,
    ToggleGeometry,
    ScaleUp,
    ScaleDown,
    Quit,
}

pub fn on_key(key: Key) -> InputAction {
    match key {
        Key::F => InputAction::ToggleFilter,
        Key::P => InputAction::TogglePlaceholder,
        Key::G => InputAction::ToggleGeometry,
        Key::Equal => InputAction::ScaleUp,
        Key::Minus => InputAction::ScaleDown,
        Key::Q | Key::Escape => InputAction::Quit,
    }
}

// ---------------------------------------------------------------------------
// ViewerState: everything an action can change
// ---------------------------------------------------------------------------

pub const MIN_SCALE: u32 = 1;
pub const MAX_SCALE: u32 = 8;

/// Clamp an offscreen supersampling factor to \[1, 8\].
pub fn clamp_scale(scale: u32) -> u32 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub pass: ResamplePass,
    /// Each tile is drawn at `scale` times its size.
    pub scale: u32,
}

/// What the caller must do after an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Redraw,
    /// The supersampling factor changed; hi-res tile targets are reallocated.
    Rebuild,
    Exit,
}

impl ViewerState {
    pub fn apply(&mut self, action: InputAction) -> Outcome {
        match action {
            InputAction::ToggleFilter => {
                self.pass.sampler.filter = match self.pass.sampler.filter {
                    FilterMode::Linear => FilterMode::Nearest,
                    FilterMode::Nearest => FilterMode::Linear,
                };
                Outcome::Redraw
            }
            InputAction::TogglePlaceholder => {
                self.pass.placeholder = !self.pass.placeholder;
                Outcome::Redraw
            }
            InputAction::ToggleGeometry => {
                self.pass.geometry = match self.pass.geometry {
                    FullscreenGeometry::Triangle => FullscreenGeometry::Quad,
                    FullscreenGeometry::Quad => FullscreenGeometry::Triangle,
                };
                Outcome::Redraw
            }
            InputAction::ScaleUp | InputAction::ScaleDown => {
                let next = if action == InputAction::ScaleUp {
                    clamp_scale(self.scale.saturating_add(1))
                } else {
                    clamp_scale(self.scale.saturating_sub(1))
                };
                if next == self.scale {
                    Outcome::Redraw
                } else {
                    self.scale = next;
                    Outcome::Rebuild
                }
            }
            InputAction::Quit => Outcome::Exit,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
