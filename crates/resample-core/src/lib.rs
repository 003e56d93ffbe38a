//! CPU model of the fullscreen resample stage.
//!
//! Everything the GPU crate draws is described here first: fullscreen vertex
//! generation, sampler semantics, the resample and placeholder fragment
//! stages, and the named binding layouts the pipelines are built from. The
//! functions are pure, so they double as the reference for GPU tests.

pub mod bindings;
pub mod error;
pub mod fullscreen;
pub mod mesh;
pub mod resample;
pub mod sampler;
pub mod texture;
pub mod tiling;
pub mod view;

// ---------------------------------------------------------------------------
// Re-exports: the types nearly every caller touches
// ---------------------------------------------------------------------------

pub use bindings::{BindingLayout, BindingSlot, ResourceKind, ShaderStage};
pub use error::{BindingError, BuildError, ConfigError, LayoutError, TextureError};
pub use fullscreen::{generate_fullscreen_vertex, FullscreenGeometry, FullscreenVertex};
pub use resample::{
    downscale, render_fullscreen, resample, ConstantColor, FragmentStage, TextureResample,
    PLACEHOLDER_GREEN,
};
pub use sampler::{AddressMode, FilterMode, SamplerConfig};
pub use texture::SourceTexture;
pub use tiling::{TileGrid, Viewport, TILE_SIZE};
pub use view::{OrthographicView, ViewUniforms};
