use thiserror::Error;

/// Failures constructing a [`SourceTexture`](crate::texture::SourceTexture).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture dimensions must be positive, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("expected {expected} texels, got {actual}")]
    TexelCount { expected: usize, actual: usize },
}

/// Bad user-facing configuration values (names, factors).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown filter mode `{0}` (expected `linear` or `nearest`)")]
    UnknownFilter(String),
    #[error("unknown address mode `{0}` (expected `clamp`, `repeat` or `mirror`)")]
    UnknownAddressMode(String),
    #[error("unknown geometry `{0}` (expected `triangle` or `quad`)")]
    UnknownGeometry(String),
    #[error("scale factor must be at least 1, got {0}")]
    InvalidScale(u32),
    #[error("tile size must be at least 1, got {0}")]
    InvalidTileSize(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("binding layout `{0}` has no slots")]
    Empty(String),
    #[error("slot name `{0}` is declared twice")]
    DuplicateName(String),
    #[error("binding index {binding} is used by both `{first}` and `{second}`")]
    DuplicateBinding {
        binding: u32,
        first: String,
        second: String,
    },
    #[error("filtering sampler `{0}` has no filterable texture to sample")]
    FilteringWithoutFilterable(String),
    #[error("required slot `{0}` was not provided")]
    Missing(String),
    #[error("slot `{name}` expects {expected}, got {actual}")]
    KindMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("provided resource `{0}` matches no slot")]
    Unexpected(String),
}

/// Optional vertex attributes disagreeing with the pipeline's feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("vertex {index} is missing the `{attribute}` attribute")]
    Missing { index: usize, attribute: &'static str },
    #[error("vertex {index} carries `{attribute}` but the layout does not enable it")]
    Unexpected { index: usize, attribute: &'static str },
    #[error("vertex-colour shading needs the `color` attribute enabled")]
    ColorsDisabled,
}

/// Anything that can go wrong while building a stage. Nothing fails once a
/// stage is built; sampling itself is infallible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}
