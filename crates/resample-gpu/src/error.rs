use resample_core::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("invalid mode bits {0:#x} in resample pipeline key")]
    InvalidKey(u32),
    #[error("texture format {0:?} is not supported here")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("buffer mapping failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("buffer mapping callback was dropped")]
    MapCancelled,
    #[error("tile grid covers {grid:?} but the target is {target:?}")]
    GridMismatch { grid: (u32, u32), target: (u32, u32) },
}

impl From<resample_core::BindingError> for GpuError {
    fn from(e: resample_core::BindingError) -> Self {
        GpuError::Build(e.into())
    }
}

impl From<resample_core::LayoutError> for GpuError {
    fn from(e: resample_core::LayoutError) -> Self {
        GpuError::Build(e.into())
    }
}

impl From<resample_core::TextureError> for GpuError {
    fn from(e: resample_core::TextureError) -> Self {
        GpuError::Build(e.into())
    }
}

impl From<resample_core::ConfigError> for GpuError {
    fn from(e: resample_core::ConfigError) -> Self {
        GpuError::Build(e.into())
    }
}
