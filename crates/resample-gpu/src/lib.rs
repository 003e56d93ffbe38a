pub mod context;
pub mod convert;
pub mod error;
pub mod mesh_pipeline;
pub mod resample_pipeline;
pub mod shaders;
pub mod target;
pub mod tiles;
pub mod view;

pub use context::GpuContext;
pub use error::GpuError;
pub use mesh_pipeline::{MeshBindings, MeshBuffer, MeshFragment, MeshPipeline};
pub use resample_pipeline::{
    ResampleMode, ResamplePass, ResamplePipeline, ResamplePipelineKey, ResampleTarget,
};
pub use target::{read_back, upload_texture, OffscreenTarget};
pub use tiles::TiledRenderer;
