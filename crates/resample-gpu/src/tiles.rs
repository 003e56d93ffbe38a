//! Tiled supersampling on the GPU: each tile of the output is drawn by the
//! mesh pipeline at `scale` times its size, then resampled into its own
//! viewport of the accumulation target.

use std::collections::HashMap;

use glam::Mat4;
use resample_core::{ConfigError, OrthographicView, TileGrid, ViewUniforms};
use wgpu::{Device, Queue};

use crate::error::GpuError;
use crate::mesh_pipeline::{MeshBindings, MeshBuffer, MeshPipeline};
use crate::resample_pipeline::{ResamplePass, ResamplePipeline, ResampleTarget};
use crate::target::OffscreenTarget;

pub struct TiledRenderer {
    mesh: MeshPipeline,
    resample: ResamplePipeline,
    bindings: MeshBindings,
    /// Hi-res scratch targets keyed by size. A grid has at most four
    /// distinct tile sizes (full, right edge, bottom edge, corner).
    hires: HashMap<(u32, u32), OffscreenTarget>,
    scale: u32,
    background: wgpu::Color,
}

impl TiledRenderer {
    pub fn new(
        device: &Device,
        mesh: MeshPipeline,
        resample: ResamplePipeline,
        scale: u32,
        background: wgpu::Color,
    ) -> Result<Self, GpuError> {
        if scale == 0 {
            return Err(ConfigError::InvalidScale(scale).into());
        }
        let bindings = mesh.bindings(device, &OrthographicView::new(1, 1), Mat4::IDENTITY)?;
        Ok(Self {
            mesh,
            resample,
            bindings,
            hires: HashMap::new(),
            scale,
            background,
        })
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Change the supersampling factor. Scratch targets of the old size are
    /// dropped.
    pub fn set_scale(&mut self, scale: u32) -> Result<(), GpuError> {
        if scale == 0 {
            return Err(ConfigError::InvalidScale(scale).into());
        }
        if scale != self.scale {
            self.scale = scale;
            self.hires.clear();
        }
        Ok(())
    }

    pub fn hires_target_count(&self) -> usize {
        self.hires.len()
    }

    pub fn resample_pipeline(&self) -> &ResamplePipeline {
        &self.resample
    }

    pub fn mesh_pipeline(&self) -> &MeshPipeline {
        &self.mesh
    }

    /// Model transform applied to every mesh drawn from now on.
    pub fn set_model(&self, queue: &Queue, model: Mat4) {
        self.bindings.update_model(queue, model);
    }

    /// Draw `mesh` over every tile of `grid` into `target`.
    ///
    /// The view uniform is rewritten for every tile, so each tile goes in
    /// its own submission.
    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        mesh: &MeshBuffer,
        grid: &TileGrid,
        pass: &ResamplePass,
        target: &OffscreenTarget,
    ) -> Result<(), GpuError> {
        let (width, height) = grid.dimensions();
        if (width, height) != (target.width, target.height) {
            return Err(GpuError::GridMismatch {
                grid: (width, height),
                target: (target.width, target.height),
            });
        }

        let hires_format = self.mesh.format();
        for tile in grid.tiles() {
            let view = tile.view(width, height, self.scale);
            self.bindings.update_view(queue, &view);

            let size = view.viewport_size();
            let hires = self.hires.entry((size.x, size.y)).or_insert_with(|| {
                log::debug!("tile scratch target {}x{}", size.x, size.y);
                OffscreenTarget::new(device, "tile_hires", size.x, size.y, hires_format)
            });

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tile_encoder"),
            });
            self.mesh
                .encode(&mut encoder, &hires.view, self.background, mesh, &self.bindings);
            self.resample.encode(
                device,
                &mut encoder,
                pass,
                &hires.view,
                ResampleTarget::tile(&target.view, target.format, tile),
            )?;
            queue.submit(std::iter::once(encoder.finish()));
            log::trace!("tile {tile:?} done");
        }
        log::debug!(
            "accumulated {} tiles ({}x{}, scale {})",
            grid.len(),
            width,
            height,
            self.scale
        );
        Ok(())
    }
}
