use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use resample_core::mesh::VertexFeatures;
use resample_core::{SamplerConfig, TileGrid, PLACEHOLDER_GREEN};
use resample_gpu::{
    MeshBuffer, MeshFragment, MeshPipeline, OffscreenTarget, ResamplePass, ResamplePipeline,
    ResampleTarget, TiledRenderer,
};
use winit::window::Window;

use crate::config::Config;
use crate::input::{InputAction, Outcome, ViewerState};
use crate::scene::build_scene;

/// Hi-res tile and accumulation format. Linear so values pass through the
/// sampler unconverted.
const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

// ---------------------------------------------------------------------------
// Simple FPS counter: logs to console once per second
// ---------------------------------------------------------------------------

struct FpsCounter {
    frames: u32,
    last_report: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            last_report: Instant::now(),
        }
    }

    /// Returns the FPS once a full second has elapsed since the last report.
    fn tick(&mut self) -> Option<f32> {
        self.frames += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.last_report = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Surface format and resize policy
// ---------------------------------------------------------------------------

/// Surface format plus the format its views are drawn through. Stages write
/// values unconverted, so the view format is never sRGB. An sRGB-only
/// surface is viewed through its linear twin.
pub fn pick_surface_formats(
    formats: &[wgpu::TextureFormat],
) -> Option<(wgpu::TextureFormat, wgpu::TextureFormat)> {
    if let Some(linear) = formats.iter().copied().find(|f| !f.is_srgb()) {
        return Some((linear, linear));
    }
    let first = formats.first().copied()?;
    Some((first, first.remove_srgb_suffix()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePlan {
    /// Minimised: nothing to draw into.
    Ignore,
    /// Same size: the surface is reconfigured, the canvas is kept.
    Reconfigure,
    /// New size: canvas, tile grid and scene are rebuilt.
    Rebuild,
}

pub fn resize_plan(current: (u32, u32), new: (u32, u32)) -> ResizePlan {
    if new.0 == 0 || new.1 == 0 {
        ResizePlan::Ignore
    } else if new == current {
        ResizePlan::Reconfigure
    } else {
        ResizePlan::Rebuild
    }
}

// ---------------------------------------------------------------------------
// Canvas: window-sized accumulation target and what gets drawn into it
// ---------------------------------------------------------------------------

struct Canvas {
    target: OffscreenTarget,
    grid: TileGrid,
    scene: MeshBuffer,
}

impl Canvas {
    fn new(
        device: &wgpu::Device,
        mesh: &MeshPipeline,
        width: u32,
        height: u32,
        tile_size: u32,
    ) -> Result<Self> {
        let grid = TileGrid::new(width, height, tile_size)?;
        let target = OffscreenTarget::new(device, "canvas", width, height, CANVAS_FORMAT);
        let scene = mesh.upload(device, &build_scene(width, height))?;
        log::debug!(
            "Canvas rebuilt: {width}×{height}, {} tiles of {tile_size}",
            grid.len()
        );
        Ok(Self {
            target,
            grid,
            scene,
        })
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    /// Linear format the swapchain image is viewed and drawn in.
    view_format: wgpu::TextureFormat,

    tiles: TiledRenderer,
    /// Same-size nearest copy of the canvas onto the swapchain image.
    present: ResamplePipeline,
    canvas: Canvas,
    tile_size: u32,
    /// The canvas must be re-accumulated before the next present.
    dirty: bool,

    state: ViewerState,
    fps: FpsCounter,
}

impl App {
    /// Initialise wgpu for a given window. The window is wrapped in `Arc` so
    /// that the surface can hold a `'static` reference to it.
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        // ---- Instance / surface / adapter -----------------------------------
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter found")?;

        log::info!("GPU adapter: {}", adapter.get_info().name);

        // ---- Device & Queue -------------------------------------------------
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("resample-app device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create GPU device")?;

        // ---- Surface configuration ------------------------------------------
        let surface_caps = surface.get_capabilities(&adapter);
        let (format, view_format) = pick_surface_formats(&surface_caps.formats)
            .context("surface reports no supported formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: if view_format == format {
                vec![]
            } else {
                vec![view_format]
            },
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);
        log::info!("Surface configured: {width}×{height} {format:?} (drawn as {view_format:?}) Fifo");

        // ---- Stages ---------------------------------------------------------
        let state = ViewerState {
            pass: config.pass,
            scale: config.scale,
        };
        let mesh = MeshPipeline::new(
            &device,
            VertexFeatures::COLORS,
            CANVAS_FORMAT,
            MeshFragment::VertexColor,
        )?;
        let canvas = Canvas::new(&device, &mesh, width, height, config.tile_size)?;
        let resample = ResamplePipeline::new(&device, PLACEHOLDER_GREEN)?;
        let tiles = TiledRenderer::new(&device, mesh, resample, state.scale, BACKGROUND)?;
        let present = ResamplePipeline::new(&device, PLACEHOLDER_GREEN)?;

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            view_format,
            tiles,
            present,
            canvas,
            tile_size: config.tile_size,
            dirty: true,
            state,
            fps: FpsCounter::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Resize
    // -------------------------------------------------------------------------

    /// Reconfigure the surface. The canvas is only rebuilt when the size
    /// actually changed.
    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        let current = (self.surface_config.width, self.surface_config.height);
        let plan = resize_plan(current, (new_width, new_height));
        if plan == ResizePlan::Ignore {
            return Ok(());
        }

        self.surface_config.width = new_width;
        self.surface_config.height = new_height;
        self.surface.configure(&self.device, &self.surface_config);

        if plan == ResizePlan::Rebuild {
            self.canvas = Canvas::new(
                &self.device,
                self.tiles.mesh_pipeline(),
                new_width,
                new_height,
                self.tile_size,
            )?;
            self.dirty = true;
            log::debug!("Surface resized to {new_width}×{new_height}");
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Apply an action. Returns `true` if the app should exit.
    pub fn handle_action(&mut self, action: InputAction) -> Result<bool> {
        match self.state.apply(action) {
            Outcome::Exit => return Ok(true),
            Outcome::Rebuild => self.tiles.set_scale(self.state.scale)?,
            Outcome::Redraw => {}
        }
        self.dirty = true;
        let pass = &self.state.pass;
        log::info!(
            "{:?}: filter {}, address {}, geometry {}, placeholder {}, scale {}",
            action,
            pass.sampler.filter,
            pass.sampler.address_u,
            pass.geometry,
            pass.placeholder,
            self.state.scale,
        );
        Ok(false)
    }

    // -------------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------------

    /// Re-accumulate the canvas if anything changed, then copy it onto the
    /// surface and present.
    ///
    /// Surface errors are returned as `wgpu::SurfaceError` inside the
    /// `anyhow::Error` so the caller can recover from lost surfaces.
    pub fn render(&mut self) -> Result<()> {
        if let Some(fps) = self.fps.tick() {
            log::debug!(
                "FPS: {:.1}  key: {:?}  pipelines: {}",
                fps,
                self.state.pass.key(),
                self.tiles.resample_pipeline().cached_pipeline_count(),
            );
        }

        if self.dirty {
            let started = Instant::now();
            self.tiles.render(
                &self.device,
                &self.queue,
                &self.canvas.scene,
                &self.canvas.grid,
                &self.state.pass,
                &self.canvas.target,
            )?;
            self.dirty = false;
            log::debug!("Tiles submitted in {:?}", started.elapsed());
        }

        let output = self.surface.get_current_texture()?;
        let surface_view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let blit = ResamplePass {
            sampler: SamplerConfig::nearest(),
            ..Default::default()
        };
        self.present.encode(
            &self.device,
            &mut encoder,
            &blit,
            &self.canvas.target.view,
            ResampleTarget::whole(&surface_view, self.view_format),
        )?;

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_prefers_linear() {
        use wgpu::TextureFormat as F;
        assert_eq!(
            pick_surface_formats(&[F::Bgra8UnormSrgb, F::Bgra8Unorm]),
            Some((F::Bgra8Unorm, F::Bgra8Unorm))
        );
        assert_eq!(pick_surface_formats(&[]), None);
    }

    #[test]
    fn srgb_only_surface_is_viewed_linearly() {
        use wgpu::TextureFormat as F;
        let (surface, view) = pick_surface_formats(&[F::Rgba8UnormSrgb]).unwrap();
        assert_eq!(surface, F::Rgba8UnormSrgb);
        assert_eq!(view, F::Rgba8Unorm);
        assert!(!view.is_srgb());
    }

    #[test]
    fn canvas_is_only_rebuilt_when_size_changes() {
        assert_eq!(resize_plan((800, 600), (800, 600)), ResizePlan::Reconfigure);
        assert_eq!(resize_plan((800, 600), (801, 600)), ResizePlan::Rebuild);
        assert_eq!(resize_plan((800, 600), (0, 600)), ResizePlan::Ignore);
        assert_eq!(resize_plan((800, 600), (800, 0)), ResizePlan::Ignore);
    }
}
