use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

mod app;
mod config;
mod input;
mod logging;
mod scene;

use app::App;
use config::Config;
use input::{on_key, Key};
use logging::{init_logging, LoggingConfig};

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyF => Some(Key::F),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyG => Some(Key::G),
        KeyCode::Equal | KeyCode::NumpadAdd => Some(Key::Equal),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(Key::Minus),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Handler: winit ApplicationHandler
// ---------------------------------------------------------------------------

struct Handler {
    config: Config,
    window: Option<Arc<Window>>,
    app: Option<App>,
}

impl Handler {
    fn fail(&self, event_loop: &ActiveEventLoop, context: &str, err: anyhow::Error) {
        log::error!("{context}: {err:#}");
        event_loop.exit();
    }
}

impl ApplicationHandler for Handler {
    /// Called once on desktop when the event loop starts.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("Resample")
            .with_inner_size(winit::dpi::LogicalSize::new(800u32, 600u32));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, "failed to create window", err.into()),
        };

        match App::new(Arc::clone(&window), &self.config) {
            Ok(app) => {
                self.window = Some(window);
                self.app = Some(app);
            }
            Err(err) => self.fail(event_loop, "failed to initialise renderer", err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = &mut self.app else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let Some(key) = map_key(code) else {
                    return;
                };
                match app.handle_action(on_key(key)) {
                    Ok(true) => event_loop.exit(),
                    Ok(false) => {}
                    Err(err) => log::error!("input action failed: {err:#}"),
                }
            }

            WindowEvent::Resized(new_size) => {
                if let Err(err) = app.resize(new_size.width, new_size.height) {
                    log::error!("resize failed: {err:#}");
                }
            }

            WindowEvent::RedrawRequested => {
                let Err(err) = app.render() else {
                    return;
                };
                match err.downcast_ref::<wgpu::SurfaceError>() {
                    // Surface lost / outdated: reconfigure and try again next frame.
                    Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(window) = &self.window {
                            let size = window.inner_size();
                            if let Err(err) = app.resize(size.width, size.height) {
                                log::error!("resize failed: {err:#}");
                            }
                        }
                    }
                    Some(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        event_loop.exit();
                    }
                    Some(other) => log::warn!("render error: {other:?}"),
                    None => {
                        log::error!("render failed: {err:#}");
                        event_loop.exit();
                    }
                }
            }

            _ => {}
        }
    }

    /// Drive continuous redraws (game-loop style).
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_logging(LoggingConfig {
        env_filter: config.log_level.clone(),
        ..Default::default()
    });
    log::info!(
        "Starting with filter {}, geometry {}, scale {}, tiles of {}",
        config.pass.sampler.filter,
        config.pass.geometry,
        config.scale,
        config.tile_size
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut handler = Handler {
        config,
        window: None,
        app: None,
    };
    event_loop.run_app(&mut handler)?;
    Ok(())
}
