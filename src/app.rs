//! Native driver: a winit window hosting one engine.
//!
//! The event loop drives the animation through `RedrawRequested`, each frame
//! requesting the next. The texture is loaded on a tokio runtime with
//! `block_on` while the window is being set up; if that fails the window
//! stays open with a clear frame and `R` retries.

use std::{mem, sync::Arc, time::Duration};

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    aspect::Viewport,
    config::EngineConfig,
    engine::{Engine, PendingEngine, StopSignal},
    error::EngineError,
    logging::init_logging,
};

/// How often a non-running app checks for an external stop request.
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
enum EngineSlot {
    #[default]
    Empty,
    Loading(PendingEngine),
    Running(Engine),
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: EngineConfig,
    stop: StopSignal,
    window: Option<Arc<Window>>,
    engine: EngineSlot,
}

impl App {
    pub fn new(config: EngineConfig, stop: StopSignal) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            async_runtime,
            config,
            stop,
            window: None,
            engine: EngineSlot::Empty,
        })
    }

    fn viewport(&self, window: &Window) -> Viewport {
        let size = window.inner_size();
        Viewport::from_physical(
            size.width,
            size.height,
            window.scale_factor(),
            self.config.max_pixel_ratio,
        )
    }

    /// Loads the texture and, on success, starts the loop.
    fn load(&mut self, mut pending: PendingEngine) {
        match self.async_runtime.block_on(pending.load_mesh()) {
            Ok(mesh) => match pending.attach(mesh) {
                Ok(engine) => {
                    self.engine = EngineSlot::Running(engine);
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                Err(e) => log::error!("could not start the engine: {e}"),
            },
            Err(e) => {
                log::error!("{e}; press R to retry");
                self.engine = EngineSlot::Loading(pending);
            }
        }
    }

    fn retry(&mut self) {
        let EngineSlot::Loading(mut pending) = mem::take(&mut self.engine) else {
            return;
        };
        if !pending.stage().is_failed() {
            self.engine = EngineSlot::Loading(pending);
            return;
        }
        if let Err(e) = pending.retry() {
            log::error!("{e}");
            self.engine = EngineSlot::Loading(pending);
            return;
        }
        self.load(pending);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.stop.request();
        match mem::take(&mut self.engine) {
            EngineSlot::Running(mut engine) => engine.dispose(),
            EngineSlot::Loading(pending) => pending.dispose(),
            EngineSlot::Empty => {}
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title("shade-ngin")
            .with_inner_size(LogicalSize::new(1024.0, 768.0))
            .with_transparent(self.config.transparent);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("{}: {e}", EngineError::NoWindow);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let viewport = self.viewport(&window);
        let bootstrap = PendingEngine::bootstrap(
            window,
            viewport,
            self.config.clone(),
            None,
            self.stop.clone(),
        );
        match self.async_runtime.block_on(bootstrap) {
            Ok(pending) => self.load(pending),
            Err(e) => {
                log::error!("engine bootstrap failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::KeyR),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.retry(),
            WindowEvent::Resized(_) => {
                let viewport = self.viewport(&window);
                match &mut self.engine {
                    EngineSlot::Running(engine) => {
                        engine.resize(viewport);
                    }
                    EngineSlot::Loading(pending) => {
                        pending.resize(viewport);
                    }
                    EngineSlot::Empty => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let EngineSlot::Running(engine) = &mut self.engine {
                    let logical = position.to_logical::<f64>(window.scale_factor());
                    engine.on_pointer_move(logical.x, logical.y);
                }
            }
            WindowEvent::RedrawRequested => {
                let EngineSlot::Running(engine) = &mut self.engine else {
                    return;
                };
                match engine.tick() {
                    Ok(true) => window.request_redraw(),
                    Ok(false) => self.shutdown(event_loop),
                    Err(EngineError::Frame(wgpu::SurfaceError::OutOfMemory)) => {
                        log::error!("out of GPU memory, shutting down");
                        self.shutdown(event_loop);
                    }
                    Err(e) => {
                        log::error!("Unable to render {e}");
                        window.request_redraw();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.is_requested() {
            self.shutdown(event_loop);
            return;
        }
        if !matches!(self.engine, EngineSlot::Running(_)) {
            event_loop.set_control_flow(ControlFlow::wait_duration(IDLE_POLL));
        }
    }
}

/// Opens a window and renders `config.image_src` until it is closed.
pub fn run(config: EngineConfig) -> anyhow::Result<()> {
    run_with(config, StopSignal::new())
}

/// Like [`run`], but also returns once `stop` is requested from elsewhere.
pub fn run_with(config: EngineConfig, stop: StopSignal) -> anyhow::Result<()> {
    init_logging(config.log_level);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, stop)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
