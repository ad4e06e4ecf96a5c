//! Browser driver: `requestAnimationFrame` loop and window listeners.
//!
//! winit allows a single event loop per page, which rules out mounting,
//! unmounting and mounting again. The web build therefore drives the engine
//! from plain browser callbacks. The state shared between them lives behind
//! an `Rc`, and no `RefCell` borrow is ever held across an `.await` or while
//! the status listener (JavaScript) runs.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{HtmlCanvasElement, MouseEvent};

use crate::{
    aspect::Viewport,
    config::EngineConfig,
    engine::{Engine, PendingEngine, StopSignal},
    error::EngineError,
    resources,
    stage::{Stage, StatusListener},
};

/// Looks up a `<canvas>` by element id.
///
/// Fails before any GPU object exists, so a typo in the id never leaves a
/// half-built engine behind.
pub fn resolve_canvas(id: &str) -> Result<HtmlCanvasElement, EngineError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or(EngineError::NoWindow)?;
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| EngineError::CanvasNotFound(id.to_string()))?;
    element
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| EngineError::NotACanvas(id.to_string()))
}

/// The renderer fills the browser window.
pub fn window_viewport(window: &web_sys::Window, max_pixel_ratio: f64) -> Viewport {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(width, height, window.device_pixel_ratio(), max_pixel_ratio)
}

/// Drawing buffer in device pixels, CSS box in CSS pixels.
fn size_canvas(canvas: &HtmlCanvasElement, viewport: &Viewport) {
    let (width, height) = viewport.buffer_size();
    canvas.set_width(width);
    canvas.set_height(height);
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", viewport.width));
    let _ = style.set_property("height", &format!("{}px", viewport.height));
}

enum WebState {
    Booting,
    Loading(PendingEngine),
    Running(Engine),
    Stopped,
}

struct Listener {
    event: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

struct Shared {
    window: web_sys::Window,
    canvas: HtmlCanvasElement,
    config: EngineConfig,
    stop: StopSignal,
    // Last stage reported to the listener, readable while `state` is borrowed
    stage: Cell<&'static str>,
    state: RefCell<WebState>,
    frame: RefCell<Option<Closure<dyn FnMut()>>>,
    frame_id: Cell<Option<i32>>,
    listeners: RefCell<Vec<Listener>>,
}

impl Shared {
    fn viewport(&self) -> Viewport {
        window_viewport(&self.window, self.config.max_pixel_ratio)
    }

    fn on_resize(&self) {
        let viewport = self.viewport();
        if viewport.is_empty() {
            return;
        }
        size_canvas(&self.canvas, &viewport);
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        // Listeners are attached once running
        if let WebState::Running(engine) = &mut *state {
            engine.resize(viewport);
        }
    }

    fn on_mouse_move(&self, event: &MouseEvent) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        if let WebState::Running(engine) = &mut *state {
            engine.on_pointer_move(f64::from(event.client_x()), f64::from(event.client_y()));
        }
    }

    fn remove_listeners(&self) {
        for listener in self.listeners.borrow_mut().drain(..) {
            let _ = self.window.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            );
        }
    }

    fn request_frame(&self) {
        let frame = self.frame.borrow();
        let Some(callback) = frame.as_ref() else {
            return;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.frame_id.set(Some(id)),
            Err(e) => log::error!("requestAnimationFrame failed: {e:?}"),
        }
    }

    fn mark_stopped(&self) {
        *self.state.borrow_mut() = WebState::Stopped;
        self.stage.set(Stage::Stopped.name());
    }

    /// Puts a pending engine back, unless a stop arrived while it was out of the cell.
    fn park(&self, pending: PendingEngine) -> bool {
        if self.stop.is_requested() {
            pending.dispose();
            self.mark_stopped();
            return false;
        }
        *self.state.borrow_mut() = WebState::Loading(pending);
        true
    }

    fn dispose_state(&self) {
        let previous = std::mem::replace(&mut *self.state.borrow_mut(), WebState::Stopped);
        match previous {
            WebState::Running(mut engine) => engine.dispose(),
            WebState::Loading(pending) => pending.dispose(),
            WebState::Booting | WebState::Stopped => {}
        }
    }
}

fn add_listener(
    shared: &Rc<Shared>,
    event: &'static str,
    handler: impl Fn(&Shared, &web_sys::Event) + 'static,
) {
    let weak = Rc::downgrade(shared);
    let closure = Closure::wrap(Box::new(move |e: web_sys::Event| {
        if let Some(shared) = weak.upgrade() {
            handler(&shared, &e);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    if let Err(e) = shared
        .window
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        log::error!("could not listen for `{event}`: {e:?}");
        return;
    }
    shared
        .listeners
        .borrow_mut()
        .push(Listener { event, closure });
}

/// Attaches resize/pointer handling and starts the frame loop. Runs once the mesh exists.
fn start_running(shared: &Rc<Shared>) {
    add_listener(shared, "resize", |shared, _| shared.on_resize());
    add_listener(shared, "mousemove", |shared, e| {
        if let Some(mouse) = e.dyn_ref::<MouseEvent>() {
            shared.on_mouse_move(mouse);
        }
    });

    let weak: Weak<Shared> = Rc::downgrade(shared);
    *shared.frame.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        shared.frame_id.set(None);
        let keep_going = match &mut *shared.state.borrow_mut() {
            WebState::Running(engine) => match engine.tick() {
                Ok(keep_going) => keep_going,
                Err(e) => {
                    log::error!("Unable to render {e}");
                    !matches!(e, EngineError::Stopped)
                }
            },
            _ => false,
        };
        if keep_going && !shared.stop.is_requested() {
            shared.request_frame();
        } else {
            shared.remove_listeners();
            shared.dispose_state();
        }
    }) as Box<dyn FnMut()>));
    shared.request_frame();
}

async fn load(shared: Rc<Shared>) {
    let src = shared.config.image_src.clone();
    let image = resources::load_image(&src).await;

    if shared.stop.is_requested() {
        shared.dispose_state();
        return;
    }
    let previous = std::mem::replace(&mut *shared.state.borrow_mut(), WebState::Booting);
    let WebState::Loading(mut pending) = previous else {
        *shared.state.borrow_mut() = previous;
        return;
    };
    let mesh = image
        .map_err(EngineError::texture_load)
        .and_then(|image| pending.build_mesh(&image));
    match mesh {
        Ok(mesh) => match pending.attach(mesh) {
            Ok(mut engine) if shared.stop.is_requested() => {
                engine.dispose();
                shared.mark_stopped();
            }
            Ok(engine) => {
                *shared.state.borrow_mut() = WebState::Running(engine);
                start_running(&shared);
            }
            Err(e) => {
                log::error!("could not start the engine: {e}");
                shared.mark_stopped();
            }
        },
        Err(e) => {
            pending.fail(&e);
            shared.park(pending);
        }
    }
}

async fn boot(shared: Rc<Shared>, listener: Option<StatusListener>) {
    let viewport = shared.viewport();
    let target = wgpu::SurfaceTarget::Canvas(shared.canvas.clone());
    let pending = PendingEngine::bootstrap(
        target,
        viewport,
        shared.config.clone(),
        listener,
        shared.stop.clone(),
    )
    .await;
    match pending {
        Ok(pending) => {
            if shared.park(pending) {
                load(shared).await;
            }
        }
        Err(e) => {
            log::error!("engine bootstrap failed: {e}");
            shared.mark_stopped();
        }
    }
}

/// Owner of one engine running in the page. Dropping it stops the engine.
pub struct WebHandle {
    shared: Rc<Shared>,
}

impl WebHandle {
    /// Sizes `canvas` to the window and bootstraps the engine in the background.
    pub fn start(
        canvas: HtmlCanvasElement,
        config: EngineConfig,
        listener: Option<StatusListener>,
    ) -> Result<Self, EngineError> {
        let window = web_sys::window().ok_or(EngineError::NoWindow)?;
        let shared = Rc::new(Shared {
            window,
            canvas,
            config,
            stop: StopSignal::new(),
            stage: Cell::new("booting"),
            state: RefCell::new(WebState::Booting),
            frame: RefCell::new(None),
            frame_id: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
        });
        size_canvas(&shared.canvas, &shared.viewport());
        let weak = Rc::downgrade(&shared);
        let mut forward = listener;
        let listener: StatusListener = Box::new(move |stage: &Stage| {
            if let Some(shared) = weak.upgrade() {
                shared.stage.set(stage.name());
            }
            if let Some(forward) = forward.as_mut() {
                forward(stage);
            }
        });
        wasm_bindgen_futures::spawn_local(boot(shared.clone(), Some(listener)));
        Ok(Self { shared })
    }

    /// Name of the last stage reached, `"booting"` while the renderer is being created.
    pub fn stage(&self) -> String {
        self.shared.stage.get().to_string()
    }

    /// Loads the texture again after a failure. Returns `false` if there was nothing to retry.
    pub fn retry(&self) -> bool {
        let previous = {
            let Ok(mut state) = self.shared.state.try_borrow_mut() else {
                return false;
            };
            std::mem::replace(&mut *state, WebState::Booting)
        };
        let mut pending = match previous {
            WebState::Loading(pending) if pending.stage().is_failed() => pending,
            other => {
                *self.shared.state.borrow_mut() = other;
                return false;
            }
        };
        // Notifies the listener, so the cell stays unborrowed
        let retried = pending.retry();
        if !self.shared.park(pending) {
            return false;
        }
        if let Err(e) = retried {
            log::error!("{e}");
            return false;
        }
        wasm_bindgen_futures::spawn_local(load(self.shared.clone()));
        true
    }

    /// Stops the loop, removes the listeners and releases GPU resources.
    pub fn stop(&self) {
        if self.shared.stop.is_requested()
            && matches!(self.shared.state.try_borrow().as_deref(), Ok(WebState::Stopped))
        {
            return;
        }
        self.shared.stop.request();
        if let Some(id) = self.shared.frame_id.take() {
            let _ = self.shared.window.cancel_animation_frame(id);
        }
        self.shared.remove_listeners();
        // While booting, the boot task disposes once it sees the stop request.
        // A borrowed state belongs to the running frame, which does the same.
        let owner_busy = match self.shared.state.try_borrow() {
            Ok(state) => matches!(*state, WebState::Booting),
            Err(_) => true,
        };
        if !owner_busy {
            self.shared.dispose_state();
            self.shared.frame.borrow_mut().take();
        }
        log::info!("engine stopped");
    }
}

impl Drop for WebHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
