//! `ShaderCanvas`: the JavaScript-facing component.
//!
//! ```js
//! const view = ShaderCanvas.from_element_id("animation-id", "/turtle.jpg", 1.5);
//! view.on_status((stage, detail) => console.log(stage, detail));
//! view.mount();
//! // later
//! view.unmount(); // or view.free()
//! ```

use std::{cell::RefCell, rc::Rc};

use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::{
    config::EngineConfig,
    logging::init_logging,
    stage::{Stage, StatusListener},
    web::{WebHandle, resolve_canvas},
};

#[wasm_bindgen]
pub struct ShaderCanvas {
    canvas: HtmlCanvasElement,
    config: EngineConfig,
    status: Option<js_sys::Function>,
    // Status callbacks may call back into this object, so methods take `&self`
    handle: RefCell<Option<Rc<WebHandle>>>,
}

#[wasm_bindgen]
impl ShaderCanvas {
    /// Wraps an existing canvas. `image_ratio` defaults to 1.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        src: String,
        image_ratio: Option<f32>,
        class_name: Option<String>,
        style: Option<String>,
    ) -> ShaderCanvas {
        let mut config = EngineConfig::new(src);
        if let Some(ratio) = image_ratio {
            config = config.with_image_ratio(ratio);
        }
        init_logging(config.log_level);

        if let Some(class_name) = class_name {
            canvas.set_class_name(&class_name);
        }
        if let Some(style) = style {
            if let Err(e) = canvas.set_attribute("style", &style) {
                log::warn!("could not apply canvas style: {e:?}");
            }
        }

        ShaderCanvas {
            canvas,
            config,
            status: None,
            handle: RefCell::new(None),
        }
    }

    /// Looks the canvas up by id; fails if it is missing or not a `<canvas>`.
    pub fn from_element_id(
        id: &str,
        src: String,
        image_ratio: Option<f32>,
        class_name: Option<String>,
        style: Option<String>,
    ) -> Result<ShaderCanvas, JsError> {
        let canvas = resolve_canvas(id).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self::new(canvas, src, image_ratio, class_name, style))
    }

    /// `callback(stage, detail)` is called on every stage change; `detail` is
    /// the failure reason for `"failed"` and `undefined` otherwise.
    ///
    /// Takes effect on the next `mount`.
    pub fn on_status(&mut self, callback: js_sys::Function) {
        self.status = Some(callback);
    }

    /// Starts the engine. Mounting an already mounted component does nothing.
    pub fn mount(&self) -> Result<(), JsError> {
        if self.handle.borrow().is_some() {
            return Ok(());
        }
        let listener = self.status.clone().map(status_listener);
        let handle = WebHandle::start(self.canvas.clone(), self.config.clone(), listener)
            .map_err(|e| JsError::new(&e.to_string()))?;
        *self.handle.borrow_mut() = Some(Rc::new(handle));
        Ok(())
    }

    /// Stops the loop and releases every GPU resource.
    pub fn unmount(&self) {
        let handle = self.handle.borrow_mut().take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    /// Reloads the texture after a failed load.
    pub fn retry(&self) -> bool {
        let handle = self.handle.borrow().clone();
        handle.is_some_and(|h| h.retry())
    }

    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.handle.borrow().is_some()
    }

    #[wasm_bindgen(getter)]
    pub fn stage(&self) -> String {
        match &*self.handle.borrow() {
            Some(handle) => handle.stage(),
            None => Stage::Uninitialized.to_string(),
        }
    }
}

fn status_listener(callback: js_sys::Function) -> StatusListener {
    Box::new(move |stage: &Stage| {
        let detail = match stage {
            Stage::Failed(reason) => JsValue::from_str(reason),
            _ => JsValue::UNDEFINED,
        };
        if let Err(e) = callback.call2(&JsValue::NULL, &JsValue::from_str(stage.name()), &detail) {
            log::warn!("status callback threw: {e:?}");
        }
    })
}
