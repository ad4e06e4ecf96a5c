#![cfg(target_arch = "wasm32")]

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use shade_ngin::{EngineError, embed::ShaderCanvas, web::resolve_canvas};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

#[wasm_bindgen_test]
fn missing_canvas_fails_fast() {
    let err = resolve_canvas("no-such-canvas").unwrap_err();
    assert!(matches!(err, EngineError::CanvasNotFound(ref id) if id == "no-such-canvas"));
    assert!(ShaderCanvas::from_element_id("no-such-canvas", "/turtle.jpg".into(), None, None, None).is_err());
}

#[wasm_bindgen_test]
fn non_canvas_element_is_rejected() {
    let div = document().create_element("div").unwrap();
    div.set_id("not-a-canvas");
    document().body().unwrap().append_child(&div).unwrap();

    let err = resolve_canvas("not-a-canvas").unwrap_err();
    assert!(matches!(err, EngineError::NotACanvas(_)));
    div.remove();
}

#[wasm_bindgen_test]
fn component_applies_class_and_defaults() {
    let canvas: web_sys::HtmlCanvasElement = document()
        .create_element("canvas")
        .unwrap()
        .unchecked_into();
    canvas.set_id("animation-id");
    document().body().unwrap().append_child(&canvas).unwrap();

    let view = ShaderCanvas::from_element_id(
        "animation-id",
        "/turtle.jpg".into(),
        None,
        Some("hero".into()),
        None,
    )
    .unwrap();
    assert_eq!(canvas.class_name(), "hero");
    assert!(!view.mounted());
    assert_eq!(view.stage(), "uninitialized");
    canvas.remove();
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    wasm_bindgen_futures::JsFuture::from(promise).await.unwrap();
}

async fn wait_for_stage(view: &ShaderCanvas, stages: &[&str]) -> String {
    for _ in 0..200 {
        let stage = view.stage();
        if stages.contains(&stage.as_str()) {
            return stage;
        }
        sleep(25).await;
    }
    view.stage()
}

#[wasm_bindgen_test]
async fn status_callback_can_read_the_stage_it_was_told_about() {
    let canvas: web_sys::HtmlCanvasElement = document()
        .create_element("canvas")
        .unwrap()
        .unchecked_into();
    document().body().unwrap().append_child(&canvas).unwrap();

    let seen: Rc<RefCell<Vec<(String, String)>>> = Rc::default();
    let slot: Rc<RefCell<Weak<ShaderCanvas>>> = Rc::default();
    let callback = Closure::<dyn FnMut(JsValue, JsValue)>::new({
        let seen = seen.clone();
        let slot = slot.clone();
        move |stage: JsValue, _detail: JsValue| {
            if let Some(view) = slot.borrow().upgrade() {
                seen.borrow_mut()
                    .push((stage.as_string().unwrap_or_default(), view.stage()));
            }
        }
    });

    let mut view = ShaderCanvas::new(canvas.clone(), "/no-such-image.png".into(), None, None, None);
    view.on_status(callback.as_ref().unchecked_ref::<js_sys::Function>().clone());
    view.mount().unwrap();
    let view = Rc::new(view);
    *slot.borrow_mut() = Rc::downgrade(&view);

    let stage = wait_for_stage(&view, &["failed", "stopped"]).await;
    if stage == "stopped" {
        // No WebGL2 in this browser: bootstrap failed before any texture load
        canvas.remove();
        return;
    }
    assert_eq!(stage, "failed");

    // Notifies `composer-ready` synchronously, while the engine is out of its cell
    assert!(view.retry());
    assert_eq!(wait_for_stage(&view, &["failed"]).await, "failed");

    let recorded = seen.borrow().clone();
    view.unmount();
    assert!(recorded.iter().any(|(reported, _)| reported == "composer-ready"));
    for (reported, read) in &recorded {
        assert_eq!(reported, read);
    }
    drop(callback);
    canvas.remove();
}
