#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod engine {
    use std::{cell::RefCell, rc::Rc, sync::Arc};

    use cgmath::Vector3;
    use image::DynamicImage;
    use shade_ngin::{
        EngineConfig, EngineError, PendingEngine, Stage, StopSignal,
        aspect::Viewport,
        data_structures::transform::Transform,
        pick::SelectionChange,
        stage::StatusListener,
    };

    use crate::common;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, StatusListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let listener: StatusListener = Box::new(move |stage: &Stage| sink.borrow_mut().push(stage.name()));
        (seen, listener)
    }

    /// `None` (and a note on stderr) when the machine has no GPU adapter.
    fn pending(
        width: f64,
        height: f64,
        config: EngineConfig,
        listener: Option<StatusListener>,
    ) -> Option<PendingEngine> {
        let viewport = Viewport::new(width, height, 1.0, 2.0);
        match futures::executor::block_on(PendingEngine::headless(
            viewport,
            config,
            listener,
            StopSignal::new(),
        )) {
            Ok(engine) => Some(engine),
            Err(EngineError::Adapter(e)) => {
                eprintln!("no GPU adapter available ({e}), skipping");
                None
            }
            Err(e) => panic!("headless bootstrap failed: {e}"),
        }
    }

    fn resolution_of(engine: &shade_ngin::Engine) -> [f32; 4] {
        engine.scene().objects()[0].mesh.material.uniform.resolution
    }

    #[test]
    fn failed_texture_is_retried_with_the_same_geometry() {
        let (seen, listener) = recorder();
        let Some(mut pending) = pending(256.0, 256.0, EngineConfig::new("gradient.png"), Some(listener)) else {
            return;
        };
        assert_eq!(*pending.stage(), Stage::ComposerReady);

        let err = pending
            .build_mesh(&DynamicImage::new_rgba8(0, 0))
            .expect_err("an empty image cannot be uploaded");
        pending.fail(&err);
        assert!(pending.stage().is_failed());
        let geometry = pending.geometry().cloned().expect("geometry is built before the texture");

        pending.retry().unwrap();
        let mesh = futures::executor::block_on(pending.load_mesh()).expect("bundled asset loads");
        assert_eq!(*pending.stage(), Stage::MeshReady);
        assert!(Arc::ptr_eq(&geometry, pending.geometry().unwrap()));

        let engine = pending.attach(mesh).unwrap();
        assert_eq!(*engine.stage(), Stage::Running);
        assert_eq!(
            *seen.borrow(),
            vec![
                "renderer-ready",
                "camera-ready",
                "composer-ready",
                "failed",
                "composer-ready",
                "mesh-ready",
                "running",
            ]
        );
    }

    #[test]
    fn missing_asset_moves_to_failed() {
        let config = EngineConfig::new("definitely/not/here.png");
        let Some(mut pending) = pending(256.0, 256.0, config, None) else {
            return;
        };
        assert!(futures::executor::block_on(pending.load_mesh()).is_err());
        assert!(pending.stage().is_failed());
        assert!(pending.geometry().is_none());
        pending.dispose();
    }

    #[test]
    fn attach_applies_the_viewport_before_running() {
        let config = EngineConfig::new("red.png").with_image_ratio(1.5);
        let Some(mut pending) = pending(1600.0, 900.0, config, None) else {
            return;
        };
        let mesh = pending.build_mesh(&common::solid_image([255, 0, 0, 255])).unwrap();
        let engine = pending.attach(mesh).unwrap();

        let [x, y, z, w] = resolution_of(&engine);
        assert_eq!((x, y, z), (1600.0, 900.0, 1.0));
        assert!((w - 0.84375).abs() < 1e-4, "w = {w}");
        assert_eq!(engine.context().size(), (1600, 900));
        assert_eq!(engine.composer().size(), (1600, 900));
    }

    #[test]
    fn resize_updates_uniform_renderer_and_composer_together() {
        let config = EngineConfig::new("red.png").with_image_ratio(1.5);
        let Some(mut pending) = pending(1600.0, 900.0, config, None) else {
            return;
        };
        let mesh = pending.build_mesh(&common::solid_image([255, 0, 0, 255])).unwrap();
        let mut engine = pending.attach(mesh).unwrap();

        let portrait = Viewport::new(900.0, 1600.0, 1.0, 2.0);
        assert!(engine.resize(portrait));
        let first = resolution_of(&engine);
        assert_eq!((first[0], first[1], first[3]), (900.0, 1600.0, 1.0));
        assert!((first[2] - 0.375).abs() < 1e-4, "z = {}", first[2]);
        assert_eq!(engine.context().size(), (900, 1600));
        assert_eq!(engine.composer().size(), (900, 1600));
        let texture = engine.context().offscreen_texture().unwrap();
        assert_eq!((texture.width(), texture.height()), (900, 1600));

        assert!(engine.resize(portrait));
        assert_eq!(resolution_of(&engine), first);

        // Minimised windows report 0x0
        assert!(!engine.resize(Viewport::new(0.0, 0.0, 1.0, 2.0)));
        assert_eq!(resolution_of(&engine), first);
        assert_eq!(engine.composer().size(), (900, 1600));
    }

    #[test]
    fn pointer_moves_select_and_clear_the_plane() {
        let Some(mut pending) = pending(200.0, 200.0, EngineConfig::new("red.png"), None) else {
            return;
        };
        let mesh = pending.build_mesh(&common::solid_image([255, 0, 0, 255])).unwrap();
        let mut engine = pending.attach(mesh).unwrap();
        let id = engine.object_id();

        assert_eq!(engine.on_pointer_move(100.0, 100.0), SelectionChange::Selected(id));
        assert_eq!(engine.on_pointer_move(120.0, 90.0), SelectionChange::Unchanged);
        assert_eq!(engine.selection(), Some(id));
        let pointer = engine.pointer();
        assert!((pointer.speed_x - 0.1).abs() < 1e-5);
        assert!((pointer.speed_y - 0.05).abs() < 1e-5);

        // Shrink the plane so the corner of the view is empty
        engine.set_transform(Transform {
            scale: Vector3::new(0.5, 0.5, 1.0),
            ..Transform::new()
        });
        assert_eq!(engine.on_pointer_move(10.0, 10.0), SelectionChange::Cleared(id));
        assert_eq!(engine.selection(), None);
    }

    #[test]
    fn tick_renders_offscreen_until_stopped() {
        let (seen, listener) = recorder();
        let Some(mut pending) = pending(256.0, 256.0, EngineConfig::new("red.png"), Some(listener)) else {
            return;
        };
        let mesh = pending.build_mesh(&common::solid_image([255, 0, 0, 255])).unwrap();
        let mut engine = pending.attach(mesh).unwrap();

        assert!(engine.tick().unwrap());
        let ctx = engine.context();
        let output = ctx.offscreen_texture().unwrap();
        let pixels = common::read_pixels(&ctx.device, &ctx.queue, output);
        let centre = pixels.get_pixel(128, 128);
        assert!(centre[0] > 200 && centre[1] < 40 && centre[2] < 40, "centre pixel {centre:?}");

        engine.stop_signal().request();
        assert!(!engine.tick().unwrap());
        assert_eq!(*engine.stage(), Stage::Stopped);
        assert!(engine.context().offscreen_texture().is_none());
        assert_eq!(seen.borrow().last(), Some(&"stopped"));
    }
}
