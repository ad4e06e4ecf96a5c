#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod gpu {
    use cgmath::Vector2;
    use shade_ngin::{
        aspect::Viewport,
        composer::Composer,
        pick::intersect_objects,
    };

    use crate::common::{self, FORMAT, SIZE};

    fn is_red(pixel: &image::Rgba<u8>) -> bool {
        pixel[0] > 200 && pixel[1] < 40 && pixel[2] < 40 && pixel[3] > 200
    }

    #[test]
    fn should_render_image_through_both_passes() {
        let Some(gpu) = common::gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let camera = common::camera(&gpu);
        let mut scene = common::image_scene(&gpu, &camera, &common::solid_image([255, 0, 0, 255]));
        let resolution = Viewport::new(f64::from(SIZE), f64::from(SIZE), 1.0, 2.0).resolution(1.0);
        for object in scene.objects_mut() {
            object.mesh.material.set_resolution(resolution);
            object.mesh.material.mark_dirty();
        }

        let mut composer = Composer::new(&gpu.device, FORMAT, 1, (SIZE, SIZE), wgpu::Color::TRANSPARENT);
        assert_eq!(composer.pass_names(), vec!["scene", "diffuse"]);
        let output = common::output_texture(&gpu);
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        composer.render(&gpu.device, &gpu.queue, &mut scene, &camera, &view);

        let pixels = common::read_pixels(&gpu.device, &gpu.queue, &output);
        let centre = pixels.get_pixel(SIZE / 2, SIZE / 2);
        assert!(is_red(centre), "centre pixel {centre:?}");
        assert!(!scene.objects()[0].mesh.material.needs_update());
    }

    #[test]
    fn should_clear_when_camera_is_not_attached() {
        let Some(gpu) = common::gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let camera = common::camera(&gpu);
        let mut scene = shade_ngin::data_structures::scene::Scene::new();
        let mut composer = Composer::new(&gpu.device, FORMAT, 1, (SIZE, SIZE), wgpu::Color::TRANSPARENT);
        let output = common::output_texture(&gpu);
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        composer.render(&gpu.device, &gpu.queue, &mut scene, &camera, &view);

        let pixels = common::read_pixels(&gpu.device, &gpu.queue, &output);
        assert!(pixels.pixels().all(|p| p[3] == 0), "expected a fully transparent frame");
    }

    #[test]
    fn composer_resize_is_idempotent() {
        let Some(gpu) = common::gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let mut composer = Composer::new(&gpu.device, FORMAT, 1, (SIZE, SIZE), wgpu::Color::BLACK);
        assert!(composer.set_size(&gpu.device, 128, 64));
        assert!(!composer.set_size(&gpu.device, 128, 64));
        assert_eq!(composer.size(), (128, 64));
        // Zero sizes are clamped to a 1x1 target
        assert!(composer.set_size(&gpu.device, 0, 0));
        assert_eq!(composer.size(), (1, 1));
    }

    #[test]
    fn should_render_after_composer_targets_are_recreated() {
        let Some(gpu) = common::gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let camera = common::camera(&gpu);
        let mut scene = common::image_scene(&gpu, &camera, &common::solid_image([255, 0, 0, 255]));
        let mut composer = Composer::new(&gpu.device, FORMAT, 1, (SIZE, SIZE), wgpu::Color::TRANSPARENT);
        let output = common::output_texture(&gpu);
        let view = output.create_view(&wgpu::TextureViewDescriptor::default());
        composer.render(&gpu.device, &gpu.queue, &mut scene, &camera, &view);

        // The old targets are destroyed; the diffuse pass must sample the new ones
        assert!(composer.set_size(&gpu.device, SIZE / 2, SIZE / 2));
        assert!(composer.set_size(&gpu.device, SIZE, SIZE));
        composer.render(&gpu.device, &gpu.queue, &mut scene, &camera, &view);

        let pixels = common::read_pixels(&gpu.device, &gpu.queue, &output);
        let centre = pixels.get_pixel(SIZE / 2, SIZE / 2);
        assert!(is_red(centre), "centre pixel {centre:?}");
    }

    #[test]
    fn pointer_ray_hits_the_image_plane() {
        let Some(gpu) = common::gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let camera = common::camera(&gpu);
        let scene = common::image_scene(&gpu, &camera, &common::solid_image([0, 255, 0, 255]));
        let id = scene.objects()[0].id;

        let ray = camera.camera.ray_through(Vector2::new(0.3, -0.2));
        let hit = intersect_objects(&ray, scene.objects()).expect("ray should hit the plane");
        assert_eq!(hit.id, id);
        assert!((hit.point.z).abs() < 1e-5);

        // Just outside the unit view volume
        let ray = camera.camera.ray_through(Vector2::new(1.05, 0.0));
        assert!(intersect_objects(&ray, scene.objects()).is_none());
    }
}
