//! Engine bootstrap and animation loop.
//!
//! Bootstrapping is split over two types so the loop can never run without
//! a mesh:
//! - [`PendingEngine`] owns renderer, camera, composer and an empty scene.
//!   It can be resized, can fail to load its texture and retry.
//! - [`Engine`] is created from a pending engine plus a built [`Mesh`] and is
//!   the only type with a [`tick`](Engine::tick).
//!
//! Every step is recorded in a [`StageTracker`], which rejects out-of-order
//! transitions and forwards each stage to an optional status listener.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use image::DynamicImage;

use crate::{
    aspect::Viewport,
    camera::{CameraResources, OrthographicCamera},
    clock::Clock,
    composer::Composer,
    config::EngineConfig,
    context::Context,
    data_structures::{
        geometry::PlaneGeometry, material::Material, mesh::Mesh, scene::Scene,
        texture::Texture, transform::Transform,
    },
    error::EngineError,
    pick::{SelectionChange, Selection, intersect_objects},
    pointer::PointerState,
    resources,
    stage::{Stage, StageTracker, StatusListener},
};

/// Shared cancellation flag, checked at the start of every tick.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Renderer, camera and composer are up; the mesh is not (yet).
#[derive(Debug)]
pub struct PendingEngine {
    config: EngineConfig,
    ctx: Context,
    camera: CameraResources,
    composer: Composer,
    scene: Scene,
    // Built once, reused when mesh creation is retried
    geometry: Option<Arc<PlaneGeometry>>,
    stages: StageTracker,
    clock: Clock,
    stop: StopSignal,
}

impl PendingEngine {
    /// Runs the synchronous part of the bootstrap against an already resolved surface target.
    pub async fn bootstrap(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
        config: EngineConfig,
        listener: Option<StatusListener>,
        stop: StopSignal,
    ) -> Result<Self, EngineError> {
        // The elapsed time driving the effect starts with the engine
        let clock = Clock::new();
        let ctx = Context::new(target, viewport, &config).await?;
        Self::assemble(ctx, clock, config, listener, stop)
    }

    /// Same as [`bootstrap`](Self::bootstrap), rendering into an offscreen texture.
    pub async fn headless(
        viewport: Viewport,
        config: EngineConfig,
        listener: Option<StatusListener>,
        stop: StopSignal,
    ) -> Result<Self, EngineError> {
        let clock = Clock::new();
        let ctx = Context::headless(viewport, &config).await?;
        Self::assemble(ctx, clock, config, listener, stop)
    }

    fn assemble(
        ctx: Context,
        clock: Clock,
        config: EngineConfig,
        listener: Option<StatusListener>,
        stop: StopSignal,
    ) -> Result<Self, EngineError> {
        let mut stages = StageTracker::new(listener);
        let scene = Scene::new();
        stages.advance(Stage::RendererReady)?;

        let camera = CameraResources::new(&ctx.device, OrthographicCamera::new());
        stages.advance(Stage::CameraReady)?;

        let composer = Composer::new(
            &ctx.device,
            ctx.config.format,
            ctx.sample_count,
            ctx.size(),
            config.clear_colour,
        );
        stages.advance(Stage::ComposerReady)?;

        Ok(Self {
            config,
            ctx,
            camera,
            composer,
            scene,
            geometry: None,
            stages,
            clock,
            stop,
        })
    }

    pub fn stage(&self) -> &Stage {
        self.stages.current()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The plane geometry, once a mesh build got that far.
    pub fn geometry(&self) -> Option<&Arc<PlaneGeometry>> {
        self.geometry.as_ref()
    }

    /// Before the mesh exists only renderer and composer follow the viewport.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if !self.ctx.resize(viewport) {
            return false;
        }
        let (width, height) = self.ctx.size();
        self.composer.set_size(&self.ctx.device, width, height);
        true
    }

    /// Uploads `image` and builds the textured plane.
    ///
    /// Only valid right after the composer is ready (or after [`retry`](Self::retry)).
    pub fn build_mesh(&mut self, image: &DynamicImage) -> Result<Mesh, EngineError> {
        if *self.stage() != Stage::ComposerReady {
            return Err(EngineError::InvalidTransition {
                from: self.stage().clone(),
                to: Stage::MeshReady,
            });
        }
        if self.geometry.is_some() {
            log::debug!("reusing plane geometry");
        }
        let geometry = self
            .geometry
            .get_or_insert_with(|| Arc::new(PlaneGeometry::unit()))
            .clone();
        let texture = Texture::from_image(
            &self.ctx.device,
            &self.ctx.queue,
            image,
            Some(&self.config.image_src),
        )
        .map_err(EngineError::texture_load)?;

        let material = Material::new(
            &self.ctx.device,
            &self.camera.bind_group_layout,
            texture,
            self.ctx.config.format,
            self.ctx.sample_count,
            self.config.progress,
        );
        let mesh = Mesh::new("image plane", geometry.upload(&self.ctx.device, "Plane"), material);
        self.stages.advance(Stage::MeshReady)?;
        Ok(mesh)
    }

    /// Loads the configured image and builds the mesh, recording a failure if either step fails.
    pub async fn load_mesh(&mut self) -> Result<Mesh, EngineError> {
        let src = self.config.image_src.clone();
        let result = match resources::load_image(&src).await {
            Ok(image) => self.build_mesh(&image),
            Err(e) => Err(EngineError::texture_load(e)),
        };
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    /// Moves to [`Stage::Failed`]. Logged and reported to the listener.
    pub fn fail(&mut self, err: &EngineError) {
        if let Err(e) = self.stages.advance(Stage::Failed(err.to_string())) {
            log::error!("{err} (while in stage {}: {e})", self.stage());
        }
    }

    /// Leaves [`Stage::Failed`] so the mesh can be built again.
    pub fn retry(&mut self) -> Result<(), EngineError> {
        log::info!("retrying texture load");
        self.stages.advance(Stage::ComposerReady)
    }

    /// Adds the mesh and camera to the scene, applies the current viewport and starts running.
    pub fn attach(mut self, mesh: Mesh) -> Result<Engine, EngineError> {
        if *self.stage() != Stage::MeshReady {
            mesh.dispose();
            return Err(EngineError::InvalidTransition {
                from: self.stage().clone(),
                to: Stage::Running,
            });
        }
        let geometry = self
            .geometry
            .take()
            .map(Arc::unwrap_or_clone)
            .unwrap_or_else(PlaneGeometry::unit);
        let object = self.scene.add(Transform::new(), geometry, mesh);
        self.scene.attach_camera();

        let mut engine = Engine {
            config: self.config,
            ctx: self.ctx,
            camera: self.camera,
            composer: self.composer,
            scene: self.scene,
            stages: self.stages,
            clock: self.clock,
            stop: self.stop,
            pointer: PointerState::new(),
            selection: Selection::default(),
            object,
        };
        let viewport = engine.ctx.viewport;
        engine.resize(viewport);
        engine.stages.advance(Stage::Running)?;
        Ok(engine)
    }

    /// Tears down without ever running (unmounted while loading).
    pub fn dispose(mut self) {
        self.composer.dispose();
        self.camera.dispose();
        self.scene.dispose();
        self.ctx.dispose();
        if let Err(e) = self.stages.advance(Stage::Stopped) {
            log::warn!("{e}");
        }
    }
}

/// A running engine: the mesh is in the scene and the loop may tick.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    ctx: Context,
    camera: CameraResources,
    composer: Composer,
    scene: Scene,
    stages: StageTracker,
    clock: Clock,
    stop: StopSignal,
    pointer: PointerState,
    selection: Selection,
    object: u32,
}

impl Engine {
    pub fn stage(&self) -> &Stage {
        self.stages.current()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn selection(&self) -> Option<u32> {
        self.selection.current()
    }

    /// Pick id of the image plane.
    pub fn object_id(&self) -> u32 {
        self.object
    }

    /// One animation frame.
    ///
    /// Returns `Ok(false)` once a stop was requested; the engine is disposed
    /// by then and no further frame should be scheduled.
    pub fn tick(&mut self) -> Result<bool, EngineError> {
        if self.stop.is_requested() {
            self.dispose();
            return Ok(false);
        }
        if *self.stage() == Stage::Stopped {
            return Err(EngineError::Stopped);
        }

        let time = self.clock.elapsed_secs();
        for object in self.scene.objects_mut() {
            object.mesh.material.set_time(time);
            object.mesh.material.mark_dirty();
        }

        let Some(frame) = self.ctx.current_frame()? else {
            return Ok(true);
        };
        self.composer.render(
            &self.ctx.device,
            &self.ctx.queue,
            &mut self.scene,
            &self.camera,
            &frame.view,
        );
        frame.present();
        Ok(true)
    }

    /// Applies a new viewport to material, renderer and composer together.
    ///
    /// Empty viewports are ignored. Applying the same viewport twice leaves
    /// the same state behind.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if viewport.is_empty() {
            return false;
        }
        let resolution = viewport.resolution(self.config.image_ratio);
        for object in self.scene.objects_mut() {
            object.mesh.material.set_resolution(resolution);
            object.mesh.material.mark_dirty();
        }
        self.ctx.resize(viewport);
        let (width, height) = self.ctx.size();
        self.composer.set_size(&self.ctx.device, width, height);
        log::debug!(
            "resized to {}x{} css px, buffer {width}x{height}, resolution {:?}",
            viewport.width,
            viewport.height,
            resolution
        );
        true
    }

    /// Tracks the pointer (CSS pixels relative to the surface) and updates the selection.
    pub fn on_pointer_move(&mut self, client_x: f64, client_y: f64) -> SelectionChange {
        let viewport = self.ctx.viewport;
        if !self
            .pointer
            .on_move(client_x, client_y, viewport.width, viewport.height)
        {
            return SelectionChange::Unchanged;
        }
        let ray = self.camera.camera.ray_through(self.pointer.ndc());
        let hit = intersect_objects(&ray, self.scene.objects());
        let change = self.selection.update(hit.map(|h| h.id));
        match change {
            SelectionChange::Selected(id) => log::info!("pointer over object {id}"),
            SelectionChange::Cleared(id) => log::info!("pointer left object {id}"),
            SelectionChange::Unchanged => {}
        }
        change
    }

    /// Moves the image plane. Picking follows the new placement.
    pub fn set_transform(&mut self, transform: Transform) {
        self.scene.set_transform(self.object, transform);
    }

    pub fn set_progress(&mut self, progress: f32) {
        for object in self.scene.objects_mut() {
            object.mesh.material.set_progress(progress);
            object.mesh.material.mark_dirty();
        }
    }

    /// Releases every GPU resource. Safe to call more than once.
    pub fn dispose(&mut self) {
        if *self.stage() == Stage::Stopped {
            return;
        }
        self.stop.request();
        self.scene.dispose();
        self.composer.dispose();
        self.camera.dispose();
        self.ctx.dispose();
        if let Err(e) = self.stages.advance(Stage::Stopped) {
            log::warn!("{e}");
        }
    }
}
