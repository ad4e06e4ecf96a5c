//! The scene: a flat list of drawable, pickable objects.

use cgmath::Point3;

use crate::{
    data_structures::{geometry::PlaneGeometry, mesh::Mesh, transform::Transform},
    pick::Pickable,
};

/// A mesh placed in the world. Keeps the CPU geometry for picking.
#[derive(Debug)]
pub struct SceneObject {
    pub id: u32,
    pub transform: Transform,
    pub geometry: PlaneGeometry,
    pub mesh: Mesh,
}

impl Pickable for SceneObject {
    fn pick_id(&self) -> u32 {
        self.id
    }

    fn world_triangles(&self) -> Vec<[Point3<f32>; 3]> {
        let matrix = self.transform.to_matrix();
        self.geometry
            .triangles()
            .map(|tri| tri.map(|p| cgmath::Transform::transform_point(&matrix, p)))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    camera_attached: bool,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh and returns its pick id. Ids start at 1.
    pub fn add(&mut self, transform: Transform, geometry: PlaneGeometry, mut mesh: Mesh) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        mesh.material.set_model(transform.to_matrix());
        mesh.material.mark_dirty();
        log::info!("scene: added `{}` as object {id}", mesh.name);
        self.objects.push(SceneObject {
            id,
            transform,
            geometry,
            mesh,
        });
        id
    }

    pub fn attach_camera(&mut self) {
        self.camera_attached = true;
    }

    pub fn has_camera(&self) -> bool {
        self.camera_attached
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    /// Places object `id`. Returns `false` if there is no such object.
    pub fn set_transform(&mut self, id: u32, transform: Transform) -> bool {
        let Some(object) = self.objects.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        object.transform = transform;
        object.mesh.material.set_model(transform.to_matrix());
        object.mesh.material.mark_dirty();
        true
    }

    /// Uploads every material whose uniforms changed.
    pub fn flush_uniforms(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            object.mesh.material.flush(queue);
        }
    }

    /// Destroys every GPU resource and empties the scene.
    pub fn dispose(&mut self) {
        for object in self.objects.drain(..) {
            object.mesh.dispose();
        }
        self.camera_attached = false;
    }
}
