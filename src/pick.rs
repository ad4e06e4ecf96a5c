//! Ray casting and selection tracking.
//!
//! Picking works on the CPU copies of scene geometry:
//! 1. The pointer is converted to normalized device coordinates
//! 2. The camera casts a [`Ray`] through that point
//! 3. Every [`Pickable`] is tested triangle by triangle (Möller–Trumbore)
//! 4. The nearest hit is compared with the previous selection
//!
//! Step 4 makes sure a selection change is only reported once, not on every
//! pointer move over the same object.

use cgmath::{InnerSpace, Point3, Vector3};

const EPSILON: f32 = 1e-7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// `direction` is normalized on construction.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the triangle `(a, b, c)`, if it is hit in front of the origin.
    ///
    /// Both faces count as hits.
    pub fn intersect_triangle(
        &self,
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
    ) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let t_vec = self.origin - a;
        let u = t_vec.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = t_vec.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Anything the ray caster can test against.
pub trait Pickable {
    fn pick_id(&self) -> u32;

    /// Triangles in world space.
    fn world_triangles(&self) -> Vec<[Point3<f32>; 3]>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub id: u32,
    pub distance: f32,
    pub point: Point3<f32>,
}

/// Returns the nearest hit among `objects`.
pub fn intersect_objects<'a, P, I>(ray: &Ray, objects: I) -> Option<Hit>
where
    P: Pickable + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut nearest: Option<Hit> = None;
    for object in objects {
        for [a, b, c] in object.world_triangles() {
            if let Some(distance) = ray.intersect_triangle(a, b, c) {
                if nearest.is_none_or(|hit| distance < hit.distance) {
                    nearest = Some(Hit {
                        id: object.pick_id(),
                        distance,
                        point: ray.at(distance),
                    });
                }
            }
        }
    }
    nearest
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(u32),
    Cleared(u32),
    Unchanged,
}

/// Remembers the last hit object so only changes are reported.
#[derive(Clone, Copy, Debug, Default)]
pub struct Selection {
    current: Option<u32>,
}

impl Selection {
    pub fn current(&self) -> Option<u32> {
        self.current
    }

    pub fn update(&mut self, hit: Option<u32>) -> SelectionChange {
        match (hit, self.current) {
            (Some(id), Some(prev)) if id == prev => SelectionChange::Unchanged,
            (Some(id), _) => {
                self.current = Some(id);
                SelectionChange::Selected(id)
            }
            (None, Some(prev)) => {
                self.current = None;
                SelectionChange::Cleared(prev)
            }
            (None, None) => SelectionChange::Unchanged,
        }
    }
}
