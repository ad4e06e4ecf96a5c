//! Object placement in world space.

use cgmath::{Matrix4, One, Point3, Quaternion, Transform as _, Vector3};

/// Position, rotation and scale of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn apply(&self, point: Point3<f32>) -> Point3<f32> {
        self.to_matrix().transform_point(point)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
