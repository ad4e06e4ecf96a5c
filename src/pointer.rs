//! Normalized pointer position and velocity.

use cgmath::Vector2;

/// Pointer state in `[0, 1]` coordinates, x left-to-right, y bottom-to-top.
///
/// `speed_*` is the delta between the latest two positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pointer move at client coordinates inside a `width` x `height` viewport.
    ///
    /// Client coordinates have their origin at the top-left, so y is flipped.
    /// Positions outside the viewport are clamped to its edge. Returns `false`
    /// (and leaves the state untouched) for an empty viewport.
    pub fn on_move(&mut self, client_x: f64, client_y: f64, width: f64, height: f64) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        self.prev_x = self.x;
        self.prev_y = self.y;
        self.x = (client_x / width).clamp(0.0, 1.0) as f32;
        self.y = (1.0 - client_y / height).clamp(0.0, 1.0) as f32;
        self.speed_x = self.x - self.prev_x;
        self.speed_y = self.y - self.prev_y;
        true
    }

    pub fn position(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }

    pub fn velocity(&self) -> Vector2<f32> {
        Vector2::new(self.speed_x, self.speed_y)
    }

    /// Position in normalized device coordinates (`[-1, 1]`, y up).
    pub fn ndc(&self) -> Vector2<f32> {
        Vector2::new(self.x * 2.0 - 1.0, self.y * 2.0 - 1.0)
    }
}
