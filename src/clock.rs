use instant::{Duration, Instant};

/// Elapsed-time source for the `time` uniform.
///
/// Starts counting when the engine is constructed, not when the first frame
/// is drawn, so the effect is already in motion once the texture arrives.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
