//! Observable bootstrap stages.
//!
//! The engine comes up in a fixed order: renderer, camera, composer, mesh,
//! then the animation loop. [`StageTracker`] validates every transition once
//! so later code never has to re-check whether a prerequisite exists. A failed
//! texture load parks the engine in [`Stage::Failed`], from which a retry goes
//! back to [`Stage::ComposerReady`].

use std::fmt;

use crate::error::EngineError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    RendererReady,
    CameraReady,
    ComposerReady,
    MeshReady,
    Running,
    /// Texture loading or mesh construction failed; carries the reason.
    Failed(String),
    /// Terminal: the loop was cancelled and GPU resources released.
    Stopped,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Uninitialized => "uninitialized",
            Stage::RendererReady => "renderer-ready",
            Stage::CameraReady => "camera-ready",
            Stage::ComposerReady => "composer-ready",
            Stage::MeshReady => "mesh-ready",
            Stage::Running => "running",
            Stage::Failed(_) => "failed",
            Stage::Stopped => "stopped",
        }
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_advance_to(&self, next: &Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Stopped, _) => false,
            (_, Stopped) => true,
            (Uninitialized, RendererReady)
            | (RendererReady, CameraReady)
            | (CameraReady, ComposerReady)
            | (ComposerReady, MeshReady)
            | (MeshReady, Running)
            | (ComposerReady, Failed(_))
            | (Failed(_), ComposerReady) => true,
            _ => false,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Stage::Failed(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Failed(reason) => write!(f, "failed ({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Callback invoked after every successful stage transition.
pub type StatusListener = Box<dyn FnMut(&Stage)>;

pub struct StageTracker {
    current: Stage,
    listener: Option<StatusListener>,
}

impl StageTracker {
    pub fn new(listener: Option<StatusListener>) -> Self {
        Self {
            current: Stage::Uninitialized,
            listener,
        }
    }

    pub fn current(&self) -> &Stage {
        &self.current
    }

    /// Moves to `next`, notifying the listener.
    ///
    /// Out-of-order transitions are rejected and leave the current stage untouched.
    pub fn advance(&mut self, next: Stage) -> Result<(), EngineError> {
        if !self.current.can_advance_to(&next) {
            return Err(EngineError::InvalidTransition {
                from: self.current.clone(),
                to: next,
            });
        }
        match &next {
            Stage::Failed(reason) => log::error!("engine stage {} -> failed: {}", self.current, reason),
            _ => log::info!("engine stage {} -> {}", self.current, next),
        }
        self.current = next;
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.current);
        }
        Ok(())
    }
}

impl fmt::Debug for StageTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageTracker")
            .field("current", &self.current)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
