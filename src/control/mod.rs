//! Closed-loop control of chamber humidity and fan speed.

pub mod fan;
pub mod humidity;
pub mod pid;

/// Per-loop control bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState {
    /// Changes only through explicit start / stop.
    pub active: bool,
    /// One-shot: swallows the key release that follows a hold-to-stop.
    pub recently_stopped: bool,
    /// Latched on a failed reading until a good one arrives.
    pub error_handling: bool,
    /// Clamped set-point.
    pub target: f32,
    /// Last loop output.
    pub output: f32,
}

impl ControlState {
    pub fn with_target(target: f32) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Target as reported to the host: `None` while the loop is off.
    pub fn active_target(&self) -> Option<f32> {
        self.active.then_some(self.target)
    }
}
