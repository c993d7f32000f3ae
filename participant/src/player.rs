//! Decision making for a team participant.

use shared::{Frame, GameInfo, NUMBER_OF_ROBOTS};

/// A team strategy driven by the frames the supervisor sends.
pub trait Player {
    /// Called once with the answer to `get_info`, before `ready` is sent.
    fn init(&mut self, _info: &GameInfo) {}

    /// Returns left/right wheel speeds for every robot, or `None` to leave
    /// the previous command in place.
    fn update(&mut self, frame: &Frame) -> Option<Vec<f64>>;

    /// Called with the frame that ended the match.
    fn finish(&mut self, _frame: &Frame) {}
}

/// Drives every robot straight ahead at its maximum linear velocity.
#[derive(Debug, Clone, Default)]
pub struct SkeletonPlayer {
    max_linear_velocity: [f64; NUMBER_OF_ROBOTS],
}

impl SkeletonPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.max_linear_velocity.iter().flat_map(|&v| [v, v]).collect()
    }
}

impl Player for SkeletonPlayer {
    fn init(&mut self, info: &GameInfo) {
        self.max_linear_velocity = info.max_linear_velocity;
    }

    fn update(&mut self, _frame: &Frame) -> Option<Vec<f64>> {
        Some(self.speeds())
    }
}
