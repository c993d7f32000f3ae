//! Collaborators the supervisor drives but does not implement: the physics
//! simulation and the per-team camera.
//!
//! Everything crossing these traits is in world coordinates. The [`Pitch`]
//! wrapper converts to the canonical match frame.
//!
//! [`Pitch`]: crate::pitch::Pitch

use shared::{Pose, Subimage, Team, Vector2, NUMBER_OF_ROBOTS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotPose {
    pub pose: Pose,
    /// False while the robot lies on its side or back.
    pub standing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Robot(Team, usize),
    Ball,
}

/// Per team, per robot: did the robot touch the ball.
pub type Touches = [[bool; NUMBER_OF_ROBOTS]; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("simulation terminated")]
pub struct SimulationTerminated;

pub trait SimulationBackend {
    fn robot_pose(&self, team: Team, id: usize) -> RobotPose;

    fn ball_position(&self) -> Vector2;

    /// Ball speed in metres per second.
    fn ball_speed(&self) -> f64;

    /// Sets wheel angular velocities in radians per second.
    fn actuate(&mut self, team: Team, id: usize, left: f64, right: f64);

    /// Moves the entity; the heading is ignored for the ball.
    fn teleport(&mut self, entity: Entity, pose: Pose);

    /// Clears the entity's velocities.
    fn reset_physics(&mut self, entity: Entity);

    /// Advances the simulation by `duration_ms`.
    fn advance(&mut self, duration_ms: u64) -> Result<(), SimulationTerminated>;

    /// Drains the ball contacts reported since the previous call.
    fn take_touches(&mut self) -> Touches;

    /// Total simulated time.
    fn time_ms(&self) -> u64;
}

pub trait VisionCapture {
    /// Tiles that changed in the team's camera image since the last call.
    fn next_subimages(&mut self, team: Team, time_ms: u64) -> Vec<Subimage>;

    /// Forgets the previous image so the next call sends a full frame.
    fn reset(&mut self, team: Team);
}

/// Vision capture for runs without a camera.
#[derive(Debug, Default)]
pub struct NullVision;

impl VisionCapture for NullVision {
    fn next_subimages(&mut self, _team: Team, _time_ms: u64) -> Vec<Subimage> {
        Vec::new()
    }

    fn reset(&mut self, _team: Team) {}
}
