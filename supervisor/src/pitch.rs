//! Canonical-frame view of the simulation.
//!
//! The referee reasons in team red's frame (red defends -x). During the
//! second half the teams have swapped ends, so world coordinates are rotated
//! half a turn on the way in and out.

use crate::backend::{Entity, RobotPose, SimulationBackend, SimulationTerminated, Touches};
use shared::{Pose, Team, Vector2, NUMBER_OF_ROBOTS};

pub struct Pitch<B> {
    sim: B,
    mirrored: bool,
}

impl<B: SimulationBackend> Pitch<B> {
    pub fn new(sim: B) -> Self {
        Self {
            sim,
            mirrored: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.sim
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.sim
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    // Converts world <-> canonical; the transform is its own inverse.
    fn convert(&self, pose: Pose) -> Pose {
        if self.mirrored {
            pose.rotated_half_turn()
        } else {
            pose
        }
    }

    pub fn robot(&self, team: Team, id: usize) -> RobotPose {
        let observed = self.sim.robot_pose(team, id);
        RobotPose {
            pose: self.convert(observed.pose),
            standing: observed.standing,
        }
    }

    pub fn ball(&self) -> Vector2 {
        let world = self.sim.ball_position();
        self.convert(Pose::new(world.x, world.y, 0.0)).position()
    }

    pub fn ball_speed(&self) -> f64 {
        self.sim.ball_speed()
    }

    pub fn place_robot(&mut self, team: Team, id: usize, pose: Pose) {
        let entity = Entity::Robot(team, id);
        let world = self.convert(pose);
        self.sim.actuate(team, id, 0.0, 0.0);
        self.sim.teleport(entity, world);
        self.sim.reset_physics(entity);
    }

    pub fn place_ball(&mut self, position: Vector2) {
        let world = self.convert(Pose::new(position.x, position.y, 0.0));
        self.sim.teleport(Entity::Ball, world);
        self.sim.reset_physics(Entity::Ball);
    }

    pub fn set_wheels(&mut self, team: Team, id: usize, left: f64, right: f64) {
        self.sim.actuate(team, id, left, right);
    }

    pub fn stop_robots(&mut self) {
        for team in Team::ALL {
            for id in 0..NUMBER_OF_ROBOTS {
                self.sim.actuate(team, id, 0.0, 0.0);
            }
        }
    }

    pub fn advance(&mut self, duration_ms: u64) -> Result<(), SimulationTerminated> {
        self.sim.advance(duration_ms)
    }

    pub fn take_touches(&mut self) -> Touches {
        self.sim.take_touches()
    }

    pub fn time_ms(&self) -> u64 {
        self.sim.time_ms()
    }

    /// True when the ball or any robot other than `except` lies within
    /// `radius` of `target`.
    pub fn any_object_nearby(&self, target: Vector2, radius: f64, except: Option<(Team, usize)>) -> bool {
        if self.ball().distance(&target) < radius {
            return true;
        }
        Team::ALL.iter().any(|&team| {
            (0..NUMBER_OF_ROBOTS).any(|id| {
                except != Some((team, id))
                    && self.robot(team, id).pose.position().distance(&target) < radius
            })
        })
    }
}
