use crate::backend::{Entity, RobotPose, SimulationBackend, SimulationTerminated, Touches};
use crate::formation;
use crate::pitch::Pitch;
use shared::{Pose, Team, Vector2, NUMBER_OF_ROBOTS};

/// Backend whose observations are set directly by the test.
pub struct ScriptedBackend {
    pub robots: [[RobotPose; NUMBER_OF_ROBOTS]; 2],
    pub ball: Vector2,
    pub ball_speed: f64,
    pub wheels: [[(f64, f64); NUMBER_OF_ROBOTS]; 2],
    pub touches: Touches,
    pub time_ms: u64,
    pub terminate_at_ms: Option<u64>,
    pub teleports: Vec<(Entity, Pose)>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        let robots = [Team::Red, Team::Blue].map(|team| {
            std::array::from_fn(|id| RobotPose {
                pose: formation::default_slot(team, id),
                standing: true,
            })
        });
        Self {
            robots,
            ball: Vector2::ZERO,
            ball_speed: 1.0,
            wheels: [[(0.0, 0.0); NUMBER_OF_ROBOTS]; 2],
            touches: [[false; NUMBER_OF_ROBOTS]; 2],
            time_ms: 0,
            terminate_at_ms: None,
            teleports: Vec::new(),
        }
    }

    pub fn move_robot(&mut self, team: Team, id: usize, x: f64, y: f64) {
        self.robots[team.index()][id].pose = Pose::new(x, y, 0.0);
    }

    pub fn touch(&mut self, team: Team, id: usize) {
        self.touches[team.index()][id] = true;
    }

    /// Moves every robot far away from the given point.
    pub fn park_robots(&mut self) {
        for team in Team::ALL {
            for id in 0..NUMBER_OF_ROBOTS {
                let x = if team == Team::Red { -1.0 } else { 1.0 };
                self.move_robot(team, id, x, -2.0 + id as f64 * 0.3);
            }
        }
    }
}

impl SimulationBackend for ScriptedBackend {
    fn robot_pose(&self, team: Team, id: usize) -> RobotPose {
        self.robots[team.index()][id]
    }

    fn ball_position(&self) -> Vector2 {
        self.ball
    }

    fn ball_speed(&self) -> f64 {
        self.ball_speed
    }

    fn actuate(&mut self, team: Team, id: usize, left: f64, right: f64) {
        self.wheels[team.index()][id] = (left, right);
    }

    fn teleport(&mut self, entity: Entity, pose: Pose) {
        match entity {
            Entity::Robot(team, id) => self.robots[team.index()][id].pose = pose,
            Entity::Ball => self.ball = pose.position(),
        }
        self.teleports.push((entity, pose));
    }

    fn reset_physics(&mut self, entity: Entity) {
        if entity == Entity::Ball {
            self.ball_speed = 0.0;
        }
    }

    fn advance(&mut self, duration_ms: u64) -> Result<(), SimulationTerminated> {
        self.time_ms += duration_ms;
        match self.terminate_at_ms {
            Some(limit) if self.time_ms >= limit => Err(SimulationTerminated),
            _ => Ok(()),
        }
    }

    fn take_touches(&mut self) -> Touches {
        std::mem::replace(&mut self.touches, [[false; NUMBER_OF_ROBOTS]; 2])
    }

    fn time_ms(&self) -> u64 {
        self.time_ms
    }
}

pub fn scripted_pitch() -> Pitch<ScriptedBackend> {
    Pitch::new(ScriptedBackend::new())
}
