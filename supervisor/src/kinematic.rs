use crate::backend::{Entity, RobotPose, SimulationBackend, SimulationTerminated, Touches};
use crate::formation;
use shared::{
    normalize_angle, Pose, Team, Vector2, AXLE_LENGTH, BALL_RADIUS, CORNER_LENGTH, FIELD_LENGTH, FIELD_WIDTH,
    GOAL_DEPTH, GOAL_WIDTH, NUMBER_OF_ROBOTS, ROBOT_SIZE, WHEEL_RADIUS,
};

/// Integration step of the kinematic simulation.
pub const SUBSTEP_MS: u64 = 10;
/// Fraction of ball speed lost per second of rolling.
pub const BALL_DAMPING: f64 = 0.8;
/// Fraction of normal speed kept after a bounce.
pub const BALL_RESTITUTION: f64 = 0.7;
/// Rolling ball slower than this stops.
const BALL_REST_SPEED: f64 = 0.01;

const HALF_LENGTH: f64 = FIELD_LENGTH / 2.0;
const HALF_WIDTH: f64 = FIELD_WIDTH / 2.0;
const HALF_GOAL_WIDTH: f64 = GOAL_WIDTH / 2.0;

///Represents a differential-drive robot.
#[derive(Debug, Clone, Copy)]
pub struct RobotBody {
    pub pose: Pose,
    ///Left and right wheel angular velocities in rad/s.
    pub wheels: (f64, f64),
    pub id: usize,
}

impl RobotBody {
    fn radius(&self) -> f64 {
        ROBOT_SIZE[self.id] / 2.0
    }

    ///Forward speed in m/s.
    pub fn linear_speed(&self) -> f64 {
        (self.wheels.0 + self.wheels.1) / 2.0 * WHEEL_RADIUS[self.id]
    }

    ///Velocity vector in m/s.
    pub fn velocity(&self) -> Vector2 {
        let v = self.linear_speed();
        Vector2::new(v * self.pose.th.cos(), v * self.pose.th.sin())
    }

    ///Moves the robot along its heading and turns it.
    pub fn simulate(&mut self, dt: f64) {
        let (left, right) = self.wheels;
        let w = (right - left) * WHEEL_RADIUS[self.id] / AXLE_LENGTH[self.id];
        let v = self.velocity();
        self.pose.x += v.x * dt;
        self.pose.y += v.y * dt;
        self.pose.th = normalize_angle(self.pose.th + w * dt);
    }

    ///Keeps the robot inside the walls and the goals.
    pub fn resolve_walls(&mut self) {
        let r = self.radius();
        self.pose.y = self.pose.y.clamp(-(HALF_WIDTH - r), HALF_WIDTH - r);
        let limit_x = if self.pose.y.abs() <= HALF_GOAL_WIDTH - r {
            HALF_LENGTH + GOAL_DEPTH - r
        } else {
            HALF_LENGTH - r
        };
        self.pose.x = self.pose.x.clamp(-limit_x, limit_x);
    }

    ///Pushes two overlapping robots apart by half the overlap each.
    pub fn separate(&mut self, other: &mut RobotBody) {
        let delta = self.pose.position().sub(&other.pose.position());
        let distance = delta.magnitude();
        let overlap = self.radius() + other.radius() - distance;
        if overlap <= 0.0 {
            return;
        }
        let normal = if distance > 0.0 {
            delta.scale(1.0 / distance)
        } else {
            Vector2::new(1.0, 0.0)
        };
        let push = normal.scale(overlap / 2.0);
        self.pose.x += push.x;
        self.pose.y += push.y;
        other.pose.x -= push.x;
        other.pose.y -= push.y;
    }
}

///Represents the rolling ball.
#[derive(Debug, Clone, Copy, Default)]
pub struct BallBody {
    pub position: Vector2,
    pub velocity: Vector2,
}

impl BallBody {
    ///Rolls the ball and applies friction.
    pub fn simulate(&mut self, dt: f64) {
        self.position = self.position.add(&self.velocity.scale(dt));
        self.velocity = self.velocity.scale((1.0 - BALL_DAMPING * dt).max(0.0));
        if self.velocity.magnitude() < BALL_REST_SPEED {
            self.velocity = Vector2::ZERO;
        }
    }

    fn bounce(&mut self, normal: Vector2) {
        let towards = self.velocity.dot(&normal);
        if towards < 0.0 {
            self.velocity = self.velocity.sub(&normal.scale((1.0 + BALL_RESTITUTION) * towards));
        }
    }

    ///Bounces the ball off the walls, the goal nets and the cut corners.
    ///Returns true if any wall was hit.
    pub fn resolve_walls(&mut self) -> bool {
        let r = BALL_RADIUS;
        let mut hit = false;
        let (sx, sy) = (self.position.x.signum(), self.position.y.signum());

        if self.position.y.abs() > HALF_WIDTH - r {
            self.position.y = sy * (HALF_WIDTH - r);
            self.bounce(Vector2::new(0.0, -sy));
            hit = true;
        }

        let in_goal = self.position.x.abs() > HALF_LENGTH - r;
        if in_goal && self.position.y.abs() < HALF_GOAL_WIDTH {
            if self.position.x.abs() > HALF_LENGTH + GOAL_DEPTH - r {
                self.position.x = sx * (HALF_LENGTH + GOAL_DEPTH - r);
                self.bounce(Vector2::new(-sx, 0.0));
                hit = true;
            }
            if self.position.x.abs() > HALF_LENGTH && self.position.y.abs() > HALF_GOAL_WIDTH - r {
                self.position.y = sy * (HALF_GOAL_WIDTH - r);
                self.bounce(Vector2::new(0.0, -sy));
                hit = true;
            }
        } else if in_goal {
            self.position.x = sx * (HALF_LENGTH - r);
            self.bounce(Vector2::new(-sx, 0.0));
            hit = true;
        }

        let clearance = CORNER_LENGTH + r * std::f64::consts::SQRT_2;
        let corner_gap = (HALF_LENGTH - self.position.x.abs()) + (HALF_WIDTH - self.position.y.abs());
        if corner_gap < clearance {
            let normal = Vector2::new(-sx, -sy).normalize();
            let depth = (clearance - corner_gap) / std::f64::consts::SQRT_2;
            self.position = self.position.add(&normal.scale(depth));
            self.bounce(normal);
            hit = true;
        }
        hit
    }

    ///Resolves contact with a robot. Returns true if they touch.
    pub fn resolve_robot(&mut self, robot: &RobotBody) -> bool {
        let delta = self.position.sub(&robot.pose.position());
        let distance = delta.magnitude();
        let reach = robot.radius() + BALL_RADIUS;
        if distance >= reach {
            return false;
        }
        let normal = if distance > 0.0 {
            delta.scale(1.0 / distance)
        } else {
            Vector2::new(robot.pose.th.cos(), robot.pose.th.sin())
        };
        self.position = robot.pose.position().add(&normal.scale(reach));

        let relative = self.velocity.sub(&robot.velocity());
        let towards = relative.dot(&normal);
        if towards < 0.0 {
            self.velocity = self.velocity.sub(&normal.scale((1.0 + BALL_RESTITUTION) * towards));
        }
        true
    }
}

/// Minimal simulation of the pitch: differential-drive robots, a rolling ball
/// with friction, wall bounces and contact-based touches. Robots never fall.
pub struct KinematicBackend {
    robots: [[RobotBody; NUMBER_OF_ROBOTS]; 2],
    ball: BallBody,
    touches: Touches,
    time_ms: u64,
    time_limit_ms: Option<u64>,
}

impl KinematicBackend {
    pub fn new() -> Self {
        let robots = Team::ALL.map(|team| {
            std::array::from_fn(|id| RobotBody {
                pose: formation::default_slot(team, id),
                wheels: (0.0, 0.0),
                id,
            })
        });
        Self {
            robots,
            ball: BallBody::default(),
            touches: [[false; NUMBER_OF_ROBOTS]; 2],
            time_ms: 0,
            time_limit_ms: None,
        }
    }

    /// Terminates the simulation once `limit_ms` of simulated time passed.
    pub fn with_time_limit(mut self, limit_ms: u64) -> Self {
        self.time_limit_ms = Some(limit_ms);
        self
    }

    pub fn ball_velocity(&self) -> Vector2 {
        self.ball.velocity
    }

    pub fn set_ball_velocity(&mut self, velocity: Vector2) {
        self.ball.velocity = velocity;
    }

    fn substep(&mut self, dt: f64) {
        for robot in self.robots.iter_mut().flatten() {
            robot.simulate(dt);
            robot.resolve_walls();
        }

        let mut bodies: Vec<&mut RobotBody> = self.robots.iter_mut().flatten().collect();
        for i in 0..bodies.len() {
            let (head, tail) = bodies.split_at_mut(i + 1);
            for other in tail.iter_mut() {
                head[i].separate(other);
            }
        }
        for robot in bodies {
            robot.resolve_walls();
        }

        self.ball.simulate(dt);
        for team in Team::ALL {
            for (id, robot) in self.robots[team.index()].iter().enumerate() {
                if self.ball.resolve_robot(robot) {
                    self.touches[team.index()][id] = true;
                }
            }
        }
        self.ball.resolve_walls();
    }
}

impl Default for KinematicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBackend for KinematicBackend {
    fn robot_pose(&self, team: Team, id: usize) -> RobotPose {
        RobotPose {
            pose: self.robots[team.index()][id].pose,
            standing: true,
        }
    }

    fn ball_position(&self) -> Vector2 {
        self.ball.position
    }

    fn ball_speed(&self) -> f64 {
        self.ball.velocity.magnitude()
    }

    fn actuate(&mut self, team: Team, id: usize, left: f64, right: f64) {
        self.robots[team.index()][id].wheels = (left, right);
    }

    fn teleport(&mut self, entity: Entity, pose: Pose) {
        match entity {
            Entity::Robot(team, id) => self.robots[team.index()][id].pose = pose,
            Entity::Ball => self.ball.position = pose.position(),
        }
    }

    fn reset_physics(&mut self, entity: Entity) {
        match entity {
            Entity::Robot(team, id) => self.robots[team.index()][id].wheels = (0.0, 0.0),
            Entity::Ball => self.ball.velocity = Vector2::ZERO,
        }
    }

    fn advance(&mut self, duration_ms: u64) -> Result<(), SimulationTerminated> {
        let mut remaining = duration_ms;
        while remaining > 0 {
            let step = remaining.min(SUBSTEP_MS);
            self.substep(step as f64 / 1000.0);
            self.time_ms += step;
            remaining -= step;
        }
        match self.time_limit_ms {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;
    use assert_approx_eq::assert_approx_eq;

    fn empty_pitch() -> KinematicBackend {
        let mut sim = KinematicBackend::new();
        for team in Team::ALL {
            for id in 0..NUMBER_OF_ROBOTS {
                let x = if team == Team::Red { -1.0 } else { 1.0 };
                sim.teleport(Entity::Robot(team, id), Pose::new(x * (1.0 + id as f64 * 0.4), 2.0, 0.0));
            }
        }
        sim.teleport(Entity::Ball, Pose::new(0.0, -1.0, 0.0));
        sim
    }

    #[test]
    fn test_robot_drives_straight() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Robot(Team::Red, 2), Pose::new(0.0, 0.0, 0.0));
        let wheel = 1.0 / WHEEL_RADIUS[2];
        sim.actuate(Team::Red, 2, wheel, wheel);

        sim.advance(1000).unwrap();

        let pose = sim.robot_pose(Team::Red, 2).pose;
        assert_approx_eq!(pose.x, 1.0, 1e-9);
        assert_approx_eq!(pose.y, 0.0, 1e-9);
        assert_approx_eq!(pose.th, 0.0, 1e-9);
        assert_eq!(sim.time_ms(), 1000);
    }

    #[test]
    fn test_robot_turns_in_place() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Robot(Team::Blue, 1), Pose::new(0.0, 0.0, 0.0));
        let wheel = 1.0;
        sim.actuate(Team::Blue, 1, -wheel, wheel);

        sim.advance(500).unwrap();

        let pose = sim.robot_pose(Team::Blue, 1).pose;
        let expected = 2.0 * wheel * WHEEL_RADIUS[1] / AXLE_LENGTH[1] * 0.5;
        assert_approx_eq!(pose.th, expected, 1e-9);
        assert_approx_eq!(pose.x, 0.0, 1e-9);
    }

    #[test]
    fn test_ball_rolls_and_slows_down() {
        let mut sim = empty_pitch();
        sim.set_ball_velocity(Vector2::new(1.0, 0.0));
        sim.advance(500).unwrap();

        assert!(sim.ball_position().x > 0.3);
        assert!(sim.ball_speed() < 1.0);
        sim.advance(20_000).unwrap();
        assert_eq!(sim.ball_speed(), 0.0);
    }

    #[test]
    fn test_ball_bounces_off_side_wall() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Ball, Pose::new(0.0, -(HALF_WIDTH - 0.1), 0.0));
        sim.set_ball_velocity(Vector2::new(0.0, -2.0));
        sim.advance(200).unwrap();

        assert!(sim.ball_velocity().y > 0.0);
        assert!(field::ball_in_field(sim.ball_position()));
    }

    #[test]
    fn test_ball_enters_goal_and_stays_in_net() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Ball, Pose::new(HALF_LENGTH - 0.3, 0.0, 0.0));
        sim.set_ball_velocity(Vector2::new(1.5, 0.0));
        sim.advance(600).unwrap();

        let ball = sim.ball_position();
        assert!(ball.x > HALF_LENGTH);
        assert!(ball.x <= HALF_LENGTH + GOAL_DEPTH);
        assert_eq!(field::scoring_team(ball), Some(Team::Red));
    }

    #[test]
    fn test_ball_stays_out_of_cut_corner() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Ball, Pose::new(HALF_LENGTH - 0.3, HALF_WIDTH - 0.3, 0.0));
        sim.set_ball_velocity(Vector2::new(2.0, 2.0));
        for _ in 0..50 {
            sim.advance(10).unwrap();
            assert!(field::ball_in_field(sim.ball_position()), "{:?}", sim.ball_position());
        }
    }

    #[test]
    fn test_robot_pushing_ball_registers_touch() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Robot(Team::Red, 4), Pose::new(-0.5, -1.0, 0.0));
        let wheel = 1.5 / WHEEL_RADIUS[4];
        sim.actuate(Team::Red, 4, wheel, wheel);

        sim.advance(500).unwrap();

        let touches = sim.take_touches();
        assert!(touches[0][4]);
        assert_eq!(touches.iter().flatten().filter(|t| **t).count(), 1);
        assert!(sim.ball_position().x > 0.0);
        assert!(!sim.take_touches()[0][4]);
    }

    #[test]
    fn test_robots_do_not_overlap() {
        let mut sim = empty_pitch();
        sim.teleport(Entity::Robot(Team::Red, 1), Pose::new(0.0, 0.0, 0.0));
        sim.teleport(Entity::Robot(Team::Blue, 1), Pose::new(0.05, 0.0, 0.0));
        sim.advance(10).unwrap();

        let a = sim.robot_pose(Team::Red, 1).pose.position();
        let b = sim.robot_pose(Team::Blue, 1).pose.position();
        assert!(a.distance(&b) >= ROBOT_SIZE[1] - 1e-9);
    }

    #[test]
    fn test_time_limit_terminates() {
        let mut sim = KinematicBackend::new().with_time_limit(100);
        assert!(sim.advance(50).is_ok());
        assert_eq!(sim.advance(50), Err(SimulationTerminated));
    }

    #[test]
    fn test_reset_physics_stops_entities() {
        let mut sim = empty_pitch();
        sim.set_ball_velocity(Vector2::new(1.0, 1.0));
        sim.actuate(Team::Red, 0, 5.0, 5.0);
        sim.reset_physics(Entity::Ball);
        sim.reset_physics(Entity::Robot(Team::Red, 0));
        assert_eq!(sim.ball_speed(), 0.0);
        assert_eq!(sim.robots[0][0].wheels, (0.0, 0.0));
    }
}
