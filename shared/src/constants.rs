//! Field, robot and protocol constants shared by the supervisor and participants.
//!
//! Lengths are metres, masses kilograms, velocities metres per second.

pub const NUMBER_OF_ROBOTS: usize = 5;

pub const FIELD_LENGTH: f64 = 7.8;
pub const FIELD_WIDTH: f64 = 4.65;
pub const GOAL_DEPTH: f64 = 0.45;
pub const GOAL_WIDTH: f64 = 1.0;
pub const PENALTY_AREA_DEPTH: f64 = 0.8;
pub const PENALTY_AREA_WIDTH: f64 = 2.0;
pub const GOAL_AREA_DEPTH: f64 = 0.4;
pub const GOAL_AREA_WIDTH: f64 = 1.5;
pub const WALL_THICKNESS: f64 = 0.025;
/// Leg length of the triangular wall cut in each field corner.
pub const CORNER_LENGTH: f64 = 0.1;

pub const BALL_RADIUS: f64 = 0.04;
pub const BALL_MASS: f64 = 0.0184;

pub const ROBOT_SIZE: [f64; NUMBER_OF_ROBOTS] = [0.15; NUMBER_OF_ROBOTS];
pub const ROBOT_HEIGHT: [f64; NUMBER_OF_ROBOTS] = [0.09; NUMBER_OF_ROBOTS];
pub const AXLE_LENGTH: [f64; NUMBER_OF_ROBOTS] = [0.14; NUMBER_OF_ROBOTS];
pub const ROBOT_BODY_MASS: [f64; NUMBER_OF_ROBOTS] = [2.0; NUMBER_OF_ROBOTS];
pub const WHEEL_RADIUS: [f64; NUMBER_OF_ROBOTS] = [0.04; NUMBER_OF_ROBOTS];
pub const WHEEL_MASS: [f64; NUMBER_OF_ROBOTS] = [0.285; NUMBER_OF_ROBOTS];
pub const MAX_LINEAR_VELOCITY: [f64; NUMBER_OF_ROBOTS] = [1.8, 2.1, 2.1, 2.55, 2.55];
pub const MAX_TORQUE: [f64; NUMBER_OF_ROBOTS] = [0.8, 0.4, 0.4, 0.4, 0.4];

/// Top camera resolution (width, height) in pixels.
pub const RESOLUTION: [u32; 2] = [640, 480];
/// Number of subimage tiles per camera frame along each axis.
pub const SUBIMAGE_GRID: [u32; 2] = [40, 40];
/// Patch codewords painted on the robots' tops, one per robot id.
pub const CODEWORDS: [u32; NUMBER_OF_ROBOTS] = [0b0000000000, 0b0000011111, 0b0011100011, 0b0101101100, 0b0110110101];

pub const GOALKEEPER: usize = 0;
/// Robot that takes kickoffs, corner kicks and penalty kicks.
pub const ATTACKER: usize = 4;

pub const DEFAULT_SERVER_IP: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 5000;
pub const KEY_LENGTH: usize = 10;
pub const NUM_COMMENTS: usize = 3;
