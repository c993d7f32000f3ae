//! JSON messages the supervisor sends to participants.
//!
//! Frames are always expressed relative to the receiving team: "mine" comes
//! first, my team attacks towards +x. [`Frame::mirrored`] converts a team red
//! frame into the matching team blue frame and back.

use crate::constants::*;
use crate::geometry::Pose;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A wire number that names no variant of the given enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {0} value {1}")]
pub struct UnknownDiscriminant(pub &'static str, pub u8);

/// Match phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GameState {
    Default,
    Kickoff,
    GoalKick,
    CornerKick,
    PenaltyKick,
}

impl From<GameState> for u8 {
    fn from(state: GameState) -> u8 {
        match state {
            GameState::Default => 0,
            GameState::Kickoff => 1,
            GameState::GoalKick => 2,
            GameState::CornerKick => 3,
            GameState::PenaltyKick => 4,
        }
    }
}

impl TryFrom<u8> for GameState {
    type Error = UnknownDiscriminant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => GameState::Default,
            1 => GameState::Kickoff,
            2 => GameState::GoalKick,
            3 => GameState::CornerKick,
            4 => GameState::PenaltyKick,
            other => return Err(UnknownDiscriminant("game state", other)),
        })
    }
}

/// Why the field was reset on the tick a frame was taken.
///
/// Inside the supervisor the score reasons are kept from team red's point of
/// view: `ScoreMyTeam` means red scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResetReason {
    None,
    GameStart,
    ScoreMyTeam,
    ScoreOpponent,
    GameEnd,
    Deadlock,
    GoalKick,
    CornerKick,
    PenaltyKick,
    Halftime,
    EpisodeEnd,
}

impl ResetReason {
    pub fn mirrored(self) -> ResetReason {
        match self {
            ResetReason::ScoreMyTeam => ResetReason::ScoreOpponent,
            ResetReason::ScoreOpponent => ResetReason::ScoreMyTeam,
            other => other,
        }
    }
}

impl From<ResetReason> for u8 {
    fn from(reason: ResetReason) -> u8 {
        match reason {
            ResetReason::None => 0,
            ResetReason::GameStart => 1,
            ResetReason::ScoreMyTeam => 2,
            ResetReason::ScoreOpponent => 3,
            ResetReason::GameEnd => 4,
            ResetReason::Deadlock => 5,
            ResetReason::GoalKick => 6,
            ResetReason::CornerKick => 7,
            ResetReason::PenaltyKick => 8,
            ResetReason::Halftime => 9,
            ResetReason::EpisodeEnd => 10,
        }
    }
}

impl TryFrom<u8> for ResetReason {
    type Error = UnknownDiscriminant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ResetReason::None,
            1 => ResetReason::GameStart,
            2 => ResetReason::ScoreMyTeam,
            3 => ResetReason::ScoreOpponent,
            4 => ResetReason::GameEnd,
            5 => ResetReason::Deadlock,
            6 => ResetReason::GoalKick,
            7 => ResetReason::CornerKick,
            8 => ResetReason::PenaltyKick,
            9 => ResetReason::Halftime,
            10 => ResetReason::EpisodeEnd,
            other => return Err(UnknownDiscriminant("reset reason", other)),
        })
    }
}

/// One camera tile: pixel rectangle plus encoded image data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subimage {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub image: String,
}

/// Robot entry of a frame, sent as `[x, y, th, active, touch]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    into = "(f64, f64, f64, bool, bool)",
    from = "(f64, f64, f64, bool, bool)"
)]
pub struct RobotCoordinate {
    pub x: f64,
    pub y: f64,
    pub th: f64,
    pub active: bool,
    pub touch: bool,
}

impl RobotCoordinate {
    pub fn pose(&self) -> Pose {
        Pose::new(self.x, self.y, self.th)
    }

    fn rotated_half_turn(&self) -> RobotCoordinate {
        let pose = self.pose().rotated_half_turn();
        RobotCoordinate {
            x: pose.x,
            y: pose.y,
            th: pose.th,
            ..*self
        }
    }
}

impl From<RobotCoordinate> for (f64, f64, f64, bool, bool) {
    fn from(r: RobotCoordinate) -> Self {
        (r.x, r.y, r.th, r.active, r.touch)
    }
}

impl From<(f64, f64, f64, bool, bool)> for RobotCoordinate {
    fn from((x, y, th, active, touch): (f64, f64, f64, bool, bool)) -> Self {
        RobotCoordinate {
            x,
            y,
            th,
            active,
            touch,
        }
    }
}

type Team5 = [RobotCoordinate; NUMBER_OF_ROBOTS];

/// Sent as `[my robots, opponent robots, [ball x, ball y]]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "(Team5, Team5, [f64; 2])", from = "(Team5, Team5, [f64; 2])")]
pub struct Coordinates {
    pub mine: Team5,
    pub opponent: Team5,
    pub ball: [f64; 2],
}

impl From<Coordinates> for (Team5, Team5, [f64; 2]) {
    fn from(c: Coordinates) -> Self {
        (c.mine, c.opponent, c.ball)
    }
}

impl From<(Team5, Team5, [f64; 2])> for Coordinates {
    fn from((mine, opponent, ball): (Team5, Team5, [f64; 2])) -> Self {
        Coordinates {
            mine,
            opponent,
            ball,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Simulated time in seconds.
    pub time: f64,
    /// `[mine, opponent]`.
    pub score: [u32; 2],
    pub reset_reason: ResetReason,
    pub game_state: GameState,
    /// True when the receiving team owns the ball.
    pub ball_ownership: bool,
    pub half_passed: bool,
    pub subimages: Vec<Subimage>,
    pub coordinates: Coordinates,
    #[serde(rename = "EOF")]
    pub eof: bool,
}

impl Frame {
    /// The same frame seen by the other team.
    pub fn mirrored(&self) -> Frame {
        let c = &self.coordinates;
        Frame {
            time: self.time,
            score: [self.score[1], self.score[0]],
            reset_reason: self.reset_reason.mirrored(),
            game_state: self.game_state,
            ball_ownership: !self.ball_ownership,
            half_passed: self.half_passed,
            subimages: self.subimages.clone(),
            coordinates: Coordinates {
                mine: c.opponent.map(|r| r.rotated_half_turn()),
                opponent: c.mine.map(|r| r.rotated_half_turn()),
                ball: [-c.ball[0], -c.ball[1]],
            },
            eof: self.eof,
        }
    }
}

/// Team entry of `team_info`, sent as `[["name", <name>], ["rating", <rating>]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "((String, String), (String, u32))", from = "((String, String), (String, u32))")]
pub struct TeamInfo {
    pub name: String,
    pub rating: u32,
}

impl From<TeamInfo> for ((String, String), (String, u32)) {
    fn from(t: TeamInfo) -> Self {
        (("name".to_string(), t.name), ("rating".to_string(), t.rating))
    }
}

impl From<((String, String), (String, u32))> for TeamInfo {
    fn from(((_, name), (_, rating)): ((String, String), (String, u32))) -> Self {
        TeamInfo { name, rating }
    }
}

/// Answer to `get_info`: the static description of the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub field: [f64; 2],
    pub goal: [f64; 2],
    pub penalty_area: [f64; 2],
    pub goal_area: [f64; 2],
    pub ball_radius: f64,
    pub ball_mass: f64,
    pub robot_size: [f64; NUMBER_OF_ROBOTS],
    pub robot_height: [f64; NUMBER_OF_ROBOTS],
    pub axle_length: [f64; NUMBER_OF_ROBOTS],
    pub robot_body_mass: [f64; NUMBER_OF_ROBOTS],
    pub wheel_radius: [f64; NUMBER_OF_ROBOTS],
    pub wheel_mass: [f64; NUMBER_OF_ROBOTS],
    pub max_linear_velocity: [f64; NUMBER_OF_ROBOTS],
    pub max_torque: [f64; NUMBER_OF_ROBOTS],
    pub resolution: [u32; 2],
    pub number_of_robots: usize,
    pub codewords: [u32; NUMBER_OF_ROBOTS],
    /// Length of one half in seconds.
    pub game_time: f64,
    /// `[mine, opponent]`.
    pub team_info: [TeamInfo; 2],
    pub key: String,
}

impl GameInfo {
    pub fn new(game_time: f64, my_name: &str, opponent_name: &str, key: &str) -> Self {
        GameInfo {
            field: [FIELD_LENGTH, FIELD_WIDTH],
            goal: [GOAL_DEPTH, GOAL_WIDTH],
            penalty_area: [PENALTY_AREA_DEPTH, PENALTY_AREA_WIDTH],
            goal_area: [GOAL_AREA_DEPTH, GOAL_AREA_WIDTH],
            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            robot_size: ROBOT_SIZE,
            robot_height: ROBOT_HEIGHT,
            axle_length: AXLE_LENGTH,
            robot_body_mass: ROBOT_BODY_MASS,
            wheel_radius: WHEEL_RADIUS,
            wheel_mass: WHEEL_MASS,
            max_linear_velocity: MAX_LINEAR_VELOCITY,
            max_torque: MAX_TORQUE,
            resolution: RESOLUTION,
            number_of_robots: NUMBER_OF_ROBOTS,
            codewords: CODEWORDS,
            game_time,
            team_info: [
                TeamInfo {
                    name: my_name.to_string(),
                    rating: 0,
                },
                TeamInfo {
                    name: opponent_name.to_string(),
                    rating: 0,
                },
            ],
            key: key.to_string(),
        }
    }
}
