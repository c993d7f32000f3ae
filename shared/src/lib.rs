pub mod constants;
pub mod geometry;
pub mod messages;
pub mod rpc;

pub use constants::*;
pub use geometry::{normalize_angle, Pose, Vector2};
pub use messages::{Coordinates, Frame, GameInfo, GameState, ResetReason, RobotCoordinate, Subimage};
pub use rpc::{Rpc, RpcCommand, RpcFramer, RPC_MARKER};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    pub fn index(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Sign that maps this team's own frame onto the canonical (red) frame.
    pub fn sign(self) -> f64 {
        match self {
            Team::Red => 1.0,
            Team::Blue => -1.0,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => write!(f, "red"),
            Team::Blue => write!(f, "blue"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    TeamRed,
    TeamBlue,
    Commentator,
    Reporter,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::TeamRed, Role::TeamBlue, Role::Commentator, Role::Reporter];

    pub fn of_team(team: Team) -> Role {
        match team {
            Team::Red => Role::TeamRed,
            Team::Blue => Role::TeamBlue,
        }
    }

    pub fn team(self) -> Option<Team> {
        match self {
            Role::TeamRed => Some(Team::Red),
            Role::TeamBlue => Some(Team::Blue),
            Role::Commentator | Role::Reporter => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::TeamRed => write!(f, "team red"),
            Role::TeamBlue => write!(f, "team blue"),
            Role::Commentator => write!(f, "commentator"),
            Role::Reporter => write!(f, "reporter"),
        }
    }
}
