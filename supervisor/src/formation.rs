//! Robot formations and ball spots used when the field is reset.
//!
//! Tables are written in the team's own frame (own goal at -x, attacking
//! towards +x) and converted to the canonical frame with [`to_canonical`].

use shared::{Pose, Team, Vector2, NUMBER_OF_ROBOTS};
use std::f64::consts::FRAC_PI_4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formation {
    Default,
    /// Team taking the kickoff.
    Kickoff,
    /// Team taking a goal kick from its own goal area.
    GoalKick,
    /// Opponent of the team taking a goal kick.
    GoalKickDefense,
    PenaltyKick,
    PenaltyKickDefense,
    /// Corner formation for a ball in the upper (+y) corner of the given
    /// half; lower corners reflect it across the x axis.
    Corner { owner: bool, attacking_half: bool },
}

type Slots = [Pose; NUMBER_OF_ROBOTS];

const DEFAULT: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-2.25, 1.0, 0.0),
    Pose::new(-2.25, -1.0, 0.0),
    Pose::new(-0.65, 0.3, 0.0),
    Pose::new(-0.65, -0.3, 0.0),
];

const KICKOFF: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-2.25, 1.0, 0.0),
    Pose::new(-2.25, -1.0, 0.0),
    Pose::new(-0.9, 0.0, 0.0),
    Pose::new(-0.25, 0.0, 0.0),
];

const GOALKICK: Slots = [
    Pose::new(-3.6, 0.0, 0.0),
    Pose::new(-2.25, 1.0, 0.0),
    Pose::new(-2.25, -1.0, 0.0),
    Pose::new(-0.9, 0.3, 0.0),
    Pose::new(-0.9, -0.3, 0.0),
];

const GOALKICK_DEFENSE: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-1.0, 1.0, 0.0),
    Pose::new(-1.0, -1.0, 0.0),
    Pose::new(1.5, 0.8, 0.0),
    Pose::new(1.5, -0.8, 0.0),
];

const PENALTYKICK: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-1.0, 1.0, 0.0),
    Pose::new(-1.0, -1.0, 0.0),
    Pose::new(1.5, 0.5, 0.0),
    Pose::new(2.4, 0.0, 0.0),
];

const PENALTYKICK_DEFENSE: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-1.5, 1.2, 0.0),
    Pose::new(-1.5, -1.2, 0.0),
    Pose::new(-0.5, 0.6, 0.0),
    Pose::new(-0.5, -0.6, 0.0),
];

const CORNER_OWNER_ATTACK: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-2.25, 1.0, 0.0),
    Pose::new(-2.25, -1.0, 0.0),
    Pose::new(2.0, 0.3, 0.0),
    Pose::new(3.25, 1.7, FRAC_PI_4),
];

const CORNER_OWNER_DEFEND: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-2.6, -0.9, 0.0),
    Pose::new(-2.0, 0.0, 0.0),
    Pose::new(-1.5, 0.5, 0.0),
    Pose::new(-3.25, 1.7, 3.0 * FRAC_PI_4),
];

const CORNER_OPPONENT_ATTACK: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-2.25, 1.0, 0.0),
    Pose::new(-2.25, -1.0, 0.0),
    Pose::new(1.8, 0.4, 0.0),
    Pose::new(2.2, -0.4, 0.0),
];

const CORNER_OPPONENT_DEFEND: Slots = [
    Pose::new(-3.8, 0.0, 0.0),
    Pose::new(-3.0, 0.7, 0.0),
    Pose::new(-2.6, -0.6, 0.0),
    Pose::new(-2.0, 0.8, 0.0),
    Pose::new(-1.5, -0.3, 0.0),
];

/// Where sent-off robots wait, beside their own half of the field.
const FOUL_ZONE: Slots = [
    Pose::new(-3.25, -3.0, 0.0),
    Pose::new(-2.75, -3.0, 0.0),
    Pose::new(-2.25, -3.0, 0.0),
    Pose::new(-1.75, -3.0, 0.0),
    Pose::new(-1.25, -3.0, 0.0),
];

/// Ball spot of a goal kick, in the kicking team's frame.
pub const BALL_GOALKICK: Vector2 = Vector2::new(-3.25, 0.0);
/// Ball spot of a penalty kick, in the kicking team's frame.
pub const BALL_PENALTYKICK: Vector2 = Vector2::new(2.65, 0.0);
/// Ball spot of a corner kick in the upper attacking corner.
pub const BALL_CORNERKICK: Vector2 = Vector2::new(3.45, 1.9);

/// Canonical ball spots for deadlock relocation, one per quadrant.
pub const BALL_RELOCATION_A: Vector2 = Vector2::new(-1.5, 1.0);
pub const BALL_RELOCATION_B: Vector2 = Vector2::new(-1.5, -1.0);
pub const BALL_RELOCATION_C: Vector2 = Vector2::new(1.5, 1.0);
pub const BALL_RELOCATION_D: Vector2 = Vector2::new(1.5, -1.0);

impl Formation {
    pub fn slots(self) -> Slots {
        match self {
            Formation::Default => DEFAULT,
            Formation::Kickoff => KICKOFF,
            Formation::GoalKick => GOALKICK,
            Formation::GoalKickDefense => GOALKICK_DEFENSE,
            Formation::PenaltyKick => PENALTYKICK,
            Formation::PenaltyKickDefense => PENALTYKICK_DEFENSE,
            Formation::Corner { owner: true, attacking_half: true } => CORNER_OWNER_ATTACK,
            Formation::Corner { owner: true, attacking_half: false } => CORNER_OWNER_DEFEND,
            Formation::Corner { owner: false, attacking_half: true } => CORNER_OPPONENT_ATTACK,
            Formation::Corner { owner: false, attacking_half: false } => CORNER_OPPONENT_DEFEND,
        }
    }
}

/// Converts a pose in `team`'s own frame to the canonical frame.
pub fn to_canonical(team: Team, own: Pose) -> Pose {
    match team {
        Team::Red => own,
        Team::Blue => own.rotated_half_turn(),
    }
}

/// Converts a position between `team`'s own frame and the canonical frame.
/// The map is its own inverse.
pub fn relative(team: Team, position: Vector2) -> Vector2 {
    position.scale(team.sign())
}

pub fn default_slot(team: Team, id: usize) -> Pose {
    to_canonical(team, DEFAULT[id])
}

pub fn foul_zone(team: Team, id: usize) -> Pose {
    to_canonical(team, FOUL_ZONE[id])
}

/// Canonical poses of all robots of `team` in `formation`, reflected across
/// the x axis when `lower` is set.
pub fn place(team: Team, formation: Formation, lower: bool) -> Slots {
    formation.slots().map(|own| {
        let own = if lower { own.reflected_y() } else { own };
        to_canonical(team, own)
    })
}

pub fn relocation_spot(ball: Vector2) -> Vector2 {
    match (ball.x < 0.0, ball.y > 0.0) {
        (true, true) => BALL_RELOCATION_A,
        (true, false) => BALL_RELOCATION_B,
        (false, true) => BALL_RELOCATION_C,
        (false, false) => BALL_RELOCATION_D,
    }
}
