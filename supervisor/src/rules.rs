//! Timing limits and thresholds of the competition rules.

/// Length of one control step.
pub const PERIOD_MS: u64 = 50;

pub const DEFAULT_GAME_TIME_MS: u64 = 300_000;

/// Pause after a goal before the kickoff formation is set up.
pub const WAIT_GOAL_MS: u64 = 1500;
/// Pause around every reset so the ball and robots settle.
pub const WAIT_STABLE_MS: u64 = 1000;
/// Pause after the final whistle of a half.
pub const WAIT_END_MS: u64 = 3000;

pub const FALL_TIME_MS: u64 = 3000;
pub const SENTOUT_DURATION_MS: u64 = 5000;
/// Longest stay inside the opponent goal or penalty area.
pub const IOPA_TIME_LIMIT_MS: u64 = 3000;
/// Longest absence of the goalkeeper from its own goal and penalty area.
pub const GK_NIPA_TIME_LIMIT_MS: u64 = 3000;

pub const DEADLOCK_DURATION_MS: u64 = 4000;
/// Ball speed below which play counts as stuck.
pub const DEADLOCK_THRESHOLD: f64 = 0.05;

pub const KICKOFF_TIME_LIMIT_MS: u64 = 3000;
pub const GOALKICK_TIME_LIMIT_MS: u64 = 3000;
pub const CORNERKICK_TIME_LIMIT_MS: u64 = 3000;
pub const PENALTYKICK_TIME_LIMIT_MS: u64 = 3000;
/// Radius of the centre circle the ball must leave to end a kickoff.
pub const KICKOFF_BORDER: f64 = 0.5;

/// Most attackers allowed in the opponent penalty area while the ball is there.
pub const PA_THRESHOLD_A: usize = 2;
/// Most defenders allowed in their own penalty area while the ball is there.
pub const PA_THRESHOLD_D: usize = 3;

/// Clearance, in robot sizes, a relocation target must have.
pub const RELOCATION_CLEARANCE: f64 = 1.5;
