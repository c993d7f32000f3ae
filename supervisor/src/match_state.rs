//! The match aggregate: everything the referee knows about the game.
//!
//! Timestamps are milliseconds on the match clock, which restarts at zero
//! each half. Positions are canonical (team red's frame).

use crate::backend::Touches;
use shared::{GameState, ResetReason, Team, Vector2, NUMBER_OF_ROBOTS};

#[derive(Debug, Clone, PartialEq)]
pub struct RobotState {
    pub team: Team,
    pub id: usize,
    /// Eligible to move; false while locked for a set piece or sent off.
    pub active: bool,
    /// Touched the ball during the current tick.
    pub touching: bool,
    /// First tick the robot was seen lying down, if it is down.
    pub fall_since: Option<u64>,
    /// When the robot was sent to the foul zone; `None` while on the field.
    pub sent_out_at: Option<u64>,
    /// Last time the robot was outside the opponent goal and penalty area.
    pub outside_opponent_area_since: u64,
    /// Last time the robot was inside its own goal or penalty area.
    pub inside_own_area_since: u64,
}

impl RobotState {
    pub fn new(team: Team, id: usize) -> Self {
        Self {
            team,
            id,
            active: true,
            touching: false,
            fall_since: None,
            sent_out_at: None,
            outside_opponent_area_since: 0,
            inside_own_area_since: 0,
        }
    }

    /// Puts the robot back on the field with fresh timers.
    pub fn reset(&mut self, now: u64) {
        self.active = true;
        self.touching = false;
        self.fall_since = None;
        self.sent_out_at = None;
        self.outside_opponent_area_since = now;
        self.inside_own_area_since = now;
    }

    pub fn is_on_field(&self) -> bool {
        self.sent_out_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamState {
    pub score: u32,
    pub robots: [RobotState; NUMBER_OF_ROBOTS],
}

impl TeamState {
    fn new(team: Team) -> Self {
        Self {
            score: 0,
            robots: std::array::from_fn(|id| RobotState::new(team, id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallState {
    pub position: Vector2,
    pub ownership: Team,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClock {
    pub elapsed_ms: u64,
    pub half: Half,
    pub phase: GameState,
    pub phase_since_ms: u64,
    pub game_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub clock: MatchClock,
    pub teams: [TeamState; 2],
    pub ball: BallState,
    pub reset_reason: ResetReason,
    /// Robots that touched the ball on the most recent tick with any contact.
    pub recent_touch: Touches,
    pub deadlock_since: u64,
}

impl MatchState {
    pub fn new(game_time_ms: u64) -> Self {
        Self {
            clock: MatchClock {
                elapsed_ms: 0,
                half: Half::First,
                phase: GameState::Kickoff,
                phase_since_ms: 0,
                game_time_ms,
            },
            teams: [TeamState::new(Team::Red), TeamState::new(Team::Blue)],
            ball: BallState {
                position: Vector2::ZERO,
                ownership: Team::Red,
            },
            reset_reason: ResetReason::None,
            recent_touch: [[false; NUMBER_OF_ROBOTS]; 2],
            deadlock_since: 0,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.elapsed_ms
    }

    pub fn phase(&self) -> GameState {
        self.clock.phase
    }

    pub fn half_passed(&self) -> bool {
        self.clock.half == Half::Second
    }

    pub fn half_over(&self) -> bool {
        self.clock.elapsed_ms >= self.clock.game_time_ms
    }

    pub fn team(&self, team: Team) -> &TeamState {
        &self.teams[team.index()]
    }

    pub fn team_mut(&mut self, team: Team) -> &mut TeamState {
        &mut self.teams[team.index()]
    }

    pub fn robot(&self, team: Team, id: usize) -> &RobotState {
        &self.teams[team.index()].robots[id]
    }

    pub fn robot_mut(&mut self, team: Team, id: usize) -> &mut RobotState {
        &mut self.teams[team.index()].robots[id]
    }

    pub fn robots(&self) -> impl Iterator<Item = &RobotState> {
        self.teams.iter().flat_map(|t| t.robots.iter())
    }

    pub fn robots_mut(&mut self) -> impl Iterator<Item = &mut RobotState> {
        self.teams.iter_mut().flat_map(|t| t.robots.iter_mut())
    }

    /// `[red, blue]`.
    pub fn score(&self) -> [u32; 2] {
        [self.teams[0].score, self.teams[1].score]
    }

    pub fn lock_all(&mut self) {
        for robot in self.robots_mut() {
            robot.active = false;
        }
    }

    /// Activates every robot that is on the field.
    pub fn unlock_all(&mut self) {
        for robot in self.robots_mut() {
            robot.active = robot.is_on_field();
        }
    }

    pub fn reset_robots(&mut self) {
        let now = self.now();
        for robot in self.robots_mut() {
            robot.reset(now);
        }
    }

    pub fn enter_phase(&mut self, phase: GameState) {
        self.clock.phase = phase;
        self.clock.phase_since_ms = self.clock.elapsed_ms;
        self.deadlock_since = self.clock.elapsed_ms;
    }

    pub fn phase_elapsed(&self) -> u64 {
        self.clock.elapsed_ms - self.clock.phase_since_ms
    }
}
