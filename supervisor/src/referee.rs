//! Match state machine.
//!
//! The referee owns the [`MatchState`] and advances it once per control step
//! through [`Referee::step`]. Phase changes reposition the field through the
//! [`Pitch`] and pause the simulation while the match clock stands still.

use crate::backend::{SimulationBackend, SimulationTerminated};
use crate::field::{self, BallRegion};
use crate::formation::{self, Formation, BALL_CORNERKICK, BALL_GOALKICK, BALL_PENALTYKICK};
use crate::fouls;
use crate::match_state::{Half, MatchState};
use crate::pitch::Pitch;
use crate::rules::*;
use log::{debug, info};
use shared::{
    GameState, ResetReason, Team, Vector2, ATTACKER, GOALKEEPER, MAX_LINEAR_VELOCITY, NUMBER_OF_ROBOTS,
    WHEEL_RADIUS,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRules {
    pub game_time_ms: u64,
    pub deadlock: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            game_time_ms: DEFAULT_GAME_TIME_MS,
            deadlock: true,
        }
    }
}

/// How play resumes. The team owning the ball takes the restart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Restart {
    Kickoff,
    GoalKick,
    PenaltyKick,
    /// Corner kick at the corner nearest `at`.
    CornerKick { at: Vector2 },
}

impl Restart {
    fn phase(self) -> GameState {
        match self {
            Restart::Kickoff => GameState::Kickoff,
            Restart::GoalKick => GameState::GoalKick,
            Restart::PenaltyKick => GameState::PenaltyKick,
            Restart::CornerKick { .. } => GameState::CornerKick,
        }
    }

    fn reason(self) -> ResetReason {
        match self {
            Restart::Kickoff => ResetReason::GameStart,
            Restart::GoalKick => ResetReason::GoalKick,
            Restart::PenaltyKick => ResetReason::PenaltyKick,
            Restart::CornerKick { .. } => ResetReason::CornerKick,
        }
    }

    /// Restart awarded to `owner` for a ball at `ball`: a goal kick near the
    /// owner's own goal, `attacking` otherwise.
    fn by_side(owner: Team, ball: Vector2, attacking: Restart) -> Restart {
        if (ball.x < 0.0) == (owner == Team::Red) {
            Restart::GoalKick
        } else {
            attacking
        }
    }
}

struct Layout {
    ball: Vector2,
    kicker: usize,
    formations: [(Team, Formation, bool); 2],
}

fn layout(restart: Restart, owner: Team) -> Layout {
    let other = owner.opponent();
    match restart {
        Restart::Kickoff => Layout {
            ball: Vector2::ZERO,
            kicker: ATTACKER,
            formations: [(owner, Formation::Kickoff, false), (other, Formation::Default, false)],
        },
        Restart::GoalKick => Layout {
            ball: formation::relative(owner, BALL_GOALKICK),
            kicker: GOALKEEPER,
            formations: [(owner, Formation::GoalKick, false), (other, Formation::GoalKickDefense, false)],
        },
        Restart::PenaltyKick => Layout {
            ball: formation::relative(owner, BALL_PENALTYKICK),
            kicker: ATTACKER,
            formations: [
                (owner, Formation::PenaltyKick, false),
                (other, Formation::PenaltyKickDefense, false),
            ],
        },
        Restart::CornerKick { at } => {
            let ball = Vector2::new(
                BALL_CORNERKICK.x.copysign(at.x),
                BALL_CORNERKICK.y.copysign(at.y),
            );
            let corner = |team: Team| {
                let own = formation::relative(team, ball);
                let formation = Formation::Corner {
                    owner: team == owner,
                    attacking_half: own.x > 0.0,
                };
                (team, formation, own.y < 0.0)
            };
            Layout {
                ball,
                kicker: ATTACKER,
                formations: [corner(owner), corner(other)],
            }
        }
    }
}

pub struct Referee {
    state: MatchState,
    rules: MatchRules,
}

impl Referee {
    /// Creates a referee with every robot locked until the kickoff.
    pub fn new(rules: MatchRules) -> Self {
        let mut state = MatchState::new(rules.game_time_ms);
        state.lock_all();
        Self { state, rules }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    pub fn rules(&self) -> MatchRules {
        self.rules
    }

    /// Lines up both teams for the opening kickoff by team red.
    pub fn kick_off_match<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) {
        self.state.ball.ownership = Team::Red;
        self.restart(pitch, Restart::Kickoff);
    }

    /// Swaps ends and lines up team blue for the second-half kickoff.
    pub fn begin_second_half<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) {
        info!("Second half, score {:?}", self.state.score());
        self.state.clock.half = Half::Second;
        self.state.clock.elapsed_ms = 0;
        pitch.set_mirrored(true);
        self.state.ball.ownership = Team::Blue;
        self.restart(pitch, Restart::Kickoff);
    }

    /// Starts a fresh match on the same pitch.
    pub fn restart_match<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) {
        self.state = MatchState::new(self.rules.game_time_ms);
        pitch.set_mirrored(false);
        self.kick_off_match(pitch);
    }

    pub fn stop<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) {
        pitch.stop_robots();
    }

    pub fn advance_clock(&mut self, duration_ms: u64) {
        self.state.clock.elapsed_ms += duration_ms;
    }

    /// Forwards wheel speeds (linear, m/s) for the team's active robots.
    pub fn apply_speeds<B: SimulationBackend>(&self, pitch: &mut Pitch<B>, team: Team, speeds: &[f64]) {
        for (id, wheels) in speeds.chunks_exact(2).enumerate().take(NUMBER_OF_ROBOTS) {
            if !self.state.robot(team, id).active {
                continue;
            }
            let max = MAX_LINEAR_VELOCITY[id];
            let left = wheels[0].clamp(-max, max) / WHEEL_RADIUS[id];
            let right = wheels[1].clamp(-max, max) / WHEEL_RADIUS[id];
            pitch.set_wheels(team, id, left, right);
        }
    }

    /// Runs one control step of officiating. The half must not be over.
    pub fn step<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) -> Result<(), SimulationTerminated> {
        self.state.reset_reason = ResetReason::None;
        self.state.ball.position = pitch.ball();
        self.observe_touches(pitch);

        fouls::enforce(&mut self.state, pitch);

        let ball = self.state.ball.position;
        let owner = self.state.ball.ownership;
        let elapsed = self.state.phase_elapsed();
        let set_piece_over = match self.state.phase() {
            GameState::Default => return self.officiate_open_play(pitch),
            GameState::Kickoff => elapsed >= KICKOFF_TIME_LIMIT_MS || ball.magnitude() > KICKOFF_BORDER,
            GameState::GoalKick => {
                elapsed >= GOALKICK_TIME_LIMIT_MS || self.state.robot(owner, GOALKEEPER).touching
            }
            GameState::CornerKick => {
                elapsed >= CORNERKICK_TIME_LIMIT_MS
                    || self.state.team(owner).robots.iter().any(|r| r.touching)
            }
            GameState::PenaltyKick => {
                elapsed >= PENALTYKICK_TIME_LIMIT_MS || self.state.robot(owner, ATTACKER).touching
            }
        };

        self.state.deadlock_since = self.state.now();
        if set_piece_over {
            debug!("{:?} over after {} ms", self.state.phase(), elapsed);
            self.state.enter_phase(GameState::Default);
            self.state.unlock_all();
        }
        Ok(())
    }

    fn observe_touches<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) {
        let touches = pitch.take_touches();
        for robot in self.state.robots_mut() {
            robot.touching = touches[robot.team.index()][robot.id];
        }
        if touches.iter().flatten().any(|t| *t) {
            self.state.recent_touch = touches;
        }
    }

    fn officiate_open_play<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) -> Result<(), SimulationTerminated> {
        let ball = self.state.ball.position;

        if let Some(scorer) = field::scoring_team(ball) {
            return self.award_goal(pitch, scorer);
        }

        if !field::ball_in_field(ball) {
            let owner = fouls::out_of_field_ownership(&self.state.recent_touch, ball);
            info!("Ball out of field, team {} gets the ball", owner);
            let restart = Restart::by_side(owner, ball, Restart::CornerKick { at: ball });
            return self.award(pitch, owner, restart);
        }

        if let Some(area_owner) = field::penalty_area_of(ball) {
            let side = if ball.x < 0.0 { -1.0 } else { 1.0 };
            let crowd = fouls::active_robots_in(&self.state, pitch, |p| field::in_penalty_region(p, side));
            if let Some(owner) = fouls::crowding_verdict(&crowd, area_owner) {
                info!("Penalty area of team {} crowded, team {} gets the ball", area_owner, owner);
                let restart = Restart::by_side(owner, ball, Restart::PenaltyKick);
                return self.award(pitch, owner, restart);
            }
        }

        if self.rules.deadlock {
            return self.check_deadlock(pitch);
        }
        Ok(())
    }

    fn check_deadlock<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>) -> Result<(), SimulationTerminated> {
        let now = self.state.now();
        if pitch.ball_speed() >= DEADLOCK_THRESHOLD {
            self.state.deadlock_since = now;
            return Ok(());
        }
        if now - self.state.deadlock_since < DEADLOCK_DURATION_MS {
            return Ok(());
        }

        let ball = self.state.ball.position;
        let side_x = if ball.x < 0.0 { -1.0 } else { 1.0 };
        let side_y = if ball.y < 0.0 { -1.0 } else { 1.0 };
        match field::ball_region(ball) {
            BallRegion::Open => {
                let spot = formation::relocation_spot(ball);
                info!("Deadlock, relocating ball to ({:.2}, {:.2})", spot.x, spot.y);
                pitch.stop_robots();
                settle(pitch, WAIT_STABLE_MS)?;
                pitch.place_ball(spot);
                pitch.take_touches();
                self.state.ball.position = spot;
                self.state.reset_reason = ResetReason::Deadlock;
                self.state.deadlock_since = now;
                settle(pitch, WAIT_STABLE_MS)
            }
            BallRegion::PenaltyArea => {
                let near = fouls::active_robots_in(&self.state, pitch, |p| field::in_penalty_region(p, side_x));
                let owner = fouls::tie_break(&near, ball);
                info!("Deadlock in a penalty area, team {} gets the ball", owner);
                let restart = Restart::by_side(owner, ball, Restart::PenaltyKick);
                self.award(pitch, owner, restart)
            }
            BallRegion::Corner => {
                let near = fouls::active_robots_in(&self.state, pitch, |p| {
                    field::in_corner_region(p, side_x, side_y)
                });
                let owner = fouls::tie_break(&near, ball);
                info!("Deadlock in a corner, team {} gets the ball", owner);
                self.award(pitch, owner, Restart::CornerKick { at: ball })
            }
        }
    }

    fn award_goal<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>, scorer: Team) -> Result<(), SimulationTerminated> {
        self.state.team_mut(scorer).score += 1;
        info!("Goal for team {}, score {:?}", scorer, self.state.score());

        pitch.stop_robots();
        settle(pitch, WAIT_GOAL_MS)?;
        self.state.ball.ownership = scorer.opponent();
        self.restart(pitch, Restart::Kickoff);
        self.state.reset_reason = match scorer {
            Team::Red => ResetReason::ScoreMyTeam,
            Team::Blue => ResetReason::ScoreOpponent,
        };
        settle(pitch, WAIT_STABLE_MS)
    }

    fn award<B: SimulationBackend>(
        &mut self,
        pitch: &mut Pitch<B>,
        owner: Team,
        restart: Restart,
    ) -> Result<(), SimulationTerminated> {
        pitch.stop_robots();
        settle(pitch, WAIT_STABLE_MS)?;
        self.state.ball.ownership = owner;
        self.restart(pitch, restart);
        self.state.reset_reason = restart.reason();
        settle(pitch, WAIT_STABLE_MS)
    }

    /// Enters the restart's phase and lines up the ball and both teams.
    fn restart<B: SimulationBackend>(&mut self, pitch: &mut Pitch<B>, restart: Restart) {
        let owner = self.state.ball.ownership;
        let layout = layout(restart, owner);

        self.state.enter_phase(restart.phase());
        self.state.reset_robots();
        self.state.recent_touch = [[false; NUMBER_OF_ROBOTS]; 2];

        pitch.place_ball(layout.ball);
        for (team, formation, lower) in layout.formations {
            for (id, pose) in formation::place(team, formation, lower).into_iter().enumerate() {
                pitch.place_robot(team, id, pose);
            }
        }
        pitch.take_touches();

        self.state.ball.position = layout.ball;
        self.state.lock_all();
        self.state.robot_mut(owner, layout.kicker).active = true;
        debug!("{:?} for team {}", restart.phase(), owner);
    }
}

/// Lets the simulation run with the match clock stopped, discarding contacts.
fn settle<B: SimulationBackend>(pitch: &mut Pitch<B>, duration_ms: u64) -> Result<(), SimulationTerminated> {
    pitch.advance(duration_ms)?;
    pitch.take_touches();
    Ok(())
}
