//! Long randomized matches on the kinematic backend
//!
//! These tests drive the referee the way the supervisor does, with random
//! wheel commands, and check the officiating invariants on every tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{GameState, ResetReason, Team, FIELD_LENGTH, FIELD_WIDTH, GOAL_DEPTH, NUMBER_OF_ROBOTS};
use supervisor::kinematic::KinematicBackend;
use supervisor::match_state::MatchState;
use supervisor::pitch::Pitch;
use supervisor::referee::{MatchRules, Referee};
use supervisor::rules::PERIOD_MS;

/// Ticks between new random wheel commands
const COMMAND_INTERVAL: u64 = 10;

fn random_speeds(rng: &mut StdRng) -> Vec<f64> {
    (0..2 * NUMBER_OF_ROBOTS).map(|_| rng.gen_range(-3.0..3.0)).collect()
}

/// What happened over a whole simulated match
#[derive(Debug, Default)]
struct MatchLog {
    ticks: u64,
    resets: Vec<ResetReason>,
    final_state: Option<MatchState>,
}

/// Plays both halves, calling `check` after every officiating step.
fn play<F>(seed: u64, rules: MatchRules, mut check: F) -> MatchLog
where
    F: FnMut(&MatchState, &MatchState),
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pitch = Pitch::new(KinematicBackend::new());
    let mut referee = Referee::new(rules);
    referee.kick_off_match(&mut pitch);

    let mut log = MatchLog::default();
    loop {
        if referee.state().half_over() {
            if referee.state().half_passed() {
                break;
            }
            referee.stop(&mut pitch);
            referee.begin_second_half(&mut pitch);
        }

        if log.ticks % COMMAND_INTERVAL == 0 {
            for team in Team::ALL {
                referee.apply_speeds(&mut pitch, team, &random_speeds(&mut rng));
            }
        }

        let before = referee.state().clone();
        referee.step(&mut pitch).unwrap();
        check(&before, referee.state());
        if referee.state().reset_reason != ResetReason::None {
            log.resets.push(referee.state().reset_reason);
        }

        pitch.advance(PERIOD_MS).unwrap();
        referee.advance_clock(PERIOD_MS);
        log.ticks += 1;
    }

    log.final_state = Some(referee.state().clone());
    log
}

fn rules(game_time_ms: u64, deadlock: bool) -> MatchRules {
    MatchRules { game_time_ms, deadlock }
}

/// SCORING INVARIANTS
mod scoring_tests {
    use super::*;

    /// Scores never drop and only move together with a goal reset
    #[test]
    fn scores_follow_goal_resets() {
        for seed in 0..3 {
            let log = play(seed, rules(60_000, true), |before, after| {
                let (old, new) = (before.score(), after.score());
                assert!(new[0] >= old[0] && new[1] >= old[1], "score went down");

                let red_scored = new[0] == old[0] + 1 && new[1] == old[1];
                let blue_scored = new[1] == old[1] + 1 && new[0] == old[0];
                match after.reset_reason {
                    ResetReason::ScoreMyTeam => assert!(red_scored),
                    ResetReason::ScoreOpponent => assert!(blue_scored),
                    _ => assert_eq!(new, old, "score changed without a goal"),
                }
            });

            let state = log.final_state.unwrap();
            let goals = log
                .resets
                .iter()
                .filter(|r| matches!(r, ResetReason::ScoreMyTeam | ResetReason::ScoreOpponent))
                .count();
            assert_eq!(goals as u32, state.score()[0] + state.score()[1]);
        }
    }

    /// A goal always leads to a kickoff for the conceding team
    #[test]
    fn goals_restart_with_kickoff_for_conceding_team() {
        play(7, rules(60_000, true), |_, after| {
            let scorer = match after.reset_reason {
                ResetReason::ScoreMyTeam => Team::Red,
                ResetReason::ScoreOpponent => Team::Blue,
                _ => return,
            };
            assert_eq!(after.phase(), GameState::Kickoff);
            assert_eq!(after.ball.ownership, scorer.opponent());
            assert_eq!(after.ball.position.magnitude(), 0.0);
        });
    }
}

/// STATE MACHINE INVARIANTS
mod state_machine_tests {
    use super::*;

    /// Restarts enter the matching phase with only the kicker free to move
    #[test]
    fn restarts_free_only_the_kicker() {
        for seed in 10..13 {
            play(seed, rules(60_000, true), |_, after| {
                let expected = match after.reset_reason {
                    ResetReason::ScoreMyTeam | ResetReason::ScoreOpponent => GameState::Kickoff,
                    ResetReason::GoalKick => GameState::GoalKick,
                    ResetReason::CornerKick => GameState::CornerKick,
                    ResetReason::PenaltyKick => GameState::PenaltyKick,
                    ResetReason::Deadlock => GameState::Default,
                    _ => return,
                };
                assert_eq!(after.phase(), expected);

                if expected != GameState::Default {
                    let active: Vec<_> = after.robots().filter(|r| r.active).collect();
                    assert_eq!(active.len(), 1);
                    assert_eq!(active[0].team, after.ball.ownership);
                    assert_eq!(after.phase_elapsed(), 0);
                }
            });
        }
    }

    /// Robots in the foul zone never count as active
    #[test]
    fn sent_out_robots_stay_inactive() {
        for seed in 20..23 {
            play(seed, rules(60_000, true), |_, after| {
                for robot in after.robots() {
                    if !robot.is_on_field() {
                        assert!(!robot.active, "{} robot {} is out but active", robot.team, robot.id);
                    }
                }
            });
        }
    }

    /// The ball never escapes the walls and the clock never passes the half
    #[test]
    fn ball_and_clock_stay_in_bounds() {
        let limit_x = FIELD_LENGTH / 2.0 + GOAL_DEPTH + 0.05;
        let limit_y = FIELD_WIDTH / 2.0 + 0.05;
        let log = play(31, rules(30_000, true), |_, after| {
            let ball = after.ball.position;
            assert!(ball.x.abs() <= limit_x && ball.y.abs() <= limit_y, "ball at {:?}", ball);
            assert!(after.now() <= after.clock.game_time_ms);
        });
        assert!(log.final_state.unwrap().half_passed());
        assert_eq!(log.ticks, 2 * 30_000 / PERIOD_MS);
    }

    /// Disabled deadlock detection never relocates the ball
    #[test]
    fn no_deadlock_resets_when_disabled() {
        let log = play(41, rules(60_000, false), |_, _| {});
        assert!(!log.resets.contains(&ResetReason::Deadlock));
    }

    /// Same seed, same match
    #[test]
    fn officiating_is_deterministic() {
        let first = play(5, rules(20_000, true), |_, _| {});
        let second = play(5, rules(20_000, true), |_, _| {});
        assert_eq!(first.resets, second.resets);
        assert_eq!(first.final_state, second.final_state);
    }
}

/// SIMULATION TERMINATION
mod termination_tests {
    use super::*;

    /// The referee surfaces termination instead of panicking
    #[test]
    fn terminated_simulation_stops_the_match() {
        let mut pitch = Pitch::new(KinematicBackend::new().with_time_limit(2_000));
        let mut referee = Referee::new(rules(60_000, true));
        referee.kick_off_match(&mut pitch);

        let mut ticks = 0;
        let terminated = loop {
            if let Err(e) = referee.step(&mut pitch) {
                break e;
            }
            if let Err(e) = pitch.advance(PERIOD_MS) {
                break e;
            }
            referee.advance_clock(PERIOD_MS);
            ticks += 1;
            assert!(ticks < 1_000, "simulation never terminated");
        };

        assert_eq!(terminated.to_string(), "simulation terminated");
        assert!(pitch.time_ms() >= 2_000);
    }
}
