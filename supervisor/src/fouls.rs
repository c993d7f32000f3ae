//! Per-robot fouls and the ownership decisions behind every set piece.
//!
//! [`enforce`] runs once per tick in every phase. The remaining functions are
//! pure decisions the referee consults when play has to be restarted.

use crate::backend::{SimulationBackend, Touches};
use crate::field;
use crate::formation;
use crate::match_state::MatchState;
use crate::pitch::Pitch;
use crate::rules::*;
use log::{debug, info};
use shared::{GameState, Team, Vector2, GOALKEEPER, NUMBER_OF_ROBOTS, ROBOT_SIZE};
use std::cmp::Ordering;

/// Applies falls, out-of-field, area dwell limits and sent-off returns.
pub fn enforce<B: SimulationBackend>(state: &mut MatchState, pitch: &mut Pitch<B>) {
    let now = state.now();
    let open_play = state.phase() == GameState::Default;

    for team in Team::ALL {
        for id in 0..NUMBER_OF_ROBOTS {
            let observed = pitch.robot(team, id);
            let position = observed.pose.position();
            let own = formation::relative(team, position);
            let robot = state.robot_mut(team, id);

            if observed.standing {
                robot.fall_since = None;
            } else {
                let since = *robot.fall_since.get_or_insert(now);
                if robot.active && now.saturating_sub(since) >= FALL_TIME_MS {
                    info!("Robot {} of team {} fell, sending it off", id, team);
                    send_off(pitch, team, id, state, now);
                    continue;
                }
            }

            let robot = state.robot_mut(team, id);
            if robot.active && !field::robot_in_field(position) {
                info!("Robot {} of team {} left the field, sending it off", id, team);
                send_off(pitch, team, id, state, now);
                continue;
            }

            let robot = state.robot_mut(team, id);
            let in_opponent_area = field::in_opponent_goal(own) || field::in_opponent_penalty_area(own);
            if !robot.active || !in_opponent_area {
                robot.outside_opponent_area_since = now;
            } else if now.saturating_sub(robot.outside_opponent_area_since) >= IOPA_TIME_LIMIT_MS
                && return_to_default(pitch, team, id)
            {
                debug!("Robot {} of team {} stayed in the opponent area too long", id, team);
                robot.outside_opponent_area_since = now;
            }

            if id == GOALKEEPER {
                let robot = state.robot_mut(team, id);
                if !robot.active || field::in_own_goal_or_penalty_area(own) {
                    robot.inside_own_area_since = now;
                } else if now.saturating_sub(robot.inside_own_area_since) >= GK_NIPA_TIME_LIMIT_MS
                    && return_to_default(pitch, team, id)
                {
                    debug!("Goalkeeper of team {} strayed from its area too long", team);
                    robot.inside_own_area_since = now;
                }
            }

            let robot = state.robot_mut(team, id);
            if let Some(sent_out_at) = robot.sent_out_at {
                if now.saturating_sub(sent_out_at) >= SENTOUT_DURATION_MS && return_to_default(pitch, team, id) {
                    info!("Robot {} of team {} returns to the field", id, team);
                    robot.reset(now);
                    robot.active = open_play;
                }
            }
        }
    }
}

fn send_off<B: SimulationBackend>(pitch: &mut Pitch<B>, team: Team, id: usize, state: &mut MatchState, now: u64) {
    let robot = state.robot_mut(team, id);
    robot.active = false;
    robot.touching = false;
    robot.fall_since = None;
    robot.sent_out_at = Some(now);
    pitch.place_robot(team, id, formation::foul_zone(team, id));
}

/// Moves the robot to its default slot unless something occupies the spot.
fn return_to_default<B: SimulationBackend>(pitch: &mut Pitch<B>, team: Team, id: usize) -> bool {
    let target = formation::default_slot(team, id);
    let clearance = RELOCATION_CLEARANCE * ROBOT_SIZE[id];
    if pitch.any_object_nearby(target.position(), clearance, Some((team, id))) {
        return false;
    }
    pitch.place_robot(team, id, target);
    true
}

/// Canonical positions of active robots satisfying `region`.
pub fn active_robots_in<B: SimulationBackend>(
    state: &MatchState,
    pitch: &Pitch<B>,
    region: impl Fn(Vector2) -> bool,
) -> Vec<(Team, Vector2)> {
    state
        .robots()
        .filter(|r| r.active)
        .map(|r| (r.team, pitch.robot(r.team, r.id).pose.position()))
        .filter(|(_, p)| region(*p))
        .collect()
}

fn count(robots: &[(Team, Vector2)], team: Team) -> usize {
    robots.iter().filter(|(t, _)| *t == team).count()
}

/// Ownership after the ball left the field: the team with fewer robots in
/// the most recent contact gets the ball; a tie goes to the team attacking
/// the end the ball went out.
pub fn out_of_field_ownership(recent_touch: &Touches, ball: Vector2) -> Team {
    let touched = |team: Team| recent_touch[team.index()].iter().filter(|t| **t).count();
    match touched(Team::Red).cmp(&touched(Team::Blue)) {
        Ordering::Greater => Team::Blue,
        Ordering::Less => Team::Red,
        Ordering::Equal if ball.x < 0.0 => Team::Blue,
        Ordering::Equal => Team::Red,
    }
}

/// Team awarded the ball when too many robots crowd the penalty area of
/// `area_owner`, if any.
pub fn crowding_verdict(robots_in_area: &[(Team, Vector2)], area_owner: Team) -> Option<Team> {
    let defenders = count(robots_in_area, area_owner);
    let attackers = count(robots_in_area, area_owner.opponent());
    if defenders > PA_THRESHOLD_D {
        Some(area_owner.opponent())
    } else if attackers > PA_THRESHOLD_A {
        Some(area_owner)
    } else {
        None
    }
}

/// Ownership of a contested region: more robots wins, then the smaller
/// average distance to the ball, then the team attacking towards the ball.
pub fn tie_break(robots_in_region: &[(Team, Vector2)], ball: Vector2) -> Team {
    let red = count(robots_in_region, Team::Red);
    let blue = count(robots_in_region, Team::Blue);
    match red.cmp(&blue) {
        Ordering::Greater => return Team::Red,
        Ordering::Less => return Team::Blue,
        Ordering::Equal => {}
    }

    if red > 0 {
        let average = |team: Team| {
            robots_in_region
                .iter()
                .filter(|(t, _)| *t == team)
                .map(|(_, p)| p.distance(&ball))
                .sum::<f64>()
                / red as f64
        };
        let (red_distance, blue_distance) = (average(Team::Red), average(Team::Blue));
        if red_distance < blue_distance {
            return Team::Red;
        }
        if blue_distance < red_distance {
            return Team::Blue;
        }
    }

    if ball.x > 0.0 {
        Team::Red
    } else {
        Team::Blue
    }
}
