//! Field geometry predicates.
//!
//! Functions taking a canonical position work in team red's frame. Functions
//! named `*_own_*`/`*_opponent_*` take a position already expressed in the
//! robot's own team frame (own goal at -x).

use shared::{
    Team, Vector2, BALL_RADIUS, CORNER_LENGTH, FIELD_LENGTH, FIELD_WIDTH, GOAL_DEPTH, GOAL_WIDTH,
    PENALTY_AREA_DEPTH, PENALTY_AREA_WIDTH, WALL_THICKNESS,
};

const HALF_LENGTH: f64 = FIELD_LENGTH / 2.0;
const HALF_WIDTH: f64 = FIELD_WIDTH / 2.0;
const HALF_GOAL_WIDTH: f64 = GOAL_WIDTH / 2.0;
const HALF_PA_WIDTH: f64 = PENALTY_AREA_WIDTH / 2.0;
const PA_FRONT: f64 = HALF_LENGTH - PENALTY_AREA_DEPTH;

fn in_envelope(p: Vector2) -> bool {
    let (x, y) = (p.x.abs(), p.y.abs());
    if y < HALF_GOAL_WIDTH {
        return x <= HALF_LENGTH + GOAL_DEPTH;
    }
    x <= HALF_LENGTH && y <= HALF_WIDTH
}

/// Ball inside the walls or a goal, excluding the cut-off corner triangles.
///
/// The walls stand [`WALL_THICKNESS`] outside the lines, and each corner is
/// cut by the diagonal from `CORNER_LENGTH` before the goal line at the side
/// wall to `CORNER_LENGTH` before the touchline at the end wall.
pub fn ball_in_field(p: Vector2) -> bool {
    let (x, y) = (p.x.abs(), p.y.abs());
    if x > HALF_LENGTH + WALL_THICKNESS {
        return y <= HALF_GOAL_WIDTH + WALL_THICKNESS && x <= HALF_LENGTH + GOAL_DEPTH;
    }
    y <= HALF_WIDTH + WALL_THICKNESS && x + y <= HALF_LENGTH + HALF_WIDTH + WALL_THICKNESS - CORNER_LENGTH
}

/// Robot inside the field or a goal.
pub fn robot_in_field(p: Vector2) -> bool {
    in_envelope(p)
}

/// Team that scores when the ball sits at `p`, if the ball is fully inside a goal.
pub fn scoring_team(p: Vector2) -> Option<Team> {
    let x = p.x.abs();
    if p.y.abs() < HALF_GOAL_WIDTH && x > HALF_LENGTH + BALL_RADIUS && x <= HALF_LENGTH + GOAL_DEPTH {
        Some(if p.x > 0.0 { Team::Red } else { Team::Blue })
    } else {
        None
    }
}

/// Team whose penalty area contains the ball, if any.
pub fn penalty_area_of(p: Vector2) -> Option<Team> {
    let x = p.x.abs();
    if x > PA_FRONT && x <= HALF_LENGTH && p.y.abs() < HALF_PA_WIDTH {
        Some(if p.x < 0.0 { Team::Red } else { Team::Blue })
    } else {
        None
    }
}

/// Penalty area band at the end given by `side` (+1 or -1), goal included.
pub fn in_penalty_region(p: Vector2, side: f64) -> bool {
    side * p.x > PA_FRONT && p.y.abs() < HALF_PA_WIDTH
}

/// Corner band at the end `side_x` on the touchline `side_y` (each +1 or -1).
pub fn in_corner_region(p: Vector2, side_x: f64, side_y: f64) -> bool {
    side_x * p.x > PA_FRONT && side_y * p.y > HALF_PA_WIDTH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallRegion {
    PenaltyArea,
    Corner,
    Open,
}

pub fn ball_region(p: Vector2) -> BallRegion {
    if p.x.abs() > PA_FRONT {
        if p.y.abs() < HALF_PA_WIDTH {
            BallRegion::PenaltyArea
        } else {
            BallRegion::Corner
        }
    } else {
        BallRegion::Open
    }
}

pub fn in_opponent_goal(own: Vector2) -> bool {
    own.x > HALF_LENGTH && own.y.abs() < HALF_GOAL_WIDTH
}

pub fn in_opponent_penalty_area(own: Vector2) -> bool {
    own.x <= HALF_LENGTH && own.x > PA_FRONT && own.y.abs() < HALF_PA_WIDTH
}

pub fn in_own_goal_or_penalty_area(own: Vector2) -> bool {
    own.x < -PA_FRONT && own.y.abs() < HALF_PA_WIDTH
}
