//! Per-team frames sent to participants every tick.

use crate::backend::{SimulationBackend, VisionCapture};
use crate::match_state::MatchState;
use crate::pitch::Pitch;
use shared::{Coordinates, Frame, ResetReason, RobotCoordinate, Team};

pub struct FramePublisher<V> {
    vision: V,
}

impl<V: VisionCapture> FramePublisher<V> {
    pub fn new(vision: V) -> Self {
        Self { vision }
    }

    pub fn vision(&self) -> &V {
        &self.vision
    }

    /// Forgets the team's previous camera image so its next frame carries
    /// every tile.
    pub fn reset_vision(&mut self, team: Team) {
        self.vision.reset(team);
    }

    /// Frames for team red and team blue, in that order. `reason` replaces
    /// the state's reset reason when given.
    pub fn frames<B: SimulationBackend>(
        &mut self,
        state: &MatchState,
        pitch: &Pitch<B>,
        reason: Option<ResetReason>,
    ) -> [Frame; 2] {
        let time_ms = pitch.time_ms();
        let mut red = canonical_frame(state, pitch, reason.unwrap_or(state.reset_reason));
        red.subimages = self.vision.next_subimages(Team::Red, time_ms);

        let mut blue = red.mirrored();
        blue.subimages = self.vision.next_subimages(Team::Blue, time_ms);
        [red, blue]
    }
}

/// Match state as team red sees it.
fn canonical_frame<B: SimulationBackend>(state: &MatchState, pitch: &Pitch<B>, reason: ResetReason) -> Frame {
    let robots = |team: Team| {
        std::array::from_fn(|id| {
            let pose = pitch.robot(team, id).pose;
            let robot = state.robot(team, id);
            RobotCoordinate {
                x: pose.x,
                y: pose.y,
                th: pose.th,
                active: robot.active,
                touch: robot.touching,
            }
        })
    };
    let ball = pitch.ball();

    Frame {
        time: pitch.time_ms() as f64 / 1000.0,
        score: state.score(),
        reset_reason: reason,
        game_state: state.phase(),
        ball_ownership: state.ball.ownership == Team::Red,
        half_passed: state.half_passed(),
        subimages: Vec::new(),
        coordinates: Coordinates {
            mine: robots(Team::Red),
            opponent: robots(Team::Blue),
            ball: [ball.x, ball.y],
        },
        eof: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullVision;
    use crate::rules::DEFAULT_GAME_TIME_MS;
    use crate::test_support::scripted_pitch;
    use assert_approx_eq::assert_approx_eq;
    use shared::{GameState, Subimage, Vector2};

    #[derive(Default)]
    struct TileCamera {
        resets: Vec<Team>,
    }

    impl VisionCapture for TileCamera {
        fn next_subimages(&mut self, team: Team, time_ms: u64) -> Vec<Subimage> {
            vec![Subimage {
                x: team.index() as u32,
                y: 0,
                w: 1,
                h: 1,
                image: time_ms.to_string(),
            }]
        }

        fn reset(&mut self, team: Team) {
            self.resets.push(team);
        }
    }

    #[test]
    fn test_red_frame_is_canonical() {
        let mut state = MatchState::new(DEFAULT_GAME_TIME_MS);
        state.team_mut(Team::Red).score = 2;
        state.robot_mut(Team::Blue, 3).active = false;
        let mut pitch = scripted_pitch();
        pitch.backend_mut().ball = Vector2::new(1.0, -0.5);
        pitch.backend_mut().time_ms = 2500;

        let [red, _] = FramePublisher::new(NullVision).frames(&state, &pitch, None);

        assert_approx_eq!(red.time, 2.5);
        assert_eq!(red.score, [2, 0]);
        assert_eq!(red.game_state, GameState::Kickoff);
        assert!(red.ball_ownership);
        assert_eq!(red.coordinates.ball, [1.0, -0.5]);
        assert!(!red.coordinates.opponent[3].active);
        assert!(red.coordinates.mine[0].x < 0.0);
        assert!(red.eof);
    }

    #[test]
    fn test_blue_frame_mirrors_red() {
        let mut state = MatchState::new(DEFAULT_GAME_TIME_MS);
        state.team_mut(Team::Red).score = 1;
        state.reset_reason = ResetReason::ScoreMyTeam;
        let mut pitch = scripted_pitch();
        pitch.backend_mut().ball = Vector2::new(0.4, 0.7);

        let [red, blue] = FramePublisher::new(NullVision).frames(&state, &pitch, None);

        assert_eq!(blue.score, [0, 1]);
        assert_eq!(blue.reset_reason, ResetReason::ScoreOpponent);
        assert!(!blue.ball_ownership);
        assert_eq!(blue.coordinates.ball, [-0.4, -0.7]);
        // Blue's keeper defends -x in its own frame.
        assert_approx_eq!(blue.coordinates.mine[0].x, -red.coordinates.opponent[0].x);
        assert!(blue.coordinates.mine[0].x < 0.0);

        let back = blue.mirrored();
        for (a, b) in back.coordinates.mine.iter().zip(red.coordinates.mine.iter()) {
            assert_approx_eq!(a.x, b.x);
            assert_approx_eq!(a.y, b.y);
        }
    }

    #[test]
    fn test_reason_override_and_second_half() {
        let mut state = MatchState::new(DEFAULT_GAME_TIME_MS);
        state.clock.half = crate::match_state::Half::Second;
        let mut pitch = scripted_pitch();
        pitch.set_mirrored(true);
        pitch.backend_mut().ball = Vector2::new(1.0, 0.0);

        let [red, blue] = FramePublisher::new(NullVision).frames(&state, &pitch, Some(ResetReason::Halftime));

        assert_eq!(red.reset_reason, ResetReason::Halftime);
        assert_eq!(blue.reset_reason, ResetReason::Halftime);
        assert!(red.half_passed);
        // The world ball at +x lies in red's own half after the ends swap.
        assert_approx_eq!(red.coordinates.ball[0], -1.0);
    }

    #[test]
    fn test_each_team_gets_its_own_tiles() {
        let state = MatchState::new(DEFAULT_GAME_TIME_MS);
        let mut pitch = scripted_pitch();
        pitch.backend_mut().time_ms = 150;
        let mut publisher = FramePublisher::new(TileCamera::default());

        let [red, blue] = publisher.frames(&state, &pitch, None);
        assert_eq!(red.subimages[0].x, 0);
        assert_eq!(blue.subimages[0].x, 1);
        assert_eq!(blue.subimages[0].image, "150");

        publisher.reset_vision(Team::Blue);
        assert_eq!(publisher.vision().resets, vec![Team::Blue]);
    }
}
