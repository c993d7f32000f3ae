//! Match supervisor run loop coordinating sessions, officiating and frames

use crate::backend::{SimulationBackend, SimulationTerminated, VisionCapture};
use crate::comments::CommentBuffer;
use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::launcher;
use crate::pitch::Pitch;
use crate::publisher::FramePublisher;
use crate::referee::{MatchRules, Referee};
use crate::registry::RoleRegistry;
use crate::rules::{PERIOD_MS, WAIT_END_MS, WAIT_STABLE_MS};
use crate::session::{SessionEvent, SessionManager};
use log::{debug, error, info, warn};
use rand::Rng;
use shared::{ResetReason, Role, Rpc, RpcCommand, NUM_COMMENTS};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorSettings {
    /// Restart the match with sides swapped instead of finishing.
    pub repeat: bool,
    /// Where the reporter's text is saved.
    pub reports_dir: PathBuf,
    /// Pace ticks at `PERIOD_MS` of wall time; otherwise run flat out.
    pub realtime: bool,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            repeat: false,
            reports_dir: PathBuf::from("reports"),
            realtime: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    WaitingForPlayers,
    Playing,
    /// Game over; sessions are still serviced for the given ticks so late
    /// reports arrive.
    Finished { ticks_left: u64 },
}

/// Issues keys for every configured role. Optional roles that will not be
/// launched are unregistered: they get no key and count as ready.
pub fn prepare_registry<R: Rng + ?Sized>(config: &SupervisorConfig, launch: bool, rng: &mut R) -> RoleRegistry {
    let names = config.roles().map(|role| role.name.clone());
    let mut registry = RoleRegistry::new(names, config.match_rules().game_time_ms, rng);
    for (role, role_config) in [
        (Role::Commentator, &config.commentator),
        (Role::Reporter, &config.reporter),
    ] {
        if !launch || !launcher::is_launchable(role_config) {
            info!("{} will not be launched, not waiting for it", role);
            registry.unregister(role);
        }
    }
    registry
}

/// Runs one match between the connected participants
pub struct Supervisor<B, V> {
    sessions: SessionManager,
    registry: RoleRegistry,
    referee: Referee,
    pitch: Pitch<B>,
    publisher: FramePublisher<V>,
    comments: CommentBuffer,
    report: Option<String>,
    settings: SupervisorSettings,
    status: MatchStatus,
}

impl<B: SimulationBackend, V: VisionCapture> Supervisor<B, V> {
    pub fn new(
        sessions: SessionManager,
        registry: RoleRegistry,
        rules: MatchRules,
        backend: B,
        vision: V,
        settings: SupervisorSettings,
    ) -> Self {
        let mut pitch = Pitch::new(backend);
        let mut referee = Referee::new(rules);
        referee.kick_off_match(&mut pitch);

        Self {
            sessions,
            registry,
            referee,
            pitch,
            publisher: FramePublisher::new(vision),
            comments: CommentBuffer::new(NUM_COMMENTS),
            report: None,
            settings,
            status: MatchStatus::WaitingForPlayers,
        }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn referee(&self) -> &Referee {
        &self.referee
    }

    pub fn pitch(&self) -> &Pitch<B> {
        &self.pitch
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn comments(&self) -> &CommentBuffer {
        &self.comments
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.sessions.local_addr()
    }

    /// Runs ticks until the match is over or the simulation terminates, then
    /// saves the report.
    pub async fn run(&mut self) -> Result<(), SupervisorError> {
        let mut ticker = interval(Duration::from_millis(PERIOD_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Waiting for players to be ready...");
        loop {
            if self.settings.realtime {
                ticker.tick().await;
            } else {
                tokio::task::yield_now().await;
            }

            match self.tick().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(SimulationTerminated) => {
                    info!("Simulation terminated, stopping the match");
                    break;
                }
            }
        }

        self.save_report()?;
        Ok(())
    }

    /// Runs one control step. Returns false once the match has finished.
    pub async fn tick(&mut self) -> Result<bool, SimulationTerminated> {
        for event in self.sessions.poll().await {
            self.handle_event(event);
        }

        let result = self.step();

        for event in self.sessions.flush() {
            self.handle_event(event);
        }
        result
    }

    fn step(&mut self) -> Result<bool, SimulationTerminated> {
        match self.status {
            MatchStatus::WaitingForPlayers => {
                if self.registry.all_ready() {
                    info!("Starting match");
                    self.status = MatchStatus::Playing;
                    self.publish(Some(ResetReason::GameStart));
                    self.pitch.advance(WAIT_STABLE_MS)?;
                    self.pitch.take_touches();
                } else {
                    self.pitch.advance(PERIOD_MS)?;
                }
            }
            MatchStatus::Playing => {
                if self.referee.state().half_over() {
                    self.end_half()?;
                } else {
                    self.referee.step(&mut self.pitch)?;
                    self.publish(None);
                    self.pitch.advance(PERIOD_MS)?;
                    self.referee.advance_clock(PERIOD_MS);
                }
            }
            MatchStatus::Finished { ticks_left: 0 } => return Ok(false),
            MatchStatus::Finished { ticks_left } => {
                self.status = MatchStatus::Finished {
                    ticks_left: ticks_left - 1,
                };
                self.pitch.advance(PERIOD_MS)?;
            }
        }
        Ok(true)
    }

    fn end_half(&mut self) -> Result<(), SimulationTerminated> {
        let score = self.referee.state().score();

        if !self.referee.state().half_passed() {
            info!("Half time, score {:?}", score);
            self.publish(Some(ResetReason::Halftime));
            self.referee.stop(&mut self.pitch);
            self.pitch.advance(WAIT_END_MS)?;
            self.referee.begin_second_half(&mut self.pitch);
            self.pitch.advance(WAIT_STABLE_MS)?;
            self.pitch.take_touches();
            self.publish(Some(ResetReason::GameStart));
            return Ok(());
        }

        if self.settings.repeat {
            info!("Episode over, score {:?}; restarting with sides swapped", score);
            self.publish(Some(ResetReason::EpisodeEnd));
            self.referee.stop(&mut self.pitch);
            self.pitch.advance(WAIT_END_MS)?;
            self.registry.swap_teams();
            self.referee.restart_match(&mut self.pitch);
            self.pitch.advance(WAIT_STABLE_MS)?;
            self.pitch.take_touches();
            self.publish(Some(ResetReason::GameStart));
            return Ok(());
        }

        info!("Game over, final score {:?}", score);
        self.publish(Some(ResetReason::GameEnd));
        self.referee.stop(&mut self.pitch);
        self.referee.state_mut().lock_all();
        self.status = MatchStatus::Finished {
            ticks_left: WAIT_END_MS / PERIOD_MS,
        };
        Ok(())
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command { session, text } => self.handle_command(session, &text),
            SessionEvent::Closed { session } => self.registry.unbind_session(session),
        }
    }

    /// Authenticates and applies one command received on `session`
    fn handle_command(&mut self, session: u32, text: &str) {
        let rpc = Rpc::parse(text);
        let role = match self.registry.resolve(&rpc.key) {
            Ok(role) => role,
            Err(e) => {
                warn!("Rejected {} from session {}: {}", rpc.command.name(), session, e);
                return;
            }
        };
        self.registry.bind(role, session);
        if let Err(e) = self.registry.authorize(role, &rpc.command) {
            warn!("Rejected command from session {}: {}", session, e);
            return;
        }

        match rpc.command {
            RpcCommand::GetInfo => {
                info!("Received get_info from {}", role);
                match serde_json::to_string(&self.registry.info_for(role)) {
                    Ok(json) => {
                        self.sessions.send(session, &json);
                    }
                    Err(e) => error!("Failed to serialize game info: {}", e),
                }
            }
            RpcCommand::Ready => {
                info!("Received ready from {}", role);
                self.registry.mark_ready(role);
                if let Some(team) = role.team() {
                    self.publisher.reset_vision(team);
                }
            }
            RpcCommand::SetSpeeds(speeds) => {
                if let Some(team) = role.team() {
                    self.referee.apply_speeds(&mut self.pitch, team, &speeds);
                }
            }
            RpcCommand::Commentate(text) => {
                self.comments.push(self.referee.state().now(), &text);
            }
            RpcCommand::Report(text) => {
                debug!("Received a {} byte report", text.len());
                self.report = Some(text);
            }
            RpcCommand::Invalid(reason) => {
                warn!("Ignoring invalid command from {}: {}", role, reason);
            }
        }
    }

    /// Sends the current frame to every role with a live session
    fn publish(&mut self, reason: Option<ResetReason>) {
        let frames = self.publisher.frames(self.referee.state(), &self.pitch, reason);
        let encoded = match frames.iter().map(serde_json::to_string).collect::<Result<Vec<_>, _>>() {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to serialize frame: {}", e);
                return;
            }
        };

        for role in Role::ALL {
            let Some(session) = self.registry.session_of(role) else {
                continue;
            };
            let frame = if role == Role::TeamBlue { &encoded[1] } else { &encoded[0] };
            self.sessions.send(session, frame);
        }
    }

    /// Writes the latest report to `<reports_dir>/<reporter name>.txt`
    pub fn save_report(&self) -> Result<Option<PathBuf>, SupervisorError> {
        let Some(report) = &self.report else {
            return Ok(None);
        };
        let dir = &self.settings.reports_dir;
        std::fs::create_dir_all(dir).map_err(|e| SupervisorError::ReportWrite(dir.clone(), e))?;

        let path = dir.join(format!("{}.txt", self.registry.name(Role::Reporter)));
        std::fs::write(&path, report).map_err(|e| SupervisorError::ReportWrite(path.clone(), e))?;
        info!("Saved report to {}", path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullVision;
    use crate::test_support::ScriptedBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{GameState, Team};

    /// Config whose commentator and reporter point at an existing executable
    fn config_with_observers() -> SupervisorConfig {
        let mut config = SupervisorConfig::default();
        let exe = std::env::current_exe().unwrap();
        config.commentator.executable = Some(exe.clone());
        config.reporter.executable = Some(exe);
        config
    }

    /// Teams only, commentator and reporter are not launched
    async fn supervisor(settings: SupervisorSettings) -> Supervisor<ScriptedBackend, NullVision> {
        let registry = prepare_registry(&SupervisorConfig::default(), false, &mut StdRng::seed_from_u64(3));
        with_registry(registry, settings).await
    }

    /// All four roles hold keys
    async fn supervisor_with_observers(settings: SupervisorSettings) -> Supervisor<ScriptedBackend, NullVision> {
        let registry = prepare_registry(&config_with_observers(), true, &mut StdRng::seed_from_u64(3));
        with_registry(registry, settings).await
    }

    async fn with_registry(registry: RoleRegistry, settings: SupervisorSettings) -> Supervisor<ScriptedBackend, NullVision> {
        let sessions = SessionManager::bind("127.0.0.1:0").await.unwrap();
        let rules = MatchRules {
            game_time_ms: 1000,
            deadlock: true,
        };
        Supervisor::new(sessions, registry, rules, ScriptedBackend::new(), NullVision, settings)
    }

    fn command(supervisor: &Supervisor<ScriptedBackend, NullVision>, role: Role, command: RpcCommand) -> String {
        Rpc::new(supervisor.registry().key(role).unwrap(), command).encode().unwrap()
    }

    #[test]
    fn test_prepare_registry_marks_unlaunched_optional_roles_ready() {
        let config = SupervisorConfig::default();
        let registry = prepare_registry(&config, true, &mut StdRng::seed_from_u64(1));
        assert!(registry.is_ready(Role::Commentator));
        assert!(registry.is_ready(Role::Reporter));
        assert!(!registry.is_ready(Role::TeamRed));
        assert!(!registry.all_ready());
    }

    #[tokio::test]
    async fn test_unlaunched_optional_roles_have_no_key() {
        let mut supervisor = supervisor(SupervisorSettings::default()).await;
        for role in [Role::Commentator, Role::Reporter] {
            assert!(!supervisor.registry().is_registered(role));
            assert_eq!(supervisor.registry().key(role), None);
            assert!(supervisor.registry().is_ready(role));
        }

        // Whatever a stray process guesses, no key maps to the commentator
        supervisor.handle_command(5, "aiwc.commentate(\"\", \"Kickoff!\")");
        supervisor.handle_command(5, "aiwc.report(\"\", \"nothing\")");
        assert_eq!(supervisor.comments().lines().count(), 0);
        assert_eq!(supervisor.registry().session_of(Role::Commentator), None);
        assert_eq!(supervisor.registry().session_of(Role::Reporter), None);
        assert_eq!(supervisor.report(), None);

        // Same seed, so this is the key the commentator would have been issued
        let config = SupervisorConfig::default();
        let names = config.roles().map(|role| role.name.clone());
        let issued = RoleRegistry::new(names, config.match_rules().game_time_ms, &mut StdRng::seed_from_u64(3));
        let stale = issued.key(Role::Commentator).unwrap();
        assert!(supervisor.registry().resolve(stale).is_err());
        assert_eq!(
            supervisor.registry().resolve(issued.key(Role::TeamRed).unwrap()),
            Ok(Role::TeamRed)
        );

        let launched = prepare_registry(&config_with_observers(), true, &mut StdRng::seed_from_u64(3));
        for role in Role::ALL {
            let key = launched.key(role).unwrap();
            assert_eq!(launched.resolve(key), Ok(role));
        }
        assert!(!launched.is_ready(Role::Commentator));
    }

    #[tokio::test]
    async fn test_unknown_key_has_no_effect() {
        let mut supervisor = supervisor(SupervisorSettings::default()).await;
        let before = supervisor.referee().state().clone();

        supervisor.handle_command(1, "aiwc.set_speeds(\"intruder!!\", \"1,1,1,1,1,1,1,1,1,1\")");
        supervisor.handle_command(1, "aiwc.ready(\"intruder!!\")");

        assert_eq!(supervisor.referee().state(), &before);
        assert!(!supervisor.registry().is_ready(Role::TeamRed));
        assert_eq!(supervisor.registry().session_of(Role::TeamRed), None);
        assert_eq!(supervisor.pitch().backend().wheels[0][4], (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_commentator_cannot_move_robots() {
        let mut supervisor = supervisor_with_observers(SupervisorSettings::default()).await;
        let speeds = command(&supervisor, Role::Commentator, RpcCommand::SetSpeeds(vec![1.0; 10]));
        supervisor.handle_command(7, &speeds);

        assert_eq!(supervisor.registry().session_of(Role::Commentator), Some(7));
        assert_eq!(supervisor.pitch().backend().wheels[0][4], (0.0, 0.0));

        let comment = command(&supervisor, Role::Commentator, RpcCommand::Commentate("Kickoff!".into()));
        supervisor.handle_command(7, &comment);
        assert_eq!(supervisor.comments().lines().collect::<Vec<_>>(), vec!["[0.00] Kickoff!"]);
    }

    #[tokio::test]
    async fn test_match_starts_when_teams_ready() {
        let mut supervisor = supervisor(SupervisorSettings::default()).await;
        assert!(supervisor.tick().await.unwrap());
        assert_eq!(supervisor.status(), MatchStatus::WaitingForPlayers);

        for role in [Role::TeamRed, Role::TeamBlue] {
            let ready = command(&supervisor, role, RpcCommand::Ready);
            supervisor.handle_command(role as u32 + 1, &ready);
        }
        assert!(supervisor.tick().await.unwrap());
        assert_eq!(supervisor.status(), MatchStatus::Playing);
        assert_eq!(supervisor.referee().state().phase(), GameState::Kickoff);
    }

    #[tokio::test]
    async fn test_full_match_finishes_and_saves_report() {
        let reports = std::env::temp_dir().join(format!("supervisor-reports-{}", std::process::id()));
        let settings = SupervisorSettings {
            repeat: false,
            reports_dir: reports.clone(),
            realtime: false,
        };
        let mut supervisor = supervisor_with_observers(settings).await;
        for role in Role::ALL {
            let ready = command(&supervisor, role, RpcCommand::Ready);
            supervisor.handle_command(0, &ready);
        }
        let report = command(&supervisor, Role::Reporter, RpcCommand::Report("Both teams tried".into()));
        supervisor.handle_command(0, &report);

        let mut ticks = 0;
        let mut saw_second_half = false;
        while supervisor.tick().await.unwrap() {
            ticks += 1;
            saw_second_half |= supervisor.referee().state().half_passed();
            assert!(ticks < 1000, "match never finished");
        }

        assert!(saw_second_half);
        assert!(matches!(supervisor.status(), MatchStatus::Finished { ticks_left: 0 }));
        let path = supervisor.save_report().unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Both teams tried");
        assert_eq!(path.file_name().unwrap(), "reporter.txt");
        let _ = std::fs::remove_dir_all(reports);
    }

    #[tokio::test]
    async fn test_repeat_swaps_sides() {
        let settings = SupervisorSettings {
            repeat: true,
            realtime: false,
            ..SupervisorSettings::default()
        };
        let mut supervisor = supervisor(settings).await;
        let red_key = supervisor.registry().key(Role::TeamRed).unwrap().to_string();
        for role in [Role::TeamRed, Role::TeamBlue] {
            let ready = command(&supervisor, role, RpcCommand::Ready);
            supervisor.handle_command(0, &ready);
        }

        let mut ticks = 0;
        while supervisor.registry().key(Role::TeamBlue) != Some(red_key.as_str()) {
            assert!(supervisor.tick().await.unwrap());
            ticks += 1;
            assert!(ticks < 1000, "sides never swapped");
        }
        let state = supervisor.referee().state();
        assert!(!state.half_passed());
        assert_eq!(state.score(), [0, 0]);
        assert_eq!(state.ball.ownership, Team::Red);
        assert_eq!(supervisor.status(), MatchStatus::Playing);
    }

    #[tokio::test]
    async fn test_termination_stops_run_and_keeps_report() {
        let reports = std::env::temp_dir().join(format!("supervisor-terminated-{}", std::process::id()));
        let settings = SupervisorSettings {
            repeat: false,
            reports_dir: reports.clone(),
            realtime: false,
        };
        let mut supervisor = supervisor_with_observers(settings).await;
        supervisor.pitch.backend_mut().terminate_at_ms = Some(200);
        let report = command(&supervisor, Role::Reporter, RpcCommand::Report("cut short".into()));
        supervisor.handle_command(0, &report);

        supervisor.run().await.unwrap();

        let saved = std::fs::read_to_string(reports.join("reporter.txt")).unwrap();
        assert_eq!(saved, "cut short");
        let _ = std::fs::remove_dir_all(reports);
    }
}
