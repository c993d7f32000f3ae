//! # Match Supervisor Library
//!
//! This library provides the referee of a simulated five-a-side robot soccer
//! match. It accepts the participant processes over TCP, officiates the match
//! on top of a physics simulation, and sends every participant a view of the
//! field each control step.
//!
//! ## Core Responsibilities
//!
//! ### Session Handling
//! Participants connect over TCP and speak a small text RPC protocol
//! (`aiwc.get_info`, `aiwc.ready`, `aiwc.set_speeds`, `aiwc.commentate`,
//! `aiwc.report`). Commands may arrive split or concatenated arbitrarily.
//! Every command carries a key that identifies one of four roles:
//! - Team red and team blue, which drive their robots
//! - The commentator, whose lines are kept in a short ring buffer
//! - The reporter, whose final report is saved when the run ends
//!
//! ### Officiating
//! The referee runs a deterministic state machine over the phases kickoff,
//! open play, goal kick, corner kick and penalty kick. It scores goals,
//! restarts play when the ball leaves the field, punishes crowded penalty
//! areas, sends off fallen or escaped robots, and breaks deadlocks.
//!
//! ### Frame Publishing
//! Once per control step every connected role receives a JSON frame. Team
//! blue's frame is team red's rotated half a turn, so each team always sees
//! itself defending the negative x end.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Tick Loop
//! One tick polls all sockets without blocking, applies the commands read,
//! runs the foul checks and phase logic, publishes frames, flushes output
//! and finally advances the simulation by [`rules::PERIOD_MS`]. There are no
//! locks and no background tasks; a misbehaving participant can only lose
//! its own connection.
//!
//! ### Canonical Frame
//! All match state is kept in team red's frame. During the second half the
//! teams have swapped ends, and [`pitch::Pitch`] rotates world coordinates on
//! the way in and out so the rules never need to know.
//!
//! ### Pluggable Simulation
//! The physics engine and the cameras sit behind [`backend::SimulationBackend`]
//! and [`backend::VisionCapture`]. The crate ships a [`kinematic`] backend so
//! the binary runs a complete match on its own.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Non-blocking accept, read and write for every participant connection.
//!
//! ### Registry Module (`registry`)
//! Role keys, authorization, session binding and readiness.
//!
//! ### Referee Modules (`referee`, `fouls`, `field`, `formation`, `match_state`, `rules`)
//! The match state machine, per-robot fouls and ownership decisions, field
//! geometry, reset formations and the timing constants of the rules.
//!
//! ### Publisher Module (`publisher`)
//! Builds the per-team frames.
//!
//! ### Supervisor Module (`supervisor`)
//! The run loop tying everything together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use supervisor::backend::NullVision;
//! use supervisor::config::SupervisorConfig;
//! use supervisor::kinematic::KinematicBackend;
//! use supervisor::session::SessionManager;
//! use supervisor::supervisor::{prepare_registry, Supervisor, SupervisorSettings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SupervisorConfig::default();
//!     let registry = prepare_registry(&config, false, &mut rand::thread_rng());
//!     let sessions = SessionManager::bind("127.0.0.1:5000").await?;
//!
//!     let mut supervisor = Supervisor::new(
//!         sessions,
//!         registry,
//!         config.match_rules(),
//!         KinematicBackend::new(),
//!         NullVision,
//!         SupervisorSettings::default(),
//!     );
//!
//!     // Runs until both halves are played, then saves the report
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod comments;
pub mod config;
pub mod error;
pub mod field;
pub mod formation;
pub mod fouls;
pub mod kinematic;
pub mod launcher;
pub mod match_state;
pub mod pitch;
pub mod publisher;
pub mod referee;
pub mod registry;
pub mod rules;
pub mod session;
pub mod supervisor;

#[cfg(test)]
mod test_support;
