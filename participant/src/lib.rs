//! # Participant Library
//!
//! This library provides a reference team client for the match supervisor.
//! It connects over TCP, speaks the text RPC protocol and hands each frame to
//! a [`player::Player`] that decides the wheel speeds of the five robots.
//!
//! ## Protocol Flow
//!
//! 1. Send `aiwc.get_info("<key>")` and wait for the game info JSON
//! 2. Initialise the player, then send `aiwc.ready("<key>")`
//! 3. For every frame, send `aiwc.set_speeds("<key>", "<l0,r0,...,l4,r4>")`
//! 4. Stop on the frame whose reset reason is `GameEnd`, or when the
//!    supervisor closes the connection
//!
//! Frames arrive as JSON objects written back to back with no delimiter, so
//! [`network::JsonStream`] reassembles them from arbitrary read boundaries.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! The connection, the JSON stream decoder and the protocol loop.
//!
//! ### Player Module (`player`)
//! The [`player::Player`] trait and the [`player::SkeletonPlayer`] that drives
//! every robot straight ahead at full speed.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use participant::network::Participant;
//! use participant::player::SkeletonPlayer;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut participant = Participant::connect("127.0.0.1:5000", "abcdefghij", SkeletonPlayer::new()).await?;
//!     let summary = participant.run().await?;
//!     println!("Final score {:?}", summary.score);
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod player;
