//! Table module providing multi-table support with an async actor model.
//!
//! This module implements:
//! - TableActor: async actor running one table's hand loop
//! - SessionRegistry: process-wide map of live tables
//! - Message-based communication with tokio channels
//!
//! ## Architecture
//!
//! Each table runs in its own Tokio task with an mpsc message inbox. The
//! actor spawns a child task per hand ([`crate::game::state_machine::RoundEngine`])
//! and hands it a cancellation token derived from its own. Actions travel
//! from a [`TableHandle`] straight to the live hand over a single-slot
//! channel, one submission at a time per table.
//!
//! ## Example
//!
//! ```no_run
//! use live_poker::{
//!     entities::{Action, PlayerSeed},
//!     events::LogSink,
//!     table::SessionRegistry,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = SessionRegistry::new(Arc::new(LogSink));
//!     let players = vec![
//!         PlayerSeed::new(1, "alice", 1000),
//!         PlayerSeed::new(2, "bob", 1000),
//!     ];
//!     registry.create(1, players, 20).await.unwrap();
//!     registry.start(1).await.unwrap();
//!
//!     let hand = registry.wait_for_turn(1, 1).await.unwrap();
//!     println!("pot is {}", hand.pot);
//!     registry.submit_action(1, 1, Action::Call).await.unwrap();
//! }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod seating;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableSpeed};
pub use errors::{TableError, TableResult};
pub use manager::SessionRegistry;
pub use messages::{Lifecycle, LiveHand, PlayerSnapshot, TableMessage, TableSnapshot};
