//! # Live Poker
//!
//! A concurrent Texas Hold'em table engine. Each table runs as its own
//! Tokio task that deals hand after hand, waits on players with a per-action
//! timeout, and settles pots while keeping every chip accounted for.
//!
//! ## Architecture
//!
//! - [`table::SessionRegistry`]: process-wide map from table id to table
//! - [`table::TableActor`]: one table's hand loop, dealer button and seating
//! - [`game::state_machine::RoundEngine`]: one hand, from the deal to settlement
//! - [`game::betting::BettingRound`]: turn order within one betting stage
//!
//! Every state change is reported as a [`game::events::GameEvent`] to an
//! [`game::events::EventSink`].
//!
//! ## Example
//!
//! ```
//! use live_poker::functional::{HandEvaluator, StandardEvaluator};
//! use live_poker::entities::{Card, Suit};
//!
//! let cards = [
//!     Card(14, Suit::Spade),
//!     Card(13, Suit::Spade),
//!     Card(12, Suit::Spade),
//!     Card(11, Suit::Spade),
//!     Card(10, Suit::Spade),
//! ];
//! let value = StandardEvaluator.rank(&cards);
//! println!("{:?}", value.rank);
//! ```

/// Core game logic: cards, hands, betting and events.
pub mod game;
pub use game::{constants, entities, events, functional};

/// Table actors and the session registry.
pub mod table;
pub use table::{SessionRegistry, TableConfig, TableError, TableHandle, TableResult, TableSnapshot};
