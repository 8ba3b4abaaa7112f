//! Table-wide limits and default timings.

use std::time::Duration;

use super::entities::Chips;

/// Every seated player takes two hole cards and the board takes five, so a
/// 52-card deck supports at most (52 - 5) / 2 seats.
pub const MAX_PLAYERS: usize = 23;

/// Display names are truncated to half of this.
pub const MAX_USER_INPUT_LENGTH: usize = 32;

/// Fewest players that can be dealt into a hand.
pub const MIN_PLAYERS_PER_HAND: usize = 2;

pub const DEFAULT_BIG_BLIND: Chips = 20;

/// Pause between the end of one hand and the deal of the next.
pub const DEFAULT_HAND_PAUSE: Duration = Duration::from_millis(2000);

/// How often a registry sweeps terminated tables.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Number of hole cards dealt to every player.
pub const HOLE_CARDS: usize = 2;
