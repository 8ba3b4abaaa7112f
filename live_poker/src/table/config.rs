//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

use super::errors::{TableError, TableResult};
use crate::game::{
    constants::{DEFAULT_BIG_BLIND, DEFAULT_HAND_PAUSE, MAX_PLAYERS},
    entities::{Blinds, Chips, SeatIndex},
};

/// Table speed variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    #[default]
    Normal,
    Turbo,
    Hyper,
}

impl fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

impl FromStr for TableSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(TableSpeed::Normal),
            "turbo" => Ok(TableSpeed::Turbo),
            "hyper" => Ok(TableSpeed::Hyper),
            other => Err(format!("unknown table speed '{other}'")),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Big blind amount, also the minimum raise
    pub big_blind: Chips,

    /// Small blind amount (default: half the big blind)
    pub small_blind: Chips,

    /// Table speed, which sets the default action timeout
    pub speed: TableSpeed,

    /// Overrides the speed-derived action timeout
    pub action_timeout_ms: Option<u64>,

    /// Pause between hands
    pub hand_pause_ms: u64,

    /// Seat holding the button for the first hand (random when unset)
    pub initial_dealer: Option<SeatIndex>,

    /// Seed for dealer selection and shuffles, for reproducible sessions
    pub rng_seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::with_big_blind(DEFAULT_BIG_BLIND)
    }
}

impl TableConfig {
    pub fn with_big_blind(big_blind: Chips) -> Self {
        let blinds = Blinds::from_big(big_blind);
        Self {
            big_blind: blinds.big,
            small_blind: blinds.small,
            speed: TableSpeed::Normal,
            action_timeout_ms: None,
            hand_pause_ms: u64::try_from(DEFAULT_HAND_PAUSE.as_millis()).unwrap_or(2000),
            initial_dealer: None,
            rng_seed: None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> TableResult<()> {
        if self.big_blind == 0 {
            return Err(TableError::InvalidConfig(
                "Big blind must be positive".to_string(),
            ));
        }

        if self.small_blind >= self.big_blind {
            return Err(TableError::InvalidConfig(
                "Big blind must be greater than small blind".to_string(),
            ));
        }

        if self.action_timeout_ms == Some(0) {
            return Err(TableError::InvalidConfig(
                "Action timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a seat list of `players` against this configuration
    pub fn validate_seats(&self, players: usize) -> TableResult<()> {
        if players == 0 || players > MAX_PLAYERS {
            return Err(TableError::InvalidConfig(format!(
                "Players must be between 1 and {MAX_PLAYERS}"
            )));
        }
        if let Some(dealer) = self.initial_dealer
            && dealer >= players
        {
            return Err(TableError::InvalidConfig(format!(
                "Initial dealer seat {dealer} is not one of the {players} seats"
            )));
        }
        Ok(())
    }

    pub fn blinds(&self) -> Blinds {
        Blinds {
            small: self.small_blind,
            big: self.big_blind,
        }
    }

    /// Get action timeout based on table speed
    pub fn action_timeout(&self) -> Duration {
        match self.action_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => match self.speed {
                TableSpeed::Normal => Duration::from_secs(30),
                TableSpeed::Turbo => Duration::from_secs(15),
                TableSpeed::Hyper => Duration::from_secs(5),
            },
        }
    }

    pub fn hand_pause(&self) -> Duration {
        Duration::from_millis(self.hand_pause_ms)
    }
}
