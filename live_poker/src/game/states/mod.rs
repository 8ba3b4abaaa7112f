//! Phase definitions for a single hand.
//!
//! A hand moves Dealing -> Blinds -> PreFlop betting -> Flop reveal -> Flop
//! betting -> Turn reveal -> Turn betting -> River reveal -> River betting ->
//! Settlement -> Done, short-circuiting to Settlement once one active player
//! remains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Betting stage of a hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PreFlop,
    Flop,
    Turn,
    River,
    Settlement,
}

impl Stage {
    /// Community cards revealed when the stage opens.
    #[must_use]
    pub fn reveal_count(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn | Self::River => 1,
            Self::PreFlop | Self::Settlement => 0,
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::PreFlop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Settlement => Self::Settlement,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Settlement => "settlement",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "stage")]
pub enum HandPhase {
    Dealing,
    Blinds,
    Reveal(Stage),
    Betting(Stage),
    Settlement,
    Done,
}

impl HandPhase {
    /// Phase that follows this one given the number of players still active.
    #[must_use]
    pub fn next(self, active: usize) -> Self {
        let contested = active > 1;
        match self {
            Self::Dealing => Self::Blinds,
            Self::Blinds if contested => Self::Betting(Stage::PreFlop),
            Self::Betting(stage) if contested => match stage.next() {
                Stage::Settlement => Self::Settlement,
                next => Self::Reveal(next),
            },
            Self::Blinds | Self::Betting(_) => Self::Settlement,
            Self::Reveal(stage) => Self::Betting(stage),
            Self::Settlement | Self::Done => Self::Done,
        }
    }

    /// Stage reported to observers while in this phase.
    #[must_use]
    pub fn stage(self) -> Stage {
        match self {
            Self::Dealing | Self::Blinds => Stage::PreFlop,
            Self::Reveal(stage) | Self::Betting(stage) => stage,
            Self::Settlement | Self::Done => Stage::Settlement,
        }
    }
}
