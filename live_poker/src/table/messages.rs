//! Table actor message types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::errors::TableResult;
use crate::game::{
    entities::{Card, Chips, PlayerId, PlayerStatus, SeatIndex, TableId, Username},
    states::Stage,
};

/// Orchestrator lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::NotStarted => write!(f, "not started"),
            Lifecycle::Running => write!(f, "running"),
            Lifecycle::Stopping => write!(f, "stopping"),
            Lifecycle::Stopped => write!(f, "stopped"),
        }
    }
}

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Begin the hand loop
    Start {
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Get current table state
    GetState {
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Player lost their connection
    MarkDisconnected {
        player_id: PlayerId,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Player connection restored
    MarkReconnected {
        player_id: PlayerId,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Skip hands from the next deal on
    SitOut {
        player_id: PlayerId,
        response: oneshot::Sender<TableResult<()>>,
    },

    /// Rejoin the deal from the next hand on
    SitIn {
        player_id: PlayerId,
        response: oneshot::Sender<TableResult<()>>,
    },
}

/// Per-player portion of a table snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub name: Username,
    pub seat: SeatIndex,
    pub stack: Chips,
    pub status: PlayerStatus,
    pub connected: bool,
    pub sitting_out: bool,
    pub is_acting: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    /// Chips put in during the current stage, zero between hands
    pub stage_bet: Chips,
}

/// Hand-level portion of a table snapshot, present while a hand is live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveHand {
    pub hand_id: Uuid,
    pub stage: Stage,
    pub pot: Chips,
    pub current_bet: Chips,
    pub acting_seat: Option<SeatIndex>,
    pub community: Vec<Card>,
}

/// Table state response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table_id: TableId,
    pub lifecycle: Lifecycle,
    pub running: bool,
    pub dealer_seat: SeatIndex,
    pub hand_number: u64,
    pub big_blind: Chips,
    pub small_blind: Chips,
    pub hand: Option<LiveHand>,
    pub players: Vec<PlayerSnapshot>,
    /// Chips lost to uneven splits over the session
    pub discarded_chips: u64,
    /// Set when the session was ended by an accounting defect
    pub fault: Option<String>,
}

impl TableSnapshot {
    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn acting_player(&self) -> Option<PlayerId> {
        self.players.iter().find(|p| p.is_acting).map(|p| p.player_id)
    }

    /// Sum of every stack and the live pot.
    pub fn chips_in_play(&self) -> u64 {
        let stacks: u64 = self.players.iter().map(|p| u64::from(p.stack)).sum();
        stacks + self.hand.as_ref().map_or(0, |h| u64::from(h.pot))
    }
}
