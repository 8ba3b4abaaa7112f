//! Structured events emitted after every state change, and the sinks that
//! receive them.
//!
//! Sinks are called inline from the engine, so [`EventSink::notify`] must
//! never block or await. Anything slow belongs behind a [`ChannelSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{
    entities::{Action, Card, Chips, PlayerId, SeatIndex, TableId},
    functional::HandValue,
    states::Stage,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlindKind {
    Small,
    Big,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Requested,
    InsufficientPlayers,
    Faulted,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ShowdownHand {
    pub player_id: PlayerId,
    pub hole: [Card; 2],
    pub value: HandValue,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Refund {
    pub player_id: PlayerId,
    pub amount: Chips,
}

/// Events that occur at a table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    SessionStarted {
        players: Vec<PlayerId>,
        total_chips: u64,
    },
    HandStarted {
        hand_number: u64,
        dealer_seat: SeatIndex,
        small_blind_seat: SeatIndex,
        big_blind_seat: SeatIndex,
        players: Vec<PlayerId>,
    },
    HoleCardsDealt {
        player_id: PlayerId,
        cards: [Card; 2],
    },
    BlindPosted {
        player_id: PlayerId,
        blind: BlindKind,
        amount: Chips,
        pot: Chips,
    },
    StageStarted {
        stage: Stage,
        community: Vec<Card>,
    },
    TurnStarted {
        player_id: PlayerId,
        seat: SeatIndex,
        to_call: Chips,
        timeout_ms: u64,
    },
    ActionApplied {
        player_id: PlayerId,
        action: Action,
        chips_moved: Chips,
        stack: Chips,
        pot: Chips,
        current_bet: Chips,
        timed_out: bool,
    },
    HandEnded {
        winners: Vec<PlayerId>,
        pot: Chips,
        share: Chips,
        remainder: Chips,
        showdown: Vec<ShowdownHand>,
    },
    HandAborted {
        refunds: Vec<Refund>,
    },
    DealerMoved {
        seat: SeatIndex,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    PlayerReconnected {
        player_id: PlayerId,
    },
    PlayerSatOut {
        player_id: PlayerId,
    },
    PlayerSatIn {
        player_id: PlayerId,
    },
    SessionEnded {
        reason: EndReason,
        hands_played: u64,
    },
    SessionFaulted {
        detail: String,
    },
}

impl GameEvent {
    /// Stable name of the event kind, matching its serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::HandStarted { .. } => "hand_started",
            Self::HoleCardsDealt { .. } => "hole_cards_dealt",
            Self::BlindPosted { .. } => "blind_posted",
            Self::StageStarted { .. } => "stage_started",
            Self::TurnStarted { .. } => "turn_started",
            Self::ActionApplied { .. } => "action_applied",
            Self::HandEnded { .. } => "hand_ended",
            Self::HandAborted { .. } => "hand_aborted",
            Self::DealerMoved { .. } => "dealer_moved",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::PlayerReconnected { .. } => "player_reconnected",
            Self::PlayerSatOut { .. } => "player_sat_out",
            Self::PlayerSatIn { .. } => "player_sat_in",
            Self::SessionEnded { .. } => "session_ended",
            Self::SessionFaulted { .. } => "session_faulted",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStarted { players, .. } => {
                write!(f, "session started with {} players", players.len())
            }
            Self::HandStarted { hand_number, .. } => write!(f, "hand #{hand_number} started"),
            Self::HoleCardsDealt { player_id, .. } => write!(f, "dealt {player_id} in"),
            Self::BlindPosted {
                player_id,
                blind,
                amount,
                ..
            } => write!(f, "{player_id} posted {amount} ({blind:?} blind)"),
            Self::StageStarted { stage, .. } => write!(f, "{stage} started"),
            Self::TurnStarted { player_id, .. } => write!(f, "{player_id} to act"),
            Self::ActionApplied {
                player_id,
                action,
                timed_out,
                ..
            } => {
                if *timed_out {
                    write!(f, "{player_id} timed out and {action}")
                } else {
                    write!(f, "{player_id} {action}")
                }
            }
            Self::HandEnded { winners, share, .. } => {
                write!(f, "{winners:?} won {share} each")
            }
            Self::HandAborted { .. } => write!(f, "hand aborted, bets refunded"),
            Self::DealerMoved { seat } => write!(f, "button moved to seat {seat}"),
            Self::PlayerDisconnected { player_id } => write!(f, "{player_id} disconnected"),
            Self::PlayerReconnected { player_id } => write!(f, "{player_id} reconnected"),
            Self::PlayerSatOut { player_id } => write!(f, "{player_id} will sit out"),
            Self::PlayerSatIn { player_id } => write!(f, "{player_id} will sit in"),
            Self::SessionEnded { reason, .. } => write!(f, "session ended ({reason:?})"),
            Self::SessionFaulted { detail } => write!(f, "session faulted: {detail}"),
        }
    }
}

/// An event stamped with where and when it happened.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableEvent {
    pub table_id: TableId,
    pub hand_id: Option<Uuid>,
    /// Monotonic per table, starting at 1.
    pub sequence: u64,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: GameEvent,
}

/// Fire-and-forget receiver of table events.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &TableEvent);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: &TableEvent) {}
}

/// Writes each public event as one JSON line through the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// The line logged for `event`, or `None` when it must not be logged.
    fn line(event: &TableEvent) -> Option<Result<String, serde_json::Error>> {
        // Private cards stay out of the operator log.
        if matches!(event.event, GameEvent::HoleCardsDealt { .. }) {
            return None;
        }
        Some(serde_json::to_string(event))
    }
}

impl EventSink for LogSink {
    fn notify(&self, event: &TableEvent) {
        match Self::line(event) {
            Some(Ok(line)) => log::info!(target: "live_poker::events", "{line}"),
            Some(Err(e)) => log::warn!("Table {}: unserializable event: {}", event.table_id, e),
            None => {}
        }
    }
}

/// Forwards events into an unbounded channel so consumers can await them
/// without ever back-pressuring the engine.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<TableEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TableEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn notify(&self, event: &TableEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.sender.send(event.clone());
    }
}

/// Delivers every event to each inner sink in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

impl EventSink for FanoutSink {
    fn notify(&self, event: &TableEvent) {
        for sink in &self.sinks {
            sink.notify(event);
        }
    }
}

/// Stamps events for one table and hands them to its sink.
pub struct EventEmitter {
    table_id: TableId,
    sequence: AtomicU64,
    sink: Arc<dyn EventSink>,
}

impl EventEmitter {
    pub fn new(table_id: TableId, sink: Arc<dyn EventSink>) -> Self {
        Self {
            table_id,
            sequence: AtomicU64::new(0),
            sink,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn emit(&self, hand_id: Option<Uuid>, event: GameEvent) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("Table {} #{}: {}", self.table_id, sequence, event);
        self.sink.notify(&TableEvent {
            table_id: self.table_id,
            hand_id,
            sequence,
            at: Utc::now(),
            event,
        });
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("table_id", &self.table_id)
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish()
    }
}
