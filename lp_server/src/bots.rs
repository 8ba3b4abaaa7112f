//! Bot players that keep hosted tables busy.
//!
//! Each bot is a task that waits for its turn through the registry, thinks
//! for a while and answers with a legal action. Hole cards are not part of
//! the public snapshot, so bots read their own from a [`HoleCardBook`]
//! registered as an event sink.

use live_poker::{
    SessionRegistry,
    entities::{Action, Card, Chips, PlayerId, Rank, TableId},
    events::{EventSink, GameEvent, TableEvent},
    functional::eval,
    game::state_machine::HandSnapshot,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::task::JoinHandle;

const STRENGTH_HIGH_CARD: f32 = 0.1;
const STRENGTH_ONE_PAIR: f32 = 0.25;
const STRENGTH_TWO_PAIR: f32 = 0.40;
const STRENGTH_THREE_OF_A_KIND: f32 = 0.55;
const STRENGTH_STRAIGHT: f32 = 0.70;
const STRENGTH_FLUSH: f32 = 0.75;
const STRENGTH_FULL_HOUSE: f32 = 0.85;
const STRENGTH_FOUR_OF_A_KIND: f32 = 0.95;
const STRENGTH_STRAIGHT_FLUSH: f32 = 0.99;

/// Bot difficulty presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BotDifficulty {
    Easy, // Loose-passive, calls a lot
    #[default]
    Standard, // Balanced
    Tag,  // Tight-aggressive
}

impl fmt::Display for BotDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotDifficulty::Easy => write!(f, "easy"),
            BotDifficulty::Standard => write!(f, "standard"),
            BotDifficulty::Tag => write!(f, "tag"),
        }
    }
}

impl FromStr for BotDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(BotDifficulty::Easy),
            "standard" => Ok(BotDifficulty::Standard),
            "tag" => Ok(BotDifficulty::Tag),
            other => Err(format!("unknown bot difficulty '{other}'")),
        }
    }
}

/// Bot difficulty parameters
#[derive(Debug, Clone)]
pub struct DifficultyParams {
    /// Below this strength the bot gives up unless checking is free
    pub fold_threshold: f32,

    /// At or above this strength the bot looks to raise
    pub raise_threshold: f32,

    /// Aggression factor (ratio of bets/raises to calls)
    pub aggression_factor: f32,

    /// Average thinking time in milliseconds (base)
    pub base_think_time_ms: u64,

    /// Random variance in thinking time (±milliseconds)
    pub think_time_variance_ms: u64,

    /// Chance of raising a weak hand instead of folding it
    pub bluff_frequency: f32,
}

impl DifficultyParams {
    pub fn easy() -> Self {
        Self {
            fold_threshold: 0.08,
            raise_threshold: 0.40,
            aggression_factor: 0.5,
            base_think_time_ms: 1500,
            think_time_variance_ms: 1000,
            bluff_frequency: 0.0,
        }
    }

    pub fn standard() -> Self {
        Self {
            fold_threshold: 0.12,
            raise_threshold: 0.35,
            aggression_factor: 1.5,
            base_think_time_ms: 2000,
            think_time_variance_ms: 1500,
            bluff_frequency: 0.15,
        }
    }

    pub fn tag() -> Self {
        Self {
            fold_threshold: 0.18,
            raise_threshold: 0.33,
            aggression_factor: 2.5,
            base_think_time_ms: 2500,
            think_time_variance_ms: 2000,
            bluff_frequency: 0.25,
        }
    }

    pub fn from_difficulty(difficulty: BotDifficulty) -> Self {
        match difficulty {
            BotDifficulty::Easy => Self::easy(),
            BotDifficulty::Standard => Self::standard(),
            BotDifficulty::Tag => Self::tag(),
        }
    }
}

/// What a bot can see when it is asked to act.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnView {
    pub to_call: Chips,
    pub stack: Chips,
    pub pot: Chips,
    /// Smallest legal raise
    pub min_raise: Chips,
    /// Estimated strength in `0.0..=1.0`
    pub strength: f32,
}

impl TurnView {
    /// Build the view for `player_id` from a snapshot where it is acting.
    pub fn new(
        hand: &HandSnapshot,
        player_id: PlayerId,
        hole: Option<[Card; 2]>,
        big_blind: Chips,
    ) -> Option<Self> {
        let seat = hand.seats.iter().find(|s| s.player_id == player_id)?;
        Some(Self {
            to_call: hand.current_bet.saturating_sub(seat.stage_bet),
            stack: seat.stack,
            pot: hand.pot,
            min_raise: big_blind,
            strength: hole.map_or(0.0, |hole| estimate_strength(&hole, &hand.community)),
        })
    }
}

/// Rough strength of the best hand made from the hole cards and board.
pub fn estimate_strength(hole: &[Card; 2], board: &[Card]) -> f32 {
    let mut cards = Vec::with_capacity(2 + board.len());
    cards.extend_from_slice(hole);
    cards.extend_from_slice(board);

    let hand = eval(&cards);
    let base = match hand.rank {
        Rank::HighCard => STRENGTH_HIGH_CARD,
        Rank::OnePair => STRENGTH_ONE_PAIR,
        Rank::TwoPair => STRENGTH_TWO_PAIR,
        Rank::ThreeOfAKind => STRENGTH_THREE_OF_A_KIND,
        Rank::Straight => STRENGTH_STRAIGHT,
        Rank::Flush => STRENGTH_FLUSH,
        Rank::FullHouse => STRENGTH_FULL_HOUSE,
        Rank::FourOfAKind => STRENGTH_FOUR_OF_A_KIND,
        Rank::StraightFlush => STRENGTH_STRAIGHT_FLUSH,
    };

    // Kickers move a hand up to a tenth within its rank.
    let high = hand.values.iter().copied().max().unwrap_or(0);
    (base + f32::from(high) / 14.0 * 0.1).min(1.0)
}

/// Picks actions for one bot.
pub struct BotPolicy {
    params: DifficultyParams,
    rng: StdRng,
}

impl BotPolicy {
    pub fn new(difficulty: BotDifficulty, seed: Option<u64>) -> Self {
        Self {
            params: DifficultyParams::from_difficulty(difficulty),
            rng: seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64),
        }
    }

    /// Always returns an action that is legal for `view`.
    pub fn decide(&mut self, view: &TurnView) -> Action {
        let params = &self.params;
        let can_check = view.to_call == 0;

        if view.to_call >= view.stack {
            return if view.strength >= params.raise_threshold {
                Action::AllIn
            } else {
                Action::Fold
            };
        }

        if view.strength < params.fold_threshold {
            if can_check {
                return Action::Check;
            }
            if params.bluff_frequency > 0.0 && self.rng.random_bool(f64::from(params.bluff_frequency)) {
                return self.raise(view);
            }
            return Action::Fold;
        }

        if view.strength < params.raise_threshold {
            if can_check {
                return Action::Check;
            }
            let call_probability = (0.3 + params.aggression_factor / 5.0).min(1.0);
            return if self.rng.random_bool(f64::from(call_probability)) {
                Action::Call
            } else {
                Action::Fold
            };
        }

        let raise_probability = (0.4 + params.aggression_factor / 4.0).min(1.0);
        if self.rng.random_bool(f64::from(raise_probability)) {
            self.raise(view)
        } else if can_check {
            // Slow-play
            Action::Check
        } else {
            Action::Call
        }
    }

    /// A pot-scaled raise, or all-in when the stack can't cover it.
    fn raise(&mut self, view: &TurnView) -> Action {
        let multiplier = match self.params.aggression_factor {
            x if x < 1.0 => 0.5,
            x if x < 2.0 => 0.75,
            _ => 1.0,
        } * (1.0 + self.rng.random_range(-0.2f32..=0.2));
        let amount = ((view.pot as f32 * multiplier) as Chips).max(view.min_raise);

        if view.to_call.saturating_add(amount) >= view.stack {
            Action::AllIn
        } else {
            Action::Raise(amount)
        }
    }

    /// How long to wait before answering.
    pub fn think_time(&mut self) -> Duration {
        let base = self.params.base_think_time_ms;
        let variance = self.params.think_time_variance_ms.min(base);
        let ms = self.rng.random_range(base - variance..=base + variance);
        Duration::from_millis(ms)
    }
}

/// Records each player's hole cards from `HoleCardsDealt` events.
#[derive(Default)]
pub struct HoleCardBook {
    cards: Mutex<HashMap<(TableId, PlayerId), [Card; 2]>>,
}

impl HoleCardBook {
    pub fn hole(&self, table_id: TableId, player_id: PlayerId) -> Option<[Card; 2]> {
        let cards = self.cards.lock().unwrap_or_else(PoisonError::into_inner);
        cards.get(&(table_id, player_id)).copied()
    }
}

impl EventSink for HoleCardBook {
    fn notify(&self, event: &TableEvent) {
        match &event.event {
            GameEvent::HoleCardsDealt { player_id, cards } => {
                let mut book = self.cards.lock().unwrap_or_else(PoisonError::into_inner);
                book.insert((event.table_id, *player_id), *cards);
            }
            GameEvent::SessionEnded { .. } => {
                let mut book = self.cards.lock().unwrap_or_else(PoisonError::into_inner);
                book.retain(|(table_id, _), _| *table_id != event.table_id);
            }
            _ => {}
        }
    }
}

/// Settings shared by every bot on a table.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub difficulty: BotDifficulty,
    /// Chance (0-100) of letting a turn time out
    pub idle_percent: u8,
    pub big_blind: Chips,
    pub action_timeout: Duration,
}

/// Play for `player_id` until the table stops.
pub fn spawn_bot(
    registry: Arc<SessionRegistry>,
    book: Arc<HoleCardBook>,
    table_id: TableId,
    player_id: PlayerId,
    settings: BotSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut policy = BotPolicy::new(settings.difficulty, None);
        let mut idle_rng = StdRng::from_os_rng();

        while let Ok(hand) = registry.wait_for_turn(table_id, player_id).await {
            if idle_rng.random_range(0..100u8) < settings.idle_percent {
                tracing::debug!(table_id, player_id, "Bot idling through its turn");
                tokio::time::sleep(settings.action_timeout).await;
                continue;
            }

            // Never think long enough to be timed out.
            let think = policy.think_time().min(settings.action_timeout / 2);
            tokio::time::sleep(think).await;

            let Some(view) = TurnView::new(
                &hand,
                player_id,
                book.hole(table_id, player_id),
                settings.big_blind,
            ) else {
                continue;
            };
            let action = policy.decide(&view);
            match registry.submit_action(table_id, player_id, action).await {
                Ok(applied) => {
                    tracing::trace!(table_id, player_id, %action, chips = applied.chips_moved, "Bot acted");
                }
                Err(e) => tracing::debug!(table_id, player_id, error = %e, "Bot action rejected"),
            }
        }

        tracing::debug!(table_id, player_id, "Bot left the table");
    })
}
