use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

pub const ACE: Value = 14;

/// A card is a tuple of a value (two=2u8 ... ace=14u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "hi",
            Self::OnePair => "1p",
            Self::TwoPair => "2p",
            Self::ThreeOfAKind => "3k",
            Self::Straight => "s8",
            Self::Flush => "fs",
            Self::FullHouse => "fh",
            Self::FourOfAKind => "4k",
            Self::StraightFlush => "sf",
        };
        write!(f, "{repr}")
    }
}

/// A shuffled 52-card sequence with a draw cursor. A deck is built for one
/// hand and dropped with it.
#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    deck_idx: usize,
}

impl Deck {
    /// Draw the next card, or `None` once all 52 are gone.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
        self.deck_idx = 0;
    }

    /// A deck whose first cards are `top` in the given order, followed by the
    /// rest of a fresh deck. Duplicates in `top` are ignored.
    pub fn stacked(top: &[Card]) -> Self {
        let mut order: Vec<Card> = Vec::with_capacity(52);
        for card in top {
            if !order.contains(card) {
                order.push(*card);
            }
        }
        for card in Deck::default().cards {
            if !order.contains(&card) {
                order.push(card);
            }
        }
        let mut cards = Deck::default().cards;
        cards.copy_from_slice(&order[..52]);
        Self { cards, deck_idx: 0 }
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards: [Card; 52] = [Card(2, Suit::Club); 52];
        for (i, value) in (2u8..=ACE).enumerate() {
            for (j, suit) in Suit::ALL.into_iter().enumerate() {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole chips. All bets and player stacks are represented
/// as whole chips.
pub type Chips = u32;

pub type PlayerId = i64;

pub type TableId = i64;

/// Type alias for a player's fixed seat at the table.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let username = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .take(constants::MAX_USER_INPUT_LENGTH / 2)
            .collect();
        Self(username)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl Blinds {
    /// Small blind is half the big blind, rounded down.
    pub fn from_big(big: Chips) -> Self {
        Self {
            small: big / 2,
            big,
        }
    }
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.small, self.big)
    }
}

/// A player decision. `Raise` carries the amount raised on top of the call.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Check,
    Call,
    Raise(Chips),
    Fold,
    AllIn,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Check => write!(f, "checks"),
            Self::Call => write!(f, "calls"),
            Self::Raise(amount) => write!(f, "raises {amount}"),
            Self::Fold => write!(f, "folds"),
            Self::AllIn => write!(f, "goes all-in"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Folded,
    SittingOut,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Active => "active",
            Self::Folded => "folded",
            Self::SittingOut => "sitting out",
        };
        write!(f, "{repr}")
    }
}

/// Identity and buy-in supplied when a table is created. The engine owns the
/// stack from then on.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSeed {
    pub id: PlayerId,
    pub name: Username,
    pub stack: Chips,
}

impl PlayerSeed {
    pub fn new(id: PlayerId, name: &str, stack: Chips) -> Self {
        Self {
            id,
            name: Username::new(name),
            stack,
        }
    }
}

/// A seated player for the lifetime of a session.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: Username,
    pub seat: SeatIndex,
    pub stack: Chips,
    pub status: PlayerStatus,
    pub connected: bool,
    /// Set by a sit-out request, honoured from the next hand onwards.
    pub sitting_out: bool,
}

impl Player {
    pub fn new(seed: PlayerSeed, seat: SeatIndex) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            seat,
            stack: seed.stack,
            status: PlayerStatus::Active,
            connected: true,
            sitting_out: false,
        }
    }

    /// Can be dealt into the next hand.
    pub fn is_eligible(&self) -> bool {
        self.stack > 0 && !self.sitting_out && self.connected
    }

    /// Can hold the dealer button.
    pub fn can_hold_button(&self) -> bool {
        self.stack > 0 && !self.sitting_out
    }
}
