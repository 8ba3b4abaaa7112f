//! Pot settlement.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, Chips},
    functional::{HandEvaluator, HandValue, argmax},
    hand::HandState,
};

/// How the pot of a finished hand was distributed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Settlement {
    /// Indices into the hand's seat list.
    pub winners: Vec<usize>,
    pub pot: Chips,
    pub share: Chips,
    /// Left over from an uneven split. Not awarded to anyone.
    pub remainder: Chips,
    /// Hands were compared rather than awarded by default.
    pub showdown: bool,
    /// Rank of every active hand at a showdown, by seat list index.
    pub ranks: Vec<(usize, HandValue)>,
}

/// Even split of `pot` between `winners` players, returning (share, remainder).
pub fn split_pot(pot: Chips, winners: usize) -> (Chips, Chips) {
    match Chips::try_from(winners) {
        Ok(0) | Err(_) => (0, pot),
        Ok(n) => (pot / n, pot % n),
    }
}

/// Award the pot. A lone active player takes it without evaluation; otherwise
/// every active hand is ranked once with its hole cards plus the board and
/// all players sharing the best rank split it evenly.
///
/// The pot is emptied and the remainder is returned in the settlement.
pub fn settle(hand: &mut HandState, evaluator: &dyn HandEvaluator) -> Settlement {
    let pot = hand.pot;
    let active: Vec<usize> = (0..hand.seats.len())
        .filter(|&idx| hand.seats[idx].is_active())
        .collect();

    let (winners, ranks) = if active.len() == 1 {
        (active, Vec::new())
    } else {
        let ranks: Vec<(usize, HandValue)> = active
            .iter()
            .map(|&idx| {
                let mut cards: Vec<Card> = hand.seats[idx]
                    .hole
                    .map(|hole| hole.to_vec())
                    .unwrap_or_default();
                cards.extend_from_slice(&hand.community);
                (idx, evaluator.rank(&cards))
            })
            .collect();
        let values: Vec<&HandValue> = ranks.iter().map(|(_, value)| value).collect();
        let winners = argmax(&values).into_iter().map(|i| ranks[i].0).collect();
        (winners, ranks)
    };

    let (share, remainder) = split_pot(pot, winners.len());
    for &idx in &winners {
        hand.seats[idx].stack += share;
    }
    hand.pot = 0;

    Settlement {
        showdown: !ranks.is_empty(),
        winners,
        pot,
        share,
        remainder,
        ranks,
    }
}
