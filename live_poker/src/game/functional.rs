//! Hand ranking.
//!
//! Settlement only needs a total order over card combinations, so the engine
//! consumes ranking through [`HandEvaluator`]. [`StandardEvaluator`] is the
//! default implementation: the best five-card poker hand out of up to seven
//! cards, compared by category and then by kickers.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::entities::{ACE, Card, Rank, Value};

/// Totally-ordered strength of a card combination. Higher wins, equal values
/// split the pot.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandValue {
    pub rank: Rank,
    /// Tie-breaking values, most significant first.
    pub values: Vec<Value>,
}

/// Pure, side-effect-free hand ranking.
pub trait HandEvaluator: Send + Sync {
    fn rank(&self, cards: &[Card]) -> HandValue;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEvaluator;

impl HandEvaluator for StandardEvaluator {
    fn rank(&self, cards: &[Card]) -> HandValue {
        eval(cards)
    }
}

/// Best hand that can be made from `cards`. Five or more cards are judged as
/// their best five-card subset; fewer cards are judged as-is, which only
/// allows pairs, trips and quads.
pub fn eval(cards: &[Card]) -> HandValue {
    if cards.len() <= 5 {
        return eval_subset(cards);
    }

    let n = cards.len();
    let mut best: Option<HandValue> = None;
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let five = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let value = eval_subset(&five);
                        if best.as_ref().is_none_or(|b| value > *b) {
                            best = Some(value);
                        }
                    }
                }
            }
        }
    }
    best.unwrap_or_else(|| eval_subset(&[]))
}

fn eval_subset(cards: &[Card]) -> HandValue {
    // (count, value) groups, largest group first and then highest value.
    let mut groups: Vec<(usize, Value)> = Vec::with_capacity(5);
    let mut sorted: Vec<Value> = cards.iter().map(|c| c.0).collect();
    sorted.sort_unstable_by_key(|v| Reverse(*v));
    for value in &sorted {
        match groups.last_mut() {
            Some((count, v)) if v == value => *count += 1,
            _ => groups.push((1, *value)),
        }
    }
    groups.sort_unstable_by_key(|(count, value)| Reverse((*count, *value)));
    let values: Vec<Value> = groups
        .iter()
        .flat_map(|(count, value)| std::iter::repeat_n(*value, *count))
        .collect();

    let is_flush = cards.len() == 5 && cards.iter().all(|c| c.1 == cards[0].1);
    let straight_high = if groups.len() == 5 {
        straight_high(&sorted)
    } else {
        None
    };

    let rank = match (straight_high, is_flush, groups.first().map(|g| g.0), groups.len()) {
        (Some(_), true, ..) => Rank::StraightFlush,
        (_, _, Some(4), _) => Rank::FourOfAKind,
        (_, _, Some(3), 2) if cards.len() == 5 => Rank::FullHouse,
        (_, true, ..) => Rank::Flush,
        (Some(_), false, ..) => Rank::Straight,
        (_, _, Some(3), _) => Rank::ThreeOfAKind,
        (_, _, Some(2), _) if groups.get(1).is_some_and(|g| g.0 == 2) => Rank::TwoPair,
        (_, _, Some(2), _) => Rank::OnePair,
        _ => Rank::HighCard,
    };

    match (rank, straight_high) {
        (Rank::Straight | Rank::StraightFlush, Some(high)) => HandValue {
            rank,
            values: vec![high],
        },
        _ => HandValue { rank, values },
    }
}

/// High card of a straight over five distinct descending values. The wheel
/// (A-2-3-4-5) counts as five-high.
fn straight_high(desc: &[Value]) -> Option<Value> {
    if desc.len() != 5 {
        return None;
    }
    if desc[0] - desc[4] == 4 {
        return Some(desc[0]);
    }
    if desc == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

/// Indices of every maximal element. Ties yield more than one index.
pub fn argmax<T: Ord>(items: &[T]) -> Vec<usize> {
    let Some(best) = items.iter().max() else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| *item == best)
        .map(|(i, _)| i)
        .collect()
}
