//! Turn order for a single betting stage.

use super::hand::HandState;

/// Drives one betting stage to completion. Holds the turn pointer and the
/// set of players who have acted since the last raise; chip state stays in
/// [`HandState`].
#[derive(Clone, Debug)]
pub struct BettingRound {
    pointer: usize,
    acted: Vec<bool>,
    actions: usize,
}

impl BettingRound {
    /// Start a stage with the turn pointer at `first`, the index of the first
    /// seat that may be asked to act.
    pub fn new(hand: &HandState, first: usize) -> Self {
        let n = hand.seats.len();
        Self {
            pointer: if n == 0 { 0 } else { first % n },
            acted: vec![false; n],
            actions: 0,
        }
    }

    /// Number of actions recorded so far, timeouts included.
    pub fn actions(&self) -> usize {
        self.actions
    }

    pub fn has_acted(&self, idx: usize) -> bool {
        self.acted.get(idx).copied().unwrap_or(false)
    }

    /// Complete once a single active player remains, or every active player
    /// with chips has matched the current bet and acted since the last raise.
    pub fn is_complete(&self, hand: &HandState) -> bool {
        if hand.active_count() <= 1 {
            return true;
        }
        hand.seats
            .iter()
            .enumerate()
            .filter(|(_, seat)| seat.can_act())
            .all(|(idx, seat)| seat.stage_bet >= hand.current_bet && self.acted[idx])
    }

    /// Next seat at or after the pointer that can act, skipping folded and
    /// all-in players without consuming a turn. `None` once the stage is over.
    pub fn next_to_act(&mut self, hand: &HandState) -> Option<usize> {
        if self.is_complete(hand) {
            return None;
        }
        let n = hand.seats.len();
        let idx = (0..n)
            .map(|offset| (self.pointer + offset) % n)
            .find(|&idx| hand.seats[idx].can_act())?;
        self.pointer = idx;
        Some(idx)
    }

    /// Record that the player at `idx` acted and move the pointer past them.
    /// A raise clears the acted set and reseeds it with the raiser alone.
    pub fn record(&mut self, idx: usize, raised: bool) {
        if raised {
            self.acted.iter_mut().for_each(|a| *a = false);
        }
        if let Some(acted) = self.acted.get_mut(idx) {
            *acted = true;
        }
        self.actions += 1;
        if !self.acted.is_empty() {
            self.pointer = (idx + 1) % self.acted.len();
        }
    }
}
