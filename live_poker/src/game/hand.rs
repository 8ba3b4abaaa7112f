//! Per-hand chip and status bookkeeping.
//!
//! The eligible players are fixed for the duration of a hand, so every
//! per-player field lives in one `Vec<HandSeat>` indexed by position in the
//! eligible list.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Action, Card, Chips, PlayerId, PlayerStatus, SeatIndex};

/// Betting-rule violations. The offending submission has no effect.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum IllegalAction {
    #[error("cannot check while {owed} is owed")]
    CheckOwesCall { owed: Chips },

    #[error("nothing to call")]
    NothingToCall,

    #[error("raise of {amount} is below the minimum of {minimum}")]
    RaiseBelowMinimum { amount: Chips, minimum: Chips },

    #[error("raise needs {required} but only {stack} remain")]
    RaiseExceedsStack { required: Chips, stack: Chips },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandSeat {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub stack: Chips,
    pub status: PlayerStatus,
    pub hole: Option<[Card; 2]>,
    pub stage_bet: Chips,
    pub total_bet: Chips,
}

impl HandSeat {
    pub fn new(player_id: PlayerId, seat: SeatIndex, stack: Chips) -> Self {
        Self {
            player_id,
            seat,
            stack,
            status: PlayerStatus::Active,
            hole: None,
            stage_bet: 0,
            total_bet: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }

    /// Active and still holding chips, so able to take a turn.
    pub fn can_act(&self) -> bool {
        self.is_active() && self.stack > 0
    }
}

/// Result of applying one action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Applied {
    pub chips_moved: Chips,
    /// The action increased the bet everyone else has to match.
    pub raised: bool,
}

#[derive(Clone, Debug)]
pub struct HandState {
    pub seats: Vec<HandSeat>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub big_blind: Chips,
    pub community: Vec<Card>,
}

impl HandState {
    pub fn new(seats: Vec<HandSeat>, big_blind: Chips) -> Self {
        Self {
            seats,
            pot: 0,
            current_bet: 0,
            big_blind,
            community: Vec::with_capacity(5),
        }
    }

    pub fn active_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_active()).count()
    }

    /// Chips still owed by the player at `idx` to match the current bet.
    pub fn gap(&self, idx: usize) -> Chips {
        self.current_bet.saturating_sub(self.seats[idx].stage_bet)
    }

    /// Move up to `amount` from the player's stack into the pot. Stack,
    /// stage bet, hand total and pot change together.
    pub fn place_bet(&mut self, idx: usize, amount: Chips) -> Chips {
        let seat = &mut self.seats[idx];
        let moved = amount.min(seat.stack);
        seat.stack -= moved;
        seat.stage_bet += moved;
        seat.total_bet += moved;
        self.pot += moved;
        moved
    }

    pub fn validate(&self, idx: usize, action: &Action) -> Result<(), IllegalAction> {
        let gap = self.gap(idx);
        match *action {
            Action::Check if gap > 0 => Err(IllegalAction::CheckOwesCall { owed: gap }),
            Action::Call if gap == 0 => Err(IllegalAction::NothingToCall),
            Action::Raise(amount) if amount < self.big_blind => {
                Err(IllegalAction::RaiseBelowMinimum {
                    amount,
                    minimum: self.big_blind,
                })
            }
            Action::Raise(amount) => {
                let required = gap.saturating_add(amount);
                let stack = self.seats[idx].stack;
                if required > stack {
                    Err(IllegalAction::RaiseExceedsStack { required, stack })
                } else {
                    Ok(())
                }
            }
            Action::Check | Action::Call | Action::Fold | Action::AllIn => Ok(()),
        }
    }

    /// Validate and apply `action` for the player at `idx` as one step.
    pub fn apply(&mut self, idx: usize, action: Action) -> Result<Applied, IllegalAction> {
        self.validate(idx, &action)?;
        let gap = self.gap(idx);
        let applied = match action {
            Action::Check => Applied {
                chips_moved: 0,
                raised: false,
            },
            Action::Call => Applied {
                chips_moved: self.place_bet(idx, gap),
                raised: false,
            },
            Action::Raise(amount) => {
                let chips_moved = self.place_bet(idx, gap + amount);
                self.current_bet = self.seats[idx].stage_bet;
                Applied {
                    chips_moved,
                    raised: true,
                }
            }
            Action::Fold => {
                self.seats[idx].status = PlayerStatus::Folded;
                self.recompute_current_bet();
                Applied {
                    chips_moved: 0,
                    raised: false,
                }
            }
            Action::AllIn => {
                let stack = self.seats[idx].stack;
                let chips_moved = self.place_bet(idx, stack);
                let stage_bet = self.seats[idx].stage_bet;
                let raised = stage_bet > self.current_bet;
                if raised {
                    self.current_bet = stage_bet;
                }
                Applied {
                    chips_moved,
                    raised,
                }
            }
        };
        Ok(applied)
    }

    /// Current bet becomes the largest stage bet among active players.
    pub fn recompute_current_bet(&mut self) {
        self.current_bet = self
            .seats
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.stage_bet)
            .max()
            .unwrap_or(0);
    }

    pub fn reset_stage_bets(&mut self) {
        for seat in self.seats.iter_mut().filter(|s| s.is_active()) {
            seat.stage_bet = 0;
        }
        self.current_bet = 0;
    }

    /// Stacks plus pot. Widened so large tables cannot overflow.
    pub fn chips_in_play(&self) -> u64 {
        self.seats.iter().map(|s| u64::from(s.stack)).sum::<u64>() + u64::from(self.pot)
    }

    /// Checks the hand's accounting against the chips it started with.
    pub fn check_invariants(&self, expected: u64) -> Result<(), String> {
        let in_play = self.chips_in_play();
        if in_play != expected {
            return Err(format!(
                "chips in play {in_play} differ from {expected} at hand start"
            ));
        }
        let contributed: u64 = self.seats.iter().map(|s| u64::from(s.total_bet)).sum();
        if contributed != u64::from(self.pot) {
            return Err(format!(
                "pot {} differs from contributions {contributed}",
                self.pot
            ));
        }
        let max_active = self
            .seats
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.stage_bet)
            .max()
            .unwrap_or(0);
        if self.active_count() > 0 && max_active != self.current_bet {
            return Err(format!(
                "current bet {} differs from largest active stage bet {max_active}",
                self.current_bet
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_handed() -> HandState {
        HandState::new(
            vec![
                HandSeat::new(1, 0, 1000),
                HandSeat::new(2, 1, 1000),
                HandSeat::new(3, 2, 1000),
            ],
            20,
        )
    }

    #[test]
    fn test_place_bet_moves_chips_together() {
        let mut hand = three_handed();
        assert_eq!(hand.place_bet(1, 10), 10);
        let seat = &hand.seats[1];
        assert_eq!(seat.stack, 990);
        assert_eq!(seat.stage_bet, 10);
        assert_eq!(seat.total_bet, 10);
        assert_eq!(hand.pot, 10);
    }

    #[test]
    fn test_place_bet_caps_at_stack() {
        let mut hand = three_handed();
        hand.seats[0].stack = 5;
        assert_eq!(hand.place_bet(0, 20), 5);
        assert_eq!(hand.seats[0].stack, 0);
        assert_eq!(hand.pot, 5);
    }

    #[test]
    fn test_check_when_owing_is_illegal() {
        let mut hand = three_handed();
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        assert_eq!(
            hand.apply(0, Action::Check),
            Err(IllegalAction::CheckOwesCall { owed: 20 })
        );
        assert_eq!(hand.pot, 20);
    }

    #[test]
    fn test_call_with_nothing_owed_is_illegal() {
        let mut hand = three_handed();
        assert_eq!(hand.apply(0, Action::Call), Err(IllegalAction::NothingToCall));
    }

    #[test]
    fn test_raise_below_big_blind_is_illegal() {
        let mut hand = three_handed();
        assert_eq!(
            hand.apply(0, Action::Raise(19)),
            Err(IllegalAction::RaiseBelowMinimum {
                amount: 19,
                minimum: 20
            })
        );
    }

    #[test]
    fn test_raise_exceeding_stack_is_illegal() {
        let mut hand = three_handed();
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        assert_eq!(
            hand.apply(0, Action::Raise(990)),
            Err(IllegalAction::RaiseExceedsStack {
                required: 1010,
                stack: 1000
            })
        );
    }

    #[test]
    fn test_raise_sets_current_bet_to_new_stage_bet() {
        let mut hand = three_handed();
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        let applied = hand.apply(0, Action::Raise(40)).unwrap();
        assert_eq!(applied.chips_moved, 60);
        assert!(applied.raised);
        assert_eq!(hand.current_bet, 60);
        assert_eq!(hand.seats[0].stage_bet, 60);
    }

    #[test]
    fn test_short_call_leaves_player_active_all_in() {
        let mut hand = three_handed();
        hand.seats[0].stack = 15;
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        let applied = hand.apply(0, Action::Call).unwrap();
        assert_eq!(applied.chips_moved, 15);
        assert_eq!(hand.seats[0].stack, 0);
        assert!(hand.seats[0].is_active());
        assert!(!hand.seats[0].can_act());
        assert_eq!(hand.current_bet, 20);
    }

    #[test]
    fn test_all_in_above_bet_raises() {
        let mut hand = three_handed();
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        hand.seats[0].stack = 50;
        let applied = hand.apply(0, Action::AllIn).unwrap();
        assert!(applied.raised);
        assert_eq!(hand.current_bet, 50);
    }

    #[test]
    fn test_all_in_below_bet_does_not_raise() {
        let mut hand = three_handed();
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        hand.seats[0].stack = 10;
        let applied = hand.apply(0, Action::AllIn).unwrap();
        assert!(!applied.raised);
        assert_eq!(hand.current_bet, 20);
    }

    #[test]
    fn test_fold_recomputes_current_bet() {
        let mut hand = three_handed();
        hand.place_bet(1, 10);
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        hand.apply(2, Action::Fold).unwrap();
        assert_eq!(hand.seats[2].status, PlayerStatus::Folded);
        assert_eq!(hand.current_bet, 10);
        assert_eq!(hand.active_count(), 2);
    }

    #[test]
    fn test_reset_stage_bets() {
        let mut hand = three_handed();
        hand.place_bet(0, 20);
        hand.current_bet = 20;
        hand.reset_stage_bets();
        assert_eq!(hand.current_bet, 0);
        assert!(hand.seats.iter().all(|s| s.stage_bet == 0));
        assert_eq!(hand.seats[0].total_bet, 20);
    }

    #[test]
    fn test_invariants_hold_and_detect_drift() {
        let mut hand = three_handed();
        hand.place_bet(1, 10);
        hand.place_bet(2, 20);
        hand.current_bet = 20;
        assert!(hand.check_invariants(3000).is_ok());

        hand.pot += 1;
        assert!(hand.check_invariants(3000).is_err());
    }
}
