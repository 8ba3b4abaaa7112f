//! Per-hand eligibility, blind positions and button movement.

use crate::game::{
    constants::MIN_PLAYERS_PER_HAND,
    entities::{Player, PlayerStatus, SeatIndex},
};

/// Positions for one hand, as indices into the eligible list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlindPositions {
    pub dealer: usize,
    pub small_blind: usize,
    pub big_blind: usize,
}

/// Reset every player's status for a new hand and return the seats dealt
/// in, in seat order. Players with chips who are connected and not sitting
/// out become active; everyone else sits this hand out.
pub fn assign_statuses(players: &mut [Player]) -> Vec<SeatIndex> {
    players
        .iter_mut()
        .filter_map(|player| {
            if player.is_eligible() {
                player.status = PlayerStatus::Active;
                Some(player.seat)
            } else {
                player.status = PlayerStatus::SittingOut;
                None
            }
        })
        .collect()
}

/// Number of players who would be dealt into a hand right now.
pub fn count_eligible(players: &[Player]) -> usize {
    players.iter().filter(|p| p.is_eligible()).count()
}

/// Dealer and blind positions among `eligible`. The dealer is the first
/// eligible seat at or after the button. Heads-up, the dealer posts the small
/// blind; otherwise the two seats after the dealer post.
pub fn blind_positions(eligible: &[SeatIndex], button: SeatIndex) -> Option<BlindPositions> {
    let n = eligible.len();
    if n < MIN_PLAYERS_PER_HAND {
        return None;
    }
    let dealer = eligible.iter().position(|&seat| seat >= button).unwrap_or(0);
    let (small_blind, big_blind) = if n == 2 {
        (dealer, (dealer + 1) % n)
    } else {
        ((dealer + 1) % n, (dealer + 2) % n)
    };
    Some(BlindPositions {
        dealer,
        small_blind,
        big_blind,
    })
}

/// Next seat after `button` whose player can hold it, searching at most one
/// lap. Stays put if nobody qualifies.
pub fn advance_button(players: &[Player], button: SeatIndex) -> SeatIndex {
    let n = players.len();
    (1..=n)
        .map(|offset| (button + offset) % n)
        .find(|&seat| players[seat].can_hold_button())
        .unwrap_or(button)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::PlayerSeed;

    fn players(stacks: &[u32]) -> Vec<Player> {
        stacks
            .iter()
            .enumerate()
            .map(|(seat, &stack)| Player::new(PlayerSeed::new(seat as i64 + 1, "p", stack), seat))
            .collect()
    }

    #[test]
    fn test_assign_statuses() {
        let mut table = players(&[100, 0, 100, 100]);
        table[2].connected = false;
        table[3].sitting_out = true;
        let eligible = assign_statuses(&mut table);
        assert_eq!(eligible, vec![0]);
        assert_eq!(table[0].status, PlayerStatus::Active);
        assert!(table[1..].iter().all(|p| p.status == PlayerStatus::SittingOut));
    }

    #[test]
    fn test_three_handed_positions() {
        let positions = blind_positions(&[0, 1, 2], 0).unwrap();
        assert_eq!(
            positions,
            BlindPositions {
                dealer: 0,
                small_blind: 1,
                big_blind: 2
            }
        );
        let wrapped = blind_positions(&[0, 1, 2], 2).unwrap();
        assert_eq!((wrapped.small_blind, wrapped.big_blind), (0, 1));
    }

    #[test]
    fn test_heads_up_dealer_posts_small_blind() {
        for button in [0, 3] {
            let positions = blind_positions(&[0, 3], button).unwrap();
            assert_eq!(positions.dealer, positions.small_blind);
            assert_ne!(positions.small_blind, positions.big_blind);
        }
    }

    #[test]
    fn test_dealer_skips_to_next_eligible_seat() {
        // Button on seat 2, which is not dealt in; seat 4 deals.
        let positions = blind_positions(&[0, 1, 4, 5], 2).unwrap();
        assert_eq!(positions.dealer, 2);
        // Past the last eligible seat wraps to the first.
        let positions = blind_positions(&[0, 1, 4], 5).unwrap();
        assert_eq!(positions.dealer, 0);
    }

    #[test]
    fn test_too_few_players_have_no_positions() {
        assert!(blind_positions(&[3], 3).is_none());
        assert!(blind_positions(&[], 0).is_none());
    }

    #[test]
    fn test_advance_button_skips_busted_and_sitting_out() {
        let mut table = players(&[100, 0, 100, 100]);
        table[2].sitting_out = true;
        assert_eq!(advance_button(&table, 0), 3);
        assert_eq!(advance_button(&table, 3), 0);
    }

    #[test]
    fn test_advance_button_stays_when_nobody_qualifies() {
        let table = players(&[0, 0, 0]);
        assert_eq!(advance_button(&table, 1), 1);
    }

    #[test]
    fn test_disconnected_player_can_hold_button() {
        let mut table = players(&[100, 100, 100]);
        table[1].connected = false;
        assert_eq!(advance_button(&table, 0), 1);
    }
}
