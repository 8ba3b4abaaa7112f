//! Poker game engine: one hand at a time.
//!
//! This module provides:
//! - Cards, decks and players
//! - Hand evaluation behind the [`functional::HandEvaluator`] trait
//! - Per-hand chip accounting, betting rounds and pot settlement
//! - The [`state_machine::RoundEngine`] that plays a hand to completion
//! - Structured events and the sinks that receive them

pub mod betting;
pub mod constants;
pub mod entities;
pub mod events;
pub mod functional;
pub mod hand;
pub mod pot;
pub mod state_machine;
pub mod states;
