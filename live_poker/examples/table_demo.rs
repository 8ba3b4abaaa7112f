//! Table Demo
//!
//! Runs one three-handed table for a few hands with scripted players and
//! prints every event as JSON.
//!
//! Run with `cargo run -p live_poker --example table_demo`.

use live_poker::{
    SessionRegistry, TableConfig,
    entities::{Action, PlayerSeed},
    events::{ChannelSink, GameEvent},
};
use std::sync::Arc;

const TABLE: i64 = 1;
const HANDS: u64 = 3;

#[tokio::main]
async fn main() {
    let (sink, mut events) = ChannelSink::new();
    let registry = Arc::new(SessionRegistry::new(Arc::new(sink)).with_defaults(TableConfig {
        action_timeout_ms: Some(500),
        hand_pause_ms: 200,
        ..TableConfig::default()
    }));

    let players = vec![
        PlayerSeed::new(1, "alice", 1000),
        PlayerSeed::new(2, "bob", 1000),
        PlayerSeed::new(3, "carol", 1000),
    ];
    registry.create(TABLE, players, 20).await.unwrap();
    registry.start(TABLE).await.unwrap();

    // Alice calls anything, Bob only checks, Carol never answers and is
    // folded by the timeout.
    for (player_id, pays) in [(1, true), (2, false)] {
        let registry = registry.clone();
        tokio::spawn(async move {
            while let Ok(hand) = registry.wait_for_turn(TABLE, player_id).await {
                let stage_bet = hand
                    .seats
                    .iter()
                    .find(|s| s.player_id == player_id)
                    .map_or(0, |s| s.stage_bet);
                let action = match (hand.current_bet > stage_bet, pays) {
                    (false, _) => Action::Check,
                    (true, true) => Action::Call,
                    (true, false) => Action::Fold,
                };
                let _ = registry.submit_action(TABLE, player_id, action).await;
            }
        });
    }

    while let Some(event) = events.recv().await {
        println!("{}", serde_json::to_string(&event).unwrap());
        if let GameEvent::HandStarted { hand_number, .. } = event.event
            && hand_number > HANDS
        {
            break;
        }
    }

    registry.remove(TABLE).await.unwrap();
    let state = registry.get(TABLE).await;
    println!("table removed: {}", state.is_none());
}
