use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use live_poker::{
    entities::{Action, Blinds, Card, Deck, Suit},
    events::{EventEmitter, NullSink},
    functional::{StandardEvaluator, argmax, eval},
    game::{
        betting::BettingRound,
        hand::{HandSeat, HandState},
        state_machine::{HandSetup, RoundContext, RoundEngine, RoundOutcome},
    },
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Benchmark hand evaluation with 7 cards (hole cards + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Spade),
        Card(11, Suit::Spade),
        Card(10, Suit::Spade),
        Card(2, Suit::Heart),
        Card(3, Suit::Diamond),
    ];

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark ranking and comparing a full table's hands
fn bench_showdown(c: &mut Criterion) {
    let mut group = c.benchmark_group("showdown");
    for players in [2usize, 6, 9] {
        let mut deck = Deck::default();
        deck.shuffle();
        let board: Vec<Card> = (0..5).filter_map(|_| deck.deal_card()).collect();
        let hands: Vec<Vec<Card>> = (0..players)
            .map(|_| {
                let mut cards: Vec<Card> = (0..2).filter_map(|_| deck.deal_card()).collect();
                cards.extend_from_slice(&board);
                cards
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(players), &hands, |b, hands| {
            b.iter(|| {
                let values: Vec<_> = hands.iter().map(|h| eval(h)).collect();
                argmax(&values)
            });
        });
    }
    group.finish();
}

/// Benchmark one preflop betting round where everyone calls
fn bench_betting_round(c: &mut Criterion) {
    c.bench_function("betting_round_9_calls", |b| {
        b.iter(|| {
            let seats = (0..9).map(|i| HandSeat::new(i, i as usize, 1000)).collect();
            let mut hand = HandState::new(seats, 20);
            hand.place_bet(1, 10);
            hand.place_bet(2, 20);
            hand.recompute_current_bet();
            let mut round = BettingRound::new(&hand, 3);
            while let Some(idx) = round.next_to_act(&hand) {
                let action = if hand.gap(idx) > 0 {
                    Action::Call
                } else {
                    Action::Check
                };
                if let Ok(applied) = hand.apply(idx, action) {
                    round.record(idx, applied.raised);
                }
            }
            hand.pot
        });
    });
}

/// Benchmark a whole hand through the engine, every player folding to the
/// big blind
fn bench_engine_hand(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    c.bench_function("engine_fold_around_6", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let setup = HandSetup {
                    hand_id: Uuid::new_v4(),
                    hand_number: 1,
                    players: (0..6).map(|i| HandSeat::new(i, i as usize, 1000)).collect(),
                    dealer: 0,
                    small_blind: 1,
                    big_blind: 2,
                    blinds: Blinds::from_big(20),
                    deck: Deck::default(),
                    action_timeout: Duration::from_secs(30),
                };
                let ctx = RoundContext {
                    events: Arc::new(EventEmitter::new(1, Arc::new(NullSink))),
                    evaluator: Arc::new(StandardEvaluator),
                    cancel: CancellationToken::new(),
                };
                let (engine, link) = RoundEngine::new(setup, ctx);
                let task = tokio::spawn(engine.run());
                let mut watch = link.watch();
                loop {
                    let acting = watch.borrow_and_update().acting_player;
                    if let Some(player) = acting {
                        let _ = link.submit(player, Action::Fold).await;
                    } else if watch.changed().await.is_err() {
                        break;
                    }
                }
                matches!(task.await, Ok(RoundOutcome::Settled { .. }))
            })
        });
    });
}

criterion_group!(hand_evaluation, bench_hand_eval_7_cards, bench_showdown);
criterion_group!(engine, bench_betting_round, bench_engine_hand);
criterion_main!(hand_evaluation, engine);
