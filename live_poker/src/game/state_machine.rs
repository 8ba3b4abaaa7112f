//! The round engine: one full hand, from the deal to settlement.
//!
//! A [`RoundEngine`] is built for each hand, run as its own task under the
//! table's supervisor, and dropped when the hand is over. While a betting
//! stage waits for a decision the engine suspends on three things at once:
//! the table's cancellation token, the per-action deadline, and a
//! single-slot channel of [`Submission`]s. Whichever is ready first wins.
//!
//! Callers reach a live engine through its [`RoundLink`].

use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{
    betting::BettingRound,
    constants::HOLE_CARDS,
    entities::{Action, Blinds, Card, Chips, Deck, PlayerId, PlayerStatus, SeatIndex},
    events::{BlindKind, EventEmitter, GameEvent, Refund, ShowdownHand},
    functional::HandEvaluator,
    hand::{Applied, HandSeat, HandState, IllegalAction},
    pot::{Settlement, settle},
    states::{HandPhase, Stage},
};

/// Why a submission was not applied. A rejected submission has no effect.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ActionRejected {
    #[error("not your turn")]
    WrongTurn,
    #[error(transparent)]
    Illegal(#[from] IllegalAction),
    /// The hand finished or was cancelled before the submission was read.
    #[error("no hand in progress")]
    RoundClosed,
}

/// Confirmation of an applied action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionApplied {
    pub player_id: PlayerId,
    pub action: Action,
    pub chips_moved: Chips,
    pub stack: Chips,
    pub pot: Chips,
    pub current_bet: Chips,
}

/// An action on its way into the engine, with the slot for its reply.
#[derive(Debug)]
pub struct Submission {
    pub player_id: PlayerId,
    pub action: Action,
    pub reply: oneshot::Sender<Result<ActionApplied, ActionRejected>>,
}

/// Public view of one seat during a hand. Hole cards are never included.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub stack: Chips,
    pub status: PlayerStatus,
    pub stage_bet: Chips,
    pub total_bet: Chips,
}

/// Public view of a hand, republished after every transition.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandSnapshot {
    pub hand_id: Uuid,
    pub hand_number: u64,
    pub phase: HandPhase,
    pub stage: Stage,
    pub pot: Chips,
    pub current_bet: Chips,
    pub acting_player: Option<PlayerId>,
    pub acting_seat: Option<SeatIndex>,
    pub community: Vec<Card>,
    pub dealer_seat: SeatIndex,
    pub small_blind_seat: SeatIndex,
    pub big_blind_seat: SeatIndex,
    pub seats: Vec<SeatView>,
}

/// Everything a hand needs from the table that deals it. Positions are
/// indices into `players`, which is in seat order.
#[derive(Debug)]
pub struct HandSetup {
    pub hand_id: Uuid,
    pub hand_number: u64,
    pub players: Vec<HandSeat>,
    pub dealer: usize,
    pub small_blind: usize,
    pub big_blind: usize,
    pub blinds: Blinds,
    pub deck: Deck,
    pub action_timeout: Duration,
}

/// Collaborators shared with the table.
#[derive(Clone)]
pub struct RoundContext {
    pub events: Arc<EventEmitter>,
    pub evaluator: Arc<dyn HandEvaluator>,
    pub cancel: CancellationToken,
}

/// How a hand finished. Each variant carries the seats with their final
/// stacks so the table can take ownership of the chips back.
#[derive(Debug)]
pub enum RoundOutcome {
    Settled {
        seats: Vec<HandSeat>,
        settlement: Settlement,
    },
    /// Cancelled mid-hand. Every contribution was returned to its owner.
    Aborted {
        seats: Vec<HandSeat>,
        refunds: Vec<Refund>,
    },
    /// An accounting invariant failed. The seats are as they were when the
    /// defect was detected.
    Faulted {
        seats: Vec<HandSeat>,
        detail: String,
    },
}

impl RoundOutcome {
    pub fn seats(&self) -> &[HandSeat] {
        match self {
            Self::Settled { seats, .. } | Self::Aborted { seats, .. } | Self::Faulted { seats, .. } => {
                seats
            }
        }
    }
}

/// Handle to a live hand.
#[derive(Clone, Debug)]
pub struct RoundLink {
    submissions: mpsc::Sender<Submission>,
    snapshot: watch::Receiver<HandSnapshot>,
}

impl RoundLink {
    /// Hand an action to the engine and wait until it is applied or rejected.
    pub async fn submit(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<ActionApplied, ActionRejected> {
        let (reply, response) = oneshot::channel();
        self.submissions
            .send(Submission {
                player_id,
                action,
                reply,
            })
            .await
            .map_err(|_| ActionRejected::RoundClosed)?;
        response.await.map_err(|_| ActionRejected::RoundClosed)?
    }

    pub fn snapshot(&self) -> HandSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every republished snapshot.
    pub fn watch(&self) -> watch::Receiver<HandSnapshot> {
        self.snapshot.clone()
    }

    pub fn acting_player(&self) -> Option<PlayerId> {
        self.snapshot.borrow().acting_player
    }

    pub fn is_closed(&self) -> bool {
        self.submissions.is_closed()
    }
}

enum Turn {
    Acted {
        action: Action,
        applied: Applied,
        reply: oneshot::Sender<Result<ActionApplied, ActionRejected>>,
    },
    TimedOut,
    Cancelled,
}

enum StageEnd {
    Completed,
    Cancelled,
    Faulted(String),
}

pub struct RoundEngine {
    hand_id: Uuid,
    hand_number: u64,
    hand: HandState,
    deck: Deck,
    phase: HandPhase,
    turn: Option<usize>,
    dealer: usize,
    small_blind: usize,
    big_blind: usize,
    blinds: Blinds,
    action_timeout: Duration,
    /// Stacks plus pot when the hand began.
    total: u64,
    inbox: mpsc::Receiver<Submission>,
    snapshot: watch::Sender<HandSnapshot>,
    ctx: RoundContext,
}

impl RoundEngine {
    /// Create an engine for one hand
    ///
    /// # Arguments
    ///
    /// * `setup` - Players, positions, blinds and deck for the hand
    /// * `ctx` - Event emitter, evaluator and cancellation token
    ///
    /// # Returns
    ///
    /// * `(RoundEngine, RoundLink)` - Engine to run and link for submitting actions
    pub fn new(setup: HandSetup, ctx: RoundContext) -> (Self, RoundLink) {
        let (submissions, inbox) = mpsc::channel(1);
        let hand = HandState::new(setup.players, setup.blinds.big);
        let total = hand.chips_in_play();

        let (snapshot, receiver) = watch::channel(HandSnapshot::placeholder());
        let engine = Self {
            hand_id: setup.hand_id,
            hand_number: setup.hand_number,
            hand,
            deck: setup.deck,
            phase: HandPhase::Dealing,
            turn: None,
            dealer: setup.dealer,
            small_blind: setup.small_blind,
            big_blind: setup.big_blind,
            blinds: setup.blinds,
            action_timeout: setup.action_timeout,
            total,
            inbox,
            snapshot,
            ctx,
        };
        engine.publish();

        (
            engine,
            RoundLink {
                submissions,
                snapshot: receiver,
            },
        )
    }

    /// Run the hand to completion, cancellation or fault.
    pub async fn run(mut self) -> RoundOutcome {
        log::debug!(
            "Table {} hand #{} starting with {} players",
            self.ctx.events.table_id(),
            self.hand_number,
            self.hand.seats.len()
        );

        loop {
            if self.ctx.cancel.is_cancelled() {
                return self.abort();
            }

            match self.phase {
                HandPhase::Dealing => {
                    if let Err(detail) = self.deal() {
                        return self.fault(detail);
                    }
                }
                HandPhase::Blinds => self.post_blinds(),
                HandPhase::Reveal(stage) => {
                    if let Err(detail) = self.reveal(stage) {
                        return self.fault(detail);
                    }
                }
                HandPhase::Betting(stage) => {
                    if stage == Stage::PreFlop {
                        self.emit(GameEvent::StageStarted {
                            stage,
                            community: Vec::new(),
                        });
                    }
                    match self.betting(stage).await {
                        StageEnd::Completed => {}
                        StageEnd::Cancelled => return self.abort(),
                        StageEnd::Faulted(detail) => return self.fault(detail),
                    }
                }
                HandPhase::Settlement => return self.settle(),
                HandPhase::Done => break,
            }

            if let Err(detail) = self.hand.check_invariants(self.total) {
                return self.fault(detail);
            }
            self.phase = self.phase.next(self.hand.active_count());
            self.publish();
        }

        // Only reachable if a hand is run after it already settled.
        self.fault("hand resumed after completion".to_string())
    }

    fn deal(&mut self) -> Result<(), String> {
        self.deck_check()?;
        for idx in 0..self.hand.seats.len() {
            if self.hand.seats[idx].stack == 0 {
                continue;
            }
            let first = self.draw()?;
            let second = self.draw()?;
            let seat = &mut self.hand.seats[idx];
            seat.hole = Some([first, second]);
            let player_id = seat.player_id;
            self.emit(GameEvent::HoleCardsDealt {
                player_id,
                cards: [first, second],
            });
        }
        Ok(())
    }

    fn deck_check(&self) -> Result<(), String> {
        let needed = self.hand.seats.len() * HOLE_CARDS + 5;
        if self.deck.remaining() < needed {
            return Err(format!(
                "deck holds {} cards but the hand needs {needed}",
                self.deck.remaining()
            ));
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<Card, String> {
        self.deck
            .deal_card()
            .ok_or_else(|| "deck exhausted".to_string())
    }

    fn post_blinds(&mut self) {
        for (idx, blind, amount) in [
            (self.small_blind, BlindKind::Small, self.blinds.small),
            (self.big_blind, BlindKind::Big, self.blinds.big),
        ] {
            let posted = self.hand.place_bet(idx, amount);
            self.emit(GameEvent::BlindPosted {
                player_id: self.hand.seats[idx].player_id,
                blind,
                amount: posted,
                pot: self.hand.pot,
            });
        }
        // A short big blind leaves the small blind's post as the bet to match.
        self.hand.recompute_current_bet();
    }

    fn reveal(&mut self, stage: Stage) -> Result<(), String> {
        for _ in 0..stage.reveal_count() {
            let card = self.draw()?;
            self.hand.community.push(card);
        }
        self.hand.reset_stage_bets();
        self.emit(GameEvent::StageStarted {
            stage,
            community: self.hand.community.clone(),
        });
        Ok(())
    }

    fn first_to_act(&self, stage: Stage) -> usize {
        match stage {
            Stage::PreFlop => self.big_blind + 1,
            _ => self.small_blind,
        }
    }

    async fn betting(&mut self, stage: Stage) -> StageEnd {
        let mut round = BettingRound::new(&self.hand, self.first_to_act(stage));

        while let Some(idx) = round.next_to_act(&self.hand) {
            let player_id = self.hand.seats[idx].player_id;
            self.turn = Some(idx);
            self.publish();
            self.emit(GameEvent::TurnStarted {
                player_id,
                seat: self.hand.seats[idx].seat,
                to_call: self.hand.gap(idx),
                timeout_ms: u64::try_from(self.action_timeout.as_millis()).unwrap_or(u64::MAX),
            });

            let (action, applied, reply, timed_out) = match self.await_action(idx).await {
                Turn::Acted {
                    action,
                    applied,
                    reply,
                } => (action, applied, Some(reply), false),
                Turn::TimedOut => {
                    log::warn!(
                        "Table {}: player {} timed out on the {}, folding",
                        self.ctx.events.table_id(),
                        player_id,
                        stage
                    );
                    match self.hand.apply(idx, Action::Fold) {
                        Ok(applied) => (Action::Fold, applied, None, true),
                        Err(e) => return StageEnd::Faulted(format!("fold rejected: {e}")),
                    }
                }
                Turn::Cancelled => {
                    self.turn = None;
                    return StageEnd::Cancelled;
                }
            };

            round.record(idx, applied.raised);
            self.turn = None;

            let seat = &self.hand.seats[idx];
            let confirmation = ActionApplied {
                player_id,
                action,
                chips_moved: applied.chips_moved,
                stack: seat.stack,
                pot: self.hand.pot,
                current_bet: self.hand.current_bet,
            };
            self.emit(GameEvent::ActionApplied {
                player_id,
                action,
                chips_moved: confirmation.chips_moved,
                stack: confirmation.stack,
                pot: confirmation.pot,
                current_bet: confirmation.current_bet,
                timed_out,
            });

            if let Err(detail) = self.hand.check_invariants(self.total) {
                return StageEnd::Faulted(detail);
            }
            self.publish();
            if let Some(reply) = reply {
                // The submitter may have given up waiting; the action stands.
                let _ = reply.send(Ok(confirmation));
            }
        }

        self.turn = None;
        StageEnd::Completed
    }

    /// Wait for the acting player's decision, the deadline or cancellation.
    /// Wrong-turn and illegal submissions are answered and the wait goes on
    /// against the same deadline.
    async fn await_action(&mut self, idx: usize) -> Turn {
        let expected = self.hand.seats[idx].player_id;
        let deadline = sleep_until(Instant::now() + self.action_timeout);
        tokio::pin!(deadline);
        let mut inbox_open = true;

        loop {
            tokio::select! {
                biased;

                () = self.ctx.cancel.cancelled() => return Turn::Cancelled,

                submission = self.inbox.recv(), if inbox_open => {
                    let Some(Submission { player_id, action, reply }) = submission else {
                        inbox_open = false;
                        continue;
                    };
                    if player_id != expected {
                        let _ = reply.send(Err(ActionRejected::WrongTurn));
                        continue;
                    }
                    match self.hand.apply(idx, action) {
                        Ok(applied) => return Turn::Acted { action, applied, reply },
                        Err(illegal) => {
                            log::debug!(
                                "Table {}: player {} tried to {}: {}",
                                self.ctx.events.table_id(),
                                player_id,
                                action,
                                illegal
                            );
                            let _ = reply.send(Err(illegal.into()));
                        }
                    }
                }

                () = &mut deadline => return Turn::TimedOut,
            }
        }
    }

    fn settle(mut self) -> RoundOutcome {
        self.phase = HandPhase::Settlement;
        let settlement = settle(&mut self.hand, self.ctx.evaluator.as_ref());

        if settlement.remainder > 0 {
            log::warn!(
                "Table {} hand #{}: {} chips left over from a {}-way split are discarded",
                self.ctx.events.table_id(),
                self.hand_number,
                settlement.remainder,
                settlement.winners.len()
            );
        }

        let after = self.hand.chips_in_play() + u64::from(settlement.remainder);
        let total = self.total;
        if after != total {
            return self.fault(format!(
                "settlement left {after} chips accounted for out of {total}"
            ));
        }

        let winners = settlement
            .winners
            .iter()
            .map(|&idx| self.hand.seats[idx].player_id)
            .collect();
        let showdown = settlement
            .ranks
            .iter()
            .filter_map(|(idx, value)| {
                let seat = &self.hand.seats[*idx];
                seat.hole.map(|hole| ShowdownHand {
                    player_id: seat.player_id,
                    hole,
                    value: value.clone(),
                })
            })
            .collect();
        self.emit(GameEvent::HandEnded {
            winners,
            pot: settlement.pot,
            share: settlement.share,
            remainder: settlement.remainder,
            showdown,
        });

        self.phase = HandPhase::Done;
        self.publish();
        RoundOutcome::Settled {
            seats: self.hand.seats,
            settlement,
        }
    }

    /// Return every contribution to its owner. No fold is synthesized and
    /// nothing is settled.
    fn abort(mut self) -> RoundOutcome {
        let mut refunds = Vec::new();
        for seat in &mut self.hand.seats {
            if seat.total_bet > 0 {
                refunds.push(Refund {
                    player_id: seat.player_id,
                    amount: seat.total_bet,
                });
                seat.stack += seat.total_bet;
            }
            seat.total_bet = 0;
            seat.stage_bet = 0;
        }
        self.hand.pot = 0;
        self.hand.current_bet = 0;
        self.turn = None;

        log::info!(
            "Table {} hand #{} aborted, refunded {} players",
            self.ctx.events.table_id(),
            self.hand_number,
            refunds.len()
        );
        self.emit(GameEvent::HandAborted {
            refunds: refunds.clone(),
        });
        self.phase = HandPhase::Done;
        self.publish();
        RoundOutcome::Aborted {
            seats: self.hand.seats,
            refunds,
        }
    }

    fn fault(self, detail: String) -> RoundOutcome {
        log::error!(
            "Table {} hand #{}: invariant violated: {}",
            self.ctx.events.table_id(),
            self.hand_number,
            detail
        );
        RoundOutcome::Faulted {
            seats: self.hand.seats,
            detail,
        }
    }

    fn emit(&self, event: GameEvent) {
        self.ctx.events.emit(Some(self.hand_id), event);
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.view());
    }

    fn view(&self) -> HandSnapshot {
        let seat_of = |idx: usize| self.hand.seats.get(idx).map(|s| s.seat).unwrap_or_default();
        HandSnapshot {
            hand_id: self.hand_id,
            hand_number: self.hand_number,
            phase: self.phase,
            stage: self.phase.stage(),
            pot: self.hand.pot,
            current_bet: self.hand.current_bet,
            acting_player: self.turn.map(|idx| self.hand.seats[idx].player_id),
            acting_seat: self.turn.map(|idx| self.hand.seats[idx].seat),
            community: self.hand.community.clone(),
            dealer_seat: seat_of(self.dealer),
            small_blind_seat: seat_of(self.small_blind),
            big_blind_seat: seat_of(self.big_blind),
            seats: self
                .hand
                .seats
                .iter()
                .map(|s| SeatView {
                    player_id: s.player_id,
                    seat: s.seat,
                    stack: s.stack,
                    status: s.status,
                    stage_bet: s.stage_bet,
                    total_bet: s.total_bet,
                })
                .collect(),
        }
    }
}

impl HandSnapshot {
    fn placeholder() -> Self {
        Self {
            hand_id: Uuid::nil(),
            hand_number: 0,
            phase: HandPhase::Dealing,
            stage: Stage::PreFlop,
            pot: 0,
            current_bet: 0,
            acting_player: None,
            acting_seat: None,
            community: Vec::new(),
            dealer_seat: 0,
            small_blind_seat: 0,
            big_blind_seat: 0,
            seats: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{Rank, Suit},
        events::{ChannelSink, TableEvent},
        functional::{HandValue, StandardEvaluator},
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    fn setup(stacks: &[Chips], dealer: usize, big_blind: Chips, timeout: Duration) -> HandSetup {
        let n = stacks.len();
        let (small_blind_idx, big_blind_idx) = if n == 2 {
            (dealer, (dealer + 1) % n)
        } else {
            ((dealer + 1) % n, (dealer + 2) % n)
        };
        HandSetup {
            hand_id: Uuid::new_v4(),
            hand_number: 1,
            players: stacks
                .iter()
                .enumerate()
                .map(|(i, &stack)| HandSeat::new(i as i64 + 1, i, stack))
                .collect(),
            dealer,
            small_blind: small_blind_idx,
            big_blind: big_blind_idx,
            blinds: Blinds::from_big(big_blind),
            deck: Deck::default(),
            action_timeout: timeout,
        }
    }

    fn context(evaluator: Arc<dyn HandEvaluator>) -> (RoundContext, UnboundedReceiver<TableEvent>) {
        let (sink, events) = ChannelSink::new();
        (
            RoundContext {
                events: Arc::new(EventEmitter::new(1, Arc::new(sink))),
                evaluator,
                cancel: CancellationToken::new(),
            },
            events,
        )
    }

    async fn turn_of(link: &RoundLink) -> PlayerId {
        let mut watch = link.watch();
        loop {
            if let Some(player) = watch.borrow_and_update().acting_player {
                return player;
            }
            watch.changed().await.unwrap();
        }
    }

    /// Every hand ties.
    struct AllEqual;

    impl HandEvaluator for AllEqual {
        fn rank(&self, _cards: &[Card]) -> HandValue {
            HandValue {
                rank: Rank::HighCard,
                values: Vec::new(),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fold_to_big_blind_awards_pot() {
        let (ctx, _events) = context(Arc::new(StandardEvaluator));
        let (engine, link) = RoundEngine::new(setup(&[1000, 1000, 1000], 0, 20, Duration::from_secs(30)), ctx);
        let task = tokio::spawn(engine.run());

        assert_eq!(turn_of(&link).await, 1);
        link.submit(1, Action::Fold).await.unwrap();
        assert_eq!(turn_of(&link).await, 2);
        link.submit(2, Action::Fold).await.unwrap();

        let RoundOutcome::Settled { seats, settlement } = task.await.unwrap() else {
            panic!("hand should settle");
        };
        assert!(!settlement.showdown);
        assert_eq!(settlement.pot, 30);
        assert_eq!(seats.iter().map(|s| s.stack).collect::<Vec<_>>(), vec![1000, 990, 1010]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_folds_and_advances() {
        let (ctx, mut events) = context(Arc::new(StandardEvaluator));
        let (engine, link) = RoundEngine::new(setup(&[500, 500], 0, 20, Duration::from_secs(5)), ctx);
        let task = tokio::spawn(engine.run());

        // Heads-up: the dealer posts the small blind and acts first.
        assert_eq!(turn_of(&link).await, 1);
        let outcome = task.await.unwrap();
        let RoundOutcome::Settled { seats, .. } = outcome else {
            panic!("hand should settle");
        };
        assert_eq!(seats[0].status, PlayerStatus::Folded);
        assert_eq!(seats[1].stack, 510);

        let mut timed_out = false;
        while let Ok(event) = events.try_recv() {
            if let GameEvent::ActionApplied {
                player_id: 1,
                action: Action::Fold,
                timed_out: true,
                ..
            } = event.event
            {
                timed_out = true;
            }
        }
        assert!(timed_out);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_turn_and_illegal_are_rejected_without_effect() {
        let (ctx, _events) = context(Arc::new(StandardEvaluator));
        let (engine, link) = RoundEngine::new(setup(&[1000, 1000, 1000], 0, 20, Duration::from_secs(30)), ctx);
        let _task = tokio::spawn(engine.run());

        assert_eq!(turn_of(&link).await, 1);
        assert_eq!(link.submit(2, Action::Call).await, Err(ActionRejected::WrongTurn));
        assert_eq!(
            link.submit(1, Action::Check).await,
            Err(ActionRejected::Illegal(IllegalAction::CheckOwesCall { owed: 20 }))
        );
        assert_eq!(
            link.submit(1, Action::Raise(5)).await,
            Err(ActionRejected::Illegal(IllegalAction::RaiseBelowMinimum {
                amount: 5,
                minimum: 20
            }))
        );
        let snapshot = link.snapshot();
        assert_eq!(snapshot.pot, 30);
        assert_eq!(snapshot.acting_player, Some(1));

        let applied = link.submit(1, Action::Raise(40)).await.unwrap();
        assert_eq!(applied.chips_moved, 60);
        assert_eq!(applied.current_bet, 60);
        assert_eq!(applied.pot, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_refunds_without_folding() {
        let (ctx, _events) = context(Arc::new(StandardEvaluator));
        let cancel = ctx.cancel.clone();
        let (engine, link) = RoundEngine::new(setup(&[1000, 1000, 1000], 0, 20, Duration::from_secs(30)), ctx);
        let task = tokio::spawn(engine.run());

        assert_eq!(turn_of(&link).await, 1);
        link.submit(1, Action::Call).await.unwrap();
        cancel.cancel();

        let RoundOutcome::Aborted { seats, refunds } = task.await.unwrap() else {
            panic!("hand should abort");
        };
        assert!(seats.iter().all(|s| s.stack == 1000));
        assert!(seats.iter().all(|s| s.status == PlayerStatus::Active));
        assert_eq!(refunds.iter().map(|r| r.amount).sum::<Chips>(), 50);
        assert_eq!(link.submit(2, Action::Call).await, Err(ActionRejected::RoundClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tie_splits_and_discards_remainder() {
        let (ctx, _events) = context(Arc::new(AllEqual));
        let (engine, link) = RoundEngine::new(setup(&[1000, 1000, 1000], 0, 30, Duration::from_secs(30)), ctx);
        let task = tokio::spawn(engine.run());

        // The folded small blind leaves an odd pot for two winners.
        assert_eq!(turn_of(&link).await, 1);
        link.submit(1, Action::Call).await.unwrap();
        assert_eq!(turn_of(&link).await, 2);
        link.submit(2, Action::Fold).await.unwrap();
        assert_eq!(turn_of(&link).await, 3);
        link.submit(3, Action::Check).await.unwrap();
        for _ in 0..3 {
            assert_eq!(turn_of(&link).await, 3);
            link.submit(3, Action::Check).await.unwrap();
            assert_eq!(turn_of(&link).await, 1);
            link.submit(1, Action::Check).await.unwrap();
        }

        let RoundOutcome::Settled { seats, settlement } = task.await.unwrap() else {
            panic!("hand should settle");
        };
        assert_eq!(settlement.pot, 75);
        assert_eq!(settlement.winners, vec![0, 2]);
        assert_eq!(settlement.share, 37);
        assert_eq!(settlement.remainder, 1);
        let stacks: Vec<Chips> = seats.iter().map(|s| s.stack).collect();
        assert_eq!(stacks, vec![1007, 985, 1007]);
        assert_eq!(stacks.iter().sum::<Chips>() + settlement.remainder, 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stacked_deck_showdown() {
        let hole_a = [Card(14, Suit::Spade), Card(14, Suit::Heart)];
        let hole_b = [Card(2, Suit::Club), Card(7, Suit::Diamond)];
        let board = [
            Card(9, Suit::Club),
            Card(10, Suit::Diamond),
            Card(4, Suit::Heart),
            Card(12, Suit::Spade),
            Card(3, Suit::Diamond),
        ];
        let mut top = Vec::new();
        top.extend_from_slice(&hole_a);
        top.extend_from_slice(&hole_b);
        top.extend_from_slice(&board);

        let mut hand = setup(&[200, 200], 0, 20, Duration::from_secs(30));
        hand.deck = Deck::stacked(&top);
        let (ctx, _events) = context(Arc::new(StandardEvaluator));
        let (engine, link) = RoundEngine::new(hand, ctx);
        let task = tokio::spawn(engine.run());

        assert_eq!(turn_of(&link).await, 1);
        link.submit(1, Action::AllIn).await.unwrap();
        assert_eq!(turn_of(&link).await, 2);
        link.submit(2, Action::Call).await.unwrap();

        let RoundOutcome::Settled { seats, settlement } = task.await.unwrap() else {
            panic!("hand should settle");
        };
        assert!(settlement.showdown);
        assert_eq!(settlement.winners, vec![0]);
        assert_eq!(seats[0].stack, 400);
        assert_eq!(seats[1].stack, 0);
    }
}
