//! Table actor: the per-table supervisor that runs one hand after another.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::HashSet, sync::Arc};
use tokio::{
    sync::{Mutex, mpsc, oneshot, watch},
    task::{JoinError, JoinHandle},
    time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{
    config::TableConfig,
    errors::{TableError, TableResult},
    messages::{Lifecycle, LiveHand, PlayerSnapshot, TableMessage, TableSnapshot},
    seating,
};
use crate::game::{
    entities::{Action, Chips, Deck, Player, PlayerId, PlayerSeed, SeatIndex, TableId},
    events::{EndReason, EventEmitter, EventSink, GameEvent},
    functional::HandEvaluator,
    hand::HandSeat,
    state_machine::{
        ActionApplied, HandSetup, HandSnapshot, RoundContext, RoundEngine, RoundLink, RoundOutcome,
    },
};

/// Table actor handle for sending messages
#[derive(Clone)]
pub struct TableHandle {
    table_id: TableId,
    sender: mpsc::Sender<TableMessage>,
    roster: Arc<[PlayerId]>,
    rounds: watch::Receiver<Option<RoundLink>>,
    lifecycle: watch::Receiver<Lifecycle>,
    /// Serializes action submissions for this table
    action_lock: Arc<Mutex<()>>,
    cancel: CancellationToken,
}

impl TableHandle {
    /// Get table ID
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle() == Lifecycle::Running
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle() == Lifecycle::Stopped
    }

    /// Players seated at creation, in seat order.
    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    /// True if both handles drive the same table instance.
    pub fn same_table(&self, other: &TableHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Send a message to the table
    async fn send(&self, message: TableMessage) -> TableResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| TableError::Closed)
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> TableMessage,
    ) -> TableResult<T> {
        let (response, receiver) = oneshot::channel();
        self.send(message(response)).await?;
        receiver.await.map_err(|_| TableError::Closed)
    }

    /// Start the hand loop. Fails with `InsufficientPlayers` when fewer than
    /// two players can be dealt in.
    pub async fn start(&self) -> TableResult<()> {
        self.request(|response| TableMessage::Start { response })
            .await?
    }

    /// Request a stop. A hand in progress is cancelled and its bets refunded;
    /// the table reaches `Stopped` once the loop observes the request.
    pub fn end(&self) {
        self.cancel.cancel();
    }

    /// Wait until the table has stopped.
    pub async fn stopped(&self) {
        let mut lifecycle = self.lifecycle.clone();
        // An error means the actor is gone, which also counts as stopped.
        let _ = lifecycle.wait_for(|l| *l == Lifecycle::Stopped).await;
    }

    pub async fn get_state(&self) -> TableResult<TableSnapshot> {
        self.request(|response| TableMessage::GetState { response })
            .await
    }

    /// Submit an action for the live hand and wait for it to be applied.
    ///
    /// Submissions for one table are applied strictly one at a time.
    ///
    /// # Errors
    ///
    /// * `PlayerNotFound` - the player is not seated here
    /// * `NoLiveHand` - no hand is being played
    /// * `WrongTurn` - the hand is not waiting on this player
    /// * `IllegalAction` - the action breaks a betting rule
    pub async fn submit_action(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> TableResult<ActionApplied> {
        if !self.roster.contains(&player_id) {
            return Err(TableError::PlayerNotFound(player_id));
        }

        let _guard = self.action_lock.lock().await;
        let link = self
            .rounds
            .borrow()
            .clone()
            .ok_or(TableError::NoLiveHand)?;
        if link.is_closed() {
            return Err(TableError::NoLiveHand);
        }
        if link.acting_player() != Some(player_id) {
            return Err(TableError::WrongTurn);
        }
        Ok(link.submit(player_id, action).await?)
    }

    pub async fn mark_disconnected(&self, player_id: PlayerId) -> TableResult<()> {
        self.request(|response| TableMessage::MarkDisconnected {
            player_id,
            response,
        })
        .await?
    }

    pub async fn mark_reconnected(&self, player_id: PlayerId) -> TableResult<()> {
        self.request(|response| TableMessage::MarkReconnected {
            player_id,
            response,
        })
        .await?
    }

    pub async fn sit_out(&self, player_id: PlayerId) -> TableResult<()> {
        self.request(|response| TableMessage::SitOut {
            player_id,
            response,
        })
        .await?
    }

    pub async fn sit_in(&self, player_id: PlayerId) -> TableResult<()> {
        self.request(|response| TableMessage::SitIn {
            player_id,
            response,
        })
        .await?
    }

    /// Resolve once `player_id` is the player being waited on, returning the
    /// hand as it stood at that moment. Fails with `Closed` once the table
    /// stops.
    pub async fn wait_for_turn(&self, player_id: PlayerId) -> TableResult<HandSnapshot> {
        if !self.roster.contains(&player_id) {
            return Err(TableError::PlayerNotFound(player_id));
        }
        let mut rounds = self.rounds.clone();
        let mut lifecycle = self.lifecycle.clone();

        'outer: loop {
            if *lifecycle.borrow_and_update() == Lifecycle::Stopped {
                return Err(TableError::Closed);
            }

            let link = rounds.borrow_and_update().clone();
            if let Some(link) = link {
                let mut hand = link.watch();
                loop {
                    let snapshot = hand.borrow_and_update().clone();
                    if snapshot.acting_player == Some(player_id) {
                        return Ok(snapshot);
                    }
                    tokio::select! {
                        changed = hand.changed() => if changed.is_err() { break },
                        changed = rounds.changed() => {
                            changed.map_err(|_| TableError::Closed)?;
                            continue 'outer;
                        }
                        changed = lifecycle.changed() => {
                            changed.map_err(|_| TableError::Closed)?;
                            continue 'outer;
                        }
                    }
                }
            }

            // Between hands: wait for the next one to be dealt.
            tokio::select! {
                changed = rounds.changed() => changed.map_err(|_| TableError::Closed)?,
                changed = lifecycle.changed() => changed.map_err(|_| TableError::Closed)?,
            }
        }
    }
}

/// Table actor managing a single poker table
pub struct TableActor {
    /// Table ID
    id: TableId,

    /// Table configuration
    config: TableConfig,

    /// Seated players, indexed by seat
    players: Vec<Player>,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    lifecycle: watch::Sender<Lifecycle>,

    /// Link to the hand in progress, if any
    rounds: watch::Sender<Option<RoundLink>>,

    /// Stop request; each hand runs under a child token
    cancel: CancellationToken,

    events: Arc<EventEmitter>,

    evaluator: Arc<dyn HandEvaluator>,

    /// Dealer choice and shuffles
    rng: StdRng,

    /// Seat holding the dealer button
    button: SeatIndex,

    /// Current hand count
    hand_count: u64,

    /// Task running the hand in progress
    round: Option<JoinHandle<RoundOutcome>>,

    /// When the next hand is dealt
    next_hand_at: Option<Instant>,

    /// Chips at the table when the session was created
    total_chips: u64,

    /// Chips lost to uneven splits
    discarded_chips: u64,

    fault: Option<String>,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Arguments
    ///
    /// * `id` - Table ID
    /// * `seeds` - Players in seat order, with their starting stacks
    /// * `config` - Table configuration
    /// * `sink` - Receiver of every table event
    /// * `evaluator` - Hand ranking used at showdown
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TableId,
        seeds: Vec<PlayerSeed>,
        config: TableConfig,
        sink: Arc<dyn EventSink>,
        evaluator: Arc<dyn HandEvaluator>,
    ) -> TableResult<(Self, TableHandle)> {
        config.validate()?;
        config.validate_seats(seeds.len())?;
        let mut ids = HashSet::new();
        if let Some(dup) = seeds.iter().find(|seed| !ids.insert(seed.id)) {
            return Err(TableError::InvalidConfig(format!(
                "Player {} is seated twice",
                dup.id
            )));
        }
        // Every pot, bet and stack is bounded by the chips in play.
        let total_chips: u64 = seeds.iter().map(|seed| u64::from(seed.stack)).sum();
        if total_chips > u64::from(Chips::MAX) {
            return Err(TableError::InvalidConfig(format!(
                "Table holds {total_chips} chips, more than the limit of {}",
                Chips::MAX
            )));
        }

        let (sender, inbox) = mpsc::channel(100);
        let (lifecycle, lifecycle_rx) = watch::channel(Lifecycle::NotStarted);
        let (rounds, rounds_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let button = config
            .initial_dealer
            .unwrap_or_else(|| rng.random_range(0..seeds.len()));

        let players: Vec<Player> = seeds
            .into_iter()
            .enumerate()
            .map(|(seat, seed)| Player::new(seed, seat))
            .collect();
        let roster: Arc<[PlayerId]> = players.iter().map(|p| p.id).collect();

        let actor = Self {
            id,
            config,
            players,
            inbox,
            lifecycle,
            rounds,
            cancel: cancel.clone(),
            events: Arc::new(EventEmitter::new(id, sink)),
            evaluator,
            rng,
            button,
            hand_count: 0,
            round: None,
            next_hand_at: None,
            total_chips,
            discarded_chips: 0,
            fault: None,
        };

        let handle = TableHandle {
            table_id: id,
            sender,
            roster,
            rounds: rounds_rx,
            lifecycle: lifecycle_rx,
            action_lock: Arc::new(Mutex::new(())),
            cancel,
        };

        Ok((actor, handle))
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Table {} open with {} seats, blinds {}",
            self.id,
            self.players.len(),
            self.config.blinds()
        );

        loop {
            let lifecycle = *self.lifecycle.borrow();
            let accepts_stop = matches!(lifecycle, Lifecycle::NotStarted | Lifecycle::Running);
            let deal_ready = lifecycle == Lifecycle::Running && self.round.is_none();
            let next_hand_at = self.next_hand_at;

            tokio::select! {
                biased;

                () = self.cancel.cancelled(), if accepts_stop => self.request_stop(),

                outcome = join_round(&mut self.round), if self.round.is_some() => {
                    self.round = None;
                    self.finish_hand(outcome);
                }

                () = sleep_until_opt(next_hand_at), if deal_ready && next_hand_at.is_some() => {
                    self.next_hand_at = None;
                    self.begin_hand();
                }

                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
            }
        }

        // Every handle is gone; nobody can act at this table any more.
        if self.lifecycle() != Lifecycle::Stopped {
            self.cancel.cancel();
            if let Some(round) = self.round.take() {
                let outcome = round.await;
                self.lifecycle.send_replace(Lifecycle::Stopping);
                self.finish_hand(outcome);
            }
            if self.lifecycle() != Lifecycle::Stopped {
                self.stop(EndReason::Requested);
            }
        }

        log::info!("Table {} closed", self.id);
    }

    fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Start { response } => {
                let result = self.handle_start();
                let _ = response.send(result);
            }

            TableMessage::GetState { response } => {
                let _ = response.send(self.snapshot());
            }

            TableMessage::MarkDisconnected {
                player_id,
                response,
            } => {
                let result = self.set_connected(player_id, false);
                let _ = response.send(result);
            }

            TableMessage::MarkReconnected {
                player_id,
                response,
            } => {
                let result = self.set_connected(player_id, true);
                let _ = response.send(result);
            }

            TableMessage::SitOut {
                player_id,
                response,
            } => {
                let result = self.set_sitting_out(player_id, true);
                let _ = response.send(result);
            }

            TableMessage::SitIn {
                player_id,
                response,
            } => {
                let result = self.set_sitting_out(player_id, false);
                let _ = response.send(result);
            }
        }
    }

    fn handle_start(&mut self) -> TableResult<()> {
        match self.lifecycle() {
            Lifecycle::NotStarted => {}
            Lifecycle::Running | Lifecycle::Stopping => return Err(TableError::AlreadyStarted),
            Lifecycle::Stopped => {
                return Err(match &self.fault {
                    Some(detail) => TableError::InvariantViolation(detail.clone()),
                    None => TableError::Closed,
                });
            }
        }

        let eligible = seating::count_eligible(&self.players);
        if eligible < 2 {
            return Err(TableError::InsufficientPlayers { eligible });
        }

        self.lifecycle.send_replace(Lifecycle::Running);
        self.next_hand_at = Some(Instant::now());
        log::info!("Table {} started with {} eligible players", self.id, eligible);
        self.events.emit(
            None,
            GameEvent::SessionStarted {
                players: self.players.iter().map(|p| p.id).collect(),
                total_chips: self.total_chips,
            },
        );
        Ok(())
    }

    fn player_mut(&mut self, player_id: PlayerId) -> TableResult<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(TableError::PlayerNotFound(player_id))
    }

    /// Connectivity only; a disconnected player in a hand is folded by the
    /// action timeout, never here.
    fn set_connected(&mut self, player_id: PlayerId, connected: bool) -> TableResult<()> {
        let player = self.player_mut(player_id)?;
        if player.connected == connected {
            return Ok(());
        }
        player.connected = connected;
        let event = if connected {
            GameEvent::PlayerReconnected { player_id }
        } else {
            GameEvent::PlayerDisconnected { player_id }
        };
        log::info!("Table {}: {}", self.id, event);
        self.emit_live(event);
        Ok(())
    }

    fn set_sitting_out(&mut self, player_id: PlayerId, sitting_out: bool) -> TableResult<()> {
        let player = self.player_mut(player_id)?;
        if player.sitting_out == sitting_out {
            return Ok(());
        }
        player.sitting_out = sitting_out;
        let event = if sitting_out {
            GameEvent::PlayerSatOut { player_id }
        } else {
            GameEvent::PlayerSatIn { player_id }
        };
        self.emit_live(event);
        Ok(())
    }

    /// Emit tagged with the live hand, if there is one.
    fn emit_live(&self, event: GameEvent) {
        let hand_id = self.rounds.borrow().as_ref().map(|link| link.snapshot().hand_id);
        self.events.emit(hand_id, event);
    }

    fn request_stop(&mut self) {
        match self.lifecycle() {
            Lifecycle::NotStarted => self.stop(EndReason::Requested),
            Lifecycle::Running => {
                log::info!("Table {} stopping", self.id);
                self.lifecycle.send_replace(Lifecycle::Stopping);
                self.next_hand_at = None;
                if self.round.is_none() {
                    self.stop(EndReason::Requested);
                }
            }
            Lifecycle::Stopping | Lifecycle::Stopped => {}
        }
    }

    fn stop(&mut self, reason: EndReason) {
        self.rounds.send_replace(None);
        self.next_hand_at = None;
        self.lifecycle.send_replace(Lifecycle::Stopped);
        log::info!(
            "Table {} stopped ({:?}) after {} hands",
            self.id,
            reason,
            self.hand_count
        );
        self.events.emit(
            None,
            GameEvent::SessionEnded {
                reason,
                hands_played: self.hand_count,
            },
        );
    }

    fn fail(&mut self, detail: String) {
        log::error!("Table {}: session faulted: {}", self.id, detail);
        self.events.emit(
            None,
            GameEvent::SessionFaulted {
                detail: detail.clone(),
            },
        );
        self.fault = Some(detail);
        self.stop(EndReason::Faulted);
    }

    /// Recompute eligibility, place the blinds and launch the next hand.
    fn begin_hand(&mut self) {
        let eligible = seating::assign_statuses(&mut self.players);
        let Some(positions) = seating::blind_positions(&eligible, self.button) else {
            log::info!(
                "Table {}: only {} eligible players, ending session",
                self.id,
                eligible.len()
            );
            self.stop(EndReason::InsufficientPlayers);
            return;
        };

        self.button = eligible[positions.dealer];
        self.hand_count += 1;
        let hand_id = Uuid::new_v4();

        let mut deck = Deck::default();
        deck.shuffle_with(&mut self.rng);

        let seats: Vec<HandSeat> = eligible
            .iter()
            .map(|&seat| {
                let player = &self.players[seat];
                HandSeat::new(player.id, seat, player.stack)
            })
            .collect();

        log::info!(
            "Table {} hand #{} dealing {} players, button on seat {}",
            self.id,
            self.hand_count,
            seats.len(),
            self.button
        );
        self.events.emit(
            Some(hand_id),
            GameEvent::HandStarted {
                hand_number: self.hand_count,
                dealer_seat: self.button,
                small_blind_seat: eligible[positions.small_blind],
                big_blind_seat: eligible[positions.big_blind],
                players: seats.iter().map(|s| s.player_id).collect(),
            },
        );

        let setup = HandSetup {
            hand_id,
            hand_number: self.hand_count,
            players: seats,
            dealer: positions.dealer,
            small_blind: positions.small_blind,
            big_blind: positions.big_blind,
            blinds: self.config.blinds(),
            deck,
            action_timeout: self.config.action_timeout(),
        };
        let ctx = RoundContext {
            events: self.events.clone(),
            evaluator: self.evaluator.clone(),
            cancel: self.cancel.child_token(),
        };
        let (engine, link) = RoundEngine::new(setup, ctx);
        self.rounds.send_replace(Some(link));
        self.round = Some(tokio::spawn(engine.run()));
    }

    /// Take the chips back from a finished hand, check the session's
    /// accounting and schedule the next deal.
    fn finish_hand(&mut self, outcome: Result<RoundOutcome, JoinError>) {
        self.rounds.send_replace(None);

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail(format!("hand task failed: {e}"));
                return;
            }
        };

        for seat in outcome.seats() {
            if let Some(player) = self.players.get_mut(seat.seat) {
                player.stack = seat.stack;
                player.status = seat.status;
            }
        }

        match outcome {
            RoundOutcome::Settled { settlement, .. } => {
                self.discarded_chips += u64::from(settlement.remainder);
            }
            RoundOutcome::Aborted { .. } => {}
            RoundOutcome::Faulted { detail, .. } => {
                self.fail(detail);
                return;
            }
        }

        let stacks: u64 = self.players.iter().map(|p| u64::from(p.stack)).sum();
        if stacks + self.discarded_chips != self.total_chips {
            self.fail(format!(
                "stacks {stacks} plus {} discarded differ from {} at session start",
                self.discarded_chips, self.total_chips
            ));
            return;
        }

        if self.lifecycle() != Lifecycle::Running {
            self.stop(EndReason::Requested);
            return;
        }

        self.button = seating::advance_button(&self.players, self.button);
        self.events
            .emit(None, GameEvent::DealerMoved { seat: self.button });
        self.next_hand_at = Some(Instant::now() + self.config.hand_pause());
    }

    fn snapshot(&self) -> TableSnapshot {
        let hand = self.rounds.borrow().as_ref().map(RoundLink::snapshot);

        let players = self
            .players
            .iter()
            .map(|player| {
                let live = hand
                    .as_ref()
                    .and_then(|h| h.seats.iter().find(|s| s.player_id == player.id));
                PlayerSnapshot {
                    player_id: player.id,
                    name: player.name.clone(),
                    seat: player.seat,
                    stack: live.map_or(player.stack, |s| s.stack),
                    status: live.map_or(player.status, |s| s.status),
                    connected: player.connected,
                    sitting_out: player.sitting_out,
                    is_acting: hand
                        .as_ref()
                        .is_some_and(|h| h.acting_player == Some(player.id)),
                    is_dealer: player.seat == self.button,
                    is_small_blind: hand
                        .as_ref()
                        .is_some_and(|h| h.small_blind_seat == player.seat),
                    is_big_blind: hand
                        .as_ref()
                        .is_some_and(|h| h.big_blind_seat == player.seat),
                    stage_bet: live.map_or(0, |s| s.stage_bet),
                }
            })
            .collect();

        TableSnapshot {
            table_id: self.id,
            lifecycle: self.lifecycle(),
            running: self.lifecycle() == Lifecycle::Running,
            dealer_seat: self.button,
            hand_number: self.hand_count,
            big_blind: self.config.big_blind,
            small_blind: self.config.small_blind,
            hand: hand.map(|h| LiveHand {
                hand_id: h.hand_id,
                stage: h.stage,
                pot: h.pot,
                current_bet: h.current_bet,
                acting_seat: h.acting_seat,
                community: h.community,
            }),
            players,
            discarded_chips: self.discarded_chips,
            fault: self.fault.clone(),
        }
    }
}

async fn join_round(
    round: &mut Option<JoinHandle<RoundOutcome>>,
) -> Result<RoundOutcome, JoinError> {
    match round {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::PlayerStatus,
        events::{ChannelSink, NullSink},
        functional::StandardEvaluator,
    };
    use std::time::Duration;

    fn seeds(n: usize, stack: u32) -> Vec<PlayerSeed> {
        (0..n)
            .map(|i| PlayerSeed::new(i as i64 + 1, &format!("p{i}"), stack))
            .collect()
    }

    fn config() -> TableConfig {
        TableConfig {
            initial_dealer: Some(0),
            rng_seed: Some(42),
            action_timeout_ms: Some(1_000),
            hand_pause_ms: 100,
            ..TableConfig::with_big_blind(20)
        }
    }

    fn spawn(seeds: Vec<PlayerSeed>, config: TableConfig) -> TableHandle {
        let (actor, handle) = TableActor::new(
            1,
            seeds,
            config,
            Arc::new(NullSink),
            Arc::new(StandardEvaluator),
        )
        .unwrap();
        tokio::spawn(actor.run());
        handle
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let mut players = seeds(2, 100);
        players[1].id = players[0].id;
        let result = TableActor::new(
            1,
            players,
            config(),
            Arc::new(NullSink),
            Arc::new(StandardEvaluator),
        );
        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
    }

    #[test]
    fn test_chips_beyond_limit_rejected() {
        let players = vec![
            PlayerSeed::new(1, "a", 3_000_000_000),
            PlayerSeed::new(2, "b", 3_000_000_000),
        ];
        let result = TableActor::new(
            1,
            players,
            config(),
            Arc::new(NullSink),
            Arc::new(StandardEvaluator),
        );
        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_in_at_chip_limit_settles() {
        let half = Chips::MAX / 2;
        let handle = spawn(
            vec![PlayerSeed::new(1, "a", half), PlayerSeed::new(2, "b", half)],
            config(),
        );
        handle.start().await.unwrap();

        // Heads-up, the dealer posts the small blind and acts first.
        handle.wait_for_turn(1).await.unwrap();
        handle.submit_action(1, Action::AllIn).await.unwrap();
        handle.wait_for_turn(2).await.unwrap();
        handle.submit_action(2, Action::Call).await.unwrap();

        // Let the board run out and the hand settle.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = handle.get_state().await.unwrap();
        assert!(state.fault.is_none());
        let stacks: u64 = state.players.iter().map(|p| u64::from(p.stack)).sum();
        assert_eq!(stacks + state.discarded_chips, u64::from(half) * 2);
        handle.end();
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_needs_two_eligible_players() {
        let handle = spawn(vec![PlayerSeed::new(1, "a", 100), PlayerSeed::new(2, "b", 0)], config());
        assert_eq!(
            handle.start().await,
            Err(TableError::InsufficientPlayers { eligible: 1 })
        );
        assert_eq!(handle.lifecycle(), Lifecycle::NotStarted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_fails() {
        let handle = spawn(seeds(3, 1000), config());
        handle.start().await.unwrap();
        assert_eq!(handle.start().await, Err(TableError::AlreadyStarted));
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_before_start_stops() {
        let handle = spawn(seeds(3, 1000), config());
        handle.end();
        handle.stopped().await;
        assert!(handle.is_terminated());
        assert_eq!(handle.start().await, Err(TableError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_without_live_hand_is_not_found() {
        let handle = spawn(seeds(3, 1000), config());
        assert_eq!(
            handle.submit_action(1, Action::Call).await,
            Err(TableError::NoLiveHand)
        );
        assert_eq!(
            handle.submit_action(99, Action::Call).await,
            Err(TableError::PlayerNotFound(99))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_does_not_fold() {
        let handle = spawn(seeds(3, 1000), config());
        handle.start().await.unwrap();
        handle.wait_for_turn(1).await.unwrap();

        handle.mark_disconnected(1).await.unwrap();
        let state = handle.get_state().await.unwrap();
        let player = state.player(1).unwrap();
        assert!(!player.connected);
        assert_eq!(player.status, PlayerStatus::Active);
        assert!(player.is_acting);

        // Left alone, the timeout folds them.
        handle.wait_for_turn(2).await.unwrap();
        let state = handle.get_state().await.unwrap();
        assert_eq!(state.player(1).unwrap().status, PlayerStatus::Folded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_player_is_not_dealt_next_hand() {
        let (sink, mut events) = ChannelSink::new();
        let (actor, handle) = TableActor::new(
            1,
            seeds(3, 1000),
            config(),
            Arc::new(sink),
            Arc::new(StandardEvaluator),
        )
        .unwrap();
        tokio::spawn(actor.run());
        handle.start().await.unwrap();
        handle.mark_disconnected(3).await.unwrap();

        // Fold hand one out quickly.
        handle.wait_for_turn(1).await.unwrap();
        handle.submit_action(1, Action::Fold).await.unwrap();
        handle.wait_for_turn(2).await.unwrap();
        handle.submit_action(2, Action::Fold).await.unwrap();

        let mut dealt = Vec::new();
        while let Some(event) = events.recv().await {
            if let GameEvent::HandStarted {
                hand_number: 2,
                players,
                ..
            } = event.event
            {
                dealt = players;
                break;
            }
        }
        assert_eq!(dealt, vec![1, 2]);
        handle.end();
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sit_out_applies_from_next_hand() {
        let handle = spawn(seeds(3, 1000), config());
        handle.start().await.unwrap();
        handle.wait_for_turn(1).await.unwrap();

        handle.sit_out(2).await.unwrap();
        let state = handle.get_state().await.unwrap();
        assert_eq!(state.player(2).unwrap().status, PlayerStatus::Active);
        assert!(state.player(2).unwrap().sitting_out);

        handle.end();
        handle.stopped().await;
        let state = handle.get_state().await.unwrap();
        assert_eq!(state.lifecycle, Lifecycle::Stopped);
        assert_eq!(state.chips_in_play(), 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_ends_when_too_few_players_remain() {
        let (sink, mut events) = ChannelSink::new();
        let (actor, handle) = TableActor::new(
            1,
            seeds(3, 1000),
            config(),
            Arc::new(sink),
            Arc::new(StandardEvaluator),
        )
        .unwrap();
        tokio::spawn(actor.run());
        handle.start().await.unwrap();
        handle.sit_out(2).await.unwrap();
        handle.sit_out(3).await.unwrap();

        // The hand in progress times out; the next deal finds one player.
        tokio::time::timeout(Duration::from_secs(600), handle.stopped())
            .await
            .unwrap();

        let mut reason = None;
        while let Ok(event) = events.try_recv() {
            if let GameEvent::SessionEnded { reason: r, .. } = event.event {
                reason = Some(r);
            }
        }
        assert_eq!(reason, Some(EndReason::InsufficientPlayers));
        let state = handle.get_state().await.unwrap();
        assert_eq!(state.chips_in_play(), 3000);
        assert!(state.fault.is_none());
    }
}
