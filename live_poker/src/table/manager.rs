//! Session registry for spawning and managing table actors.

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, task::JoinHandle};

use super::{
    actor::{TableActor, TableHandle},
    config::TableConfig,
    errors::{TableError, TableResult},
    messages::TableSnapshot,
};
use crate::game::{
    entities::{Action, Chips, PlayerId, PlayerSeed, TableId},
    events::EventSink,
    functional::{HandEvaluator, StandardEvaluator},
    state_machine::{ActionApplied, HandSnapshot},
};

/// Process-wide map from table id to its running actor. At most one live
/// table per id.
pub struct SessionRegistry {
    /// Active table handles
    tables: Arc<RwLock<HashMap<TableId, TableHandle>>>,

    /// Receives every table's events
    sink: Arc<dyn EventSink>,

    evaluator: Arc<dyn HandEvaluator>,

    /// Settings for tables created with only a big blind
    defaults: TableConfig,
}

impl SessionRegistry {
    /// Create a new registry
    ///
    /// # Arguments
    ///
    /// * `sink` - Event sink shared by every table
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            sink,
            evaluator: Arc::new(StandardEvaluator),
            defaults: TableConfig::default(),
        }
    }

    /// Replace the showdown evaluator used by tables created from now on.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn HandEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Settings applied by [`SessionRegistry::create`]; its big blind
    /// argument overrides the blinds.
    pub fn with_defaults(mut self, defaults: TableConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Create a table with the registry defaults and the given big blind.
    ///
    /// The table is spawned but not started.
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    /// * `players` - Seat list, fixed for the session
    /// * `big_blind` - Big blind; the small blind is half of it
    ///
    /// # Returns
    ///
    /// * `TableResult<TableHandle>` - Handle for the new table, or
    ///   `AlreadyExists` if the id is taken
    pub async fn create(
        &self,
        table_id: TableId,
        players: Vec<PlayerSeed>,
        big_blind: Chips,
    ) -> TableResult<TableHandle> {
        let blinds = TableConfig::with_big_blind(big_blind);
        let config = TableConfig {
            big_blind: blinds.big_blind,
            small_blind: blinds.small_blind,
            ..self.defaults.clone()
        };
        self.create_with_config(table_id, players, config).await
    }

    /// Create a table with explicit settings.
    pub async fn create_with_config(
        &self,
        table_id: TableId,
        players: Vec<PlayerSeed>,
        config: TableConfig,
    ) -> TableResult<TableHandle> {
        // Held across the check and the insert so two creators can't race.
        let mut tables = self.tables.write().await;
        if tables.contains_key(&table_id) {
            return Err(TableError::AlreadyExists(table_id));
        }

        let (actor, handle) = TableActor::new(
            table_id,
            players,
            config,
            self.sink.clone(),
            self.evaluator.clone(),
        )?;

        tokio::spawn(async move {
            actor.run().await;
        });

        tables.insert(table_id, handle.clone());
        drop(tables);

        log::info!("Created and spawned table {}", table_id);
        Ok(handle)
    }

    /// Get table handle by ID
    pub async fn get(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    async fn table(&self, table_id: TableId) -> TableResult<TableHandle> {
        self.get(table_id)
            .await
            .ok_or(TableError::TableNotFound(table_id))
    }

    /// Stop a table if it is running, then unregister it.
    ///
    /// # Returns
    ///
    /// * `TableResult<()>` - `TableNotFound` if nothing is registered
    pub async fn remove(&self, table_id: TableId) -> TableResult<()> {
        let handle = self.table(table_id).await?;
        handle.end();
        handle.stopped().await;

        // The id may have been reused while we waited; only drop our table.
        let mut tables = self.tables.write().await;
        if tables
            .get(&table_id)
            .is_some_and(|current| current.same_table(&handle))
        {
            tables.remove(&table_id);
        }
        drop(tables);

        log::info!("Removed table {}", table_id);
        Ok(())
    }

    /// True iff the table is registered and running.
    pub async fn has_active(&self, table_id: TableId) -> bool {
        let tables = self.tables.read().await;
        tables.get(&table_id).is_some_and(TableHandle::is_running)
    }

    /// Drop every table that has stopped.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of tables removed
    pub async fn sweep(&self) -> usize {
        let mut tables = self.tables.write().await;
        let before = tables.len();
        tables.retain(|_, handle| !handle.is_terminated());
        let swept = before - tables.len();
        drop(tables);

        if swept > 0 {
            log::info!("Swept {} stopped tables", swept);
        }
        swept
    }

    /// Run [`SessionRegistry::sweep`] every `interval` until the task is
    /// aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.sweep().await;
            }
        })
    }

    /// Ids of registered tables, in ascending order
    pub async fn active_table_ids(&self) -> Vec<TableId> {
        let tables = self.tables.read().await;
        let mut ids: Vec<TableId> = tables.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get registered table count
    pub async fn table_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }

    pub async fn start(&self, table_id: TableId) -> TableResult<()> {
        self.table(table_id).await?.start().await
    }

    /// Request a stop without waiting for it.
    pub async fn end(&self, table_id: TableId) -> TableResult<()> {
        self.table(table_id).await?.end();
        Ok(())
    }

    pub async fn get_state(&self, table_id: TableId) -> TableResult<TableSnapshot> {
        self.table(table_id).await?.get_state().await
    }

    pub async fn submit_action(
        &self,
        table_id: TableId,
        player_id: PlayerId,
        action: Action,
    ) -> TableResult<ActionApplied> {
        self.table(table_id)
            .await?
            .submit_action(player_id, action)
            .await
    }

    pub async fn mark_disconnected(&self, table_id: TableId, player_id: PlayerId) -> TableResult<()> {
        self.table(table_id).await?.mark_disconnected(player_id).await
    }

    pub async fn mark_reconnected(&self, table_id: TableId, player_id: PlayerId) -> TableResult<()> {
        self.table(table_id).await?.mark_reconnected(player_id).await
    }

    pub async fn sit_out(&self, table_id: TableId, player_id: PlayerId) -> TableResult<()> {
        self.table(table_id).await?.sit_out(player_id).await
    }

    pub async fn sit_in(&self, table_id: TableId, player_id: PlayerId) -> TableResult<()> {
        self.table(table_id).await?.sit_in(player_id).await
    }

    pub async fn wait_for_turn(
        &self,
        table_id: TableId,
        player_id: PlayerId,
    ) -> TableResult<HandSnapshot> {
        self.table(table_id).await?.wait_for_turn(player_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::NullSink;

    fn players() -> Vec<PlayerSeed> {
        vec![
            PlayerSeed::new(1, "alice", 1000),
            PlayerSeed::new(2, "bob", 1000),
        ]
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(NullSink))
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let registry = registry();
        registry.create(7, players(), 20).await.unwrap();
        assert_eq!(
            registry.create(7, players(), 20).await.err(),
            Some(TableError::AlreadyExists(7))
        );
        assert_eq!(registry.table_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_applies_big_blind() {
        let registry = registry();
        registry.create(1, players(), 50).await.unwrap();
        let state = registry.get_state(1).await.unwrap();
        assert_eq!((state.small_blind, state.big_blind), (25, 50));
        assert!(!state.running);
        assert!(!registry.has_active(1).await);
    }

    #[tokio::test]
    async fn test_invalid_config_is_not_registered() {
        let registry = registry();
        let result = registry.create(1, Vec::new(), 20).await;
        assert!(matches!(result, Err(TableError::InvalidConfig(_))));
        assert!(registry.get(1).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let registry = registry();
        assert_eq!(registry.start(3).await, Err(TableError::TableNotFound(3)));
        assert_eq!(registry.end(3).await, Err(TableError::TableNotFound(3)));
        assert_eq!(
            registry.submit_action(3, 1, Action::Fold).await.err(),
            Some(TableError::TableNotFound(3))
        );
        assert_eq!(registry.remove(3).await, Err(TableError::TableNotFound(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_stops_and_unregisters() {
        let registry = registry();
        let handle = registry.create(1, players(), 20).await.unwrap();
        registry.start(1).await.unwrap();
        assert!(registry.has_active(1).await);

        registry.remove(1).await.unwrap();
        assert!(handle.is_terminated());
        assert!(registry.get(1).await.is_none());
        // The id is free again.
        registry.create(1, players(), 20).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_only_stopped_tables() {
        let registry = registry();
        registry.create(1, players(), 20).await.unwrap();
        let ended = registry.create(2, players(), 20).await.unwrap();
        registry.end(2).await.unwrap();
        ended.stopped().await;

        assert_eq!(registry.sweep().await, 1);
        assert_eq!(registry.active_table_ids().await, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_periodically() {
        let registry = Arc::new(registry());
        let ended = registry.create(1, players(), 20).await.unwrap();
        let sweeper = registry.spawn_sweeper(Duration::from_secs(300));

        ended.end();
        ended.stopped().await;
        assert_eq!(registry.table_count().await, 1);

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(registry.table_count().await, 0);
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_concurrent_creates_register_once() {
        let registry = Arc::new(registry());
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                registry.create(9, players(), 20).await.is_ok()
            }));
        }
        let mut created = 0;
        for task in tasks {
            if task.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(registry.table_count().await, 1);
    }
}
