//! Table error types.

use thiserror::Error;

use crate::game::{
    entities::{PlayerId, TableId},
    hand::IllegalAction,
    state_machine::ActionRejected,
};

/// Table errors. All are returned to the caller that caused them; only
/// `InvariantViolation` also ends the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A table with this id is already registered
    #[error("Table {0} already exists")]
    AlreadyExists(TableId),

    /// No table registered under this id
    #[error("Table {0} not found")]
    TableNotFound(TableId),

    /// Player is not seated at the table
    #[error("Player {0} not found at this table")]
    PlayerNotFound(PlayerId),

    /// No hand is being played
    #[error("No hand in progress")]
    NoLiveHand,

    /// Action submitted by a player who is not being waited on
    #[error("Not your turn")]
    WrongTurn,

    /// Betting-rule violation
    #[error("Illegal action: {0}")]
    IllegalAction(#[from] IllegalAction),

    /// Fewer than two players can be dealt in
    #[error("Need at least 2 eligible players, have {eligible}")]
    InsufficientPlayers { eligible: usize },

    /// Table configuration or seat list rejected at creation
    #[error("Invalid table configuration: {0}")]
    InvalidConfig(String),

    /// `start` on a table that has already been started
    #[error("Table already started")]
    AlreadyStarted,

    /// Table has stopped and accepts no more commands
    #[error("Table is closed")]
    Closed,

    /// Accounting defect detected by the engine; the session was ended
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl TableError {
    /// True for the not-found family: unknown table, unknown player, or no
    /// live hand to deliver an action to.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TableError::TableNotFound(_) | TableError::PlayerNotFound(_) | TableError::NoLiveHand
        )
    }

    /// Get a client-safe error message that doesn't leak internal state
    pub fn client_message(&self) -> String {
        match self {
            // Accounting detail is for operators, not players
            TableError::InvariantViolation(_) => "Internal table error".to_string(),
            TableError::TableNotFound(_) => "Table not found".to_string(),
            TableError::PlayerNotFound(_) => "Player not found".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<ActionRejected> for TableError {
    fn from(value: ActionRejected) -> Self {
        match value {
            ActionRejected::WrongTurn => TableError::WrongTurn,
            ActionRejected::Illegal(illegal) => TableError::IllegalAction(illegal),
            ActionRejected::RoundClosed => TableError::NoLiveHand,
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
