//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use live_poker::{
    constants::{DEFAULT_SWEEP_INTERVAL, MAX_PLAYERS},
    entities::Chips,
    table::{TableConfig, TableSpeed},
};
use std::{net::SocketAddr, time::Duration};

use crate::bots::BotDifficulty;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Number of tables to create on startup
    pub num_tables: usize,
    /// Table defaults configuration
    pub table_defaults: TableDefaultsConfig,
    /// Bot behaviour
    pub bots: BotConfig,
    /// How often stopped tables are dropped from the registry
    pub sweep_interval: Duration,
    /// Prometheus exporter address; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Default table configuration
#[derive(Debug, Clone)]
pub struct TableDefaultsConfig {
    /// Bots seated at each table
    pub players_per_table: usize,
    /// Chips each bot starts with
    pub starting_stack: Chips,
    /// Big blind amount; the small blind is half
    pub big_blind: Chips,
    pub speed: TableSpeed,
    /// Overrides the speed-derived action timeout
    pub action_timeout_ms: Option<u64>,
    /// Pause between hands
    pub hand_pause_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub difficulty: BotDifficulty,
    /// Chance (0-100) that a bot sits on a turn until it times out
    pub idle_percent: u8,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `num_tables_override` - Optional number of tables override (from CLI args)
    /// * `players_override` - Optional players per table override (from CLI args)
    /// * `metrics_override` - Optional metrics address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed, or the result
    /// fails validation
    pub fn from_env(
        num_tables_override: Option<usize>,
        players_override: Option<usize>,
        metrics_override: Option<SocketAddr>,
    ) -> Result<Self, ConfigError> {
        let num_tables = num_tables_override.unwrap_or_else(|| parse_env_or("TABLES", 1));

        let speed = match std::env::var("TABLE_SPEED") {
            Ok(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "TABLE_SPEED".to_string(),
                reason,
            })?,
            Err(_) => TableSpeed::Normal,
        };

        let difficulty = match std::env::var("BOT_DIFFICULTY") {
            Ok(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "BOT_DIFFICULTY".to_string(),
                reason,
            })?,
            Err(_) => BotDifficulty::Standard,
        };

        let metrics_bind = match metrics_override {
            Some(addr) => Some(addr),
            None => match std::env::var("METRICS_BIND") {
                Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{raw}' is not a socket address"),
                })?),
                Err(_) => None,
            },
        };

        let table_defaults = TableDefaultsConfig {
            players_per_table: players_override
                .unwrap_or_else(|| parse_env_or("PLAYERS_PER_TABLE", 6)),
            starting_stack: parse_env_or("STARTING_STACK", 1000),
            big_blind: parse_env_or("BIG_BLIND", 20),
            speed,
            action_timeout_ms: std::env::var("ACTION_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            hand_pause_ms: parse_env_or("HAND_PAUSE_MS", 2000),
        };

        let config = ServerConfig {
            num_tables,
            table_defaults,
            bots: BotConfig {
                difficulty,
                idle_percent: parse_env_or("BOT_IDLE_PERCENT", 5),
            },
            sweep_interval: Duration::from_secs(parse_env_or(
                "SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL.as_secs(),
            )),
            metrics_bind,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "TABLES".to_string(),
                reason: "At least one table is required".to_string(),
            });
        }

        let players = self.table_defaults.players_per_table;
        if !(2..=MAX_PLAYERS).contains(&players) {
            return Err(ConfigError::Invalid {
                var: "PLAYERS_PER_TABLE".to_string(),
                reason: format!("Must be between 2 and {MAX_PLAYERS}, got {players}"),
            });
        }

        if self.table_defaults.starting_stack < self.table_defaults.big_blind {
            return Err(ConfigError::Invalid {
                var: "STARTING_STACK".to_string(),
                reason: "Starting stack must cover the big blind".to_string(),
            });
        }

        if self.bots.idle_percent > 100 {
            return Err(ConfigError::Invalid {
                var: "BOT_IDLE_PERCENT".to_string(),
                reason: format!("Must be at most 100, got {}", self.bots.idle_percent),
            });
        }

        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SWEEP_INTERVAL_SECS".to_string(),
                reason: "Sweep interval must be positive".to_string(),
            });
        }

        // Blinds and timeouts are owned by the table layer.
        self.table_config(None)
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "BIG_BLIND".to_string(),
                reason: e.to_string(),
            })
    }

    /// Table settings for one table. `rng_seed` is for reproducible runs.
    pub fn table_config(&self, rng_seed: Option<u64>) -> TableConfig {
        let defaults = &self.table_defaults;
        TableConfig {
            speed: defaults.speed,
            action_timeout_ms: defaults.action_timeout_ms,
            hand_pause_ms: defaults.hand_pause_ms,
            rng_seed,
            ..TableConfig::with_big_blind(defaults.big_blind)
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse environment variable or return default value
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
