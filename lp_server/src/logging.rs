//! Structured logging configuration.
//!
//! The engine logs through the `log` facade; those records are bridged into
//! the same subscriber, so one `RUST_LOG` filter governs both.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Configurable log levels via the `RUST_LOG` env var. Table events are
/// logged under the `live_poker::events` target, so
/// `RUST_LOG=info,live_poker::events=off` silences them.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,live_poker::events=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}
