//! Prometheus metrics for hosted tables.
//!
//! Metrics are derived from the table event stream by [`MetricsSink`] and
//! exposed in Prometheus text format for scraping.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::active_tables(4);
//! ```

use live_poker::{
    entities::Action,
    events::{EventSink, GameEvent, TableEvent},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Update active tables count.
pub fn active_tables(count: usize) {
    metrics::gauge!("active_tables").set(count as f64);
}

/// Increment hands played counter.
pub fn hands_played_total(outcome: &'static str) {
    metrics::counter!("hands_played_total", "outcome" => outcome).increment(1);
}

/// Record settled pot size.
pub fn pot_size_chips(size: u32) {
    metrics::histogram!("pot_size_chips").record(f64::from(size));
}

/// Record one applied action.
pub fn actions_total(action: &Action, timed_out: bool) {
    let kind = match action {
        Action::Check => "check",
        Action::Call => "call",
        Action::Raise(_) => "raise",
        Action::Fold => "fold",
        Action::AllIn => "all_in",
    };
    metrics::counter!("actions_total",
        "action" => kind,
        "timed_out" => if timed_out { "true" } else { "false" }
    )
    .increment(1);
}

/// Record chips dropped by an uneven split.
pub fn discarded_chips_total(chips: u32) {
    metrics::counter!("discarded_chips_total").increment(u64::from(chips));
}

/// Record a session end by reason.
pub fn sessions_ended_total(reason: &str) {
    metrics::counter!("sessions_ended_total", "reason" => reason.to_string()).increment(1);
}

/// Record player connectivity changes.
pub fn player_connection_changes_total(connected: bool) {
    metrics::counter!("player_connection_changes_total",
        "connected" => if connected { "true" } else { "false" }
    )
    .increment(1);
}

/// Turns table events into metrics. Safe to register when no exporter is
/// installed; the calls are then no-ops.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetricsSink;

impl EventSink for MetricsSink {
    fn notify(&self, event: &TableEvent) {
        match &event.event {
            GameEvent::ActionApplied {
                action, timed_out, ..
            } => actions_total(action, *timed_out),
            GameEvent::HandEnded { pot, remainder, .. } => {
                hands_played_total("settled");
                pot_size_chips(*pot);
                if *remainder > 0 {
                    discarded_chips_total(*remainder);
                }
            }
            GameEvent::HandAborted { .. } => hands_played_total("aborted"),
            GameEvent::PlayerDisconnected { .. } => player_connection_changes_total(false),
            GameEvent::PlayerReconnected { .. } => player_connection_changes_total(true),
            GameEvent::SessionEnded { reason, .. } => {
                let reason = serde_json::to_value(reason)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string());
                sessions_ended_total(&reason);
            }
            _ => {}
        }
    }
}
