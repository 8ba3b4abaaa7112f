//! Headless multi-table poker host.
//!
//! Spawns table actors through a [`SessionRegistry`], seats bot players at
//! each one and keeps them dealing until interrupted.

mod bots;
mod config;
mod logging;
mod metrics;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Error;
use live_poker::{
    SessionRegistry,
    entities::{PlayerSeed, TableId},
    events::{EventSink, FanoutSink, LogSink},
};
use log::info;
use pico_args::Arguments;

use crate::{
    bots::{BotSettings, HoleCardBook, spawn_bot},
    config::ServerConfig,
    metrics::MetricsSink,
};

const HELP: &str = "\
Run live poker tables with bot players

USAGE:
  lp_server [OPTIONS]

OPTIONS:
  --tables     N           Number of tables to create  [default: env TABLES or 1]
  --players    N           Bots seated per table       [default: env PLAYERS_PER_TABLE or 6]
  --metrics    IP:PORT     Prometheus exporter address [default: env METRICS_BIND, off when unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  STARTING_STACK           Chips each bot starts with (default 1000)
  BIG_BLIND                Big blind; the small blind is half (default 20)
  TABLE_SPEED              normal, turbo or hyper
  ACTION_TIMEOUT_MS        Overrides the speed-derived action timeout
  HAND_PAUSE_MS            Pause between hands (default 2000)
  SWEEP_INTERVAL_SECS      How often stopped tables are dropped (default 300)
  BOT_DIFFICULTY           easy, standard or tag
  BOT_IDLE_PERCENT         Chance a bot lets its turn time out (default 5)
  RUST_LOG                 Log filter
";

/// How often the active table gauge is refreshed
const STATUS_INTERVAL: Duration = Duration::from_secs(10);

struct Args {
    num_tables: Option<usize>,
    players: Option<usize>,
    metrics: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        num_tables: pargs.opt_value_from_str("--tables")?,
        players: pargs.opt_value_from_str("--players")?,
        metrics: pargs.opt_value_from_str("--metrics")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.num_tables, args.players, args.metrics)?;
    info!(
        "Starting {} table(s) with {} {} bots each",
        config.num_tables, config.table_defaults.players_per_table, config.bots.difficulty
    );

    let mut sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(LogSink)];
    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Metrics exporter listening on {}", addr);
        sinks.push(Arc::new(MetricsSink));
    }
    let book = Arc::new(HoleCardBook::default());
    sinks.push(book.clone());

    let registry = Arc::new(SessionRegistry::new(Arc::new(FanoutSink::new(sinks))));
    let sweeper = registry.spawn_sweeper(config.sweep_interval);

    let mut bots = Vec::new();
    for table_id in 1..=config.num_tables as TableId {
        let table_config = config.table_config(None);
        let settings = BotSettings {
            difficulty: config.bots.difficulty,
            idle_percent: config.bots.idle_percent,
            big_blind: table_config.big_blind,
            action_timeout: table_config.action_timeout(),
        };
        let players: Vec<PlayerSeed> = (1..=config.table_defaults.players_per_table as i64)
            .map(|id| {
                PlayerSeed::new(
                    id,
                    &format!("bot-{table_id}-{id}"),
                    config.table_defaults.starting_stack,
                )
            })
            .collect();
        let seats: Vec<_> = players.iter().map(|p| p.id).collect();

        registry
            .create_with_config(table_id, players, table_config)
            .await?;
        for player_id in seats {
            bots.push(spawn_bot(
                registry.clone(),
                book.clone(),
                table_id,
                player_id,
                settings.clone(),
            ));
        }
        registry.start(table_id).await?;
        info!("Table {} started", table_id);
    }

    let status = {
        let registry = registry.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STATUS_INTERVAL);
            loop {
                ticker.tick().await;
                let mut running = 0;
                for table_id in registry.active_table_ids().await {
                    if registry.has_active(table_id).await {
                        running += 1;
                    }
                }
                metrics::active_tables(running);
                log::debug!("{} table(s) running", running);
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    status.abort();
    sweeper.abort();
    for table_id in registry.active_table_ids().await {
        // A table swept in the meantime is already gone.
        let _ = registry.remove(table_id).await;
    }
    // A bot may be mid-think or idling through a timeout.
    for bot in bots {
        bot.abort();
    }

    info!("All tables stopped");
    Ok(())
}
