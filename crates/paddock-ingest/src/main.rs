//! Paddock Ingest - racing data synchronization tool

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use paddock_common::logging::{init_logging, LogConfig, LogLevel};
use paddock_ingest::db::{self, PgStore};
use paddock_ingest::provider::ProviderClient;
use paddock_ingest::sync::RunSummary;
use paddock_ingest::{Config, Synchronizer};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "paddock-ingest")]
#[command(author, version, about = "Racing meeting data synchronization tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Synchronize a range of race days relative to today
    Sync {
        /// First day offset, inclusive (0 = today, -1 = yesterday)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        start_offset: i64,

        /// Last day offset, inclusive
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        end_offset: i64,
    },

    /// Fetch and print the filtered meeting list for one day, without
    /// touching the database
    Meetings {
        /// Race day (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },

    /// Fetch and merge odds fluctuations for one event
    Odds {
        /// Provider event id
        #[arg(long)]
        event_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over CLI-derived values
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("paddock-ingest".to_string())
        .build()
        .overlay_env()
        .context("invalid PADDOCK_LOG_* environment")?;

    init_logging(&log_config)?;

    let config = Config::load().context("configuration is invalid")?;
    db::tables::validate().map_err(|message| anyhow::anyhow!(message))?;

    let client = ProviderClient::new(config.provider.clone()).context("provider client failed")?;

    // The meeting listing is a pure fetch; no pool, no migrations.
    if let Command::Meetings { date } = &cli.command {
        let date = *date;
        let meetings = client
            .fetch_meetings(date)
            .await
            .context("meeting list fetch failed")?;

        for meeting in &meetings {
            info!(
                id = meeting.id.as_deref().unwrap_or("?"),
                name = meeting.name.as_deref().unwrap_or("?"),
                events = meeting.events.len(),
                "meeting"
            );
        }
        info!(%date, count = meetings.len(), "meeting list fetched");
        return Ok(());
    }

    let pool = db::connect(&config.database)
        .await
        .context("database connection failed")?;
    db::run_migrations(&pool)
        .await
        .context("database migration failed")?;

    let store = Arc::new(PgStore::new(pool));
    let synchronizer = Synchronizer::new(client, store, config.sync.clone());

    let cancel = synchronizer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current unit of work");
            cancel.cancel();
        }
    });

    let summary: RunSummary = match cli.command {
        Command::Sync {
            start_offset,
            end_offset,
        } => {
            anyhow::ensure!(
                start_offset <= end_offset,
                "start offset {start_offset} is after end offset {end_offset}"
            );
            info!(start_offset, end_offset, "synchronizing day range");
            synchronizer.run(start_offset, end_offset).await
        }
        Command::Odds { event_id } => {
            info!(%event_id, "synchronizing odds for one event");
            synchronizer.sync_single_event_odds(&event_id).await
        }
        Command::Meetings { .. } => unreachable!("handled above"),
    };

    info!(
        meetings = summary.meetings,
        runners = summary.runners,
        exotics = summary.exotics,
        odds = summary.odds,
        failed_days = summary.failed_days,
        failed_meetings = summary.failed_meetings,
        failed_events = summary.failed_events,
        "done"
    );

    Ok(())
}
