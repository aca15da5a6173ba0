use std::time::Duration;

use admin::{SweepOptions, sweep_inactive};
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use storage::{Database, LadderEngine, PgLadderStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ladder-admin")]
#[command(about = "Chess ladder maintenance tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Milliseconds to wait for a busy ladder
    #[arg(long, env = "LADDER_LOCK_TIMEOUT_MS", default_value_t = 5_000)]
    lock_timeout_ms: u64,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild a ladder's rating history by replaying its games
    Crunch {
        #[arg(long)]
        ladder: Uuid,
    },
    /// Renumber a ladder's active ranks densely
    Repair {
        #[arg(long)]
        ladder: Uuid,
    },
    /// Print the current standings
    Standings {
        #[arg(long)]
        ladder: Uuid,
    },
    /// Demote members idle for longer than the ladder's inactivity period
    Sweep {
        #[arg(long)]
        ladder: Uuid,

        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,

        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ladder_admin={log_level},admin={log_level},storage={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::new(&cli.database_url)
        .await
        .context("Failed to connect to database")?;
    let store = PgLadderStore::new(
        db.pool().clone(),
        Duration::from_millis(cli.lock_timeout_ms),
    );
    let engine = LadderEngine::new(store);

    match cli.command {
        Commands::Crunch { ladder } => {
            let summary = engine
                .crunch_ratings(ladder)
                .await
                .with_context(|| format!("Failed to crunch ladder {ladder}"))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            println!(
                "Replayed {} games, replaced {} ratings with {}",
                summary.games_replayed, summary.ratings_deleted, summary.ratings_written
            );
        }
        Commands::Repair { ladder } => {
            let repaired = engine
                .repair_ranks(ladder)
                .await
                .with_context(|| format!("Failed to repair ladder {ladder}"))?;
            println!("Rewrote {repaired} rankings");
        }
        Commands::Standings { ladder } => {
            let standings = engine
                .standings(ladder)
                .await
                .with_context(|| format!("Failed to load standings of ladder {ladder}"))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&standings)?);
                return Ok(());
            }
            println!("{:>4}  {:<36}  {:>9}  {:>5}", "rank", "player", "rating", "games");
            for row in standings {
                println!(
                    "{:>4}  {:<36}  {:>9}  {:>5}",
                    row.rank, row.player_id, row.rating, row.games_played
                );
            }
        }
        Commands::Sweep {
            ladder,
            as_of,
            dry_run,
        } => {
            let options = SweepOptions {
                as_of: as_of.unwrap_or_else(Utc::now),
                dry_run,
            };
            let report = sweep_inactive(&engine, ladder, options)
                .await
                .with_context(|| format!("Failed to sweep ladder {ladder}"))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            for entry in &report.entries {
                println!(
                    "{}  rank {:?} -> {:?}  -{} of {}",
                    entry.player_id, entry.rank_before, entry.rank_after, entry.applied, entry.planned
                );
            }
            if dry_run {
                println!("Dry run: {} members would be demoted", report.entries.len());
            } else {
                println!("Applied {} demotions", report.demotions());
            }
        }
    }

    Ok(())
}
