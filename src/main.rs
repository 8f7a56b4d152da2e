mod config;
mod engine;
mod feedback;
mod predictor;
mod shoe;
mod storage;
mod types;
mod web;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{load_config, render_toml, RuntimeConfigManager, ServerSettings};
use crate::engine::GameTable;
use crate::storage::{migrate_legacy_file, open_store, DEFAULT_ROUNDS_PER_SHOE, GAME_DATA_FILE};
use crate::types::{parse_sequence, Outcome};
use crate::web::{start_server, AppState};

#[derive(Parser)]
#[command(name = "baccarat-oracle")]
#[command(version)]
#[command(about = "Shoe tracking and next-round prediction for baccarat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// End the active shoe, if any, and start a new one
    StartShoe,
    /// End the active shoe
    EndShoe,
    /// Record a round, e.g. `record 9-K 2-3 Player`
    Record {
        player_hand: String,
        banker_hand: String,
        outcome: String,
    },
    /// Predict the next outcome, e.g. `predict P,B,P,B,P`
    Predict {
        #[arg(required = true)]
        outcomes: Vec<String>,
    },
    /// Show the shoe state
    Status,
    /// Convert a pre-shoe data file into a marked event log
    Migrate {
        /// Data file to convert (defaults to the configured data directory)
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_ROUNDS_PER_SHOE)]
        rounds_per_shoe: usize,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Config => {
            println!("{}", render_toml(&config)?);
        }
        Commands::Migrate { input, rounds_per_shoe } => {
            let path = input.unwrap_or_else(|| config.storage.data_dir.join(GAME_DATA_FILE));
            let report = migrate_legacy_file(&path, rounds_per_shoe).await?;
            println!(
                "Migrated {} rounds into {} shoes ({} skipped). Backup: {}",
                report.rounds_read,
                report.shoes_written,
                report.rounds_skipped,
                report.backup.display()
            );
        }
        command => {
            if let Commands::Serve { port: Some(port) } = &command {
                config.server.port = *port;
            }
            let server = config.server.clone();
            let store = open_store(&config.storage).await?;
            let table = Arc::new(GameTable::new(store, RuntimeConfigManager::new(config)));
            run_table_command(command, table, &server).await?;
        }
    }

    Ok(())
}

async fn run_table_command(command: Commands, table: Arc<GameTable>, server: &ServerSettings) -> Result<()> {
    match command {
        Commands::Serve { .. } => {
            info!("Baccarat Oracle v{}", env!("CARGO_PKG_VERSION"));
            start_server(AppState::new(table), server).await?;
        }
        Commands::StartShoe => {
            let start = table.start_shoe().await?;
            if let Some(ended) = start.ended {
                println!("Ended {}.", ended);
            }
            println!("Successfully started {}.", start.started);
        }
        Commands::EndShoe => {
            let shoe_id = table.end_shoe().await?;
            println!("Successfully ended {}.", shoe_id);
        }
        Commands::Record {
            player_hand,
            banker_hand,
            outcome,
        } => {
            let outcome: Outcome = outcome.parse()?;
            let round = table.record_round(&player_hand, &banker_hand, outcome).await?;
            println!("Game added to {}, round {}.", round.shoe_id, round.round_index);
        }
        Commands::Predict { outcomes } => {
            let sequence = parse_sequence(&outcomes.join(" "))?;
            let report = table.predict(&sequence).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Status => {
            let status = table.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Config | Commands::Migrate { .. } => {
            return Err(anyhow!("command does not operate on the table"));
        }
    }

    Ok(())
}
