mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use tombola_core::{SharedStore, StoreHub, TombolaError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tombola")]
#[command(about = "Tombola - prize-draw control panel and audience display")]
#[command(version)]
struct Cli {
    /// Data directory for the shared draw state
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prize management commands
    #[command(subcommand)]
    Prize(commands::PrizeCommands),

    /// Event and participant settings
    #[command(subcommand)]
    Event(commands::EventCommands),

    /// Draw session commands
    #[command(subcommand)]
    Draw(commands::DrawCommands),

    /// Run the audience display window
    Display {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 100)]
        poll_ms: u64,
    },

    /// Export the winner list as CSV
    Export {
        /// Output file, defaults to a timestamped name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "tombola={}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CliConfig::load(cli.data_dir);
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let store = SharedStore::open(&config.data_dir.join("tombola.db")).await?;
    let hub = StoreHub::new(store);

    let result = match cli.command {
        Commands::Prize(cmd) => commands::handle_prize_command(cmd, &hub).await,
        Commands::Event(cmd) => commands::handle_event_command(cmd, &hub).await,
        Commands::Draw(cmd) => commands::handle_draw_command(cmd, &hub).await,
        Commands::Display { poll_ms } => commands::run_display(&hub, poll_ms).await,
        Commands::Export { output } => commands::handle_export(&hub, output).await,
    };

    if let Err(e) = result {
        match e {
            TombolaError::Validation(msg) => {
                eprintln!("Error: {}", msg);
            }
            TombolaError::InvalidState(msg) => {
                eprintln!("Error: {}", msg);
                eprintln!("Use 'tombola draw status' to inspect the current session");
            }
            TombolaError::CapacityExceeded { .. } => {
                eprintln!("Error: {}", e);
                eprintln!("Use a smaller picture or clear the current one");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
