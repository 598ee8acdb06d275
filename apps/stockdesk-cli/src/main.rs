//! # StockDesk CLI
//!
//! Terminal front-end for the sale desk.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Parse arguments (clap)                                              │
//! │  2. Initialize logging (RUST_LOG, default warn,stockdesk=info)          │
//! │  3. Load ClientConfig: defaults → client.toml → STOCKDESK_* env         │
//! │  4. Run the subcommand                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod order;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockdesk_client::{ClientConfig, ClientError};
use stockdesk_core::Role;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockdesk", version, about = "StockDesk terminal sale desk")]
struct Cli {
    /// Config file (default: the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enter a sale from an order file and submit it.
    Sell {
        /// TOML order file.
        order: PathBuf,

        /// Accept a price-outlier override without asking.
        #[arg(long)]
        yes: bool,
    },

    /// Show the most recent sales.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// List the navigation sections a role can see.
    Nav {
        /// admin, manager or staff (default: the configured role).
        #[arg(long)]
        role: Option<Role>,
    },

    /// Inspect or write the client configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Write the effective configuration to disk (without the token).
    Init,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            if let Some(hint) = err.downcast_ref::<ClientError>().and_then(hint_for) {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = ClientConfig::load(cli.config.clone())?;

    match cli.command {
        Command::Sell { order, yes } => commands::sell(&config, &order, yes).await,
        Command::Recent { limit } => commands::recent(&config, limit).await,
        Command::Nav { role } => commands::nav(&config, role),
        Command::Config(ConfigCommand::Show) => commands::config_show(&config),
        Command::Config(ConfigCommand::Init) => commands::config_init(&config, cli.config),
    }
}

fn hint_for(err: &ClientError) -> Option<&'static str> {
    if err.is_config_error() {
        Some("check client.toml and the STOCKDESK_* environment variables")
    } else if err.is_user_correctable() {
        Some("fix the order file and run the sale again")
    } else {
        None
    }
}

/// Logs go to stderr so command output stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stockdesk=trace` - Show trace for stockdesk crates only
/// - Default: WARN, INFO for stockdesk crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stockdesk=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
