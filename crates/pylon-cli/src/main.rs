// crates/pylon-cli/src/main.rs
//
// CLI entrypoint for the Pylon bond protocol operator tools.
//
// Provides subcommands for inspecting configuration, printing a standard
// deployment, resolving account labels, and replaying scripted scenarios.

mod commands;
mod output;
mod scenario;

use clap::{Parser, Subcommand};
use output::OutputFormat;

use pylon_core::Address;
use pylon_economics::{ProtocolConfig, Roles};

/// Pylon CLI: treasury-backed bonds, streamed staking, and share vaults.
#[derive(Parser, Debug)]
#[command(
    name = "pylon",
    version = "0.1.0",
    about = "Pylon bond protocol CLI: inspect, deploy, and simulate"
)]
struct Cli {
    /// Path to the TOML protocol configuration. Defaults apply when absent.
    #[arg(long, global = true, default_value = "pylon.toml")]
    config: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the effective configuration.
    ShowConfig,

    /// Deploy the standard component set and print its addresses.
    Deploy {
        /// Owner of the treasury, faucet, and vault (label or 0x address).
        #[arg(long, default_value = "owner")]
        owner: Address,
        /// Receiver of treasury fees.
        #[arg(long, default_value = "dao")]
        dao: Address,
        /// Account allowed to trigger faucet drips.
        #[arg(long, default_value = "keeper")]
        keeper: Address,
    },

    /// Resolve account labels to addresses.
    Address {
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Replay a scenario file against a fresh deployment.
    Simulate {
        /// Path to the scenario TOML.
        scenario: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration before logging is up; report the outcome after.
    let loaded = ProtocolConfig::load(&cli.config);
    let level = match &loaded {
        Ok(cfg) => cfg.log_level.clone(),
        Err(_) => ProtocolConfig::default().log_level,
    };

    // Initialize tracing subscriber for structured logging. RUST_LOG wins over
    // the configured level; logs go to stderr so JSON output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!("Could not load config from {}: {}. Using defaults.", cli.config, e);
            ProtocolConfig::default()
        }
    };

    match &cli.command {
        Commands::ShowConfig => commands::config::run(&config, cli.format)?,
        Commands::Deploy { owner, dao, keeper } => {
            let roles = Roles {
                owner: *owner,
                dao: *dao,
                keeper: *keeper,
            };
            commands::deploy::run(&config, roles, cli.format)?
        }
        Commands::Address { labels } => commands::address::run(labels, cli.format)?,
        Commands::Simulate { scenario } => commands::simulate::run(scenario, &config, cli.format)?,
    }

    Ok(())
}
