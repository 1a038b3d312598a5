//! Caliper CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Initialize config directory
//! - `serve`    — Start the HTTP assessment server
//! - `simulate` — Run simulated respondents against a bank
//! - `bank`     — Inspect and validate an item bank file
//! - `status`   — Show configuration and system status

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "caliper",
    about = "Caliper — adaptive testing engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Start the HTTP assessment server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run simulated respondents and report estimation accuracy
    Simulate {
        /// True ability of the simulated respondent
        #[arg(short, long, default_value_t = 0.0)]
        theta: f64,

        /// Number of sessions to run
        #[arg(short = 'n', long, default_value_t = 1)]
        sessions: usize,

        /// RNG seed (sessions use seed, seed+1, ...)
        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Bank JSON file (omit for the built-in demo bank)
        #[arg(short, long)]
        bank: Option<String>,
    },

    /// Inspect and validate an item bank file
    Bank {
        /// Bank JSON file (omit for the built-in demo bank)
        path: Option<String>,
    },

    /// Show configuration and system status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Simulate {
            theta,
            sessions,
            seed,
            bank,
        } => commands::simulate::run(theta, sessions, seed, bank).await?,
        Commands::Bank { path } => commands::bank::run(path).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
