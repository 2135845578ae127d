//! CLI module for Quorum
//!
//! Provides commands:
//! - `serve`: run the HTTP API
//! - `ask`: answer one question from the terminal
//! - `doctor`: configuration and provider diagnostics

use clap::{Parser, Subcommand};

pub mod ask;
pub mod doctor;

/// Quorum CLI
#[derive(Parser, Debug)]
#[command(name = "quorum")]
#[command(about = "Routes questions to domain experts and merges their answers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,
    /// Answer a single question
    Ask {
        /// The question
        query: String,
        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check configuration and provider connectivity
    Doctor,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Ask { query, json }) => ask::run(&query, json).await,
        Some(Commands::Doctor) => doctor::run().await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
