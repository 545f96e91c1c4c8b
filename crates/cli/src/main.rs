//! Naked Pineapple Checkout CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run order store migrations
//! np-checkout migrate
//!
//! # Validate a store seed file
//! np-checkout seed check --file crates/checkout/seed.yaml
//!
//! # Print a stored order as JSON
//! np-checkout orders show 0b7a5c1e-5f0e-5d5c-8f8e-3c1d2a4b6e7f
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run order store migrations
//! - `seed check` - Parse and validate a store seed
//! - `orders show` - Print one order from the order store

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "np-checkout")]
#[command(author, version, about = "Naked Pineapple checkout tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run order store migrations
    Migrate,
    /// Work with store seed files
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
    /// Inspect stored orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Parse and validate a seed file without starting the service
    Check {
        /// Path to the seed YAML
        #[arg(short, long, default_value = "crates/checkout/seed.yaml")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Print an order as JSON
    Show {
        /// Order ID (UUID)
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { action } => match action {
            SeedAction::Check { file } => commands::seed::check(&file)?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Show { id } => commands::orders::show(&id).await?,
        },
    }
    Ok(())
}
