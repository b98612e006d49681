//! Nexus CLI - Database migrations and cart tooling.
//!
//! # Usage
//!
//! ```bash
//! # Create the session store schema
//! nexus-cli migrate storefront
//!
//! # Print an exported cart with its totals
//! nexus-cli cart inspect cart.json
//!
//! # Validate a catalog file
//! nexus-cli catalog check crates/storefront/catalog.json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "nexus-cli")]
#[command(author, version, about = "Nexus storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Inspect persisted carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Validate catalog files
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the storefront session store schema
    Storefront,
}

#[derive(Subcommand)]
enum CartAction {
    /// Restore a persisted cart and print its lines and totals
    Inspect {
        /// Path to the cart JSON
        path: PathBuf,

        /// Tax rate as a fraction (default 0.05)
        #[arg(long)]
        tax_rate: Option<Decimal>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Load a catalog and report problems
    Check {
        /// Path to the catalog JSON
        path: PathBuf,
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
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Inspect { path, tax_rate } => commands::cart::inspect(&path, tax_rate)?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Check { path } => commands::catalog::check(&path)?,
        },
    }
    Ok(())
}
