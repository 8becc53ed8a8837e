//! Fiftymillimeter CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! fiftymm-cli migrate
//!
//! # Create or update the shop product
//! fiftymm-cli seed product \
//!     --id zine-athens-rainforest \
//!     --name "Athens Rainforest" \
//!     --price 3500 \
//!     --stock 50
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed product` - Upsert the single sellable product

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fiftymm-cli")]
#[command(author, version, about = "Fiftymillimeter CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed database rows
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create or update the shop product
    Product {
        /// Product id (also used in Stripe metadata)
        #[arg(long, default_value = "zine-athens-rainforest")]
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,

        /// Price in minor currency units (cents)
        #[arg(long)]
        price: i64,

        /// Units available for sale
        #[arg(long)]
        stock: i32,
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
        Commands::Seed { target } => match target {
            SeedTarget::Product {
                id,
                name,
                description,
                price,
                stock,
            } => {
                commands::seed::product(&id, &name, description.as_deref(), price, stock).await?;
            }
        },
    }
    Ok(())
}
