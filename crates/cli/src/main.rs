//! Kabaditech CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run accounts database migrations
//! kt-cli migrate accounts
//!
//! # Create an active staff account
//! kt-cli staff create -e ops@kabaditech.in -n "Ops" -p <password>
//!
//! # Seed a development customer and dealer
//! kt-cli seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `staff create` - Create staff accounts
//! - `seed` - Seed database with development accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kt-cli")]
#[command(author, version, about = "Kabaditech CLI tools")]
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
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Seed database with development accounts
    Seed,
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run accounts database migrations
    Accounts,
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a new active staff account
    Create {
        /// Staff email address
        #[arg(short, long)]
        email: String,

        /// Staff display name
        #[arg(short, long)]
        name: String,

        /// Initial password
        #[arg(short, long)]
        password: String,
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
            MigrateTarget::Accounts => commands::migrate::accounts().await?,
        },
        Commands::Staff { action } => match action {
            StaffAction::Create {
                email,
                name,
                password,
            } => {
                commands::staff::create(&email, &name, &password).await?;
            }
        },
        Commands::Seed => commands::seed::dev_accounts().await?,
    }
    Ok(())
}
