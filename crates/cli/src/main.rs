//! Medbasket CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! medbasket-cli migrate
//!
//! # Seed the catalog with sample data
//! medbasket-cli seed
//!
//! # Promote a user to admin
//! medbasket-cli admin promote -p +919876543210
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with sample catalog data
//! - `admin promote` / `admin demote` - Manage the admin role

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "medbasket-cli")]
#[command(author, version, about = "Medbasket CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with sample catalog data
    Seed,
    /// Manage the admin role
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin role to a user
    Promote {
        /// Phone number of the user
        #[arg(short, long)]
        phone: String,
    },
    /// Revert a user to the customer role
    Demote {
        /// Phone number of the user
        #[arg(short, long)]
        phone: String,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Promote { phone } => {
                commands::admin::set_role(&phone, medbasket_core::Role::Admin).await?;
            }
            AdminAction::Demote { phone } => {
                commands::admin::set_role(&phone, medbasket_core::Role::Customer).await?;
            }
        },
    }
    Ok(())
}
