//! Vitrine CLI - Database migrations and plan catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! vitrine-cli migrate
//!
//! # Write the built-in plan catalog to the database
//! vitrine-cli plans sync
//!
//! # Show plans as stored
//! vitrine-cli plans list
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the plan catalog
    Plans {
        #[command(subcommand)]
        action: PlansAction,
    },
}

#[derive(Subcommand)]
enum PlansAction {
    /// Upsert the built-in plans and drop retired ones
    Sync,
    /// List all stored plans, including inactive ones
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Plans { action } => match action {
            PlansAction::Sync => commands::plans::sync().await?,
            PlansAction::List => commands::plans::list().await?,
        },
    }
    Ok(())
}
