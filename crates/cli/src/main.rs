//! Threadline CLI - Database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Create the document and session tables
//! tl-cli migrate
//!
//! # Import designs from a YAML file
//! tl-cli catalog import designs.yaml
//!
//! # List or delete catalog designs
//! tl-cli catalog list
//! tl-cli catalog delete rose-hoop
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `catalog` - Import, list, and delete catalog designs

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(author, version, about = "Threadline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage catalog designs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Import designs from a YAML file, skipping duplicates
    Import {
        /// Path to the YAML file (a list of designs)
        file: String,
    },
    /// List all designs
    List,
    /// Delete a design by ID
    Delete {
        /// Design ID
        id: String,
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
        Commands::Catalog { action } => match action {
            CatalogAction::Import { file } => commands::catalog::import(&file).await?,
            CatalogAction::List => commands::catalog::list().await?,
            CatalogAction::Delete { id } => commands::catalog::delete(&id).await?,
        },
    }
    Ok(())
}
