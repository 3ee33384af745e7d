//! ShopHub CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply the schema (tables, indexes, session store)
//! shophub-cli migrate
//!
//! # Create an administrator account
//! shophub-cli admin create -e admin@shophub.test -n "Store Admin" -p 'a-long-password'
//!
//! # Load demo categories and products (signs in as an existing admin)
//! shophub-cli seed -e admin@shophub.test -p 'a-long-password'
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shophub-cli")]
#[command(author, version, about = "ShopHub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load a demo catalog
    Seed {
        /// Administrator email used to authorize the writes
        #[arg(short, long)]
        email: String,

        /// Administrator password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Initial password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
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

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
        },
        Commands::Seed { email, password } => {
            commands::seed::demo_catalog(&email, &password).await?;
        }
    }
    Ok(())
}
