//! Bazaar CLI - Database migrations, seeding and a terminal inbox.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema and the session table
//! bazaar migrate
//!
//! # Create the configured admin and the demo catalog
//! bazaar seed
//!
//! # Create an admin account directly
//! bazaar admin create -u owner -p 'a-long-passphrase'
//!
//! # List conversations (admin) or show your thread (buyer)
//! bazaar inbox -u owner -p 'a-long-passphrase'
//!
//! # Open one conversation, reply and keep polling
//! bazaar inbox -u owner -p '...' --with 2 --send "Còn hàng bạn nhé" --follow
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the admin account and demo catalog
//! - `admin create` - Create admin users
//! - `inbox` - Read and send chat messages through the API

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the admin account and the demo catalog
    Seed {
        /// Only seed the admin account
        #[arg(long)]
        skip_catalog: bool,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Read and send chat messages
    Inbox {
        /// Storefront base URL
        #[arg(long, default_value = "http://localhost:3000")]
        url: String,

        /// Username to log in with
        #[arg(short, long)]
        username: String,

        /// Password to log in with
        #[arg(short, long)]
        password: String,

        /// Open the conversation with this user ID (admin)
        #[arg(short, long)]
        with: Option<i32>,

        /// Send this message before showing the inbox
        #[arg(short, long)]
        send: Option<String>,

        /// Receiver of `--send`; defaults to `--with`, or the shop inbox
        #[arg(long)]
        to: Option<i32>,

        /// Keep polling and print new messages until Ctrl+C
        #[arg(short, long)]
        follow: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin username
        #[arg(short, long)]
        username: String,

        /// Admin password
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { skip_catalog } => commands::seed::run(skip_catalog).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                commands::admin::create_user(&username, &password).await?;
            }
        },
        Commands::Inbox {
            url,
            username,
            password,
            with,
            send,
            to,
            follow,
        } => {
            commands::inbox::run(commands::inbox::InboxOptions {
                url,
                username,
                password,
                with,
                send,
                to,
                follow,
            })
            .await?;
        }
    }
    Ok(())
}
