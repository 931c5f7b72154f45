//! topup - command-line client for the prepaid recharge wallet.
//!
//! Sessions are kept in the user's cache directory between runs, so a login
//! is only needed once the backend stops honoring the refresh cookie.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use topup_core::api::DEFAULT_PAGE_LIMIT;
use topup_core::models::{OrderStatus, TxType};
use topup_core::{Config, FileStore, WalletClient};

use commands::CliSessionHandler;

#[derive(Parser)]
#[command(name = "topup", version, about = "Prepaid recharge wallet client")]
struct Cli {
    /// Wallet API base URL (overrides config and TOPUP_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Log in and keep the session for later commands
    Login {
        /// Account email; defaults to the last one used
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// End the session
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// Update profile fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the wallet balance
    Balance,
    /// List wallet transactions
    History {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        /// credit or debit
        #[arg(short = 't', long = "type")]
        tx_type: Option<TxType>,
    },
    /// Add funds through a simulated PIX deposit
    Deposit { amount: f64 },
    /// Recharge a phone
    Order {
        phone: String,
        operator: String,
        amount: f64,
    },
    /// Show the recharge price table
    Packages,
    /// Ask for reseller access
    ResellerRequest,
    /// Administrative commands
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
pub(crate) enum AdminCommand {
    /// List all users
    Users,
    /// Show a user's transactions
    UserHistory {
        user_id: i64,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        #[arg(short = 't', long = "type")]
        tx_type: Option<TxType>,
    },
    /// Credit or debit a user's wallet
    Adjust {
        user_id: i64,
        amount: f64,
        /// credit or debit
        #[arg(short = 't', long = "type")]
        tx_type: TxType,
        #[arg(short, long)]
        reason: String,
    },
    /// List recharge orders
    Orders {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Confirm a paid order
    Confirm { order_id: i64 },
    /// Refund an order
    Refund { order_id: i64 },
    /// List pending reseller requests
    Resellers,
    /// Approve a reseller request
    Approve { user_id: i64 },
    /// Reject a reseller request
    Reject { user_id: i64 },
    /// Show the audit log
    Logs {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        #[arg(short, long)]
        action: Option<String>,
    },
    /// List every package, including inactive ones
    Packages,
    /// Change a package's selling price
    SetPrice {
        package_id: i64,
        price: f64,
        #[arg(long)]
        active: Option<bool>,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=topup_core=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    info!(api = %config.api_base_url, "Starting topup");

    let store = Arc::new(FileStore::in_dir(&config.cache_dir()?));
    let client = WalletClient::connect(
        &config.api_base_url,
        config.request_timeout(),
        store,
        Arc::new(CliSessionHandler),
    )?;

    commands::run(&client, &mut config, cli.command).await
}
