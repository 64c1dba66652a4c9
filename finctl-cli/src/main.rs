//! finctl CLI - personal finance database access
//!
//! With no subcommand, checks the database connection and then prints every
//! transaction, most recent first. Subcommands run a single gateway
//! operation each:
//! - `health`: active database name and server version
//! - `transactions`: full transaction listing
//! - `add`: record one transaction
//! - `summary`: accounts and balances of one user

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use finctl_core::{DbConfig, Gateway, NewTransaction};
use rust_decimal::Decimal;
use tracing::info;

mod output;
mod tracing_setup;

use output::Format;

#[derive(Parser, Debug)]
#[command(
    name = "finctl",
    author,
    version,
    about = "Query and record transactions in the personal finance database",
    long_about = "Connects to the finance MySQL database using DB_HOST, DB_PORT, DB_USER, \
                  DB_PASSWORD and DB_NAME (from the environment, .env, or finctl.toml). \
                  Without a subcommand, runs a health check followed by a full transaction listing."
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Database host (overrides DB_HOST)
    #[arg(long, global = true, value_name = "HOST")]
    host: Option<String>,

    /// Database port (overrides DB_PORT)
    #[arg(long, global = true, value_name = "PORT")]
    port: Option<u16>,

    /// Database name (overrides DB_NAME)
    #[arg(long, global = true, value_name = "NAME")]
    database: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the active database and MySQL server version
    Health,
    /// List all transactions, most recent first
    #[command(alias = "list")]
    Transactions,
    /// Record a new transaction
    Add(AddArgs),
    /// Show a user's accounts and balances
    Summary(SummaryArgs),
}

#[derive(Parser, Debug)]
struct AddArgs {
    /// Account the transaction belongs to
    #[arg(long, value_name = "ID")]
    account: i64,

    /// Category id used to classify the transaction
    #[arg(long, value_name = "ID")]
    category: i64,

    /// Amount, e.g. 42.50 or -12.00
    #[arg(long, allow_hyphen_values = true)]
    amount: Decimal,

    /// Transaction date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    date: NaiveDate,

    /// Free-form description
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Parser, Debug)]
struct SummaryArgs {
    /// User whose accounts to summarize
    #[arg(value_name = "USER_ID")]
    user_id: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let config = load_config(&cli)?;
    let gateway = Gateway::new(config);
    let format = Format::from_flag(cli.json);

    match cli.command {
        None => run_default(&gateway, format).await?,
        Some(Commands::Health) => run_health(&gateway, format).await?,
        Some(Commands::Transactions) => run_transactions(&gateway, format).await?,
        Some(Commands::Add(args)) => run_add(&gateway, format, args).await?,
        Some(Commands::Summary(args)) => run_summary(&gateway, format, args).await?,
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DbConfig> {
    let mut config = DbConfig::load().context("failed to load database configuration")?;

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }

    info!(
        "using database {} at {}:{}",
        config.database, config.host, config.port
    );
    Ok(config)
}

async fn run_default(gateway: &Gateway, format: Format) -> Result<()> {
    run_health(gateway, format).await?;
    run_transactions(gateway, format).await
}

async fn run_health(gateway: &Gateway, format: Format) -> Result<()> {
    let server = gateway
        .health_check()
        .await
        .context("could not connect to the finance database")?;

    let mut out = io::stdout().lock();
    output::server_info(&mut out, format, &server)?;
    out.flush()?;
    Ok(())
}

async fn run_transactions(gateway: &Gateway, format: Format) -> Result<()> {
    let rows = gateway
        .list_transactions()
        .await
        .context("failed to list transactions")?;
    info!("fetched {} transactions", rows.len());

    let mut out = io::stdout().lock();
    output::transactions(&mut out, format, &rows)?;
    out.flush()?;
    Ok(())
}

async fn run_add(gateway: &Gateway, format: Format, args: AddArgs) -> Result<()> {
    let new = NewTransaction::new(
        args.account,
        args.category,
        args.amount,
        args.date,
        args.description,
    );

    let transaction_id = gateway
        .add_transaction(new)
        .await
        .context("error adding transaction")?;

    let mut out = io::stdout().lock();
    output::added(&mut out, format, transaction_id)?;
    out.flush()?;
    Ok(())
}

async fn run_summary(gateway: &Gateway, format: Format, args: SummaryArgs) -> Result<()> {
    let rows = gateway
        .summarize_user(args.user_id)
        .await
        .with_context(|| format!("failed to summarize user {}", args.user_id))?;

    let mut out = io::stdout().lock();
    output::user_summary(&mut out, format, args.user_id, &rows)?;
    out.flush()?;
    Ok(())
}
