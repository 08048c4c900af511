pub mod account;
pub mod analytics;
pub mod chat;
pub mod documents;
pub mod settings;

use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::db::Database;
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Mentora study assistant client
#[derive(Parser, Debug)]
#[command(name = "mentora")]
#[command(version)]
#[command(about = "Command-line client for the Mentora study assistant API", long_about = None)]
pub struct Cli {
    /// API base URL, overriding the stored setting
    #[arg(long, env = "MENTORA_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Where the settings and credentials database lives
    #[arg(long, env = "MENTORA_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the access token
    Login(account::LoginArgs),

    /// Create an account and log in
    Register(account::RegisterArgs),

    /// Forget the stored access token
    Logout,

    /// Show or update the profile
    Profile(account::ProfileArgs),

    /// Change the account password
    ChangePassword(account::ChangePasswordArgs),

    /// Password reset by emailed code
    #[command(subcommand)]
    Reset(account::ResetCommand),

    /// Uploaded documents
    #[command(subcommand)]
    Docs(documents::DocsCommand),

    /// Chat sessions
    #[command(subcommand)]
    Sessions(chat::SessionsCommand),

    /// Messages within a session
    #[command(subcommand)]
    Chat(chat::ChatCommand),

    /// Explain a concept, optionally against a document
    Explain(chat::ExplainArgs),

    /// Study analytics
    #[command(subcommand)]
    Stats(analytics::StatsCommand),

    /// Local client settings
    #[command(subcommand)]
    Settings(settings::SettingsCommand),
}

pub struct Context {
    pub db: Arc<Database>,
    pub client: ApiClient,
    pub json: bool,
}

impl Context {
    /// Print `value` as JSON when asked to, otherwise hand it to `text`.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

fn data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => dirs::data_dir()
            .map(|d| d.join("mentora"))
            .context("Could not determine a data directory, pass --data-dir"),
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let dir = data_dir(cli.data_dir)?;
    let db = Arc::new(
        Database::new(&dir).with_context(|| format!("Failed to open database in {}", dir.display()))?,
    );
    let config = ClientConfig::from_settings(&db).with_base_url(cli.api_url);
    debug!("Using API at {}", config.base_url);
    let client = ApiClient::new(&config, db.clone())?;
    let ctx = Context {
        db,
        client,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Login(args) => account::login(&ctx, args).await,
        Commands::Register(args) => account::register(&ctx, args).await,
        Commands::Logout => account::logout(&ctx).await,
        Commands::Profile(args) => account::profile(&ctx, args).await,
        Commands::ChangePassword(args) => account::change_password(&ctx, args).await,
        Commands::Reset(cmd) => account::reset(&ctx, cmd).await,
        Commands::Docs(cmd) => documents::run(&ctx, cmd).await,
        Commands::Sessions(cmd) => chat::sessions(&ctx, cmd).await,
        Commands::Chat(cmd) => chat::chat(&ctx, cmd).await,
        Commands::Explain(args) => chat::explain(&ctx, args).await,
        Commands::Stats(cmd) => analytics::run(&ctx, cmd).await,
        Commands::Settings(cmd) => settings::run(&ctx, cmd),
    };

    if let Err(e) = &result {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            eprintln!("Your session has expired. Run `mentora login` to sign in again.");
        }
    }
    result
}
