// CLI subcommand dispatch and the shared command context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Subcommand};
use tca_client::{ClientConfig, PortalClient, Reachability, Session};
use tracing::debug;

use crate::output::OutputFormat;

pub mod auth;
pub mod occurrence;
pub mod records;
pub mod suggest;

/// Flags accepted by every subcommand
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Backend base URL, e.g. http://localhost:5000/api
    #[arg(long, global = true, env = "TCA_API_URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Directory holding the persisted session
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,

    /// Force JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and persist the session
    Login(auth::LoginArgs),
    /// Sign out and clear the session
    Logout,
    /// Show the signed-in user and role
    Whoami,
    /// Ask the backend whether the stored token is still valid
    Verify,
    /// Probe backend liveness
    Health,
    /// List the modules visible to the signed-in role
    Modules,
    /// Fetch one page of a module's records
    List(records::ListArgs),
    /// Autocomplete suggestions for a module
    Suggest(suggest::SuggestArgs),
    /// Everything known about one person, by category
    SearchAll(records::SearchAllArgs),
    /// Fetch one person by id
    Person(records::IdArgs),
    /// Check whether a person id exists
    PersonExists(records::IdArgs),
    /// Documents linked to a person
    Documents(records::IdArgs),
    /// Occurrences recorded for a student
    Occurrences(records::IdArgs),
    /// Record a new occurrence
    NewOccurrence(occurrence::NewOccurrenceArgs),
}

pub async fn run(global: GlobalArgs, cmd: Command) -> anyhow::Result<()> {
    let ctx = Context::from_args(&global)?;

    match cmd {
        Command::Login(args) => auth::login(&ctx, args).await,
        Command::Logout => auth::logout(&ctx).await,
        Command::Whoami => auth::whoami(&ctx),
        Command::Verify => auth::verify(&ctx).await,
        Command::Health => records::health(&ctx).await,
        Command::Modules => records::modules(&ctx),
        Command::List(args) => records::list(&ctx, args).await,
        Command::Suggest(args) => suggest::run(&ctx, args).await,
        Command::SearchAll(args) => records::search_all(&ctx, args).await,
        Command::Person(args) => records::person(&ctx, args).await,
        Command::PersonExists(args) => records::person_exists(&ctx, args).await,
        Command::Documents(args) => records::documents(&ctx, args).await,
        Command::Occurrences(args) => records::occurrences(&ctx, args).await,
        Command::NewOccurrence(args) => occurrence::run(&ctx, args).await,
    }
}

/// Raised when a command needs a session and none is stored
#[derive(Debug, thiserror::Error)]
#[error("not logged in")]
pub struct SessionRequired;

pub struct Context {
    pub client: Arc<PortalClient>,
    pub format: OutputFormat,
}

impl Context {
    fn from_args(global: &GlobalArgs) -> anyhow::Result<Self> {
        let config = build_config(ClientConfig::from_env()?, global);
        debug!(
            "Using backend {} (timeout {} ms)",
            config.base_url, config.timeout_ms
        );

        let client = PortalClient::new(config).context("failed to create portal client")?;
        Ok(Self {
            client: Arc::new(client),
            format: OutputFormat::detect(global.json),
        })
    }

    /// The stored session, or [`SessionRequired`]
    pub fn require_session(&self) -> anyhow::Result<Session> {
        self.client
            .session()
            .current()
            .ok_or_else(|| SessionRequired.into())
    }

    /// Probe the backend and refuse to continue when it is down
    pub async fn require_backend(&self) -> anyhow::Result<()> {
        match self.client.health().check().await {
            Reachability::Unreachable => {
                anyhow::bail!(tca_client::ClientError::ConnectionRefused(format!(
                    "no response from {}",
                    self.client.config().base_url
                )))
            }
            Reachability::Reachable | Reachability::Unknown => Ok(()),
        }
    }
}

/// Flags override environment, which overrides defaults
fn build_config(mut config: ClientConfig, global: &GlobalArgs) -> ClientConfig {
    if let Some(url) = &global.api_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(ms) = global.timeout_ms {
        config = config.with_timeout_ms(ms);
    }
    if let Some(dir) = &global.session_dir {
        config = config.with_session_dir(dir);
    }
    config
}
