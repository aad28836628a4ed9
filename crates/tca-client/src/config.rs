// Configuration for the portal client

use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment};

use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_MS};
use crate::error::{ClientError, Result};

const ENV_PREFIX: &str = "TCA";

/// Configuration for the portal client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base address including the API prefix (e.g. "http://localhost:5000/api")
    pub base_url: String,
    /// Per-request timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Directory holding the durable session file
    pub session_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            session_dir: default_session_dir(),
        }
    }
}

impl ClientConfig {
    /// Create a new config for the given backend address
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the session directory
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from `TCA_*` environment variables.
    ///
    /// Recognized keys: `TCA_API_URL`, `TCA_TIMEOUT_MS`, `TCA_SESSION_DIR`.
    /// Anything unset keeps its default.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`ClientConfig::from_env`] but reads from the given variables
    /// instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).source(Some(source)))
    }

    fn from_environment(env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(env.try_parsing(true))
            .build()?;
        let defaults = Self::default();

        let base_url = optional(settings.get_string("api_url"))?.unwrap_or(defaults.base_url);
        let timeout_ms = match optional(settings.get_int("timeout_ms"))? {
            Some(ms) if ms > 0 => ms as u64,
            Some(ms) => {
                return Err(ClientError::InvalidInput(format!(
                    "TCA_TIMEOUT_MS must be positive, got {ms}"
                )));
            }
            None => defaults.timeout_ms,
        };
        let session_dir = optional(settings.get_string("session_dir"))?
            .map(PathBuf::from)
            .unwrap_or(defaults.session_dir);

        Ok(Self {
            base_url,
            timeout_ms,
            session_dir,
        })
    }
}

fn optional<T>(value: std::result::Result<T, ConfigError>) -> Result<Option<T>> {
    match value {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn default_session_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".tca");
    }

    PathBuf::from(".tca")
}
