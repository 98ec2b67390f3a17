//! Configuration handling for the application.
//!
//! Everything is read from environment variables with development defaults,
//! so a bare `cargo run --bin api` starts a server that can fetch pages and
//! run the heuristic tier. The model binding is only configured when both
//! Workers AI credentials are present.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Environment variable names.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_AI_MODEL: &str = "AI_MODEL";
pub const ENV_AI_BASE_URL: &str = "AI_BASE_URL";
pub const ENV_CLOUDFLARE_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
pub const ENV_CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";

/// Default development values used when environment variables are absent.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AI_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";
pub const DEFAULT_AI_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Credentials and endpoint for the Workers AI binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub account_id: String,
    pub api_token: String,
    pub base_url: String,
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    fetch_timeout: Duration,
    ai_model: String,
    ai: Option<AiConfig>,
}

impl Config {
    /// Create a new config explicitly.
    pub fn new(
        bind_addr: impl Into<String>,
        fetch_timeout: Duration,
        ai_model: impl Into<String>,
        ai: Option<AiConfig>,
    ) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            fetch_timeout,
            ai_model: ai_model.into(),
            ai,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let fetch_timeout_secs = match env::var(ENV_FETCH_TIMEOUT_SECS) {
            Ok(raw) => parse_timeout_secs(&raw)?,
            Err(_) => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let ai_model = env::var(ENV_AI_MODEL).unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string());

        let account_id = non_blank_var(ENV_CLOUDFLARE_ACCOUNT_ID);
        let api_token = non_blank_var(ENV_CLOUDFLARE_API_TOKEN);
        let ai = match (account_id, api_token) {
            (Some(account_id), Some(api_token)) => Some(AiConfig {
                account_id,
                api_token,
                base_url: env::var(ENV_AI_BASE_URL)
                    .unwrap_or_else(|_| DEFAULT_AI_BASE_URL.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            ai_model,
            ai,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Upper bound for a single page fetch.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
    /// Model identifier passed to the binding on every call.
    pub fn ai_model(&self) -> &str {
        &self.ai_model
    }
    /// Workers AI settings, if credentials were provided.
    pub fn ai(&self) -> Option<&AiConfig> {
        self.ai.as_ref()
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        Self::new(
            DEFAULT_BIND_ADDR,
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            DEFAULT_AI_MODEL,
            None,
        )
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_timeout_secs(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            field: ENV_FETCH_TIMEOUT_SECS,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::InvalidValue {
            field: ENV_FETCH_TIMEOUT_SECS,
            reason: e.to_string(),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
