//! Application configuration management
//!
//! Settings come from a TOML file, with the credential and base URL
//! overridable from the environment (a `.env` file is honoured). Everything
//! is validated at startup so a bad setup fails before any request is sent.

use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_PROMPT, DEFAULT_REQUEST_TIMEOUT,
    env,
};
use crate::core::invoker::ApiKey;
use crate::models::openai::{ChatCompletionRequest, Message};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Config file read when `CONFIG_PATH` is unset
const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_messages")]
    pub messages: Vec<Message>,
    /// Fire an unobserved call before the awaited one
    #[serde(default = "default_warm_up")]
    pub warm_up: bool,
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            messages: default_messages(),
            warm_up: default_warm_up(),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_messages() -> Vec<Message> {
    vec![Message::user(DEFAULT_PROMPT)]
}

fn default_warm_up() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values taken from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl EnvOverrides {
    pub fn from_process() -> Self {
        Self {
            api_key: non_empty_var(env::API_KEY),
            base_url: non_empty_var(env::BASE_URL),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Validated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the endpoint
    pub api_key: ApiKey,

    /// API base URL, `/chat/completions` is appended
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,

    /// Spawn the detached call before the awaited one
    pub warm_up: bool,

    /// Extra attempts for the awaited call on connection errors
    pub max_retries: u32,

    /// Logging level
    pub log_level: String,
}

impl Config {
    /// Parse and validate TOML content
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The TOML cannot be parsed
    /// - No API key is available from the file or the environment
    /// - Any value is out of range
    pub fn from_toml_str(content: &str, overrides: &EnvOverrides) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).context("Failed to parse TOML configuration")?;

        let raw_key = overrides
            .api_key
            .clone()
            .or(config.api.api_key)
            .with_context(|| {
                format!("No API key configured. Set api.api_key or {}", env::API_KEY)
            })?;
        let api_key = ApiKey::new(raw_key).context("Invalid API key")?;

        let base_url = overrides
            .base_url
            .clone()
            .or(config.api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            bail!("base_url must be an http(s) URL, got '{}'", base_url);
        }

        let request = config.request;
        if request.model.trim().is_empty() {
            bail!("request.model must not be empty");
        }
        if request.messages.is_empty() {
            bail!("request.messages must contain at least one message");
        }
        if request.max_tokens == 0 {
            bail!("request.max_tokens must be positive");
        }
        if config.api.timeout_secs == 0 {
            bail!("api.timeout_secs must be positive");
        }

        Ok(Config {
            api_key,
            base_url,
            request_timeout: config.api.timeout_secs,
            model: request.model,
            messages: request.messages,
            max_tokens: request.max_tokens,
            warm_up: request.warm_up,
            max_retries: request.max_retries,
            log_level: config.logging.level,
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P, overrides: &EnvOverrides) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_toml_str(&content, overrides)
    }

    /// Load configuration from environment and config file
    ///
    /// Reads `.env` if present, then the file named by `CONFIG_PATH`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let overrides = EnvOverrides::from_process();
        let config_path = non_empty_var(env::CONFIG_PATH);
        Self::load(config_path.as_deref(), DEFAULT_CONFIG_FILE, &overrides)
    }

    /// Resolve the configuration file
    ///
    /// An explicit path must exist. Without one, `default_path` is read if
    /// present, otherwise defaults plus environment apply.
    pub fn load(
        explicit_path: Option<&str>,
        default_path: &str,
        overrides: &EnvOverrides,
    ) -> Result<Self> {
        match explicit_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    bail!("Configuration file {} not found ({})", path, env::CONFIG_PATH);
                }
                Self::from_file(path, overrides)
            }
            None if Path::new(default_path).exists() => Self::from_file(default_path, overrides),
            None => Self::from_toml_str("", overrides),
        }
    }

    /// Fresh request payload for one call
    pub fn payload(&self) -> ChatCompletionRequest {
        ChatCompletionRequest::new(self.model.clone(), self.messages.clone(), self.max_tokens)
    }
}
