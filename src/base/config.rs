//! Load configuration via `config` crate with env-override support.

use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use super::types::Res;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Prefix for environment overrides (e.g. `QQBOT_RELAY_OPENAI__KEY`).
const ENV_PREFIX: &str = "QQBOT_RELAY";

/// Default to the sandbox OpenAPI host.
fn default_qqbot_sandbox() -> bool {
    true
}

/// Default per-call OpenAPI timeout, in seconds.
fn default_qqbot_timeout_secs() -> u64 {
    3
}

/// Default OpenAI chat model.
fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Configuration for the relay.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// The shared, read-only settings.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Settings as they appear in the config file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// QQ bot credentials and OpenAPI settings (`[qqbot]`).
    pub qqbot: QqBotConfig,
    /// OpenAI settings (`[openai]`).
    pub openai: OpenAiConfig,
}

/// The `[qqbot]` table.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct QqBotConfig {
    /// Bot app ID (`qqbot.app_id`).
    pub app_id: u64,
    /// Bot access token (`qqbot.access_token`).
    pub access_token: String,
    /// Use the sandbox OpenAPI host (`qqbot.sandbox`).
    #[serde(default = "default_qqbot_sandbox")]
    pub sandbox: bool,
    /// Per-call OpenAPI timeout in seconds (`qqbot.timeout_secs`).
    #[serde(default = "default_qqbot_timeout_secs")]
    pub timeout_secs: u64,
}

/// The `[openai]` table.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OpenAiConfig {
    /// OpenAI API key (`openai.key`).
    pub key: String,
    /// HTTP forward proxy for OpenAI calls; empty disables it (`openai.proxy`).
    #[serde(default)]
    pub proxy: String,
    /// Chat model to use (`openai.model`).
    #[serde(default = "default_openai_model")]
    pub model: String,
    /// Alternate API base URL (`openai.base_url`).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Load the config from `explicit_path`, or `config.toml` in the working directory.
    ///
    /// The file must exist. Values from `QQBOT_RELAY_<SECTION>__<KEY>` environment
    /// variables override the file.
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        let path = explicit_path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let environment = config::Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__");

        Self::load_with_environment(&path, environment)
    }

    fn load_with_environment(path: &Path, environment: config::Environment) -> Res<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).format(config::FileFormat::Toml).required(true))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read config file `{}`", path.display()))?;

        let result = Config {
            inner: Arc::new(cfg.try_deserialize().with_context(|| format!("Invalid config file `{}`", path.display()))?),
        };

        if result.qqbot.app_id == 0 {
            return Err(anyhow::anyhow!("`qqbot.app_id` must be set to a non-zero value."));
        }

        if result.qqbot.access_token.is_empty() {
            return Err(anyhow::anyhow!("`qqbot.access_token` must not be empty."));
        }

        if result.openai.key.is_empty() {
            return Err(anyhow::anyhow!("`openai.key` must not be empty."));
        }

        if result.qqbot.timeout_secs < 1 || result.qqbot.timeout_secs > 60 {
            return Err(anyhow::anyhow!("`qqbot.timeout_secs` must be between 1 and 60."));
        }

        info!("Using config file -> {}", path.display());

        Ok(result)
    }
}
