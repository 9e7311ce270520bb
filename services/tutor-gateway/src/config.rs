//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! API keys come from the GENAI_API_KEYS env var or `genai.keys_file`, never
//! from the TOML directly. Either source holds one comma-separated value; a
//! source that yields no keys counts as unset.

use common::Secret;
use key_pool::KeyPool;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Environment variable holding the comma-separated API key list.
pub const KEYS_ENV_VAR: &str = "GENAI_API_KEYS";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub genai: GenaiConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Generative service settings
#[derive(Debug, Deserialize)]
pub struct GenaiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-attempt timeout, covering the request and the response body
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// File holding the comma-separated key list (alternative to GENAI_API_KEYS)
    #[serde(default)]
    pub keys_file: Option<PathBuf>,
    /// Where the key list came from, resolved by [`Config::load`].
    #[serde(skip)]
    pub key_source: KeySource,
    #[serde(skip, default = "empty_pool")]
    keys: Arc<KeyPool>,
}

/// Origin of the configured key list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeySource {
    Env,
    File,
    #[default]
    Unset,
}

impl KeySource {
    pub fn label(self) -> &'static str {
        match self {
            KeySource::Env => "env",
            KeySource::File => "file",
            KeySource::Unset => "none",
        }
    }
}

impl Default for GenaiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            keys_file: None,
            key_source: KeySource::Unset,
            keys: empty_pool(),
        }
    }
}

fn default_base_url() -> String {
    genai::client::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn empty_pool() -> Arc<KeyPool> {
    Arc::new(KeyPool::from_config(""))
}

fn default_max_connections() -> usize {
    256
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Key list resolution order:
    /// 1. GENAI_API_KEYS env var
    /// 2. keys_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        config.validate()?;

        let env_pool = KeyPool::from_env(KEYS_ENV_VAR);
        if !env_pool.is_empty() {
            config.genai.key_source = KeySource::Env;
            config.genai.keys = Arc::new(env_pool);
            return Ok(config);
        }
        if std::env::var_os(KEYS_ENV_VAR).is_some() {
            warn!(env = KEYS_ENV_VAR, "key variable is set but holds no keys, ignoring it");
        }

        if let Some(ref keys_file) = config.genai.keys_file {
            let raw = std::fs::read_to_string(keys_file).map_err(|source| {
                common::Error::KeyFile {
                    path: keys_file.clone(),
                    source,
                }
            })?;
            let raw = Secret::new(raw);
            let file_pool = KeyPool::from_config(raw.expose());
            if !file_pool.is_empty() {
                config.genai.key_source = KeySource::File;
                config.genai.keys = Arc::new(file_pool);
            }
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        let base_url = &self.genai.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(common::Error::invalid(
                "genai.base_url",
                format!("must start with http:// or https://, got: {base_url}"),
            ));
        }
        if self.genai.model.trim().is_empty() {
            return Err(common::Error::invalid("genai.model", "must not be empty"));
        }
        if self.genai.timeout_secs == 0 {
            return Err(common::Error::invalid("genai.timeout_secs", "must be greater than 0"));
        }
        if self.server.max_connections == 0 {
            return Err(common::Error::invalid(
                "server.max_connections",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// The resolved key pool. No keys is a valid, empty pool.
    pub fn key_pool(&self) -> Arc<KeyPool> {
        self.genai.keys.clone()
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("tutor-gateway.toml")
    }
}
