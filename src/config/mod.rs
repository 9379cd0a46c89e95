//! Configuration management.
//!
//! Settings come from defaults, then an optional TOML file, then
//! `PAPER_LENS_*` environment variables. Nested keys use a double
//! underscore, e.g. `PAPER_LENS_LINKER__TOP_K=5`.

mod file_config;

pub use file_config::ConfigFileError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PAPER_LENS";

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "paper-lens.toml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Page segmentation
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Reference linking
    #[serde(default)]
    pub linker: LinkerConfig,

    /// Embedding backend
    #[serde(default = "default_embedding_backend")]
    pub embedding: BackendConfig,

    /// Rerank backend
    #[serde(default = "default_rerank_backend")]
    pub rerank: BackendConfig,

    /// Caller-side retry around backend calls
    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            linker: LinkerConfig::default(),
            embedding: default_embedding_backend(),
            rerank: default_rerank_backend(),
            retry: RetrySettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Target window size in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Advisory overlap between windows
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            overlap: default_overlap(),
        }
    }
}

fn default_max_chunk_chars() -> usize {
    1200
}

fn default_overlap() -> usize {
    150
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Paragraphs kept by the similarity prefilter and by rerank
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    8
}

/// Connection settings for an HTTP model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Full URL requests are POSTed to
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Bearer token, if the backend requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_embedding_backend() -> BackendConfig {
    BackendConfig::new(
        "http://localhost:8080/v1/embeddings",
        "sentence-transformers/all-MiniLM-L6-v2",
    )
}

fn default_rerank_backend() -> BackendConfig {
    BackendConfig::new(
        "http://localhost:8080/rerank",
        "cross-encoder/ms-marco-MiniLM-L-2-v2",
    )
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the first call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when neither flags nor RUST_LOG say otherwise
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Locate a config file: `./paper-lens.toml`, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|path| path.is_file())
}

/// `<config_dir>/paper-lens/config.toml`, if the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("paper-lens").join("config.toml"))
}
