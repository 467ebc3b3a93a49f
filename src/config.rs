//! Configuration management for hnharvest.
//!
//! `Settings` holds resolved runtime values. `Config` is the optional config
//! file (TOML or JSON) whose fields, when present, override the defaults.
//! Command-line flags are applied last by the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scrapers::DEFAULT_API_BASE;
use crate::services::{EnrichConfig, IngestConfig};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "hackernews_stories.db";

/// Default checkpoint filename.
pub const DEFAULT_CHECKPOINT_FILENAME: &str = "last_processed_id.txt";

/// Configuration errors. These stop the process before any work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Checkpoint filename.
    pub checkpoint_filename: String,
    /// Item API base URL.
    pub api_base_url: String,
    /// User agent override (None = default, "impersonate" = browser).
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// IDs per ingestion chunk.
    pub chunk_size: u64,
    /// Pause between chunks in milliseconds.
    pub chunk_delay_ms: u64,
    /// Concurrent item fetches.
    pub ingest_workers: usize,
    /// Records per enrichment batch.
    pub batch_size: usize,
    /// Concurrent page fetches.
    pub enrich_workers: usize,
    /// Failed attempts before a URL is no longer selected.
    pub max_enrich_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to ~/Documents/hnharvest/ for user data
        // Falls back gracefully: Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hnharvest");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            checkpoint_filename: DEFAULT_CHECKPOINT_FILENAME.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            user_agent: None,
            request_timeout: 10,
            chunk_size: 1000,
            chunk_delay_ms: 100,
            ingest_workers: 2,
            batch_size: 50,
            enrich_workers: 2,
            max_enrich_attempts: 3,
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Get the full path to the checkpoint file.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join(&self.checkpoint_filename)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.ingest_workers == 0 || self.enrich_workers == 0 {
            return Err(ConfigError::Invalid("worker counts must be at least 1".into()));
        }
        if self.max_enrich_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_enrich_attempts must be at least 1".into(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout must be at least 1 second".into(),
            ));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| ConfigError::Invalid(format!("api_base_url: {}", e)))?;
        Ok(())
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            chunk_size: self.chunk_size,
            workers: self.ingest_workers,
            chunk_delay: Duration::from_millis(self.chunk_delay_ms),
            max_chunks: None,
        }
    }

    pub fn enrich_config(&self) -> EnrichConfig {
        EnrichConfig {
            batch_size: self.batch_size,
            workers: self.enrich_workers,
            max_attempts: self.max_enrich_attempts,
            max_batches: None,
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Checkpoint filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
    /// Item API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrich_workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_enrich_attempts: Option<u32>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers hnharvest config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("hnharvest").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring discovered config: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found, use defaults
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// TOML for `.toml` files, JSON otherwise.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
            _ => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref checkpoint) = self.checkpoint {
            settings.checkpoint_filename = checkpoint.clone();
        }
        if let Some(ref api_base_url) = self.api_base_url {
            settings.api_base_url = api_base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(chunk_size) = self.chunk_size {
            settings.chunk_size = chunk_size;
        }
        if let Some(delay) = self.chunk_delay_ms {
            settings.chunk_delay_ms = delay;
        }
        if let Some(workers) = self.ingest_workers {
            settings.ingest_workers = workers;
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(workers) = self.enrich_workers {
            settings.enrich_workers = workers;
        }
        if let Some(attempts) = self.max_enrich_attempts {
            settings.max_enrich_attempts = attempts;
        }
    }
}

/// Options controlling how settings are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (skips discovery; errors are fatal).
    pub config_path: Option<PathBuf>,
    /// Data directory override.
    pub target: Option<PathBuf>,
}

/// Load settings from defaults, config file and the `--target` override.
pub async fn load_settings(options: &LoadOptions) -> Result<Settings, ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref target) = options.target {
        settings.data_dir = resolve_target_dir(target);
    }

    Ok(settings)
}

/// Resolve a `--target` path to a directory.
/// If path points to a .db file, its parent is used and the filename kept.
fn resolve_target_dir(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    if path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
    {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path
    }
}
