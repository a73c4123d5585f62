//! Configuration file parser for ~/.config/feedping/config.toml.
//!
//! The config file is optional — a missing file yields
//! `Config::default()`. Unknown keys are accepted but logged, since
//! they are almost always typos. Command-line flags override anything
//! set here.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default retention cap per feed when neither config nor flag sets one.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("max_entries_per_feed must be at least 1")]
    ZeroRetention,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be
/// specified; missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the blogroll file (one feed URL per line).
    pub blogroll: Option<PathBuf>,

    /// Path to the snapshot cache file.
    pub cache: Option<PathBuf>,

    /// Whether to raise desktop notifications for new posts.
    pub notify: bool,

    /// How many most-recent entries to retain per feed.
    pub max_entries_per_feed: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blogroll: None,
            cache: None,
            notify: true,
            max_entries_per_feed: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB); anything larger is corrupt.
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse once as a raw table first to flag likely typos
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["blogroll", "cache", "notify", "max_entries_per_feed"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        if config.max_entries_per_feed == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
