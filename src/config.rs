//! Configuration loading for minestats.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. User config (`~/.minestats/config.toml`)
//! 3. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::StandardSize;
use crate::error::{FailOpen, Result, StatsError};

/// Main configuration struct for minestats.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Standard board size.
    pub board: BoardConfig,
    /// Ledger storage behavior.
    pub storage: StorageConfig,
}

/// The standard board size that progressive and fixed-size statistics are
/// measured against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BoardConfig {
    pub width: u32,
    pub height: u32,
    pub mines: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let standard = StandardSize::default();
        Self {
            width: standard.width,
            height: standard.height,
            mines: standard.mines,
        }
    }
}

/// Ledger storage configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Fail reads on a malformed record instead of stopping at it.
    pub strict_reads: bool,
    /// Sync the ledger to disk after every append.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            strict_reads: false,
            sync_writes: true,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. User config (`~/.minestats/config.toml`)
    /// 3. Defaults
    ///
    /// A config file that exists but cannot be read or parsed is an error.
    pub fn try_load() -> Result<Self> {
        match minestats_home() {
            Some(home) => Self::try_load_from_home(&home),
            None => Ok(Self::from_env()),
        }
    }

    /// Load configuration using a specific home directory.
    pub fn try_load_from_home(home: &Path) -> Result<Self> {
        let mut config = Config::default();

        let config_path = home.join("config.toml");
        if config_path.exists() {
            config = config.merge(Self::load_from_file(&config_path)?);
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`Config::try_load_from_home`], but an unusable config file is
    /// skipped with a warning.
    pub fn load_from_home(home: &Path) -> Self {
        Self::try_load_from_home(home).fail_open_with("loading config", Self::from_env())
    }

    /// Defaults with environment overrides applied.
    fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load config from a specific file path.
    fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| StatsError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| StatsError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(n) = env_u32("MINESTATS_BOARD_WIDTH", self.board.width) {
            self.board.width = n;
        }
        if let Some(n) = env_u32("MINESTATS_BOARD_HEIGHT", self.board.height) {
            self.board.height = n;
        }
        if let Some(n) = env_u32("MINESTATS_BOARD_MINES", self.board.mines) {
            self.board.mines = n;
        }
        if let Some(b) = env_bool("MINESTATS_STRICT_READS", self.storage.strict_reads) {
            self.storage.strict_reads = b;
        }
        if let Some(b) = env_bool("MINESTATS_SYNC_WRITES", self.storage.sync_writes) {
            self.storage.sync_writes = b;
        }
    }

    /// Merge another config into this one.
    ///
    /// Values from `other` take precedence where they differ from the
    /// default. A lower layer's customization therefore survives an upper
    /// layer that spells out the default value.
    fn merge(mut self, other: Config) -> Self {
        let default_board = BoardConfig::default();
        if other.board.width != default_board.width {
            self.board.width = other.board.width;
        }
        if other.board.height != default_board.height {
            self.board.height = other.board.height;
        }
        if other.board.mines != default_board.mines {
            self.board.mines = other.board.mines;
        }

        let default_storage = StorageConfig::default();
        if other.storage.strict_reads != default_storage.strict_reads {
            self.storage.strict_reads = other.storage.strict_reads;
        }
        if other.storage.sync_writes != default_storage.sync_writes {
            self.storage.sync_writes = other.storage.sync_writes;
        }

        self
    }

    /// Load config with fail-open behavior.
    ///
    /// If the config file is unusable, returns defaults with environment
    /// overrides still applied.
    pub fn load_fail_open() -> Self {
        Self::try_load().fail_open_with("loading config", Self::from_env())
    }

    /// The validated standard board size.
    ///
    /// Logs a warning when the size is also a named difficulty, since
    /// progressive and named statistics then overlap for that board.
    pub fn standard_size(&self) -> Result<StandardSize> {
        let standard = StandardSize::new(self.board.width, self.board.height, self.board.mines)?;
        if let Some(difficulty) = standard.named_difficulty() {
            tracing::warn!(
                standard = %standard,
                difficulty = difficulty.as_str(),
                "standard size coincides with a named difficulty"
            );
        }
        Ok(standard)
    }

    /// The standard size, falling back to the default when invalid.
    pub fn standard_size_fail_open(&self) -> StandardSize {
        self.standard_size()
            .fail_open_default("validating standard board size")
    }
}

fn env_u32(name: &str, current: u32) -> Option<u32> {
    let val = env::var(name).ok()?;
    match val.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(
                var = name,
                value = %val,
                current,
                "invalid value, expected a non-negative integer"
            );
            None
        }
    }
}

fn env_bool(name: &str, current: bool) -> Option<bool> {
    let val = env::var(name).ok()?;
    match val.as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            tracing::warn!(
                var = name,
                value = %val,
                current,
                "invalid value, expected true/false/1/0"
            );
            None
        }
    }
}

/// Get the minestats home directory.
///
/// Uses `MINESTATS_HOME` if set, otherwise `~/.minestats`. Falls back to a
/// per-user directory under `/tmp` when no home directory is available.
///
/// # Validation
///
/// If `MINESTATS_HOME` is set, it must be non-empty. Relative paths are
/// canonicalized when they exist.
pub fn minestats_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("MINESTATS_HOME") {
        if home.is_empty() {
            tracing::warn!("MINESTATS_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("MINESTATS_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".minestats"));
    }

    // Containers and minimal environments may have no HOME
    let fallback_path = fallback_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

#[cfg(unix)]
fn fallback_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/minestats-{}", uid))
}

#[cfg(not(unix))]
fn fallback_home() -> PathBuf {
    std::env::temp_dir().join("minestats")
}

/// Get the ledger path (`<home>/stats`).
pub fn ledger_path() -> Option<PathBuf> {
    minestats_home().map(|h| h.join("stats"))
}

/// Get the watermark path (`<home>/stats-base.json`).
pub fn watermark_path() -> Option<PathBuf> {
    minestats_home().map(|h| h.join("stats-base.json"))
}

/// Get the crash log path (`<home>/crash.log`).
pub fn crash_log_path() -> Option<PathBuf> {
    minestats_home().map(|h| h.join("crash.log"))
}
