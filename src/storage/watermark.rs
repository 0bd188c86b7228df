//! File-backed watermark for minestats.
//!
//! The watermark is stored as a tiny JSON document
//! (`<home>/stats-base.json`). Writes are atomic via temp file + rename so
//! a crash never leaves a half-written value behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::watermark_path;
use crate::error::{Result, StatsError};
use crate::storage::WatermarkStore;

#[derive(Debug, Serialize, Deserialize)]
struct WatermarkFile {
    base_id: u64,
}

/// File-backed watermark store.
#[derive(Debug, Clone)]
pub struct FileWatermark {
    path: PathBuf,
}

impl FileWatermark {
    /// Create a watermark store at the default location.
    ///
    /// Uses `~/.minestats/stats-base.json` or `$MINESTATS_HOME/stats-base.json`.
    pub fn new() -> Result<Self> {
        let path = watermark_path().ok_or_else(|| {
            StatsError::config("Could not determine watermark location (no home directory)")
        })?;
        Ok(Self::with_path(path))
    }

    /// Create a watermark store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the watermark file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl WatermarkStore for FileWatermark {
    fn get(&self) -> Result<u64> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StatsError::storage(&self.path, e)),
        };

        let file: WatermarkFile = serde_json::from_str(&content).map_err(|e| {
            StatsError::serde(format!(
                "Failed to parse watermark {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(file.base_id)
    }

    fn set(&self, value: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StatsError::storage(parent, e))?;
            }
        }

        let json = serde_json::to_string(&WatermarkFile { base_id: value })?;
        let temp_path = self.temp_path();
        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| StatsError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| StatsError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| StatsError::storage(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| StatsError::storage(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), base_id = value, "stored watermark");
        Ok(())
    }
}
