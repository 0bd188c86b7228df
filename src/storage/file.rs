//! File-backed ledger for minestats.
//!
//! Records are appended as frames to a single file (`<home>/stats`).
//! Reads decode from the front and stop at the first frame that is not a
//! complete record, so a write torn by a crash never hides earlier history.
//! Appends first cut a torn final frame off, so later records stay readable.
//! Compaction rewrites the file via temp file + rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::ledger_path;
use crate::core::GameRecord;
use crate::error::{Result, StatsError};
use crate::storage::codec::{Decoded, JsonLinesCodec, RecordCodec};
use crate::storage::LedgerStore;

const TAIL_CHUNK: usize = 4096;

/// How `read_all` treats a complete frame that fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Stop and return everything decoded so far.
    #[default]
    Lenient,
    /// Fail with [`StatsError::Corrupt`]. A torn final frame is still dropped.
    Strict,
}

/// How a ledger scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTail {
    /// Every byte decoded into records.
    Clean,
    /// The final frame was cut short.
    Truncated {
        /// Size of the partial frame in bytes.
        bytes: usize,
    },
    /// A complete frame failed to decode; nothing after it was read.
    Malformed {
        /// 1-based frame number.
        frame: usize,
        /// Decoder message.
        reason: String,
    },
}

/// Result of scanning the ledger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerScan {
    /// All records decoded before the tail.
    pub records: Vec<GameRecord>,
    /// How the scan ended.
    pub tail: ScanTail,
}

impl LedgerScan {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            tail: ScanTail::Clean,
        }
    }
}

/// File-backed append-only ledger.
///
/// All file access goes through one in-process lock, so appends land in
/// submission order and never interleave with reads or compaction.
#[derive(Debug)]
pub struct FileLedger<C: RecordCodec = JsonLinesCodec> {
    /// Path to the ledger file.
    path: PathBuf,
    /// Frame encoder/decoder.
    codec: C,
    /// Treatment of malformed frames on read.
    read_mode: ReadMode,
    /// Whether each append is fsync'd.
    sync_writes: bool,
    /// Serializes every file operation.
    lock: Mutex<()>,
}

impl FileLedger<JsonLinesCodec> {
    /// Create a ledger at the default location.
    ///
    /// Uses `~/.minestats/stats` or `$MINESTATS_HOME/stats`.
    pub fn new() -> Result<Self> {
        let path = ledger_path().ok_or_else(|| {
            StatsError::config("Could not determine ledger location (no home directory)")
        })?;
        Ok(Self::with_path(path))
    }

    /// Create a ledger at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::with_codec(path, JsonLinesCodec::new())
    }
}

impl<C: RecordCodec> FileLedger<C> {
    /// Create a ledger at a custom path with a custom codec.
    pub fn with_codec(path: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            path: path.into(),
            codec,
            read_mode: ReadMode::default(),
            sync_writes: true,
            lock: Mutex::new(()),
        }
    }

    /// Set how malformed frames are treated on read.
    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    /// Set whether appends are fsync'd.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Get the path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the configured read mode.
    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Scan the ledger and report how the scan ended.
    pub fn scan(&self) -> Result<LedgerScan> {
        let _guard = self.guard();
        self.scan_locked()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scan_locked(&self) -> Result<LedgerScan> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LedgerScan::empty()),
            Err(e) => return Err(StatsError::storage(&self.path, e)),
        };

        let mut reader = BufReader::new(file);
        let mut records = Vec::new();

        let tail = loop {
            let decoded = self
                .codec
                .decode(&mut reader)
                .map_err(|e| StatsError::storage(&self.path, e))?;

            match decoded {
                Decoded::Record(record) => records.push(record),
                Decoded::EndOfStream => break ScanTail::Clean,
                Decoded::Truncated { bytes } => {
                    tracing::warn!(
                        path = %self.path.display(),
                        record_count = records.len(),
                        bytes,
                        "detected torn tail while scanning ledger"
                    );
                    break ScanTail::Truncated { bytes };
                }
                Decoded::Malformed { reason } => {
                    let frame = records.len() + 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        frame,
                        reason = %reason,
                        "malformed frame while scanning ledger, ignoring the rest"
                    );
                    break ScanTail::Malformed { frame, reason };
                }
            }
        };

        tracing::debug!(
            path = %self.path.display(),
            record_count = records.len(),
            "scanned ledger"
        );

        Ok(LedgerScan { records, tail })
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StatsError::storage(parent, e))?;
            }
        }
        Ok(())
    }

    /// Cut a torn final frame off before appending.
    ///
    /// Truncates back to just after the last `\n` so the next frame starts
    /// on its own line. Returns the number of bytes removed.
    fn truncate_torn_tail(&self, file: &mut File) -> io::Result<u64> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(0);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(0);
        }

        // Walk backwards in chunks to the last frame boundary
        let mut buf = vec![0u8; TAIL_CHUNK];
        let mut end = len;
        let mut keep = 0;
        while end > 0 {
            let start = end.saturating_sub(TAIL_CHUNK as u64);
            let chunk = &mut buf[..(end - start) as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(chunk)?;
            if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
                keep = start + pos as u64 + 1;
                break;
            }
            end = start;
        }

        file.set_len(keep)?;
        Ok(len - keep)
    }

    /// Get the path for the temp file used during compaction.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stats".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl<C: RecordCodec> LedgerStore for FileLedger<C> {
    fn append(&self, record: &GameRecord) -> Result<()> {
        let bytes = self.codec.encode(record)?;

        let _guard = self.guard();
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| StatsError::storage(&self.path, e))?;

        let dropped = self
            .truncate_torn_tail(&mut file)
            .map_err(|e| StatsError::storage(&self.path, e))?;
        if dropped > 0 {
            tracing::warn!(
                path = %self.path.display(),
                bytes = dropped,
                "truncated torn tail before append"
            );
        }

        // One write per frame keeps frame boundaries intact.
        file.seek(SeekFrom::End(0))
            .and_then(|_| file.write_all(&bytes))
            .map_err(|e| StatsError::storage(&self.path, e))?;
        if self.sync_writes {
            file.sync_data()
                .map_err(|e| StatsError::storage(&self.path, e))?;
        }

        tracing::debug!(
            path = %self.path.display(),
            id = record.id,
            bytes = bytes.len(),
            "appended game record"
        );
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<GameRecord>> {
        let scan = self.scan()?;
        match (self.read_mode, scan.tail) {
            (ReadMode::Strict, ScanTail::Malformed { frame, reason }) => {
                Err(StatsError::corrupt(&self.path, frame, reason))
            }
            _ => Ok(scan.records),
        }
    }

    fn delete_all(&self) -> Result<()> {
        let _guard = self.guard();

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StatsError::storage(&self.path, e)),
        }

        // Also clean up any leftover compaction file
        let temp_path = self.temp_path();
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }

    fn replace_all(&self, records: &[GameRecord]) -> Result<()> {
        let mut bytes = Vec::new();
        for record in records {
            bytes.extend(self.codec.encode(record)?);
        }

        let _guard = self.guard();
        self.ensure_parent()?;

        let temp_path = self.temp_path();
        {
            let mut file =
                File::create(&temp_path).map_err(|e| StatsError::storage(&temp_path, e))?;
            file.write_all(&bytes)
                .map_err(|e| StatsError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| StatsError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &self.path).map_err(|e| StatsError::storage(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            record_count = records.len(),
            "rewrote ledger"
        );
        Ok(())
    }
}
