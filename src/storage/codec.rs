//! Record framing for the ledger file.
//!
//! The ledger is a plain concatenation of frames with no count header, so
//! the only way to find the last record is to decode until something other
//! than a record comes back. [`Decoded`] keeps the reasons apart: a clean
//! end, a torn final frame, or a complete frame that does not parse.

use std::io::{self, BufRead};

use serde::{Deserialize, Serialize};

use crate::core::{GameRecord, RECORD_SCHEMA_VERSION};
use crate::error::{Result, StatsError};

/// Outcome of decoding one frame from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete, valid record.
    Record(GameRecord),
    /// No bytes left.
    EndOfStream,
    /// Bytes remained but the frame was cut short.
    Truncated {
        /// Number of bytes in the partial frame.
        bytes: usize,
    },
    /// A complete frame that could not be decoded.
    Malformed {
        /// Why decoding failed.
        reason: String,
    },
}

/// Encodes records to frames and decodes them back from a stream.
pub trait RecordCodec: Send + Sync {
    /// Encode one record as a complete frame.
    fn encode(&self, record: &GameRecord) -> Result<Vec<u8>>;

    /// Decode the next frame from `reader`.
    ///
    /// I/O failures are returned as `Err`; every other outcome is a
    /// [`Decoded`] variant.
    fn decode(&self, reader: &mut dyn BufRead) -> io::Result<Decoded>;
}

/// On-disk frame: the record plus its schema version.
#[derive(Debug, Serialize, Deserialize)]
struct RecordFrame {
    v: u8,
    #[serde(flatten)]
    record: GameRecord,
}

/// Newline-delimited JSON frames.
///
/// Each frame is one JSON object followed by `\n`. A frame missing its
/// terminating newline is a torn write.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

impl JsonLinesCodec {
    /// Create a new JSON lines codec.
    pub fn new() -> Self {
        Self
    }
}

impl RecordCodec for JsonLinesCodec {
    fn encode(&self, record: &GameRecord) -> Result<Vec<u8>> {
        let frame = RecordFrame {
            v: RECORD_SCHEMA_VERSION,
            record: *record,
        };
        let mut bytes = serde_json::to_vec(&frame)
            .map_err(|e| StatsError::serde(format!("Failed to serialize record: {}", e)))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode(&self, reader: &mut dyn BufRead) -> io::Result<Decoded> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                return Ok(Decoded::EndOfStream);
            }
            if line.last() != Some(&b'\n') {
                return Ok(Decoded::Truncated { bytes: read });
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(parse_frame(&line));
        }
    }
}

fn parse_frame(line: &[u8]) -> Decoded {
    let frame: RecordFrame = match serde_json::from_slice(line) {
        Ok(frame) => frame,
        Err(e) => {
            return Decoded::Malformed {
                reason: e.to_string(),
            }
        }
    };

    if frame.v == 0 || frame.v > RECORD_SCHEMA_VERSION {
        return Decoded::Malformed {
            reason: format!("unsupported record version {}", frame.v),
        };
    }

    Decoded::Record(frame.record)
}
