//! Append-only log of command frames
//!
//! The file is opened, written and closed for every record, so it survives
//! being rotated or deleted while the monitor runs.

use crate::decoder::FrameDecoder;
use crate::types::{Addressing, MonitorError, Result, EFF_MASK, SFF_MASK};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Writes one text line per command frame
#[derive(Debug, Clone)]
pub struct EventLogger {
    path: PathBuf,
}

impl EventLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record for this frame
    ///
    /// The handle is released before returning, on success and on failure.
    pub fn append(&self, can_id: u32, payload: &[u8]) -> Result<()> {
        let record = format_record(can_id, payload);
        let to_error = |source| MonitorError::EventLog {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(to_error)?;
        writeln!(file, "{}", record).map_err(to_error)?;

        log::trace!("Logged command frame to {:?}: {}", self.path, record);
        Ok(())
    }
}

/// Identifier column: 8 hex digits for extended, 3 for standard identifiers
pub fn format_identifier(can_id: u32) -> String {
    match FrameDecoder::classify_addressing(can_id) {
        Addressing::Extended => format!("{:08x}", can_id & EFF_MASK),
        Addressing::Standard => format!("{:03x}", can_id & SFF_MASK),
    }
}

/// `IDENTIFIER:  b0  MOD  b2 ...`, the second byte replaced by its module name
pub fn format_record(can_id: u32, payload: &[u8]) -> String {
    let mut line = format!("{}:", format_identifier(can_id));
    for (index, byte) in payload.iter().enumerate() {
        let name = if index == 1 {
            FrameDecoder::module_name(*byte)
        } else {
            ""
        };
        if name.is_empty() {
            line.push_str(&format!("  {:02x}", byte));
        } else {
            line.push_str(&format!("  {}", name));
        }
    }
    line
}
