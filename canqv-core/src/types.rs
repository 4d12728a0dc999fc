//! Core types for the bus monitor
//!
//! This module defines the raw frame model handed over by the transport and the
//! error type shared by every component of the monitor.

use serde::Serialize;
use std::fmt;

/// Time in seconds, as used for all age and period math
pub type Seconds = f64;

/// Result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Extended frame format flag (bit 31 of the identifier word)
pub const EFF_FLAG: u32 = 0x8000_0000;
/// Remote transmission request flag (bit 30 of the identifier word)
pub const RTR_FLAG: u32 = 0x4000_0000;
/// Valid bits of a standard (11-bit) identifier
pub const SFF_MASK: u32 = 0x0000_07FF;
/// Valid bits of an extended (29-bit) identifier
pub const EFF_MASK: u32 = 0x1FFF_FFFF;

/// Maximum payload of a classic CAN frame
pub const MAX_DLC: usize = 8;

/// Identifier addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// 11-bit identifier
    Standard,
    /// 29-bit identifier
    Extended,
}

impl fmt::Display for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addressing::Standard => write!(f, "standard"),
            Addressing::Extended => write!(f, "extended"),
        }
    }
}

/// Raw CAN frame as delivered by the transport
///
/// The identifier is kept as the full identifier word, including the EFF/RTR
/// classification bits, so that two frames differing only in addressing mode
/// are tracked as different identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Identifier word (address bits plus EFF/RTR flags)
    pub can_id: u32,
    /// Data length code (0-8)
    pub dlc: u8,
    /// Payload storage; only the first `dlc` bytes are meaningful
    pub data: [u8; MAX_DLC],
}

impl Frame {
    /// Build a frame from an identifier word and a payload slice
    ///
    /// Payloads longer than 8 bytes are truncated to the classic CAN limit.
    pub fn new(can_id: u32, payload: &[u8]) -> Self {
        let len = payload.len().min(MAX_DLC);
        let mut data = [0u8; MAX_DLC];
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            can_id,
            dlc: len as u8,
            data,
        }
    }

    /// Build a remote frame (no payload, RTR flag set)
    pub fn remote(can_id: u32, dlc: u8) -> Self {
        Self {
            can_id: can_id | RTR_FLAG,
            dlc: dlc.min(MAX_DLC as u8),
            data: [0u8; MAX_DLC],
        }
    }

    /// The meaningful payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc).min(MAX_DLC)]
    }
}

/// A frame as received from a transport, with an optional source timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Received {
    pub frame: Frame,
    /// Reception time reported by the source (e.g. a replayed log); when absent
    /// the monitor stamps the frame from its own clock
    pub timestamp: Option<Seconds>,
}

impl From<Frame> for Received {
    fn from(frame: Frame) -> Self {
        Self {
            frame,
            timestamp: None,
        }
    }
}

/// Errors that can occur while monitoring
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to receive frame: {0}")]
    Receive(#[source] std::io::Error),

    #[error("Failed to write event log {path:?}: {source}")]
    EventLog {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid filter '{0}'")]
    InvalidFilter(String),

    #[error("Invalid candump line {line}: {reason}")]
    InvalidLogLine { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to render snapshot: {0}")]
    Render(#[source] std::io::Error),
}
