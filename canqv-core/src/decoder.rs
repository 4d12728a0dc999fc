//! Payload classification
//!
//! Stateless helpers turning raw identifiers and payload bytes into annotations:
//! addressing mode, module mnemonic and the command-frame predicate.

use crate::config::CommandPolicy;
use crate::modules;
use crate::types::{Addressing, EFF_FLAG};

/// Frame decoder - classifies identifiers and payload bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    policy: CommandPolicy,
}

impl FrameDecoder {
    /// Create a decoder using the given command predicate
    pub fn new(policy: CommandPolicy) -> Self {
        Self { policy }
    }

    /// Addressing mode from the identifier's EFF flag
    pub fn classify_addressing(can_id: u32) -> Addressing {
        if can_id & EFF_FLAG != 0 {
            Addressing::Extended
        } else {
            Addressing::Standard
        }
    }

    /// Mnemonic of the module with this code, or an empty string if unknown
    ///
    /// An empty result means "no annotation", not an error.
    pub fn module_name(byte: u8) -> &'static str {
        modules::lookup(byte).map(|m| m.mnemonic).unwrap_or("")
    }

    /// Whether a first payload byte marks a command frame
    pub fn is_command_byte(&self, byte: u8) -> bool {
        self.policy.matches(byte)
    }

    /// Whether a payload is a command frame (empty payloads never are)
    pub fn is_command(&self, payload: &[u8]) -> bool {
        payload
            .first()
            .map(|&b| self.is_command_byte(b))
            .unwrap_or(false)
    }

    /// Module mnemonic carried in the second payload byte, if any
    pub fn payload_module(payload: &[u8]) -> Option<&'static str> {
        payload
            .get(1)
            .map(|&b| Self::module_name(b))
            .filter(|name| !name.is_empty())
    }
}
