//! Monitor configuration types
//!
//! Everything the cache and the update cycle need is passed in explicitly through
//! [`MonitorConfig`]; there is no process-wide state.

use crate::types::{MonitorError, Result, Seconds};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default event log file
pub const DEFAULT_EVENT_LOG: &str = "canqv-commands.log";

/// Configuration for the frame cache and the update cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Gaps longer than this are not considered a period (seconds)
    #[serde(default = "default_max_period")]
    pub max_period: Seconds,

    /// Identifiers silent for longer than this are evicted (seconds)
    #[serde(default = "default_dead_time")]
    pub dead_time: Seconds,

    /// Minimum time between two renders (seconds)
    #[serde(default = "default_render_interval")]
    pub render_interval: Seconds,

    /// Append-only log for command frames (None disables logging)
    #[serde(default = "default_event_log")]
    pub event_log: Option<PathBuf>,

    /// Rule deciding whether a first payload byte marks a command frame
    #[serde(default)]
    pub command_policy: CommandPolicy,
}

fn default_max_period() -> Seconds {
    2.0
}

fn default_dead_time() -> Seconds {
    10.0
}

fn default_render_interval() -> Seconds {
    0.25
}

fn default_event_log() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_EVENT_LOG))
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_period: default_max_period(),
            dead_time: default_dead_time(),
            render_interval: default_render_interval(),
            event_log: default_event_log(),
            command_policy: CommandPolicy::default(),
        }
    }
}

/// Predicate over the first payload byte gating the event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommandPolicy {
    /// Every frame is a command
    Always,
    /// No frame is a command
    Never,
    /// `byte & mask == value`
    Match { mask: u8, value: u8 },
}

impl Default for CommandPolicy {
    /// High nibble `C` with bit 3 set: the diagnostic request header
    fn default() -> Self {
        CommandPolicy::Match {
            mask: 0xF8,
            value: 0xC8,
        }
    }
}

impl CommandPolicy {
    pub fn matches(&self, byte: u8) -> bool {
        match *self {
            CommandPolicy::Always => true,
            CommandPolicy::Never => false,
            CommandPolicy::Match { mask, value } => byte & mask == value,
        }
    }

    /// Parse `always`, `never` or `MASK:VALUE` (hex)
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(CommandPolicy::Always),
            "never" => Ok(CommandPolicy::Never),
            other => {
                let invalid =
                    || MonitorError::InvalidConfig(format!("invalid command policy '{}'", text));
                let (mask, value) = other.split_once(':').ok_or_else(invalid)?;
                let mask = u8::from_str_radix(mask.trim_start_matches("0x"), 16)
                    .map_err(|_| invalid())?;
                let value = u8::from_str_radix(value.trim_start_matches("0x"), 16)
                    .map_err(|_| invalid())?;
                Ok(CommandPolicy::Match { mask, value })
            }
        }
    }
}

impl MonitorConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the maximum period
    pub fn with_max_period(mut self, max_period: Seconds) -> Self {
        self.max_period = max_period;
        self
    }

    /// Builder method: set the eviction timeout
    pub fn with_dead_time(mut self, dead_time: Seconds) -> Self {
        self.dead_time = dead_time;
        self
    }

    /// Builder method: set the render interval
    pub fn with_render_interval(mut self, render_interval: Seconds) -> Self {
        self.render_interval = render_interval;
        self
    }

    /// Builder method: set or disable the event log
    pub fn with_event_log(mut self, path: Option<PathBuf>) -> Self {
        self.event_log = path;
        self
    }

    /// Builder method: set the command predicate
    pub fn with_command_policy(mut self, policy: CommandPolicy) -> Self {
        self.command_policy = policy;
        self
    }

    /// Reject durations the cache cannot work with
    pub fn validate(&self) -> Result<()> {
        let positive = [("max_period", self.max_period), ("dead_time", self.dead_time)];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MonitorError::InvalidConfig(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }
        if !self.render_interval.is_finite() || self.render_interval < 0.0 {
            return Err(MonitorError::InvalidConfig(format!(
                "render_interval must not be negative, got {}",
                self.render_interval
            )));
        }
        Ok(())
    }
}
