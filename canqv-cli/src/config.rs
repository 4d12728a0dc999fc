//! Configuration file loading and command-line overrides

use anyhow::{Context, Result};
use canqv_core::{CommandPolicy, MonitorConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from a TOML file)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Print the legend and module reference tables around the snapshot
    #[serde(default = "default_true")]
    pub reference: bool,
    /// Clear the screen before every snapshot (text format)
    #[serde(default = "default_true")]
    pub clear: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            reference: true,
            clear: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings given on the command line; `None` keeps the file/default value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_period: Option<f64>,
    pub dead_time: Option<f64>,
    pub event_log: Option<PathBuf>,
    pub no_event_log: bool,
    pub command_policy: Option<String>,
    pub format: Option<OutputFormat>,
    pub no_clear: bool,
}

impl AppConfig {
    /// Apply command-line values on top of the file configuration
    pub fn apply(mut self, overrides: &Overrides) -> Result<Self> {
        if let Some(max_period) = overrides.max_period {
            self.monitor.max_period = max_period;
        }
        if let Some(dead_time) = overrides.dead_time {
            self.monitor.dead_time = dead_time;
        }
        if let Some(path) = &overrides.event_log {
            self.monitor.event_log = Some(path.clone());
        }
        if overrides.no_event_log {
            self.monitor.event_log = None;
        }
        if let Some(policy) = &overrides.command_policy {
            self.monitor.command_policy = CommandPolicy::parse(policy)?;
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
        if overrides.no_clear {
            self.output.clear = false;
        }

        self.monitor.validate()?;
        Ok(self)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .monitor
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}
