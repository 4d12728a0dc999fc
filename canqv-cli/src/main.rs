//! canqv - CAN bus quick view
//!
//! Command-line front end for the canqv-core library. It adds:
//! - Argument and configuration file handling
//! - SocketCAN transport with identifier filters (Linux)
//! - candump log replay
//! - Terminal and JSON renderers

use anyhow::{Context, Result};
use canqv_core::{FilterSpec, FrameSource, IterSource, Renderer, SystemClock, UpdateCycle};
use clap::Parser;
use std::io;
use std::path::PathBuf;

mod config;
mod render;
mod transport;

use config::{AppConfig, OutputFormat, Overrides};

/// canqv - CAN spy: live per-identifier view of a CAN bus
#[derive(Parser, Debug)]
#[command(name = "canqv")]
#[command(about = "Live per-identifier view of a CAN bus", long_about = None)]
#[command(version)]
struct Args {
    /// CAN device to listen on ("any" for all interfaces)
    #[arg(value_name = "DEVICE")]
    device: Option<String>,

    /// Receive filters: hex ID, ID/MASK or ID:MASK (more than 3 digits is extended)
    #[arg(value_name = "ID[/MASK]")]
    filters: Vec<String>,

    /// Consider TIME as maximum period; slower rates are one-time identifiers [default: 2]
    #[arg(short = 'm', long = "maxperiod", value_name = "SECONDS")]
    max_period: Option<f64>,

    /// Remove identifiers after TIME of silence [default: 10]
    #[arg(short = 'x', long = "remove", value_name = "SECONDS")]
    remove: Option<f64>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replay a candump log file instead of listening on a device
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Keep the original frame spacing while replaying
    #[arg(long, requires = "replay")]
    realtime: bool,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Do not clear the screen between snapshots
    #[arg(long)]
    no_clear: bool,

    /// Append command frames to FILE
    #[arg(long, value_name = "FILE", conflicts_with = "no_event_log")]
    event_log: Option<PathBuf>,

    /// Do not log command frames
    #[arg(long)]
    no_event_log: bool,

    /// Command frame rule: always, never or MASK:VALUE (hex)
    #[arg(long, value_name = "POLICY")]
    command_policy: Option<String>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all diagnostics except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("canqv v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using canqv-core v{}", canqv_core::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let overrides = Overrides {
        max_period: args.max_period,
        dead_time: args.remove,
        event_log: args.event_log.clone(),
        no_event_log: args.no_event_log,
        command_policy: args.command_policy.clone(),
        format: args.format,
        no_clear: args.no_clear,
    };
    let config = config.apply(&overrides)?;
    log::debug!("Configuration: {:?}", config);

    let filters = args
        .filters
        .iter()
        .map(|token| FilterSpec::parse(token))
        .collect::<canqv_core::Result<Vec<_>>>()?;

    let mut source = open_source(&args, &filters)?;
    let mut renderer: Box<dyn Renderer> = match config.output.format {
        OutputFormat::Text => {
            let text = render::TextRenderer::new(io::stdout(), config.output.reference);
            if config.output.clear {
                Box::new(text)
            } else {
                Box::new(text.without_clear())
            }
        }
        OutputFormat::Json => Box::new(render::JsonRenderer::new(io::stdout())),
    };

    let mut cycle = UpdateCycle::new(config.monitor, SystemClock)?;
    cycle
        .run(source.as_mut(), renderer.as_mut())
        .context("Monitoring stopped")?;
    Ok(())
}

/// Pick the frame source: a replay file, or a live device
fn open_source(args: &Args, filters: &[FilterSpec]) -> Result<Box<dyn FrameSource>> {
    if let Some(path) = &args.replay {
        if let Some(device) = &args.device {
            log::warn!("Replaying {:?}; device '{}' is ignored", path, device);
        }
        let frames = transport::ReplayFrames::open(path, args.realtime)?.with_filters(filters);
        return Ok(Box::new(IterSource(frames)));
    }

    let device = args.device.as_deref().unwrap_or("any");
    open_device(device, filters)
}

#[cfg(target_os = "linux")]
fn open_device(device: &str, filters: &[FilterSpec]) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(transport::SocketSource::open(device, filters)?))
}

#[cfg(not(target_os = "linux"))]
fn open_device(device: &str, _filters: &[FilterSpec]) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "Cannot open '{}': live capture needs SocketCAN (Linux); use --replay",
        device
    )
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
