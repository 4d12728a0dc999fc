//! CAN bus quick-view monitor library
//!
//! Passively watches a CAN bus and keeps a live, per-identifier picture of it:
//! - Caches the latest frame of every identifier, sorted by identifier
//! - Estimates each identifier's transmission period
//! - Ages out identifiers that stop transmitting
//! - Annotates payloads with module names and flags command frames
//! - Appends command frames to a text event log
//!
//! The library does NOT open sockets or draw on a terminal. Frames come in
//! through a [`FrameSource`] and snapshots go out through a [`Renderer`]; both
//! are provided by the application layer (canqv-cli).
//!
//! # Example Usage
//!
//! ```
//! use canqv_core::{Frame, ManualClock, MonitorConfig, UpdateCycle};
//!
//! let clock = ManualClock::new(0.0);
//! let config = MonitorConfig::new().with_event_log(None);
//! let mut cycle = UpdateCycle::new(config, &clock).unwrap();
//!
//! let snapshot = cycle.process(Frame::new(0x100, &[0xCB, 0x40]).into()).unwrap();
//! assert_eq!(snapshot.entries[0].module, Some("CEM"));
//! ```

// Public modules
pub mod cache;
pub mod candump;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod decoder;
pub mod event_log;
pub mod filter;
pub mod modules;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheEntry, FrameCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CommandPolicy, MonitorConfig};
pub use cycle::{
    AnnotatedEntry, CycleSummary, FrameSource, IterSource, RenderSnapshot, Renderer, UpdateCycle,
};
pub use decoder::FrameDecoder;
pub use event_log::EventLogger;
pub use filter::FilterSpec;
pub use types::{Addressing, Frame, MonitorError, Received, Result, Seconds};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
