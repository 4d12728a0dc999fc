//! Frame transports: live SocketCAN interfaces and candump log replay

use anyhow::{Context, Result};
use canqv_core::{candump, FilterSpec, MonitorError, Received};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::time::Duration;

#[cfg(target_os = "linux")]
pub use socket::SocketSource;

/// Iterator over the frames of a candump log file
pub struct ReplayFrames<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
    realtime: bool,
    previous: Option<f64>,
    filters: Vec<FilterSpec>,
}

impl ReplayFrames<BufReader<File>> {
    /// Open a candump log; with `realtime` the original frame spacing is kept
    pub fn open(path: &Path, realtime: bool) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open replay file: {:?}", path))?;
        log::info!("Replaying {:?}", path);
        Ok(Self::new(BufReader::new(file), realtime))
    }
}

impl<R: BufRead> ReplayFrames<R> {
    pub fn new(reader: R, realtime: bool) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            realtime,
            previous: None,
            filters: Vec::new(),
        }
    }

    /// Only yield frames passed by at least one of `filters`, as a socket would
    pub fn with_filters(mut self, filters: &[FilterSpec]) -> Self {
        self.filters = filters.to_vec();
        self
    }

    fn passes(&self, can_id: u32) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| f.accepts(can_id))
    }

    fn pace(&mut self, timestamp: Option<f64>) {
        let Some(now) = timestamp else {
            return;
        };
        if let Some(previous) = self.previous.replace(now) {
            let gap = now - previous;
            if self.realtime && gap > 0.0 {
                std::thread::sleep(Duration::from_secs_f64(gap));
            }
        }
    }
}

impl<R: BufRead> Iterator for ReplayFrames<R> {
    type Item = canqv_core::Result<Received>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(MonitorError::Receive(e))),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let received = match candump::parse_line(trimmed, self.line_no) {
                Ok(received) => received,
                Err(e) => return Some(Err(e)),
            };
            if !self.passes(received.frame.can_id) {
                log::trace!("Filtered out 0x{:X}", received.frame.can_id);
                continue;
            }
            self.pace(received.timestamp);
            return Some(Ok(received));
        }
    }
}

#[cfg(target_os = "linux")]
mod socket {
    use anyhow::{Context, Result};
    use canqv_core::{FilterSpec, Frame, FrameSource, MonitorError, Received};
    use socketcan::{CanAddr, CanFilter, CanSocket, EmbeddedFrame as _, Frame as _, Socket, SocketOptions};
    use std::io;

    /// Raw CAN socket bound to one interface, or to all of them
    pub struct SocketSource {
        socket: CanSocket,
        device: String,
    }

    impl SocketSource {
        /// Open `device` ("any" binds to every interface) and install the filters
        pub fn open(device: &str, filters: &[FilterSpec]) -> Result<Self> {
            let socket = if device == "any" {
                CanSocket::open_addr(&CanAddr::new(0))
                    .context("Failed to open CAN socket on all interfaces")?
            } else {
                CanSocket::open(device).with_context(|| format!("device '{}' not found", device))?
            };

            if !filters.is_empty() {
                let can_filters: Vec<CanFilter> = filters
                    .iter()
                    .map(|f| CanFilter::new(f.can_id, f.can_mask))
                    .collect();
                socket
                    .set_filters(&can_filters)
                    .with_context(|| format!("setsockopt {} filters", filters.len()))?;
                for filter in filters {
                    log::debug!("Installed filter {}", filter);
                }
            }

            log::info!("Listening on {}", device);
            Ok(Self {
                socket,
                device: device.to_string(),
            })
        }
    }

    impl FrameSource for SocketSource {
        fn receive(&mut self) -> canqv_core::Result<Option<Received>> {
            match self.socket.read_frame() {
                Ok(frame) => Ok(Some(Frame::new(frame.id_word(), frame.data()).into())),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    log::info!("{} closed", self.device);
                    Ok(None)
                }
                Err(e) => Err(MonitorError::Receive(e)),
            }
        }
    }
}
