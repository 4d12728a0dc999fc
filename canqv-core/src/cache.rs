//! Per-identifier frame cache
//!
//! Keeps the most recent frame of every live identifier, estimates each
//! identifier's transmission period and ages out identifiers that went quiet.
//!
//! Entries live in a vector sorted by identifier word: lookups (one per received
//! frame) are binary searches, and rendering walks the vector in order without a
//! separate sort. Inserting a new identifier is the rare path.

use crate::types::{Addressing, Frame, Seconds, MAX_DLC};
use serde::Serialize;

/// Cached state of one identifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Identifier word, including EFF/RTR flags as received
    pub can_id: u32,
    /// Data length of the latest frame
    pub dlc: u8,
    /// Payload of the latest frame
    pub data: [u8; MAX_DLC],
    /// Time of the latest observation
    pub last_seen: Seconds,
    /// Estimated inter-arrival time; None while unknown
    pub period: Option<Seconds>,
    /// Payload changed since the last snapshot
    pub dirty: bool,
}

impl CacheEntry {
    fn from_frame(frame: &Frame, now: Seconds) -> Self {
        Self {
            can_id: frame.can_id,
            dlc: frame.dlc,
            data: frame.data,
            last_seen: now,
            period: None,
            dirty: true,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.dlc).min(MAX_DLC)]
    }

    pub fn addressing(&self) -> Addressing {
        crate::decoder::FrameDecoder::classify_addressing(self.can_id)
    }

    /// Time since the entry was last observed
    pub fn age(&self, now: Seconds) -> Seconds {
        now - self.last_seen
    }
}

/// Ordered collection of cache entries, unique by identifier
#[derive(Debug, Clone, Default)]
pub struct FrameCache {
    entries: Vec<CacheEntry>,
    max_period: Seconds,
}

impl FrameCache {
    /// Create an empty cache; gaps above `max_period` are not treated as periods
    pub fn new(max_period: Seconds) -> Self {
        Self {
            entries: Vec::new(),
            max_period,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by identifier word
    pub fn get(&self, can_id: u32) -> Option<&CacheEntry> {
        self.position(can_id).ok().map(|index| &self.entries[index])
    }

    /// Read-only ordered view, without consuming the dirty flags
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    fn position(&self, can_id: u32) -> std::result::Result<usize, usize> {
        self.entries.binary_search_by_key(&can_id, |entry| entry.can_id)
    }

    /// Merge a received frame into the cache
    ///
    /// Unknown identifiers are inserted at their sorted position with an unknown
    /// period. Known identifiers get their period re-estimated from the gap since
    /// the previous observation and their payload replaced.
    pub fn integrate(&mut self, frame: &Frame, now: Seconds) -> &CacheEntry {
        match self.position(frame.can_id) {
            Ok(index) => {
                let max_period = self.max_period;
                let entry = &mut self.entries[index];

                let gap = now - entry.last_seen;
                entry.period = if gap <= max_period { Some(gap) } else { None };

                if entry.payload() != frame.payload() {
                    entry.dirty = true;
                }
                entry.dlc = frame.dlc;
                entry.data = frame.data;
                entry.last_seen = now;

                log::trace!("Updated 0x{:X}, period {:?}", frame.can_id, entry.period);
                &self.entries[index]
            }
            Err(index) => {
                log::debug!("New identifier 0x{:X}", frame.can_id);
                self.entries.insert(index, CacheEntry::from_frame(frame, now));
                &self.entries[index]
            }
        }
    }

    /// Evict entries silent for more than `dead_time` and forget stale periods
    ///
    /// A surviving entry silent for more than twice its period has its period
    /// reset to unknown. Returns the number of evicted entries.
    pub fn sweep(&mut self, now: Seconds, dead_time: Seconds) -> usize {
        let before = self.entries.len();

        self.entries.retain_mut(|entry| {
            let age = now - entry.last_seen;
            if age > dead_time {
                log::debug!("Evicting 0x{:X}, silent for {:.3}s", entry.can_id, age);
                return false;
            }
            if let Some(period) = entry.period {
                if age > 2.0 * period {
                    entry.period = None;
                }
            }
            true
        });

        before - self.entries.len()
    }

    /// Ordered copy of all entries for rendering
    ///
    /// The copy carries the dirty flags as they were; the cache's own flags are
    /// cleared, so every change is reported by exactly one snapshot.
    pub fn snapshot(&mut self) -> Vec<CacheEntry> {
        let snapshot = self.entries.clone();
        for entry in &mut self.entries {
            entry.dirty = false;
        }
        snapshot
    }
}
