//! Update cycle
//!
//! Drives the monitor: every received frame is stamped and merged into the
//! cache; at most once per render interval the cache is swept, annotated and
//! handed to the renderer, and command frames are appended to the event log.
//!
//! There is no timer. Sweeping and rendering only happen when a frame arrives,
//! so a silent bus leaves the last rendered screen untouched.

use crate::cache::{CacheEntry, FrameCache};
use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::decoder::FrameDecoder;
use crate::event_log::EventLogger;
use crate::types::{Addressing, Received, Result, Seconds};
use serde::Serialize;

/// Blocking frame transport
pub trait FrameSource {
    /// Next frame; `Ok(None)` at end of stream
    fn receive(&mut self) -> Result<Option<Received>>;
}

/// Frame source backed by an iterator
pub struct IterSource<I>(pub I);

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = Result<Received>>,
{
    fn receive(&mut self) -> Result<Option<Received>> {
        self.0.next().transpose()
    }
}

/// Consumer of annotated snapshots
pub trait Renderer {
    fn render(&mut self, snapshot: &RenderSnapshot) -> Result<()>;
}

/// A cache entry with its decoded annotations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedEntry {
    #[serde(flatten)]
    pub entry: CacheEntry,
    pub addressing: Addressing,
    /// Seconds since the entry was last seen
    pub age: Seconds,
    /// Module named by the second payload byte
    pub module: Option<&'static str>,
    /// First payload byte classified as a command
    pub command: bool,
}

/// Everything the renderer gets for one screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub now: Seconds,
    /// Entries evicted by the sweep preceding this snapshot
    pub evicted: usize,
    pub entries: Vec<AnnotatedEntry>,
}

/// Counters reported when the cycle ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub frames: u64,
    pub renders: u64,
    pub evicted: u64,
    pub events_logged: u64,
    pub log_failures: u64,
}

/// The monitor loop state
pub struct UpdateCycle<C: Clock> {
    config: MonitorConfig,
    cache: FrameCache,
    decoder: FrameDecoder,
    logger: Option<EventLogger>,
    clock: C,
    last_render: Option<Seconds>,
    summary: CycleSummary,
}

impl<C: Clock> UpdateCycle<C> {
    /// Create a cycle; the configuration must pass [`MonitorConfig::validate`]
    pub fn new(config: MonitorConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: FrameCache::new(config.max_period),
            decoder: FrameDecoder::new(config.command_policy),
            logger: config.event_log.clone().map(EventLogger::new),
            clock,
            last_render: None,
            summary: CycleSummary::default(),
            config,
        })
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    pub fn summary(&self) -> CycleSummary {
        self.summary
    }

    /// Handle one received frame
    ///
    /// Returns a snapshot when this frame is due for a render.
    pub fn process(&mut self, received: Received) -> Option<RenderSnapshot> {
        let now = received.timestamp.unwrap_or_else(|| self.clock.now());
        self.summary.frames += 1;
        self.cache.integrate(&received.frame, now);

        if let Some(last) = self.last_render {
            if now - last < self.config.render_interval {
                return None;
            }
        }

        let evicted = self.cache.sweep(now, self.config.dead_time);
        self.summary.evicted += evicted as u64;
        self.last_render = Some(now);

        let entries: Vec<AnnotatedEntry> = self
            .cache
            .snapshot()
            .into_iter()
            .map(|entry| self.annotate(entry, now))
            .collect();

        for annotated in entries.iter().filter(|a| a.command) {
            self.log_command(&annotated.entry);
        }

        self.summary.renders += 1;
        Some(RenderSnapshot {
            now,
            evicted,
            entries,
        })
    }

    fn annotate(&self, entry: CacheEntry, now: Seconds) -> AnnotatedEntry {
        let payload = entry.payload();
        AnnotatedEntry {
            addressing: entry.addressing(),
            age: entry.age(now),
            module: FrameDecoder::payload_module(payload),
            command: self.decoder.is_command(payload),
            entry,
        }
    }

    fn log_command(&mut self, entry: &CacheEntry) {
        let Some(logger) = &self.logger else {
            return;
        };
        match logger.append(entry.can_id, entry.payload()) {
            Ok(()) => self.summary.events_logged += 1,
            Err(e) => {
                self.summary.log_failures += 1;
                log::error!("{}", e);
            }
        }
    }

    /// Receive and process frames until the source ends or fails
    ///
    /// End of stream finishes with the summary; a receive or render error is
    /// returned as is. Event log failures never stop the loop.
    pub fn run<S, R>(&mut self, source: &mut S, renderer: &mut R) -> Result<CycleSummary>
    where
        S: FrameSource + ?Sized,
        R: Renderer + ?Sized,
    {
        while let Some(received) = source.receive()? {
            if let Some(snapshot) = self.process(received) {
                renderer.render(&snapshot)?;
            }
        }

        log::info!(
            "End of stream: {} frames, {} renders, {} evicted, {} events logged, {} log failures",
            self.summary.frames,
            self.summary.renders,
            self.summary.evicted,
            self.summary.events_logged,
            self.summary.log_failures
        );
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::CommandPolicy;
    use crate::types::Frame;

    fn cycle(clock: &ManualClock) -> UpdateCycle<&ManualClock> {
        let config = MonitorConfig::new().with_event_log(None);
        UpdateCycle::new(config, clock).unwrap()
    }

    #[test]
    fn test_first_frame_renders() {
        let clock = ManualClock::new(100.0);
        let mut cycle = cycle(&clock);

        let snapshot = cycle.process(Frame::new(0x100, &[1]).into()).unwrap();
        assert_eq!(snapshot.now, 100.0);
        assert_eq!(snapshot.entries.len(), 1);
        assert!(snapshot.entries[0].entry.dirty);
    }

    #[test]
    fn test_render_interval_throttles() {
        let clock = ManualClock::new(0.0);
        let mut cycle = cycle(&clock);

        assert!(cycle.process(Frame::new(0x100, &[1]).into()).is_some());
        clock.advance(0.1);
        assert!(cycle.process(Frame::new(0x200, &[1]).into()).is_none());
        clock.advance(0.1);
        assert!(cycle.process(Frame::new(0x300, &[1]).into()).is_none());
        clock.advance(0.2);

        let snapshot = cycle.process(Frame::new(0x100, &[2]).into()).unwrap();
        let ids: Vec<u32> = snapshot.entries.iter().map(|a| a.entry.can_id).collect();
        assert_eq!(ids, vec![0x100, 0x200, 0x300]);
        assert_eq!(cycle.summary().frames, 4);
        assert_eq!(cycle.summary().renders, 2);
    }

    #[test]
    fn test_source_timestamp_overrides_clock() {
        let clock = ManualClock::new(1000.0);
        let mut cycle = cycle(&clock);

        let received = Received {
            frame: Frame::new(0x100, &[]),
            timestamp: Some(5.0),
        };
        let snapshot = cycle.process(received).unwrap();
        assert_eq!(snapshot.now, 5.0);
        assert_eq!(cycle.cache().get(0x100).unwrap().last_seen, 5.0);
    }

    #[test]
    fn test_annotations() {
        let clock = ManualClock::new(0.0);
        let config = MonitorConfig::new()
            .with_event_log(None)
            .with_command_policy(CommandPolicy::Always);
        let mut cycle = UpdateCycle::new(config, &clock).unwrap();

        let snapshot = cycle
            .process(Frame::new(0x000F_FFFE | crate::types::EFF_FLAG, &[0xCB, 0x40]).into())
            .unwrap();
        let annotated = &snapshot.entries[0];
        assert_eq!(annotated.addressing, Addressing::Extended);
        assert_eq!(annotated.module, Some("CEM"));
        assert!(annotated.command);
        assert_eq!(annotated.age, 0.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let clock = ManualClock::new(0.0);
        let config = MonitorConfig::new().with_dead_time(0.0);
        assert!(UpdateCycle::new(config, &clock).is_err());
    }
}
