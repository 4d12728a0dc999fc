// End-to-end runs of the update cycle with scripted traffic
use canqv_core::types::EFF_FLAG;
use canqv_core::{
    CommandPolicy, Frame, FrameSource, ManualClock, MonitorConfig, MonitorError, Received,
    RenderSnapshot, Renderer, UpdateCycle,
};
use std::collections::VecDeque;
use std::io;

/// Replays (time, frame) pairs, advancing the clock before each one
struct ScriptedSource<'a> {
    clock: &'a ManualClock,
    script: VecDeque<(f64, Frame)>,
    fail_at_end: bool,
}

impl<'a> ScriptedSource<'a> {
    fn new(clock: &'a ManualClock, script: Vec<(f64, Frame)>) -> Self {
        Self {
            clock,
            script: script.into(),
            fail_at_end: false,
        }
    }
}

impl FrameSource for ScriptedSource<'_> {
    fn receive(&mut self) -> canqv_core::Result<Option<Received>> {
        match self.script.pop_front() {
            Some((at, frame)) => {
                self.clock.set(at);
                Ok(Some(frame.into()))
            }
            None if self.fail_at_end => Err(MonitorError::Receive(io::Error::new(
                io::ErrorKind::Other,
                "network down",
            ))),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
struct RecordingRenderer {
    snapshots: Vec<RenderSnapshot>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, snapshot: &RenderSnapshot) -> canqv_core::Result<()> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}

fn quiet_config() -> MonitorConfig {
    MonitorConfig::new().with_event_log(None)
}

fn ids(snapshot: &RenderSnapshot) -> Vec<u32> {
    snapshot.entries.iter().map(|a| a.entry.can_id).collect()
}

#[test]
fn test_period_then_eviction() {
    let clock = ManualClock::new(0.0);
    let mut cycle = UpdateCycle::new(quiet_config(), &clock).unwrap();
    let mut source = ScriptedSource::new(
        &clock,
        vec![
            (0.0, Frame::new(0x100, &[1])),
            (1.0, Frame::new(0x100, &[1])),
            // Unrelated traffic keeps the cycle turning
            (12.0, Frame::new(0x200, &[1])),
        ],
    );
    let mut renderer = RecordingRenderer::default();

    let summary = cycle.run(&mut source, &mut renderer).unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(renderer.snapshots.len(), 3);

    let second = &renderer.snapshots[1];
    assert_eq!(ids(second), vec![0x100]);
    assert!((second.entries[0].entry.period.unwrap() - 1.0).abs() < 1e-9);

    let last = &renderer.snapshots[2];
    assert_eq!(ids(last), vec![0x200]);
    assert_eq!(last.evicted, 1);
    assert_eq!(summary.evicted, 1);
}

#[test]
fn test_no_eviction_without_traffic() {
    let clock = ManualClock::new(0.0);
    let mut cycle = UpdateCycle::new(quiet_config(), &clock).unwrap();
    let mut source = ScriptedSource::new(&clock, vec![(0.0, Frame::new(0x100, &[1]))]);
    let mut renderer = RecordingRenderer::default();

    cycle.run(&mut source, &mut renderer).unwrap();

    // Time passes, but nothing arrives to drive a sweep
    clock.set(100.0);
    assert_eq!(cycle.cache().len(), 1);
}

#[test]
fn test_snapshots_are_sorted_and_unique() {
    let clock = ManualClock::new(0.0);
    let config = quiet_config().with_render_interval(0.0);
    let mut cycle = UpdateCycle::new(config, &clock).unwrap();

    let order = [0x7E8, 0x100, 0x0F_FFFE | EFF_FLAG, 0x100, 0x001, 0x7E8, 0x200];
    let script = order
        .iter()
        .enumerate()
        .map(|(i, id)| (i as f64 * 0.01, Frame::new(*id, &[i as u8])))
        .collect();
    let mut source = ScriptedSource::new(&clock, script);
    let mut renderer = RecordingRenderer::default();

    cycle.run(&mut source, &mut renderer).unwrap();

    assert_eq!(renderer.snapshots.len(), order.len());
    for snapshot in &renderer.snapshots {
        let ids = ids(snapshot);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "not strictly ascending: {:?}", ids);
    }
    let last = renderer.snapshots.last().unwrap();
    assert_eq!(ids(last), vec![0x001, 0x100, 0x200, 0x7E8, 0x0F_FFFE | EFF_FLAG]);
}

#[test]
fn test_dirty_is_reported_once() {
    let clock = ManualClock::new(0.0);
    let mut cycle = UpdateCycle::new(quiet_config(), &clock).unwrap();
    let mut source = ScriptedSource::new(
        &clock,
        vec![
            (0.0, Frame::new(0x100, &[1, 2])),
            (0.5, Frame::new(0x100, &[1, 2])),
            (1.0, Frame::new(0x100, &[1, 3])),
            (1.5, Frame::new(0x100, &[1, 3])),
        ],
    );
    let mut renderer = RecordingRenderer::default();

    cycle.run(&mut source, &mut renderer).unwrap();

    let dirty: Vec<bool> = renderer
        .snapshots
        .iter()
        .map(|s| s.entries[0].entry.dirty)
        .collect();
    assert_eq!(dirty, vec![true, false, true, false]);
}

#[test]
fn test_stale_period_is_reset_before_eviction() {
    let clock = ManualClock::new(0.0);
    let mut cycle = UpdateCycle::new(quiet_config(), &clock).unwrap();
    let mut source = ScriptedSource::new(
        &clock,
        vec![
            (0.0, Frame::new(0x100, &[])),
            (0.5, Frame::new(0x100, &[])),
            (2.0, Frame::new(0x200, &[])),
        ],
    );
    let mut renderer = RecordingRenderer::default();

    cycle.run(&mut source, &mut renderer).unwrap();

    let last = renderer.snapshots.last().unwrap();
    let entry = last.entries.iter().find(|a| a.entry.can_id == 0x100).unwrap();
    assert_eq!(entry.entry.period, None);
    assert!((entry.age - 1.5).abs() < 1e-9);
}

#[test]
fn test_receive_error_ends_the_run() {
    let clock = ManualClock::new(0.0);
    let mut cycle = UpdateCycle::new(quiet_config(), &clock).unwrap();
    let mut source = ScriptedSource::new(&clock, vec![(0.0, Frame::new(0x100, &[]))]);
    source.fail_at_end = true;
    let mut renderer = RecordingRenderer::default();

    let err = cycle.run(&mut source, &mut renderer).unwrap_err();
    assert!(matches!(err, MonitorError::Receive(_)));
    assert_eq!(renderer.snapshots.len(), 1);
}

#[test]
fn test_command_frames_are_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands.log");
    let clock = ManualClock::new(0.0);
    let config = MonitorConfig::new().with_event_log(Some(path.clone()));
    let mut cycle = UpdateCycle::new(config, &clock).unwrap();
    let mut source = ScriptedSource::new(
        &clock,
        vec![
            (0.0, Frame::new(0x0F_FFFE | EFF_FLAG, &[0xCB, 0x40, 0xB9, 0xF0])),
            (0.0, Frame::new(0x123, &[0x01, 0x40])),
        ],
    );
    let mut renderer = RecordingRenderer::default();

    let summary = cycle.run(&mut source, &mut renderer).unwrap();

    assert_eq!(summary.events_logged, 1);
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "000ffffe:  cb  CEM  b9  f0\n");
}

#[test]
fn test_event_log_failure_does_not_stop_monitoring() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("commands.log");
    let clock = ManualClock::new(0.0);
    let config = MonitorConfig::new()
        .with_event_log(Some(path))
        .with_command_policy(CommandPolicy::Always);
    let mut cycle = UpdateCycle::new(config, &clock).unwrap();
    let mut source = ScriptedSource::new(
        &clock,
        vec![(0.0, Frame::new(0x100, &[0xCB])), (1.0, Frame::new(0x101, &[0xCB]))],
    );
    let mut renderer = RecordingRenderer::default();

    let summary = cycle.run(&mut source, &mut renderer).unwrap();

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.renders, 2);
    assert_eq!(summary.events_logged, 0);
    assert_eq!(summary.log_failures, 3);
}
