use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, Sender};

use inputlab_core::{Metrics, Sample, TestPhase, Trajectory, TrajectoryAnalysis, TrajectoryRecord};
use inputlab_timing::{IntervalStats, Timer};
use tracing::{debug, info};

use crate::trajectory::TrajectoryAnalyzer;

/// Messages from a pointer capture source to the session that owns the trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Start,
    Move { x: f64, y: f64 },
    Stop,
    /// Start when not tracking, stop when tracking, judged when the event is applied.
    Toggle,
}

pub type PointerSender = Sender<PointerEvent>;
pub type PointerReceiver = Receiver<PointerEvent>;

pub fn pointer_channel() -> (PointerSender, PointerReceiver) {
    mpsc::channel()
}

/// Caller-owned state of one mouse movement test.
///
/// The session is the only writer of its trajectory. Metrics are recomputed
/// from the whole trajectory after it changes and cached until the next change.
pub struct TrackingSession<T>
where
    T: Timer<Timestamp = u64>,
{
    timer: T,
    analyzer: TrajectoryAnalyzer,
    phase: TestPhase,
    trajectory: Trajectory,
    runs: usize,
    cached: Cell<Option<Metrics>>,
}

impl<T> TrackingSession<T>
where
    T: Timer<Timestamp = u64>,
{
    pub fn new(analyzer: TrajectoryAnalyzer, timer: T) -> Self {
        Self {
            timer,
            analyzer,
            phase: TestPhase::Idle,
            trajectory: Trajectory::new(),
            runs: 0,
            cached: Cell::new(Some(Metrics::ZERO)),
        }
    }

    /// Discards the previous trajectory and begins collecting a new one.
    pub fn start(&mut self) {
        self.trajectory = Trajectory::new();
        self.cached.set(Some(Metrics::ZERO));
        self.phase = TestPhase::Running;
        self.runs += 1;
        info!(run = self.runs, "tracking started");
    }

    /// Appends a sample stamped with the session clock. Ignored unless tracking.
    pub fn record_sample(&mut self, x: f64, y: f64) -> bool {
        if !self.phase.allows_input() {
            return false;
        }
        let ts = self.timer.now();
        self.trajectory.push(Sample::at(x, y, ts));
        self.cached.set(None);
        true
    }

    /// Freezes the trajectory. Returns the final metrics, or `None` if not tracking.
    pub fn stop(&mut self) -> Option<Metrics> {
        if !self.phase.allows_input() {
            return None;
        }
        self.phase = TestPhase::Finished;
        let metrics = self.metrics();
        info!(
            run = self.runs,
            samples = self.trajectory.len(),
            distance = metrics.distance,
            speed = metrics.speed,
            smoothness = metrics.smoothness,
            accuracy = metrics.accuracy,
            "tracking stopped"
        );
        Some(metrics)
    }

    /// Start/stop toggle driven by a single control.
    pub fn toggle(&mut self) -> TestPhase {
        match self.phase.next() {
            TestPhase::Running => self.start(),
            _ => {
                self.stop();
            }
        }
        self.phase
    }

    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Start => {
                self.start();
                true
            }
            PointerEvent::Move { x, y } => self.record_sample(x, y),
            PointerEvent::Stop => self.stop().is_some(),
            PointerEvent::Toggle => {
                self.toggle();
                true
            }
        }
    }

    /// Applies every event currently queued on the channel without blocking.
    /// Returns how many of them changed the session.
    pub fn drain(&mut self, rx: &PointerReceiver) -> usize {
        let mut applied = 0;
        while let Ok(event) = rx.try_recv() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        if applied > 0 {
            debug!(applied, samples = self.trajectory.len(), "pointer events drained");
        }
        applied
    }

    pub fn metrics(&self) -> Metrics {
        if let Some(m) = self.cached.get() {
            return m;
        }
        let m = self.analyzer.metrics(&self.trajectory);
        self.cached.set(Some(m));
        m
    }

    pub fn analysis(&self) -> TrajectoryAnalysis {
        self.analyzer.analyze(&self.trajectory)
    }

    /// Observed pointer event rate over the current trajectory.
    pub fn sample_rate(&self) -> IntervalStats {
        let stamps: Vec<u64> = self
            .trajectory
            .samples()
            .iter()
            .filter_map(|s| s.timestamp_ns)
            .collect();
        IntervalStats::from_timestamps(&stamps)
    }

    pub fn record(&self, timestamp_ms: u64) -> Option<TrajectoryRecord> {
        if !self.phase.is_finished() {
            return None;
        }
        Some(TrajectoryRecord {
            metrics: self.metrics(),
            sample_count: self.trajectory.len(),
            timestamp_ms,
        })
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    pub fn is_tracking(&self) -> bool {
        self.phase.allows_input()
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
