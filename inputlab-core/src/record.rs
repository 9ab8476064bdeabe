use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Trajectory,
    ClickRate,
    KeyRate,
    RepeatPress,
}

/// Result of one finished mouse movement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub metrics: Metrics,
    pub sample_count: usize,
    pub timestamp_ms: u64,
}

/// Result of one click or key rate run. Rates carry one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub rate: f64,
    pub max_rate: f64,
    pub count: u64,
    pub timestamp_ms: u64,
}

/// Press and repeat totals per input, by display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatRecord {
    pub threshold_ms: u64,
    pub inputs: Vec<(String, u64, u64)>,
    pub total_presses: u64,
    pub total_repeats: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestRecord {
    Trajectory(TrajectoryRecord),
    ClickRate(RateRecord),
    KeyRate(RateRecord),
    RepeatPress(RepeatRecord),
}

impl TestRecord {
    pub fn kind(&self) -> TestKind {
        match self {
            TestRecord::Trajectory(_) => TestKind::Trajectory,
            TestRecord::ClickRate(_) => TestKind::ClickRate,
            TestRecord::KeyRate(_) => TestKind::KeyRate,
            TestRecord::RepeatPress(_) => TestKind::RepeatPress,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        match self {
            TestRecord::Trajectory(r) => r.timestamp_ms,
            TestRecord::ClickRate(r) | TestRecord::KeyRate(r) => r.timestamp_ms,
            TestRecord::RepeatPress(r) => r.timestamp_ms,
        }
    }
}
