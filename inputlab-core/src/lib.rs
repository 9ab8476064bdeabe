pub mod input;
pub mod metrics;
pub mod phase;
pub mod record;
pub mod sample;

pub use input::{key_display_name, Button};
pub use metrics::{Metrics, TrajectoryAnalysis};
pub use phase::TestPhase;
pub use record::{RateRecord, RepeatRecord, TestKind, TestRecord, TrajectoryRecord};
pub use sample::{Sample, Trajectory};
