pub mod timer;

pub use timer::{HighPrecisionTimer, IntervalStats, ManualTimer, Timer};
