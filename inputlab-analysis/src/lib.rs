pub mod config;
pub mod display;
pub mod error;
pub mod history;
pub mod rate;
pub mod repeat;
pub mod session;
pub mod trajectory;

pub use config::{
    AnalyzerConfig, ClickRateConfig, DisplayConfig, ElapsedTime, HistoryConfig, LabConfig,
    RepeatConfig,
};
pub use display::{
    COLOR_BLOCKS, DEAD_PIXEL_CYCLE, DisplayCheck, DisplayPattern, DisplayTest, GRAY_STEPS,
};
pub use error::{ConfigError, LabError, Result};
pub use history::RecordStore;
pub use rate::{ClickRateTest, KeyRateTest, RateEvent, round1};
pub use repeat::{
    IntervalClass, PressOutcome, PressStats, RepeatDetector, THRESHOLD_MAX_MS, THRESHOLD_MIN_MS,
    THRESHOLD_STEP_MS,
};
pub use session::{PointerEvent, PointerReceiver, PointerSender, TrackingSession, pointer_channel};
pub use trajectory::{TrajectoryAnalyzer, compute_metrics};
