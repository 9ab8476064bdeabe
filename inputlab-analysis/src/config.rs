use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LabError, Result};

/// How the analyzer turns a sample sequence into elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ElapsedTime {
    /// `sample_count / hz`, independent of wall-clock time.
    AssumedRate { hz: f64 },
    /// Span between the first and last sample timestamps.
    Timestamps,
}

impl Default for ElapsedTime {
    fn default() -> Self {
        ElapsedTime::AssumedRate { hz: 60.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub elapsed: ElapsedTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickRateConfig {
    pub duration_ms: u64,
    pub window_ms: u64,
}

impl Default for ClickRateConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            window_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    /// Presses of the same input at most this far apart count as a repeat.
    pub threshold_ms: u64,
    /// Width of the warning band above the threshold.
    pub borderline_ms: u64,
    /// Press times kept per input.
    pub recent_presses: usize,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            threshold_ms: 80,
            borderline_ms: 30,
            recent_presses: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            path: PathBuf::from("inputlab-records.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How long each dead-pixel colour stays on screen.
    pub cycle_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { cycle_ms: 5_000 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub analyzer: AnalyzerConfig,
    pub click_rate: ClickRateConfig,
    pub repeat: RepeatConfig,
    pub history: HistoryConfig,
    pub display: DisplayConfig,
}

impl LabConfig {
    /// Reads a JSON config; absent fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LabError::io(path, e))?;
        let config: LabConfig =
            serde_json::from_str(&text).map_err(|e| LabError::json(path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let ElapsedTime::AssumedRate { hz } = self.analyzer.elapsed {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(ConfigError::SampleRate(hz));
            }
        }
        if self.click_rate.duration_ms == 0 {
            return Err(ConfigError::Zero {
                field: "click_rate.duration_ms",
            });
        }
        if self.click_rate.window_ms == 0 {
            return Err(ConfigError::Zero {
                field: "click_rate.window_ms",
            });
        }
        if self.click_rate.window_ms > self.click_rate.duration_ms {
            return Err(ConfigError::WindowTooLong {
                window_ms: self.click_rate.window_ms,
                duration_ms: self.click_rate.duration_ms,
            });
        }
        if self.repeat.recent_presses == 0 {
            return Err(ConfigError::Zero {
                field: "repeat.recent_presses",
            });
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::Zero {
                field: "history.capacity",
            });
        }
        if self.display.cycle_ms == 0 {
            return Err(ConfigError::Zero {
                field: "display.cycle_ms",
            });
        }
        Ok(())
    }
}
