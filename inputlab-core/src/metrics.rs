use serde::{Deserialize, Serialize};

/// Rounded summary of one trajectory, as presented to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metrics {
    /// Total path length in pixels.
    pub distance: u64,
    /// Average speed in pixels per second.
    pub speed: u64,
    /// 0..=100, higher means fewer and gentler turns.
    pub smoothness: u8,
    /// 0..=100, blend of path efficiency and deviation consistency.
    pub accuracy: u8,
}

impl Metrics {
    pub const ZERO: Metrics = Metrics {
        distance: 0,
        speed: 0,
        smoothness: 0,
        accuracy: 0,
    };
}

/// Full-precision intermediate values behind [`Metrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryAnalysis {
    pub sample_count: usize,
    pub distance: f64,
    pub elapsed_seconds: f64,
    pub speed: f64,
    /// Turning angle in radians at every interior vertex with two non-degenerate segments.
    pub angles: Vec<f64>,
    pub smoothness: f64,
    pub direct_distance: f64,
    pub path_efficiency: f64,
    /// Perpendicular distance of each interior sample to the start-end line.
    pub deviations: Vec<f64>,
    pub deviation_consistency: f64,
    pub accuracy: f64,
}

impl TrajectoryAnalysis {
    pub fn metrics(&self) -> Metrics {
        Metrics {
            distance: round_to_u64(self.distance),
            speed: round_to_u64(self.speed),
            smoothness: round_percent(self.smoothness),
            accuracy: round_percent(self.accuracy),
        }
    }
}

impl From<&TrajectoryAnalysis> for Metrics {
    fn from(analysis: &TrajectoryAnalysis) -> Self {
        analysis.metrics()
    }
}

fn round_to_u64(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}

fn round_percent(v: f64) -> u8 {
    if v.is_finite() {
        v.clamp(0.0, 100.0).round() as u8
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_and_clamps_percentages() {
        let analysis = TrajectoryAnalysis {
            distance: 19.5,
            speed: 600.49,
            smoothness: 130.0,
            accuracy: -4.0,
            ..Default::default()
        };
        assert_eq!(
            analysis.metrics(),
            Metrics {
                distance: 20,
                speed: 600,
                smoothness: 100,
                accuracy: 0,
            }
        );
    }

    #[test]
    fn non_finite_values_collapse_to_zero() {
        let analysis = TrajectoryAnalysis {
            distance: f64::NAN,
            speed: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(analysis.metrics(), Metrics::ZERO);
    }
}
