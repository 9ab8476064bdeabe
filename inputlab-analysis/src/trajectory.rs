use inputlab_core::{Metrics, Sample, TrajectoryAnalysis};

use crate::config::{AnalyzerConfig, ElapsedTime};

/// Interior deviations whose mean absolute spread reaches this many pixels
/// score zero consistency.
const DEVIATION_SPREAD_PX: f64 = 50.0;
const EFFICIENCY_WEIGHT: f64 = 60.0;
const CONSISTENCY_WEIGHT: f64 = 40.0;

/// Metrics for a trajectory under the default configuration (60 Hz assumed rate).
pub fn compute_metrics<S>(trajectory: &S) -> Metrics
where
    S: AsRef<[Sample]> + ?Sized,
{
    TrajectoryAnalyzer::default().metrics(trajectory)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryAnalyzer {
    config: AnalyzerConfig,
}

impl TrajectoryAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn metrics<S>(&self, trajectory: &S) -> Metrics
    where
        S: AsRef<[Sample]> + ?Sized,
    {
        self.analyze(trajectory).metrics()
    }

    /// Full-precision analysis. Never panics; degenerate input yields zeros.
    pub fn analyze<S>(&self, trajectory: &S) -> TrajectoryAnalysis
    where
        S: AsRef<[Sample]> + ?Sized,
    {
        let points = trajectory.as_ref();
        let n = points.len();
        let mut analysis = TrajectoryAnalysis {
            sample_count: n,
            ..Default::default()
        };
        if n < 2 {
            return analysis;
        }

        analysis.distance = path_length(points);
        analysis.elapsed_seconds = self.elapsed_seconds(points);
        analysis.speed = ratio(analysis.distance, analysis.elapsed_seconds);

        if n < 3 {
            return analysis;
        }

        analysis.angles = turning_angles(points);
        analysis.smoothness = smoothness(&analysis.angles);

        let (start, end) = (&points[0], &points[n - 1]);
        analysis.direct_distance = start.distance_to(end);
        analysis.path_efficiency =
            ratio(analysis.direct_distance, analysis.distance).clamp(0.0, 1.0);
        analysis.deviations = line_deviations(start, end, &points[1..n - 1]);
        analysis.deviation_consistency = deviation_consistency(&analysis.deviations);
        analysis.accuracy = (analysis.path_efficiency * EFFICIENCY_WEIGHT
            + analysis.deviation_consistency * CONSISTENCY_WEIGHT)
            .clamp(0.0, 100.0)
            .round();

        analysis
    }

    fn elapsed_seconds(&self, points: &[Sample]) -> f64 {
        match self.config.elapsed {
            ElapsedTime::AssumedRate { hz } if hz.is_finite() && hz > 0.0 => {
                points.len() as f64 / hz
            }
            ElapsedTime::AssumedRate { .. } => 0.0,
            ElapsedTime::Timestamps => {
                let first = points.first().and_then(|s| s.timestamp_ns);
                let last = points.last().and_then(|s| s.timestamp_ns);
                match (first, last) {
                    (Some(a), Some(b)) if b > a => (b - a) as f64 / 1e9,
                    _ => 0.0,
                }
            }
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 && den.is_finite() {
        num / den
    } else {
        0.0
    }
}

fn path_length(points: &[Sample]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Unit vector from `a` to `b`, `None` for a zero or unbounded segment.
fn direction(a: &Sample, b: &Sample) -> Option<(f64, f64)> {
    let len = a.distance_to(b);
    (len > 0.0 && len.is_finite()).then(|| ((b.x - a.x) / len, (b.y - a.y) / len))
}

/// Angles between consecutive segments. Runs of repeated samples collapse to
/// one vertex first, so a pause on the way never hides or fakes a turn.
fn turning_angles(points: &[Sample]) -> Vec<f64> {
    let mut vertices: Vec<&Sample> = Vec::with_capacity(points.len());
    for p in points {
        if vertices.last().is_none_or(|q| q.x != p.x || q.y != p.y) {
            vertices.push(p);
        }
    }
    vertices
        .windows(3)
        .filter_map(|w| {
            let (ax, ay) = direction(w[0], w[1])?;
            let (bx, by) = direction(w[1], w[2])?;
            Some((ax * bx + ay * by).clamp(-1.0, 1.0).acos())
        })
        .collect()
}

/// Spread is the mean squared turning angle, measured against a path that
/// never turns.
fn smoothness(angles: &[f64]) -> f64 {
    if angles.is_empty() {
        return 0.0;
    }
    let spread = angles.iter().map(|a| a * a).sum::<f64>() / angles.len() as f64;
    (100.0 - spread * 100.0).max(0.0)
}

fn line_deviations(start: &Sample, end: &Sample, interior: &[Sample]) -> Vec<f64> {
    let Some((ux, uy)) = direction(start, end) else {
        return Vec::new();
    };
    interior
        .iter()
        .map(|p| (uy * (p.x - start.x) - ux * (p.y - start.y)).abs())
        .collect()
}

fn deviation_consistency(deviations: &[f64]) -> f64 {
    if deviations.is_empty() {
        return 1.0;
    }
    let count = deviations.len() as f64;
    let mean = deviations.iter().sum::<f64>() / count;
    let spread = deviations.iter().map(|d| (d - mean).abs()).sum::<f64>();
    (1.0 - (spread / (DEVIATION_SPREAD_PX * count)).min(1.0)).clamp(0.0, 1.0)
}
