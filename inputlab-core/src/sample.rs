use serde::{Deserialize, Serialize};

/// One captured pointer position in surface-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ns: Option<u64>,
}

impl Sample {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            timestamp_ns: None,
        }
    }

    pub fn at(x: f64, y: f64, timestamp_ns: u64) -> Self {
        Self {
            x,
            y,
            timestamp_ns: Some(timestamp_ns),
        }
    }

    pub fn distance_to(&self, other: &Sample) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Sample {
    fn from((x, y): (f64, f64)) -> Self {
        Sample::new(x, y)
    }
}

/// Ordered, append-only sequence of samples collected during one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory {
    samples: Vec<Sample>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Consecutive sample pairs, i.e. the segments of the path.
    pub fn segments(&self) -> impl Iterator<Item = (&Sample, &Sample)> + '_ {
        self.samples.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl AsRef<[Sample]> for Trajectory {
    fn as_ref(&self) -> &[Sample] {
        &self.samples
    }
}

impl<S: Into<Sample>> FromIterator<S> for Trajectory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<Sample>> for Trajectory {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}
