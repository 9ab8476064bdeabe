use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;

use inputlab_core::RepeatRecord;
use tracing::debug;

use crate::config::RepeatConfig;

/// Where an inter-press interval falls relative to the repeat threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalClass {
    /// No earlier press of the same input.
    First,
    /// At or under the threshold: counted as a double press.
    Repeat,
    /// Within the warning band just above the threshold.
    Borderline,
    Clean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressOutcome {
    pub interval_ms: Option<u64>,
    pub class: IntervalClass,
}

impl PressOutcome {
    pub fn is_repeat(&self) -> bool {
        self.class == IntervalClass::Repeat
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PressStats {
    pub count: u64,
    pub repeats: u64,
    pub last_interval_ms: Option<u64>,
    pub recent_ms: VecDeque<u64>,
}

/// Range and step of the user-adjustable threshold.
pub const THRESHOLD_MIN_MS: u64 = 50;
pub const THRESHOLD_MAX_MS: u64 = 500;
pub const THRESHOLD_STEP_MS: u64 = 10;

/// Double-press detection for mouse buttons or keys, per input.
#[derive(Debug, Clone)]
pub struct RepeatDetector<K> {
    config: RepeatConfig,
    stats: HashMap<K, PressStats>,
    order: Vec<K>,
    total_presses: u64,
    total_repeats: u64,
}

impl<K> RepeatDetector<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new(config: RepeatConfig) -> Self {
        Self {
            config,
            stats: HashMap::new(),
            order: Vec::new(),
            total_presses: 0,
            total_repeats: 0,
        }
    }

    pub fn press(&mut self, id: K, now_ms: u64) -> PressOutcome {
        let interval_ms = self
            .stats
            .get(&id)
            .and_then(|s| s.recent_ms.back())
            .map(|&prev| now_ms.saturating_sub(prev));
        let class = interval_ms.map_or(IntervalClass::First, |i| self.classify(i));
        let keep = self.config.recent_presses;

        if !self.stats.contains_key(&id) {
            self.order.push(id.clone());
        }
        let entry = self.stats.entry(id.clone()).or_default();
        entry.count += 1;
        if interval_ms.is_some() {
            entry.last_interval_ms = interval_ms;
        }
        if class == IntervalClass::Repeat {
            entry.repeats += 1;
        }
        entry.recent_ms.push_back(now_ms);
        while entry.recent_ms.len() > keep {
            entry.recent_ms.pop_front();
        }

        self.total_presses += 1;
        if class == IntervalClass::Repeat {
            self.total_repeats += 1;
            debug!(input = %id, interval_ms = ?interval_ms, "repeat press");
        }

        PressOutcome { interval_ms, class }
    }

    pub fn classify(&self, interval_ms: u64) -> IntervalClass {
        let threshold = self.config.threshold_ms;
        if interval_ms <= threshold {
            IntervalClass::Repeat
        } else if interval_ms <= threshold.saturating_add(self.config.borderline_ms) {
            IntervalClass::Borderline
        } else {
            IntervalClass::Clean
        }
    }

    /// Applies to later presses only; earlier counts are kept.
    /// Clamped to the adjustable range. Returns the threshold now in force.
    pub fn set_threshold(&mut self, threshold_ms: u64) -> u64 {
        self.config.threshold_ms = threshold_ms.clamp(THRESHOLD_MIN_MS, THRESHOLD_MAX_MS);
        self.config.threshold_ms
    }

    pub fn raise_threshold(&mut self) -> u64 {
        self.set_threshold(self.config.threshold_ms.saturating_add(THRESHOLD_STEP_MS))
    }

    pub fn lower_threshold(&mut self) -> u64 {
        self.set_threshold(self.config.threshold_ms.saturating_sub(THRESHOLD_STEP_MS))
    }

    pub fn threshold_ms(&self) -> u64 {
        self.config.threshold_ms
    }

    pub fn stats(&self, id: &K) -> Option<&PressStats> {
        self.stats.get(id)
    }

    /// Inputs by press count, most pressed first; ties keep first-press order.
    pub fn by_count(&self) -> Vec<(&K, &PressStats)> {
        let mut rows: Vec<(&K, &PressStats)> = self
            .order
            .iter()
            .filter_map(|k| self.stats.get(k).map(|s| (k, s)))
            .collect();
        rows.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        rows
    }

    pub fn total_presses(&self) -> u64 {
        self.total_presses
    }

    pub fn total_repeats(&self) -> u64 {
        self.total_repeats
    }

    pub fn reset(&mut self) {
        self.stats.clear();
        self.order.clear();
        self.total_presses = 0;
        self.total_repeats = 0;
    }

    pub fn record(&self, timestamp_ms: u64) -> RepeatRecord {
        RepeatRecord {
            threshold_ms: self.config.threshold_ms,
            inputs: self
                .order
                .iter()
                .filter_map(|k| {
                    self.stats
                        .get(k)
                        .map(|s| (k.to_string(), s.count, s.repeats))
                })
                .collect(),
            total_presses: self.total_presses,
            total_repeats: self.total_repeats,
            timestamp_ms,
        }
    }
}

impl<K> Default for RepeatDetector<K>
where
    K: Eq + Hash + Clone + Display,
{
    fn default() -> Self {
        Self::new(RepeatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inputlab_core::Button;

    #[test]
    fn first_press_is_never_a_repeat() {
        let mut d = RepeatDetector::default();
        let outcome = d.press(Button::Left, 0);
        assert_eq!(outcome.class, IntervalClass::First);
        assert_eq!(outcome.interval_ms, None);
        assert_eq!(d.total_repeats(), 0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut d = RepeatDetector::default();
        d.press(Button::Left, 1_000);
        assert!(d.press(Button::Left, 1_080).is_repeat());
        assert!(!d.press(Button::Left, 1_161).is_repeat());
        let stats = d.stats(&Button::Left).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.repeats, 1);
        assert_eq!(stats.last_interval_ms, Some(81));
    }

    #[test]
    fn buttons_are_tracked_independently() {
        let mut d = RepeatDetector::default();
        d.press(Button::Left, 0);
        assert_eq!(d.press(Button::Right, 10).class, IntervalClass::First);
        assert!(d.press(Button::Left, 20).is_repeat());
        assert_eq!(d.total_presses(), 3);
        assert_eq!(d.total_repeats(), 1);
    }

    #[test]
    fn intervals_are_classified_in_bands() {
        let d: RepeatDetector<String> = RepeatDetector::default();
        assert_eq!(d.classify(80), IntervalClass::Repeat);
        assert_eq!(d.classify(81), IntervalClass::Borderline);
        assert_eq!(d.classify(110), IntervalClass::Borderline);
        assert_eq!(d.classify(111), IntervalClass::Clean);
    }

    #[test]
    fn threshold_change_applies_to_later_presses() {
        let mut d = RepeatDetector::default();
        d.press("k".to_owned(), 0);
        assert!(!d.press("k".to_owned(), 100).is_repeat());
        d.set_threshold(150);
        assert!(d.press("k".to_owned(), 200).is_repeat());
        assert_eq!(d.threshold_ms(), 150);
    }

    #[test]
    fn threshold_steps_stay_in_range() {
        let mut d: RepeatDetector<Button> = RepeatDetector::default();
        assert_eq!(d.raise_threshold(), 90);
        assert_eq!(d.lower_threshold(), 80);
        for _ in 0..10 {
            d.lower_threshold();
        }
        assert_eq!(d.threshold_ms(), THRESHOLD_MIN_MS);
        assert_eq!(d.set_threshold(10_000), THRESHOLD_MAX_MS);
        assert_eq!(d.raise_threshold(), THRESHOLD_MAX_MS);
    }

    #[test]
    fn raised_threshold_catches_slower_doubles() {
        let mut d = RepeatDetector::default();
        d.press(Button::Left, 0);
        assert_eq!(d.press(Button::Left, 95).class, IntervalClass::Borderline);
        d.raise_threshold();
        d.raise_threshold();
        assert!(d.press(Button::Left, 190).is_repeat());
    }

    #[test]
    fn recent_presses_are_bounded() {
        let mut d = RepeatDetector::default();
        for i in 0..25 {
            d.press("a".to_owned(), i * 1_000);
        }
        let stats = d.stats(&"a".to_owned()).unwrap();
        assert_eq!(stats.recent_ms.len(), 10);
        assert_eq!(stats.recent_ms.front(), Some(&15_000));
    }

    #[test]
    fn record_lists_inputs_in_first_press_order() {
        let mut d = RepeatDetector::default();
        d.press(Button::Right, 0);
        d.press(Button::Left, 500);
        d.press(Button::Left, 550);
        let record = d.record(7);
        assert_eq!(
            record.inputs,
            vec![("Right".to_owned(), 1, 0), ("Left".to_owned(), 2, 1)]
        );
        assert_eq!(record.total_repeats, 1);
        assert_eq!(d.by_count()[0].0, &Button::Left);

        d.reset();
        assert_eq!(d.total_presses(), 0);
        assert!(d.by_count().is_empty());
    }
}
