use std::collections::{HashMap, HashSet, VecDeque};

use inputlab_core::{RateRecord, TestPhase};
use tracing::info;

use crate::config::ClickRateConfig;

/// Rounds to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub enum RateEvent {
    Started,
    Updated { rate: f64, max_rate: f64 },
    Finished { rate: f64, count: u64 },
}

/// Fixed-duration clicks-per-second test. The first click starts the clock.
#[derive(Debug, Clone)]
pub struct ClickRateTest {
    config: ClickRateConfig,
    phase: TestPhase,
    clicks: u64,
    start_ms: u64,
    window: VecDeque<u64>,
    rate: f64,
    max_rate: f64,
}

impl ClickRateTest {
    pub fn new(config: ClickRateConfig) -> Self {
        Self {
            config,
            phase: TestPhase::Idle,
            clicks: 0,
            start_ms: 0,
            window: VecDeque::new(),
            rate: 0.0,
            max_rate: 0.0,
        }
    }

    pub fn click(&mut self, now_ms: u64) -> Option<RateEvent> {
        match self.phase {
            TestPhase::Idle => {
                self.phase = TestPhase::Running;
                self.clicks = 1;
                self.start_ms = now_ms;
                self.window.clear();
                self.window.push_back(now_ms);
                self.rate = 0.0;
                self.max_rate = 0.0;
                info!(duration_ms = self.config.duration_ms, "click rate test started");
                Some(RateEvent::Started)
            }
            TestPhase::Running => {
                if self.expired(now_ms) {
                    return Some(self.finish());
                }
                self.clicks += 1;
                self.window.push_back(now_ms);
                None
            }
            TestPhase::Finished => None,
        }
    }

    /// Periodic update; the live rate is the larger of the sliding-window
    /// count and the overall average once a full second has passed.
    pub fn tick(&mut self, now_ms: u64) -> Option<RateEvent> {
        if !self.phase.allows_input() {
            return None;
        }
        if self.expired(now_ms) {
            return Some(self.finish());
        }

        let window_ms = self.config.window_ms;
        while let Some(&t) = self.window.front() {
            if now_ms.saturating_sub(t) > window_ms {
                self.window.pop_front();
            } else {
                break;
            }
        }

        let elapsed_s = now_ms.saturating_sub(self.start_ms) as f64 / 1000.0;
        let windowed = (self.window.len() as u64).min(self.clicks) as f64;
        let overall = if elapsed_s >= 1.0 {
            self.clicks as f64 / elapsed_s
        } else {
            0.0
        };
        self.rate = round1(windowed.max(overall));
        if self.rate > self.max_rate {
            self.max_rate = self.rate;
        }
        Some(RateEvent::Updated {
            rate: self.rate,
            max_rate: self.max_rate,
        })
    }

    fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.config.duration_ms
    }

    fn finish(&mut self) -> RateEvent {
        self.phase = TestPhase::Finished;
        self.window.clear();
        self.rate = round1(self.clicks as f64 / (self.config.duration_ms as f64 / 1000.0));
        info!(
            clicks = self.clicks,
            cps = self.rate,
            max_cps = self.max_rate,
            "click rate test finished"
        );
        RateEvent::Finished {
            rate: self.rate,
            count: self.clicks,
        }
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.phase {
            TestPhase::Idle => self.config.duration_ms,
            TestPhase::Running => self
                .config
                .duration_ms
                .saturating_sub(now_ms.saturating_sub(self.start_ms)),
            TestPhase::Finished => 0,
        }
    }

    /// Whole seconds remaining, counting down from the configured duration.
    pub fn time_left_secs(&self, now_ms: u64) -> u64 {
        self.remaining_ms(now_ms).div_ceil(1000)
    }

    pub fn duration_ms(&self) -> u64 {
        self.config.duration_ms
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn record(&self, timestamp_ms: u64) -> Option<RateRecord> {
        self.phase.is_finished().then(|| RateRecord {
            rate: self.rate,
            max_rate: self.max_rate,
            count: self.clicks,
            timestamp_ms,
        })
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }
}

impl Default for ClickRateTest {
    fn default() -> Self {
        Self::new(ClickRateConfig::default())
    }
}

/// Open-ended keys-per-second counter. Held keys are counted once until released.
#[derive(Debug, Clone, Default)]
pub struct KeyRateTest {
    phase: TestPhase,
    start_ms: u64,
    presses: u64,
    held: HashSet<String>,
    counts: HashMap<String, (u64, u64)>,
    last_key: Option<String>,
    rate: f64,
    max_rate: f64,
}

impl KeyRateTest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64) {
        *self = Self {
            phase: TestPhase::Running,
            start_ms: now_ms,
            ..Self::default()
        };
        info!("key rate test started");
    }

    pub fn stop(&mut self) {
        if self.phase.allows_input() {
            self.phase = TestPhase::Finished;
            info!(
                presses = self.presses,
                kps = self.rate,
                max_kps = self.max_rate,
                "key rate test stopped"
            );
        }
    }

    /// Returns whether the press was counted.
    pub fn key_down(&mut self, key: &str) -> bool {
        if !self.phase.allows_input() || !self.held.insert(key.to_owned()) {
            return false;
        }
        self.presses += 1;
        let order = self.counts.len() as u64;
        self.counts.entry(key.to_owned()).or_insert((0, order)).0 += 1;
        self.last_key = Some(key.to_owned());
        true
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(key);
    }

    pub fn tick(&mut self, now_ms: u64) -> Option<RateEvent> {
        if !self.phase.allows_input() {
            return None;
        }
        let elapsed_s = now_ms.saturating_sub(self.start_ms) as f64 / 1000.0;
        if elapsed_s <= 0.0 {
            return None;
        }
        let kps = self.presses as f64 / elapsed_s;
        self.rate = round1(kps);
        if kps > self.max_rate {
            self.max_rate = round1(kps);
        }
        Some(RateEvent::Updated {
            rate: self.rate,
            max_rate: self.max_rate,
        })
    }

    /// Most pressed keys first; ties keep first-press order.
    pub fn top_keys(&self, n: usize) -> Vec<(String, u64)> {
        let mut keys: Vec<(&String, &(u64, u64))> = self.counts.iter().collect();
        keys.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
        keys.into_iter()
            .take(n)
            .map(|(k, (count, _))| (k.clone(), *count))
            .collect()
    }

    pub fn record(&self, timestamp_ms: u64) -> Option<RateRecord> {
        self.phase.is_finished().then(|| RateRecord {
            rate: self.rate,
            max_rate: self.max_rate,
            count: self.presses,
            timestamp_ms,
        })
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    pub fn presses(&self) -> u64 {
        self.presses
    }

    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn max_rate(&self) -> f64 {
        self.max_rate
    }
}
