use tracing::info;

use crate::config::DisplayConfig;

/// Full-screen colours for spotting dead or stuck pixels, shown in this order.
pub const DEAD_PIXEL_CYCLE: [(&str, [u8; 4]); 5] = [
    ("White", [255, 255, 255, 255]),
    ("Black", [0, 0, 0, 255]),
    ("Red", [255, 0, 0, 255]),
    ("Green", [0, 255, 0, 255]),
    ("Blue", [0, 0, 255, 255]),
];

/// Two rows of five blocks, left to right then top to bottom.
pub const COLOR_BLOCKS: [[u8; 4]; 10] = [
    [255, 0, 0, 255],
    [0, 255, 0, 255],
    [0, 0, 255, 255],
    [0, 0, 0, 255],
    [255, 255, 255, 255],
    [255, 255, 0, 255],
    [255, 0, 255, 255],
    [0, 255, 255, 255],
    [255, 128, 0, 255],
    [128, 0, 255, 255],
];

/// Stops of the stepped grey band in the gradient pattern.
pub const GRAY_STEPS: usize = 11;

/// Length of one pulse of the response pattern.
const PULSE_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCheck {
    ColorBlocks,
    Gradients,
    DeadPixels,
    /// A pulsing target to follow with the cursor while watching for blur.
    Response,
}

impl DisplayCheck {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayCheck::ColorBlocks => "colour blocks",
            DisplayCheck::Gradients => "gradients",
            DisplayCheck::DeadPixels => "dead pixels",
            DisplayCheck::Response => "response",
        }
    }
}

/// What the screen shows at one instant of a display check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayPattern {
    ColorBlocks,
    Gradients,
    Solid([u8; 4]),
    /// Progress through the current pulse, in `[0, 1)`.
    Pulse(f32),
}

/// At most one display check runs at a time; the dead-pixel check steps
/// through its colours on a fixed cycle.
#[derive(Debug, Clone)]
pub struct DisplayTest {
    config: DisplayConfig,
    active: Option<DisplayCheck>,
    started_ms: u64,
}

impl DisplayTest {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            config,
            active: None,
            started_ms: 0,
        }
    }

    /// Starts `check`, or stops it when it is already running.
    /// Returns the check now running.
    pub fn toggle(&mut self, check: DisplayCheck, now_ms: u64) -> Option<DisplayCheck> {
        if self.active == Some(check) {
            self.stop();
        } else {
            self.active = Some(check);
            self.started_ms = now_ms;
            info!(check = check.label(), "display check started");
        }
        self.active
    }

    pub fn stop(&mut self) {
        if let Some(check) = self.active.take() {
            info!(check = check.label(), "display check stopped");
        }
    }

    pub fn active(&self) -> Option<DisplayCheck> {
        self.active
    }

    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }

    fn cycle_index(&self, now_ms: u64) -> usize {
        (self.elapsed_ms(now_ms) / self.config.cycle_ms.max(1)) as usize % DEAD_PIXEL_CYCLE.len()
    }

    pub fn pattern(&self, now_ms: u64) -> Option<DisplayPattern> {
        Some(match self.active? {
            DisplayCheck::ColorBlocks => DisplayPattern::ColorBlocks,
            DisplayCheck::Gradients => DisplayPattern::Gradients,
            DisplayCheck::DeadPixels => {
                DisplayPattern::Solid(DEAD_PIXEL_CYCLE[self.cycle_index(now_ms)].1)
            }
            DisplayCheck::Response => {
                DisplayPattern::Pulse((self.elapsed_ms(now_ms) % PULSE_MS) as f32 / PULSE_MS as f32)
            }
        })
    }

    /// Name of the colour on screen during the dead-pixel check.
    pub fn color_name(&self, now_ms: u64) -> Option<&'static str> {
        (self.active == Some(DisplayCheck::DeadPixels))
            .then(|| DEAD_PIXEL_CYCLE[self.cycle_index(now_ms)].0)
    }

    /// Whole seconds until the next colour, counting down from the cycle length.
    pub fn countdown_secs(&self, now_ms: u64) -> Option<u64> {
        if self.active != Some(DisplayCheck::DeadPixels) {
            return None;
        }
        let cycle = self.config.cycle_ms.max(1);
        Some((cycle - self.elapsed_ms(now_ms) % cycle).div_ceil(1000))
    }
}

impl Default for DisplayTest {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_test_shows_nothing() {
        let t = DisplayTest::default();
        assert_eq!(t.active(), None);
        assert_eq!(t.pattern(0), None);
        assert_eq!(t.countdown_secs(0), None);
    }

    #[test]
    fn dead_pixel_colours_cycle_every_five_seconds() {
        let mut t = DisplayTest::default();
        t.toggle(DisplayCheck::DeadPixels, 1_000);
        assert_eq!(t.color_name(1_000), Some("White"));
        assert_eq!(t.countdown_secs(1_000), Some(5));
        assert_eq!(t.countdown_secs(5_001), Some(1));
        assert_eq!(t.color_name(6_000), Some("Black"));
        assert_eq!(
            t.pattern(6_000),
            Some(DisplayPattern::Solid([0, 0, 0, 255]))
        );
        assert_eq!(t.color_name(21_000), Some("Blue"));
        // wraps back to white
        assert_eq!(t.color_name(26_000), Some("White"));
    }

    #[test]
    fn same_check_toggles_off_and_another_replaces_it() {
        let mut t = DisplayTest::default();
        assert_eq!(
            t.toggle(DisplayCheck::ColorBlocks, 0),
            Some(DisplayCheck::ColorBlocks)
        );
        assert_eq!(
            t.toggle(DisplayCheck::Gradients, 10),
            Some(DisplayCheck::Gradients)
        );
        assert_eq!(t.pattern(10), Some(DisplayPattern::Gradients));
        assert_eq!(t.toggle(DisplayCheck::Gradients, 20), None);
        assert_eq!(t.color_name(20), None);
    }

    #[test]
    fn restarting_resets_the_cycle() {
        let mut t = DisplayTest::default();
        t.toggle(DisplayCheck::DeadPixels, 0);
        assert_eq!(t.color_name(12_000), Some("Red"));
        t.stop();
        t.toggle(DisplayCheck::DeadPixels, 12_000);
        assert_eq!(t.color_name(12_000), Some("White"));
    }

    #[test]
    fn response_pulse_repeats_each_second() {
        let mut t = DisplayTest::default();
        t.toggle(DisplayCheck::Response, 500);
        assert_eq!(t.pattern(500), Some(DisplayPattern::Pulse(0.0)));
        assert_eq!(t.pattern(1_250), Some(DisplayPattern::Pulse(0.75)));
        assert_eq!(t.pattern(1_500), Some(DisplayPattern::Pulse(0.0)));
    }

    #[test]
    fn cycle_length_is_configurable() {
        let mut t = DisplayTest::new(DisplayConfig { cycle_ms: 2_000 });
        t.toggle(DisplayCheck::DeadPixels, 0);
        assert_eq!(t.color_name(2_000), Some("Black"));
        assert_eq!(t.countdown_secs(2_500), Some(2));
    }
}
