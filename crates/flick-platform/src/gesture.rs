//! Footswitch gesture classification.
//!
//! Each footswitch gets its own [`GestureDetector`], fed the debounced level
//! and the current time once per control tick. The detector reports at most
//! one [`Gesture`] per tick:
//!
//! ```text
//! press ──► count = (since last press <= double window) ? count + 1 : 1
//!   │
//!   ├─ held >= hold threshold, not yet fired ──► Long (once per press)
//!   │
//! release ─► long fired?  ──► nothing
//!            count >= 2?  ──► Double, count = 0
//!            held < hold? ──► Normal
//! ```
//!
//! The first press of a double-press pair is reported as [`Gesture::Normal`]
//! on its release; the double press arrives on the second release. Callers
//! that act on normal presses must undo that action when the double press
//! comes in.

/// Timing thresholds shared by both footswitches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureConfig {
    /// Hold time that classifies a press as long, in milliseconds.
    pub hold_ms: u32,
    /// Maximum spacing between two presses of a double press, in milliseconds.
    pub double_press_ms: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hold_ms: 2000,
            double_press_ms: 600,
        }
    }
}

/// A classified footswitch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Press and release shorter than the hold threshold.
    Normal,
    /// Second press within the double-press window, reported on release.
    Double,
    /// Held past the hold threshold, reported while still held.
    Long,
}

/// Press classifier for one footswitch.
///
/// # Example
///
/// ```rust
/// use flick_platform::{Gesture, GestureConfig, GestureDetector};
///
/// let mut fs = GestureDetector::new(GestureConfig::default());
/// assert_eq!(fs.update(true, 0), None);
/// assert_eq!(fs.update(false, 120), Some(Gesture::Normal));
/// assert_eq!(fs.update(true, 300), None);
/// assert_eq!(fs.update(false, 420), Some(Gesture::Double));
/// ```
#[derive(Debug, Clone)]
pub struct GestureDetector {
    config: GestureConfig,
    pressed: bool,
    press_start: u32,
    last_press: Option<u32>,
    press_count: u8,
    long_fired: bool,
}

impl GestureDetector {
    /// Creates a released detector.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            pressed: false,
            press_start: 0,
            last_press: None,
            press_count: 0,
            long_fired: false,
        }
    }

    /// Timing thresholds in use.
    pub fn config(&self) -> GestureConfig {
        self.config
    }

    /// Level seen at the last update.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// How long the switch has been held, or 0 when released.
    pub fn held_ms(&self, now_ms: u32) -> u32 {
        if self.pressed {
            now_ms.wrapping_sub(self.press_start)
        } else {
            0
        }
    }

    /// Feeds the current level and time; returns the gesture completed by
    /// this tick, if any.
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<Gesture> {
        let was_pressed = self.pressed;
        self.pressed = pressed;

        if pressed && !was_pressed {
            let within_window = self
                .last_press
                .is_some_and(|t| now_ms.wrapping_sub(t) <= self.config.double_press_ms);
            self.press_count = if within_window {
                self.press_count.saturating_add(1)
            } else {
                1
            };
            self.press_start = now_ms;
            self.last_press = Some(now_ms);
            self.long_fired = false;
        }

        let held = now_ms.wrapping_sub(self.press_start);

        if pressed && !self.long_fired && held >= self.config.hold_ms {
            self.long_fired = true;
            return Some(Gesture::Long);
        }

        if !pressed && was_pressed && !self.long_fired {
            if self.press_count >= 2 {
                self.press_count = 0;
                return Some(Gesture::Double);
            }
            if held < self.config.hold_ms {
                return Some(Gesture::Normal);
            }
        }

        None
    }

    /// Forgets press history. The current level is kept so a switch held
    /// through the reset does not produce a spurious release gesture.
    pub fn reset(&mut self) {
        self.last_press = None;
        self.press_count = 0;
        self.long_fired = self.pressed;
    }

    /// Adopts `pressed` as the current level without reporting a gesture for
    /// it, for when updates were suspended. A switch already down counts as
    /// classified, so its release is silent.
    pub fn sync(&mut self, pressed: bool) {
        self.pressed = pressed;
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drives a press lasting `hold` ms starting at `start`, ticking every ms.
    fn press(det: &mut GestureDetector, start: u32, hold: u32) -> Vec<Gesture> {
        let mut events = Vec::new();
        for t in start..start + hold {
            events.extend(det.update(true, t));
        }
        events.extend(det.update(false, start + hold));
        events
    }

    #[test]
    fn short_press_is_normal() {
        let mut det = GestureDetector::new(GestureConfig::default());
        assert_eq!(press(&mut det, 0, 150), vec![Gesture::Normal]);
    }

    #[test]
    fn second_press_in_window_is_double() {
        let mut det = GestureDetector::new(GestureConfig::default());
        assert_eq!(press(&mut det, 0, 100), vec![Gesture::Normal]);
        assert_eq!(press(&mut det, 400, 100), vec![Gesture::Double]);
    }

    #[test]
    fn second_press_after_window_is_normal() {
        let mut det = GestureDetector::new(GestureConfig::default());
        press(&mut det, 0, 100);
        assert_eq!(press(&mut det, 601, 100), vec![Gesture::Normal]);
    }

    #[test]
    fn window_is_measured_between_press_starts() {
        let mut det = GestureDetector::new(GestureConfig::default());
        press(&mut det, 0, 500);
        assert_eq!(press(&mut det, 600, 50), vec![Gesture::Double]);
    }

    #[test]
    fn third_quick_press_starts_over() {
        let mut det = GestureDetector::new(GestureConfig::default());
        press(&mut det, 0, 50);
        assert_eq!(press(&mut det, 200, 50), vec![Gesture::Double]);
        // The counter was reset by the double, so this counts as a first press
        assert_eq!(press(&mut det, 400, 50), vec![Gesture::Normal]);
    }

    #[test]
    fn long_press_fires_once_while_held() {
        let mut det = GestureDetector::new(GestureConfig::default());
        let mut long_at = None;
        for t in 0..5000 {
            if det.update(true, t) == Some(Gesture::Long) {
                assert!(long_at.is_none(), "long fired twice");
                long_at = Some(t);
            }
        }
        assert_eq!(long_at, Some(2000));
        assert_eq!(det.update(false, 5000), None);
    }

    #[test]
    fn release_just_under_hold_is_normal() {
        let mut det = GestureDetector::new(GestureConfig::default());
        assert_eq!(press(&mut det, 0, 1999), vec![Gesture::Normal]);
    }

    #[test]
    fn held_time_survives_clock_wrap() {
        let mut det = GestureDetector::new(GestureConfig::default());
        let start = u32::MAX - 10;
        det.update(true, start);
        assert_eq!(det.held_ms(start.wrapping_add(30)), 30);
        assert_eq!(det.update(false, start.wrapping_add(30)), Some(Gesture::Normal));
    }

    #[test]
    fn reset_while_held_swallows_the_release() {
        let mut det = GestureDetector::new(GestureConfig::default());
        det.update(true, 0);
        det.reset();
        assert_eq!(det.update(false, 50), None);
        assert_eq!(press(&mut det, 100, 50), vec![Gesture::Normal]);
    }

    #[test]
    fn sync_to_held_switch_is_silent() {
        let mut det = GestureDetector::new(GestureConfig::default());
        det.sync(true);
        assert_eq!(det.update(true, 2500), None);
        assert_eq!(det.update(false, 2600), None);
        assert_eq!(press(&mut det, 3000, 50), vec![Gesture::Normal]);
    }
}
