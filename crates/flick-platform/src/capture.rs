//! Soft takeover.
//!
//! When a knob or toggle is reassigned to a different parameter (entering an
//! edit mode, entering tap tempo) its physical position usually has nothing
//! to do with the parameter's current value. A [`ParameterCapture`] freezes
//! the parameter at that value and keeps returning it until the control is
//! moved far enough away from where it was when captured, then follows the
//! control from that point on.
//!
//! The capture does not read hardware itself; every call is handed the live
//! reading, which keeps it usable from any control source.

use crate::SwitchPosition;

/// Default knob movement, as a fraction of full travel, that releases a
/// capture.
pub const DEFAULT_THRESHOLD: f32 = 0.05;

/// A control reading that can be captured.
pub trait CaptureValue: Copy {
    /// Whether `live` has moved far enough from `baseline` to release the
    /// capture. Reaching the threshold exactly counts as moved.
    fn moved(baseline: Self, live: Self, threshold: f32) -> bool;
}

impl CaptureValue for f32 {
    #[inline]
    fn moved(baseline: Self, live: Self, threshold: f32) -> bool {
        (live - baseline).abs() >= threshold
    }
}

impl CaptureValue for SwitchPosition {
    #[inline]
    fn moved(baseline: Self, live: Self, _threshold: f32) -> bool {
        live != baseline
    }
}

/// Freeze-until-moved wrapper around one control.
///
/// # Example
///
/// ```rust
/// use flick_platform::KnobCapture;
///
/// let mut decay = KnobCapture::default();
/// decay.capture(0.30, 0.80); // knob sits at 0.30, decay is 0.80
/// assert_eq!(decay.process(0.32), 0.80);
/// assert_eq!(decay.process(0.36), 0.36); // moved by >= 0.05
/// assert_eq!(decay.process(0.31), 0.31);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParameterCapture<T: CaptureValue> {
    baseline: T,
    frozen: T,
    armed: bool,
    threshold: f32,
}

/// Soft takeover for a knob.
pub type KnobCapture = ParameterCapture<f32>;

/// Soft takeover for a 3-way toggle.
pub type SwitchCapture = ParameterCapture<SwitchPosition>;

impl<T: CaptureValue> ParameterCapture<T> {
    /// Creates a released capture. `initial` fills the baseline and frozen
    /// slots until the first [`capture`](Self::capture).
    pub fn new(initial: T, threshold: f32) -> Self {
        Self {
            baseline: initial,
            frozen: initial,
            armed: false,
            threshold,
        }
    }

    /// Records `live` as the baseline and freezes the output at `frozen`.
    pub fn capture(&mut self, live: T, frozen: T) {
        self.baseline = live;
        self.frozen = frozen;
        self.armed = true;
    }

    /// Returns the frozen value until `live` moves past the threshold, then
    /// `live` on that call and every call after.
    #[inline]
    pub fn process(&mut self, live: T) -> T {
        if !self.armed {
            return live;
        }
        if T::moved(self.baseline, live, self.threshold) {
            self.armed = false;
            return live;
        }
        self.frozen
    }

    /// Releases the capture without waiting for movement.
    pub fn reset(&mut self) {
        self.armed = false;
    }

    /// True while the frozen value is still being returned.
    pub fn is_frozen(&self) -> bool {
        self.armed
    }

    /// Live reading recorded at capture time.
    pub fn baseline(&self) -> T {
        self.baseline
    }
}

impl Default for KnobCapture {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_THRESHOLD)
    }
}

impl Default for SwitchCapture {
    fn default() -> Self {
        Self::new(SwitchPosition::Middle, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_capture_passes_through() {
        let mut cap = KnobCapture::default();
        assert!(!cap.is_frozen());
        assert_eq!(cap.process(0.42), 0.42);
    }

    #[test]
    fn knob_holds_frozen_value_below_threshold() {
        let mut cap = KnobCapture::default();
        cap.capture(0.5, 0.1);
        for live in [0.5, 0.52, 0.46, 0.549] {
            assert_eq!(cap.process(live), 0.1);
        }
        assert!(cap.is_frozen());
    }

    #[test]
    fn threshold_boundary_counts_as_moved() {
        let mut cap = KnobCapture::new(0.0, 0.25);
        cap.capture(0.5, 0.9);
        assert_eq!(cap.process(0.75), 0.75);
        assert!(!cap.is_frozen());
    }

    #[test]
    fn release_is_permanent_until_next_capture() {
        let mut cap = KnobCapture::default();
        cap.capture(0.2, 0.7);
        assert_eq!(cap.process(0.3), 0.3);
        // Back near the baseline, still following the knob
        assert_eq!(cap.process(0.2), 0.2);
        cap.capture(0.2, 0.7);
        assert_eq!(cap.process(0.2), 0.7);
    }

    #[test]
    fn switch_releases_on_any_position_change() {
        let mut cap = SwitchCapture::default();
        cap.capture(SwitchPosition::Up, SwitchPosition::Down);
        assert_eq!(cap.process(SwitchPosition::Up), SwitchPosition::Down);
        assert_eq!(cap.process(SwitchPosition::Middle), SwitchPosition::Middle);
        assert_eq!(cap.process(SwitchPosition::Up), SwitchPosition::Up);
    }

    #[test]
    fn reset_releases() {
        let mut cap = SwitchCapture::default();
        cap.capture(SwitchPosition::Up, SwitchPosition::Down);
        cap.reset();
        assert_eq!(cap.process(SwitchPosition::Up), SwitchPosition::Up);
    }
}
