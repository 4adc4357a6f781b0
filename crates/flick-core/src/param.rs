//! Fixed-coefficient parameter smoothing.
//!
//! Each call to [`SmoothedParam::advance`] moves the value a fixed fraction
//! of the remaining distance toward the target:
//!
//! ```text
//! value += coeff * (target - value)
//! ```
//!
//! The step is therefore bounded by `coeff * |target - value|` and the value
//! never overshoots. The delay uses a coefficient of 0.0002 so tempo and knob
//! changes glide instead of clicking.

use crate::slew_toward;

/// A value that slews toward its target one step per sample.
///
/// # Example
///
/// ```rust
/// use flick_core::SmoothedParam;
///
/// let mut time = SmoothedParam::new(0.0, 0.5);
/// time.set_target(100.0);
/// assert_eq!(time.advance(), 50.0);
/// assert_eq!(time.advance(), 75.0);
/// ```
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// Creates a settled parameter at `initial` with the given per-step
    /// coefficient, clamped to [0, 1].
    pub fn new(initial: f32, coeff: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: coeff.clamp(0.0, 1.0),
        }
    }

    /// Sets a new target; the value starts moving on the next advance.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Moves one step toward the target and returns the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current = slew_toward(self.current, self.target, self.coeff);
        self.current
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Per-step coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// Jumps straight to `value` and settles there.
    pub fn snap(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    /// Snaps to zero.
    pub fn clear(&mut self) {
        self.snap(0.0);
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}
