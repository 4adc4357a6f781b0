//! Stereo feedback delay.
//!
//! Two independent delay lines share one target time and one feedback
//! amount. The read position of each line glides toward the target with a
//! fixed per-sample coefficient, so tap tempo and knob changes sweep the
//! delay like a tape machine instead of clicking.
//!
//! The effect returns the wet signal only. Dry/wet mixing and makeup gain
//! belong to the caller.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use flick_core::{DelayLine, SampleStorage, SmoothedParam};

/// Per-sample glide coefficient for the read position.
pub const DELAY_TIME_SMOOTHING: f32 = 0.0002;

/// Stereo delay with smoothed time and feedback.
///
/// Generic over the delay memory so the two long buffers can come from a
/// [`SampleArena`](flick_core::SampleArena) on a device or from the heap on a
/// host.
///
/// # Example
///
/// ```rust
/// use flick_effects::DelayEffect;
///
/// let mut delay = DelayEffect::new(48000.0, 96000);
/// delay.set_delay_time(24000.0);
/// delay.set_feedback(0.4);
/// let (wet_l, wet_r) = delay.process_sample(0.5, 0.5);
/// assert_eq!((wet_l, wet_r), (0.0, 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct DelayEffect<S: SampleStorage = Box<[f32]>> {
    left: DelayLine<S>,
    right: DelayLine<S>,
    time_left: SmoothedParam,
    time_right: SmoothedParam,
    target: f32,
    feedback: f32,
    sample_rate: f32,
}

impl DelayEffect {
    /// Allocates both lines on the heap with `max_samples` of capacity each.
    pub fn new(sample_rate: f32, max_samples: usize) -> Self {
        Self::from_lines(
            sample_rate,
            DelayLine::new(max_samples),
            DelayLine::new(max_samples),
        )
    }
}

impl<S: SampleStorage> DelayEffect<S> {
    /// Builds the effect over two pre-allocated lines.
    pub fn from_lines(sample_rate: f32, left: DelayLine<S>, right: DelayLine<S>) -> Self {
        Self {
            left,
            right,
            time_left: SmoothedParam::new(0.0, DELAY_TIME_SMOOTHING),
            time_right: SmoothedParam::new(0.0, DELAY_TIME_SMOOTHING),
            target: 0.0,
            feedback: 0.0,
            sample_rate,
        }
    }

    /// Sets the target delay in samples, clamped to what the lines hold.
    pub fn set_delay_time(&mut self, samples: f32) {
        let max = self.left.max_delay().min(self.right.max_delay()) as f32;
        self.target = samples.clamp(0.0, max);
        self.time_left.set_target(self.target);
        self.time_right.set_target(self.target);
    }

    /// Target delay in samples.
    pub fn delay_time(&self) -> f32 {
        self.target
    }

    /// Delay the left line is reading at right now, in samples.
    pub fn current_delay(&self) -> f32 {
        self.time_left.get()
    }

    /// Sets the feedback amount, clamped to [0, 1].
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 1.0);
    }

    /// Current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sample rate the effect was built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest delay the lines can produce, in samples.
    pub fn max_delay(&self) -> usize {
        self.left.max_delay().min(self.right.max_delay())
    }

    /// Processes one stereo sample and returns the wet pair.
    #[inline]
    pub fn process_sample(&mut self, in_left: f32, in_right: f32) -> (f32, f32) {
        let delay_left = self.time_left.advance();
        let delay_right = self.time_right.advance();

        let read_left = self.left.read(delay_left);
        let read_right = self.right.read(delay_right);

        self.left.write(self.feedback * read_left + in_left);
        self.right.write(self.feedback * read_right + in_right);

        (read_left, read_right)
    }

    /// Resets current and target time to zero.
    ///
    /// The line contents are kept; what remains in them recirculates at the
    /// shortest delay and dies away with the feedback.
    pub fn clear(&mut self) {
        self.target = 0.0;
        self.time_left.clear();
        self.time_right.clear();
    }
}
