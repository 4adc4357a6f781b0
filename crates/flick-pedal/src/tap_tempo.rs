//! Tap tempo estimation.
//!
//! The last three taps are kept newest first. Once two are in, the delay is
//! the mean interval between the retained taps, converted to samples and
//! clamped to the delay range.
//!
//! The tapped value outlives the tap session: it is persisted and keeps
//! driving the delay in normal mode until the delay knob is moved away from
//! the baseline recorded when the session ended.

use crate::PedalConfig;

/// Tap history and the delay derived from it.
///
/// ```rust
/// use flick_pedal::{PedalConfig, TapTempo};
///
/// let mut tap = TapTempo::new(&PedalConfig::default());
/// tap.register_tap(1000);
/// assert_eq!(tap.tapped_samples(), None);
/// tap.register_tap(1500);
/// assert_eq!(tap.tapped_samples(), Some(24000.0));
/// ```
#[derive(Debug, Clone)]
pub struct TapTempo {
    timestamps: [u32; 3],
    count: usize,
    tapped_samples: f32,
    tempo_ms: f32,
    last_tap_ms: u32,
    flash_remaining: u32,
    knob_baseline: Option<f32>,
    sample_rate: f32,
    min_samples: f32,
    max_samples: f32,
    timeout_ms: u32,
    flash_blocks: u32,
}

impl TapTempo {
    /// Empty history, no tapped delay.
    pub fn new(config: &PedalConfig) -> Self {
        Self {
            timestamps: [0; 3],
            count: 0,
            tapped_samples: 0.0,
            tempo_ms: 0.0,
            last_tap_ms: 0,
            flash_remaining: 0,
            knob_baseline: None,
            sample_rate: config.sample_rate,
            min_samples: config.min_delay_samples(),
            max_samples: config.max_delay(),
            timeout_ms: config.tap_timeout_ms,
            flash_blocks: config.tap_flash_blocks,
        }
    }

    /// Restores a persisted tapped delay. Non-positive values mean none.
    pub fn restore(&mut self, tapped_samples: f32) {
        self.tapped_samples = tapped_samples.max(0.0);
        self.knob_baseline = None;
    }

    /// Starts a session seeded with `seed_samples` as the current beat.
    pub fn begin(&mut self, seed_samples: f32, now_ms: u32) {
        self.timestamps = [0; 3];
        self.count = 0;
        self.flash_remaining = 0;
        self.tapped_samples = seed_samples.max(0.0);
        self.tempo_ms = self.tapped_samples / self.sample_rate * 1000.0;
        self.last_tap_ms = now_ms;
    }

    /// Records a tap. Returns true when the tap produced a new estimate.
    pub fn register_tap(&mut self, now_ms: u32) -> bool {
        self.timestamps = [now_ms, self.timestamps[0], self.timestamps[1]];
        self.count = (self.count + 1).min(3);
        self.last_tap_ms = now_ms;
        self.flash_remaining = self.flash_blocks;

        if self.count < 2 {
            return false;
        }

        let intervals = self.count - 1;
        let total: u32 = (0..intervals)
            .map(|i| self.timestamps[i].wrapping_sub(self.timestamps[i + 1]))
            .sum();
        let avg_ms = total as f32 / intervals as f32;

        self.tapped_samples =
            (avg_ms * self.sample_rate / 1000.0).clamp(self.min_samples, self.max_samples);
        self.tempo_ms = avg_ms;

        #[cfg(feature = "tracing")]
        tracing::debug!(avg_ms, samples = self.tapped_samples, "tap tempo estimate");
        true
    }

    /// Tapped beat in samples, if one is set.
    pub fn tapped_samples(&self) -> Option<f32> {
        (self.tapped_samples > 0.0).then_some(self.tapped_samples)
    }

    /// Tapped value for persistence, 0 when none.
    pub fn persisted_samples(&self) -> f32 {
        self.tapped_samples
    }

    /// Beat period in milliseconds for the tempo LED, 0 when unknown.
    pub fn tempo_ms(&self) -> f32 {
        self.tempo_ms
    }

    /// Number of retained taps.
    pub fn tap_count(&self) -> usize {
        self.count
    }

    /// True once the session has gone longer than the timeout without a tap.
    pub fn timed_out(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_tap_ms) > self.timeout_ms
    }

    /// Drops the tapped delay, handing the delay back to the knob.
    pub fn clear(&mut self) {
        self.tapped_samples = 0.0;
        self.knob_baseline = None;
    }

    /// Delay knob reading the tapped value is held against.
    pub fn knob_baseline(&self) -> Option<f32> {
        self.knob_baseline
    }

    /// Sets the delay knob baseline.
    pub fn set_knob_baseline(&mut self, baseline: Option<f32>) {
        self.knob_baseline = baseline;
    }

    /// Counts down the tap flash; true while it should still show.
    pub fn tick_flash(&mut self) -> bool {
        if self.flash_remaining > 0 {
            self.flash_remaining -= 1;
            true
        } else {
            false
        }
    }
}
