//! One-pole filters for damping, band splitting, and tone shaping.
//!
//! Both filters share the pole `a = exp(-2π * freq / sample_rate)`:
//!
//! ```text
//! lowpass:  y[n] = (1 - a) * x[n] + a * y[n-1]
//! highpass: y[n] = (1 + a) / 2 * (x[n] - x[n-1]) + a * y[n-1]
//! ```
//!
//! 6 dB/octave, zero latency, one or two multiplies per sample. The reverbs
//! use the lowpass to damp their recirculating paths; the harmonic tremolo
//! uses both to split the signal into bass and treble bands.
//!
//! # Usage
//!
//! ```rust
//! use flick_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0);
//! ```

use crate::flush_denormal;
use libm::expf;

fn pole(freq_hz: f32, sample_rate: f32) -> f32 {
    expf(-core::f32::consts::TAU * freq_hz / sample_rate)
}

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in (0, 1) for positive frequencies
/// - `state` is flushed to zero when below 1e-20 (denormal protection)
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq_hz` - Cutoff frequency in Hz
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            state: 0.0,
            coeff: pole(freq_hz, sample_rate),
            sample_rate,
            freq: freq_hz,
        }
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.coeff = pole(freq_hz, self.sample_rate);
    }

    /// Current cutoff frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    /// Pole coefficient `a` in `y = (1-a)x + a*y1`.
    pub fn coefficient(&self) -> f32 {
        self.coeff
    }

    /// Last output sample.
    pub fn state(&self) -> f32 {
        self.state
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal((1.0 - self.coeff) * input + self.coeff * self.state);
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.coeff = pole(self.freq, sample_rate);
    }
}

/// One-pole (6 dB/oct) highpass filter.
///
/// Uses the same pole as [`OnePole`], so a lowpass and a highpass at the
/// same frequency cross over at -3 dB.
#[derive(Debug, Clone)]
pub struct OnePoleHighpass {
    prev_x: f32,
    prev_y: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePoleHighpass {
    /// Create a new one-pole highpass filter.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            prev_x: 0.0,
            prev_y: 0.0,
            coeff: pole(freq_hz, sample_rate),
            sample_rate,
            freq: freq_hz,
        }
    }

    /// Set the cutoff frequency.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.coeff = pole(freq_hz, self.sample_rate);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let y = (1.0 + self.coeff) * 0.5 * (input - self.prev_x) + self.coeff * self.prev_y;
        self.prev_x = input;
        self.prev_y = flush_denormal(y);
        self.prev_y
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.prev_x = 0.0;
        self.prev_y = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.coeff = pole(self.freq, sample_rate);
    }
}
