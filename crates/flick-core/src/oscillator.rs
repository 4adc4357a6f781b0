//! Phase-accumulator oscillator driving the tremolos.
//!
//! Two shapes are available. `Sine` is a plain `sin(2πp)`. `RoundedSquare`
//! pushes that sine through an arctangent soft clip,
//!
//! ```text
//! atan(sin(2πp) / 0.04) / atan(1 / 0.04)
//! ```
//!
//! which keeps the flat tops of a square wave but rounds the edges the way
//! an optical tremolo does. Both shapes are scaled by the amplitude.

use core::f32::consts::TAU;
use libm::{atanf, sinf};

/// Softness of the rounded square edges. Smaller is harder.
const SQUARE_SOFTNESS: f32 = 0.04;

/// Oscillator output shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// `sin(2πp)`
    #[default]
    Sine,
    /// Arctangent-clipped sine, normalized to ±1.
    RoundedSquare,
}

/// Phase-accumulator oscillator.
///
/// # Example
///
/// ```rust
/// use flick_core::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new(48000.0);
/// osc.set_waveform(Waveform::RoundedSquare);
/// osc.set_frequency(4.0);
/// osc.set_amplitude(0.25);
/// let value = osc.process();
/// assert!(value.abs() <= 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f32,
    phase_inc: f32,
    frequency: f32,
    amplitude: f32,
    sample_rate: f32,
    waveform: Waveform,
}

impl Oscillator {
    /// Creates a 1 Hz full-amplitude sine.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 1.0 / sample_rate,
            frequency: 1.0,
            amplitude: 1.0,
            sample_rate,
            waveform: Waveform::Sine,
        }
    }

    /// Selects the output shape.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Sets the frequency in Hz.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
        self.phase_inc = hz / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Sets the peak output amplitude.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    /// Current phase in [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restarts the cycle.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produces the next sample and advances the phase.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let shape = match self.waveform {
            Waveform::Sine => sinf(TAU * self.phase),
            Waveform::RoundedSquare => {
                atanf(sinf(TAU * self.phase) / SQUARE_SOFTNESS) / atanf(1.0 / SQUARE_SOFTNESS)
            }
        };

        self.phase += self.phase_inc;
        if self.phase > 1.0 {
            self.phase -= 1.0;
        }

        shape * self.amplitude
    }
}
