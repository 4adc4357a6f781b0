//! Biquad (bi-quadratic) filter structure.
//!
//! A generic second-order IIR section plus the two RBJ Audio EQ Cookbook
//! designs the pedal needs: the peaking EQ (harmonic tremolo tone stack and
//! the always-on resonance notches) and the low shelf.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a biquad from an RBJ coefficient tuple `(b0, b1, b2, a0, a1, a2)`.
    ///
    /// ```rust
    /// use flick_core::{Biquad, peaking_eq_coefficients};
    ///
    /// let notch = Biquad::from_coefficients(peaking_eq_coefficients(6020.0, -30.0, 40.0, 48000.0));
    /// ```
    pub fn from_coefficients(coeffs: (f32, f32, f32, f32, f32, f32)) -> Self {
        let mut biquad = Self::new();
        let (b0, b1, b2, a0, a1, a2) = coeffs;
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        biquad
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state without touching the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates peaking EQ coefficients using the RBJ cookbook formula.
///
/// A deep negative gain with a high Q makes a narrow notch.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `gain_db` - Boost (positive) or cut (negative) at the center, in dB
/// * `q` - Q factor (bandwidth = frequency / Q)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn peaking_eq_coefficients(
    frequency: f32,
    gain_db: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates low-shelf coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Shelf corner frequency in Hz
/// * `gain_db` - Shelf gain in dB
/// * `q` - Shelf slope expressed as Q
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn low_shelf_coefficients(
    frequency: f32,
    gain_db: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::sinf;

    fn sine_rms(filter: &mut Biquad, freq: f32, sample_rate: f32) -> f32 {
        let n = (sample_rate as usize) / 2;
        let mut sum = 0.0f32;
        let settle = n / 2;
        for i in 0..n {
            let x = sinf(2.0 * PI * freq * i as f32 / sample_rate);
            let y = filter.process(x);
            if i >= settle {
                sum += y * y;
            }
        }
        libm::sqrtf(sum / (n - settle) as f32)
    }

    #[test]
    fn passthrough_by_default() {
        let mut biquad = Biquad::new();
        assert_eq!(biquad.process(0.75), 0.75);
        assert_eq!(biquad.process(-0.25), -0.25);
    }

    #[test]
    fn notch_removes_center_frequency() {
        let mut notch =
            Biquad::from_coefficients(peaking_eq_coefficients(6020.0, -30.0, 40.0, 48000.0));
        let rms = sine_rms(&mut notch, 6020.0, 48000.0);
        // Unfiltered sine RMS is ~0.707; -30 dB puts it near 0.022
        assert!(rms < 0.05, "notch should cut the center, rms = {rms}");
    }

    #[test]
    fn notch_leaves_distant_frequencies() {
        let mut notch =
            Biquad::from_coefficients(peaking_eq_coefficients(6020.0, -30.0, 40.0, 48000.0));
        let rms = sine_rms(&mut notch, 440.0, 48000.0);
        assert!((rms - 0.707).abs() < 0.02, "440 Hz should pass, rms = {rms}");
    }

    #[test]
    fn low_shelf_cuts_lows_and_passes_highs() {
        let coeffs = low_shelf_coefficients(37.0, -10.5, 1.0, 48000.0);
        let mut shelf = Biquad::from_coefficients(coeffs);
        let low = sine_rms(&mut shelf, 10.0, 48000.0);
        shelf.clear();
        let high = sine_rms(&mut shelf, 2000.0, 48000.0);
        assert!(low < high * 0.5, "low {low} should sit well under high {high}");
        assert!((high - 0.707).abs() < 0.02);
    }

    #[test]
    fn clear_resets_history() {
        let mut biquad =
            Biquad::from_coefficients(peaking_eq_coefficients(254.0, 2.0, 0.707, 48000.0));
        for _ in 0..100 {
            biquad.process(1.0);
        }
        biquad.clear();
        assert_eq!(biquad.process(0.0), 0.0);
    }
}
