//! Delay-based allpass sections for reverb diffusion.
//!
//! All three reverbs smear their input through short allpass sections, but
//! each voices them differently. [`AllpassForm`] names the three update
//! rules; `r` is the delayed sample, `x` the input and `g` the coefficient:
//!
//! | Form | Line input | Output | Used by |
//! |------|------------|--------|---------|
//! | `Schroeder` | `x + g*r` | `r - x` | spring dispersion |
//! | `Diffuser` | `x + g*r` | `r - g*x` | hall input diffusion |
//! | `Lattice` | `x - g*r` | `r + g*v` | plate diffusers and tank |
//!
//! Only `Lattice` has a perfectly flat magnitude response. The other two
//! color the signal slightly, which is part of their voicing.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use crate::{DelayLine, SampleStorage, flush_denormal};
use alloc::boxed::Box;

/// Update rule of an [`Allpass`] section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AllpassForm {
    /// `out = r - x`, line input `x + g*r`
    #[default]
    Schroeder,
    /// `out = r - g*x`, line input `x + g*r`
    Diffuser,
    /// Normalized lattice: `v = x - g*r`, `out = r + g*v`
    Lattice,
}

/// Allpass section built on a [`DelayLine`].
///
/// # Example
///
/// ```rust
/// use flick_core::{Allpass, AllpassForm};
///
/// let mut ap = Allpass::new(AllpassForm::Schroeder, 120, 0.5);
/// let first = ap.process(1.0);
/// assert_eq!(first, -1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Allpass<S: SampleStorage = Box<[f32]>> {
    line: DelayLine<S>,
    delay: f32,
    coeff: f32,
    form: AllpassForm,
}

impl Allpass {
    /// Creates a section whose line holds exactly `delay_samples`.
    pub fn new(form: AllpassForm, delay_samples: usize, coeff: f32) -> Self {
        Self::with_capacity(form, delay_samples + 1, delay_samples as f32, coeff)
    }

    /// Creates a section with room to change or modulate its delay up to
    /// `capacity - 1` samples.
    pub fn with_capacity(form: AllpassForm, capacity: usize, delay_samples: f32, coeff: f32) -> Self {
        Self::from_line(form, DelayLine::new(capacity), delay_samples, coeff)
    }
}

impl<S: SampleStorage> Allpass<S> {
    /// Builds a section over an existing delay line.
    pub fn from_line(form: AllpassForm, line: DelayLine<S>, delay_samples: f32, coeff: f32) -> Self {
        let mut ap = Self {
            line,
            delay: 1.0,
            coeff,
            form,
        };
        ap.set_delay(delay_samples);
        ap
    }

    /// Sets the nominal delay, clamped to what the line can hold.
    pub fn set_delay(&mut self, delay_samples: f32) {
        self.delay = delay_samples.clamp(1.0, self.line.max_delay() as f32);
    }

    /// Nominal delay in samples.
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Sets the allpass coefficient.
    pub fn set_coeff(&mut self, coeff: f32) {
        self.coeff = coeff;
    }

    /// Current coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// Processes one sample at the nominal delay.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.process_at(input, self.delay)
    }

    /// Processes one sample reading the line at `delay` instead of the
    /// nominal delay. Used for modulated sections.
    #[inline]
    pub fn process_at(&mut self, input: f32, delay: f32) -> f32 {
        let r = self.line.read(delay);
        let g = self.coeff;
        match self.form {
            AllpassForm::Schroeder => {
                self.line.write(flush_denormal(input + r * g));
                r - input
            }
            AllpassForm::Diffuser => {
                self.line.write(flush_denormal(input + r * g));
                r - input * g
            }
            AllpassForm::Lattice => {
                let v = flush_denormal(input - r * g);
                self.line.write(v);
                r + v * g
            }
        }
    }

    /// Reads the internal line `delay` writes back. Plate output taps use this.
    #[inline]
    pub fn tap(&self, delay: usize) -> f32 {
        self.line.read_at(delay)
    }

    /// Zeroes the internal line.
    pub fn clear(&mut self) {
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_energy(ap: &mut Allpass, len: usize) -> f32 {
        let mut energy = 0.0;
        for i in 0..len {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let y = ap.process(x);
            energy += y * y;
        }
        energy
    }

    #[test]
    fn schroeder_first_output_is_inverted_input() {
        let mut ap = Allpass::new(AllpassForm::Schroeder, 10, 0.5);
        assert_eq!(ap.process(0.8), -0.8);
    }

    #[test]
    fn impulse_reappears_after_delay() {
        let mut ap = Allpass::new(AllpassForm::Diffuser, 4, 0.5);
        let mut out = [0.0f32; 6];
        for (i, o) in out.iter_mut().enumerate() {
            *o = ap.process(if i == 0 { 1.0 } else { 0.0 });
        }
        assert_eq!(out[0], -0.5);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[4], 1.0);
    }

    #[test]
    fn lattice_preserves_impulse_energy() {
        let mut ap = Allpass::new(AllpassForm::Lattice, 7, 0.6);
        let energy = impulse_energy(&mut ap, 2000);
        assert!((energy - 1.0).abs() < 1e-3, "energy = {energy}");
    }

    #[test]
    fn delay_clamps_to_line() {
        let mut ap = Allpass::new(AllpassForm::Schroeder, 10, 0.5);
        ap.set_delay(50.0);
        assert_eq!(ap.delay(), 10.0);
    }

    #[test]
    fn clear_silences_tail() {
        let mut ap = Allpass::new(AllpassForm::Schroeder, 3, 0.5);
        ap.process(1.0);
        ap.clear();
        for _ in 0..10 {
            assert_eq!(ap.process(0.0), 0.0);
        }
    }
}
