//! Spring reverb: a dispersive digital waveguide.
//!
//! Models the tank of a 1960s amp: the transducer is driven into a soft
//! `tanh` clip, four short allpass stages smear the wave the way a coiled
//! spring disperses high frequencies, and a single ~50 ms recirculating line
//! supplies the resonance. Two fixed taps on the damped feedback signal add
//! the metallic "boing".
//!
//! Unlike the other reverbs the output is blended internally by `mix`, and
//! both channels carry the same signal.

use flick_core::{Allpass, AllpassForm, DelayLine, OnePole};
use libm::tanhf;

use crate::Reverb;

const PRE_DELAY_SAMPLES: f32 = 64.0;
const PRE_DELAY_CAPACITY: usize = 256;

const DISPERSION_DELAYS: [usize; 4] = [120, 240, 336, 480];
const DISPERSION_CAPACITY: usize = 512;
const DISPERSION_FEEDBACK: f32 = 0.5;

const SPRING_LENGTH: usize = 2400;
const SPRING_CAPACITY: usize = 4800;

const TAP_DELAYS: [usize; 2] = [600, 1200];
const TAP_CAPACITY: usize = 2400;

/// Relative weights of the direct damped signal and the two taps.
const DIRECT_WEIGHT: f32 = 0.55;
const TAP_WEIGHTS: [f32; 2] = [0.25, 0.20];

const DRIVE: f32 = 1.4;
const DEFAULT_DAMPING_HZ: f32 = 6000.0;
const DEFAULT_DECAY: f32 = 0.65;
const DEFAULT_MIX: f32 = 0.5;

/// Waveguide spring reverb.
///
/// # Example
///
/// ```rust
/// use flick_effects::{Reverb, SpringReverb};
///
/// let mut spring = SpringReverb::new(48000.0);
/// spring.set_mix(1.0);
/// spring.set_damping(7000.0);
/// let (l, r) = spring.process_sample(0.5, 0.5);
/// assert_eq!(l, r);
/// ```
#[derive(Debug, Clone)]
pub struct SpringReverb {
    pre_delay: DelayLine,
    pre_delay_samples: f32,
    dispersion: [Allpass; 4],
    spring: DelayLine,
    taps: [DelayLine; 2],
    damping: OnePole,
    decay: f32,
    mix: f32,
    sample_rate: f32,
}

impl SpringReverb {
    /// Allocates the tank for `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            pre_delay: DelayLine::new(PRE_DELAY_CAPACITY),
            pre_delay_samples: PRE_DELAY_SAMPLES,
            dispersion: DISPERSION_DELAYS.map(|d| {
                Allpass::with_capacity(
                    AllpassForm::Schroeder,
                    DISPERSION_CAPACITY,
                    d as f32,
                    DISPERSION_FEEDBACK,
                )
            }),
            spring: DelayLine::new(SPRING_CAPACITY),
            taps: [DelayLine::new(TAP_CAPACITY), DelayLine::new(TAP_CAPACITY)],
            damping: OnePole::new(sample_rate, DEFAULT_DAMPING_HZ),
            decay: DEFAULT_DECAY,
            mix: DEFAULT_MIX,
            sample_rate,
        }
    }

    /// Sets the damping low-pass cutoff in Hz.
    pub fn set_damping(&mut self, hz: f32) {
        self.damping
            .set_frequency(hz.clamp(0.001 * self.sample_rate, 0.497 * self.sample_rate));
    }

    /// Damping cutoff in Hz.
    pub fn damping(&self) -> f32 {
        self.damping.frequency()
    }

    /// Current mix.
    pub fn mix(&self) -> f32 {
        self.mix
    }
}

impl Reverb for SpringReverb {
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mono = (left + right) * 0.5;

        self.pre_delay.write(mono);
        let driven = tanhf(self.pre_delay.read(self.pre_delay_samples.max(1.0)) * DRIVE);

        let recirculating = self.spring.read_at(SPRING_LENGTH);
        let damped = self.damping.process(recirculating);

        let mut dispersed = driven;
        for ap in &mut self.dispersion {
            dispersed = ap.process(dispersed);
        }
        self.spring.write(dispersed + damped * self.decay);

        let mut wet = damped * DIRECT_WEIGHT;
        for ((tap, &delay), &weight) in self.taps.iter_mut().zip(&TAP_DELAYS).zip(&TAP_WEIGHTS) {
            tap.write(damped);
            wet += tap.read_at(delay) * weight;
        }

        let out = mono * (1.0 - self.mix) + wet * self.mix;
        (out, out)
    }

    fn clear(&mut self) {
        self.pre_delay.clear();
        for ap in &mut self.dispersion {
            ap.clear();
        }
        self.spring.clear();
        for tap in &mut self.taps {
            tap.clear();
        }
        self.damping.reset();
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    fn set_decay(&mut self, decay: f32) {
        self.decay = decay.clamp(0.0, 0.999);
    }

    fn set_pre_delay(&mut self, seconds: f32) {
        self.pre_delay_samples =
            (seconds * self.sample_rate).clamp(0.0, (PRE_DELAY_CAPACITY - 1) as f32);
    }
}
