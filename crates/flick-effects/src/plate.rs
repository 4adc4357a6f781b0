//! Plate reverb: Dattorro's figure-eight tank.
//!
//! After J. Dattorro, "Effect Design Part 1: Reverberator and Other Filters"
//! (JAES, 1997). Delay lengths are the published values at 29761 Hz,
//! rescaled to the running sample rate and stretched by a fixed time scale.
//!
//! ```text
//!  L+R ─► pre-delay ─► high-cut ─► low-cut ─► 4 × AP ─┬─────────────────────┐
//!                                                     ▼                     ▼
//!      ┌─► + ─► modAP ─► D ─► damp ─► ×decay ─► AP ─► D ─┐   ┌─ ... mirror half ...
//!      │                                                 │   │
//!      └──────────────── ×decay ◄── right half ◄─────────┘───┘
//! ```
//!
//! Each output channel sums seven taps taken from the opposite halves of
//! the tank, which keeps left and right decorrelated.

use flick_core::{Allpass, AllpassForm, DelayLine, OnePole, OnePoleHighpass};

use crate::Reverb;

/// Rate at which the published delay lengths are specified.
const REFERENCE_RATE: f32 = 29761.0;
/// Stretch applied to every delay length.
const TIME_SCALE: f32 = 1.0075;

const INPUT_DIFFUSERS: [(usize, f32); 4] = [(142, 0.75), (107, 0.75), (379, 0.625), (277, 0.625)];

/// Per half: modulated allpass, first delay, fixed allpass, second delay.
const LEFT_TANK: [usize; 4] = [672, 4453, 1800, 3720];
const RIGHT_TANK: [usize; 4] = [908, 4217, 2656, 3163];

const DECAY_DIFFUSION_1: f32 = 0.70;
const DECAY_DIFFUSION_2: f32 = 0.50;

/// Largest modulation excursion, in reference-rate samples.
const MAX_EXCURSION: f32 = 16.0;
/// LFO rates of the two modulated allpasses at unit speed.
const LFO_BASE_HZ: [f32; 2] = [0.5, 0.3];

/// Tank low-cut, in Hz.
const LOW_CUT_HZ: f32 = 100.0;
const MAX_PRE_DELAY_SECONDS: f32 = 0.5;
const OUTPUT_GAIN: f32 = 0.6;

/// Where an output tap reads from.
#[derive(Clone, Copy)]
enum Node {
    LeftDelay1,
    LeftAllpass,
    LeftDelay2,
    RightDelay1,
    RightAllpass,
    RightDelay2,
}

/// Output taps as (sign, node, offset at the reference rate).
const LEFT_TAPS: [(f32, Node, usize); 7] = [
    (1.0, Node::RightDelay1, 266),
    (1.0, Node::RightDelay1, 2974),
    (-1.0, Node::RightAllpass, 1913),
    (1.0, Node::RightDelay2, 1996),
    (-1.0, Node::LeftDelay1, 1990),
    (-1.0, Node::LeftAllpass, 187),
    (-1.0, Node::LeftDelay2, 1066),
];

const RIGHT_TAPS: [(f32, Node, usize); 7] = [
    (1.0, Node::LeftDelay1, 353),
    (1.0, Node::LeftDelay1, 3627),
    (-1.0, Node::LeftAllpass, 1228),
    (1.0, Node::LeftDelay2, 2673),
    (-1.0, Node::RightDelay1, 2111),
    (-1.0, Node::RightAllpass, 335),
    (-1.0, Node::RightDelay2, 121),
];

/// Trisaw LFO: rises for `rise` of the cycle, falls for the rest.
///
/// A rise of 0.5 is a triangle; small values approach a falling ramp.
#[derive(Debug, Clone)]
struct TriSaw {
    phase: f32,
    inc: f32,
}

impl TriSaw {
    /// Next value in [-1, 1].
    #[inline]
    fn tick(&mut self, rise: f32) -> f32 {
        let p = self.phase;
        self.phase += self.inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        let unipolar = if p < rise {
            p / rise
        } else {
            (1.0 - p) / (1.0 - rise)
        };
        unipolar * 2.0 - 1.0
    }
}

/// One half of the figure-eight tank.
#[derive(Debug, Clone)]
struct TankHalf {
    mod_allpass: Allpass,
    mod_delay: f32,
    delay1: DelayLine,
    delay1_len: usize,
    damping: OnePole,
    low_cut: OnePoleHighpass,
    allpass: Allpass,
    delay2: DelayLine,
    delay2_len: usize,
}

impl TankHalf {
    fn new(lengths: [usize; 4], scale: f32, sample_rate: f32, damping_hz: f32) -> Self {
        let scaled = |n: usize| ((n as f32 * scale) as usize).max(1);
        let mod_delay = lengths[0] as f32 * scale;
        let mod_capacity = (mod_delay + MAX_EXCURSION * scale) as usize + 2;
        let delay1_len = scaled(lengths[1]);
        let delay2_len = scaled(lengths[3]);
        Self {
            mod_allpass: Allpass::with_capacity(
                AllpassForm::Lattice,
                mod_capacity,
                mod_delay,
                -DECAY_DIFFUSION_1,
            ),
            mod_delay,
            delay1: DelayLine::new(delay1_len + 1),
            delay1_len,
            damping: OnePole::new(sample_rate, damping_hz),
            low_cut: OnePoleHighpass::new(sample_rate, LOW_CUT_HZ),
            allpass: Allpass::new(AllpassForm::Lattice, scaled(lengths[2]), DECAY_DIFFUSION_2),
            delay2: DelayLine::new(delay2_len + 1),
            delay2_len,
        }
    }

    /// Output of the half from the previous sample.
    #[inline]
    fn feedback(&self) -> f32 {
        self.delay2.read_at(self.delay2_len)
    }

    #[inline]
    fn process(&mut self, input: f32, excursion: f32, decay: f32) {
        let delayed = self.delay1.read_at(self.delay1_len);
        let late = self.delay2_input(delayed, decay);

        let early = self
            .mod_allpass
            .process_at(input, (self.mod_delay + excursion).max(1.0));
        self.delay1.write(early);
        self.delay2.write(late);
    }

    #[inline]
    fn delay2_input(&mut self, delayed: f32, decay: f32) -> f32 {
        let damped = self.low_cut.process(self.damping.process(delayed)) * decay;
        self.allpass.process(damped)
    }

    fn clear(&mut self) {
        self.mod_allpass.clear();
        self.delay1.clear();
        self.damping.reset();
        self.low_cut.reset();
        self.allpass.clear();
        self.delay2.clear();
    }
}

/// Dattorro plate reverb.
///
/// Wet-only output. Responds to every setter of the [`Reverb`] contract
/// except mix: decay, diffusion, pre-delay, both high-cuts, and the three
/// modulation controls. Modulation units are native to this algorithm:
///
/// - speed multiplies the base LFO rates (0.5 Hz and 0.3 Hz)
/// - depth is the excursion in reference-rate samples (0..16)
/// - shape is the trisaw rise ratio (0.5 triangle, toward 0 a ramp)
#[derive(Debug, Clone)]
pub struct PlateReverb {
    pre_delay: DelayLine,
    pre_delay_samples: f32,
    input_high_cut: OnePole,
    input_low_cut: OnePoleHighpass,
    diffusers: [Allpass; 4],
    left: TankHalf,
    right: TankHalf,
    lfos: [TriSaw; 2],
    mod_speed: f32,
    excursion: f32,
    shape: f32,
    decay: f32,
    scale: f32,
    sample_rate: f32,
}

impl PlateReverb {
    /// Default decay.
    pub const DEFAULT_DECAY: f32 = 0.8;
    /// Default tank diffusion.
    pub const DEFAULT_DIFFUSION: f32 = 0.85;
    /// Default high-cut for input and tank, in Hz.
    pub const DEFAULT_HIGH_CUT_HZ: f32 = 2093.0;
    /// Default modulation speed multiplier.
    pub const DEFAULT_MOD_SPEED: f32 = 0.8;
    /// Default modulation depth.
    pub const DEFAULT_MOD_DEPTH: f32 = 1.5;
    /// Default modulation shape.
    pub const DEFAULT_MOD_SHAPE: f32 = 0.25;

    /// Allocates the tank for `sample_rate` with default parameters.
    pub fn new(sample_rate: f32) -> Self {
        let scale = sample_rate / REFERENCE_RATE * TIME_SCALE;
        let diffusers = INPUT_DIFFUSERS.map(|(len, coeff)| {
            Allpass::new(
                AllpassForm::Lattice,
                ((len as f32 * scale) as usize).max(1),
                coeff,
            )
        });
        let pre_capacity = (MAX_PRE_DELAY_SECONDS * sample_rate) as usize + 2;

        let mut plate = Self {
            pre_delay: DelayLine::new(pre_capacity),
            pre_delay_samples: 0.0,
            input_high_cut: OnePole::new(sample_rate, Self::DEFAULT_HIGH_CUT_HZ),
            input_low_cut: OnePoleHighpass::new(sample_rate, LOW_CUT_HZ),
            diffusers,
            left: TankHalf::new(LEFT_TANK, scale, sample_rate, Self::DEFAULT_HIGH_CUT_HZ),
            right: TankHalf::new(RIGHT_TANK, scale, sample_rate, Self::DEFAULT_HIGH_CUT_HZ),
            lfos: [TriSaw { phase: 0.0, inc: 0.0 }, TriSaw { phase: 0.5, inc: 0.0 }],
            mod_speed: 0.0,
            excursion: 0.0,
            shape: Self::DEFAULT_MOD_SHAPE,
            decay: Self::DEFAULT_DECAY,
            scale,
            sample_rate,
        };
        plate.set_diffusion(Self::DEFAULT_DIFFUSION);
        plate.set_tank_mod_speed(Self::DEFAULT_MOD_SPEED);
        plate.set_tank_mod_depth(Self::DEFAULT_MOD_DEPTH);
        plate
    }

    /// Current decay.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Modulation speed multiplier.
    pub fn mod_speed(&self) -> f32 {
        self.mod_speed
    }

    /// Modulation excursion in samples at the running rate.
    pub fn excursion(&self) -> f32 {
        self.excursion
    }

    /// Modulation rise ratio.
    pub fn mod_shape(&self) -> f32 {
        self.shape
    }

    fn clamp_cutoff(&self, hz: f32) -> f32 {
        hz.clamp(0.001 * self.sample_rate, 0.497 * self.sample_rate)
    }

    fn tap(&self, node: Node, offset: usize) -> f32 {
        let d = ((offset as f32 * self.scale) as usize).max(1);
        match node {
            Node::LeftDelay1 => self.left.delay1.read_at(d),
            Node::LeftAllpass => self.left.allpass.tap(d),
            Node::LeftDelay2 => self.left.delay2.read_at(d),
            Node::RightDelay1 => self.right.delay1.read_at(d),
            Node::RightAllpass => self.right.allpass.tap(d),
            Node::RightDelay2 => self.right.delay2.read_at(d),
        }
    }

    fn sum_taps(&self, taps: &[(f32, Node, usize); 7]) -> f32 {
        taps.iter()
            .map(|&(sign, node, offset)| sign * self.tap(node, offset))
            .sum::<f32>()
            * OUTPUT_GAIN
    }
}

impl Reverb for PlateReverb {
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.pre_delay.write((left + right) * 0.5);
        let mut x = self.pre_delay.read(self.pre_delay_samples.max(1.0));
        x = self.input_low_cut.process(self.input_high_cut.process(x));
        for ap in &mut self.diffusers {
            x = ap.process(x);
        }

        let left_feedback = self.left.feedback();
        let right_feedback = self.right.feedback();
        let shape = self.shape;
        let excursion_l = self.lfos[0].tick(shape) * self.excursion;
        let excursion_r = self.lfos[1].tick(shape) * self.excursion;

        self.left
            .process(x + right_feedback * self.decay, excursion_l, self.decay);
        self.right
            .process(x + left_feedback * self.decay, excursion_r, self.decay);

        (self.sum_taps(&LEFT_TAPS), self.sum_taps(&RIGHT_TAPS))
    }

    fn clear(&mut self) {
        self.pre_delay.clear();
        self.input_high_cut.reset();
        self.input_low_cut.reset();
        for ap in &mut self.diffusers {
            ap.clear();
        }
        self.left.clear();
        self.right.clear();
    }

    fn set_decay(&mut self, decay: f32) {
        self.decay = decay.clamp(0.0, 0.99);
    }

    fn set_diffusion(&mut self, diffusion: f32) {
        let d = diffusion.clamp(0.0, 1.0);
        for half in [&mut self.left, &mut self.right] {
            half.mod_allpass.set_coeff(-DECAY_DIFFUSION_1 * d);
            half.allpass.set_coeff(DECAY_DIFFUSION_2 * d);
        }
    }

    fn set_pre_delay(&mut self, seconds: f32) {
        self.pre_delay_samples =
            (seconds * self.sample_rate).clamp(0.0, self.pre_delay.max_delay() as f32);
    }

    fn set_input_high_cut(&mut self, hz: f32) {
        let hz = self.clamp_cutoff(hz);
        self.input_high_cut.set_frequency(hz);
    }

    fn set_tank_high_cut(&mut self, hz: f32) {
        let hz = self.clamp_cutoff(hz);
        self.left.damping.set_frequency(hz);
        self.right.damping.set_frequency(hz);
    }

    fn set_tank_mod_speed(&mut self, speed: f32) {
        self.mod_speed = speed.clamp(0.0, 10.0);
        for (lfo, base) in self.lfos.iter_mut().zip(LFO_BASE_HZ) {
            lfo.inc = base * self.mod_speed / self.sample_rate;
        }
    }

    fn set_tank_mod_depth(&mut self, depth: f32) {
        self.excursion = depth.clamp(0.0, MAX_EXCURSION) * self.scale;
    }

    fn set_tank_mod_shape(&mut self, shape: f32) {
        self.shape = shape.clamp(0.01, 0.99);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_energy(plate: &mut PlateReverb, len: usize) -> (f32, f32) {
        let mut el = 0.0;
        let mut er = 0.0;
        for i in 0..len {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (l, r) = plate.process_sample(x, x);
            el += l * l;
            er += r * r;
        }
        (el, er)
    }

    #[test]
    fn produces_a_stereo_tail() {
        let mut plate = PlateReverb::new(48000.0);
        let (el, er) = impulse_energy(&mut plate, 48000);
        assert!(el > 1e-6 && er > 1e-6, "left {el}, right {er}");
    }

    #[test]
    fn longer_decay_rings_longer() {
        let late_energy = |decay: f32| {
            let mut plate = PlateReverb::new(48000.0);
            plate.set_decay(decay);
            let mut late = 0.0;
            for i in 0..96000 {
                let x = if i == 0 { 1.0 } else { 0.0 };
                let (l, r) = plate.process_sample(x, x);
                if i > 48000 {
                    late += l * l + r * r;
                }
            }
            late
        };
        assert!(late_energy(0.9) > late_energy(0.3));
    }

    #[test]
    fn stable_at_maximum_settings() {
        let mut plate = PlateReverb::new(48000.0);
        plate.set_decay(1.0);
        plate.set_diffusion(1.0);
        plate.set_tank_high_cut(20000.0);
        plate.set_tank_mod_depth(16.0);
        plate.set_tank_mod_speed(4.0);
        for i in 0..48000 * 4 {
            let x = if i < 4800 { 0.5 } else { 0.0 };
            let (l, r) = plate.process_sample(x, x);
            assert!(l.is_finite() && r.is_finite());
            assert!(l.abs() < 10.0 && r.abs() < 10.0);
        }
    }

    #[test]
    fn setters_clamp() {
        let mut plate = PlateReverb::new(48000.0);
        plate.set_decay(5.0);
        assert_eq!(plate.decay(), 0.99);
        plate.set_tank_mod_shape(0.0);
        assert_eq!(plate.mod_shape(), 0.01);
        plate.set_tank_mod_depth(100.0);
        assert!((plate.excursion() - MAX_EXCURSION * plate.scale).abs() < 1e-4);
    }

    #[test]
    fn trisaw_spans_full_range() {
        let mut lfo = TriSaw {
            phase: 0.0,
            inc: 0.001,
        };
        let values: Vec<f32> = (0..1000).map(|_| lfo.tick(0.25)).collect();
        let min = values.iter().copied().fold(f32::MAX, f32::min);
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        assert!(min < -0.99 && max > 0.99);
    }
}
