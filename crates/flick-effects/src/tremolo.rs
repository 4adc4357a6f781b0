//! Tremolo family: sine, rounded square and harmonic.
//!
//! All three share the [`Tremolo`] contract so the pedal can switch between
//! them with a toggle. [`TremoloBank`] owns one instance of each and hands
//! out the active one as a trait object; switching never re-initializes the
//! others, so their oscillators keep running phase-continuous.

use flick_core::{
    Biquad, OnePole, OnePoleHighpass, Oscillator, Waveform, low_shelf_coefficients,
    peaking_eq_coefficients,
};

/// Default LFO rate in Hz.
pub const DEFAULT_SPEED_HZ: f32 = 4.0;
/// Default depth.
pub const DEFAULT_DEPTH: f32 = 0.5;

/// Shared contract of every tremolo.
pub trait Tremolo {
    /// Sets the LFO rate in Hz.
    fn set_speed(&mut self, hz: f32);

    /// Sets the depth in [0, 1]. Implementations may scale it internally.
    fn set_depth(&mut self, depth: f32);

    /// Processes one stereo sample.
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Most recent modulation value, for driving an indicator LED.
    fn last_lfo_value(&self) -> f32;
}

/// Tremolo algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TremoloKind {
    /// Smooth sine modulation.
    #[default]
    Sine,
    /// Rounded square, opto-style chop.
    Square,
    /// Opposite-phase modulation of bass and treble bands.
    Harmonic,
}

/// Plain amplitude modulation with a sine or rounded-square LFO.
///
/// The gain swings between `1 - depth` and `1`:
///
/// ```text
/// gain = (1 - depth/2) + (depth/2) * lfo
/// ```
///
/// # Example
///
/// ```rust
/// use flick_effects::{AmplitudeTremolo, Tremolo};
///
/// let mut trem = AmplitudeTremolo::square(48000.0);
/// trem.set_depth(1.0);
/// let (l, _) = trem.process_sample(0.5, 0.5);
/// assert!(l <= 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct AmplitudeTremolo {
    osc: Oscillator,
    speed: f32,
    depth: f32,
    last_lfo: f32,
}

impl AmplitudeTremolo {
    /// Sine tremolo.
    pub fn sine(sample_rate: f32) -> Self {
        Self::with_waveform(sample_rate, Waveform::Sine)
    }

    /// Rounded-square tremolo.
    pub fn square(sample_rate: f32) -> Self {
        Self::with_waveform(sample_rate, Waveform::RoundedSquare)
    }

    fn with_waveform(sample_rate: f32, waveform: Waveform) -> Self {
        let mut osc = Oscillator::new(sample_rate);
        osc.set_waveform(waveform);
        osc.set_frequency(DEFAULT_SPEED_HZ);
        Self {
            osc,
            speed: DEFAULT_SPEED_HZ,
            depth: DEFAULT_DEPTH,
            last_lfo: 1.0,
        }
    }

    /// Current depth.
    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Current speed in Hz.
    pub fn speed(&self) -> f32 {
        self.speed
    }
}

impl Tremolo for AmplitudeTremolo {
    fn set_speed(&mut self, hz: f32) {
        self.speed = hz.max(0.0);
    }

    fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    #[inline]
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        let half_depth = self.depth * 0.5;
        self.osc.set_frequency(self.speed);
        self.osc.set_amplitude(half_depth);

        let gain = (1.0 - half_depth) + self.osc.process();
        self.last_lfo = gain;
        (left * gain, right * gain)
    }

    fn last_lfo_value(&self) -> f32 {
        self.last_lfo
    }
}

/// Crossover and tone-stack constants of the harmonic tremolo.
mod harmonic {
    pub const DEPTH_SCALE: f32 = 1.25;
    pub const SPLIT_LOWPASS_HZ: f32 = 144.0;
    pub const SPLIT_HIGHPASS_HZ: f32 = 636.0;
    pub const EQ_HIGHPASS_HZ: f32 = 63.0;
    pub const EQ_LOWPASS_HZ: f32 = 11200.0;
    pub const SHELF: (f32, f32, f32) = (37.0, -10.5, 1.0);
    pub const LOW_PEAK: (f32, f32, f32) = (254.0, 2.0, 0.707);
    pub const HIGH_PEAK: (f32, f32, f32) = (7500.0, -3.37, 0.263);
}

/// One channel of the harmonic tremolo: crossover, then tone stack.
#[derive(Debug, Clone)]
struct HarmonicChannel {
    split_low: OnePole,
    split_high: OnePoleHighpass,
    eq_highpass: OnePoleHighpass,
    eq_lowpass: OnePole,
    eq_shelf: Biquad,
    eq_low_peak: Biquad,
    eq_high_peak: Biquad,
}

impl HarmonicChannel {
    fn new(sample_rate: f32) -> Self {
        let (sf, sg, sq) = harmonic::SHELF;
        let (lf, lg, lq) = harmonic::LOW_PEAK;
        let (hf, hg, hq) = harmonic::HIGH_PEAK;
        Self {
            split_low: OnePole::new(sample_rate, harmonic::SPLIT_LOWPASS_HZ),
            split_high: OnePoleHighpass::new(sample_rate, harmonic::SPLIT_HIGHPASS_HZ),
            eq_highpass: OnePoleHighpass::new(sample_rate, harmonic::EQ_HIGHPASS_HZ),
            eq_lowpass: OnePole::new(sample_rate, harmonic::EQ_LOWPASS_HZ),
            eq_shelf: Biquad::from_coefficients(low_shelf_coefficients(sf, sg, sq, sample_rate)),
            eq_low_peak: Biquad::from_coefficients(peaking_eq_coefficients(lf, lg, lq, sample_rate)),
            eq_high_peak: Biquad::from_coefficients(peaking_eq_coefficients(hf, hg, hq, sample_rate)),
        }
    }

    #[inline]
    fn process(&mut self, input: f32, lfo: f32) -> f32 {
        let low = self.split_low.process(input) * (1.0 + lfo);
        let high = self.split_high.process(input) * (1.0 - lfo);

        // Stage order is part of the voicing
        let mut s = low + high;
        s = self.eq_highpass.process(s);
        s = self.eq_lowpass.process(s);
        s = self.eq_shelf.process(s);
        s = self.eq_low_peak.process(s);
        self.eq_high_peak.process(s)
    }
}

/// Harmonic tremolo.
///
/// The input is split into a bass band (one-pole lowpass at 144 Hz) and a
/// treble band (one-pole highpass at 636 Hz). The two bands are modulated in
/// opposite phase, summed, and voiced through a fixed tone stack. Depth is
/// scaled by 1.25 so the full knob reaches past unity modulation.
#[derive(Debug, Clone)]
pub struct HarmonicTremolo {
    osc: Oscillator,
    speed: f32,
    depth: f32,
    last_lfo: f32,
    left: HarmonicChannel,
    right: HarmonicChannel,
}

impl HarmonicTremolo {
    /// Creates a harmonic tremolo at the default speed and depth.
    pub fn new(sample_rate: f32) -> Self {
        let mut trem = Self {
            osc: Oscillator::new(sample_rate),
            speed: DEFAULT_SPEED_HZ,
            depth: 0.0,
            last_lfo: 0.0,
            left: HarmonicChannel::new(sample_rate),
            right: HarmonicChannel::new(sample_rate),
        };
        trem.set_depth(DEFAULT_DEPTH);
        trem
    }

    /// Internal (scaled) depth.
    pub fn scaled_depth(&self) -> f32 {
        self.depth
    }
}

impl Tremolo for HarmonicTremolo {
    fn set_speed(&mut self, hz: f32) {
        self.speed = hz.max(0.0);
    }

    fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0) * harmonic::DEPTH_SCALE;
    }

    #[inline]
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.osc.set_frequency(self.speed);
        self.osc.set_amplitude(self.depth);
        let lfo = self.osc.process();
        self.last_lfo = lfo;
        (self.left.process(left, lfo), self.right.process(right, lfo))
    }

    fn last_lfo_value(&self) -> f32 {
        self.last_lfo
    }
}

/// One instance of every tremolo plus the current selection.
#[derive(Debug, Clone)]
pub struct TremoloBank {
    sine: AmplitudeTremolo,
    square: AmplitudeTremolo,
    harmonic: HarmonicTremolo,
    active: TremoloKind,
}

impl TremoloBank {
    /// Builds all three tremolos with the sine selected.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sine: AmplitudeTremolo::sine(sample_rate),
            square: AmplitudeTremolo::square(sample_rate),
            harmonic: HarmonicTremolo::new(sample_rate),
            active: TremoloKind::Sine,
        }
    }

    /// Selects the active tremolo.
    pub fn select(&mut self, kind: TremoloKind) {
        self.active = kind;
    }

    /// Currently selected kind.
    pub fn kind(&self) -> TremoloKind {
        self.active
    }

    /// The selected tremolo.
    pub fn active(&mut self) -> &mut dyn Tremolo {
        match self.active {
            TremoloKind::Sine => &mut self.sine,
            TremoloKind::Square => &mut self.square,
            TremoloKind::Harmonic => &mut self.harmonic,
        }
    }

    /// Modulation value of the selected tremolo.
    pub fn last_lfo_value(&self) -> f32 {
        match self.active {
            TremoloKind::Sine => self.sine.last_lfo_value(),
            TremoloKind::Square => self.square.last_lfo_value(),
            TremoloKind::Harmonic => self.harmonic.last_lfo_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gain_range(trem: &mut dyn Tremolo, samples: usize) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for _ in 0..samples {
            let (l, _) = trem.process_sample(1.0, 1.0);
            min = min.min(l);
            max = max.max(l);
        }
        (min, max)
    }

    #[test]
    fn sine_gain_swings_between_one_minus_depth_and_one() {
        let mut trem = AmplitudeTremolo::sine(48000.0);
        trem.set_speed(5.0);
        trem.set_depth(0.8);
        let (min, max) = gain_range(&mut trem, 48000);
        assert!((min - 0.2).abs() < 0.01, "min = {min}");
        assert!((max - 1.0).abs() < 0.01, "max = {max}");
    }

    #[test]
    fn zero_depth_passes_signal() {
        let mut trem = AmplitudeTremolo::square(48000.0);
        trem.set_depth(0.0);
        for _ in 0..1000 {
            let (l, r) = trem.process_sample(0.5, -0.25);
            assert_eq!((l, r), (0.5, -0.25));
        }
        assert_eq!(trem.last_lfo_value(), 1.0);
    }

    #[test]
    fn square_spends_most_time_near_extremes() {
        let mut trem = AmplitudeTremolo::square(48000.0);
        trem.set_speed(4.0);
        trem.set_depth(1.0);
        let extremes = (0..48000)
            .map(|_| trem.process_sample(1.0, 1.0).0)
            .filter(|g| *g < 0.1 || *g > 0.9)
            .count();
        assert!(extremes > 40000, "{extremes} samples near the rails");
    }

    #[test]
    fn harmonic_depth_is_scaled() {
        let mut trem = HarmonicTremolo::new(48000.0);
        trem.set_depth(1.0);
        assert!((trem.scaled_depth() - 1.25).abs() < 1e-6);
        let mut peak = 0.0f32;
        for _ in 0..48000 {
            trem.process_sample(0.0, 0.0);
            peak = peak.max(trem.last_lfo_value().abs());
        }
        assert!((peak - 1.25).abs() < 0.01);
    }

    #[test]
    fn harmonic_output_is_finite_and_bounded() {
        let mut trem = HarmonicTremolo::new(48000.0);
        trem.set_depth(1.0);
        trem.set_speed(8.0);
        for i in 0..48000 {
            let x = libm::sinf(i as f32 * 0.05) * 0.9;
            let (l, r) = trem.process_sample(x, x);
            assert!(l.is_finite() && r.is_finite());
            assert!(l.abs() < 5.0);
        }
    }

    #[test]
    fn bank_switches_active_tremolo() {
        let mut bank = TremoloBank::new(48000.0);
        assert_eq!(bank.kind(), TremoloKind::Sine);
        bank.select(TremoloKind::Harmonic);
        bank.active().set_depth(0.0);
        let (l, _) = bank.active().process_sample(0.0, 0.0);
        assert_eq!(l, 0.0);
        assert_eq!(bank.last_lfo_value(), 0.0);
    }
}
