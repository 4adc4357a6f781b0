//! Hall reverb: an eight-line feedback delay network.
//!
//! ```text
//!  L+R ─► mono ─► high-cut ─► pre-delay ─► AP ─► AP ─► ×1/√8 ─┐
//!                                                              ▼
//!            ┌─────────── line 0..7 (mutually prime lengths) ◄─ + ◄─ decay × damp ◄─┐
//!            │                                                                      │
//!            └──► reads (lines 0, 2, 5, 7 triangle-modulated) ──► Hadamard 8×8 ─────┘
//!                   │
//!                   └──► L = (o0 - o2 + o4 - o6)/2,  R = (o1 - o3 + o5 - o7)/2
//! ```
//!
//! The Hadamard matrix is orthogonal once scaled by 1/√8, so the mixing
//! itself neither adds nor removes energy. All loss comes from the per-line
//! damping and the decay factor, which is capped at 0.999 to keep the
//! network unconditionally stable.

use flick_core::{Allpass, AllpassForm, DelayLine, OnePole};

use crate::Reverb;

/// Number of delay lines in the network.
pub const NUM_LINES: usize = 8;

/// Normalization that makes the 8-point Hadamard transform orthogonal.
pub const HADAMARD_NORM: f32 = 0.35355339;

/// Line lengths in samples. Mutually prime to avoid periodic coloration.
const LINE_DELAYS: [usize; NUM_LINES] = [1087, 1283, 1601, 1949, 2311, 2801, 3371, 4409];
const LINE_CAPACITY: usize = 4800;

const INPUT_AP_DELAYS: [usize; 2] = [142, 379];
const INPUT_AP_CAPACITY: usize = 512;
const DEFAULT_DIFFUSION_COEFF: f32 = 0.5;

const PRE_DELAY_CAPACITY: usize = 4800;

/// LFO phase slot for each line; `None` lines are read unmodulated.
const MOD_PHASE: [Option<usize>; NUM_LINES] =
    [Some(0), None, Some(1), None, None, Some(2), None, Some(3)];

const DEFAULT_DECAY: f32 = 0.85;
const MAX_DECAY: f32 = 0.999;
const DEFAULT_MOD_SPEED_HZ: f32 = 0.5;
const DEFAULT_MOD_DEPTH: f32 = 1.5;
const MOD_DEPTH_SCALE: f32 = 0.2;
const DAMPING_HZ: f32 = 8000.0;
const INPUT_HIGH_CUT_HZ: f32 = 10000.0;

/// In-place 8-point fast Walsh-Hadamard transform, normalized by 1/√8.
///
/// Three butterfly stages, O(n log n). Applying it twice returns the input.
///
/// ```rust
/// use flick_effects::hall::hadamard8;
///
/// let mut x = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
/// hadamard8(&mut x);
/// assert!(x.iter().all(|v| (v - 0.35355339).abs() < 1e-6));
/// ```
pub fn hadamard8(x: &mut [f32; NUM_LINES]) {
    let mut span = 1;
    while span < NUM_LINES {
        for block in (0..NUM_LINES).step_by(span * 2) {
            for i in block..block + span {
                let a = x[i];
                let b = x[i + span];
                x[i] = a + b;
                x[i + span] = a - b;
            }
        }
        span *= 2;
    }
    for v in x.iter_mut() {
        *v *= HADAMARD_NORM;
    }
}

/// Triangle in [-1, 1] from a phase in cycles.
#[inline]
fn triangle(phase: f32) -> f32 {
    if phase < 0.5 {
        4.0 * phase - 1.0
    } else {
        3.0 - 4.0 * phase
    }
}

/// Eight-line FDN hall reverb.
///
/// Wet-only output. Responds to decay, diffusion, pre-delay, both high-cuts,
/// modulation speed and modulation depth.
#[derive(Debug, Clone)]
pub struct HallReverb {
    lines: [DelayLine; NUM_LINES],
    damping: [OnePole; NUM_LINES],
    input_ap: [Allpass; 2],
    pre_delay: DelayLine,
    input_high_cut: OnePole,
    lfo_phase: [f32; 4],
    lfo_inc: f32,
    mod_depth: f32,
    decay: f32,
    pre_delay_samples: f32,
    sample_rate: f32,
}

impl HallReverb {
    /// Allocates the network for `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            lines: core::array::from_fn(|_| DelayLine::new(LINE_CAPACITY)),
            damping: core::array::from_fn(|_| OnePole::new(sample_rate, DAMPING_HZ)),
            input_ap: INPUT_AP_DELAYS.map(|d| {
                Allpass::with_capacity(
                    AllpassForm::Diffuser,
                    INPUT_AP_CAPACITY,
                    d as f32,
                    DEFAULT_DIFFUSION_COEFF,
                )
            }),
            pre_delay: DelayLine::new(PRE_DELAY_CAPACITY),
            input_high_cut: OnePole::new(sample_rate, INPUT_HIGH_CUT_HZ),
            lfo_phase: [0.0, 0.25, 0.5, 0.75],
            lfo_inc: DEFAULT_MOD_SPEED_HZ / sample_rate,
            mod_depth: DEFAULT_MOD_DEPTH,
            decay: DEFAULT_DECAY,
            pre_delay_samples: 0.0,
            sample_rate,
        }
    }

    /// Effective feedback coefficient after clamping.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Modulation depth in samples after scaling.
    pub fn mod_depth(&self) -> f32 {
        self.mod_depth
    }

    fn clamp_cutoff(&self, hz: f32) -> f32 {
        hz.clamp(0.001 * self.sample_rate, 0.497 * self.sample_rate)
    }
}

impl Reverb for HallReverb {
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut input = self.input_high_cut.process((left + right) * 0.5);

        self.pre_delay.write(input);
        input = self.pre_delay.read(self.pre_delay_samples.max(1.0));

        for ap in &mut self.input_ap {
            input = ap.process(input);
        }
        let injected = input * HADAMARD_NORM;

        let mut out = [0.0f32; NUM_LINES];
        for (i, o) in out.iter_mut().enumerate() {
            let nominal = LINE_DELAYS[i] as f32;
            *o = match MOD_PHASE[i] {
                Some(slot) if self.mod_depth > 0.0 => {
                    let offset = triangle(self.lfo_phase[slot]) * self.mod_depth;
                    self.lines[i].read((nominal + offset).max(1.0))
                }
                _ => self.lines[i].read(nominal),
            };
        }

        let mut mixed = out;
        hadamard8(&mut mixed);

        for ((line, damp), m) in self.lines.iter_mut().zip(&mut self.damping).zip(mixed) {
            line.write(damp.process(m) * self.decay + injected);
        }

        for phase in &mut self.lfo_phase {
            *phase += self.lfo_inc;
            if *phase >= 1.0 {
                *phase -= 1.0;
            }
        }

        (
            (out[0] - out[2] + out[4] - out[6]) * 0.5,
            (out[1] - out[3] + out[5] - out[7]) * 0.5,
        )
    }

    fn clear(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        for damp in &mut self.damping {
            damp.reset();
        }
        for ap in &mut self.input_ap {
            ap.clear();
        }
        self.pre_delay.clear();
        self.input_high_cut.reset();
    }

    fn set_decay(&mut self, decay: f32) {
        self.decay = decay.clamp(0.0, MAX_DECAY);
    }

    fn set_diffusion(&mut self, diffusion: f32) {
        let coeff = diffusion.clamp(0.0, 1.0) * 0.7;
        for ap in &mut self.input_ap {
            ap.set_coeff(coeff);
        }
    }

    fn set_pre_delay(&mut self, seconds: f32) {
        self.pre_delay_samples =
            (seconds * self.sample_rate).clamp(0.0, (PRE_DELAY_CAPACITY - 1) as f32);
    }

    fn set_input_high_cut(&mut self, hz: f32) {
        let hz = self.clamp_cutoff(hz);
        self.input_high_cut.set_frequency(hz);
    }

    fn set_tank_high_cut(&mut self, hz: f32) {
        let hz = self.clamp_cutoff(hz);
        for damp in &mut self.damping {
            damp.set_frequency(hz);
        }
    }

    fn set_tank_mod_speed(&mut self, hz: f32) {
        self.lfo_inc = hz.clamp(0.01, 10.0) / self.sample_rate;
    }

    fn set_tank_mod_depth(&mut self, depth: f32) {
        self.mod_depth = depth.clamp(0.0, 20.0) * MOD_DEPTH_SCALE;
    }
}

#[cfg(test)]
impl HallReverb {
    /// Squared samples currently in flight on every line.
    fn line_energy(&self) -> f64 {
        self.lines
            .iter()
            .zip(LINE_DELAYS)
            .map(|(line, len)| {
                (1..=len)
                    .map(|k| f64::from(line.read_at(k)).powi(2))
                    .sum::<f64>()
            })
            .sum()
    }

    /// Damping filter memory, weighted by `decay^2 * a / (1 - a)`.
    ///
    /// With that weight one unmodulated pass through the loop can only lose
    /// energy: the filter output is a convex mix of its input and its state.
    fn filter_energy(&self) -> f64 {
        let decay2 = f64::from(self.decay).powi(2);
        self.damping
            .iter()
            .map(|d| {
                let a = f64::from(d.coefficient());
                decay2 * a / (1.0 - a) * f64::from(d.state()).powi(2)
            })
            .sum()
    }

    /// Squared samples about to leave the lines on the next step.
    fn leaving_energy(&self) -> f64 {
        self.lines
            .iter()
            .zip(LINE_DELAYS)
            .map(|(line, len)| f64::from(line.read_at(len)).powi(2))
            .sum()
    }

    /// Squared samples written on the last step.
    fn newest_energy(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| f64::from(line.read_at(1)).powi(2))
            .sum()
    }

    /// Empties the input chain so nothing more is injected.
    fn drain_input(&mut self) {
        for ap in &mut self.input_ap {
            ap.clear();
        }
        self.pre_delay.clear();
        self.input_high_cut.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_energy_never_grows_once_input_stops() {
        // Modulated reads tap inside a line rather than at its end, so the
        // per-sample bound holds for the unmodulated network.
        for decay in [0.5, 0.85, 0.95, 0.999] {
            for high_cut in [500.0, 20000.0] {
                let mut hall = HallReverb::new(48000.0);
                hall.set_decay(decay);
                hall.set_tank_high_cut(high_cut);
                hall.set_tank_mod_depth(0.0);

                let mut seed = 1u32;
                for _ in 0..9600 {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    let x = (seed >> 8) as f32 / (1u32 << 24) as f32 - 0.5;
                    hall.process_sample(x, -0.5 * x);
                }
                hall.drain_input();

                let start = hall.line_energy() + hall.filter_energy();
                assert!(start > 1e-3, "decay={decay}: network never filled");

                let mut filters = hall.filter_energy();
                for n in 0..24000 {
                    let leaving = hall.leaving_energy();
                    hall.process_sample(0.0, 0.0);
                    let next_filters = hall.filter_energy();
                    let gained = hall.newest_energy() + next_filters;
                    let lost = leaving + filters;
                    assert!(
                        gained <= lost + 1e-5 * lost + 1e-30,
                        "decay={decay} cut={high_cut} step {n}: {gained} > {lost}"
                    );
                    filters = next_filters;
                }

                let end = hall.line_energy() + hall.filter_energy();
                assert!(end <= start, "decay={decay} cut={high_cut}: {start} -> {end}");
            }
        }
    }

    #[test]
    fn hadamard_is_an_involution() {
        let original = [0.3, -1.2, 0.7, 0.0, 2.5, -0.4, 1.1, -0.9];
        let mut x = original;
        hadamard8(&mut x);
        hadamard8(&mut x);
        for (a, b) in x.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn hadamard_preserves_energy() {
        let mut x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let before: f32 = x.iter().map(|v| v * v).sum();
        hadamard8(&mut x);
        let after: f32 = x.iter().map(|v| v * v).sum();
        assert!((before - after).abs() / before < 1e-5);
    }

    #[test]
    fn decay_is_clamped() {
        let mut hall = HallReverb::new(48000.0);
        hall.set_decay(1.0);
        assert_eq!(hall.decay(), MAX_DECAY);
        hall.set_decay(-0.5);
        assert_eq!(hall.decay(), 0.0);
    }

    #[test]
    fn mod_depth_is_scaled() {
        let mut hall = HallReverb::new(48000.0);
        hall.set_tank_mod_depth(10.0);
        assert!((hall.mod_depth() - 2.0).abs() < 1e-6);
        hall.set_tank_mod_depth(100.0);
        assert!((hall.mod_depth() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn first_reflection_arrives_after_shortest_line() {
        let mut hall = HallReverb::new(48000.0);
        let mut first = None;
        for i in 0..3000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (l, r) = hall.process_sample(x, x);
            if first.is_none() && (l != 0.0 || r != 0.0) {
                first = Some(i);
            }
        }
        let first = first.unwrap();
        // Shortest line minus the largest negative modulation offset
        assert!((1085..=1090).contains(&first), "first output at {first}");
    }

    #[test]
    fn outputs_are_decorrelated() {
        let mut hall = HallReverb::new(48000.0);
        let mut diff = 0.0f32;
        for i in 0..24000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (l, r) = hall.process_sample(x, x);
            diff += (l - r).abs();
        }
        assert!(diff > 0.01);
    }

    #[test]
    fn zero_decay_leaves_single_pass() {
        let mut hall = HallReverb::new(48000.0);
        hall.set_decay(0.0);
        hall.set_tank_mod_depth(0.0);
        let mut late_energy = 0.0f32;
        for i in 0..20000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (l, r) = hall.process_sample(x, x);
            if i > 12000 {
                late_energy += l * l + r * r;
            }
        }
        assert!(late_energy < 1e-6, "late energy = {late_energy}");
    }
}
