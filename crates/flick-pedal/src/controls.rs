//! What the knobs and toggles mean.
//!
//! Normal mode layout:
//!
//! | Control | Parameter |
//! |---------|-----------|
//! | Knob 1  | reverb amount |
//! | Knob 2  | tremolo speed, 0.2..16 Hz |
//! | Knob 3  | tremolo depth |
//! | Knob 4  | delay time, logarithmic from the minimum delay to the buffer length |
//! | Knob 5  | delay feedback |
//! | Knob 6  | delay mix, whole percent |
//! | Toggle 1 | reverb type: spring / plate / hall |
//! | Toggle 2 | tremolo type: square / harmonic / sine |
//! | Toggle 3 | delay timing: dotted eighth / quarter / quarter triplet |
//!
//! Toggle position 0 is up (or right on horizontal enclosures).

use flick_config::ReverbSettings;
use flick_effects::{Reverb, ReverbKind, TremoloKind};
use flick_platform::{Footswitch, Knob, PedalHardware, SwitchPosition, Toggle};
use libm::{floorf, powf};

/// Mapping from a normalized control reading to a parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnobScale {
    /// `min + x * (max - min)`.
    Linear {
        /// Value at 0.
        min: f32,
        /// Value at 1.
        max: f32,
    },
    /// `min * (max / min)^x`. More resolution at the short end.
    Logarithmic {
        /// Value at 0, must be positive.
        min: f32,
        /// Value at 1.
        max: f32,
    },
}

impl KnobScale {
    /// Maps a 0..1 reading. Readings outside that range are clamped first.
    pub fn denormalize(self, normalized: f32) -> f32 {
        let x = normalized.clamp(0.0, 1.0);
        match self {
            KnobScale::Linear { min, max } => min + x * (max - min),
            KnobScale::Logarithmic { min, max } => {
                if min <= 0.0 {
                    return min;
                }
                min * powf(max / min, x)
            }
        }
    }
}

/// Knob 2 in normal mode.
pub const TREMOLO_SPEED: KnobScale = KnobScale::Linear {
    min: 0.2,
    max: 16.0,
};

/// Delay time knob scale for the given range in samples.
pub fn delay_time_scale(min_samples: f32, max_samples: f32) -> KnobScale {
    KnobScale::Logarithmic {
        min: min_samples,
        max: max_samples,
    }
}

/// Knob 6 as a mix fraction, quantized to whole percent.
pub fn delay_mix(normalized: f32) -> f32 {
    floorf(normalized.clamp(0.0, 1.0) * 100.0) / 100.0
}

/// Toggle 1 in normal mode.
pub fn reverb_kind(position: SwitchPosition) -> ReverbKind {
    match position {
        SwitchPosition::Up => ReverbKind::Spring,
        SwitchPosition::Middle => ReverbKind::Plate,
        SwitchPosition::Down => ReverbKind::Hall,
    }
}

/// Toggle 2 in normal mode.
pub fn tremolo_kind(position: SwitchPosition) -> TremoloKind {
    match position {
        SwitchPosition::Up => TremoloKind::Square,
        SwitchPosition::Middle => TremoloKind::Harmonic,
        SwitchPosition::Down => TremoloKind::Sine,
    }
}

/// Delay subdivision selected by toggle 3.
///
/// The knob, or the tapped tempo, sets a quarter note; the subdivision scales
/// it last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayTiming {
    /// Three quarters of the beat.
    DottedEighth,
    /// The beat itself.
    #[default]
    Quarter,
    /// Two thirds of the beat.
    TripletQuarter,
}

impl DelayTiming {
    /// Timing for a toggle position.
    pub fn from_position(position: SwitchPosition) -> Self {
        match position {
            SwitchPosition::Up => DelayTiming::DottedEighth,
            SwitchPosition::Middle => DelayTiming::Quarter,
            SwitchPosition::Down => DelayTiming::TripletQuarter,
        }
    }

    /// Fraction of the beat.
    pub fn multiplier(self) -> f32 {
        match self {
            DelayTiming::DottedEighth => 0.75,
            DelayTiming::Quarter => 1.0,
            DelayTiming::TripletQuarter => 0.6666,
        }
    }
}

/// Every control reading for one block, taken once at the top of the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    /// Knob readings, 0..1.
    pub knobs: [f32; 6],
    /// Toggle positions.
    pub toggles: [SwitchPosition; 3],
    /// Footswitch levels.
    pub footswitches: [bool; 2],
    /// Clock reading.
    pub now_ms: u32,
}

impl ControlSnapshot {
    /// Reads every control from `hw`.
    pub fn read<H: PedalHardware + ?Sized>(hw: &H) -> Self {
        Self {
            knobs: Knob::ALL.map(|k| hw.knob(k)),
            toggles: Toggle::ALL.map(|t| hw.toggle(t)),
            footswitches: Footswitch::ALL.map(|f| hw.footswitch_pressed(f)),
            now_ms: hw.now_ms(),
        }
    }

    /// Reading of one knob.
    pub fn knob(&self, knob: Knob) -> f32 {
        self.knobs[knob.index()]
    }

    /// Position of one toggle.
    pub fn toggle(&self, toggle: Toggle) -> SwitchPosition {
        self.toggles[toggle.index()]
    }

    /// True when both footswitches are down.
    pub fn both_footswitches(&self) -> bool {
        self.footswitches[0] && self.footswitches[1]
    }
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            knobs: [0.5; 6],
            toggles: [SwitchPosition::Middle; 3],
            footswitches: [false; 2],
            now_ms: 0,
        }
    }
}

/// Plate voicing converted from control units to algorithm units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateParameters {
    /// Decay, 0..1.
    pub decay: f32,
    /// Tank diffusion, 0..1.
    pub diffusion: f32,
    /// Pre-delay in seconds.
    pub pre_delay_seconds: f32,
    /// Input high-cut in Hz.
    pub input_high_cut_hz: f32,
    /// Tank high-cut in Hz.
    pub tank_high_cut_hz: f32,
    /// Tank modulation speed multiplier.
    pub mod_speed: f32,
    /// Tank modulation depth.
    pub mod_depth: f32,
    /// Tank modulation shape.
    pub mod_shape: f32,
}

/// Pre-delay knob span in seconds.
pub const PLATE_PRE_DELAY_SCALE: f32 = 0.25;
/// High-cut knob span in octaves around A4.
pub const PLATE_DAMP_SCALE: f32 = 10.0;
/// Tank modulation values per toggle position; speed and depth are scaled
/// further below.
pub const PLATE_MOD_VALUES: [f32; 3] = [0.5, 0.25, 0.1];
/// Multiplier on the speed value.
pub const PLATE_MOD_SPEED_SCALE: f32 = 8.0;
/// Multiplier on the depth value.
pub const PLATE_MOD_DEPTH_SCALE: f32 = 15.0;

/// Cutoff for a high-cut knob reading: five octaves either side of 440 Hz.
pub fn plate_cutoff_hz(normalized: f32) -> f32 {
    440.0 * powf(2.0, normalized * PLATE_DAMP_SCALE - 5.0)
}

fn mod_value(position: u8) -> f32 {
    PLATE_MOD_VALUES[usize::from(position).min(2)]
}

impl PlateParameters {
    /// Scales stored voicing into algorithm units.
    pub fn from_settings(voicing: &ReverbSettings) -> Self {
        Self {
            decay: voicing.decay,
            diffusion: voicing.diffusion,
            pre_delay_seconds: voicing.pre_delay * PLATE_PRE_DELAY_SCALE,
            input_high_cut_hz: plate_cutoff_hz(voicing.input_high_cut),
            tank_high_cut_hz: plate_cutoff_hz(voicing.tank_high_cut),
            mod_speed: mod_value(voicing.mod_speed_pos) * PLATE_MOD_SPEED_SCALE,
            mod_depth: mod_value(voicing.mod_depth_pos) * PLATE_MOD_DEPTH_SCALE,
            mod_shape: mod_value(voicing.mod_shape_pos),
        }
    }

    /// Pushes every parameter into `reverb`.
    pub fn apply(&self, reverb: &mut dyn Reverb) {
        reverb.set_decay(self.decay);
        reverb.set_diffusion(self.diffusion);
        reverb.set_input_high_cut(self.input_high_cut_hz);
        reverb.set_tank_high_cut(self.tank_high_cut_hz);
        reverb.set_tank_mod_speed(self.mod_speed);
        reverb.set_tank_mod_depth(self.mod_depth);
        reverb.set_tank_mod_shape(self.mod_shape);
        reverb.set_pre_delay(self.pre_delay_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flick_effects::PlateReverb;
    use flick_platform::VirtualPedal;

    #[test]
    fn log_scale_hits_both_ends() {
        let scale = delay_time_scale(2400.0, 96000.0);
        assert!((scale.denormalize(0.0) - 2400.0).abs() < 1e-2);
        assert!((scale.denormalize(1.0) - 96000.0).abs() < 1.0);
        let mid = scale.denormalize(0.5);
        assert!((mid - (2400.0f32 * 96000.0).sqrt()).abs() < 1.0);
    }

    #[test]
    fn linear_scale_clamps_input() {
        assert_eq!(TREMOLO_SPEED.denormalize(-1.0), 0.2);
        assert_eq!(TREMOLO_SPEED.denormalize(2.0), 16.0);
    }

    #[test]
    fn delay_mix_is_whole_percent() {
        assert_eq!(delay_mix(0.456), 0.45);
        assert_eq!(delay_mix(1.0), 1.0);
    }

    #[test]
    fn toggle_maps() {
        assert_eq!(reverb_kind(SwitchPosition::Up), ReverbKind::Spring);
        assert_eq!(reverb_kind(SwitchPosition::Down), ReverbKind::Hall);
        assert_eq!(tremolo_kind(SwitchPosition::Up), TremoloKind::Square);
        assert_eq!(tremolo_kind(SwitchPosition::Middle), TremoloKind::Harmonic);
        assert_eq!(
            DelayTiming::from_position(SwitchPosition::Down).multiplier(),
            0.6666
        );
    }

    #[test]
    fn default_voicing_scales_to_plate_defaults() {
        let params = PlateParameters::from_settings(&ReverbSettings::default());
        assert!((params.input_high_cut_hz - PlateReverb::DEFAULT_HIGH_CUT_HZ).abs() < 1.0);
        assert_eq!(params.pre_delay_seconds, 0.0);
        assert!((params.mod_speed - 0.8).abs() < 1e-6);
        assert!((params.mod_depth - 1.5).abs() < 1e-6);
        assert_eq!(params.mod_shape, 0.25);
    }

    #[test]
    fn apply_reaches_the_plate() {
        let mut plate = PlateReverb::new(48000.0);
        let voicing = ReverbSettings {
            decay: 0.5,
            mod_speed_pos: 0,
            ..ReverbSettings::default()
        };
        PlateParameters::from_settings(&voicing).apply(&mut plate);
        assert_eq!(plate.decay(), 0.5);
        assert_eq!(plate.mod_speed(), 4.0);
    }

    #[test]
    fn snapshot_reads_hardware() {
        let mut hw = VirtualPedal::new();
        hw.set_knob(Knob::K4, 0.9);
        hw.set_toggle(Toggle::T2, SwitchPosition::Up);
        hw.set_footswitch(Footswitch::B, true);
        hw.advance_ms(42);
        let snap = ControlSnapshot::read(&hw);
        assert_eq!(snap.knob(Knob::K4), 0.9);
        assert_eq!(snap.toggle(Toggle::T2), SwitchPosition::Up);
        assert_eq!(snap.footswitches, [false, true]);
        assert!(!snap.both_footswitches());
        assert_eq!(snap.now_ms, 42);
    }
}
