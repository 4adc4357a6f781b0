//! The persisted settings record.
//!
//! One flat record holds everything that survives a power cycle: the plate
//! reverb voicing chosen in reverb edit mode, the device settings, the three
//! bypass flags and the tapped delay length. Reverb values are stored in
//! their knob/switch units (0..1 and positions 0..=2); scaling to algorithm
//! units happens in the pedal.

use serde::{Deserialize, Serialize};

/// Layout version this build reads and writes.
///
/// A stored record with any other version is discarded wholesale.
pub const SETTINGS_VERSION: u32 = 8;

/// Audio routing, selected by toggle 3 in device settings mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Both inputs processed, both outputs independent.
    StereoInStereoOut,
    /// Input 1 feeds both channels, both outputs independent.
    MonoInStereoOut,
    /// Input 1 only, mono sum on output 1, output 2 silent.
    #[default]
    MonoInMonoOut,
}

/// Output polarity, selected by toggle 2 in device settings mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Right channel inverted.
    InvertRight,
    /// No inversion.
    #[default]
    Normal,
    /// Left channel inverted.
    InvertLeft,
}

/// What knob 1 does to the dry signal, selected by toggle 1 in device
/// settings mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbKnobMode {
    /// Dry stays at unity; knob 1 only adds reverb.
    AllDry,
    /// Knob 1 crossfades dry into wet.
    #[default]
    DryWetMix,
    /// No dry signal through the reverb stage.
    AllWet,
}

macro_rules! switch_indexed {
    ($ty:ty, [$a:ident, $b:ident, $c:ident]) => {
        impl $ty {
            /// Variant for a toggle position index; anything past 2 maps
            /// to the last variant.
            pub const fn from_index(index: usize) -> Self {
                match index {
                    0 => Self::$a,
                    1 => Self::$b,
                    _ => Self::$c,
                }
            }

            /// Toggle position index of this variant.
            pub const fn index(self) -> usize {
                match self {
                    Self::$a => 0,
                    Self::$b => 1,
                    Self::$c => 2,
                }
            }
        }
    };
}

switch_indexed!(RoutingMode, [StereoInStereoOut, MonoInStereoOut, MonoInMonoOut]);
switch_indexed!(Polarity, [InvertRight, Normal, InvertLeft]);
switch_indexed!(ReverbKnobMode, [AllDry, DryWetMix, AllWet]);

impl RoutingMode {
    /// True when input 2 is ignored.
    pub const fn mono_in(self) -> bool {
        !matches!(self, RoutingMode::StereoInStereoOut)
    }

    /// True when output 2 is silent.
    pub const fn mono_out(self) -> bool {
        matches!(self, RoutingMode::MonoInMonoOut)
    }
}

impl Polarity {
    /// Gains applied to (left, right).
    pub const fn gains(self) -> (f32, f32) {
        match self {
            Polarity::InvertRight => (1.0, -1.0),
            Polarity::Normal => (1.0, 1.0),
            Polarity::InvertLeft => (-1.0, 1.0),
        }
    }
}

/// Plate reverb voicing in control units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbSettings {
    /// Decay, 0..1.
    pub decay: f32,
    /// Tank diffusion, 0..1.
    pub diffusion: f32,
    /// Input high-cut as a knob reading, 0..1.
    pub input_high_cut: f32,
    /// Tank high-cut as a knob reading, 0..1.
    pub tank_high_cut: f32,
    /// Pre-delay as a knob reading, 0..1.
    pub pre_delay: f32,
    /// Modulation speed toggle position, 0..=2.
    pub mod_speed_pos: u8,
    /// Modulation depth toggle position, 0..=2.
    pub mod_depth_pos: u8,
    /// Modulation shape toggle position, 0..=2.
    pub mod_shape_pos: u8,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            decay: 0.8,
            diffusion: 0.85,
            input_high_cut: 0.725,
            tank_high_cut: 0.725,
            pre_delay: 0.0,
            mod_speed_pos: 2,
            mod_depth_pos: 2,
            mod_shape_pos: 1,
        }
    }
}

/// Which effects are bypassed. Everything starts bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassState {
    /// Reverb bypassed.
    pub reverb: bool,
    /// Tremolo bypassed.
    pub tremolo: bool,
    /// Delay bypassed.
    pub delay: bool,
}

impl Default for BypassState {
    fn default() -> Self {
        Self {
            reverb: true,
            tremolo: true,
            delay: true,
        }
    }
}

/// The full persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Layout version; see [`SETTINGS_VERSION`].
    pub version: u32,
    /// Plate reverb voicing.
    pub reverb: ReverbSettings,
    /// Audio routing.
    pub routing: RoutingMode,
    /// Output polarity.
    pub polarity: Polarity,
    /// Knob 1 dry behavior.
    pub reverb_knob_mode: ReverbKnobMode,
    /// Bypass flags.
    pub bypass: BypassState,
    /// Tapped quarter-note delay in samples; 0 means the knob rules.
    pub tapped_delay_samples: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            reverb: ReverbSettings::default(),
            routing: RoutingMode::default(),
            polarity: Polarity::default(),
            reverb_knob_mode: ReverbKnobMode::default(),
            bypass: BypassState::default(),
            tapped_delay_samples: 0.0,
        }
    }
}

impl Settings {
    /// True when the record was written by this layout version.
    pub fn is_current(&self) -> bool {
        self.version == SETTINGS_VERSION
    }

    /// Factory defaults stamped with another layout `version`.
    ///
    /// Stands in for a stored record this build cannot use; version 0 marks
    /// one that was unreadable or carried no version at all.
    pub fn foreign(version: u32) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}
