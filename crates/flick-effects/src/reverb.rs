//! Reverb family: shared contract and the algorithm bank.
//!
//! Every reverb implements [`Reverb`]. Only processing and clearing are
//! required; each parameter setter has a no-op default, so a caller can push
//! the full parameter set into whichever algorithm is active and each one
//! picks up the subset it understands.
//!
//! # Units
//!
//! | Setter | Unit |
//! |--------|------|
//! | `set_mix` | 0..1 |
//! | `set_decay` | 0..1 |
//! | `set_diffusion` | 0..1 |
//! | `set_pre_delay` | seconds |
//! | `set_input_high_cut`, `set_tank_high_cut` | Hz |
//! | `set_tank_mod_speed`, `set_tank_mod_depth`, `set_tank_mod_shape` | algorithm-native |

use crate::{HallReverb, PlateReverb, SpringReverb};

/// Shared reverb contract.
///
/// Output is wet-only unless an implementation documents otherwise.
pub trait Reverb {
    /// Processes one stereo sample.
    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32);

    /// Zeroes every internal delay so the tail stops immediately.
    fn clear(&mut self);

    /// Sets the internal dry/wet mix, where the algorithm has one.
    fn set_mix(&mut self, _mix: f32) {}

    /// Sets the decay amount.
    fn set_decay(&mut self, _decay: f32) {}

    /// Sets the diffusion amount.
    fn set_diffusion(&mut self, _diffusion: f32) {}

    /// Sets the pre-delay in seconds.
    fn set_pre_delay(&mut self, _seconds: f32) {}

    /// Sets the input high-cut frequency in Hz.
    fn set_input_high_cut(&mut self, _hz: f32) {}

    /// Sets the tank damping frequency in Hz.
    fn set_tank_high_cut(&mut self, _hz: f32) {}

    /// Sets the tank modulation rate.
    fn set_tank_mod_speed(&mut self, _speed: f32) {}

    /// Sets the tank modulation depth.
    fn set_tank_mod_depth(&mut self, _depth: f32) {}

    /// Sets the tank modulation shape.
    fn set_tank_mod_shape(&mut self, _shape: f32) {}
}

/// Reverb algorithm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReverbKind {
    /// Digital-waveguide spring tank.
    Spring,
    /// Dattorro figure-eight plate.
    #[default]
    Plate,
    /// Eight-line feedback delay network.
    Hall,
}

/// One instance of every reverb plus the current selection.
///
/// Inactive algorithms are not processed, but they keep their state, so a
/// tail resumes where it left off if the algorithm is selected again.
pub struct ReverbBank {
    spring: SpringReverb,
    plate: PlateReverb,
    hall: HallReverb,
    active: ReverbKind,
}

impl ReverbBank {
    /// Builds all three reverbs with the plate selected.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            spring: SpringReverb::new(sample_rate),
            plate: PlateReverb::new(sample_rate),
            hall: HallReverb::new(sample_rate),
            active: ReverbKind::Plate,
        }
    }

    /// Selects the active reverb.
    pub fn select(&mut self, kind: ReverbKind) {
        #[cfg(feature = "tracing")]
        if kind != self.active {
            tracing::debug!(from = ?self.active, to = ?kind, "reverb algorithm switched");
        }
        self.active = kind;
    }

    /// Currently selected kind.
    pub fn kind(&self) -> ReverbKind {
        self.active
    }

    /// The selected reverb.
    pub fn active(&mut self) -> &mut dyn Reverb {
        match self.active {
            ReverbKind::Spring => &mut self.spring,
            ReverbKind::Plate => &mut self.plate,
            ReverbKind::Hall => &mut self.hall,
        }
    }

    /// Direct access to the spring, for its algorithm-specific setters.
    pub fn spring_mut(&mut self) -> &mut SpringReverb {
        &mut self.spring
    }

    /// Direct access to the plate.
    pub fn plate_mut(&mut self) -> &mut PlateReverb {
        &mut self.plate
    }

    /// Direct access to the hall.
    pub fn hall_mut(&mut self) -> &mut HallReverb {
        &mut self.hall
    }

    /// Clears every algorithm, not only the active one.
    pub fn clear_all(&mut self) {
        self.spring.clear();
        self.plate.clear();
        self.hall.clear();
    }
}

impl core::fmt::Debug for ReverbBank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReverbBank")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl Reverb for Silent {
        fn process_sample(&mut self, _left: f32, _right: f32) -> (f32, f32) {
            (0.0, 0.0)
        }

        fn clear(&mut self) {}
    }

    #[test]
    fn default_setters_are_harmless() {
        let mut reverb = Silent;
        reverb.set_mix(0.5);
        reverb.set_decay(2.0);
        reverb.set_diffusion(-1.0);
        reverb.set_pre_delay(10.0);
        reverb.set_input_high_cut(1e9);
        reverb.set_tank_high_cut(0.0);
        reverb.set_tank_mod_speed(1.0);
        reverb.set_tank_mod_depth(1.0);
        reverb.set_tank_mod_shape(1.0);
        assert_eq!(reverb.process_sample(1.0, 1.0), (0.0, 0.0));
    }

    #[test]
    fn bank_dispatches_to_selection() {
        let mut bank = ReverbBank::new(48000.0);
        assert_eq!(bank.kind(), ReverbKind::Plate);
        for kind in [ReverbKind::Spring, ReverbKind::Hall, ReverbKind::Plate] {
            bank.select(kind);
            bank.active().set_decay(0.5);
            let mut energy = 0.0;
            for i in 0..9600 {
                let x = if i == 0 { 1.0 } else { 0.0 };
                let (l, r) = bank.active().process_sample(x, x);
                energy += l * l + r * r;
            }
            assert!(energy > 0.0, "{kind:?} produced no tail");
        }
    }

    #[test]
    fn clear_all_silences_every_tank() {
        let mut bank = ReverbBank::new(48000.0);
        for kind in [ReverbKind::Spring, ReverbKind::Hall, ReverbKind::Plate] {
            bank.select(kind);
            for _ in 0..1000 {
                bank.active().process_sample(0.5, 0.5);
            }
        }
        bank.clear_all();
        bank.spring_mut().set_mix(1.0);
        for kind in [ReverbKind::Spring, ReverbKind::Hall, ReverbKind::Plate] {
            bank.select(kind);
            for _ in 0..100 {
                assert_eq!(bank.active().process_sample(0.0, 0.0), (0.0, 0.0));
            }
        }
    }
}
