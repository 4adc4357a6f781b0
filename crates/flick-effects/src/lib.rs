//! Flick Effects - the pedal's three effect families
//!
//! Built on flick-core primitives. Every effect processes one stereo sample
//! at a time and claims all of its memory at construction.
//!
//! - [`DelayEffect`] - stereo feedback delay with glide on time changes
//! - [`TremoloBank`] - sine, rounded-square and harmonic tremolos behind the
//!   [`Tremolo`] trait
//! - [`ReverbBank`] - spring, plate and hall reverbs behind the [`Reverb`]
//!   trait
//!
//! ## Example
//!
//! ```rust
//! use flick_effects::{DelayEffect, ReverbBank, ReverbKind, TremoloBank, TremoloKind};
//!
//! let mut delay = DelayEffect::new(48000.0, 96000);
//! let mut tremolo = TremoloBank::new(48000.0);
//! let mut reverb = ReverbBank::new(48000.0);
//!
//! tremolo.select(TremoloKind::Harmonic);
//! reverb.select(ReverbKind::Hall);
//!
//! let (dl, dr) = delay.process_sample(0.25, 0.25);
//! let (tl, tr) = tremolo.active().process_sample(0.25 + dl, 0.25 + dr);
//! let (_l, _r) = reverb.active().process_sample(tl, tr);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod delay;
pub mod hall;
pub mod plate;
pub mod reverb;
pub mod spring;
pub mod tremolo;

pub use delay::{DELAY_TIME_SMOOTHING, DelayEffect};
pub use hall::HallReverb;
pub use plate::PlateReverb;
pub use reverb::{Reverb, ReverbBank, ReverbKind};
pub use spring::SpringReverb;
pub use tremolo::{AmplitudeTremolo, HarmonicTremolo, Tremolo, TremoloBank, TremoloKind};
