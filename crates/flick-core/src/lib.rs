//! Flick Core - DSP primitives for the flick pedal
//!
//! This crate provides the building blocks every flick effect is assembled
//! from. Everything here is real-time safe: memory is claimed up front and
//! nothing allocates, blocks, or fails inside a per-sample call.
//!
//! # Filters
//!
//! - [`OnePole`] - 6 dB/oct lowpass used for damping and band splitting
//! - [`OnePoleHighpass`] - matching 6 dB/oct highpass
//! - [`Biquad`] - Direct Form I second-order section with RBJ coefficient helpers
//!   ([`peaking_eq_coefficients`], [`low_shelf_coefficients`])
//! - [`Allpass`] - delay-based allpass in the three shapes the reverbs use
//!
//! # Oscillator
//!
//! - [`Oscillator`] - phase accumulator with sine and rounded-square outputs
//!
//! # Delay Memory
//!
//! - [`DelayLine`] - fractional-read ring buffer, generic over its storage
//! - [`SampleArena`] - carves one pre-allocated pool into delay buffers
//!
//! # Smoothing
//!
//! - [`SmoothedParam`] - fixed-coefficient one-pole slew toward a target
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets:
//!
//! ```toml
//! [dependencies]
//! flick-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod arena;
pub mod biquad;
pub mod delay;
pub mod math;
pub mod one_pole;
pub mod oscillator;
pub mod param;

pub use allpass::{Allpass, AllpassForm};
pub use arena::SampleArena;
pub use biquad::{Biquad, low_shelf_coefficients, peaking_eq_coefficients};
pub use delay::{DelayLine, SampleStorage};
pub use math::{
    db_to_linear, flush_denormal, hard_limit, mono_sum, ms_to_samples, samples_to_ms,
    slew_toward,
};
pub use one_pole::{OnePole, OnePoleHighpass};
pub use oscillator::{Oscillator, Waveform};
pub use param::SmoothedParam;
