//! Small math helpers shared by the flick effects.
//!
//! All functions are allocation-free and `no_std` friendly.

use libm::powf;

/// Convert decibels to linear gain.
///
/// ```rust
/// use flick_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
/// assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Hard limit a sample to full scale (±1.0).
#[inline]
pub fn hard_limit(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// Average a stereo pair down to mono.
#[inline]
pub fn mono_sum(left: f32, right: f32) -> f32 {
    (left + right) * 0.5
}

/// One step of a one-pole slew: move `current` toward `target` by `coeff`
/// of the remaining distance.
///
/// The step never overshoots for `coeff` in [0, 1].
#[inline]
pub fn slew_toward(current: f32, target: f32, coeff: f32) -> f32 {
    current + coeff * (target - current)
}

/// Convert milliseconds to (fractional) samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert samples to milliseconds.
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples * 1000.0 / sample_rate
}

/// Flush denormal floats to zero.
///
/// Recirculating paths (delay feedback, reverb tanks, allpass chains) decay
/// toward zero forever; subnormal arithmetic is dramatically slower on most
/// cores, so anything below 1e-20 is snapped to zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
