//! Math utilities shared across the synthesizer.
//!
//! Everything here is allocation-free and `no_std`-safe; float math goes
//! through `libm` so the same code runs with or without `std`.

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use acorde_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below zero are floored to -200 dB rather than producing
/// `-inf`, so spectrum displays and meters stay finite.
///
/// # Example
/// ```rust
/// use acorde_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert milliseconds to a sample count at the given rate.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Flush denormal float values to zero.
///
/// Recursive filter state decays toward zero and ends up in the denormal
/// range, where some CPUs fall off a performance cliff. Values below the
/// threshold carry no audible information.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
