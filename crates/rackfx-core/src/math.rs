//! Scalar helpers shared by the units and the processor.
//!
//! Level: [`db_to_linear`], [`linear_to_db`]. Time: [`ms_to_samples`],
//! [`samples_to_ms`]. Signal: [`hard_clip`], [`wet_dry_mix`],
//! [`flush_denormal`]. Nothing here allocates.

use libm::{expf, logf};

/// ln(10) / 20, the slope between decibels and natural-log amplitude.
const DB_TO_NEPER: f32 = core::f32::consts::LN_10 / 20.0;

/// Amplitude below which [`linear_to_db`] stops tracking (-200 dB).
const LEVEL_FLOOR: f32 = 1e-10;

/// Gain factor for a level in decibels.
///
/// ```rust
/// use rackfx_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
/// assert!((db_to_linear(6.0206) - 2.0).abs() < 1e-3);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    expf(db * DB_TO_NEPER)
}

/// Level in decibels for a gain factor. Silence reads as -200 dB rather
/// than negative infinity.
///
/// ```rust
/// use rackfx_core::linear_to_db;
///
/// assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-3);
/// assert!(linear_to_db(0.0).is_finite());
/// ```
#[inline]
pub fn linear_to_db(gain: f32) -> f32 {
    logf(gain.max(LEVEL_FLOOR)) / DB_TO_NEPER
}

/// Limits `x` to `±ceiling`.
#[inline]
pub fn hard_clip(x: f32, ceiling: f32) -> f32 {
    x.clamp(-ceiling, ceiling)
}

/// Fractional sample count spanning `ms` at `sample_rate`.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * 0.001 * sample_rate
}

/// Inverse of [`ms_to_samples`].
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples / sample_rate * 1000.0
}

/// Zeroes values small enough to drift into the subnormal range inside a
/// feedback loop.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Linear dry/wet blend: 0.0 returns `dry`, 1.0 returns `wet`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}
