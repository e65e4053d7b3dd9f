//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Stereo
//!
//! - [`mid_side_encode`] / [`mid_side_decode`] - Half-scaled M/S matrix
//!
//! # Utilities
//!
//! - [`clamp_cutoff`] - Keep filter frequencies inside the valid band
//! - [`wet_dry_mix`] - Linear crossfade
//! - [`ms_to_samples`] - Time conversion
//! - [`flush_denormal`] - Zero out subnormal feedback state

use libm::{expf, logf};

/// Lowest frequency handed to any coefficient calculator, in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Fraction of the sample rate used as the upper cutoff bound.
///
/// Slightly below Nyquist, where bilinear-transform designs stay well behaved.
pub const NYQUIST_MARGIN: f32 = 0.45;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use carbonator_core::db_to_linear;
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
/// Inputs at or below `1e-10` are floored, so silence maps to -200 dB
/// instead of negative infinity.
///
/// # Example
/// ```rust
/// use carbonator_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Clamp a filter frequency to `[20 Hz, sample_rate × 0.45]`.
///
/// Non-finite input collapses to the lower bound.
#[inline]
pub fn clamp_cutoff(frequency: f32, sample_rate: f32) -> f32 {
    let upper = (sample_rate * NYQUIST_MARGIN).max(MIN_CUTOFF_HZ);
    if frequency.is_finite() {
        frequency.clamp(MIN_CUTOFF_HZ, upper)
    } else {
        MIN_CUTOFF_HZ
    }
}

/// Encode a stereo pair into mid/side: `m = (l + r) / 2`, `s = (l - r) / 2`.
#[inline]
pub fn mid_side_encode(left: f32, right: f32) -> (f32, f32) {
    ((left + right) * 0.5, (left - right) * 0.5)
}

/// Decode mid/side back to left/right: `l = m + s`, `r = m - s`.
///
/// Exact inverse of [`mid_side_encode`].
#[inline]
pub fn mid_side_decode(mid: f32, side: f32) -> (f32, f32) {
    (mid + side, mid - side)
}

/// Convert milliseconds to samples (fractional).
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Flush denormal (subnormal) floats to zero.
///
/// Feedback paths decaying toward silence produce subnormals that are
/// 10-100× slower on x86 FPUs. Applied to filter state after each update.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals: `dry * (1 - mix) + wet * mix`.
///
/// Written as `dry + (wet - dry) * mix`, one multiply fewer.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conversions() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-12.0) - 0.251).abs() < 0.001);
        assert!((db_to_linear(12.0) - 3.981).abs() < 0.001);
        assert!((linear_to_db(db_to_linear(-7.5)) + 7.5).abs() < 1e-3);
    }

    #[test]
    fn test_linear_to_db_silence_is_finite() {
        let db = linear_to_db(0.0);
        assert!(db.is_finite());
        assert!(db <= -199.0);
    }

    #[test]
    fn test_clamp_cutoff() {
        assert_eq!(clamp_cutoff(5.0, 48000.0), 20.0);
        assert_eq!(clamp_cutoff(30000.0, 48000.0), 48000.0 * 0.45);
        assert_eq!(clamp_cutoff(1000.0, 48000.0), 1000.0);
        assert_eq!(clamp_cutoff(f32::NAN, 48000.0), 20.0);
        assert_eq!(clamp_cutoff(f32::INFINITY, 48000.0), 20.0);
    }

    #[test]
    fn test_mid_side_roundtrip_is_exact_for_identical_channels() {
        let (m, s) = mid_side_encode(0.3, 0.3);
        assert_eq!(s, 0.0);
        let (l, r) = mid_side_decode(m, s);
        assert_eq!(l, r);
    }

    #[test]
    fn test_mid_side_roundtrip() {
        let (m, s) = mid_side_encode(0.8, -0.2);
        let (l, r) = mid_side_decode(m, s);
        assert!((l - 0.8).abs() < 1e-6);
        assert!((r + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_wet_dry_mix_endpoints() {
        assert_eq!(wet_dry_mix(0.25, 0.75, 0.0), 0.25);
        assert_eq!(wet_dry_mix(0.25, 0.75, 1.0), 0.75);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }
}
