//! Nonlinear mappings from the normalized Fizz control onto parameter ranges.
//!
//! Every flavor derives its per-block parameters from a single smoothed
//! Fizz value in `[0, 1]`. How a parameter moves across that range shapes
//! the feel of the knob, so each parameter picks one of four curves:
//!
//! | Curve | Formula | Feel | Typical use |
//! |-------|---------|------|-------------|
//! | [`exponential`] | `min + f^c · (max - min)` | slow start, fast finish | drive, ratio |
//! | [`logarithmic`] | `min + (1 - (1 - f)^c) · (max - min)` | fast start, slow finish | EQ gain, cutoff |
//! | [`s_curve`] | `min + (3f² - 2f³) · (max - min)` | gentle at both ends | blend, width, detune |
//! | [`linear`] | `min + f · (max - min)` | proportional | thresholds |
//!
//! `min > max` is allowed and yields a falling curve (e.g. a cutoff that
//! closes as Fizz rises). Fizz is clamped to `[0, 1]`, so every function
//! returns `min` at 0 and `max` at 1.
//!
//! All functions are pure and cheap enough to call per sample.

use libm::powf;

#[inline]
fn normalize(fizz: f32) -> f32 {
    if fizz.is_nan() { 0.0 } else { fizz.clamp(0.0, 1.0) }
}

/// Exponential curve: `min + fizz^curve · (max - min)`.
///
/// `curve > 1` pushes most of the change toward the top of the range.
///
/// ```rust
/// use carbonator_core::fizz_curves::exponential;
///
/// assert_eq!(exponential(0.0, 1.0, 4.0, 2.5), 1.0);
/// assert_eq!(exponential(1.0, 1.0, 4.0, 2.5), 4.0);
/// assert!(exponential(0.5, 1.0, 4.0, 2.5) < 2.5);
/// ```
#[inline]
pub fn exponential(fizz: f32, min: f32, max: f32, curve: f32) -> f32 {
    let f = normalize(fizz);
    if f >= 1.0 {
        return max;
    }
    min + powf(f, curve) * (max - min)
}

/// Logarithmic curve: `min + (1 - (1 - fizz)^curve) · (max - min)`.
///
/// `curve > 1` front-loads the change toward the bottom of the range.
#[inline]
pub fn logarithmic(fizz: f32, min: f32, max: f32, curve: f32) -> f32 {
    let f = normalize(fizz);
    if f >= 1.0 {
        return max;
    }
    min + (1.0 - powf(1.0 - f, curve)) * (max - min)
}

/// Hermite smoothstep `3f² - 2f³` scaled into `[min, max]`.
#[inline]
pub fn s_curve(fizz: f32, min: f32, max: f32) -> f32 {
    let f = normalize(fizz);
    if f >= 1.0 {
        return max;
    }
    let shaped = f * f * (3.0 - 2.0 * f);
    min + shaped * (max - min)
}

/// Affine map of Fizz onto `[min, max]`.
#[inline]
pub fn linear(fizz: f32, min: f32, max: f32) -> f32 {
    let f = normalize(fizz);
    if f >= 1.0 {
        return max;
    }
    min + f * (max - min)
}
