//! Biquad (bi-quadratic) filter structure.
//!
//! A generic second-order IIR section plus RBJ Audio EQ Cookbook coefficient
//! calculators for the responses the flavor chains use: low/high-pass,
//! peaking bell and low/high shelf.
//!
//! Every calculator clamps its frequency to `[20 Hz, sr × 0.45]` and its Q to
//! a positive minimum before evaluating, so curve-derived parameters can be
//! passed straight through.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

use crate::math::clamp_cutoff;

/// Raw cookbook coefficients `(b0, b1, b2, a0, a1, a2)`, not yet normalized.
pub type BiquadCoefficients = (f32, f32, f32, f32, f32, f32);

const MIN_Q: f32 = 0.05;

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients (normalized by a0)
    a1: f32,
    a2: f32,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    ///
    /// History is kept, so coefficients can change between blocks without
    /// a discontinuity in the filter state.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Sets coefficients from a calculator's output tuple.
    #[inline]
    pub fn apply(&mut self, coefficients: BiquadCoefficients) {
        let (b0, b1, b2, a0, a1, a2) = coefficients;
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::math::flush_denormal(output);

        output
    }

    /// Processes a buffer in place.
    #[inline]
    pub fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clears the filter state (delay lines), keeping coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared cookbook intermediates: `(cos ω, α)`.
#[inline]
fn omega_alpha(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let frequency = clamp_cutoff(frequency, sample_rate);
    let omega = 2.0 * PI * frequency / sample_rate;
    let alpha = sinf(omega) / (2.0 * q.max(MIN_Q));
    (cosf(omega), alpha)
}

/// Low-pass coefficients (RBJ cookbook).
///
/// * `frequency` - Cutoff in Hz
/// * `q` - 0.707 for Butterworth, higher for a resonant peak
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// High-pass coefficients (RBJ cookbook).
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Peaking bell coefficients (RBJ cookbook).
///
/// Boosts or cuts `gain_db` around `frequency`; a negative gain with a
/// narrow Q gives the gentle de-harsh dip.
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

/// Low-shelf coefficients (RBJ cookbook).
///
/// Gain approaches `gain_db` below `frequency` and 0 dB above it.
pub fn low_shelf_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// High-shelf coefficients (RBJ cookbook).
///
/// Gain approaches `gain_db` above `frequency` and 0 dB below it.
pub fn high_shelf_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_alpha(frequency, q, sample_rate);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dc_gain(coefficients: BiquadCoefficients) -> f32 {
        let mut biquad = Biquad::new();
        biquad.apply(coefficients);
        let mut out = 0.0;
        for _ in 0..20000 {
            out = biquad.process(1.0);
        }
        out
    }

    fn nyquist_gain(coefficients: BiquadCoefficients) -> f32 {
        let mut biquad = Biquad::new();
        biquad.apply(coefficients);
        let mut peak = 0.0f32;
        for i in 0..20000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = biquad.process(x);
            if i > 10000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-6);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = Biquad::new();
        biquad.apply(lowpass_coefficients(1000.0, 0.707, 44100.0));
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.clear();
        assert_eq!(biquad.process(0.0), 0.0);
    }

    #[test]
    fn test_lowpass_dc_pass() {
        let gain = dc_gain(lowpass_coefficients(1000.0, 0.707, 44100.0));
        assert!((gain - 1.0).abs() < 0.01, "LP DC gain {gain}");
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let gain = dc_gain(highpass_coefficients(300.0, 0.707, 44100.0));
        assert!(gain.abs() < 0.01, "HP DC gain {gain}");
    }

    #[test]
    fn test_peaking_eq_unity_at_zero_gain() {
        let gain = dc_gain(peaking_eq_coefficients(1000.0, 1.0, 0.0, 44100.0));
        assert!((gain - 1.0).abs() < 0.01, "DC should pass at 0 dB, got {gain}");
    }

    #[test]
    fn test_low_shelf_gain_below_corner() {
        let gain = dc_gain(low_shelf_coefficients(200.0, 0.707, 3.5, 48000.0));
        let expected = powf(10.0, 3.5 / 20.0);
        assert!(
            (gain - expected).abs() < 0.01,
            "low shelf DC gain {gain}, expected {expected}"
        );
        let hf = nyquist_gain(low_shelf_coefficients(200.0, 0.707, 3.5, 48000.0));
        assert!((hf - 1.0).abs() < 0.01, "low shelf HF gain {hf}");
    }

    #[test]
    fn test_high_shelf_gain_above_corner() {
        let dc = dc_gain(high_shelf_coefficients(8000.0, 0.707, -3.0, 48000.0));
        assert!((dc - 1.0).abs() < 0.01, "high shelf DC gain {dc}");
        let hf = nyquist_gain(high_shelf_coefficients(8000.0, 0.707, -3.0, 48000.0));
        let expected = powf(10.0, -3.0 / 20.0);
        assert!(
            (hf - expected).abs() < 0.02,
            "high shelf HF gain {hf}, expected {expected}"
        );
    }

    #[test]
    fn test_shelves_flat_at_zero_gain() {
        for coefficients in [
            low_shelf_coefficients(200.0, 0.707, 0.0, 44100.0),
            high_shelf_coefficients(12000.0, 0.707, 0.0, 44100.0),
        ] {
            let (b0, b1, b2, a0, a1, a2) = coefficients;
            assert!((b0 / a0 - 1.0).abs() < 1e-5);
            assert!((b1 - a1).abs() < 1e-5);
            assert!((b2 - a2).abs() < 1e-5);
        }
    }

    #[test]
    fn test_out_of_range_frequency_is_clamped() {
        for coefficients in [
            high_shelf_coefficients(30000.0, 0.707, 4.0, 22050.0),
            lowpass_coefficients(0.0, 0.0, 44100.0),
            peaking_eq_coefficients(f32::NAN, 2.0, -4.0, 44100.0),
        ] {
            let (b0, b1, b2, a0, a1, a2) = coefficients;
            for c in [b0, b1, b2, a0, a1, a2] {
                assert!(c.is_finite());
            }
        }
    }
}
