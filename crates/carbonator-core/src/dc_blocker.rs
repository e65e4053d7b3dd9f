//! DC blocking filter.
//!
//! First-order highpass after Julius O. Smith:
//!
//! ```text
//! H(z) = (1 - z^-1) / (1 - R*z^-1),   R = 1 - 2π·fc/fs
//! ```
//!
//! The biased waveshapers in Cola and Grape leave a DC offset behind when
//! they clip asymmetrically; a 5 Hz blocker after them removes it.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters with Audio
//! Applications", DC Blocker.

use core::f32::consts::PI;

use crate::Effect;
use crate::math::flush_denormal;

/// DC blocking filter using a first-order highpass.
///
/// ## Parameters
/// - `cutoff_hz`: -3 dB corner (default 5 Hz)
///
/// ## Example
///
/// ```rust
/// use carbonator_core::{DcBlocker, Effect};
///
/// let mut blocker = DcBlocker::with_cutoff(5.0, 48000.0);
/// let output = blocker.process(0.6);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R coefficient (pole position)
    coeff: f32,
    /// Corner frequency in Hz
    cutoff_hz: f32,
    /// Previous input sample x[n-1]
    x_prev: f32,
    /// Previous output sample y[n-1]
    y_prev: f32,
}

impl DcBlocker {
    /// Default corner frequency in Hz.
    pub const DEFAULT_CUTOFF_HZ: f32 = 5.0;

    /// Create a DC blocker with the default 5 Hz corner.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_cutoff(Self::DEFAULT_CUTOFF_HZ, sample_rate)
    }

    /// Create a DC blocker with a specific corner frequency.
    pub fn with_cutoff(cutoff_hz: f32, sample_rate: f32) -> Self {
        Self {
            coeff: Self::calculate_coeff(cutoff_hz, sample_rate),
            cutoff_hz,
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Current R coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// `R = 1 - 2π·fc/fs`, clamped to `[0.9, 0.99999]`.
    fn calculate_coeff(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let r = 1.0 - (2.0 * PI * cutoff_hz / sample_rate);
        r.clamp(0.9, 0.99999)
    }
}

impl Effect for DcBlocker {
    /// `y[n] = x[n] - x[n-1] + R * y[n-1]`
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = flush_denormal(output);
        output
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coeff = Self::calculate_coeff(self.cutoff_hz, sample_rate);
    }

    fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_blocker_removes_dc() {
        let mut blocker = DcBlocker::new(48000.0);

        let mut output = 0.0;
        for _ in 0..96000 {
            output = blocker.process(1.0);
        }

        assert!(output.abs() < 0.01, "DC should be removed, got {}", output);
    }

    #[test]
    fn test_dc_blocker_passes_ac() {
        let mut blocker = DcBlocker::new(48000.0);
        let freq = 1000.0;
        let sample_rate = 48000.0;

        let mut max_output = 0.0f32;
        for i in 0..48048 {
            let t = i as f32 / sample_rate;
            let output = blocker.process(libm::sinf(2.0 * PI * freq * t));
            if i >= 48000 {
                max_output = max_output.max(output.abs());
            }
        }

        assert!(
            max_output > 0.95,
            "1 kHz should pass through, max output was {}",
            max_output
        );
    }

    #[test]
    fn test_dc_blocker_reset() {
        let mut blocker = DcBlocker::new(48000.0);
        for _ in 0..1000 {
            blocker.process(1.0);
        }
        blocker.reset();
        assert_eq!(blocker.process(0.0), 0.0);
    }

    #[test]
    fn test_dc_blocker_sample_rate_keeps_corner() {
        let mut blocker = DcBlocker::with_cutoff(5.0, 44100.0);
        let low_rate = blocker.coeff();
        blocker.set_sample_rate(192000.0);
        assert!(blocker.coeff() > low_rate, "higher rate should move R toward 1");
    }

    #[test]
    fn test_dc_blocker_silence_stays_silent() {
        let mut blocker = DcBlocker::new(44100.0);
        for _ in 0..1000 {
            assert_eq!(blocker.process(0.0), 0.0);
        }
    }
}
