//! Output safety limiter.
//!
//! The last stage of [`EffectsChain`](crate::EffectsChain): whatever the
//! flavor chain, auto-gain and output gain did upstream, no sample leaves the
//! engine above the ceiling.
//!
//! # Algorithm
//!
//! 1. **Peak detection**: the loudest channel at each sample (linked, so the
//!    stereo image never shifts).
//! 2. **Gain computation**: `target = threshold / peak` when the peak is over
//!    the threshold, otherwise 1.
//! 3. **Ballistics**: instant attack (`g = target` when the target is lower),
//!    exponential release back toward unity:
//!    `g[n] = release_coeff · g[n-1] + (1 - release_coeff) · target`.
//! 4. **Output**: `x · g`, hard-clamped to the threshold. Non-finite samples
//!    are flushed to zero.
//!
//! There is no lookahead, so the limiter adds no latency. Instant attack
//! alone already guarantees the ceiling; the clamp only absorbs rounding.

use carbonator_core::{db_to_linear, linear_to_db};
use libm::expf;

/// Brickwall limiter with zero lookahead, linked across channels.
///
/// # Example
///
/// ```rust
/// use carbonator_effects::SafetyLimiter;
///
/// let mut limiter = SafetyLimiter::new(48000.0);
/// let mut left = [2.0f32, 0.5, -3.0];
/// let mut right = [0.1f32, 0.1, 0.1];
/// let mut block: [&mut [f32]; 2] = [&mut left, &mut right];
/// limiter.process_block(&mut block, 3);
/// assert!(left.iter().chain(right.iter()).all(|s| s.abs() <= 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct SafetyLimiter {
    sample_rate: f32,
    /// Linear threshold, also the output ceiling.
    threshold: f32,
    release_ms: f32,
    /// `exp(-1 / (release_ms · sr / 1000))`
    release_coeff: f32,
    /// Current gain (linear, 1.0 = no reduction).
    gain: f32,
}

impl SafetyLimiter {
    /// Default release time.
    pub const DEFAULT_RELEASE_MS: f32 = 50.0;

    /// Create a limiter at 0 dBFS with a 50 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut limiter = Self {
            sample_rate,
            threshold: 1.0,
            release_ms: Self::DEFAULT_RELEASE_MS,
            release_coeff: 0.0,
            gain: 1.0,
        };
        limiter.recalculate_release();
        limiter
    }

    /// Set the threshold (and ceiling) in dBFS, at most 0 dB.
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold = db_to_linear(threshold_db.clamp(-30.0, 0.0));
    }

    /// Threshold in dBFS.
    pub fn threshold_db(&self) -> f32 {
        linear_to_db(self.threshold)
    }

    /// Set the release time in milliseconds.
    pub fn set_release_ms(&mut self, release_ms: f32) {
        self.release_ms = release_ms.clamp(1.0, 1000.0);
        self.recalculate_release();
    }

    /// Update the sample rate, keeping the release time.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_release();
    }

    /// Current gain reduction in dB (always non-positive).
    pub fn gain_reduction_db(&self) -> f32 {
        linear_to_db(self.gain).min(0.0)
    }

    /// Return to unity gain.
    pub fn reset(&mut self) {
        self.gain = 1.0;
    }

    /// Limit the first `len` samples of every channel in place.
    pub fn process_block(&mut self, block: &mut [&mut [f32]], len: usize) {
        let ceiling = self.threshold;
        for i in 0..len {
            let peak = block
                .iter()
                .filter_map(|channel| channel.get(i))
                .filter(|s| s.is_finite())
                .fold(0.0f32, |peak, s| peak.max(s.abs()));

            let target = if peak > ceiling { ceiling / peak } else { 1.0 };
            self.gain = if target < self.gain {
                target
            } else {
                self.release_coeff * self.gain + (1.0 - self.release_coeff) * target
            };

            let gain = self.gain;
            for channel in block.iter_mut() {
                if let Some(sample) = channel.get_mut(i) {
                    let limited = *sample * gain;
                    *sample = if limited.is_finite() {
                        limited.clamp(-ceiling, ceiling)
                    } else {
                        0.0
                    };
                }
            }
        }
    }

    fn recalculate_release(&mut self) {
        self.release_coeff = expf(-1.0 / (self.release_ms * self.sample_rate / 1000.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(limiter: &mut SafetyLimiter, left: &mut [f32], right: &mut [f32]) {
        let len = left.len();
        let mut block: [&mut [f32]; 2] = [left, right];
        limiter.process_block(&mut block, len);
    }

    #[test]
    fn test_ceiling_holds() {
        let mut limiter = SafetyLimiter::new(48000.0);
        let mut left: Vec<f32> = (0..2048).map(|i| 4.0 * ((i as f32) * 0.01).sin()).collect();
        let mut right: Vec<f32> = left.iter().map(|s| -s * 0.7).collect();
        run(&mut limiter, &mut left, &mut right);
        for s in left.iter().chain(right.iter()) {
            assert!(s.abs() <= 1.0, "sample {s} over ceiling");
        }
    }

    #[test]
    fn test_quiet_signal_untouched() {
        let mut limiter = SafetyLimiter::new(48000.0);
        let mut left = vec![0.5f32; 256];
        let mut right = vec![-0.25f32; 256];
        run(&mut limiter, &mut left, &mut right);
        assert!(left.iter().all(|&s| s == 0.5));
        assert!(right.iter().all(|&s| s == -0.25));
        assert_eq!(limiter.gain_reduction_db(), 0.0);
    }

    #[test]
    fn test_linked_reduction() {
        let mut limiter = SafetyLimiter::new(48000.0);
        let mut left = [2.0f32];
        let mut right = [0.5f32];
        run(&mut limiter, &mut left, &mut right);
        assert!((left[0] - 1.0).abs() < 1e-6);
        assert!((right[0] - 0.25).abs() < 1e-6);
        assert!((limiter.gain_reduction_db() + 6.02).abs() < 0.01);
    }

    #[test]
    fn test_release_recovers() {
        let mut limiter = SafetyLimiter::new(48000.0);
        let mut left = [4.0f32];
        let mut right = [0.0f32];
        run(&mut limiter, &mut left, &mut right);
        assert!(limiter.gain_reduction_db() < -11.0);

        // 10 time constants of release
        let mut left = vec![0.1f32; 24000];
        let mut right = vec![0.1f32; 24000];
        run(&mut limiter, &mut left, &mut right);
        assert!(limiter.gain_reduction_db() > -0.01);
        assert!((left[23999] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_flushed() {
        let mut limiter = SafetyLimiter::new(48000.0);
        let mut left = [f32::NAN, f32::INFINITY, 0.5];
        let mut right = [0.2f32, 0.2, 0.2];
        run(&mut limiter, &mut left, &mut right);
        assert_eq!(left[0], 0.0);
        assert_eq!(left[1], 0.0);
        assert!(left[2].is_finite());
        assert!(right.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_reset_restores_unity() {
        let mut limiter = SafetyLimiter::new(48000.0);
        let mut left = [3.0f32];
        let mut right = [3.0f32];
        run(&mut limiter, &mut left, &mut right);
        limiter.reset();
        assert_eq!(limiter.gain_reduction_db(), 0.0);
    }

    #[test]
    fn test_lower_threshold() {
        let mut limiter = SafetyLimiter::new(48000.0);
        limiter.set_threshold_db(-6.0);
        let mut left = vec![0.9f32; 64];
        let mut right = vec![0.9f32; 64];
        run(&mut limiter, &mut left, &mut right);
        let ceiling = db_to_linear(-6.0);
        assert!(left.iter().all(|&s| s <= ceiling + 1e-6));
    }
}
