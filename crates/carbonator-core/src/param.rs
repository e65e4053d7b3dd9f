//! Exponentially smoothed parameters for click-free control changes.
//!
//! Fizz, output gain and the auto-gain correction all change between
//! blocks. Jumping straight to a new value produces audible steps, so each
//! is wrapped in a [`SmoothedParam`] that glides toward its target with a
//! one-pole response.
//!
//! Reading is split in two on purpose:
//!
//! - [`SmoothedParam::get`] returns the current value and is idempotent.
//! - [`SmoothedParam::advance`] moves one sample toward the target and
//!   returns the new value; [`SmoothedParam::skip`] moves `n` samples at once.
//!
//! ## Usage
//!
//! ```rust
//! use carbonator_core::SmoothedParam;
//!
//! let mut gain = SmoothedParam::with_config(1.0, 48000.0, 50.0);
//! gain.set_target(0.5);
//!
//! for _ in 0..480 {
//!     let g = gain.advance();
//!     assert!(g <= 1.0 && g >= 0.5);
//! }
//! ```

use libm::{expf, powf};

/// A parameter with one-pole exponential smoothing.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant, ~0 = very slow)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time constant in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter with an initial value.
    ///
    /// Smoothing is disabled (instant changes) until a sample rate and
    /// smoothing time are configured.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Set the value to glide toward.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and current value together (no glide).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set the smoothing time constant in milliseconds. 0 disables smoothing.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // y[n] = y[n-1] + coeff * (target - y[n-1])
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Advance `samples` steps at once.
    ///
    /// Equivalent to calling [`advance`](Self::advance) `samples` times, up to
    /// rounding: the distance to the target shrinks by `(1 - coeff)^n`.
    #[inline]
    pub fn skip(&mut self, samples: usize) {
        if samples == 0 {
            return;
        }
        let remaining = powf(1.0 - self.coeff, samples as f32);
        self.current = self.target + (self.current - self.target) * remaining;
    }

    /// Current value, without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the value has reached its target (within 1e-6).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Jump to the target value.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// `coeff = 1 - exp(-1 / (tau · sample_rate))`, with `tau` in seconds.
    ///
    /// After 5·tau the value has covered 99.3% of the distance to the target.
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
