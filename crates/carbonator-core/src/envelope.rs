//! Peak envelope follower.
//!
//! Drives the compressors' level detection and gates the Grape-Flat vinyl
//! noise so the surface noise follows the program and vanishes on silence.

use libm::expf;

/// Peak envelope follower with separate attack and release ballistics.
///
/// ```text
/// coeff = exp(-1 / (time_ms · sr / 1000))
/// env   = coeff · env + (1 - coeff) · |x|
/// ```
///
/// The attack coefficient is used while `|x|` is above the envelope, the
/// release coefficient otherwise.
///
/// # Example
///
/// ```rust
/// use carbonator_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::with_times(48000.0, 10.0, 100.0);
/// let level = env.process(-0.5);
/// assert!(level > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

impl EnvelopeFollower {
    /// Create a follower with 10 ms attack and 100 ms release.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_times(sample_rate, 10.0, 100.0)
    }

    /// Create with specified attack and release times.
    pub fn with_times(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            envelope: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: attack_ms.max(0.01),
            release_ms: release_ms.max(0.1),
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Set the attack time in milliseconds (floored at 0.01 ms).
    ///
    /// Skips the `exp` evaluation when the value is unchanged, so calling
    /// this once per block is cheap.
    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        let attack_ms = attack_ms.max(0.01);
        if attack_ms != self.attack_ms {
            self.attack_ms = attack_ms;
            self.recalculate_coefficients();
        }
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Set the release time in milliseconds (floored at 0.1 ms).
    pub fn set_release_ms(&mut self, release_ms: f32) {
        let release_ms = release_ms.max(0.1);
        if release_ms != self.release_ms {
            self.release_ms = release_ms;
            self.recalculate_coefficients();
        }
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Update sample rate and recalculate coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Track one sample and return the envelope (always ≥ 0).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * input_abs;
        self.envelope
    }

    /// Current envelope level without processing new input.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Reset the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = expf(-1.0 / (self.attack_ms * self.sample_rate / 1000.0));
        self.release_coeff = expf(-1.0 / (self.release_ms * self.sample_rate / 1000.0));
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
