//! Feed-forward hard-knee compressor.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Envelope Follower → Gain Computer → Gain Reduction → Output
//! ```
//!
//! Cola and Lemon-Lime run it linked across channels through
//! [`Compressor::process_linked`]; Orange Cream runs it on the mid signal
//! through the mono [`Effect`] impl.
//!
//! # Parameters
//!
//! | Parameter | Range | Description |
//! |-----------|-------|-------------|
//! | Threshold | -60 to 0 dB | Level where compression begins |
//! | Ratio | 1:1 to 20:1 | Compression strength |
//! | Attack | 0.1-100 ms | How fast gain reduction engages |
//! | Release | 10-1000 ms | How fast gain reduction releases |

use core::ops::Range;

use carbonator_core::{Effect, EnvelopeFollower, db_to_linear, linear_to_db};

/// Static curve: 0 dB below threshold, `(1 - 1/ratio)` of the overshoot above.
#[derive(Debug, Clone)]
struct GainComputer {
    threshold_db: f32,
    ratio: f32,
}

impl GainComputer {
    fn new() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 4.0,
        }
    }

    #[inline]
    fn compute_gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;
        if overshoot <= 0.0 {
            0.0
        } else {
            -overshoot * (1.0 - 1.0 / self.ratio)
        }
    }
}

/// Dynamics compressor.
///
/// # Example
///
/// ```rust
/// use carbonator_core::Effect;
/// use carbonator_effects::Compressor;
///
/// let mut comp = Compressor::new(44100.0);
/// comp.set_threshold_db(-20.0);
/// comp.set_ratio(4.0);
/// comp.set_attack_ms(5.0);
/// comp.set_release_ms(50.0);
///
/// let output = comp.process(0.5);
/// assert!(output.abs() <= 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    envelope_follower: EnvelopeFollower,
    gain_computer: GainComputer,
    /// Last computed gain reduction in dB (always non-positive).
    last_gain_reduction_db: f32,
}

impl Compressor {
    /// Create a compressor at -18 dB, 4:1, 10 ms attack, 100 ms release.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelope_follower: EnvelopeFollower::with_times(sample_rate, 10.0, 100.0),
            gain_computer: GainComputer::new(),
            last_gain_reduction_db: 0.0,
        }
    }

    /// Set threshold in dB.
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.gain_computer.threshold_db = threshold_db.clamp(-60.0, 0.0);
    }

    /// Threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.gain_computer.threshold_db
    }

    /// Set compression ratio.
    pub fn set_ratio(&mut self, ratio: f32) {
        self.gain_computer.ratio = ratio.clamp(1.0, 20.0);
    }

    /// Compression ratio.
    pub fn ratio(&self) -> f32 {
        self.gain_computer.ratio
    }

    /// Set attack time in milliseconds.
    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        self.envelope_follower
            .set_attack_ms(attack_ms.clamp(0.1, 100.0));
    }

    /// Set release time in milliseconds.
    pub fn set_release_ms(&mut self, release_ms: f32) {
        self.envelope_follower
            .set_release_ms(release_ms.clamp(10.0, 1000.0));
    }

    /// Returns the last computed gain reduction in dB (always non-positive).
    ///
    /// A value of 0.0 means no compression is occurring. A value of -6.0
    /// means the signal is being reduced by 6 dB.
    pub fn gain_reduction_db(&self) -> f32 {
        self.last_gain_reduction_db
    }

    /// Track `level` and return the linear gain to apply.
    #[inline]
    fn gain_for(&mut self, level: f32) -> f32 {
        let envelope = self.envelope_follower.process(level);
        let gain_reduction_db = self.gain_computer.compute_gain_db(linear_to_db(envelope));
        self.last_gain_reduction_db = gain_reduction_db;
        db_to_linear(gain_reduction_db)
    }

    /// Compress `range` of every channel with one shared gain.
    ///
    /// The detector follows the loudest channel at each sample, so every
    /// channel receives identical gain reduction and the stereo image holds.
    pub fn process_linked(&mut self, block: &mut [&mut [f32]], range: Range<usize>) {
        for i in range {
            let peak = block
                .iter()
                .filter_map(|channel| channel.get(i))
                .fold(0.0f32, |peak, s| peak.max(s.abs()));
            let gain = self.gain_for(peak);
            for channel in block.iter_mut() {
                if let Some(sample) = channel.get_mut(i) {
                    *sample *= gain;
                }
            }
        }
    }
}

impl Effect for Compressor {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain_for(input)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope_follower.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.envelope_follower.reset();
        self.last_gain_reduction_db = 0.0;
    }
}
