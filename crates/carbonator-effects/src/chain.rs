//! Top-level engine.
//!
//! # Signal Flow
//!
//! ```text
//! Input → [bypass?] → input RMS → FlavorProcessor → output RMS
//!       → auto-gain → output gain → SafetyLimiter → Output
//! ```
//!
//! Auto-gain is a slow control loop: both RMS meters are one-pole smoothed
//! across blocks (α = 0.01 per block), and the correction `in / out`, clamped
//! to ±12 dB, becomes the target of a 50 ms gain ramp. Quiet passages (either
//! meter at or below 1e-6) hold the last correction.

use carbonator_core::{SmoothedParam, db_to_linear};
use libm::sqrtf;

use crate::error::Result;
use crate::flavor_processor::FlavorProcessor;
use crate::limiter::SafetyLimiter;
use crate::params::{ParamSnapshot, ProcessSpec};

/// Per-block smoothing of the RMS meters.
const RMS_ALPHA: f32 = 0.01;
/// Meters at or below this level freeze the auto-gain target.
const RMS_FLOOR: f32 = 1e-6;
/// Auto-gain correction limits, ±12 dB.
const AUTO_GAIN_MIN: f32 = 0.251;
const AUTO_GAIN_MAX: f32 = 3.981;
/// Ramp time for the auto-gain and output gain.
const GAIN_SMOOTHING_MS: f32 = 50.0;

/// The complete soda effects engine.
///
/// `prepare` once, then `process` block by block with a fresh
/// [`ParamSnapshot`] each time. `process` never allocates.
///
/// # Example
///
/// ```rust
/// use carbonator_effects::{EffectsChain, FlavorType, ParamSnapshot, ProcessSpec};
///
/// let mut engine = EffectsChain::new();
/// engine.prepare(ProcessSpec::new(48000.0, 256, 2)).unwrap();
///
/// let params = ParamSnapshot {
///     flavor: FlavorType::OrangeCream,
///     fizz: 75.0,
///     ..ParamSnapshot::default()
/// };
/// let mut left = vec![0.3f32; 256];
/// let mut right = vec![-0.3f32; 256];
/// engine.process(&mut [&mut left[..], &mut right[..]], &params);
/// assert!(left.iter().chain(right.iter()).all(|s| s.abs() <= 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct EffectsChain {
    spec: Option<ProcessSpec>,
    flavors: FlavorProcessor,
    limiter: SafetyLimiter,
    input_rms: f32,
    output_rms: f32,
    auto_gain: SmoothedParam,
    output_gain: SmoothedParam,
}

impl EffectsChain {
    /// Create an unprepared engine. Blocks pass through untouched until
    /// [`prepare`](Self::prepare) succeeds.
    pub fn new() -> Self {
        Self {
            spec: None,
            flavors: FlavorProcessor::new(),
            limiter: SafetyLimiter::new(48000.0),
            input_rms: 0.0,
            output_rms: 0.0,
            auto_gain: SmoothedParam::with_config(1.0, 48000.0, GAIN_SMOOTHING_MS),
            output_gain: SmoothedParam::with_config(1.0, 48000.0, GAIN_SMOOTHING_MS),
        }
    }

    /// Validate `spec` and allocate all processing state for it.
    ///
    /// An invalid spec is rejected and the engine keeps its previous state.
    pub fn prepare(&mut self, spec: ProcessSpec) -> Result<()> {
        spec.validate()?;
        let sample_rate = spec.sample_rate_f32();

        self.flavors.prepare(&spec);

        self.limiter = SafetyLimiter::new(sample_rate);
        self.limiter.set_threshold_db(0.0);
        self.limiter.set_release_ms(SafetyLimiter::DEFAULT_RELEASE_MS);

        self.auto_gain = SmoothedParam::with_config(1.0, sample_rate, GAIN_SMOOTHING_MS);
        self.output_gain = SmoothedParam::with_config(1.0, sample_rate, GAIN_SMOOTHING_MS);
        self.input_rms = 0.0;
        self.output_rms = 0.0;
        self.spec = Some(spec);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = spec.sample_rate,
            channels = spec.num_channels,
            max_block = spec.max_block_size,
            "effects chain prepared"
        );

        Ok(())
    }

    /// Clear all filter, delay and meter state without reallocating.
    pub fn reset(&mut self) {
        self.flavors.reset();
        self.limiter.reset();
        self.auto_gain.set_immediate(1.0);
        self.output_gain.snap_to_target();
        self.input_rms = 0.0;
        self.output_rms = 0.0;

        #[cfg(feature = "tracing")]
        tracing::debug!("effects chain reset");
    }

    /// The spec from the last successful [`prepare`](Self::prepare).
    pub fn spec(&self) -> Option<ProcessSpec> {
        self.spec
    }

    /// Switch 4× oversampling ahead of the next block, so
    /// [`latency_samples`](Self::latency_samples) can be queried before
    /// processing. Each block's [`ParamSnapshot::quality_mode`] takes over
    /// once processing runs.
    pub fn set_quality_mode(&mut self, enabled: bool) {
        self.flavors.set_quality_mode(enabled);
    }

    /// Processing latency in samples for the current quality mode.
    pub fn latency_samples(&self) -> f32 {
        self.flavors.latency_samples()
    }

    /// Current auto-gain correction (linear).
    pub fn auto_gain(&self) -> f32 {
        self.auto_gain.get()
    }

    /// Current limiter gain reduction in dB (≤ 0).
    pub fn limiter_reduction_db(&self) -> f32 {
        self.limiter.gain_reduction_db()
    }

    /// Process one planar block in place.
    ///
    /// Unprepared engines and bypassed blocks leave the audio untouched (the
    /// limiter is skipped too). Channels beyond the prepared count are never
    /// read or written.
    pub fn process(&mut self, block: &mut [&mut [f32]], params: &ParamSnapshot) {
        let Some(spec) = self.spec else {
            return;
        };
        let params = params.sanitized();
        if params.bypass {
            return;
        }

        let channels = block.len().min(spec.num_channels);
        let block = &mut block[..channels];
        let len = block.first().map_or(0, |channel| channel.len());
        if len == 0 {
            return;
        }

        self.input_rms += RMS_ALPHA * (block_rms(block, len) - self.input_rms);
        self.flavors.process(block, &params);
        self.output_rms += RMS_ALPHA * (block_rms(block, len) - self.output_rms);

        if self.input_rms > RMS_FLOOR && self.output_rms > RMS_FLOOR {
            let correction = self.input_rms / self.output_rms;
            self.auto_gain
                .set_target(correction.clamp(AUTO_GAIN_MIN, AUTO_GAIN_MAX));
        }
        self.output_gain.set_target(db_to_linear(params.output_gain_db));

        for i in 0..len {
            let gain = self.auto_gain.advance() * self.output_gain.advance();
            for channel in block.iter_mut() {
                if let Some(sample) = channel.get_mut(i) {
                    *sample *= gain;
                }
            }
        }

        self.limiter.process_block(block, len);
    }
}

impl Default for EffectsChain {
    fn default() -> Self {
        Self::new()
    }
}

/// RMS over every channel of the first `len` samples. The `+ 1` in the
/// denominator keeps an empty block finite.
fn block_rms(block: &[&mut [f32]], len: usize) -> f32 {
    let sum_sq: f32 = block
        .iter()
        .map(|channel| channel.iter().take(len).map(|s| s * s).sum::<f32>())
        .sum();
    sqrtf(sum_sq / (block.len() * len + 1) as f32)
}
