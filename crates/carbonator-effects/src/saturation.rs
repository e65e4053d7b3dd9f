//! Shared saturation engine with optional 4× oversampling.
//!
//! Every flavor saturates through one [`SaturationEngine`] owned by the
//! [`FlavorProcessor`](crate::FlavorProcessor). Per block the calling flavor
//! supplies a [`SaturationParams`]; the engine
//!
//! 1. copies the input as the dry reference when `mix < 1`, delayed by the
//!    oversampler's whole-sample latency in quality mode,
//! 2. upsamples 4× when quality mode is on,
//! 3. shapes every sample: `y = (shape(x·drive + bias) - shape(bias)) · output_gain`,
//! 4. downsamples back,
//! 5. blends `dry·(1 - mix) + wet·mix`.
//!
//! Subtracting `shape(bias)` removes the static offset a bias would otherwise
//! add, so digital silence stays silent while the asymmetry (and its even
//! harmonics) remains.
//!
//! The dry delay lines are fed on every call, whatever the mix, so a later
//! mix change blends against a current reference. Without that delay a
//! partial mix in quality mode would comb-filter the audible band.
//!
//! Toggling quality mode clears the oversampler history. The switch is not
//! sample-accurate; the output jumps by the oversampler's group delay.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use carbonator_core::{InterpolatedDelay, Oversampler, wet_dry_mix};
use libm::tanhf;

use crate::params::ProcessSpec;

/// Waveshaping transfer function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveType {
    /// `x / (1 + |x|)`
    #[default]
    SoftClip,
    /// Same curve as [`SoftClip`](Self::SoftClip); callers pair it with a DC
    /// bias to make it asymmetric.
    AsymSoftClip,
    /// `tanh(x)`
    Tanh,
    /// `1.5x - 0.5x³` on `x` clamped to `[-1, 1]`.
    WarmClip,
}

impl CurveType {
    /// Apply the transfer function.
    #[inline]
    pub fn shape(self, x: f32) -> f32 {
        match self {
            CurveType::SoftClip | CurveType::AsymSoftClip => x / (1.0 + x.abs()),
            CurveType::Tanh => tanhf(x),
            CurveType::WarmClip => {
                let x = x.clamp(-1.0, 1.0);
                1.5 * x - 0.5 * x * x * x
            }
        }
    }

    /// Derivative of [`shape`](Self::shape) at `x`, the small-signal gain
    /// around that operating point.
    pub fn slope(self, x: f32) -> f32 {
        match self {
            CurveType::SoftClip | CurveType::AsymSoftClip => {
                let d = 1.0 + x.abs();
                1.0 / (d * d)
            }
            CurveType::Tanh => {
                let t = tanhf(x);
                1.0 - t * t
            }
            CurveType::WarmClip => {
                if x.abs() >= 1.0 {
                    0.0
                } else {
                    1.5 - 1.5 * x * x
                }
            }
        }
    }
}

/// Per-block saturation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationParams {
    /// Transfer function.
    pub curve: CurveType,
    /// Input multiplier before shaping.
    pub drive: f32,
    /// Offset added after drive; shifts the operating point.
    pub dc_bias: f32,
    /// Multiplier after shaping.
    pub output_gain: f32,
    /// Wet amount, `0` = dry, `1` = fully saturated.
    pub mix: f32,
}

impl SaturationParams {
    /// Fully wet, unbiased, unity output gain.
    pub fn new(curve: CurveType, drive: f32) -> Self {
        Self {
            curve,
            drive,
            dc_bias: 0.0,
            output_gain: 1.0,
            mix: 1.0,
        }
    }

    /// Replace the DC bias.
    pub fn with_bias(mut self, dc_bias: f32) -> Self {
        self.dc_bias = dc_bias;
        self
    }

    /// Replace the output gain.
    pub fn with_output_gain(mut self, output_gain: f32) -> Self {
        self.output_gain = output_gain;
        self
    }

    /// Replace the wet mix.
    pub fn with_mix(mut self, mix: f32) -> Self {
        self.mix = mix;
        self
    }

    #[inline]
    fn shape_block(&self, buffer: &mut [f32]) {
        let offset = self.curve.shape(self.dc_bias);
        for sample in buffer.iter_mut() {
            let shaped = self.curve.shape(*sample * self.drive + self.dc_bias);
            *sample = (shaped - offset) * self.output_gain;
        }
    }
}

impl Default for SaturationParams {
    fn default() -> Self {
        Self::new(CurveType::SoftClip, 1.0)
    }
}

/// Oversampling-aware waveshaper for a fixed channel count.
///
/// # Example
///
/// ```rust
/// use carbonator_effects::{CurveType, ProcessSpec, SaturationEngine, SaturationParams};
///
/// let mut engine = SaturationEngine::new();
/// engine.prepare(&ProcessSpec::new(48000.0, 256, 1));
/// engine.set_oversampling_enabled(true);
/// assert!(engine.latency_samples() > 0.0);
///
/// let mut mono = vec![0.5f32; 256];
/// engine.process(&mut [&mut mono[..]], &SaturationParams::new(CurveType::Tanh, 3.0));
/// assert!(mono.iter().all(|s| s.abs() < 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct SaturationEngine {
    oversampler: Oversampler,
    oversampling: bool,
    /// Dry copy of one chunk, `max_block_size` long.
    dry: Vec<f32>,
    /// Per-channel dry delay matching the oversampler latency.
    dry_delays: Vec<InterpolatedDelay>,
    max_block_size: usize,
    num_channels: usize,
}

impl SaturationEngine {
    /// Create an unprepared engine. Call [`prepare`](Self::prepare) first.
    pub fn new() -> Self {
        Self {
            oversampler: Oversampler::new(0, 1),
            oversampling: false,
            dry: Vec::new(),
            dry_delays: Vec::new(),
            max_block_size: 1,
            num_channels: 0,
        }
    }

    /// Allocate oversampler state and the dry buffer for `spec`.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.max_block_size = spec.max_block_size.max(1);
        self.num_channels = spec.num_channels;
        self.oversampler = Oversampler::new(spec.num_channels, self.max_block_size);
        self.dry = vec![0.0; self.max_block_size];
        self.dry_delays = (0..spec.num_channels)
            .map(|_| latency_delay_line())
            .collect();
    }

    /// Clear filter history without reallocating.
    pub fn reset(&mut self) {
        self.oversampler.reset();
        self.dry.fill(0.0);
        for line in &mut self.dry_delays {
            line.clear();
        }
    }

    /// Switch 4× oversampling on or off. A change clears the oversampler and
    /// the dry delays.
    pub fn set_oversampling_enabled(&mut self, enabled: bool) {
        if enabled == self.oversampling {
            return;
        }
        self.oversampling = enabled;
        self.oversampler.reset();
        for line in &mut self.dry_delays {
            line.clear();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(enabled, "saturation: oversampling toggled");
    }

    /// Whether 4× oversampling is active.
    pub fn is_oversampling_enabled(&self) -> bool {
        self.oversampling
    }

    /// Group delay added by the current mode, in samples (0 when off).
    pub fn latency_samples(&self) -> f32 {
        if self.oversampling {
            self.oversampler.latency_samples()
        } else {
            0.0
        }
    }

    /// Saturate every prepared channel of `block` in place.
    pub fn process(&mut self, block: &mut [&mut [f32]], params: &SaturationParams) {
        for (channel, samples) in block.iter_mut().enumerate() {
            self.process_channel(channel, samples, params);
        }
    }

    /// Saturate one channel in place. Unprepared channels are left untouched.
    pub fn process_channel(
        &mut self,
        channel: usize,
        samples: &mut [f32],
        params: &SaturationParams,
    ) {
        if channel >= self.num_channels {
            return;
        }

        let mix = if params.mix.is_finite() {
            params.mix.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let blend = mix < 1.0;
        let delay = self.latency_samples();
        let line = &mut self.dry_delays[channel];

        for chunk in samples.chunks_mut(self.max_block_size) {
            let dry = &mut self.dry[..chunk.len()];
            for (d, &x) in dry.iter_mut().zip(chunk.iter()) {
                line.write(x);
                *d = if delay > 0.0 { line.read(delay) } else { x };
            }

            if self.oversampling {
                self.oversampler
                    .process_channel(channel, chunk, |buffer| params.shape_block(buffer));
            } else {
                params.shape_block(chunk);
            }

            if blend {
                for (wet, &dry) in chunk.iter_mut().zip(dry.iter()) {
                    *wet = wet_dry_mix(dry, *wet, mix);
                }
            }
        }
    }
}

/// Delay line long enough to hold back a signal by the oversampler latency.
pub(crate) fn latency_delay_line() -> InterpolatedDelay {
    InterpolatedDelay::new(Oversampler::LATENCY_SAMPLES + 4)
}

impl Default for SaturationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(channels: usize, block: usize) -> SaturationEngine {
        let mut engine = SaturationEngine::new();
        engine.prepare(&ProcessSpec::new(48000.0, block, channels));
        engine
    }

    #[test]
    fn test_curves_at_known_points() {
        assert_eq!(CurveType::SoftClip.shape(1.0), 0.5);
        assert_eq!(CurveType::AsymSoftClip.shape(-3.0), -0.75);
        assert!((CurveType::Tanh.shape(0.5) - 0.462_117_16).abs() < 1e-6);
        assert_eq!(CurveType::WarmClip.shape(1.0), 1.0);
        assert_eq!(CurveType::WarmClip.shape(5.0), 1.0);
        assert_eq!(CurveType::WarmClip.shape(-5.0), -1.0);
    }

    #[test]
    fn test_slopes_match_finite_difference() {
        let h = 1e-3;
        for curve in [CurveType::SoftClip, CurveType::Tanh, CurveType::WarmClip] {
            for x in [0.1f32, 0.15, 0.4] {
                let numeric = (curve.shape(x + h) - curve.shape(x - h)) / (2.0 * h);
                assert!(
                    (numeric - curve.slope(x)).abs() < 1e-2,
                    "{curve:?} at {x}: {numeric} vs {}",
                    curve.slope(x)
                );
            }
        }
    }

    #[test]
    fn test_unity_drive_tanh_is_gentle() {
        let mut engine = prepared(1, 64);
        let mut mono = vec![0.01f32; 64];
        engine.process(&mut [&mut mono[..]], &SaturationParams::new(CurveType::Tanh, 1.0));
        assert!(mono.iter().all(|&s| (s - 0.01).abs() < 1e-5));
    }

    #[test]
    fn test_bias_compensation_keeps_silence() {
        for oversampling in [false, true] {
            let mut engine = prepared(2, 128);
            engine.set_oversampling_enabled(oversampling);
            let mut left = vec![0.0f32; 128];
            let mut right = vec![0.0f32; 128];
            let params = SaturationParams::new(CurveType::Tanh, 4.0).with_bias(0.15);
            engine.process(&mut [&mut left[..], &mut right[..]], &params);
            assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_bias_creates_asymmetry() {
        let mut engine = prepared(1, 2);
        let mut mono = vec![0.8f32, -0.8];
        let params = SaturationParams::new(CurveType::AsymSoftClip, 4.0).with_bias(0.1);
        engine.process(&mut [&mut mono[..]], &params);
        assert!(mono[0] > 0.0 && mono[1] < 0.0);
        assert!((mono[0] + mono[1]).abs() > 0.01, "bias should skew the halves");
    }

    #[test]
    fn test_zero_mix_is_dry() {
        let mut engine = prepared(1, 32);
        let input: Vec<f32> = (0..32).map(|i| (i as f32 * 0.3).sin() * 0.9).collect();
        let mut mono = input.clone();
        let params = SaturationParams::new(CurveType::Tanh, 4.5).with_mix(0.0);
        engine.process(&mut [&mut mono[..]], &params);
        assert_eq!(mono, input);
    }

    #[test]
    fn test_half_mix_blends() {
        let mut engine = prepared(1, 1);
        let mut mono = vec![1.0f32];
        let params = SaturationParams::new(CurveType::SoftClip, 1.0).with_mix(0.5);
        engine.process(&mut [&mut mono[..]], &params);
        assert!((mono[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_latency_follows_mode() {
        let mut engine = prepared(2, 64);
        assert_eq!(engine.latency_samples(), 0.0);
        engine.set_oversampling_enabled(true);
        assert_eq!(engine.latency_samples(), Oversampler::LATENCY);
        assert!(engine.is_oversampling_enabled());
        engine.set_oversampling_enabled(false);
        assert_eq!(engine.latency_samples(), 0.0);
    }

    #[test]
    fn test_blocks_longer_than_prepared_are_chunked() {
        let mut engine = prepared(1, 16);
        let mut mono = vec![0.5f32; 100];
        let params = SaturationParams::new(CurveType::Tanh, 2.0).with_mix(0.5);
        engine.process(&mut [&mut mono[..]], &params);
        let expected = 0.25 + 0.5 * tanhf(1.0);
        assert!(mono.iter().all(|&s| (s - expected).abs() < 1e-6));
    }

    #[test]
    fn test_unprepared_channel_untouched() {
        let mut engine = prepared(1, 8);
        let mut a = vec![0.9f32; 8];
        let mut b = vec![0.9f32; 8];
        engine.process(&mut [&mut a[..], &mut b[..]], &SaturationParams::new(CurveType::Tanh, 4.0));
        let shaped = tanhf(4.0 * 0.9);
        assert!(a.iter().all(|&s| (s - shaped).abs() < 1e-6 && s != 0.9));
        assert!(b.iter().all(|&s| s == 0.9));
    }

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * core::f32::consts::PI * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    fn tail_rms(samples: &[f32]) -> f32 {
        let tail = &samples[samples.len() / 2..];
        (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt()
    }

    #[test]
    fn test_oversampled_half_mix_keeps_level() {
        // First comb notch if the dry path ran 31 samples ahead of the wet
        let input = sine(774.2, 0.01, 19200);
        let params = SaturationParams::new(CurveType::Tanh, 1.0).with_mix(0.5);
        let mut levels = [0.0f32; 2];
        for (level, oversampling) in levels.iter_mut().zip([false, true]) {
            let mut engine = prepared(1, 256);
            engine.set_oversampling_enabled(oversampling);
            let mut mono = input.clone();
            engine.process(&mut [&mut mono[..]], &params);
            *level = tail_rms(&mono);
        }
        let ratio_db = 20.0 * (levels[1] / levels[0]).log10();
        assert!(ratio_db.abs() < 0.5, "quality mode changed the level by {ratio_db} dB");
    }

    #[test]
    fn test_oversampled_dry_path_is_aligned() {
        let mut engine = prepared(1, 64);
        engine.set_oversampling_enabled(true);
        let mut mono = vec![0.0f32; 64];
        mono[0] = 1.0;
        let dry_only = SaturationParams::new(CurveType::Tanh, 1.0).with_mix(0.0);
        engine.process(&mut [&mut mono[..]], &dry_only);
        let latency = Oversampler::LATENCY_SAMPLES;
        assert_eq!(mono[latency], 1.0);
        assert!(mono.iter().enumerate().all(|(i, &s)| i == latency || s == 0.0));
    }

    #[test]
    fn test_oversampled_output_bounded() {
        let mut engine = prepared(1, 256);
        engine.set_oversampling_enabled(true);
        let mut mono: Vec<f32> = (0..2048).map(|i| (i as f32 * 0.05).sin() * 2.0).collect();
        let params = SaturationParams::new(CurveType::Tanh, 4.0);
        engine.process(&mut [&mut mono[..]], &params);
        // FIR ringing can overshoot the tanh ceiling slightly
        assert!(mono.iter().all(|&s| s.is_finite() && s.abs() < 1.2));
    }
}
