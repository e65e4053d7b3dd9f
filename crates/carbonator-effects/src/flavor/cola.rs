//! Cola: analog console warmth.
//!
//! Asymmetric soft clip (biased so it generates even harmonics), a 5 Hz DC
//! blocker for the offset the bias leaves behind, a program compressor, and a
//! tilt EQ that lifts the lows and darkens the highs as Fizz rises. The clip
//! stage is normalized by its small-signal slope so Fizz 0 sits at unity.
//!
//! Flat adds an inline tape tanh layer after the chain.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use carbonator_core::{
    Biquad, DcBlocker, Effect, fizz_curves, high_shelf_coefficients, low_shelf_coefficients,
};
use libm::tanhf;

use super::{
    FlavorChain, block_len, clear_biquads, per_channel, reset_effects, run_biquads, run_effects,
};
use crate::compressor::Compressor;
use crate::params::ProcessSpec;
use crate::saturation::{CurveType, SaturationEngine, SaturationParams};

const CLIP_BIAS: f32 = 0.1;
const LOW_SHELF_HZ: f32 = 200.0;
const HIGH_SHELF_HZ: f32 = 8000.0;
const SHELF_Q: f32 = 0.707;
const COMP_ATTACK_MS: f32 = 10.0;
const COMP_RELEASE_MS: f32 = 100.0;

/// Cola settings for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColaParams {
    /// Clip drive, 1 → 4.
    pub drive: f32,
    /// Compressor ratio, 1.5 → 6.
    pub ratio: f32,
    /// Compressor threshold, -6 → -30 dB.
    pub threshold_db: f32,
    /// 200 Hz shelf, 0 → +3.5 dB.
    pub low_shelf_db: f32,
    /// 8 kHz shelf, 0 → -3 dB.
    pub high_shelf_db: f32,
    /// Flat-mode tape drive, 1 → 3.
    pub tape_drive: f32,
}

impl ColaParams {
    /// Derive the block settings from Fizz in `[0, 1]`.
    pub fn from_fizz(fizz: f32) -> Self {
        Self {
            drive: fizz_curves::exponential(fizz, 1.0, 4.0, 2.5),
            ratio: fizz_curves::exponential(fizz, 1.5, 6.0, 2.0),
            threshold_db: fizz_curves::linear(fizz, -6.0, -30.0),
            low_shelf_db: fizz_curves::logarithmic(fizz, 0.0, 3.5, 1.8),
            high_shelf_db: fizz_curves::logarithmic(fizz, 0.0, -3.0, 1.8),
            tape_drive: fizz_curves::exponential(fizz, 1.0, 3.0, 2.0),
        }
    }

    /// Saturation settings: biased soft clip, output scaled by the inverse
    /// slope at the bias point.
    pub fn saturation(&self) -> SaturationParams {
        let curve = CurveType::AsymSoftClip;
        let slope = curve.slope(CLIP_BIAS).max(1e-6);
        SaturationParams::new(curve, self.drive)
            .with_bias(CLIP_BIAS)
            .with_output_gain(1.0 / slope)
    }
}

/// Cola signal chain.
#[derive(Debug, Clone)]
pub struct ColaChain {
    sample_rate: f32,
    dc_blockers: Vec<DcBlocker>,
    compressor: Compressor,
    low_shelf: Vec<Biquad>,
    high_shelf: Vec<Biquad>,
}

impl ColaChain {
    /// Create an unprepared chain.
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            dc_blockers: Vec::new(),
            compressor: Compressor::new(48000.0),
            low_shelf: Vec::new(),
            high_shelf: Vec::new(),
        }
    }

    /// The program compressor, for metering.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }
}

impl Default for ColaChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FlavorChain for ColaChain {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.sample_rate = sample_rate;
        self.dc_blockers = per_channel(spec.num_channels, || DcBlocker::new(sample_rate));
        self.low_shelf = per_channel(spec.num_channels, Biquad::new);
        self.high_shelf = per_channel(spec.num_channels, Biquad::new);

        self.compressor = Compressor::new(sample_rate);
        self.compressor.set_attack_ms(COMP_ATTACK_MS);
        self.compressor.set_release_ms(COMP_RELEASE_MS);
    }

    fn process(&mut self, block: &mut [&mut [f32]], fizz: f32, saturation: &mut SaturationEngine) {
        let params = ColaParams::from_fizz(fizz);
        let len = block_len(block);

        saturation.process(block, &params.saturation());
        run_effects(&mut self.dc_blockers, block);

        self.compressor.set_ratio(params.ratio);
        self.compressor.set_threshold_db(params.threshold_db);
        self.compressor.process_linked(block, 0..len);

        run_biquads(
            &mut self.low_shelf,
            low_shelf_coefficients(LOW_SHELF_HZ, SHELF_Q, params.low_shelf_db, self.sample_rate),
            block,
        );
        run_biquads(
            &mut self.high_shelf,
            high_shelf_coefficients(HIGH_SHELF_HZ, SHELF_Q, params.high_shelf_db, self.sample_rate),
            block,
        );
    }

    fn process_flat(
        &mut self,
        block: &mut [&mut [f32]],
        fizz: f32,
        saturation: &mut SaturationEngine,
    ) {
        self.process(block, fizz, saturation);

        // Runs at the base rate; the signal is already band-limited by the
        // clip stage above.
        let drive = ColaParams::from_fizz(fizz).tape_drive;
        for channel in block.iter_mut() {
            for sample in channel.iter_mut() {
                *sample = tanhf(*sample * drive) / drive;
            }
        }
    }

    fn reset(&mut self) {
        reset_effects(&mut self.dc_blockers);
        self.compressor.reset();
        clear_biquads(&mut self.low_shelf);
        clear_biquads(&mut self.high_shelf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonator_core::linear_to_db;
    use core::f32::consts::PI;
    use libm::sinf;

    fn prepared() -> (ColaChain, SaturationEngine) {
        let spec = ProcessSpec::new(48000.0, 256, 2);
        let mut chain = ColaChain::new();
        chain.prepare(&spec);
        let mut saturation = SaturationEngine::new();
        saturation.prepare(&spec);
        (chain, saturation)
    }

    fn sine(amplitude: f32, start: usize, len: usize) -> Vec<f32> {
        (start..start + len)
            .map(|i| amplitude * sinf(2.0 * PI * 1000.0 * i as f32 / 48000.0))
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_curve_endpoints() {
        let low = ColaParams::from_fizz(0.0);
        assert_eq!(low.drive, 1.0);
        assert_eq!(low.ratio, 1.5);
        assert_eq!(low.threshold_db, -6.0);
        assert_eq!(low.low_shelf_db, 0.0);
        assert_eq!(low.high_shelf_db, 0.0);

        let high = ColaParams::from_fizz(1.0);
        assert_eq!(high.drive, 4.0);
        assert_eq!(high.ratio, 6.0);
        assert_eq!(high.threshold_db, -30.0);
        assert_eq!(high.low_shelf_db, 3.5);
        assert_eq!(high.high_shelf_db, -3.0);
    }

    #[test]
    fn test_normalized_clip_is_unity_for_small_signals() {
        let params = ColaParams::from_fizz(0.0).saturation();
        let x = 1e-3;
        let y = (params.curve.shape(x * params.drive + params.dc_bias)
            - params.curve.shape(params.dc_bias))
            * params.output_gain;
        assert!((y / x - 1.0).abs() < 0.01, "small-signal gain {}", y / x);
    }

    #[test]
    fn test_fizz_zero_stays_near_unity() {
        let (mut chain, mut saturation) = prepared();
        let mut in_sq = 0.0;
        let mut out_sq = 0.0;
        for block_index in 0..100 {
            let input = sine(0.1, block_index * 256, 256);
            let mut left = input.clone();
            let mut right = input.clone();
            chain.process(&mut [&mut left[..], &mut right[..]], 0.0, &mut saturation);
            if block_index >= 20 {
                in_sq += rms(&input).powi(2);
                out_sq += rms(&left).powi(2);
            }
        }
        let diff_db = linear_to_db(out_sq.sqrt()) - linear_to_db(in_sq.sqrt());
        assert!(diff_db.abs() < 1.0, "Cola at Fizz 0 moved the level by {diff_db} dB");
    }

    #[test]
    fn test_full_fizz_compresses_hard() {
        let (mut chain, mut saturation) = prepared();
        for block_index in 0..40 {
            let mut left = sine(0.316, block_index * 256, 256);
            let mut right = left.clone();
            chain.process(&mut [&mut left[..], &mut right[..]], 1.0, &mut saturation);
        }
        let reduction = chain.compressor().gain_reduction_db();
        assert!(reduction <= -6.0, "expected >= 6 dB reduction, got {reduction}");
    }

    #[test]
    fn test_flat_adds_tape_layer() {
        let (mut carbonated, mut sat_a) = prepared();
        let (mut flat, mut sat_b) = prepared();
        let mut a = sine(0.5, 0, 256);
        let mut a2 = a.clone();
        let mut b = a.clone();
        let mut b2 = a.clone();
        carbonated.process(&mut [&mut a[..], &mut a2[..]], 0.8, &mut sat_a);
        flat.process_flat(&mut [&mut b[..], &mut b2[..]], 0.8, &mut sat_b);
        for (x, y) in a.iter().zip(b.iter()) {
            let drive = ColaParams::from_fizz(0.8).tape_drive;
            assert!((tanhf(x * drive) / drive - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reset_then_silence() {
        let (mut chain, mut saturation) = prepared();
        let mut left = sine(0.9, 0, 256);
        let mut right = left.clone();
        chain.process(&mut [&mut left[..], &mut right[..]], 1.0, &mut saturation);

        chain.reset();
        saturation.reset();
        let mut left = vec![0.0f32; 256];
        let mut right = vec![0.0f32; 256];
        chain.process_flat(&mut [&mut left[..], &mut right[..]], 1.0, &mut saturation);
        assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
    }
}
