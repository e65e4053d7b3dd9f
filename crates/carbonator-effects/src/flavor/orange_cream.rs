//! Orange Cream: wide, warm stereo.
//!
//! Warm clip, then a mid/side section: the mid is compressed, the side is
//! boosted for width, and after decoding the left channel is detuned up and
//! the right down by a few cents. A gentle 10 kHz shelf closes the chain.
//! Mono blocks skip the stereo section.
//!
//! Flat is a separate, simpler chain: warm clip, a tanh enhancer on the mid,
//! side boost and the shelf.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::f32::consts::{PI, TAU};

use carbonator_core::{
    Biquad, Effect, InterpolatedDelay, db_to_linear, fizz_curves, high_shelf_coefficients,
    mid_side_decode, mid_side_encode, ms_to_samples,
};
use libm::{cosf, fmodf, powf, tanhf};

use super::{FlavorChain, clear_biquads, per_channel, run_biquads};
use crate::compressor::Compressor;
use crate::params::ProcessSpec;
use crate::saturation::{CurveType, SaturationEngine, SaturationParams};

const MID_THRESHOLD_DB: f32 = -18.0;
const MID_ATTACK_MS: f32 = 15.0;
const MID_RELEASE_MS: f32 = 100.0;

const SHELF_HZ: f32 = 10000.0;
const SHELF_Q: f32 = 0.707;

const DETUNE_WINDOW_MS: f32 = 30.0;
const DETUNE_MIN_DELAY_MS: f32 = 1.0;
const DETUNE_BUFFER_SECONDS: f32 = 0.035;
const DETUNE_MIX: f32 = 0.5;

/// Flat-mode mid enhancer drive.
const ENHANCER_DRIVE: f32 = 2.0;

/// Orange Cream settings for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrangeCreamParams {
    /// Warm clip drive, 1.2 → 2.5.
    pub drive: f32,
    /// Side boost, 0 → +5 dB (S-curve).
    pub side_gain_db: f32,
    /// Detune amount, 3 → 10 cents (S-curve).
    pub detune_cents: f32,
    /// Mid compressor ratio, 1.5 → 4.
    pub mid_ratio: f32,
    /// 10 kHz shelf, 0 → -3 dB.
    pub shelf_db: f32,
}

impl OrangeCreamParams {
    /// Derive the block settings from Fizz in `[0, 1]`.
    pub fn from_fizz(fizz: f32) -> Self {
        Self {
            drive: fizz_curves::exponential(fizz, 1.2, 2.5, 2.0),
            side_gain_db: fizz_curves::s_curve(fizz, 0.0, 5.0),
            detune_cents: fizz_curves::s_curve(fizz, 3.0, 10.0),
            mid_ratio: fizz_curves::exponential(fizz, 1.5, 4.0, 2.0),
            shelf_db: fizz_curves::logarithmic(fizz, 0.0, -3.0, 1.8),
        }
    }

    /// Warm clip at unity output.
    pub fn saturation(&self) -> SaturationParams {
        SaturationParams::new(CurveType::WarmClip, self.drive)
    }

    /// Pitch ratios for the left (raised) and right (lowered) channels.
    pub fn detune_ratios(&self) -> (f32, f32) {
        let octaves = self.detune_cents / 1200.0;
        (powf(2.0, octaves), powf(2.0, -octaves))
    }
}

/// Two-tap doppler pitch shifter.
///
/// Two read taps sweep a window of the delay line at `|ratio - 1|` samples
/// per sample, half a cycle apart. Each tap is faded out by a Hann window
/// where its delay jumps back, so the sum stays continuous.
#[derive(Debug, Clone)]
struct Detuner {
    line: InterpolatedDelay,
    /// Sweep phase in radians, `[0, 2π)`.
    phase: f32,
    window: f32,
    min_delay: f32,
}

impl Detuner {
    fn new(sample_rate: f32) -> Self {
        Self {
            line: InterpolatedDelay::from_time(sample_rate, DETUNE_BUFFER_SECONDS),
            phase: 0.0,
            window: ms_to_samples(DETUNE_WINDOW_MS, sample_rate),
            min_delay: ms_to_samples(DETUNE_MIN_DELAY_MS, sample_rate),
        }
    }

    #[inline]
    fn delay_at(&self, phase: f32, raise: bool) -> f32 {
        let position = phase / TAU;
        if raise {
            self.min_delay + self.window * (1.0 - position)
        } else {
            self.min_delay + self.window * position
        }
    }

    #[inline]
    fn process(&mut self, input: f32, ratio: f32) -> f32 {
        self.line.write(input);

        let raise = ratio > 1.0;
        let other = fmodf(self.phase + PI, TAU);
        let a = self.line.read(self.delay_at(self.phase, raise));
        let b = self.line.read(self.delay_at(other, raise));
        let fade = cosf(self.phase);
        let output = a * (0.5 - 0.5 * fade) + b * (0.5 + 0.5 * fade);

        self.phase += (ratio - 1.0).abs() * TAU / self.window.max(1.0);
        if self.phase >= TAU {
            self.phase = fmodf(self.phase, TAU);
        }
        output
    }

    fn reset(&mut self) {
        self.line.clear();
        self.phase = 0.0;
    }
}

/// Orange Cream signal chain.
#[derive(Debug, Clone)]
pub struct OrangeCreamChain {
    sample_rate: f32,
    mid_compressor: Compressor,
    detuners: Vec<Detuner>,
    shelf: Vec<Biquad>,
}

impl OrangeCreamChain {
    /// Create an unprepared chain.
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            mid_compressor: Compressor::new(48000.0),
            detuners: Vec::new(),
            shelf: Vec::new(),
        }
    }

    /// The mid compressor, for metering.
    pub fn mid_compressor(&self) -> &Compressor {
        &self.mid_compressor
    }

    fn warm_shelf(&mut self, block: &mut [&mut [f32]], shelf_db: f32) {
        run_biquads(
            &mut self.shelf,
            high_shelf_coefficients(SHELF_HZ, SHELF_Q, shelf_db, self.sample_rate),
            block,
        );
    }
}

impl Default for OrangeCreamChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Split off the first two channels of a block with two or more channels.
fn stereo_pair<'a>(block: &'a mut [&mut [f32]]) -> Option<(&'a mut [f32], &'a mut [f32])> {
    match block {
        [left, right, ..] => Some((&mut **left, &mut **right)),
        _ => None,
    }
}

/// Encode to mid/side in place, run `mid_side` per sample, decode back.
fn with_mid_side(
    left: &mut [f32],
    right: &mut [f32],
    mut mid_side: impl FnMut(f32, f32) -> (f32, f32),
) {
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let (mid, side) = mid_side_encode(*l, *r);
        let (mid, side) = mid_side(mid, side);
        (*l, *r) = mid_side_decode(mid, side);
    }
}

impl FlavorChain for OrangeCreamChain {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.sample_rate = sample_rate;

        self.mid_compressor = Compressor::new(sample_rate);
        self.mid_compressor.set_threshold_db(MID_THRESHOLD_DB);
        self.mid_compressor.set_attack_ms(MID_ATTACK_MS);
        self.mid_compressor.set_release_ms(MID_RELEASE_MS);

        // Only the stereo pair is detuned
        self.detuners = per_channel(spec.num_channels.min(2), || Detuner::new(sample_rate));
        self.shelf = per_channel(spec.num_channels, Biquad::new);
    }

    fn process(&mut self, block: &mut [&mut [f32]], fizz: f32, saturation: &mut SaturationEngine) {
        let params = OrangeCreamParams::from_fizz(fizz);

        saturation.process(block, &params.saturation());

        if let (Some((left, right)), [up, down]) =
            (stereo_pair(block), self.detuners.as_mut_slice())
        {
            let side_gain = db_to_linear(params.side_gain_db);
            let compressor = &mut self.mid_compressor;
            compressor.set_ratio(params.mid_ratio);
            with_mid_side(left, right, |mid, side| (compressor.process(mid), side * side_gain));

            let (raise, lower) = params.detune_ratios();
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                *l = *l * (1.0 - DETUNE_MIX) + up.process(*l, raise) * DETUNE_MIX;
                *r = *r * (1.0 - DETUNE_MIX) + down.process(*r, lower) * DETUNE_MIX;
            }
        }

        self.warm_shelf(block, params.shelf_db);
    }

    fn process_flat(
        &mut self,
        block: &mut [&mut [f32]],
        fizz: f32,
        saturation: &mut SaturationEngine,
    ) {
        let params = OrangeCreamParams::from_fizz(fizz);

        saturation.process(block, &params.saturation());

        if self.detuners.len() == 2 {
            if let Some((left, right)) = stereo_pair(block) {
                let side_gain = db_to_linear(params.side_gain_db);
                with_mid_side(left, right, |mid, side| {
                    (tanhf(mid * ENHANCER_DRIVE) * 0.5, side * side_gain)
                });
            }
        }

        self.warm_shelf(block, params.shelf_db);
    }

    fn reset(&mut self) {
        self.mid_compressor.reset();
        for detuner in &mut self.detuners {
            detuner.reset();
        }
        clear_biquads(&mut self.shelf);
    }
}
