//! Cherry: sweet vocal presence.
//!
//! Parallel tanh saturation (the wet share grows along an S-curve), a narrow
//! 3.5 kHz cut to take the edge off, a 4.5 kHz presence bell and a 12 kHz air
//! shelf.
//!
//! Flat appends a slow chorus: a 3 ms tap swept ±0.5-1 ms by a 1.5 Hz sine,
//! blended in at 30%.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use carbonator_core::{
    Biquad, InterpolatedDelay, Lfo, fizz_curves, high_shelf_coefficients, ms_to_samples,
    peaking_eq_coefficients, wet_dry_mix,
};

use super::{FlavorChain, clear_biquads, per_channel, run_biquads};
use crate::params::ProcessSpec;
use crate::saturation::{CurveType, SaturationEngine, SaturationParams};

const DE_HARSH_HZ: f32 = 3500.0;
const DE_HARSH_Q: f32 = 2.0;
const PRESENCE_HZ: f32 = 4500.0;
const PRESENCE_Q: f32 = 1.5;
const AIR_HZ: f32 = 12000.0;
const AIR_Q: f32 = 0.707;

const CHORUS_RATE_HZ: f32 = 1.5;
const CHORUS_BASE_MS: f32 = 3.0;
const CHORUS_MIX: f32 = 0.3;
const CHORUS_BUFFER_SECONDS: f32 = 0.05;

/// Cherry settings for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CherryParams {
    /// Saturation wet share, 0.10 → 0.65 (S-curve).
    pub blend: f32,
    /// Tanh drive, 1.5 → 4.5.
    pub drive: f32,
    /// 3.5 kHz cut, 0 → -4 dB.
    pub de_harsh_db: f32,
    /// 4.5 kHz bell, 0 → +6 dB.
    pub presence_db: f32,
    /// 12 kHz shelf, 0 → +4 dB.
    pub air_db: f32,
    /// Flat-mode chorus sweep depth, 0.5 → 1 ms (S-curve).
    pub chorus_depth_ms: f32,
}

impl CherryParams {
    /// Derive the block settings from Fizz in `[0, 1]`.
    pub fn from_fizz(fizz: f32) -> Self {
        Self {
            blend: fizz_curves::s_curve(fizz, 0.10, 0.65),
            drive: fizz_curves::exponential(fizz, 1.5, 4.5, 2.5),
            de_harsh_db: fizz_curves::logarithmic(fizz, 0.0, -4.0, 1.8),
            presence_db: fizz_curves::logarithmic(fizz, 0.0, 6.0, 1.8),
            air_db: fizz_curves::logarithmic(fizz, 0.0, 4.0, 1.8),
            chorus_depth_ms: fizz_curves::s_curve(fizz, 0.5, 1.0),
        }
    }

    /// Parallel tanh, wet path normalized by the drive.
    pub fn saturation(&self) -> SaturationParams {
        SaturationParams::new(CurveType::Tanh, self.drive)
            .with_output_gain(1.0 / self.drive.max(1e-6))
            .with_mix(self.blend)
    }
}

/// Cherry signal chain.
#[derive(Debug, Clone)]
pub struct CherryChain {
    sample_rate: f32,
    de_harsh: Vec<Biquad>,
    presence: Vec<Biquad>,
    air: Vec<Biquad>,
    chorus: Vec<InterpolatedDelay>,
    chorus_lfo: Lfo,
}

impl CherryChain {
    /// Create an unprepared chain.
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            de_harsh: Vec::new(),
            presence: Vec::new(),
            air: Vec::new(),
            chorus: Vec::new(),
            chorus_lfo: Lfo::new(48000.0, CHORUS_RATE_HZ),
        }
    }

    fn chorus(&mut self, block: &mut [&mut [f32]], depth_ms: f32) {
        let lfo = &self.chorus_lfo;
        let sample_rate = self.sample_rate;
        for (line, channel) in self.chorus.iter_mut().zip(block.iter_mut()) {
            for (i, sample) in channel.iter_mut().enumerate() {
                let delay_ms = CHORUS_BASE_MS + depth_ms * lfo.value_at(i);
                let wet = line.read_write(*sample, ms_to_samples(delay_ms, sample_rate));
                *sample = wet_dry_mix(*sample, wet, CHORUS_MIX);
            }
        }
        self.chorus_lfo.advance(super::block_len(block));
    }
}

impl Default for CherryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FlavorChain for CherryChain {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.sample_rate = sample_rate;
        self.de_harsh = per_channel(spec.num_channels, Biquad::new);
        self.presence = per_channel(spec.num_channels, Biquad::new);
        self.air = per_channel(spec.num_channels, Biquad::new);
        self.chorus = per_channel(spec.num_channels, || {
            InterpolatedDelay::from_time(sample_rate, CHORUS_BUFFER_SECONDS)
        });
        self.chorus_lfo = Lfo::new(sample_rate, CHORUS_RATE_HZ);
    }

    fn process(&mut self, block: &mut [&mut [f32]], fizz: f32, saturation: &mut SaturationEngine) {
        let params = CherryParams::from_fizz(fizz);
        let sr = self.sample_rate;

        saturation.process(block, &params.saturation());

        run_biquads(
            &mut self.de_harsh,
            peaking_eq_coefficients(DE_HARSH_HZ, DE_HARSH_Q, params.de_harsh_db, sr),
            block,
        );
        run_biquads(
            &mut self.presence,
            peaking_eq_coefficients(PRESENCE_HZ, PRESENCE_Q, params.presence_db, sr),
            block,
        );
        run_biquads(
            &mut self.air,
            high_shelf_coefficients(AIR_HZ, AIR_Q, params.air_db, sr),
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
        self.chorus(block, CherryParams::from_fizz(fizz).chorus_depth_ms);
    }

    fn reset(&mut self) {
        clear_biquads(&mut self.de_harsh);
        clear_biquads(&mut self.presence);
        clear_biquads(&mut self.air);
        for line in &mut self.chorus {
            line.clear();
        }
        self.chorus_lfo.reset();
    }
}
