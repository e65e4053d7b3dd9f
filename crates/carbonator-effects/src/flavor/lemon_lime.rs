//! Lemon-Lime: high-band exciter.
//!
//! An LR4 crossover splits each channel. The low band passes untouched while
//! the high band is saturated, compressed with a Fizz-controlled attack and
//! lifted by a 5 kHz presence bell and a 10 kHz air shelf before the two bands
//! are summed again. The crossover slides from 4 kHz down to 1.5 kHz, widening
//! the treated band.
//!
//! In quality mode the low band is held back by the oversampler latency so it
//! rejoins the high band in time.
//!
//! Flat follows with a resonant 300 Hz - 3.5 kHz telephone band.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use carbonator_core::{
    Biquad, Effect, InterpolatedDelay, LinkwitzRiley, fizz_curves, high_shelf_coefficients,
    highpass_coefficients, lowpass_coefficients, peaking_eq_coefficients,
};

use super::{FlavorChain, block_len, clear_biquads, per_channel, run_biquads};
use crate::compressor::Compressor;
use crate::params::ProcessSpec;
use crate::saturation::{CurveType, SaturationEngine, SaturationParams, latency_delay_line};

const PRESENCE_HZ: f32 = 5000.0;
const PRESENCE_Q: f32 = 1.5;
const AIR_HZ: f32 = 10000.0;
const AIR_Q: f32 = 0.707;

const COMP_RATIO: f32 = 4.0;
const COMP_THRESHOLD_DB: f32 = -20.0;
const COMP_RELEASE_MS: f32 = 50.0;

const TELEPHONE_LOW_HZ: f32 = 300.0;
const TELEPHONE_HIGH_HZ: f32 = 3500.0;

/// Lemon-Lime settings for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LemonLimeParams {
    /// Crossover frequency, 4 kHz → 1.5 kHz.
    pub crossover_hz: f32,
    /// High-band tanh drive, 1.3 → 3.5.
    pub drive: f32,
    /// High-band compressor attack, 10 → 0.5 ms.
    pub attack_ms: f32,
    /// 5 kHz bell, +0.5 → +6 dB.
    pub presence_db: f32,
    /// 10 kHz shelf, +0.5 → +5 dB.
    pub air_db: f32,
    /// Flat: telephone band resonance (Q), 0.707 → 3.
    pub resonance: f32,
}

impl LemonLimeParams {
    /// Derive the block settings from Fizz in `[0, 1]`.
    pub fn from_fizz(fizz: f32) -> Self {
        Self {
            crossover_hz: fizz_curves::logarithmic(fizz, 4000.0, 1500.0, 2.0),
            drive: fizz_curves::exponential(fizz, 1.3, 3.5, 2.5),
            attack_ms: fizz_curves::exponential(fizz, 10.0, 0.5, 2.0),
            presence_db: fizz_curves::logarithmic(fizz, 0.5, 6.0, 1.8),
            air_db: fizz_curves::logarithmic(fizz, 0.5, 5.0, 1.8),
            resonance: fizz_curves::exponential(fizz, 0.707, 3.0, 2.0),
        }
    }

    /// High-band tanh normalized by the drive.
    pub fn saturation(&self) -> SaturationParams {
        SaturationParams::new(CurveType::Tanh, self.drive)
            .with_output_gain(1.0 / self.drive.max(1e-6))
    }
}

/// Lemon-Lime signal chain.
#[derive(Debug, Clone)]
pub struct LemonLimeChain {
    sample_rate: f32,
    max_block_size: usize,
    crossovers: Vec<LinkwitzRiley>,
    /// Low band of the current chunk, one buffer per channel.
    low_band: Vec<Vec<f32>>,
    /// Low-band alignment delay, read only while the saturation oversamples.
    low_delays: Vec<InterpolatedDelay>,
    compressor: Compressor,
    presence: Vec<Biquad>,
    air: Vec<Biquad>,
    telephone_low_cut: Vec<Biquad>,
    telephone_high_cut: Vec<Biquad>,
}

impl LemonLimeChain {
    /// Create an unprepared chain.
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            max_block_size: 1,
            crossovers: Vec::new(),
            low_band: Vec::new(),
            low_delays: Vec::new(),
            compressor: Compressor::new(48000.0),
            presence: Vec::new(),
            air: Vec::new(),
            telephone_low_cut: Vec::new(),
            telephone_high_cut: Vec::new(),
        }
    }

    /// The high-band compressor, for metering.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Treat `start..end` of every prepared channel.
    fn process_chunk(
        &mut self,
        block: &mut [&mut [f32]],
        start: usize,
        end: usize,
        saturation: &mut SaturationEngine,
        params: &LemonLimeParams,
    ) {
        let channels = block.len().min(self.crossovers.len());
        let block = &mut block[..channels];
        let delay = saturation.latency_samples();

        for (((crossover, low), line), channel) in self
            .crossovers
            .iter_mut()
            .zip(self.low_band.iter_mut())
            .zip(self.low_delays.iter_mut())
            .zip(block.iter_mut())
        {
            for (low, sample) in low.iter_mut().zip(channel[start..end].iter_mut()) {
                let (lo, hi) = crossover.process(*sample);
                line.write(lo);
                *low = if delay > 0.0 { line.read(delay) } else { lo };
                *sample = hi;
            }
        }

        let shaper = params.saturation();
        for (ch, channel) in block.iter_mut().enumerate() {
            saturation.process_channel(ch, &mut channel[start..end], &shaper);
        }

        self.compressor.process_linked(block, start..end);

        for ((presence, air), channel) in self
            .presence
            .iter_mut()
            .zip(self.air.iter_mut())
            .zip(block.iter_mut())
        {
            presence.process_block_inplace(&mut channel[start..end]);
            air.process_block_inplace(&mut channel[start..end]);
        }

        for (low, channel) in self.low_band.iter().zip(block.iter_mut()) {
            for (sample, lo) in channel[start..end].iter_mut().zip(low.iter()) {
                *sample += lo;
            }
        }
    }
}

impl Default for LemonLimeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FlavorChain for LemonLimeChain {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.sample_rate = sample_rate;
        let max_block_size = spec.max_block_size.max(1);
        self.max_block_size = max_block_size;
        self.crossovers =
            per_channel(spec.num_channels, || LinkwitzRiley::new(sample_rate, 4000.0));
        self.low_band = per_channel(spec.num_channels, || vec![0.0; max_block_size]);
        self.low_delays = per_channel(spec.num_channels, latency_delay_line);

        self.compressor = Compressor::new(sample_rate);
        self.compressor.set_ratio(COMP_RATIO);
        self.compressor.set_threshold_db(COMP_THRESHOLD_DB);
        self.compressor.set_release_ms(COMP_RELEASE_MS);

        self.presence = per_channel(spec.num_channels, Biquad::new);
        self.air = per_channel(spec.num_channels, Biquad::new);
        self.telephone_low_cut = per_channel(spec.num_channels, Biquad::new);
        self.telephone_high_cut = per_channel(spec.num_channels, Biquad::new);
    }

    fn process(&mut self, block: &mut [&mut [f32]], fizz: f32, saturation: &mut SaturationEngine) {
        let params = LemonLimeParams::from_fizz(fizz);
        let sr = self.sample_rate;

        for crossover in &mut self.crossovers {
            crossover.set_frequency(params.crossover_hz);
        }
        self.compressor.set_attack_ms(params.attack_ms);

        let presence = peaking_eq_coefficients(PRESENCE_HZ, PRESENCE_Q, params.presence_db, sr);
        let air = high_shelf_coefficients(AIR_HZ, AIR_Q, params.air_db, sr);
        for filter in &mut self.presence {
            filter.apply(presence);
        }
        for filter in &mut self.air {
            filter.apply(air);
        }

        let len = block_len(block);
        let mut start = 0;
        while start < len {
            let end = (start + self.max_block_size).min(len);
            self.process_chunk(block, start, end, saturation, &params);
            start = end;
        }
    }

    fn process_flat(
        &mut self,
        block: &mut [&mut [f32]],
        fizz: f32,
        saturation: &mut SaturationEngine,
    ) {
        self.process(block, fizz, saturation);

        let q = LemonLimeParams::from_fizz(fizz).resonance;
        let sr = self.sample_rate;
        run_biquads(
            &mut self.telephone_low_cut,
            highpass_coefficients(TELEPHONE_LOW_HZ, q, sr),
            block,
        );
        run_biquads(
            &mut self.telephone_high_cut,
            lowpass_coefficients(TELEPHONE_HIGH_HZ, q, sr),
            block,
        );
    }

    fn reset(&mut self) {
        for crossover in &mut self.crossovers {
            crossover.reset();
        }
        for low in &mut self.low_band {
            low.fill(0.0);
        }
        for line in &mut self.low_delays {
            line.clear();
        }
        self.compressor.reset();
        clear_biquads(&mut self.presence);
        clear_biquads(&mut self.air);
        clear_biquads(&mut self.telephone_low_cut);
        clear_biquads(&mut self.telephone_high_cut);
    }
}
