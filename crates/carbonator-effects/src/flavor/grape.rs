//! Grape: tape machine.
//!
//! Biased tanh saturation, a DC blocker for the bias offset, wow (0.4 Hz sine)
//! and flutter (4.5 Hz triangle) on a 5 ms modulated delay, then a tape-head
//! low-pass that closes from 16 kHz to 4 kHz as Fizz rises.
//!
//! Flat runs the same chain and then adds record-player artifacts: sparse
//! crackle, 40 Hz rumble and a mono fold-down. The artifacts are gated by a
//! program envelope, so a silent input stays silent.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use carbonator_core::{
    DcBlocker, Effect, EnvelopeFollower, InterpolatedDelay, Lfo, LfoWaveform, NoiseSource,
    StateVariableFilter, SvfOutput, fizz_curves, ms_to_samples,
};

use super::{FlavorChain, block_len, per_channel, reset_effects, run_effects};
use crate::params::ProcessSpec;
use crate::saturation::{CurveType, SaturationEngine, SaturationParams};

const TAPE_BIAS: f32 = 0.15;
const WOW_RATE_HZ: f32 = 0.4;
const FLUTTER_RATE_HZ: f32 = 4.5;
const BASE_DELAY_MS: f32 = 5.0;
const DELAY_BUFFER_SECONDS: f32 = 0.2;

const RUMBLE_CUTOFF_HZ: f32 = 40.0;
const GATE_ATTACK_MS: f32 = 1.0;
const GATE_RELEASE_MS: f32 = 200.0;
/// Envelope level (-40 dBFS) at which the artifacts reach full strength.
const GATE_FULL_LEVEL: f32 = 0.01;

/// Grape settings for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrapeParams {
    /// Tanh drive, 1.2 → 4.
    pub drive: f32,
    /// Wow depth, 0 → 3 ms.
    pub wow_depth_ms: f32,
    /// Flutter depth, 0 → 0.5 ms.
    pub flutter_depth_ms: f32,
    /// Tape-head low-pass, 16 kHz → 4 kHz.
    pub head_cutoff_hz: f32,
    /// Flat: per-sample crackle probability, 0.001 → 0.01.
    pub crackle_probability: f32,
    /// Flat: crackle amplitude, 0.01 → 0.05.
    pub crackle_level: f32,
    /// Flat: rumble amplitude, 0 → 0.015.
    pub rumble_level: f32,
}

impl GrapeParams {
    /// Derive the block settings from Fizz in `[0, 1]`.
    pub fn from_fizz(fizz: f32) -> Self {
        Self {
            drive: fizz_curves::exponential(fizz, 1.2, 4.0, 2.5),
            wow_depth_ms: fizz_curves::exponential(fizz, 0.0, 3.0, 2.0),
            flutter_depth_ms: fizz_curves::exponential(fizz, 0.0, 0.5, 2.0),
            head_cutoff_hz: fizz_curves::logarithmic(fizz, 16000.0, 4000.0, 2.0),
            crackle_probability: fizz_curves::exponential(fizz, 0.001, 0.01, 2.0),
            crackle_level: fizz_curves::exponential(fizz, 0.01, 0.05, 2.0),
            rumble_level: fizz_curves::exponential(fizz, 0.0, 0.015, 2.0),
        }
    }

    /// Biased tanh at unity output.
    pub fn saturation(&self) -> SaturationParams {
        SaturationParams::new(CurveType::Tanh, self.drive).with_bias(TAPE_BIAS)
    }
}

/// Grape signal chain.
#[derive(Debug, Clone)]
pub struct GrapeChain {
    sample_rate: f32,
    dc_blockers: Vec<DcBlocker>,
    transport: Vec<InterpolatedDelay>,
    wow: Lfo,
    flutter: Lfo,
    head: Vec<StateVariableFilter>,
    // Flat-mode artifacts
    gate: EnvelopeFollower,
    noise: NoiseSource,
    rumble: Vec<StateVariableFilter>,
}

impl GrapeChain {
    /// Create an unprepared chain.
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            dc_blockers: Vec::new(),
            transport: Vec::new(),
            wow: Lfo::new(48000.0, WOW_RATE_HZ),
            flutter: Lfo::with_waveform(48000.0, FLUTTER_RATE_HZ, LfoWaveform::Triangle),
            head: Vec::new(),
            gate: EnvelopeFollower::with_times(48000.0, GATE_ATTACK_MS, GATE_RELEASE_MS),
            noise: NoiseSource::default(),
            rumble: Vec::new(),
        }
    }

    fn wow_and_flutter(&mut self, block: &mut [&mut [f32]], params: &GrapeParams) {
        let sample_rate = self.sample_rate;
        for (line, channel) in self.transport.iter_mut().zip(block.iter_mut()) {
            for (i, sample) in channel.iter_mut().enumerate() {
                let delay_ms = BASE_DELAY_MS
                    + params.wow_depth_ms * self.wow.value_at(i)
                    + params.flutter_depth_ms * self.flutter.value_at(i);
                *sample = line.read_write(*sample, ms_to_samples(delay_ms, sample_rate));
            }
        }
        let len = block_len(block);
        self.wow.advance(len);
        self.flutter.advance(len);
    }

    fn vinyl(&mut self, block: &mut [&mut [f32]], params: &GrapeParams) {
        let channels = block.len().min(self.rumble.len());
        for i in 0..block_len(block) {
            let program = block[..channels]
                .iter()
                .fold(0.0f32, |peak, channel| peak.max(channel[i].abs()));
            let gate = (self.gate.process(program) / GATE_FULL_LEVEL).min(1.0);

            for (rumble, channel) in self.rumble.iter_mut().zip(block.iter_mut()) {
                let mut artifact = rumble.process(self.noise.next_bipolar()) * params.rumble_level;
                if self.noise.next_unipolar() < params.crackle_probability {
                    artifact += self.noise.next_bipolar() * params.crackle_level;
                }
                channel[i] += artifact * gate;
            }
        }

        if let [left, right, ..] = block {
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let mono = (*l + *r) * 0.5;
                *l = mono;
                *r = mono;
            }
        }
    }
}

impl Default for GrapeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FlavorChain for GrapeChain {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.sample_rate = sample_rate;
        self.dc_blockers = per_channel(spec.num_channels, || DcBlocker::new(sample_rate));
        self.transport = per_channel(spec.num_channels, || {
            InterpolatedDelay::from_time(sample_rate, DELAY_BUFFER_SECONDS)
        });
        self.wow = Lfo::new(sample_rate, WOW_RATE_HZ);
        self.flutter = Lfo::with_waveform(sample_rate, FLUTTER_RATE_HZ, LfoWaveform::Triangle);
        self.head = per_channel(spec.num_channels, || {
            StateVariableFilter::with_response(sample_rate, SvfOutput::Lowpass, 16000.0)
        });

        self.gate = EnvelopeFollower::with_times(sample_rate, GATE_ATTACK_MS, GATE_RELEASE_MS);
        self.noise.reset();
        self.rumble = per_channel(spec.num_channels, || {
            StateVariableFilter::with_response(sample_rate, SvfOutput::Lowpass, RUMBLE_CUTOFF_HZ)
        });
    }

    fn process(&mut self, block: &mut [&mut [f32]], fizz: f32, saturation: &mut SaturationEngine) {
        let params = GrapeParams::from_fizz(fizz);

        saturation.process(block, &params.saturation());
        run_effects(&mut self.dc_blockers, block);
        self.wow_and_flutter(block, &params);

        for head in &mut self.head {
            head.set_cutoff(params.head_cutoff_hz);
        }
        run_effects(&mut self.head, block);
    }

    fn process_flat(
        &mut self,
        block: &mut [&mut [f32]],
        fizz: f32,
        saturation: &mut SaturationEngine,
    ) {
        self.process(block, fizz, saturation);
        self.vinyl(block, &GrapeParams::from_fizz(fizz));
    }

    fn reset(&mut self) {
        reset_effects(&mut self.dc_blockers);
        for line in &mut self.transport {
            line.clear();
        }
        self.wow.reset();
        self.flutter.reset();
        reset_effects(&mut self.head);
        self.gate.reset();
        self.noise.reset();
        reset_effects(&mut self.rumble);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(channels: usize) -> (GrapeChain, SaturationEngine) {
        let spec = ProcessSpec::new(48000.0, 256, channels);
        let mut chain = GrapeChain::new();
        chain.prepare(&spec);
        let mut saturation = SaturationEngine::new();
        saturation.prepare(&spec);
        (chain, saturation)
    }

    #[test]
    fn test_curve_endpoints() {
        let low = GrapeParams::from_fizz(0.0);
        assert_eq!(low.drive, 1.2);
        assert_eq!(low.wow_depth_ms, 0.0);
        assert_eq!(low.flutter_depth_ms, 0.0);
        assert_eq!(low.head_cutoff_hz, 16000.0);
        assert_eq!(low.rumble_level, 0.0);

        let high = GrapeParams::from_fizz(1.0);
        assert_eq!(high.drive, 4.0);
        assert_eq!(high.wow_depth_ms, 3.0);
        assert_eq!(high.flutter_depth_ms, 0.5);
        assert_eq!(high.head_cutoff_hz, 4000.0);
        assert_eq!(high.crackle_probability, 0.01);
        assert_eq!(high.crackle_level, 0.05);
    }

    #[test]
    fn test_transport_delays_by_base_time_without_modulation() {
        let (mut chain, _) = prepared(1);
        let params = GrapeParams::from_fizz(0.0);
        let mut impulse = vec![0.0f32; 256];
        impulse[0] = 1.0;
        chain.wow_and_flutter(&mut [&mut impulse[..]], &params);
        // 5 ms at 48 kHz
        assert!((impulse[240] - 1.0).abs() < 1e-6);
        assert_eq!(impulse.iter().filter(|s| s.abs() > 1e-6).count(), 1);
    }

    #[test]
    fn test_flat_output_is_mono() {
        let (mut chain, mut saturation) = prepared(2);
        let mut noise = NoiseSource::new(7);
        for _ in 0..8 {
            let mut left: Vec<f32> = (0..256).map(|_| noise.next_bipolar() * 0.5).collect();
            let mut right: Vec<f32> = (0..256).map(|_| noise.next_bipolar() * 0.5).collect();
            chain.process_flat(&mut [&mut left[..], &mut right[..]], 1.0, &mut saturation);
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_flat_silence_stays_silent() {
        let (mut chain, mut saturation) = prepared(2);
        for _ in 0..20 {
            let mut left = vec![0.0f32; 256];
            let mut right = vec![0.0f32; 256];
            chain.process_flat(&mut [&mut left[..], &mut right[..]], 1.0, &mut saturation);
            assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_mono_block_gets_artifacts_without_fold_down() {
        let (mut chain, mut saturation) = prepared(1);
        let mut mono = vec![0.2f32; 256];
        chain.process_flat(&mut [&mut mono[..]], 1.0, &mut saturation);
        assert!(mono.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_reset_restarts_noise_sequence() {
        let (mut chain, mut saturation) = prepared(2);
        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();

        let mut first_l = input.clone();
        let mut first_r = input.clone();
        chain.process_flat(&mut [&mut first_l[..], &mut first_r[..]], 0.7, &mut saturation);

        chain.reset();
        saturation.reset();
        let mut second_l = input.clone();
        let mut second_r = input;
        chain.process_flat(&mut [&mut second_l[..], &mut second_r[..]], 0.7, &mut saturation);

        assert_eq!(first_l, second_l);
    }
}
