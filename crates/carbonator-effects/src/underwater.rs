//! Fizz-swept "underwater" low-pass.
//!
//! A standalone pre-stage, not part of [`EffectsChain`](crate::EffectsChain).
//! Fizz opens a Butterworth low-pass exponentially from 300 Hz (muffled,
//! underwater) to 18 kHz (fully bright); with carbonation off a fixed 800 Hz
//! low-pass follows it.
//!
//! The cutoff glides over 50 ms and is retuned every sample. The TPT state
//! variable filter keeps its state valid under that kind of modulation.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use carbonator_core::svf::BUTTERWORTH_Q;
use carbonator_core::{
    Chain, Effect, EffectExt, SmoothedParam, StateVariableFilter, SvfOutput, clamp_cutoff,
};
use libm::powf;

use crate::params::{FIZZ_RANGE, ParamSnapshot, ProcessSpec};

const MIN_CUTOFF_HZ: f32 = 300.0;
const MAX_CUTOFF_HZ: f32 = 18000.0;
const FLAT_CUTOFF_HZ: f32 = 800.0;
const CUTOFF_SMOOTHING_MS: f32 = 50.0;

type Stage = Chain<StateVariableFilter, StateVariableFilter>;

fn stage(sample_rate: f32, cutoff: f32) -> Stage {
    let lowpass = |freq| {
        let mut svf = StateVariableFilter::with_response(sample_rate, SvfOutput::Lowpass, freq);
        svf.set_resonance(BUTTERWORTH_Q);
        svf
    };
    lowpass(cutoff).chain(lowpass(FLAT_CUTOFF_HZ))
}

/// Per-channel swept low-pass.
///
/// # Example
///
/// ```rust
/// use carbonator_effects::{ParamSnapshot, ProcessSpec, UnderwaterFilter};
///
/// let mut filter = UnderwaterFilter::new();
/// filter.prepare(&ProcessSpec::new(48000.0, 128, 1));
///
/// let mut mono = [0.5f32; 128];
/// filter.process(&mut [&mut mono[..]], &ParamSnapshot { fizz: 0.0, ..Default::default() });
/// assert!(mono.iter().all(|s| s.is_finite()));
/// ```
#[derive(Debug, Clone)]
pub struct UnderwaterFilter {
    sample_rate: f32,
    cutoff: SmoothedParam,
    snap_cutoff: bool,
    stages: Vec<Stage>,
}

impl UnderwaterFilter {
    /// Create an unprepared filter.
    pub fn new() -> Self {
        Self {
            sample_rate: 48000.0,
            cutoff: SmoothedParam::with_config(MAX_CUTOFF_HZ, 48000.0, CUTOFF_SMOOTHING_MS),
            snap_cutoff: true,
            stages: Vec::new(),
        }
    }

    /// Map Fizz (percent) to the cutoff in Hz, clamped to `[20, 20000]` and
    /// below Nyquist.
    pub fn fizz_to_cutoff(fizz: f32, sample_rate: f32) -> f32 {
        let normalized = if fizz.is_finite() {
            (fizz / FIZZ_RANGE.1).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let cutoff = MIN_CUTOFF_HZ * powf(MAX_CUTOFF_HZ / MIN_CUTOFF_HZ, normalized);
        clamp_cutoff(cutoff.clamp(20.0, 20000.0), sample_rate)
    }

    /// Allocate one filter pair per channel.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        let sample_rate = spec.sample_rate_f32();
        self.sample_rate = sample_rate;
        let initial = clamp_cutoff(MAX_CUTOFF_HZ, sample_rate);
        self.cutoff = SmoothedParam::with_config(initial, sample_rate, CUTOFF_SMOOTHING_MS);
        self.snap_cutoff = true;
        self.stages = (0..spec.num_channels).map(|_| stage(sample_rate, initial)).collect();
    }

    /// Clear filter state. The next cutoff is taken without a glide.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.snap_cutoff = true;
    }

    /// Current smoothed cutoff in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff.get()
    }

    /// Filter every prepared channel of `block` in place.
    pub fn process(&mut self, block: &mut [&mut [f32]], params: &ParamSnapshot) {
        self.cutoff
            .set_target(Self::fizz_to_cutoff(params.fizz, self.sample_rate));
        if self.snap_cutoff {
            self.cutoff.snap_to_target();
            self.snap_cutoff = false;
        }

        let len = block.first().map_or(0, |channel| channel.len());
        for i in 0..len {
            let cutoff = self.cutoff.advance();
            for (stage, channel) in self.stages.iter_mut().zip(block.iter_mut()) {
                let Some(sample) = channel.get_mut(i) else {
                    continue;
                };
                stage.first_mut().set_cutoff(cutoff);
                *sample = if params.carbonated {
                    stage.first_mut().process(*sample)
                } else {
                    stage.process(*sample)
                };
            }
        }
    }
}

impl Default for UnderwaterFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;
    use libm::sinf;

    fn steady_peak(filter: &mut UnderwaterFilter, freq: f32, params: &ParamSnapshot) -> f32 {
        let mut peak = 0.0f32;
        for block_index in 0..40 {
            let mut mono: Vec<f32> = (0..256)
                .map(|i| sinf(2.0 * PI * freq * (block_index * 256 + i) as f32 / 48000.0))
                .collect();
            filter.process(&mut [&mut mono[..]], params);
            if block_index >= 30 {
                peak = mono.iter().fold(peak, |p, s| p.max(s.abs()));
            }
        }
        peak
    }

    fn prepared() -> UnderwaterFilter {
        let mut filter = UnderwaterFilter::new();
        filter.prepare(&ProcessSpec::new(48000.0, 256, 1));
        filter
    }

    #[test]
    fn test_cutoff_mapping() {
        assert!((UnderwaterFilter::fizz_to_cutoff(0.0, 48000.0) - 300.0).abs() < 1e-3);
        assert!((UnderwaterFilter::fizz_to_cutoff(100.0, 48000.0) - 18000.0).abs() < 1.0);
        // Geometric midpoint
        let mid = UnderwaterFilter::fizz_to_cutoff(50.0, 48000.0);
        assert!((mid - 2323.8).abs() < 1.0, "mid {mid}");
        // Nyquist margin at low sample rates
        assert!(UnderwaterFilter::fizz_to_cutoff(100.0, 22050.0) <= 22050.0 * 0.45);
        assert_eq!(UnderwaterFilter::fizz_to_cutoff(f32::NAN, 48000.0), 300.0);
    }

    #[test]
    fn test_low_fizz_muffles_highs() {
        let mut filter = prepared();
        let params = ParamSnapshot {
            fizz: 0.0,
            ..ParamSnapshot::default()
        };
        assert!(steady_peak(&mut filter, 4000.0, &params) < 0.02);
    }

    #[test]
    fn test_full_fizz_passes_mids() {
        let mut filter = prepared();
        let params = ParamSnapshot {
            fizz: 100.0,
            ..ParamSnapshot::default()
        };
        let peak = steady_peak(&mut filter, 1000.0, &params);
        assert!((peak - 1.0).abs() < 0.02, "peak {peak}");
    }

    #[test]
    fn test_flat_adds_fixed_lowpass() {
        let mut carbonated = prepared();
        let mut flat = prepared();
        let on = ParamSnapshot {
            fizz: 100.0,
            ..ParamSnapshot::default()
        };
        let off = ParamSnapshot {
            carbonated: false,
            ..on
        };
        let bright = steady_peak(&mut carbonated, 3000.0, &on);
        let muffled = steady_peak(&mut flat, 3000.0, &off);
        // Two octaves above 800 Hz at 12 dB/oct
        assert!(muffled < bright * 0.1, "{muffled} vs {bright}");
    }

    #[test]
    fn test_cutoff_glides() {
        let mut filter = prepared();
        let mut mono = [0.0f32; 256];
        filter.process(&mut [&mut mono[..]], &ParamSnapshot { fizz: 100.0, ..Default::default() });
        let open = filter.cutoff_hz();
        filter.process(&mut [&mut mono[..]], &ParamSnapshot { fizz: 0.0, ..Default::default() });
        let moving = filter.cutoff_hz();
        assert!(moving < open && moving > 300.0);
    }
}
