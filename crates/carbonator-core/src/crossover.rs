//! Linkwitz-Riley 4th-order crossover.
//!
//! Each band is two cascaded Butterworth (Q = 1/√2) TPT sections. Squaring
//! the Butterworth response puts both bands at -6 dB at the crossover
//! frequency and in phase, so `low + high` is an allpass: magnitude flat,
//! only the phase rotates.

use crate::effect::{Chain, Effect, EffectExt};
use crate::svf::{StateVariableFilter, SvfOutput};

type Band = Chain<StateVariableFilter, StateVariableFilter>;

fn band(sample_rate: f32, output: SvfOutput, frequency: f32) -> Band {
    StateVariableFilter::with_response(sample_rate, output, frequency).chain(
        StateVariableFilter::with_response(sample_rate, output, frequency),
    )
}

/// Two-band LR4 splitter for one channel.
///
/// # Example
///
/// ```rust
/// use carbonator_core::LinkwitzRiley;
///
/// let mut split = LinkwitzRiley::new(48000.0, 2500.0);
/// let (low, high) = split.process(0.5);
/// assert!((low + high).is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct LinkwitzRiley {
    low: Band,
    high: Band,
}

impl LinkwitzRiley {
    /// Create a crossover at `frequency` Hz.
    pub fn new(sample_rate: f32, frequency: f32) -> Self {
        Self {
            low: band(sample_rate, SvfOutput::Lowpass, frequency),
            high: band(sample_rate, SvfOutput::Highpass, frequency),
        }
    }

    /// Move the crossover point (clamped by the underlying filters).
    pub fn set_frequency(&mut self, frequency: f32) {
        self.low.first_mut().set_cutoff(frequency);
        self.low.second_mut().set_cutoff(frequency);
        self.high.first_mut().set_cutoff(frequency);
        self.high.second_mut().set_cutoff(frequency);
    }

    /// Current crossover frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.low.first().cutoff()
    }

    /// Split one sample into `(low, high)`.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        (self.low.process(input), self.high.process(input))
    }

    /// Update the sample rate, keeping the crossover frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.low.set_sample_rate(sample_rate);
        self.high.set_sample_rate(sample_rate);
    }

    /// Clear all four filter states.
    pub fn reset(&mut self) {
        self.low.reset();
        self.high.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;
    use libm::sinf;

    /// Gain of the summed bands, from RMS over a whole number of cycles.
    fn band_sum_gain(freq: f32) -> f32 {
        let sample_rate = 48000.0;
        let mut split = LinkwitzRiley::new(sample_rate, 2000.0);
        let mut energy = 0.0f32;
        for i in 0..24000 {
            let x = sinf(2.0 * PI * freq * i as f32 / sample_rate);
            let (low, high) = split.process(x);
            if i >= 12000 {
                energy += (low + high) * (low + high);
            }
        }
        libm::sqrtf(2.0 * energy / 12000.0)
    }

    #[test]
    fn bands_sum_flat() {
        // Every test frequency fits a whole number of cycles in 12000 samples
        for freq in [100.0, 1000.0, 2000.0, 4000.0, 12000.0, 20000.0] {
            let gain = band_sum_gain(freq);
            assert!(
                (gain - 1.0).abs() < 0.02,
                "LR4 sum should be flat, {freq} Hz gave {gain}"
            );
        }
    }

    #[test]
    fn bands_split_energy() {
        let sample_rate = 48000.0;
        let mut split = LinkwitzRiley::new(sample_rate, 2000.0);
        let mut low_peak = 0.0f32;
        let mut high_peak = 0.0f32;
        for i in 0..24000 {
            let x = sinf(2.0 * PI * 200.0 * i as f32 / sample_rate);
            let (low, high) = split.process(x);
            if i > 12000 {
                low_peak = low_peak.max(low.abs());
                high_peak = high_peak.max(high.abs());
            }
        }
        assert!(low_peak > 0.95, "200 Hz should sit in the low band");
        assert!(high_peak < 0.01, "200 Hz should be absent from the high band");
    }

    #[test]
    fn set_frequency_moves_all_sections() {
        let mut split = LinkwitzRiley::new(44100.0, 4000.0);
        split.set_frequency(1500.0);
        assert_eq!(split.frequency(), 1500.0);
    }
}
