//! Low Frequency Oscillator for delay-time modulation.
//!
//! Phase is kept in radians and wrapped at 2π. Modulated stages read the
//! oscillator at `block start + sample offset` with [`Lfo::value_at`] for
//! every channel of a block, then call [`Lfo::advance`] once with the block
//! length, so all channels see the same modulation and the phase moves by
//! exactly the number of samples processed.

use core::f32::consts::{FRAC_2_PI, TAU};
use libm::{asinf, fmodf, sinf};

/// LFO waveform type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// `sin(φ)`
    #[default]
    Sine,
    /// `(2/π)·asin(sin(φ))`, a triangle with the sine's phase.
    Triangle,
}

/// Radian phase-accumulator oscillator, output in `[-1, 1]`.
///
/// # Example
///
/// ```rust
/// use carbonator_core::{Lfo, LfoWaveform};
///
/// let mut wow = Lfo::new(48000.0, 0.4);
/// wow.set_waveform(LfoWaveform::Sine);
///
/// let first = wow.value_at(0);
/// let later = wow.value_at(255);
/// wow.advance(256);
/// assert!(first.abs() <= 1.0 && later.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase in radians, `[0, 2π)`
    phase: f32,
    /// Phase increment per sample in radians
    phase_inc: f32,
    frequency: f32,
    sample_rate: f32,
    waveform: LfoWaveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl Lfo {
    /// Create a sine LFO at `freq_hz`, phase 0.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: TAU * freq_hz / sample_rate,
            frequency: freq_hz,
            sample_rate,
            waveform: LfoWaveform::Sine,
        }
    }

    /// Create an LFO with a specific waveform.
    pub fn with_waveform(sample_rate: f32, freq_hz: f32, waveform: LfoWaveform) -> Self {
        let mut lfo = Self::new(sample_rate, freq_hz);
        lfo.waveform = waveform;
        lfo
    }

    /// Set frequency in Hz
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz;
        self.phase_inc = TAU * freq_hz / self.sample_rate;
    }

    /// Frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set waveform
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Update sample rate, keeping the frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_frequency(self.frequency);
    }

    /// Oscillator output `offset` samples after the current phase, without
    /// advancing.
    #[inline]
    pub fn value_at(&self, offset: usize) -> f32 {
        let phase = self.phase + self.phase_inc * offset as f32;
        match self.waveform {
            LfoWaveform::Sine => sinf(phase),
            LfoWaveform::Triangle => FRAC_2_PI * asinf(sinf(phase)),
        }
    }

    /// Advance the phase by `samples`, wrapping into `[0, 2π)`.
    #[inline]
    pub fn advance(&mut self, samples: usize) {
        self.phase += self.phase_inc * samples as f32;
        if self.phase >= TAU {
            self.phase = fmodf(self.phase, TAU);
        }
    }

    /// Output at the current phase, then advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let value = self.value_at(0);
        self.advance(1);
        value
    }
}
