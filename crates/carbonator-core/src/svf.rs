//! State Variable Filter implementation.
//!
//! Implements the Topology-Preserving Transform (TPT) SVF after Zavalishin,
//! "The Art of VA Filter Design" (2012). The trapezoidal integrators keep the
//! analog prototype's response and stay stable while the cutoff moves, which
//! is why this filter carries every swept or per-block retuned low/high-pass
//! in the engine: the tape-head low-pass, the crossover bands, the rumble
//! filter and the fizz-swept underwater filter.
//!
//! # Reference
//!
//! Zavalishin, "The Art of VA Filter Design", rev. 2.1.2 (2018), Chapter 3.

use core::f32::consts::PI;
use libm::tanf;

use crate::Effect;
use crate::math::{clamp_cutoff, flush_denormal};

/// Butterworth resonance, maximally flat passband.
pub const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

/// State Variable Filter output type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SvfOutput {
    /// Passes frequencies below the cutoff.
    #[default]
    Lowpass,
    /// Passes frequencies above the cutoff.
    Highpass,
    /// Passes frequencies near the cutoff.
    Bandpass,
}

/// State Variable Filter (2-pole, 12 dB/oct).
///
/// ## Parameters
///
/// - `cutoff`: Hz, clamped to `[20, sr × 0.45]` (default 1000.0)
/// - `resonance`: Q factor, clamped to `[0.5, 20.0]` (default 0.707)
/// - `output_type`: which response [`Effect::process`] returns
///
/// # Example
///
/// ```rust
/// use carbonator_core::{Effect, StateVariableFilter, SvfOutput};
///
/// let mut tape_head = StateVariableFilter::new(48000.0);
/// tape_head.set_output_type(SvfOutput::Lowpass);
/// tape_head.set_cutoff(8000.0);
///
/// let output = tape_head.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    // Integrator state
    ic1eq: f32,
    ic2eq: f32,

    // Coefficients
    g: f32,
    k: f32,
    a1: f32,

    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    output_type: SvfOutput,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl StateVariableFilter {
    /// Create a new low-pass SVF at 1 kHz, Q = 0.707.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            a1: 0.0,
            sample_rate,
            cutoff: 1000.0,
            resonance: BUTTERWORTH_Q,
            output_type: SvfOutput::Lowpass,
        };
        svf.update_coefficients();
        svf
    }

    /// Create a Butterworth SVF with the given response and cutoff.
    pub fn with_response(sample_rate: f32, output_type: SvfOutput, cutoff: f32) -> Self {
        let mut svf = Self::new(sample_rate);
        svf.output_type = output_type;
        svf.set_cutoff(cutoff);
        svf
    }

    /// Set cutoff frequency in Hz. Clamped to `[20, sr × 0.45]`.
    ///
    /// Cheap enough to call per sample for modulated cutoffs.
    #[inline]
    pub fn set_cutoff(&mut self, freq: f32) {
        self.cutoff = clamp_cutoff(freq, self.sample_rate);
        self.update_coefficients();
    }

    /// Current cutoff frequency in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (Q factor). Clamped to `[0.5, 20.0]`.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(0.5, 20.0);
        self.update_coefficients();
    }

    /// Current resonance (Q factor).
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Select which response [`Effect::process`] returns.
    pub fn set_output_type(&mut self, output_type: SvfOutput) {
        self.output_type = output_type;
    }

    /// Current output type.
    pub fn output_type(&self) -> SvfOutput {
        self.output_type
    }

    fn update_coefficients(&mut self) {
        self.g = tanf(PI * self.cutoff / self.sample_rate);
        self.k = 1.0 / self.resonance;
        self.a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
    }

    /// Process one sample and return `(lowpass, highpass, bandpass)`.
    #[inline]
    pub fn process_all(&mut self, input: f32) -> (f32, f32, f32) {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) * self.a1;
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        let lp = v2;
        let bp = v1;
        let hp = input - self.k * v1 - v2;

        (lp, hp, bp)
    }
}

impl Effect for StateVariableFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let (lp, hp, bp) = self.process_all(input);

        match self.output_type {
            SvfOutput::Lowpass => lp,
            SvfOutput::Highpass => hp,
            SvfOutput::Bandpass => bp,
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.cutoff = clamp_cutoff(self.cutoff, sample_rate);
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
