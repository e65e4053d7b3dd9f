//! Carbonator Core - DSP primitives for the soda effects engine
//!
//! This crate provides the building blocks the flavor chains in
//! `carbonator-effects` are assembled from. Everything here is designed for
//! real-time audio: buffers are allocated up front, never in a processing call.
//!
//! # Core Abstractions
//!
//! ## Fizz Mapping
//!
//! - [`fizz_curves`] - Pure functions mapping the normalized Fizz control
//!   onto parameter ranges (exponential, logarithmic, S-curve, linear)
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe mono processing trait
//! - [`EffectExt`] / [`Chain`] - Static series composition
//!
//! ## Parameter Smoothing
//!
//! - [`SmoothedParam`] - Exponential smoothing with closed-form block skipping
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR with RBJ cookbook coefficients (incl. shelves)
//! - [`StateVariableFilter`] - TPT SVF, safe for per-sample cutoff sweeps
//! - [`LinkwitzRiley`] - 4th-order two-band crossover
//! - [`DcBlocker`] - First-order DC removal
//!
//! ## Delay, Modulation, Dynamics
//!
//! - [`InterpolatedDelay`] - Ring buffer with linearly interpolated fractional taps
//! - [`Lfo`] - Radian phase accumulator (sine, triangle)
//! - [`EnvelopeFollower`] - Peak envelope with attack/release ballistics
//! - [`NoiseSource`] - Deterministic white noise
//!
//! ## Anti-Aliasing
//!
//! - [`Oversampler`] - Block 4× polyphase FIR oversampler with fixed group delay
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for embedded targets:
//!
//! ```toml
//! [dependencies]
//! carbonator-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod crossover;
pub mod dc_blocker;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod fizz_curves;
pub mod lfo;
pub mod math;
pub mod noise;
pub mod oversample;
pub mod param;
pub mod svf;

// Re-export main types at crate root
pub use biquad::{
    Biquad, BiquadCoefficients, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, lowpass_coefficients, peaking_eq_coefficients,
};
pub use crossover::LinkwitzRiley;
pub use dc_blocker::DcBlocker;
pub use delay::InterpolatedDelay;
pub use effect::{Chain, Effect, EffectExt};
pub use envelope::EnvelopeFollower;
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    clamp_cutoff, db_to_linear, flush_denormal, linear_to_db, mid_side_decode, mid_side_encode,
    ms_to_samples, wet_dry_mix,
};
pub use noise::NoiseSource;
pub use oversample::{OVERSAMPLE_FACTOR, Oversampler};
pub use param::SmoothedParam;
pub use svf::{StateVariableFilter, SvfOutput};
