//! Carbonator Effects - the carbonated soda effects engine
//!
//! One control, **Fizz**, morphs every stage of five fixed "flavor" chains at
//! once. A **Carbonated** switch swaps each flavor into its Flat variant.
//!
//! - [`EffectsChain`] - Top-level engine: bypass, auto-gain, output gain, safety limiter
//! - [`FlavorProcessor`] - Owns the five chains and dispatches to the selected one
//! - [`ColaChain`], [`CherryChain`], [`GrapeChain`], [`LemonLimeChain`],
//!   [`OrangeCreamChain`] - The flavors
//! - [`SaturationEngine`] - Shared waveshaper with optional 4× oversampling
//! - [`Compressor`] - Feed-forward compressor, linked or mono
//! - [`SafetyLimiter`] - Zero-latency brickwall at the output
//! - [`UnderwaterFilter`] - Fizz-swept low-pass pre-stage
//! - [`ParamSnapshot`] / [`SharedParams`] - Per-block control values and their
//!   lock-free store
//!
//! ## Example
//!
//! ```rust
//! use carbonator_effects::{EffectsChain, FlavorType, ParamSnapshot, ProcessSpec};
//!
//! let mut engine = EffectsChain::new();
//! engine.prepare(ProcessSpec::new(44100.0, 512, 2))?;
//!
//! let params = ParamSnapshot {
//!     flavor: FlavorType::Grape,
//!     fizz: 80.0,
//!     carbonated: false,
//!     ..ParamSnapshot::default()
//! };
//!
//! let mut left = vec![0.1f32; 512];
//! let mut right = vec![0.1f32; 512];
//! engine.process(&mut [&mut left[..], &mut right[..]], &params);
//! # Ok::<(), carbonator_effects::Error>(())
//! ```
//!
//! # no_std Support
//!
//! The engine only needs `alloc`. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! carbonator-effects = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod chain;
pub mod compressor;
pub mod error;
pub mod flavor;
pub mod flavor_processor;
pub mod limiter;
pub mod params;
pub mod saturation;
pub mod underwater;

// Re-export main types at crate root
pub use chain::EffectsChain;
pub use compressor::Compressor;
pub use error::{Error, Result};
pub use flavor::{
    CherryChain, CherryParams, ColaChain, ColaParams, FlavorChain, GrapeChain, GrapeParams,
    LemonLimeChain, LemonLimeParams, OrangeCreamChain, OrangeCreamParams,
};
pub use flavor_processor::FlavorProcessor;
pub use limiter::SafetyLimiter;
pub use params::{
    FIZZ_RANGE, FlavorType, OUTPUT_GAIN_RANGE_DB, PARAMS, ParamDescriptor, ParamSnapshot,
    ParamUnit, ProcessSpec, SharedParams,
};
pub use saturation::{CurveType, SaturationEngine, SaturationParams};
pub use underwater::UnderwaterFilter;
