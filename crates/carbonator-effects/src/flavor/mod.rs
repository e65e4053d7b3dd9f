//! The five flavor chains.
//!
//! Each flavor is a fixed pipeline whose settings are re-derived once per
//! block from the smoothed Fizz value (`[0, 1]`) through
//! [`fizz_curves`](carbonator_core::fizz_curves). The derivation lives in a
//! plain `*Params::from_fizz` function so the curves can be inspected
//! without running audio.
//!
//! | Flavor | Carbonated | Flat |
//! |--------|------------|------|
//! | [`ColaChain`] | asym soft clip → DC block → compressor → tilt EQ | + tape tanh |
//! | [`CherryChain`] | parallel tanh → de-harsh → presence → air | + chorus |
//! | [`GrapeChain`] | biased tanh → DC block → wow/flutter → head LP | + vinyl, mono |
//! | [`LemonLimeChain`] | LR4 split, HF: tanh → comp → presence → air | + telephone band |
//! | [`OrangeCreamChain`] | warm clip → M/S → mid comp → width → detune → shelf | simplified chain |
//!
//! Every chain holds one filter instance per prepared channel and processes
//! at most that many channels.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use carbonator_core::{Biquad, BiquadCoefficients, Effect};

use crate::params::ProcessSpec;
use crate::saturation::SaturationEngine;

mod cherry;
mod cola;
mod grape;
mod lemon_lime;
mod orange_cream;

pub use cherry::{CherryChain, CherryParams};
pub use cola::{ColaChain, ColaParams};
pub use grape::{GrapeChain, GrapeParams};
pub use lemon_lime::{LemonLimeChain, LemonLimeParams};
pub use orange_cream::{OrangeCreamChain, OrangeCreamParams};

/// Common lifecycle of a flavor chain.
///
/// `block` is planar: one slice per channel, all the same length.
pub trait FlavorChain {
    /// Allocate per-channel state for `spec`. Never called while processing.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Carbonated processing.
    fn process(&mut self, block: &mut [&mut [f32]], fizz: f32, saturation: &mut SaturationEngine);

    /// Flat (carbonation off) processing.
    ///
    /// For every flavor except Orange Cream this is [`process`](Self::process)
    /// followed by an extra stage.
    fn process_flat(
        &mut self,
        block: &mut [&mut [f32]],
        fizz: f32,
        saturation: &mut SaturationEngine,
    );

    /// Clear filter, delay and envelope state without reallocating.
    fn reset(&mut self);
}

/// Samples per channel in a planar block.
#[inline]
pub(crate) fn block_len(block: &[&mut [f32]]) -> usize {
    block.first().map_or(0, |channel| channel.len())
}

/// Load `coefficients` into each channel's filter and run it over that
/// channel.
pub(crate) fn run_biquads(
    filters: &mut [Biquad],
    coefficients: BiquadCoefficients,
    block: &mut [&mut [f32]],
) {
    for (filter, channel) in filters.iter_mut().zip(block.iter_mut()) {
        filter.apply(coefficients);
        filter.process_block_inplace(channel);
    }
}

/// Run each channel's mono stage over that channel.
pub(crate) fn run_effects<E: Effect>(stages: &mut [E], block: &mut [&mut [f32]]) {
    for (stage, channel) in stages.iter_mut().zip(block.iter_mut()) {
        stage.process_block_inplace(channel);
    }
}

/// One fresh instance per channel.
pub(crate) fn per_channel<T>(channels: usize, make: impl Fn() -> T) -> Vec<T> {
    (0..channels).map(|_| make()).collect()
}

pub(crate) fn clear_biquads(filters: &mut [Biquad]) {
    for filter in filters {
        filter.clear();
    }
}

pub(crate) fn reset_effects<E: Effect>(stages: &mut [E]) {
    for stage in stages {
        stage.reset();
    }
}
