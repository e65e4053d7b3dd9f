//! Mono processing trait shared by the per-channel building blocks.
//!
//! Flavor chains hold one instance of each filter per channel and drive it
//! with [`Effect::process_block_inplace`] over that channel's slice. Stages
//! that only make sense in series (the two halves of a Linkwitz-Riley band,
//! the underwater filter's fixed and swept sections) are composed statically
//! with [`EffectExt::chain`].
//!
//! Implementations never allocate in `process`.

/// A single-channel, sample-at-a-time processor.
///
/// # Example
///
/// ```rust
/// use carbonator_core::{Effect, EffectExt, StateVariableFilter, SvfOutput};
///
/// let stage = || StateVariableFilter::with_response(48000.0, SvfOutput::Lowpass, 2000.0);
/// let mut fourth_order = stage().chain(stage());
///
/// let mut block = [0.5f32; 64];
/// fourth_order.process_block_inplace(&mut block);
/// assert!(block.iter().all(|s| s.is_finite()));
/// ```
pub trait Effect {
    /// Process a single sample, advancing internal state by one step.
    fn process(&mut self, input: f32) -> f32;

    /// Process a buffer in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Recalculate sample-rate-dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear history (filter memory, envelopes) without touching parameters.
    fn reset(&mut self);
}

/// Series composition for any [`Effect`].
pub trait EffectExt: Effect + Sized {
    /// Feed the output of `self` into `next`.
    fn chain<E: Effect>(self, next: E) -> Chain<Self, E> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Effect> EffectExt for T {}

/// Two effects in series, created by [`EffectExt::chain`].
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: Effect, B: Effect> Effect for Chain<A, B> {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mid = self.first.process(input);
        self.second.process(mid)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.first.set_sample_rate(sample_rate);
        self.second.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

impl<A, B> Chain<A, B> {
    /// The first stage.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The first stage, mutably (e.g. to retune it).
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// The second stage.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// The second stage, mutably.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gain(f32);

    impl Effect for Gain {
        fn process(&mut self, input: f32) -> f32 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    struct Accumulator(f32);

    impl Effect for Accumulator {
        fn process(&mut self, input: f32) -> f32 {
            self.0 += input;
            self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {
            self.0 = 0.0;
        }
    }

    #[test]
    fn test_chain_order() {
        let mut chain = Gain(2.0).chain(Accumulator(0.0));
        assert_eq!(chain.process(1.0), 2.0);
        assert_eq!(chain.process(1.0), 4.0);
    }

    #[test]
    fn test_chain_block_inplace() {
        let mut chain = Gain(2.0).chain(Gain(0.5));
        let mut block = [1.0, 2.0, 3.0];
        chain.process_block_inplace(&mut block);
        assert_eq!(block, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_chain_reset_reaches_both_stages() {
        let mut chain = Accumulator(0.0).chain(Accumulator(0.0));
        chain.process(1.0);
        chain.reset();
        assert_eq!(chain.first().0, 0.0);
        assert_eq!(chain.second().0, 0.0);
    }
}
