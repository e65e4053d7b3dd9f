//! Deterministic white noise for vinyl crackle and rumble.

/// Default seed used after construction and [`NoiseSource::reset`].
pub const DEFAULT_SEED: u32 = 0x5EED_F122;

/// 32-bit LCG noise generator.
///
/// Numerical Recipes constants (`a = 1664525`, `c = 1013904223`); only the
/// upper 16 bits are used, which avoids the weak low-order bits of an LCG.
/// Deterministic for a given seed, so renders are reproducible.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u32,
    seed: u32,
}

impl NoiseSource {
    /// Create a generator with the given seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed, seed }
    }

    #[inline]
    fn step(&mut self) -> u16 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        (self.state >> 16) as u16
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn next_unipolar(&mut self) -> f32 {
        f32::from(self.step()) / 65_536.0
    }

    /// Uniform value in `[-1, 1)`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.next_unipolar() * 2.0 - 1.0
    }

    /// Restart the sequence from the construction seed.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
