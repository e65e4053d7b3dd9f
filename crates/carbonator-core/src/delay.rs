//! Fractional delay line for modulated effects.
//!
//! The chorus, tape wow/flutter and pitch-detune stages all read a ring
//! buffer at a moving, fractional distance behind the most recent write.
//!
//! | Stage | Delay range | Modulation |
//! |-------|-------------|------------|
//! | Cherry-Flat chorus | 2.5-4 ms | 1.5 Hz sine |
//! | Grape wow/flutter | 1 sample-8.5 ms | 0.4 Hz sine + 4.5 Hz triangle |
//! | Orange Cream detune | 1-31 ms | sawtooth sweep |
//!
//! # Invariants
//!
//! - Each [`write`](InterpolatedDelay::write) advances the write position by
//!   exactly one slot, wrapping at the buffer length.
//! - Reads are measured from the most recent write and clamped to
//!   `[1, capacity - 2]` samples, so a read never lands on a slot that has
//!   not been written in this pass and the interpolation partner is always
//!   in range.
//! - Indices are wrapped into `[0, capacity)` before use.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Shortest readable delay, in samples.
pub const MIN_DELAY_SAMPLES: f32 = 1.0;

/// Ring-buffer delay with linear interpolation (heap-allocated once).
///
/// # Example
///
/// ```rust
/// use carbonator_core::InterpolatedDelay;
///
/// let mut delay = InterpolatedDelay::new(16);
/// delay.write(1.0);
/// delay.write(0.0);
///
/// assert_eq!(delay.read(1.0), 1.0);
/// assert_eq!(delay.read(1.5), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl InterpolatedDelay {
    /// Create a delay line holding `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 4`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 4, "delay capacity must be at least 4 samples");
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Create a delay line long enough for `max_seconds` at `sample_rate`,
    /// plus a few samples of interpolation margin.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let samples = libm::ceilf(sample_rate * max_seconds).max(0.0) as usize;
        Self::new(samples + 4)
    }

    /// Store one sample and advance the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Read `delay_samples` behind the most recent write.
    ///
    /// The delay is clamped to `[1, max_delay()]`; non-finite values read at
    /// the minimum delay.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = if delay_samples.is_finite() {
            delay_samples.clamp(MIN_DELAY_SAMPLES, self.max_delay())
        } else {
            MIN_DELAY_SAMPLES
        };

        let delay_int = delay as usize;
        let frac = delay - delay_int as f32;

        let newest = (self.write_pos + len - 1) % len;
        let near = (newest + len - delay_int) % len;
        let far = if near == 0 { len - 1 } else { near - 1 };
        debug_assert!(near < len && far < len);

        let a = self.buffer[near];
        let b = self.buffer[far];
        a + (b - a) * frac
    }

    /// Write `sample`, then read `delay_samples` behind it.
    #[inline]
    pub fn read_write(&mut self, sample: f32, delay_samples: f32) -> f32 {
        self.write(sample);
        self.read(delay_samples)
    }

    /// Longest readable delay in samples.
    #[inline]
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 2) as f32
    }

    /// Buffer length in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current write index (the slot the next write goes to).
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Zero the buffer and rewind the write position.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
