//! Block oversampler for anti-aliased waveshaping.
//!
//! Waveshaping a signal generates harmonics above Nyquist that fold back
//! into the audible band. The saturation stage therefore:
//!
//! 1. **Upsamples** each channel 4× (zero-stuffing + FIR interpolation)
//! 2. **Shapes** the oversampled samples (harmonics land below the new Nyquist)
//! 3. **Downsamples** back (FIR anti-alias filter + decimation)
//!
//! ## Filter
//!
//! One 127-tap Blackman-windowed sinc, cutoff at 0.9 × base-rate Nyquist,
//! designed once at construction and used for both directions. The
//! interpolator runs it in polyphase form: output phase `p` of input sample
//! `n` is
//!
//! ```text
//! y[4n + p] = 4 · Σ_k h[p + 4k] · x[n - k]
//! ```
//!
//! so the zero-stuffed samples are never multiplied.
//!
//! ## Latency
//!
//! Both filters are linear phase (63 oversampled samples of delay each) and
//! decimation keeps the third sample of each group of four, so the total delay
//! is `(126 - 2) / 4 = 31` base-rate samples. A whole-sample latency lets a
//! plain delay line of [`Oversampler::LATENCY_SAMPLES`] keep a dry path or a
//! split band time-aligned with the oversampled signal.
//!
//! ## Usage
//!
//! ```rust
//! use carbonator_core::Oversampler;
//!
//! let mut os = Oversampler::new(2, 256);
//! let mut left = vec![0.25f32; 256];
//!
//! os.process_channel(0, &mut left, |oversampled| {
//!     assert_eq!(oversampled.len(), 1024);
//!     for s in oversampled.iter_mut() {
//!         *s = libm::tanhf(*s * 2.0);
//!     }
//! });
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Oversampling factor.
pub const OVERSAMPLE_FACTOR: usize = 4;

/// FIR length (odd, linear phase).
const TAPS: usize = 127;

/// Taps per polyphase branch, `ceil(TAPS / FACTOR)`.
const PHASE_TAPS: usize = TAPS.div_ceil(OVERSAMPLE_FACTOR);

/// Decimator history, power of two > `TAPS`.
const DOWN_HISTORY: usize = 128;

/// Interpolator history, power of two ≥ `PHASE_TAPS`.
const UP_HISTORY: usize = 32;

const _: () = assert!(PHASE_TAPS <= UP_HISTORY && TAPS + DECIMATION_SKIP <= DOWN_HISTORY);

/// Samples of each decimation frame that are newer than the kept one.
const DECIMATION_SKIP: usize = 1;

const _: () = assert!(
    ((TAPS - 1) - (OVERSAMPLE_FACTOR - 1 - DECIMATION_SKIP)) % OVERSAMPLE_FACTOR == 0
);

/// Cutoff as a fraction of the oversampled rate: 0.9 × (0.5 / FACTOR).
const CUTOFF: f32 = 0.9 * 0.5 / OVERSAMPLE_FACTOR as f32;

/// Per-channel filter history.
#[derive(Debug, Clone)]
struct ChannelState {
    up: [f32; UP_HISTORY],
    up_pos: usize,
    down: [f32; DOWN_HISTORY],
    down_pos: usize,
}

impl ChannelState {
    fn new() -> Self {
        Self {
            up: [0.0; UP_HISTORY],
            up_pos: 0,
            down: [0.0; DOWN_HISTORY],
            down_pos: 0,
        }
    }

    fn clear(&mut self) {
        self.up.fill(0.0);
        self.down.fill(0.0);
        self.up_pos = 0;
        self.down_pos = 0;
    }
}

/// 4× polyphase FIR oversampler for a fixed number of channels.
///
/// All memory (filter histories and the oversampled scratch buffer) is
/// allocated by [`new`](Self::new). [`process_channel`](Self::process_channel)
/// does not allocate.
#[derive(Debug, Clone)]
pub struct Oversampler {
    coeffs: [f32; TAPS],
    channels: Vec<ChannelState>,
    scratch: Vec<f32>,
    max_block_size: usize,
}

impl Oversampler {
    /// Group delay in whole base-rate samples.
    pub const LATENCY_SAMPLES: usize =
        ((TAPS - 1) - (OVERSAMPLE_FACTOR - 1 - DECIMATION_SKIP)) / OVERSAMPLE_FACTOR;

    /// Group delay in base-rate samples.
    pub const LATENCY: f32 = Self::LATENCY_SAMPLES as f32;

    /// Allocate state for `num_channels` channels and blocks of up to
    /// `max_block_size` base-rate samples.
    pub fn new(num_channels: usize, max_block_size: usize) -> Self {
        let max_block_size = max_block_size.max(1);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            num_channels,
            max_block_size,
            taps = TAPS,
            latency = Self::LATENCY,
            "oversampler: allocated"
        );

        Self {
            coeffs: design_lowpass(),
            channels: vec![ChannelState::new(); num_channels],
            scratch: vec![0.0; max_block_size * OVERSAMPLE_FACTOR],
            max_block_size,
        }
    }

    /// Number of channels with allocated state.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Largest block handled in one pass; longer blocks are split.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Group delay in base-rate samples.
    pub fn latency_samples(&self) -> f32 {
        Self::LATENCY
    }

    /// Clear every channel's filter history.
    pub fn reset(&mut self) {
        for state in &mut self.channels {
            state.clear();
        }
        self.scratch.fill(0.0);
    }

    /// Upsample `block`, run `shaper` on the oversampled samples, and
    /// downsample the result back into `block`.
    ///
    /// `shaper` is called once per chunk of at most `max_block_size` input
    /// samples. A channel index without allocated state leaves `block`
    /// untouched.
    pub fn process_channel<F>(&mut self, channel: usize, block: &mut [f32], mut shaper: F)
    where
        F: FnMut(&mut [f32]),
    {
        let Self {
            coeffs,
            channels,
            scratch,
            max_block_size,
        } = self;

        let Some(state) = channels.get_mut(channel) else {
            debug_assert!(false, "oversampler channel {channel} not prepared");
            return;
        };

        for chunk in block.chunks_mut(*max_block_size) {
            let oversampled = &mut scratch[..chunk.len() * OVERSAMPLE_FACTOR];
            upsample(coeffs, state, chunk, oversampled);
            shaper(oversampled);
            downsample(coeffs, state, oversampled, chunk);
        }
    }
}

fn upsample(coeffs: &[f32; TAPS], state: &mut ChannelState, input: &[f32], output: &mut [f32]) {
    const MASK: usize = UP_HISTORY - 1;
    let gain = OVERSAMPLE_FACTOR as f32;

    for (x, frame) in input
        .iter()
        .zip(output.chunks_exact_mut(OVERSAMPLE_FACTOR))
    {
        state.up_pos = (state.up_pos + 1) & MASK;
        state.up[state.up_pos] = *x;

        for (phase, out) in frame.iter_mut().enumerate() {
            let mut acc = 0.0;
            let mut tap = phase;
            let mut k = 0;
            while tap < TAPS {
                acc += coeffs[tap] * state.up[(state.up_pos + UP_HISTORY - k) & MASK];
                tap += OVERSAMPLE_FACTOR;
                k += 1;
            }
            *out = acc * gain;
        }
    }
}

fn downsample(coeffs: &[f32; TAPS], state: &mut ChannelState, input: &[f32], output: &mut [f32]) {
    const MASK: usize = DOWN_HISTORY - 1;

    for (frame, out) in input
        .chunks_exact(OVERSAMPLE_FACTOR)
        .zip(output.iter_mut())
    {
        for &sample in frame {
            state.down_pos = (state.down_pos + 1) & MASK;
            state.down[state.down_pos] = sample;
        }

        let mut acc = 0.0;
        for (j, &c) in coeffs.iter().enumerate() {
            acc += c * state.down[(state.down_pos + DOWN_HISTORY - DECIMATION_SKIP - j) & MASK];
        }
        *out = crate::math::flush_denormal(acc);
    }
}

/// Blackman-windowed sinc low-pass, normalized to unity DC gain.
fn design_lowpass() -> [f32; TAPS] {
    let mut h = [0.0f32; TAPS];
    let m = (TAPS - 1) as f32;
    let center = m / 2.0;

    for (n, coeff) in h.iter_mut().enumerate() {
        let t = n as f32 - center;
        let sinc = if t == 0.0 {
            2.0 * CUTOFF
        } else {
            sinf(2.0 * PI * CUTOFF * t) / (PI * t)
        };
        let phase = 2.0 * PI * n as f32 / m;
        let window = 0.42 - 0.5 * cosf(phase) + 0.08 * cosf(2.0 * phase);
        *coeff = sinc * window;
    }

    let sum: f32 = h.iter().sum();
    for coeff in &mut h {
        *coeff /= sum;
    }
    h
}
