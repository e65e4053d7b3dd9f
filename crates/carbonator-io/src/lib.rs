//! Audio file I/O for the Carbonator engine.
//!
//! WAV files are read into and written from [`PlanarBuffer`]s: one `Vec<f32>`
//! per channel, the layout `carbonator_effects::EffectsChain::process` works on.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use carbonator_io::{read_wav, write_wav};
//!
//! let (mut buffer, spec) = read_wav("input.wav")?;
//! for channel in buffer.channels_mut() {
//!     channel.iter_mut().for_each(|s| *s *= 0.5);
//! }
//! write_wav("output.wav", &buffer, spec)?;
//! ```

mod buffer;
mod wav;

pub use buffer::PlanarBuffer;
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Buffer channel layout does not match the file spec.
    #[error("Channel mismatch: expected {expected} channels of equal length, found {found}")]
    MismatchedChannels {
        /// Channels the spec declares.
        expected: usize,
        /// Channels actually supplied.
        found: usize,
    },

    /// The requested bit depth cannot be written.
    #[error("Unsupported bit depth: {0} (expected 16, 24 or 32)")]
    UnsupportedBitDepth(u16),
}

/// Convenience result type for audio file operations.
pub type Result<T> = std::result::Result<T, Error>;
