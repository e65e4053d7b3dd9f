//! Error types for engine configuration.
//!
//! Only configuration paths return errors. Audio processing is infallible:
//! degenerate numbers are clamped or flushed where they arise.

use thiserror::Error;

/// Errors reported while configuring the engine.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// Sample rate is zero, negative or not finite.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// The engine needs at least one channel.
    #[error("invalid channel count: {0}")]
    InvalidChannelCount(usize),

    /// Maximum block size must be at least one sample.
    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    /// Flavor index outside `0..5`.
    #[error("invalid flavor index: {0}")]
    InvalidFlavor(u8),
}

/// Convenience result type for engine configuration.
pub type Result<T> = core::result::Result<T, Error>;
