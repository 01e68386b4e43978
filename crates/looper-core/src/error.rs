//! Looper construction error types
//!
//! The per-frame path never fails: setters clamp and capacity is reported as
//! a boolean. These errors only come from wiring the engine to its buffers.

use thiserror::Error;

/// Errors that can occur while setting up a looper
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LooperError {
    /// A channel buffer with no capacity was supplied
    #[error("Channel buffer must hold at least one sample")]
    EmptyBuffer,

    /// Left and right buffers must have the same capacity
    #[error("Channel buffer length mismatch: left={left}, right={right}")]
    BufferLengthMismatch { left: usize, right: usize },

    /// Sample rate must be positive
    #[error("Invalid sample rate: {0}Hz")]
    InvalidSampleRate(u32),

    /// Buffer capacity exceeds what the index arithmetic supports
    #[error("Channel buffer too large: {0} samples")]
    BufferTooLarge(usize),
}

/// Result type for looper setup
pub type LooperResult<T> = Result<T, LooperError>;
