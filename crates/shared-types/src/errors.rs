//! # Error Types
//!
//! Errors shared across crates.

use std::fmt;

use thiserror::Error;

/// Errors raised while decoding wire bytes into chain entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input was empty.
    #[error("Empty input")]
    Empty,

    /// Input exceeds the configured size bound.
    #[error("Encoded block too large: {size} bytes > {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    /// Bytes did not decode into the expected structure.
    #[error("Decoding failed: {0}")]
    Decode(String),

    /// Encoding failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Error indicating an expected value was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mismatch<T> {
    /// Value expected.
    pub expected: T,
    /// Value found.
    pub found: T,
}

impl<T: fmt::Debug> fmt::Display for Mismatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {:?}, found {:?}", self.expected, self.found)
    }
}

/// Error indicating a value was out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutOfBounds<T> {
    /// Minimum allowed value.
    pub min: Option<T>,
    /// Maximum allowed value.
    pub max: Option<T>,
    /// Value found.
    pub found: T,
}

impl<T: fmt::Debug> fmt::Display for OutOfBounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, "min={:?}, max={:?}", min, max)?,
            (Some(min), None) => write!(f, "min={:?}", min)?,
            (None, Some(max)) => write!(f, "max={:?}", max)?,
            (None, None) => {}
        }
        write!(f, ", found={:?}", self.found)
    }
}
