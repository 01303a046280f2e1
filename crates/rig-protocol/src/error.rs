//! Error types for CAT frequency and wire parsing

use thiserror::Error;

/// Errors that can occur while parsing frequencies or wire replies
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid frequency value (bad digits or outside the 1.8-30 MHz band)
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Invalid BCD encoding
    #[error("invalid BCD nibble: {0}")]
    InvalidBcd(u8),

    /// Invalid mode value
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Reply shorter than the expected frame
    #[error("short reply: expected {expected} bytes, got {actual}")]
    ShortReply { expected: usize, actual: usize },
}
