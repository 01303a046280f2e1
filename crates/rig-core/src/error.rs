//! Error types for radio state operations

use rig_protocol::ParseError;
use thiserror::Error;

/// Errors that can occur in radio state operations
///
/// None of these are fatal: a failed operation leaves the state exactly
/// as it was and is always safely retryable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RigError {
    /// Unparsable or out-of-band frequency
    #[error("invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Mode is not one of LSB/USB/CW/AM/FM
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// VFO is not A or B
    #[error("invalid VFO: {0}")]
    InvalidVfo(String),

    /// Memory channel index outside 0-9
    #[error("invalid memory channel: {0}")]
    InvalidChannelIndex(i64),

    /// Control value non-integer or outside its range
    #[error("invalid value for {name}: {reason}")]
    InvalidControlValue { name: String, reason: String },

    /// Unparseable enable flag
    #[error("invalid boolean: {0}")]
    InvalidBoolean(String),

    /// Serial exchange exceeded its deadline
    #[error("transport timeout")]
    TransportTimeout,

    /// Serial I/O failure
    #[error("transport I/O error: {0}")]
    TransportIo(String),
}

impl From<ParseError> for RigError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidMode(m) => RigError::InvalidMode(m),
            other => RigError::InvalidFrequency(other.to_string()),
        }
    }
}
