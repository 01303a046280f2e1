//! 5-byte CAT wire protocol
//!
//! Commands to the radio are always 5 bytes: four parameter bytes followed
//! by an opcode byte. Write commands produce no reply; the two read
//! commands produce fixed-length replies.
//!
//! ```text
//! [P1] [P2] [P3] [P4] [CMD]
//! ```
//!
//! | Command        | Bytes                      | Reply            |
//! |----------------|----------------------------|------------------|
//! | set frequency  | `[bcd0 bcd1 bcd2 bcd3 01]` | none             |
//! | set mode       | `[mode 00 00 00 07]`       | none             |
//! | read freq/mode | `[00 00 00 00 03]`         | 4 BCD + mode byte|
//! | read meter     | `[00 00 00 00 10]`         | 1 byte, 0-255    |

use crate::error::ParseError;
use crate::freq::{Frequency, Mode};

/// Every command is exactly 5 bytes
pub const COMMAND_LEN: usize = 5;
/// Reply length for read-frequency/mode
pub const FREQ_MODE_REPLY_LEN: usize = 5;
/// Reply length for read-meter
pub const METER_REPLY_LEN: usize = 1;

const OP_SET_FREQUENCY: u8 = 0x01;
const OP_READ_FREQ_MODE: u8 = 0x03;
const OP_SET_MODE: u8 = 0x07;
const OP_READ_METER: u8 = 0x10;

/// A command bound for the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCommand {
    SetFrequency { freq: Frequency },
    SetMode { mode: Mode },
    ReadFrequencyMode,
    ReadMeter,
}

impl WireCommand {
    /// Encode to the 5-byte wire form
    pub fn encode(&self) -> [u8; COMMAND_LEN] {
        match self {
            WireCommand::SetFrequency { freq } => {
                let bcd = freq.to_bcd();
                [bcd[0], bcd[1], bcd[2], bcd[3], OP_SET_FREQUENCY]
            }
            WireCommand::SetMode { mode } => [mode.to_wire(), 0, 0, 0, OP_SET_MODE],
            WireCommand::ReadFrequencyMode => [0, 0, 0, 0, OP_READ_FREQ_MODE],
            WireCommand::ReadMeter => [0, 0, 0, 0, OP_READ_METER],
        }
    }

    /// Reply length this command produces (0 for writes)
    pub fn reply_len(&self) -> usize {
        match self {
            WireCommand::SetFrequency { .. } | WireCommand::SetMode { .. } => 0,
            WireCommand::ReadFrequencyMode => FREQ_MODE_REPLY_LEN,
            WireCommand::ReadMeter => METER_REPLY_LEN,
        }
    }
}

/// Decoded read-frequency/mode reply
///
/// `mode` is `None` when the radio reports a data mode the panel does not
/// expose; callers keep their previously stored mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyModeReply {
    pub freq: Frequency,
    pub mode: Option<Mode>,
}

impl FrequencyModeReply {
    /// Parse a 5-byte reply frame
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < FREQ_MODE_REPLY_LEN {
            return Err(ParseError::ShortReply {
                expected: FREQ_MODE_REPLY_LEN,
                actual: bytes.len(),
            });
        }
        let freq = Frequency::from_bcd([bytes[0], bytes[1], bytes[2], bytes[3]])?;
        let mode = Mode::from_wire(bytes[4]);
        Ok(Self { freq, mode })
    }
}

/// Parse a 1-byte meter reply
pub fn parse_meter_reply(bytes: &[u8]) -> Result<u8, ParseError> {
    match bytes.first() {
        Some(&level) => Ok(level),
        None => Err(ParseError::ShortReply {
            expected: METER_REPLY_LEN,
            actual: 0,
        }),
    }
}

/// Streaming reply accumulator
///
/// Serial reads deliver bytes in arbitrary chunks; the codec buffers them
/// and yields complete frames of the expected reply length.
pub struct WireCodec {
    buffer: Vec<u8>,
    expected_reply_len: Option<usize>,
}

impl WireCodec {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(16),
            expected_reply_len: None,
        }
    }

    /// Arm the codec for the reply of the given command
    pub fn expect_reply(&mut self, len: usize) {
        self.expected_reply_len = Some(len);
    }

    /// Feed raw bytes from the serial stream
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete reply frame, if buffered
    pub fn next_reply(&mut self) -> Option<Vec<u8>> {
        let len = self.expected_reply_len?;
        if self.buffer.len() < len {
            return None;
        }
        self.expected_reply_len = None;
        Some(self.buffer.drain(..len).collect())
    }

    /// Drop buffered bytes and any armed expectation (after an I/O error
    /// the stream position is unknown)
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.expected_reply_len = None;
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}
