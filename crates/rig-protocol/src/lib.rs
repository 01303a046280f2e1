//! Frequency codec and CAT wire protocol
//!
//! This crate is the only place frequency values are parsed, formatted, or
//! band-validated, and the only place the 5-byte CAT wire format is encoded
//! or decoded.
//!
//! - [`Frequency`]: band-validated frequency in 10 Hz units with display
//!   formatting and packed-BCD conversion
//! - [`Mode`]: the five operating modes and their wire byte table
//! - [`wire`]: the 5-byte command layer and a streaming reply codec
//!
//! # Example
//!
//! ```rust
//! use rig_protocol::{Frequency, Mode, WireCommand};
//!
//! let freq = Frequency::parse_display("14074000").unwrap();
//! assert_eq!(freq.display(), "14.074.00");
//! assert_eq!(freq.infer_mode(), Mode::Usb);
//!
//! let cmd = WireCommand::SetFrequency { freq };
//! assert_eq!(cmd.encode(), [0x01, 0x40, 0x74, 0x00, 0x01]);
//! ```

pub mod error;
pub mod freq;
pub mod wire;

pub use error::ParseError;
pub use freq::{Frequency, Mode, BAND_MAX, BAND_MIN};
pub use wire::{FrequencyModeReply, WireCodec, WireCommand};
