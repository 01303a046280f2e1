//! Serial port detection for the radio link
//!
//! This crate finds the serial port the radio is on: it enumerates ports,
//! filters them down to USB serial adapters, and probes each candidate at
//! a list of baud rates with the read-frequency command.
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_detect::{autodetect, DetectConfig};
//!
//! # async fn run() -> Result<(), rig_detect::DetectError> {
//! let link = autodetect(&DetectConfig::default()).await?;
//! println!("Using {} at {} baud", link.port, link.baud);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod probe;
pub mod scanner;

pub use error::DetectError;
pub use probe::{autodetect, probe_port, probe_stream, DetectConfig, DetectedLink};
pub use scanner::{candidate_ports, enumerate_ports, SerialPortInfo};
