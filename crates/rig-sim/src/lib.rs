//! Simulated radio telemetry
//!
//! When no radio is attached the telemetry loop runs against a
//! [`MeterSimulator`] instead of the serial link. The simulator produces
//! plausible S-meter, power, and SWR readings from the same control
//! settings a real radio would react to; no I/O happens anywhere in this
//! crate.

pub mod meter;

pub use meter::{MeterReadings, MeterSimulator, SimInputs};
