//! Radio state machine
//!
//! This crate holds the canonical radio state and the only operations
//! allowed to mutate it. Three contexts call in concurrently: the UI
//! adapter, the HTTP control API, and the telemetry loop. All of them go
//! through a shared [`Rig`] handle, which serializes every operation as
//! one critical section over the [`RadioState`] aggregate.
//!
//! # Example
//!
//! ```rust
//! use rig_core::{Rig, Vfo};
//! use rig_protocol::Mode;
//!
//! let rig = Rig::new();
//! rig.set_frequency(Vfo::A, "14074000").unwrap();
//!
//! let snap = rig.snapshot();
//! assert_eq!(snap.frequency_a, "14.074.00");
//! assert_eq!(snap.mode_a, "USB");
//! ```

pub mod error;
pub mod rig;
pub mod state;

pub use error::RigError;
pub use rig::{LinkCommand, Rig};
pub use state::{
    Antenna, ConnectionInfo, Contour, Control, LinkMode, MemoryChannel, MemorySnapshot,
    RadioState, Snapshot, Vfo, APF_FREQUENCIES, MEMORY_CHANNELS, NR_FREQUENCIES,
};
