//! Shared rig handle
//!
//! [`Rig`] is the one way the UI adapter, the HTTP API, and the telemetry
//! loop reach [`RadioState`]. Each operation takes the lock for exactly
//! its critical section; nothing awaits while holding it, so no caller
//! can be stalled by another context.
//!
//! Frequency and mode mutations are followed by a best-effort push to the
//! link task over a bounded channel. A full or closed channel drops the
//! push with a log line and never fails the caller; the radio catches up
//! on the next poll.

use std::sync::{Arc, Mutex, MutexGuard};

use rig_protocol::{Frequency, Mode};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::RigError;
use crate::state::{
    Antenna, ConnectionInfo, Contour, Control, MemoryChannel, RadioState, Snapshot, Vfo,
};

/// Commands the link task drains and writes to the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    /// Push a frequency, followed by its mode
    SetFrequency { freq: Frequency, mode: Mode },
    /// Push a mode change alone
    SetMode { mode: Mode },
    /// Stop the link task
    Shutdown,
}

/// Cloneable handle to the shared radio state
#[derive(Clone)]
pub struct Rig {
    state: Arc<Mutex<RadioState>>,
    link_tx: Option<mpsc::Sender<LinkCommand>>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_state(RadioState::new())
    }

    pub fn with_state(state: RadioState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            link_tx: None,
        }
    }

    /// Attach the link command channel; call before handing out clones
    pub fn set_link(&mut self, tx: mpsc::Sender<LinkCommand>) {
        self.link_tx = Some(tx);
    }

    fn lock(&self) -> MutexGuard<'_, RadioState> {
        // A panic mid-operation cannot leave a torn write: every operation
        // validates before mutating. Recover the guard rather than spread
        // the poison.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn push(&self, cmd: LinkCommand) {
        if let Some(tx) = &self.link_tx {
            if let Err(e) = tx.try_send(cmd) {
                debug!("link push dropped: {}", e);
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn set_frequency(&self, vfo: Vfo, raw: &str) -> Result<Frequency, RigError> {
        let (freq, mode) = {
            let mut state = self.lock();
            let freq = state.set_frequency(vfo, raw)?;
            (freq, state.mode(vfo))
        };
        self.push(LinkCommand::SetFrequency { freq, mode });
        Ok(freq)
    }

    pub fn set_frequency_mhz(&self, vfo: Vfo, mhz: f64) -> Result<Frequency, RigError> {
        let (freq, mode) = {
            let mut state = self.lock();
            let freq = state.set_frequency_mhz(vfo, mhz)?;
            (freq, state.mode(vfo))
        };
        self.push(LinkCommand::SetFrequency { freq, mode });
        Ok(freq)
    }

    pub fn adjust_frequency(&self, vfo: Vfo, delta_khz: f64) -> Frequency {
        let (freq, mode) = {
            let mut state = self.lock();
            let freq = state.adjust_frequency(vfo, delta_khz);
            (freq, state.mode(vfo))
        };
        self.push(LinkCommand::SetFrequency { freq, mode });
        freq
    }

    pub fn set_mode(&self, vfo: Vfo, mode: Mode) {
        self.lock().set_mode(vfo, mode);
        self.push(LinkCommand::SetMode { mode });
    }

    pub fn switch_vfo(&self) -> Vfo {
        self.lock().switch_vfo()
    }

    pub fn set_active_vfo(&self, vfo: Vfo) {
        self.lock().set_active_vfo(vfo);
    }

    pub fn toggle_split(&self) -> bool {
        self.lock().toggle_split()
    }

    pub fn set_split(&self, enabled: bool) {
        self.lock().set_split(enabled);
    }

    pub fn set_transmitting(&self, transmitting: bool) {
        self.lock().set_transmitting(transmitting);
    }

    pub fn toggle_transmitting(&self) -> bool {
        self.lock().toggle_transmitting()
    }

    pub fn set_control(&self, control: Control, value: i64) -> Result<u8, RigError> {
        self.lock().set_control(control, value)
    }

    pub fn set_antenna(&self, antenna: Antenna) {
        self.lock().set_antenna(antenna);
    }

    pub fn set_tuner_active(&self, active: bool) {
        self.lock().set_tuner_active(active);
    }

    pub fn select_apf(&self, freq: u16) -> Result<(), RigError> {
        self.lock().select_apf(freq)
    }

    pub fn clear_apf(&self) {
        self.lock().clear_apf();
    }

    pub fn select_nr(&self, freq: u16) -> Result<(), RigError> {
        self.lock().select_nr(freq)
    }

    pub fn clear_nr(&self) {
        self.lock().clear_nr();
    }

    pub fn cycle_contour(&self) -> Contour {
        self.lock().cycle_contour()
    }

    pub fn memory_channel(&self, index: usize) -> Result<MemoryChannel, RigError> {
        self.lock().memory_channel(index)
    }

    pub fn store_memory(&self, index: usize) -> Result<(), RigError> {
        self.lock().store_memory(index)
    }

    pub fn recall_memory(&self, index: usize) -> Result<MemoryChannel, RigError> {
        let channel = self.lock().recall_memory(index)?;
        self.push(LinkCommand::SetFrequency {
            freq: channel.freq_a,
            mode: channel.mode_a,
        });
        Ok(channel)
    }

    /// Telemetry loop entry point for meter values
    pub fn apply_telemetry(&self, signal: Option<u8>, power_out: Option<u8>, swr: Option<u8>) {
        self.lock().apply_telemetry(signal, power_out, swr);
    }

    /// Telemetry loop entry point for read-frequency replies
    pub fn apply_link_report(&self, freq: Frequency, mode: Option<Mode>) {
        self.lock().apply_link_report(freq, mode);
    }

    /// Link task entry point for connection status changes
    pub fn set_connection(&self, connection: ConnectionInfo) {
        self.lock().set_connection(connection);
    }

    /// Ask the link task to stop; used at process shutdown
    pub async fn shutdown_link(&self) {
        if let Some(tx) = &self.link_tx {
            let _ = tx.send(LinkCommand::Shutdown).await;
        }
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_frequency_pushes_freq_then_mode() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut rig = Rig::new();
        rig.set_link(tx);

        let freq = rig.set_frequency(Vfo::A, "7030000").unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            LinkCommand::SetFrequency {
                freq,
                mode: Mode::Lsb
            }
        );
    }

    #[tokio::test]
    async fn test_full_channel_never_fails_caller() {
        let (tx, _rx) = mpsc::channel(1);
        let mut rig = Rig::new();
        rig.set_link(tx);

        // Second push lands on a full channel and is dropped
        rig.set_frequency(Vfo::A, "7030000").unwrap();
        let freq = rig.set_frequency(Vfo::A, "14074000").unwrap();
        assert_eq!(freq.display(), "14.074.00");
    }

    #[tokio::test]
    async fn test_recall_pushes_channel_a() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut rig = Rig::new();
        rig.set_link(tx);

        rig.set_frequency(Vfo::A, "7030000").unwrap();
        rig.set_mode(Vfo::A, Mode::Cw);
        rig.store_memory(2).unwrap();
        rig.set_frequency(Vfo::A, "14074000").unwrap();

        let channel = rig.recall_memory(2).unwrap();
        assert_eq!(channel.mode_a, Mode::Cw);

        let mut last = None;
        while let Ok(cmd) = rx.try_recv() {
            last = Some(cmd);
        }
        assert_eq!(
            last,
            Some(LinkCommand::SetFrequency {
                freq: channel.freq_a,
                mode: Mode::Cw
            })
        );
    }

    #[test]
    fn test_operations_without_link() {
        let rig = Rig::new();
        rig.set_frequency(Vfo::B, "21200000").unwrap();
        assert_eq!(rig.snapshot().frequency_b, "21.200.00");
    }
}
