//! Radio state tracking
//!
//! [`RadioState`] is the single source of truth for every tunable and
//! derived value: two VFOs, gains, tone controls, filters, meters, memory
//! channels, and the link status. All mutation goes through the operation
//! methods here; each validates fully before touching any field, so a
//! failed call leaves the aggregate exactly as it was.

use std::str::FromStr;

use rig_protocol::{Frequency, Mode};
use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Number of memory channels
pub const MEMORY_CHANNELS: usize = 10;

/// APF filter frequencies, Hz
pub const APF_FREQUENCIES: [u16; 5] = [250, 500, 1000, 1500, 2000];

/// NR filter frequencies, Hz
pub const NR_FREQUENCIES: [u16; 5] = [500, 1000, 1500, 2000, 3000];

/// VFO selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vfo {
    A,
    B,
}

impl Vfo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vfo::A => "A",
            Vfo::B => "B",
        }
    }

    pub fn other(&self) -> Vfo {
        match self {
            Vfo::A => Vfo::B,
            Vfo::B => Vfo::A,
        }
    }
}

impl FromStr for Vfo {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Vfo::A),
            "B" => Ok(Vfo::B),
            _ => Err(RigError::InvalidVfo(s.to_string())),
        }
    }
}

/// Antenna selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antenna {
    Ant1,
    Ant2,
}

impl Antenna {
    pub fn as_number(&self) -> u8 {
        match self {
            Antenna::Ant1 => 1,
            Antenna::Ant2 => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Antenna> {
        match n {
            1 => Some(Antenna::Ant1),
            2 => Some(Antenna::Ant2),
            _ => None,
        }
    }
}

/// Contour filter mode, cycled OFF -> LOW_CUT -> MID_CUT -> HIGH_CUT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Contour {
    #[default]
    Off,
    LowCut,
    MidCut,
    HighCut,
}

impl Contour {
    pub fn next(&self) -> Contour {
        match self {
            Contour::Off => Contour::LowCut,
            Contour::LowCut => Contour::MidCut,
            Contour::MidCut => Contour::HighCut,
            Contour::HighCut => Contour::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Contour::Off => "OFF",
            Contour::LowCut => "LOW_CUT",
            Contour::MidCut => "MID_CUT",
            Contour::HighCut => "HIGH_CUT",
        }
    }
}

/// The seven bounded 0-100 controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    AfGain,
    SubAfGain,
    RfGain,
    PowerLevel,
    Shift,
    Width,
    Notch,
}

impl Control {
    /// All controls, in snapshot order
    pub const ALL: [Control; 7] = [
        Control::AfGain,
        Control::SubAfGain,
        Control::RfGain,
        Control::PowerLevel,
        Control::Shift,
        Control::Width,
        Control::Notch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Control::AfGain => "af_gain",
            Control::SubAfGain => "sub_af_gain",
            Control::RfGain => "rf_gain",
            Control::PowerLevel => "power_level",
            Control::Shift => "shift",
            Control::Width => "width",
            Control::Notch => "notch",
        }
    }

    pub fn from_name(name: &str) -> Option<Control> {
        Control::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// One stored memory channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryChannel {
    pub freq_a: Frequency,
    pub mode_a: Mode,
    pub freq_b: Frequency,
    pub mode_b: Mode,
}

impl MemoryChannel {
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            frequency_a: self.freq_a.display(),
            mode_a: self.mode_a.as_str().to_string(),
            frequency_b: self.freq_b.display(),
            mode_b: self.mode_b.as_str().to_string(),
        }
    }
}

/// Serializable view of a memory channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub frequency_a: String,
    pub mode_a: String,
    pub frequency_b: String,
    pub mode_b: String,
}

/// Which transport variant the link task is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    Mock,
    Serial,
}

/// Connection status, mirrored by the link task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub link: LinkMode,
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub connected: bool,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            link: LinkMode::Mock,
            port: None,
            baud: None,
            connected: false,
        }
    }
}

/// The radio state aggregate
#[derive(Debug, Clone)]
pub struct RadioState {
    freq_a: Frequency,
    mode_a: Mode,
    freq_b: Frequency,
    mode_b: Mode,
    active_vfo: Vfo,
    transmitting: bool,
    split_enabled: bool,
    af_gain: u8,
    sub_af_gain: u8,
    rf_gain: u8,
    power_level: u8,
    shift: u8,
    width: u8,
    notch: u8,
    meter_signal: u8,
    meter_power: u8,
    meter_swr: u8,
    antenna: Antenna,
    tuner_active: bool,
    apf: Option<u16>,
    nr: Option<u16>,
    contour: Contour,
    memory: [MemoryChannel; MEMORY_CHANNELS],
    selected_memory: usize,
    connection: ConnectionInfo,
}

impl RadioState {
    /// Fresh state with the front-panel defaults
    pub fn new() -> Self {
        let freq_a = Frequency::from_units(1_432_000).expect("default A in band");
        let freq_b = Frequency::from_units(1_812_000).expect("default B in band");

        Self {
            freq_a,
            mode_a: Mode::Usb,
            freq_b,
            mode_b: Mode::Lsb,
            active_vfo: Vfo::A,
            transmitting: false,
            split_enabled: false,
            af_gain: 50,
            sub_af_gain: 50,
            rf_gain: 80,
            power_level: 100,
            shift: 50,
            width: 50,
            notch: 50,
            meter_signal: 0,
            meter_power: 0,
            meter_swr: 0,
            antenna: Antenna::Ant1,
            tuner_active: false,
            apf: None,
            nr: None,
            contour: Contour::Off,
            memory: Self::seed_memory(),
            selected_memory: 0,
            connection: ConnectionInfo::default(),
        }
    }

    /// Deterministic ladder: channel n starts at 1.900.00 + n * 500 kHz
    fn seed_memory() -> [MemoryChannel; MEMORY_CHANNELS] {
        std::array::from_fn(|n| {
            let units = 190_000 + n as u32 * 50_000;
            let freq = Frequency::from_units(units).expect("memory ladder in band");
            let mode = freq.infer_mode();
            MemoryChannel {
                freq_a: freq,
                mode_a: mode,
                freq_b: freq,
                mode_b: mode,
            }
        })
    }

    pub fn frequency(&self, vfo: Vfo) -> Frequency {
        match vfo {
            Vfo::A => self.freq_a,
            Vfo::B => self.freq_b,
        }
    }

    pub fn mode(&self, vfo: Vfo) -> Mode {
        match vfo {
            Vfo::A => self.mode_a,
            Vfo::B => self.mode_b,
        }
    }

    pub fn active_vfo(&self) -> Vfo {
        self.active_vfo
    }

    pub fn split_enabled(&self) -> bool {
        self.split_enabled
    }

    pub fn transmitting(&self) -> bool {
        self.transmitting
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    pub fn control(&self, control: Control) -> u8 {
        match control {
            Control::AfGain => self.af_gain,
            Control::SubAfGain => self.sub_af_gain,
            Control::RfGain => self.rf_gain,
            Control::PowerLevel => self.power_level,
            Control::Shift => self.shift,
            Control::Width => self.width,
            Control::Notch => self.notch,
        }
    }

    fn store_frequency(&mut self, vfo: Vfo, freq: Frequency) {
        match vfo {
            Vfo::A => {
                self.freq_a = freq;
                self.mode_a = freq.infer_mode();
            }
            Vfo::B => {
                self.freq_b = freq;
                self.mode_b = freq.infer_mode();
            }
        }
    }

    /// Parse and set a frequency; rejects invalid or out-of-band input
    /// and re-infers the VFO's mode on success
    pub fn set_frequency(&mut self, vfo: Vfo, raw: &str) -> Result<Frequency, RigError> {
        let freq = Frequency::parse_display(raw)?;
        self.store_frequency(vfo, freq);
        Ok(freq)
    }

    /// Set a frequency from a numeric MHz value
    pub fn set_frequency_mhz(&mut self, vfo: Vfo, mhz: f64) -> Result<Frequency, RigError> {
        let freq = Frequency::parse_mhz(mhz)?;
        self.store_frequency(vfo, freq);
        Ok(freq)
    }

    /// Nudge a frequency by a kHz delta; saturates at the band edges
    /// instead of rejecting, so knob turns always succeed
    pub fn adjust_frequency(&mut self, vfo: Vfo, delta_khz: f64) -> Frequency {
        let freq = self.frequency(vfo).saturating_add_khz(delta_khz);
        self.store_frequency(vfo, freq);
        freq
    }

    pub fn set_mode(&mut self, vfo: Vfo, mode: Mode) {
        match vfo {
            Vfo::A => self.mode_a = mode,
            Vfo::B => self.mode_b = mode,
        }
    }

    pub fn switch_vfo(&mut self) -> Vfo {
        self.active_vfo = self.active_vfo.other();
        self.active_vfo
    }

    pub fn set_active_vfo(&mut self, vfo: Vfo) {
        self.active_vfo = vfo;
    }

    pub fn toggle_split(&mut self) -> bool {
        self.split_enabled = !self.split_enabled;
        self.split_enabled
    }

    /// Split is declarative: stored and reported, never acted on by the
    /// transport
    pub fn set_split(&mut self, enabled: bool) {
        self.split_enabled = enabled;
    }

    pub fn set_transmitting(&mut self, transmitting: bool) {
        self.transmitting = transmitting;
    }

    pub fn toggle_transmitting(&mut self) -> bool {
        self.transmitting = !self.transmitting;
        self.transmitting
    }

    /// Set one of the seven bounded controls; rejects values outside 0-100
    pub fn set_control(&mut self, control: Control, value: i64) -> Result<u8, RigError> {
        if !(0..=100).contains(&value) {
            return Err(RigError::InvalidControlValue {
                name: control.name().to_string(),
                reason: format!("{} is outside 0-100", value),
            });
        }
        let value = value as u8;
        match control {
            Control::AfGain => self.af_gain = value,
            Control::SubAfGain => self.sub_af_gain = value,
            Control::RfGain => self.rf_gain = value,
            Control::PowerLevel => self.power_level = value,
            Control::Shift => self.shift = value,
            Control::Width => self.width = value,
            Control::Notch => self.notch = value,
        }
        Ok(value)
    }

    pub fn set_antenna(&mut self, antenna: Antenna) {
        self.antenna = antenna;
    }

    pub fn set_tuner_active(&mut self, active: bool) {
        self.tuner_active = active;
    }

    /// Select an APF filter; only one can be active at a time
    pub fn select_apf(&mut self, freq: u16) -> Result<(), RigError> {
        if !APF_FREQUENCIES.contains(&freq) {
            return Err(RigError::InvalidControlValue {
                name: "apf".to_string(),
                reason: format!("{} Hz is not an APF filter", freq),
            });
        }
        self.apf = Some(freq);
        Ok(())
    }

    pub fn clear_apf(&mut self) {
        self.apf = None;
    }

    /// Select an NR filter; only one can be active at a time
    pub fn select_nr(&mut self, freq: u16) -> Result<(), RigError> {
        if !NR_FREQUENCIES.contains(&freq) {
            return Err(RigError::InvalidControlValue {
                name: "nr".to_string(),
                reason: format!("{} Hz is not an NR filter", freq),
            });
        }
        self.nr = Some(freq);
        Ok(())
    }

    pub fn clear_nr(&mut self) {
        self.nr = None;
    }

    pub fn cycle_contour(&mut self) -> Contour {
        self.contour = self.contour.next();
        self.contour
    }

    pub fn memory_channel(&self, index: usize) -> Result<MemoryChannel, RigError> {
        self.memory
            .get(index)
            .copied()
            .ok_or(RigError::InvalidChannelIndex(index as i64))
    }

    /// Copy current A/B frequency and mode into a memory channel
    pub fn store_memory(&mut self, index: usize) -> Result<(), RigError> {
        if index >= MEMORY_CHANNELS {
            return Err(RigError::InvalidChannelIndex(index as i64));
        }
        self.memory[index] = MemoryChannel {
            freq_a: self.freq_a,
            mode_a: self.mode_a,
            freq_b: self.freq_b,
            mode_b: self.mode_b,
        };
        self.selected_memory = index;
        Ok(())
    }

    /// Restore A/B frequency and mode from a memory channel
    pub fn recall_memory(&mut self, index: usize) -> Result<MemoryChannel, RigError> {
        let channel = self.memory_channel(index)?;
        self.freq_a = channel.freq_a;
        self.mode_a = channel.mode_a;
        self.freq_b = channel.freq_b;
        self.mode_b = channel.mode_b;
        self.selected_memory = index;
        Ok(channel)
    }

    /// Write meter fields; the only mutator the telemetry loop uses for
    /// meters. Values are already bounded by their type.
    pub fn apply_telemetry(&mut self, signal: Option<u8>, power_out: Option<u8>, swr: Option<u8>) {
        if let Some(signal) = signal {
            self.meter_signal = signal;
        }
        if let Some(power_out) = power_out {
            self.meter_power = power_out;
        }
        if let Some(swr) = swr {
            self.meter_swr = swr;
        }
    }

    /// Ingest a read-frequency reply from the radio
    ///
    /// The reply addresses the main VFO. A data-mode report (`None`)
    /// keeps the previously stored mode.
    pub fn apply_link_report(&mut self, freq: Frequency, mode: Option<Mode>) {
        self.freq_a = freq;
        if let Some(mode) = mode {
            self.mode_a = mode;
        }
    }

    /// Mirror the link task's connection status
    pub fn set_connection(&mut self, connection: ConnectionInfo) {
        self.connection = connection;
    }

    /// Immutable, serializable copy of the whole aggregate
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            frequency_a: self.freq_a.display(),
            mode_a: self.mode_a.as_str().to_string(),
            frequency_b: self.freq_b.display(),
            mode_b: self.mode_b.as_str().to_string(),
            active_vfo: self.active_vfo.as_str().to_string(),
            split_enabled: self.split_enabled,
            transmitting: self.transmitting,
            af_gain: self.af_gain,
            sub_af_gain: self.sub_af_gain,
            rf_gain: self.rf_gain,
            power_level: self.power_level,
            shift: self.shift,
            width: self.width,
            notch: self.notch,
            meter_level: self.meter_signal,
            power_meter_level: self.meter_power,
            swr_level: self.meter_swr,
            antenna: self.antenna.as_number(),
            tuner_active: self.tuner_active,
            apf: self.apf,
            nr: self.nr,
            contour: self.contour.as_str().to_string(),
            selected_memory: self.selected_memory,
            memory: self.memory.iter().map(MemoryChannel::snapshot).collect(),
            connection: self.connection.clone(),
        }
    }
}

impl Default for RadioState {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of [`RadioState`], also the JSON shape of
/// `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub frequency_a: String,
    pub mode_a: String,
    pub frequency_b: String,
    pub mode_b: String,
    pub active_vfo: String,
    pub split_enabled: bool,
    pub transmitting: bool,
    pub af_gain: u8,
    pub sub_af_gain: u8,
    pub rf_gain: u8,
    pub power_level: u8,
    pub shift: u8,
    pub width: u8,
    pub notch: u8,
    pub meter_level: u8,
    pub power_meter_level: u8,
    pub swr_level: u8,
    pub antenna: u8,
    pub tuner_active: bool,
    pub apf: Option<u16>,
    pub nr: Option<u16>,
    pub contour: String,
    pub selected_memory: usize,
    pub memory: Vec<MemorySnapshot>,
    pub connection: ConnectionInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = RadioState::new();
        assert_eq!(state.frequency(Vfo::A).display(), "14.320.00");
        assert_eq!(state.mode(Vfo::A), Mode::Usb);
        assert_eq!(state.frequency(Vfo::B).display(), "18.120.00");
        assert_eq!(state.mode(Vfo::B), Mode::Lsb);
        assert_eq!(state.active_vfo(), Vfo::A);
        assert_eq!(state.control(Control::RfGain), 80);
        assert_eq!(state.control(Control::PowerLevel), 100);
        assert!(!state.split_enabled());
    }

    #[test]
    fn test_memory_ladder_seed() {
        let state = RadioState::new();
        let ch0 = state.memory_channel(0).unwrap();
        assert_eq!(ch0.freq_a.display(), "1.900.00");
        assert_eq!(ch0.mode_a, Mode::Lsb);
        let ch9 = state.memory_channel(9).unwrap();
        assert_eq!(ch9.freq_a.display(), "6.400.00");
        assert_eq!(ch9.freq_b, ch9.freq_a);
    }

    #[test]
    fn test_set_frequency_reinfers_mode() {
        let mut state = RadioState::new();
        state.set_mode(Vfo::A, Mode::Cw);
        let freq = state.set_frequency(Vfo::A, "7030000").unwrap();
        assert_eq!(freq.display(), "7.030.00");
        assert_eq!(state.mode(Vfo::A), Mode::Lsb);

        state.set_frequency(Vfo::A, "14074000").unwrap();
        assert_eq!(state.mode(Vfo::A), Mode::Usb);
    }

    #[test]
    fn test_set_frequency_rejects_leaving_state() {
        let mut state = RadioState::new();
        let before = state.frequency(Vfo::A);
        assert!(state.set_frequency(Vfo::A, "99999999").is_err());
        assert!(state.set_frequency(Vfo::A, "junk").is_err());
        assert_eq!(state.frequency(Vfo::A), before);
    }

    #[test]
    fn test_adjust_clamps_instead_of_rejecting() {
        let mut state = RadioState::new();
        let freq = state.adjust_frequency(Vfo::A, 1e9);
        assert_eq!(freq.as_units(), rig_protocol::BAND_MAX);
        let freq = state.adjust_frequency(Vfo::A, -1e9);
        assert_eq!(freq.as_units(), rig_protocol::BAND_MIN);
        assert_eq!(state.mode(Vfo::A), Mode::Lsb);
    }

    #[test]
    fn test_control_bounds() {
        let mut state = RadioState::new();
        assert_eq!(state.set_control(Control::RfGain, 90).unwrap(), 90);
        assert!(state.set_control(Control::RfGain, 150).is_err());
        assert_eq!(state.control(Control::RfGain), 90);
        assert!(state.set_control(Control::Shift, -1).is_err());
    }

    #[test]
    fn test_apf_single_active() {
        let mut state = RadioState::new();
        state.select_apf(500).unwrap();
        state.select_apf(1500).unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.apf, Some(1500));
        assert!(state.select_apf(300).is_err());
    }

    #[test]
    fn test_nr_off_state() {
        let mut state = RadioState::new();
        state.select_nr(3000).unwrap();
        assert_eq!(state.snapshot().nr, Some(3000));
        state.clear_nr();
        assert_eq!(state.snapshot().nr, None);
        // 250 is an APF frequency, not NR
        assert!(state.select_nr(250).is_err());
    }

    #[test]
    fn test_contour_cycles_mod_4() {
        let mut state = RadioState::new();
        assert_eq!(state.cycle_contour(), Contour::LowCut);
        assert_eq!(state.cycle_contour(), Contour::MidCut);
        assert_eq!(state.cycle_contour(), Contour::HighCut);
        assert_eq!(state.cycle_contour(), Contour::Off);
    }

    #[test]
    fn test_antenna_and_tuner_setters() {
        let mut state = RadioState::new();
        assert_eq!(state.snapshot().antenna, 1);
        assert!(!state.snapshot().tuner_active);

        state.set_antenna(Antenna::Ant2);
        state.set_tuner_active(true);
        let snap = state.snapshot();
        assert_eq!(snap.antenna, 2);
        assert!(snap.tuner_active);

        state.set_antenna(Antenna::Ant1);
        assert_eq!(state.snapshot().antenna, 1);
        assert_eq!(Antenna::from_number(3), None);
    }

    #[test]
    fn test_store_recall_exact() {
        let mut state = RadioState::new();
        state.set_frequency(Vfo::A, "7030000").unwrap();
        state.set_mode(Vfo::A, Mode::Cw);
        state.store_memory(3).unwrap();

        // Mutate everything in between
        state.set_frequency(Vfo::A, "28500000").unwrap();
        state.set_frequency(Vfo::B, "21200000").unwrap();
        state.switch_vfo();

        let recalled = state.recall_memory(3).unwrap();
        assert_eq!(recalled.freq_a.display(), "7.030.00");
        assert_eq!(recalled.mode_a, Mode::Cw);
        assert_eq!(state.frequency(Vfo::A).display(), "7.030.00");
        assert_eq!(state.mode(Vfo::A), Mode::Cw);
        assert_eq!(state.snapshot().selected_memory, 3);
    }

    #[test]
    fn test_memory_index_bounds() {
        let mut state = RadioState::new();
        assert!(state.store_memory(10).is_err());
        assert!(state.recall_memory(10).is_err());
        assert!(state.memory_channel(10).is_err());
    }

    #[test]
    fn test_link_report_keeps_mode_on_data_report() {
        let mut state = RadioState::new();
        state.set_mode(Vfo::A, Mode::Cw);
        let freq = Frequency::from_units(703_000).unwrap();
        state.apply_link_report(freq, None);
        assert_eq!(state.frequency(Vfo::A), freq);
        assert_eq!(state.mode(Vfo::A), Mode::Cw);

        state.apply_link_report(freq, Some(Mode::Am));
        assert_eq!(state.mode(Vfo::A), Mode::Am);
    }

    #[test]
    fn test_telemetry_partial_update() {
        let mut state = RadioState::new();
        state.apply_telemetry(Some(120), None, None);
        state.apply_telemetry(None, Some(200), Some(30));
        let snap = state.snapshot();
        assert_eq!(snap.meter_level, 120);
        assert_eq!(snap.power_meter_level, 200);
        assert_eq!(snap.swr_level, 30);
    }

    #[test]
    fn test_snapshot_field_names() {
        let snap = RadioState::new().snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["frequency_a"], "14.320.00");
        assert_eq!(json["mode_b"], "LSB");
        assert_eq!(json["active_vfo"], "A");
        assert_eq!(json["af_gain"], 50);
        assert_eq!(json["meter_level"], 0);
        assert_eq!(json["selected_memory"], 0);
        assert_eq!(json["connection"]["link"], "mock");
    }
}
