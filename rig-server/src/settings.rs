//! Application settings
//!
//! Loaded at startup, written back at shutdown with the state worth
//! keeping across sessions. A missing or unreadable file means defaults;
//! a saved value the validators reject is skipped, never fatal.

use std::path::PathBuf;

use rig_core::{Control, LinkMode, Rig, Snapshot, Vfo};
use rig_protocol::Mode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the link task should reach the radio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSettings {
    /// "mock" or "serial"
    pub link_mode: LinkMode,
    /// Preferred serial port, used when autodetection finds nothing
    #[serde(default)]
    pub port: Option<String>,
    /// Baud rate for the fallback port
    #[serde(default)]
    pub baud: Option<u32>,
    /// Baud rates to try during autodetection
    pub baud_rates: Vec<u32>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            link_mode: LinkMode::Mock,
            port: None,
            baud: None,
            baud_rates: vec![4800, 9600, 19200, 38400, 57600],
        }
    }
}

/// Control API listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

fn default_true() -> bool {
    true
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Radio state persisted across sessions
///
/// Everything is optional and applied field by field, so a stale or
/// hand-edited file never blocks startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedState {
    #[serde(default)]
    pub frequency_a: Option<String>,
    #[serde(default)]
    pub mode_a: Option<String>,
    #[serde(default)]
    pub frequency_b: Option<String>,
    #[serde(default)]
    pub mode_b: Option<String>,
    #[serde(default)]
    pub active_vfo: Option<String>,
    #[serde(default)]
    pub split_enabled: Option<bool>,
    #[serde(default)]
    pub af_gain: Option<u8>,
    #[serde(default)]
    pub sub_af_gain: Option<u8>,
    #[serde(default)]
    pub rf_gain: Option<u8>,
    #[serde(default)]
    pub power_level: Option<u8>,
    #[serde(default)]
    pub shift: Option<u8>,
    #[serde(default)]
    pub width: Option<u8>,
    #[serde(default)]
    pub notch: Option<u8>,
}

impl SavedState {
    pub fn from_snapshot(snap: &Snapshot) -> Self {
        Self {
            frequency_a: Some(snap.frequency_a.clone()),
            mode_a: Some(snap.mode_a.clone()),
            frequency_b: Some(snap.frequency_b.clone()),
            mode_b: Some(snap.mode_b.clone()),
            active_vfo: Some(snap.active_vfo.clone()),
            split_enabled: Some(snap.split_enabled),
            af_gain: Some(snap.af_gain),
            sub_af_gain: Some(snap.sub_af_gain),
            rf_gain: Some(snap.rf_gain),
            power_level: Some(snap.power_level),
            shift: Some(snap.shift),
            width: Some(snap.width),
            notch: Some(snap.notch),
        }
    }

    /// Replay the saved fields onto a fresh rig, skipping invalid ones
    pub fn apply(&self, rig: &Rig) {
        // Frequency first: setting it re-infers the mode, and the saved
        // mode then overrides the inference
        for (vfo, freq, mode) in [
            (Vfo::A, &self.frequency_a, &self.mode_a),
            (Vfo::B, &self.frequency_b, &self.mode_b),
        ] {
            if let Some(raw) = freq {
                if let Err(e) = rig.set_frequency(vfo, raw) {
                    debug!("skipping saved frequency for {}: {}", vfo.as_str(), e);
                }
            }
            if let Some(raw) = mode {
                match raw.parse::<Mode>() {
                    Ok(m) => rig.set_mode(vfo, m),
                    Err(e) => debug!("skipping saved mode for {}: {}", vfo.as_str(), e),
                }
            }
        }

        if let Some(raw) = &self.active_vfo {
            match raw.parse::<Vfo>() {
                Ok(vfo) => rig.set_active_vfo(vfo),
                Err(e) => debug!("skipping saved active VFO: {}", e),
            }
        }
        if let Some(enabled) = self.split_enabled {
            rig.set_split(enabled);
        }

        for (control, value) in [
            (Control::AfGain, self.af_gain),
            (Control::SubAfGain, self.sub_af_gain),
            (Control::RfGain, self.rf_gain),
            (Control::PowerLevel, self.power_level),
            (Control::Shift, self.shift),
            (Control::Width, self.width),
            (Control::Notch, self.notch),
        ] {
            if let Some(v) = value {
                if let Err(e) = rig.set_control(control, v as i64) {
                    debug!("skipping saved {}: {}", control.name(), e);
                }
            }
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub http: HttpSettings,
    /// Radio state from the previous session
    #[serde(default)]
    pub state: Option<SavedState>,
}

impl Settings {
    /// Get the XDG config directory for rigmon
    /// Uses $XDG_CONFIG_HOME/rigmon on Linux/macOS, falls back to ~/.config/rigmon
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("rigmon"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("rigmon"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(&path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_state_roundtrip() {
        let rig = Rig::new();
        rig.set_frequency(Vfo::A, "7030000").unwrap();
        rig.set_mode(Vfo::A, Mode::Cw);
        rig.set_control(Control::AfGain, 35).unwrap();
        rig.set_active_vfo(Vfo::B);
        rig.set_split(true);

        let saved = SavedState::from_snapshot(&rig.snapshot());
        let restored = Rig::new();
        saved.apply(&restored);

        let snap = restored.snapshot();
        assert_eq!(snap.frequency_a, "7.030.00");
        assert_eq!(snap.mode_a, "CW");
        assert_eq!(snap.af_gain, 35);
        assert_eq!(snap.active_vfo, "B");
        assert!(snap.split_enabled);
    }

    #[test]
    fn test_invalid_saved_fields_are_skipped() {
        let saved = SavedState {
            frequency_a: Some("not a frequency".to_string()),
            mode_a: Some("DSTAR".to_string()),
            af_gain: Some(200),
            ..SavedState::default()
        };

        let rig = Rig::new();
        saved.apply(&rig);

        let snap = rig.snapshot();
        assert_eq!(snap.frequency_a, "14.320.00");
        assert_eq!(snap.mode_a, "USB");
        assert_eq!(snap.af_gain, 50);
    }

    #[test]
    fn test_settings_parse_partial_file() {
        let parsed: Settings =
            serde_json::from_str(r#"{ "http": { "host": "0.0.0.0", "port": 9090 } }"#).unwrap();
        assert_eq!(parsed.http.host, "0.0.0.0");
        assert_eq!(parsed.http.port, 9090);
        assert!(parsed.http.enabled);
        assert_eq!(parsed.connection.link_mode, LinkMode::Mock);
        assert_eq!(parsed.connection.baud_rates, vec![4800, 9600, 19200, 38400, 57600]);
        assert!(parsed.state.is_none());
    }
}
