//! Serial port scanner
//!
//! Enumerates serial ports and filters them down to the USB serial
//! adapters a radio is plausibly behind.

use serialport::{available_ports, SerialPortType};
use tracing::info;

use crate::error::DetectError;

/// Description substrings that mark a port as a USB serial adapter
const USB_SERIAL_KEYWORDS: &[&str] = &["usb", "serial", "uart", "cp210", "ft232", "ch340"];

/// Information about a serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub port: String,
    /// USB Vendor ID (if USB)
    pub vid: Option<u16>,
    /// USB Product ID (if USB)
    pub pid: Option<u16>,
    /// USB manufacturer string
    pub manufacturer: Option<String>,
    /// USB product string
    pub product: Option<String>,
}

impl SerialPortInfo {
    /// Create from serialport crate's port info
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                port: name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer.clone(),
                product: usb.product.clone(),
            },
            _ => Self {
                port: name,
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
            },
        }
    }

    /// Whether this port looks like a USB serial adapter worth probing
    pub fn is_usb_serial_candidate(&self) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.port,
            self.manufacturer.as_deref().unwrap_or(""),
            self.product.as_deref().unwrap_or("")
        )
        .to_ascii_lowercase();

        USB_SERIAL_KEYWORDS.iter().any(|kw| haystack.contains(kw))
    }
}

/// Enumerate all available serial ports
pub fn enumerate_ports() -> Result<Vec<SerialPortInfo>, DetectError> {
    let ports = available_ports().map_err(|e| DetectError::EnumerationFailed(e.to_string()))?;

    Ok(ports
        .into_iter()
        .map(|p| SerialPortInfo::from_serialport(p.port_name, &p.port_type))
        .collect())
}

/// Enumerate ports and keep only USB serial candidates
pub fn candidate_ports() -> Result<Vec<SerialPortInfo>, DetectError> {
    let candidates: Vec<_> = enumerate_ports()?
        .into_iter()
        .filter(SerialPortInfo::is_usb_serial_candidate)
        .collect();

    if candidates.is_empty() {
        info!("No USB serial ports found");
    } else {
        info!("Found {} USB serial port(s)", candidates.len());
        for port in &candidates {
            let desc = port.product.as_deref().unwrap_or("Unknown");
            info!("  {} - {}", port.port, desc);
        }
    }

    Ok(candidates)
}
