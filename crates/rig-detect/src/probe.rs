//! Radio probing
//!
//! Sends the read-frequency command to candidate ports at each configured
//! baud rate and accepts the port/baud pair that answers with exactly the
//! 5-byte frequency/mode reply.

use std::time::Duration;

use rig_protocol::wire::{WireCommand, FREQ_MODE_REPLY_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, trace, warn};

use crate::error::DetectError;
use crate::scanner::candidate_ports;

/// Configuration for autodetection
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Baud rates to try, in order
    pub baud_rates: Vec<u32>,
    /// Fallback port when no candidate responds
    pub default_port: Option<String>,
    /// Baud used for the fallback port
    pub default_baud: u32,
    /// Per-probe read timeout
    pub probe_timeout: Duration,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            baud_rates: vec![4800, 9600, 19200, 38400, 57600],
            default_port: None,
            default_baud: 4800,
            probe_timeout: Duration::from_millis(300),
        }
    }
}

/// Outcome of autodetection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedLink {
    pub port: String,
    pub baud: u32,
    /// True when the radio actually answered the probe; false for the
    /// fallback guess
    pub verified: bool,
}

/// Probe a stream for a radio
///
/// Writes the read-frequency command and accepts iff exactly 5 bytes come
/// back within the timeout. More bytes, fewer bytes, or silence all mean
/// no radio (or the wrong baud rate) on the other end.
pub async fn probe_stream<S>(stream: &mut S, probe_timeout: Duration) -> bool
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let cmd = WireCommand::ReadFrequencyMode.encode();
    if let Err(e) = stream.write_all(&cmd).await {
        trace!("probe write failed: {}", e);
        return false;
    }

    let mut buf = [0u8; FREQ_MODE_REPLY_LEN + 3];
    let mut filled = 0usize;
    let deadline = Instant::now() + probe_timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() || filled >= buf.len() {
            break;
        }
        match timeout(remaining, stream.read(&mut buf[filled..])).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                filled += n;
                if filled > FREQ_MODE_REPLY_LEN {
                    break;
                }
            }
            Ok(Err(e)) => {
                trace!("probe read error: {}", e);
                break;
            }
            Err(_) => break,
        }
    }

    trace!("probe received {} byte(s)", filled);
    filled == FREQ_MODE_REPLY_LEN
}

/// Probe a specific port at a given baud rate
pub async fn probe_port(port_name: &str, baud_rate: u32, probe_timeout: Duration) -> bool {
    use tokio_serial::SerialPortBuilderExt;

    debug!("Probing {} at {} baud", port_name, baud_rate);

    let mut stream = match tokio_serial::new(port_name, baud_rate)
        .timeout(Duration::from_millis(100))
        .open_native_async()
    {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to open {}: {}", port_name, e);
            return false;
        }
    };

    // Give the port a moment to settle
    tokio::time::sleep(Duration::from_millis(50)).await;

    probe_stream(&mut stream, probe_timeout).await
}

/// Walk every candidate port at every configured baud rate
///
/// Returns the first verified hit. With no hit, falls back to the first
/// candidate port (or the configured default) at the default baud so the
/// caller can still attempt a connection.
pub async fn autodetect(config: &DetectConfig) -> Result<DetectedLink, DetectError> {
    let candidates = candidate_ports()?;

    for candidate in &candidates {
        debug!("Testing {}...", candidate.port);
        for &baud in &config.baud_rates {
            if probe_port(&candidate.port, baud, config.probe_timeout).await {
                info!("Radio found on {} at {} baud", candidate.port, baud);
                return Ok(DetectedLink {
                    port: candidate.port.clone(),
                    baud,
                    verified: true,
                });
            }
        }
        debug!("  No response at any baud rate");
    }

    let fallback = candidates
        .first()
        .map(|c| c.port.clone())
        .or_else(|| config.default_port.clone())
        .ok_or(DetectError::NoCandidates)?;

    info!(
        "No radio detected; falling back to {} at {} baud",
        fallback, config.default_baud
    );
    Ok(DetectedLink {
        port: fallback,
        baud: config.default_baud,
        verified: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn test_detect_config_default() {
        let config = DetectConfig::default();
        assert_eq!(config.baud_rates, vec![4800, 9600, 19200, 38400, 57600]);
        assert_eq!(config.probe_timeout, Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_probe_accepts_exact_reply() {
        let (mut near, mut far) = duplex(64);
        let responder = tokio::spawn(async move {
            let mut cmd = [0u8; 5];
            far.read_exact(&mut cmd).await.unwrap();
            assert_eq!(cmd, [0x00, 0x00, 0x00, 0x00, 0x03]);
            far.write_all(&[0x01, 0x43, 0x20, 0x00, 0x01]).await.unwrap();
        });

        assert!(probe_stream(&mut near, Duration::from_millis(300)).await);
        responder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_rejects_silence() {
        let (mut near, _far) = duplex(64);
        assert!(!probe_stream(&mut near, Duration::from_millis(300)).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_short_reply() {
        let (mut near, mut far) = duplex(64);
        tokio::spawn(async move {
            let mut cmd = [0u8; 5];
            far.read_exact(&mut cmd).await.unwrap();
            far.write_all(&[0x01, 0x43]).await.unwrap();
            // Dropping far closes the stream after the partial reply
        });

        assert!(!probe_stream(&mut near, Duration::from_millis(300)).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_chatter() {
        let (mut near, mut far) = duplex(64);
        tokio::spawn(async move {
            let mut cmd = [0u8; 5];
            far.read_exact(&mut cmd).await.unwrap();
            far.write_all(b"NMEA garbage from a GPS dongle").await.unwrap();
        });

        assert!(!probe_stream(&mut near, Duration::from_millis(300)).await);
    }
}
