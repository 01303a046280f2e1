//! Transport and telemetry task
//!
//! One task per process owns the radio link. Every 50 ms it either
//! advances the meter simulator (mock link) or polls the real radio over
//! serial (read frequency/mode, read meter). Frequency and mode pushes
//! arrive over the command channel and are written to the wire between
//! polls.
//!
//! Failures are never fatal: a failed serial exchange marks the link
//! disconnected and the task keeps ticking, re-running autodetection at
//! most once per retry interval until the radio is back.

use std::time::Duration;

use rig_core::{ConnectionInfo, LinkCommand, LinkMode, Rig, RigError};
use rig_detect::{autodetect, DetectConfig};
use rig_protocol::wire::{parse_meter_reply, FrequencyModeReply, WireCodec, WireCommand};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

/// Telemetry cadence
pub const TICK: Duration = Duration::from_millis(50);
/// Deadline for one command/reply exchange
const EXCHANGE_TIMEOUT: Duration = Duration::from_millis(300);
/// Minimum spacing between reconnect attempts
const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);
/// Bounded connect attempts at startup
const STARTUP_ATTEMPTS: u32 = 3;
const STARTUP_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Mock link: no I/O, meters come from the simulator
pub async fn run_mock_link(rig: Rig, mut cmd_rx: mpsc::Receiver<LinkCommand>) {
    rig.set_connection(ConnectionInfo {
        link: LinkMode::Mock,
        port: None,
        baud: None,
        connected: true,
    });
    info!("mock link started");

    let mut sim = rig_sim::MeterSimulator::new();
    let started = Instant::now();
    let mut tick = interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(LinkCommand::Shutdown) | None => break,
                // There is no radio to push to; the state is already
                // authoritative
                Some(_) => {}
            },
            _ = tick.tick() => {
                let snap = rig.snapshot();
                let readings = sim.advance(
                    started.elapsed().as_secs_f64(),
                    &rig_sim::SimInputs {
                        rf_gain: snap.rf_gain,
                        power_level: snap.power_level,
                        transmitting: snap.transmitting,
                    },
                );
                rig.apply_telemetry(
                    Some(readings.signal),
                    Some(readings.power_out),
                    Some(readings.swr),
                );
            }
        }
    }

    rig.set_connection(ConnectionInfo {
        link: LinkMode::Mock,
        port: None,
        baud: None,
        connected: false,
    });
    info!("mock link stopped");
}

/// Serial link: autodetect, poll, reconnect
pub async fn run_serial_link(
    rig: Rig,
    mut cmd_rx: mpsc::Receiver<LinkCommand>,
    detect: DetectConfig,
) {
    let mut link = None;
    for attempt in 1..=STARTUP_ATTEMPTS {
        link = open_link(&rig, &detect).await;
        if link.is_some() {
            break;
        }
        debug!("startup connect attempt {}/{} failed", attempt, STARTUP_ATTEMPTS);
        tokio::time::sleep(STARTUP_RETRY_DELAY).await;
    }

    let mut tick = interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_reconnect = Instant::now();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(LinkCommand::Shutdown) | None => break,
                Some(cmd) => {
                    if let Some(stream) = link.as_mut() {
                        if let Err(e) = write_push(stream, cmd).await {
                            warn!("push failed, link lost: {}", e);
                            link = None;
                            mark_disconnected(&rig);
                        }
                    }
                }
            },
            _ = tick.tick() => {
                match link.as_mut() {
                    Some(stream) => {
                        if let Err(e) = poll_radio(&rig, stream).await {
                            warn!("poll failed, link lost: {}", e);
                            link = None;
                            mark_disconnected(&rig);
                            last_reconnect = Instant::now();
                        }
                    }
                    None => {
                        if last_reconnect.elapsed() >= RECONNECT_INTERVAL {
                            last_reconnect = Instant::now();
                            link = open_link(&rig, &detect).await;
                        }
                    }
                }
            }
        }
    }

    mark_disconnected(&rig);
    info!("serial link stopped");
}

fn mark_disconnected(rig: &Rig) {
    let mut connection = rig.snapshot().connection;
    connection.connected = false;
    rig.set_connection(connection);
}

/// Run autodetection and open the resulting port
async fn open_link(rig: &Rig, detect: &DetectConfig) -> Option<SerialStream> {
    let detected = match autodetect(detect).await {
        Ok(d) => d,
        Err(e) => {
            warn!("autodetection failed: {}", e);
            mark_disconnected(rig);
            return None;
        }
    };

    match tokio_serial::new(&detected.port, detected.baud)
        .timeout(Duration::from_millis(100))
        .open_native_async()
    {
        Ok(stream) => {
            info!("serial link open on {} at {} baud", detected.port, detected.baud);
            rig.set_connection(ConnectionInfo {
                link: LinkMode::Serial,
                port: Some(detected.port),
                baud: Some(detected.baud),
                connected: true,
            });
            Some(stream)
        }
        Err(e) => {
            warn!("failed to open {}: {}", detected.port, e);
            mark_disconnected(rig);
            None
        }
    }
}

/// One command/reply exchange, bounded by the exchange timeout
async fn exchange<S>(stream: &mut S, cmd: WireCommand) -> Result<Vec<u8>, RigError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(&cmd.encode())
        .await
        .map_err(|e| RigError::TransportIo(e.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|e| RigError::TransportIo(e.to_string()))?;

    let expected = cmd.reply_len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let mut codec = WireCodec::new();
    codec.expect_reply(expected);
    let deadline = Instant::now() + EXCHANGE_TIMEOUT;
    let mut buf = [0u8; 16];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RigError::TransportTimeout);
        }
        match timeout(remaining, stream.read(&mut buf)).await {
            Ok(Ok(0)) => return Err(RigError::TransportIo("stream closed".to_string())),
            Ok(Ok(n)) => {
                codec.push_bytes(&buf[..n]);
                if let Some(frame) = codec.next_reply() {
                    return Ok(frame);
                }
            }
            Ok(Err(e)) => return Err(RigError::TransportIo(e.to_string())),
            Err(_) => return Err(RigError::TransportTimeout),
        }
    }
}

/// Write a state push to the radio
///
/// A frequency push always writes set-frequency followed by set-mode so
/// the radio never sits on a frequency with a stale mode.
async fn write_push<S>(stream: &mut S, cmd: LinkCommand) -> Result<(), RigError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match cmd {
        LinkCommand::SetFrequency { freq, mode } => {
            exchange(stream, WireCommand::SetFrequency { freq }).await?;
            exchange(stream, WireCommand::SetMode { mode }).await?;
        }
        LinkCommand::SetMode { mode } => {
            exchange(stream, WireCommand::SetMode { mode }).await?;
        }
        LinkCommand::Shutdown => {}
    }
    Ok(())
}

/// One telemetry poll: frequency/mode, then the S-meter
///
/// A garbled reply (bad BCD) skips this tick; only I/O failures bubble
/// up and break the link.
async fn poll_radio<S>(rig: &Rig, stream: &mut S) -> Result<(), RigError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = exchange(stream, WireCommand::ReadFrequencyMode).await?;
    match FrequencyModeReply::parse(&frame) {
        Ok(reply) => rig.apply_link_report(reply.freq, reply.mode),
        Err(e) => debug!("discarding unparsable frequency reply: {}", e),
    }

    let frame = exchange(stream, WireCommand::ReadMeter).await?;
    match parse_meter_reply(&frame) {
        Ok(level) => rig.apply_telemetry(Some(level), None, None),
        Err(e) => debug!("discarding unparsable meter reply: {}", e),
    }

    Ok(())
}
