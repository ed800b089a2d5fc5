//! Remote collector link.
//!
//! Device side of the collector connection: a plain TCP stream carrying
//! length-prefixed JSON messages (4-byte big-endian length, then one
//! serialized `WireMessage`). The collector's own protocol semantics are
//! out of scope here; this module only frames and ships what the dispatch
//! loop hands it.
//!
//! Also home to the `HeartbeatClock`, the 15-second liveness timer the loop
//! consults at the start of every cycle.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::detect::Detection;
use crate::frame::FrameBuffer;

/// Fixed liveness cadence toward the collector.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Upper bound on one framed message; a frame plus boxes stays far below.
const MAX_MESSAGE_BYTES: u32 = 64 * 1024 * 1024;

/// Messages the device sends to the collector.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireMessage {
    /// Sent once at startup: the device's allow-list and whether this run
    /// continues a previous session.
    HostConfigs {
        filter_classes: Vec<String>,
        continue_run: bool,
    },
    /// Periodic liveness signal, independent of detection events.
    Heartbeat,
    /// A qualifying frame with its full detection sequence.
    ImageAndBoxes {
        image: Vec<u8>,
        boxes: Vec<Detection>,
    },
    /// Orderly end of session.
    Goodbye,
}

/// Client connection to the remote collector.
pub struct RemoteClient {
    stream: TcpStream,
    peer: String,
}

impl RemoteClient {
    /// Connect to the collector. Blocking, no timeout: a dead collector at
    /// startup surfaces as a connect error and terminates the process.
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("connect to collector {addr}"))?;
        log::info!("RemoteClient: connected to {addr}");
        Ok(Self {
            stream,
            peer: addr.to_string(),
        })
    }

    /// Forward the device configuration once at session start.
    pub fn send_host_configs(
        &mut self,
        filter_classes: &HashSet<String>,
        continue_run: bool,
    ) -> Result<()> {
        let mut filter_classes: Vec<String> = filter_classes.iter().cloned().collect();
        filter_classes.sort();
        self.send(&WireMessage::HostConfigs {
            filter_classes,
            continue_run,
        })
    }

    pub fn send_heartbeat(&mut self) -> Result<()> {
        log::debug!("heartbeat sent to {}", self.peer);
        self.send(&WireMessage::Heartbeat)
    }

    /// Ship the current frame and its detection sequence.
    pub fn send_image_and_boxes(
        &mut self,
        frame: &FrameBuffer,
        boxes: &[Detection],
    ) -> Result<()> {
        self.send(&WireMessage::ImageAndBoxes {
            image: frame.snapshot(),
            boxes: boxes.to_vec(),
        })
    }

    /// Orderly shutdown: say goodbye and close both directions.
    pub fn close(mut self) -> Result<()> {
        self.send(&WireMessage::Goodbye)?;
        self.stream
            .shutdown(std::net::Shutdown::Both)
            .with_context(|| format!("shutdown connection to {}", self.peer))?;
        log::info!("RemoteClient: closed connection to {}", self.peer);
        Ok(())
    }

    fn send(&mut self, message: &WireMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| anyhow!("message of {} bytes exceeds frame limit", payload.len()))?;
        if len > MAX_MESSAGE_BYTES {
            return Err(anyhow!("message of {len} bytes exceeds frame limit"));
        }
        self.stream.write_all(&len.to_be_bytes())?;
        self.stream.write_all(&payload)?;
        self.stream.flush()?;
        Ok(())
    }
}

/// Read one framed message from a collector-side stream.
///
/// Counterpart of `RemoteClient::send`; used by collector implementations
/// and by the tests that stand in for one. Returns `Ok(None)` on a clean
/// EOF at a message boundary.
pub fn read_message(reader: &mut impl Read) -> Result<Option<WireMessage>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_MESSAGE_BYTES {
        return Err(anyhow!("framed message of {len} bytes exceeds limit"));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).context("read message body")?;
    let message = serde_json::from_slice(&payload).context("decode message")?;
    Ok(Some(message))
}

/// Heartbeat timer.
///
/// Records the instant of the last heartbeat; `due()` answers whether the
/// interval has elapsed and `reset()` re-baselines to now. The baseline
/// starts at construction, so the first heartbeat fires one interval after
/// the connection comes up.
pub struct HeartbeatClock {
    last_beat: Instant,
}

impl HeartbeatClock {
    pub fn new() -> Self {
        Self {
            last_beat: Instant::now(),
        }
    }

    pub fn due(&self) -> bool {
        self.last_beat.elapsed() >= HEARTBEAT_INTERVAL
    }

    pub fn reset(&mut self) {
        self.last_beat = Instant::now();
    }

    #[cfg(test)]
    fn backdate(&mut self, elapsed: Duration) {
        if let Some(instant) = Instant::now().checked_sub(elapsed) {
            self.last_beat = instant;
        }
    }
}

impl Default for HeartbeatClock {
    fn default() -> Self {
        Self::new()
    }
}
