//! LoRa radio alerts.
//!
//! Short text messages handed to a LoRa modem over its serial device.
//! The device is opened, written, and flushed per send; the modem itself
//! frames and transmits the line. Payloads are truncated to the radio's
//! small packet size.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// LoRa packets are tiny; longer alert text is cut at a char boundary.
pub const MAX_PAYLOAD_BYTES: usize = 240;

pub struct LoRaSender {
    device: PathBuf,
}

impl LoRaSender {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
        }
    }

    /// Transmit one newline-terminated alert message.
    pub fn send(&mut self, text: &str) -> Result<()> {
        let payload = truncate_to_payload(text);
        let mut device = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.device)
            .with_context(|| format!("open LoRa device {}", self.device.display()))?;
        writeln!(device, "{payload}")
            .with_context(|| format!("write to LoRa device {}", self.device.display()))?;
        device.flush()?;
        log::debug!("LoRa message sent: {payload}");
        Ok(())
    }
}

fn truncate_to_payload(text: &str) -> &str {
    if text.len() <= MAX_PAYLOAD_BYTES {
        return text;
    }
    let mut cut = MAX_PAYLOAD_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    &text[..cut]
}
