//! The dispatch loop.
//!
//! Owns the capture device and drives one synchronous cycle per frame:
//! capture, heartbeat check, inference, report, preview, then the decision
//! policy's verdict and its side effects, in a fixed order. Optional
//! collaborators (collector link, preview, radio) are present-or-absent
//! values; the loop queries presence once per relevant step.
//!
//! Everything happens on the calling thread. Side effects for cycle N are
//! fully issued before cycle N+1's capture begins. Collaborator failures
//! are not handled here; they propagate out of `run()` and terminate the
//! process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::capture::Camera;
use crate::config::ScrubcamConfig;
use crate::detect::ObjectDetector;
use crate::display::Display;
use crate::frame::FrameBuffer;
use crate::lora::LoRaSender;
use crate::policy::{decide, Verdict};
use crate::remote::{HeartbeatClock, RemoteClient};
use crate::sighting::SightingLog;

/// Cooperative cancellation flag.
///
/// The interrupt handler flips it from its thread; the loop checks it at
/// the start of every cycle and performs an orderly shutdown instead of
/// unwinding.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The capture→infer→decide→dispatch loop.
pub struct Dispatcher {
    config: ScrubcamConfig,
    camera: Camera,
    detector: ObjectDetector,
    remote: Option<RemoteClient>,
    display: Option<Display>,
    lora: Option<LoRaSender>,
    sightings: SightingLog,
    heartbeat: HeartbeatClock,
    cancel: CancelToken,
    frame: FrameBuffer,
}

impl Dispatcher {
    pub fn new(
        config: ScrubcamConfig,
        camera: Camera,
        detector: ObjectDetector,
        sightings: SightingLog,
        cancel: CancelToken,
    ) -> Self {
        Self {
            config,
            camera,
            detector,
            remote: None,
            display: None,
            lora: None,
            sightings,
            heartbeat: HeartbeatClock::new(),
            cancel,
            frame: FrameBuffer::new(),
        }
    }

    pub fn with_remote(mut self, remote: Option<RemoteClient>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_display(mut self, display: Option<Display>) -> Self {
        self.display = display;
        self
    }

    pub fn with_lora(mut self, lora: Option<LoRaSender>) -> Self {
        self.lora = lora;
        self
    }

    /// Drive the capture device until cancelled.
    ///
    /// Blocks for the lifetime of the process under normal operation.
    /// Returns `Ok(())` only after a cancellation signal; any collaborator
    /// failure propagates as the error it raised.
    pub fn run(&mut self) -> Result<()> {
        log::info!("dispatch loop running");
        loop {
            if self.cancel.is_cancelled() {
                return self.shutdown();
            }

            self.camera.next_frame(&mut self.frame)?;

            // Checked every cycle at a fixed point so slow inference can
            // delay a heartbeat by at most one frame, never starve it.
            if let Some(remote) = self.remote.as_mut() {
                if self.heartbeat.due() {
                    remote.send_heartbeat()?;
                    self.heartbeat.reset();
                }
            }

            self.detector.infer(&self.frame)?;
            self.detector.print_report();

            if let Some(display) = self.display.as_mut() {
                display.update(self.detector.labeled_boxes());
            }

            let verdict = decide(self.detector.labeled_boxes(), &self.config);
            if verdict != Verdict::NoAction {
                // decide() maps an empty sequence to NoAction.
                let top_class = self.detector.labeled_boxes()[0].class_name.clone();
                if verdict == Verdict::LogAndDispatch {
                    self.forward_detections(&top_class)?;
                }
                self.sightings.append(&top_class)?;
            }

            self.frame.reset();
        }
    }

    /// Side effects for a filter-matched sighting, in order: collector
    /// send, local persistence, radio alert.
    fn forward_detections(&mut self, top_class: &str) -> Result<()> {
        let boxes = self.detector.labeled_boxes();
        if let Some(remote) = self.remote.as_mut() {
            remote.send_image_and_boxes(&self.frame, boxes)?;
            log::debug!("image sent");
        }
        self.detector.save_current_frame(&self.frame, boxes)?;
        if let Some(lora) = self.lora.as_mut() {
            lora.send(&format!("Top-1: {top_class}"))?;
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        log::warn!("cancellation requested, shutting down");
        if let Some(remote) = self.remote.take() {
            if let Err(e) = remote.close() {
                log::warn!("collector connection did not close cleanly: {e:#}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        clone.cancel();
        assert!(token.is_cancelled());
    }
}
