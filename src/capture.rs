//! Camera frame source.
//!
//! This module provides `Camera`, the blocking capture device driven by the
//! dispatch loop:
//! - `stub://` device URLs select a synthetic backend (development, tests)
//! - local device nodes select a V4L2 MJPEG backend (feature: capture-v4l2)
//!
//! The capture layer produces encoded frames only; it never decodes,
//! inspects, or retains them. Frames are written into the loop's reused
//! `FrameBuffer` and the source forgets them immediately.

use anyhow::Result;

use crate::config::ScrubcamConfig;
use crate::frame::FrameBuffer;

const DEFAULT_SYNTHETIC_FPS: u32 = 10;

/// Capture device settings, carved out of the full configuration.
#[derive(Clone, Debug)]
pub struct CameraSettings {
    /// Device URL: `stub://scene` (optionally `stub://scene?fps=N`) or a
    /// local node such as `/dev/video0`.
    pub device: String,
    pub resolution: (u32, u32),
    /// Sensor rotation in degrees.
    pub rotation: u16,
}

impl CameraSettings {
    pub fn from_config(config: &ScrubcamConfig) -> Self {
        Self {
            device: config.camera_device.clone(),
            resolution: config.camera_resolution,
            rotation: config.camera_rotation,
        }
    }
}

/// Blocking camera frame source.
///
/// Produces a lazy, infinite, non-restartable sequence of encoded frames.
pub struct Camera {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "capture-v4l2")]
    V4l2(v4l2::V4l2Camera),
}

impl Camera {
    pub fn new(settings: CameraSettings) -> Result<Self> {
        if settings.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(settings)),
            })
        } else {
            #[cfg(feature = "capture-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::V4l2(v4l2::V4l2Camera::new(settings)?),
                })
            }
            #[cfg(not(feature = "capture-v4l2"))]
            {
                anyhow::bail!("device capture requires the capture-v4l2 feature")
            }
        }
    }

    /// Open the capture device.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.connect(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(camera) => camera.connect(),
        }
    }

    /// Capture the next frame into `frame`, blocking until one is available.
    pub fn next_frame(&mut self, frame: &mut FrameBuffer) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.next_frame(frame),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(camera) => camera.next_frame(frame),
        }
    }

    /// Get capture statistics.
    pub fn stats(&self) -> CaptureStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(camera) => camera.stats(),
        }
    }
}

/// Statistics for a capture device.
#[derive(Clone, Debug)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub device: String,
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for development and tests
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    settings: CameraSettings,
    target_fps: u32,
    frame_count: u64,
    /// Simulated "scene" state; changes occasionally so hash-based stub
    /// detectors see periodic motion.
    scene_state: u8,
    last_capture: Option<std::time::Instant>,
}

impl SyntheticCamera {
    fn new(settings: CameraSettings) -> Self {
        let target_fps = parse_stub_fps(&settings.device);
        Self {
            settings,
            target_fps,
            frame_count: 0,
            scene_state: 0,
            last_capture: None,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!(
            "Camera: connected to {} (synthetic, {} fps)",
            self.settings.device,
            self.target_fps
        );
        Ok(())
    }

    fn next_frame(&mut self, frame: &mut FrameBuffer) -> Result<()> {
        self.pace();
        self.frame_count += 1;

        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let encoded = self.generate_synthetic_frame();
        frame.refill(&encoded);
        self.last_capture = Some(std::time::Instant::now());
        Ok(())
    }

    /// Block until the next frame slot, emulating a real sensor's cadence.
    fn pace(&self) {
        let Some(last) = self.last_capture else {
            return;
        };
        if self.target_fps == 0 {
            return;
        }
        let interval = std::time::Duration::from_millis(1000 / self.target_fps as u64);
        if let Some(remaining) = interval.checked_sub(last.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    /// Generate a synthetic encoded frame.
    ///
    /// The payload carries JPEG start/end markers and a deterministic body
    /// mixing frame count, scene state, resolution, and rotation. It is
    /// opaque to everything downstream, exactly like a real encoded frame.
    fn generate_synthetic_frame(&self) -> Vec<u8> {
        let (width, height) = self.settings.resolution;
        let body_len = (width as usize * height as usize / 16).max(64);

        let mut encoded = Vec::with_capacity(body_len + 4);
        encoded.extend_from_slice(&[0xFF, 0xD8]);
        for i in 0..body_len {
            let mixed = i as u64
                + self.frame_count
                + self.scene_state as u64 * 7
                + self.settings.rotation as u64;
            encoded.push((mixed % 256) as u8);
        }
        encoded.extend_from_slice(&[0xFF, 0xD9]);
        encoded
    }

    fn stats(&self) -> CaptureStats {
        CaptureStats {
            frames_captured: self.frame_count,
            device: self.settings.device.clone(),
        }
    }
}

fn parse_stub_fps(device: &str) -> u32 {
    device
        .split_once("?fps=")
        .and_then(|(_, fps)| fps.parse().ok())
        .unwrap_or(DEFAULT_SYNTHETIC_FPS)
}

// ----------------------------------------------------------------------------
// V4L2 camera for real hardware
// ----------------------------------------------------------------------------

#[cfg(feature = "capture-v4l2")]
mod v4l2 {
    use anyhow::{Context, Result};
    use ouroboros::self_referencing;

    use super::{CameraSettings, CaptureStats};
    use crate::frame::FrameBuffer;

    pub(super) struct V4l2Camera {
        settings: CameraSettings,
        state: Option<V4l2State>,
        frame_count: u64,
    }

    #[self_referencing]
    struct V4l2State {
        device: v4l::Device,
        #[borrows(mut device)]
        #[covariant]
        stream: v4l::prelude::MmapStream<'this, v4l::Device>,
    }

    impl V4l2Camera {
        pub(super) fn new(settings: CameraSettings) -> Result<Self> {
            Ok(Self {
                settings,
                state: None,
                frame_count: 0,
            })
        }

        pub(super) fn connect(&mut self) -> Result<()> {
            use v4l::buffer::Type;
            use v4l::video::Capture;

            if self.settings.rotation != 0 {
                log::warn!(
                    "Camera: {} does not apply sensor rotation; frames arrive unrotated",
                    self.settings.device
                );
            }

            let mut device = v4l::Device::with_path(&self.settings.device)
                .with_context(|| format!("open capture device {}", self.settings.device))?;
            let mut format = device.format().context("read capture format")?;
            format.width = self.settings.resolution.0;
            format.height = self.settings.resolution.1;
            format.fourcc = v4l::FourCC::new(b"MJPG");
            let format = device
                .set_format(&format)
                .context("request MJPEG capture format")?;
            if &format.fourcc.repr != b"MJPG" {
                anyhow::bail!(
                    "device {} does not deliver MJPEG frames",
                    self.settings.device
                );
            }

            let state = V4l2StateBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                        .map_err(|err| anyhow::Error::new(err).context("create capture stream"))
                },
            }
            .try_build()?;
            self.state = Some(state);

            log::info!(
                "Camera: connected to {} ({}x{})",
                self.settings.device,
                format.width,
                format.height
            );
            Ok(())
        }

        pub(super) fn next_frame(&mut self, frame: &mut FrameBuffer) -> Result<()> {
            use v4l::io::traits::CaptureStream;

            let state = self.state.as_mut().context("capture device not connected")?;
            let used = state.with_mut(|fields| {
                let (buf, meta) = fields.stream.next().context("capture frame")?;
                let used = (meta.bytesused as usize).min(buf.len());
                frame.refill(&buf[..used]);
                Ok::<usize, anyhow::Error>(used)
            })?;
            if used == 0 {
                anyhow::bail!("capture device returned an empty frame");
            }
            self.frame_count += 1;
            Ok(())
        }

        pub(super) fn stats(&self) -> CaptureStats {
            CaptureStats {
                frames_captured: self.frame_count,
                device: self.settings.device.clone(),
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_settings() -> CameraSettings {
        CameraSettings {
            device: "stub://test?fps=0".to_string(),
            resolution: (640, 480),
            rotation: 0,
        }
    }

    #[test]
    fn synthetic_camera_produces_frames() -> Result<()> {
        let mut camera = Camera::new(stub_settings())?;
        camera.connect()?;

        let mut frame = FrameBuffer::new();
        camera.next_frame(&mut frame)?;

        assert!(!frame.is_empty());
        assert_eq!(&frame.as_bytes()[..2], &[0xFF, 0xD8]);
        assert_eq!(camera.stats().frames_captured, 1);
        Ok(())
    }

    #[test]
    fn synthetic_frames_change_across_captures() -> Result<()> {
        let mut camera = Camera::new(stub_settings())?;
        camera.connect()?;

        let mut frame = FrameBuffer::new();
        camera.next_frame(&mut frame)?;
        let first = frame.snapshot();

        frame.reset();
        camera.next_frame(&mut frame)?;

        assert_ne!(first, frame.as_bytes());
        Ok(())
    }

    #[test]
    fn stub_fps_parsed_from_device_url() {
        assert_eq!(parse_stub_fps("stub://scene?fps=200"), 200);
        assert_eq!(parse_stub_fps("stub://scene"), DEFAULT_SYNTHETIC_FPS);
        assert_eq!(parse_stub_fps("stub://scene?fps=bogus"), DEFAULT_SYNTHETIC_FPS);
    }

    #[cfg(not(feature = "capture-v4l2"))]
    #[test]
    fn device_capture_requires_feature() {
        let settings = CameraSettings {
            device: "/dev/video0".to_string(),
            resolution: (640, 480),
            rotation: 0,
        };
        assert!(Camera::new(settings).is_err());
    }
}
