use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use super::backend::DetectorBackend;
use super::registry::BackendRegistry;
use super::result::{sort_by_confidence, Detection};
use crate::config::ScrubcamConfig;
use crate::frame::FrameBuffer;

const FRAME_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";

/// Object-detection system as seen by the dispatch loop.
///
/// Wraps a detector backend with the inference state for the current cycle
/// and the persistence of qualifying frames. `infer` replaces the held
/// detection sequence; `labeled_boxes` exposes it ordered by descending
/// confidence.
pub struct ObjectDetector {
    backend: Box<dyn DetectorBackend>,
    record_dir: PathBuf,
    boxes: Vec<Detection>,
}

impl ObjectDetector {
    pub fn new(backend: Box<dyn DetectorBackend>, record_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            record_dir: record_dir.into(),
            boxes: Vec::new(),
        }
    }

    /// Build the detector named by the configuration, warm it up, and make
    /// sure the record directory exists.
    pub fn from_config(config: &ScrubcamConfig) -> Result<Self> {
        let mut backend = BackendRegistry::with_builtin().create(&config.detector_backend)?;
        backend.warm_up()?;
        std::fs::create_dir_all(&config.record_dir).with_context(|| {
            format!(
                "create record directory {}",
                config.record_dir.display()
            )
        })?;
        log::info!(
            "ObjectDetector: backend '{}', recording to {}",
            backend.name(),
            config.record_dir.display()
        );
        Ok(Self::new(backend, config.record_dir.clone()))
    }

    /// Run inference on the frame and hold the resulting detection sequence.
    pub fn infer(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.boxes = self.backend.detect(frame.as_bytes())?;
        sort_by_confidence(&mut self.boxes);
        Ok(())
    }

    /// Detection sequence from the most recent `infer`, top detection first.
    pub fn labeled_boxes(&self) -> &[Detection] {
        &self.boxes
    }

    /// Human-readable report of the current detections. Observability only;
    /// has no effect on the decision policy.
    pub fn print_report(&self) {
        if self.boxes.is_empty() {
            log::debug!("no detections");
            return;
        }
        for (rank, lbox) in self.boxes.iter().enumerate() {
            log::info!(
                "  [{}] {} {:.2}",
                rank + 1,
                lbox.class_name,
                lbox.confidence
            );
        }
    }

    /// Persist the frame and its detection sequence to the record
    /// directory: `<timestamp>.jpg` plus a `<timestamp>.json` sidecar.
    pub fn save_current_frame(&self, frame: &FrameBuffer, boxes: &[Detection]) -> Result<()> {
        let stem = Local::now().format(FRAME_NAME_FORMAT).to_string();
        let image_path = self.record_dir.join(format!("{stem}.jpg"));
        let boxes_path = self.record_dir.join(format!("{stem}.json"));

        std::fs::write(&image_path, frame.snapshot())
            .with_context(|| format!("write frame {}", image_path.display()))?;
        let sidecar = serde_json::to_vec_pretty(boxes)?;
        std::fs::write(&boxes_path, sidecar)
            .with_context(|| format!("write detections {}", boxes_path.display()))?;

        log::debug!("frame saved to {}", image_path.display());
        Ok(())
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::StubBackend;
    use crate::detect::result::BoundingBox;

    fn frame_with(bytes: &[u8]) -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        frame.refill(bytes);
        frame
    }

    #[test]
    fn infer_orders_boxes_by_descending_confidence() -> Result<()> {
        let backend = StubBackend::with_script(vec![vec![
            Detection::new("bird", 0.3, BoundingBox::full_frame()),
            Detection::new("deer", 0.8, BoundingBox::full_frame()),
        ]]);
        let dir = tempfile::tempdir()?;
        let mut detector = ObjectDetector::new(Box::new(backend), dir.path());

        detector.infer(&frame_with(b"frame"))?;

        let boxes = detector.labeled_boxes();
        assert_eq!(boxes[0].class_name, "deer");
        assert_eq!(boxes[1].class_name, "bird");
        Ok(())
    }

    #[test]
    fn infer_replaces_previous_detections() -> Result<()> {
        let backend = StubBackend::with_script(vec![
            vec![Detection::new("deer", 0.8, BoundingBox::full_frame())],
            vec![],
        ]);
        let dir = tempfile::tempdir()?;
        let mut detector = ObjectDetector::new(Box::new(backend), dir.path());

        detector.infer(&frame_with(b"one"))?;
        assert_eq!(detector.labeled_boxes().len(), 1);

        detector.infer(&frame_with(b"two"))?;
        assert!(detector.labeled_boxes().is_empty());
        Ok(())
    }

    #[test]
    fn save_current_frame_writes_image_and_sidecar() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let detector = ObjectDetector::new(Box::new(StubBackend::new()), dir.path());

        let frame = frame_with(b"encoded-jpeg-bytes");
        let boxes = vec![Detection::new("deer", 0.8, BoundingBox::full_frame())];
        detector.save_current_frame(&frame, &boxes)?;

        let mut images = 0;
        let mut sidecars = 0;
        for entry in std::fs::read_dir(dir.path())? {
            let path = entry?.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("jpg") => {
                    images += 1;
                    assert_eq!(std::fs::read(&path)?, b"encoded-jpeg-bytes");
                }
                Some("json") => {
                    sidecars += 1;
                    let parsed: Vec<Detection> =
                        serde_json::from_slice(&std::fs::read(&path)?)?;
                    assert_eq!(parsed[0].class_name, "deer");
                }
                _ => {}
            }
        }
        assert_eq!((images, sidecars), (1, 1));
        Ok(())
    }
}
