use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// A backend receives one encoded frame and returns the labeled boxes it
/// found. Implementations must treat the frame bytes as read-only and
/// ephemeral; any state they keep (previous-frame hashes, model sessions)
/// is their own.
///
/// Backends are not required to order their output; the `ObjectDetector`
/// wrapper establishes the descending-confidence ordering after each call.
pub trait DetectorBackend: Send + std::fmt::Debug {
    /// Backend identifier, as referenced by `DETECTOR_BACKEND`.
    fn name(&self) -> &'static str;

    /// Run detection on one encoded frame.
    fn detect(&mut self, frame: &[u8]) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
