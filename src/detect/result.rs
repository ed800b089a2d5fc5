use serde::{Deserialize, Serialize};

/// One object-detection result: a labeled box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub class_name: String,
    /// Detection confidence in [0, 1].
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

/// Bounding box (normalized 0..1 coordinates).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn full_frame() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        }
    }
}

impl Detection {
    pub fn new(class_name: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            bounding_box,
        }
    }
}

/// Order a detection sequence by descending confidence, so index 0 is the
/// top detection.
pub fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}
