use std::collections::VecDeque;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};

const MOTION_CLASS: &str = "motion";
const MOTION_CONFIDENCE: f32 = 0.85;

/// Stub backend for development and tests.
///
/// By default it hashes each frame and reports a single full-frame "motion"
/// detection whenever the hash changes. A scripted variant replays a fixed
/// sequence of detection lists instead, one list per frame, then returns
/// empty sequences once the script is exhausted.
#[derive(Debug)]
pub struct StubBackend {
    last_hash: Option<[u8; 32]>,
    script: Option<VecDeque<Vec<Detection>>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            last_hash: None,
            script: None,
        }
    }

    pub fn with_script<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Vec<Detection>>,
    {
        Self {
            last_hash: None,
            script: Some(script.into_iter().collect()),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &[u8]) -> Result<Vec<Detection>> {
        if let Some(script) = &mut self.script {
            return Ok(script.pop_front().unwrap_or_default());
        }

        let current_hash: [u8; 32] = Sha256::digest(frame).into();
        let motion = match self.last_hash {
            Some(prev) => prev != current_hash,
            None => false,
        };
        self.last_hash = Some(current_hash);

        if motion {
            Ok(vec![Detection::new(
                MOTION_CLASS,
                MOTION_CONFIDENCE,
                BoundingBox::full_frame(),
            )])
        } else {
            Ok(vec![])
        }
    }
}
