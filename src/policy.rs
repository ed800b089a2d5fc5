//! Decision policy for one capture cycle.
//!
//! Pure function of (detection sequence, configuration); all side effects
//! live in the dispatch loop. Precedence:
//!
//! 1. An empty detection sequence yields `NoAction`.
//! 2. With recording off, or the top detection at or below the confidence
//!    threshold, the cycle yields `NoAction` (the gate is strict
//!    greater-than, not >=).
//! 3. Otherwise the cycle is logged; it is additionally dispatched when any
//!    detected class name appears in the configured allow-list.

use crate::config::ScrubcamConfig;
use crate::detect::Detection;

/// What the loop should do with the current cycle's detections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing qualifying in this cycle.
    NoAction,
    /// Append a sighting-log entry only.
    LogOnly,
    /// Send/persist/alert on the frame, then append a sighting-log entry.
    LogAndDispatch,
}

/// Decide the verdict for one ordered detection sequence.
///
/// `lboxes` must be ordered by descending confidence; index 0 is the top
/// detection. Class matching is case-sensitive exact string comparison
/// against `filter_classes`, across ALL detections in the sequence, not
/// just the top one.
pub fn decide(lboxes: &[Detection], config: &ScrubcamConfig) -> Verdict {
    let Some(top) = lboxes.first() else {
        return Verdict::NoAction;
    };
    if !config.record || top.confidence <= config.record_conf_threshold {
        return Verdict::NoAction;
    }

    let any_filter_match = lboxes
        .iter()
        .any(|lbox| config.filter_classes.contains(&lbox.class_name));
    if any_filter_match {
        Verdict::LogAndDispatch
    } else {
        Verdict::LogOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn config(record: bool, threshold: f32, filter: &[&str]) -> ScrubcamConfig {
        ScrubcamConfig {
            record,
            record_conf_threshold: threshold,
            camera_resolution: (640, 480),
            camera_rotation: 0,
            filter_classes: filter.iter().map(|c| c.to_string()).collect::<HashSet<_>>(),
            headless: true,
            connect_remote_server: false,
            lora_on: false,
            camera_device: "stub://scene".to_string(),
            detector_backend: "stub".to_string(),
            record_dir: PathBuf::from("records"),
            remote_server_addr: None,
            lora_device: None,
        }
    }

    fn det(class: &str, confidence: f32) -> Detection {
        Detection::new(class, confidence, BoundingBox::full_frame())
    }

    #[test]
    fn empty_sequence_is_no_action() {
        let cfg = config(true, 0.6, &["deer"]);
        assert_eq!(decide(&[], &cfg), Verdict::NoAction);
    }

    #[test]
    fn record_disabled_is_no_action_regardless_of_confidence() {
        let cfg = config(false, 0.6, &["deer"]);
        assert_eq!(decide(&[det("deer", 0.99)], &cfg), Verdict::NoAction);
    }

    #[test]
    fn confidence_equal_to_threshold_is_no_action() {
        // The gate is strict greater-than.
        let cfg = config(true, 0.6, &["deer"]);
        assert_eq!(decide(&[det("deer", 0.6)], &cfg), Verdict::NoAction);
    }

    #[test]
    fn confidence_above_threshold_with_filter_match_dispatches() {
        let cfg = config(true, 0.6, &["deer", "fox"]);
        let lboxes = [det("deer", 0.8), det("bird", 0.3)];
        assert_eq!(decide(&lboxes, &cfg), Verdict::LogAndDispatch);
    }

    #[test]
    fn confidence_above_threshold_without_filter_match_logs_only() {
        let cfg = config(true, 0.6, &["deer", "fox"]);
        assert_eq!(decide(&[det("bird", 0.9)], &cfg), Verdict::LogOnly);
    }

    #[test]
    fn filter_match_considers_every_detection() {
        // Top detection misses the allow-list but a lower one hits it;
        // the cycle still dispatches.
        let cfg = config(true, 0.6, &["deer"]);
        let lboxes = [det("bird", 0.9), det("deer", 0.4)];
        assert_eq!(decide(&lboxes, &cfg), Verdict::LogAndDispatch);
    }

    #[test]
    fn filter_match_is_case_sensitive() {
        let cfg = config(true, 0.6, &["deer"]);
        assert_eq!(decide(&[det("Deer", 0.9)], &cfg), Verdict::LogOnly);
    }

    #[test]
    fn empty_filter_list_never_dispatches() {
        let cfg = config(true, 0.6, &[]);
        assert_eq!(decide(&[det("deer", 0.9)], &cfg), Verdict::LogOnly);
    }
}
