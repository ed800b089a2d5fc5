//! Local detection preview.
//!
//! Minimal on-device visualization for deployments with an attached
//! terminal: a steady-tick spinner on stderr whose message tracks the most
//! recent detection sequence. Headless deployments construct no `Display`
//! at all.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::detect::Detection;

/// Detections shown before the preview line truncates.
const PREVIEW_SLOTS: usize = 4;

pub struct Display {
    spinner: ProgressBar,
}

impl Display {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_draw_target(ProgressDrawTarget::stderr());
        spinner.enable_steady_tick(Duration::from_millis(120));
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message("watching…");
        Self { spinner }
    }

    /// Show the current cycle's detection sequence.
    pub fn update(&mut self, lboxes: &[Detection]) {
        if lboxes.is_empty() {
            self.spinner.set_message("watching…");
            return;
        }
        let summary: Vec<String> = lboxes
            .iter()
            .take(PREVIEW_SLOTS)
            .map(|lbox| format!("{} {:.2}", lbox.class_name, lbox.confidence))
            .collect();
        self.spinner.set_message(summary.join("  "));
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}
