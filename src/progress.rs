//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Phases of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Load,
    Compare,
    Write,
}

impl Phase {
    fn message(&self) -> &'static str {
        match self {
            Phase::Load => "Loading snapshots...",
            Phase::Compare => "Classifying rows...",
            Phase::Write => "Writing result files...",
        }
    }
}

/// Progress reporter for a reconciliation run
#[derive(Debug)]
pub struct ProgressReporter {
    current: Option<ProgressBar>,
    show_progress: bool,
    start_time: std::time::Instant,
}

impl ProgressReporter {
    /// Create progress reporter with spinners on stderr
    pub fn new() -> Self {
        Self {
            current: None,
            show_progress: true,
            start_time: std::time::Instant::now(),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            current: None,
            show_progress: false,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.show_progress
    }

    /// Start a phase, clearing whatever spinner was running
    pub fn start(&mut self, phase: Phase) {
        log::debug!("{}", phase.message());
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        if self.show_progress {
            self.current = Some(create_spinner(phase.message()));
        }
    }

    /// Finish the running phase with a message
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

/// Create a spinner progress bar
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
