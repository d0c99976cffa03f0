// src/progress.rs
//
// Upload progress reporting, decoupled from the transfer itself.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives `(bytes_transferred, total_bytes)` as a transfer advances.
/// `total` is `None` until the size is known.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, transferred: u64, total: Option<u64>);
}

impl<F> ProgressObserver for F
where
    F: Fn(u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        self(transferred, total)
    }
}

/// Percentage rounded to two decimals, or `None` while either side is unknown/zero.
pub fn percent(transferred: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 && transferred > 0 => {
            Some((transferred as f64 / total as f64 * 10_000.0).round() / 100.0)
        }
        _ => None,
    }
}

/// One-line status text: `Uploaded 50%`, `Uploaded 33.33%` or `Starting upload...`.
pub fn progress_message(transferred: u64, total: Option<u64>) -> String {
    match percent(transferred, total) {
        // f64 Display drops trailing zeros: 50.0 -> "50"
        Some(p) => format!("Uploaded {}%", p),
        None => "Starting upload...".to_string(),
    }
}

/// Single line rewritten in place on stderr.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// For tests and non-interactive runs.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        // "{msg}" is a constant, valid template
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            bar.set_style(style);
        }
        Self { bar }
    }

    /// Current message, mainly for tests.
    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Leave the last message on screen and end the line.
    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, transferred: u64, total: Option<u64>) {
        self.bar.set_message(progress_message(transferred, total));
    }
}
