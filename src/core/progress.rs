//! Scan progress reporting.

use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub done: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl ScanProgress {
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Receives rate-limited progress updates. Calls happen off the workers' path, so
/// implementations should return quickly.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: ScanProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(ScanProgress) + Send + Sync,
{
    fn on_progress(&self, progress: ScanProgress) {
        self(progress)
    }
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _progress: ScanProgress) {}
}

/// Logs each update at info level.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, progress: ScanProgress) {
        info!(
            done = progress.done,
            total = progress.total,
            elapsed_ms = progress.elapsed.as_millis() as u64,
            "Scan progress: {}/{} ({:.1}s)",
            progress.done,
            progress.total,
            progress.elapsed.as_secs_f64()
        );
    }
}
