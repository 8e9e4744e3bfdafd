//! Build progress notifications.

use std::time::Duration;

use tracing::info;

use crate::builder::BuildStats;

/// Snapshot taken after each completed chunk.
#[derive(Clone, Debug)]
pub struct ChunkProgress {
    /// Zero-based index of the chunk that just finished
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Distinct buckets so far
    pub buckets: usize,
    /// Accepted samples so far
    pub contributions: u64,
    pub elapsed: Duration,
}

impl ChunkProgress {
    pub fn fraction(&self) -> f64 {
        if self.total_chunks == 0 {
            return 1.0;
        }
        (self.chunk_index + 1) as f64 / self.total_chunks as f64
    }

    pub fn adds_per_second(&self) -> f64 {
        self.contributions as f64 / (self.elapsed.as_secs_f64() + 1e-8)
    }
}

/// Receives build progress. Implementations must not affect the result.
pub trait ProgressReporter {
    fn on_chunk(&mut self, progress: &ChunkProgress);

    fn on_complete(&mut self, _stats: &BuildStats) {}
}

/// Discards every notification.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn on_chunk(&mut self, _progress: &ChunkProgress) {}
}

/// Logs a line each time progress crosses another `step` of the build.
#[derive(Debug)]
pub struct LogProgress {
    step: f64,
    next_mark: f64,
}

impl LogProgress {
    /// `step` is a fraction in (0, 1]; out-of-range values fall back to 5%.
    pub fn new(step: f64) -> Self {
        let step = if step > 0.0 && step <= 1.0 { step } else { 0.05 };
        LogProgress {
            step,
            next_mark: step,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        LogProgress::new(0.05)
    }
}

impl ProgressReporter for LogProgress {
    fn on_chunk(&mut self, progress: &ChunkProgress) {
        let fraction = progress.fraction();
        if fraction + 1e-12 < self.next_mark {
            return;
        }
        while self.next_mark <= fraction + 1e-12 {
            self.next_mark += self.step;
        }
        info!(
            "{:6.2}% | chunk {}/{} | {} buckets | {:.0} adds/s",
            fraction * 100.0,
            progress.chunk_index + 1,
            progress.total_chunks,
            progress.buckets,
            progress.adds_per_second()
        );
    }

    fn on_complete(&mut self, stats: &BuildStats) {
        info!(
            "Build complete: {} chunks, {} buckets, {} contributions in {:.2?}",
            stats.chunks, stats.buckets, stats.contributions, stats.elapsed
        );
    }
}
