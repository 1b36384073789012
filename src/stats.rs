//! Per-task outcomes and run totals.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

// ============================================================================
// TaskResult
// ============================================================================

/// Outcome of one conversion task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    /// Size of the written PNG.
    pub byte_size: Option<u64>,
    pub error_message: Option<String>,
}

impl TaskResult {
    pub fn succeeded(output_path: PathBuf, byte_size: u64) -> Self {
        Self {
            success: true,
            output_path: Some(output_path),
            byte_size: Some(byte_size),
            error_message: None,
        }
    }

    pub fn failed(output_path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path,
            byte_size: None,
            error_message: Some(message.into()),
        }
    }
}

// ============================================================================
// ResultAggregator
// ============================================================================

/// Running totals for a conversion run.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub start_time: Instant,
}

/// Counts results as they come in.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    stats: RunStatistics,
}

impl ResultAggregator {
    /// Starts the clock for a run of `total` tasks.
    pub fn new(total: usize) -> Self {
        Self {
            stats: RunStatistics {
                total,
                successful: 0,
                failed: 0,
                total_bytes: 0,
                start_time: Instant::now(),
            },
        }
    }

    pub fn record(&mut self, result: &TaskResult) {
        if result.success {
            self.stats.successful += 1;
            self.stats.total_bytes += result.byte_size.unwrap_or(0);
        } else {
            self.stats.failed += 1;
        }
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Snapshot of the totals with the time elapsed since [`new`](Self::new).
    pub fn summarize(&self) -> RunSummary {
        RunSummary {
            total: self.stats.total,
            successful: self.stats.successful,
            failed: self.stats.failed,
            total_bytes: self.stats.total_bytes,
            elapsed_millis: self.stats.start_time.elapsed().as_millis() as u64,
        }
    }
}

// ============================================================================
// RunSummary
// ============================================================================

/// What a finished run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub elapsed_millis: u64,
}

impl RunSummary {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_millis)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} converted, {} failed, {} written in {:.2}s",
            self.successful,
            self.total,
            self.failed,
            human_bytes(self.total_bytes),
            self.elapsed().as_secs_f64()
        )
    }
}

/// Formats a byte count with a binary unit, e.g. `1.5 KiB`.
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
