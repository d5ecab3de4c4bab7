//! Stage report types for structured batch-outcome reporting.
//!
//! Every pipeline stage returns a [`StageReport`] instead of relying on
//! console output as its only observability channel, so tests and callers
//! can assert on outcomes directly. A skip is expected and benign (for
//! example a derived image that has not been rendered yet); a failure means
//! a unit of work could not be completed and must never be silently dropped.

use serde::Serialize;
use std::fmt;

/// The outcome summary of one pipeline stage run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StageReport {
    /// Stage name, e.g. "rotate" or "merge".
    pub stage: String,
    /// Number of work units that completed and produced output.
    pub processed: usize,
    /// Work units skipped for benign, expected reasons.
    pub skips: Vec<StageSkip>,
    /// Work units that could not be completed.
    pub failures: Vec<StageFailure>,
}

impl StageReport {
    /// Creates a new empty report for the named stage.
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            ..Default::default()
        }
    }

    /// Records a completed work unit.
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    /// Records a benign skip.
    pub fn record_skip(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.skips.push(StageSkip {
            file: file.into(),
            reason: reason.into(),
        });
    }

    /// Records a failed work unit.
    pub fn record_failure(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(StageFailure {
            file: file.into(),
            reason: reason.into(),
        });
    }

    /// Number of skipped work units.
    pub fn skip_count(&self) -> usize {
        self.skips.len()
    }

    /// Number of failed work units.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if no work unit failed.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Folds a batch of per-file outcomes into this report.
    ///
    /// Parallel stages fan out per-file work, collect [`FileOutcome`]s, and
    /// fan in through this single aggregation point.
    pub fn absorb(&mut self, outcomes: Vec<FileOutcome>) {
        for outcome in outcomes {
            match outcome {
                FileOutcome::Processed => self.processed += 1,
                FileOutcome::Skipped { file, reason } => self.skips.push(StageSkip {
                    file,
                    reason,
                }),
                FileOutcome::Failed { file, reason } => self.failures.push(StageFailure {
                    file,
                    reason,
                }),
            }
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} processed, {} skipped, {} failed",
            self.stage,
            self.processed,
            self.skip_count(),
            self.failure_count()
        )?;

        if !self.skips.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", self.skip_count())?;
            for skip in &self.skips {
                writeln!(f, "  - {}: {}", skip.file, skip.reason)?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed ({}):", self.failure_count())?;
            for failure in &self.failures {
                writeln!(f, "  - {}: {}", failure.file, failure.reason)?;
            }
        }

        Ok(())
    }
}

/// A benign, expected skip of one work unit.
#[derive(Clone, Debug, Serialize)]
pub struct StageSkip {
    pub file: String,
    pub reason: String,
}

/// A failed work unit with its reason.
#[derive(Clone, Debug, Serialize)]
pub struct StageFailure {
    pub file: String,
    pub reason: String,
}

/// Per-file result produced inside a stage's parallel loop.
#[derive(Clone, Debug)]
pub enum FileOutcome {
    Processed,
    Skipped { file: String, reason: String },
    Failed { file: String, reason: String },
}

impl FileOutcome {
    /// Convenience constructor for skips.
    pub fn skipped(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Skipped {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for failures.
    pub fn failed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            file: file.into(),
            reason: reason.into(),
        }
    }
}
