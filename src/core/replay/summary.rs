//! Run ledgers and reporting
//!
//! A [`RunResult`] is created per run, threaded through the loop and handed
//! back to the caller. It holds the two append-only ledgers.

use crate::domain::RecordId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Exit code for a clean run
pub const EXIT_OK: i32 = 0;
/// Exit code when at least one record failed
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code when the operator stopped the run
pub const EXIT_STOPPED: i32 = 130;

/// Outcome of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// Sent and accepted by the target
    Ok,
    /// Built in test mode, nothing sent
    TestOk,
    Error,
}

impl fmt::Display for LedgerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Ok => "OK",
            Self::TestOk => "TEST-OK",
            Self::Error => "ERROR",
        };
        f.write_str(tag)
    }
}

/// One ledger line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub timestamp: DateTime<Utc>,
    pub outcome: LedgerOutcome,
    pub record_id: RecordId,
    pub detail: String,
}

impl LedgerEntry {
    pub fn new(outcome: LedgerOutcome, record_id: RecordId, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            outcome,
            record_id,
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome == LedgerOutcome::Error
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.outcome,
            self.record_id
        )?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Result of one replay run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Correlates log lines of one run
    pub run_id: Uuid,

    /// Records retrieved for the run
    pub total_records: usize,

    pub successes: Vec<LedgerEntry>,
    pub errors: Vec<LedgerEntry>,

    /// The operator stopped the run before every record was processed
    pub stopped: bool,

    pub duration: Duration,
}

impl RunResult {
    pub fn new(total_records: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total_records,
            successes: Vec::new(),
            errors: Vec::new(),
            stopped: false,
            duration: Duration::ZERO,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Appends an entry to the ledger matching its outcome
    pub fn record(&mut self, entry: LedgerEntry) {
        if entry.is_error() {
            self.errors.push(entry);
        } else {
            self.successes.push(entry);
        }
    }

    /// Records that produced a ledger entry
    pub fn processed(&self) -> usize {
        self.successes.len() + self.errors.len()
    }

    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && !self.stopped
    }

    /// Process exit code for this result
    pub fn exit_code(&self) -> i32 {
        if self.stopped {
            EXIT_STOPPED
        } else if !self.errors.is_empty() {
            EXIT_PARTIAL
        } else {
            EXIT_OK
        }
    }

    /// Final printout: successes, then errors, then counts
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.processed() + 6);

        lines.push(format!("Successes ({}):", self.successes.len()));
        lines.extend(self.successes.iter().map(|e| format!("  {e}")));

        lines.push(format!("Errors ({}):", self.errors.len()));
        lines.extend(self.errors.iter().map(|e| format!("  {e}")));

        lines.push(format!(
            "Processed {} of {} record(s): {} succeeded, {} failed{}",
            self.processed(),
            self.total_records,
            self.successes.len(),
            self.errors.len(),
            if self.stopped { " (stopped by operator)" } else { "" }
        ));
        lines
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            total = self.total_records,
            processed = self.processed(),
            successful = self.successes.len(),
            failed = self.errors.len(),
            stopped = self.stopped,
            duration_ms = self.duration.as_millis() as u64,
            "Replay completed"
        );

        for entry in &self.errors {
            tracing::warn!(
                run_id = %self.run_id,
                record_id = %entry.record_id,
                detail = %entry.detail,
                "Replay error"
            );
        }
    }
}
