use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Resolution-style logs ("Resolved N/M users", "Prepared N enrollments")
    FormatA,
    /// Batch-style logs ("Batch i: n enrollments" + per-batch outcome)
    FormatB,
    /// Push-style logs ("Push complete: N successful, M failed")
    FormatC,
    /// No recognized markers
    Unknown,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::FormatA => "format_a",
            Dialect::FormatB => "format_b",
            Dialect::FormatC => "format_c",
            Dialect::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Processing,
    Success,
    Failed,
}

/// A batch of enrolment records reported by the sync process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub batch_id: u64,
    pub record_count: u64,
    pub status: BatchStatus,
}

impl BatchState {
    pub fn open(batch_id: u64, record_count: u64) -> Self {
        Self {
            batch_id,
            record_count,
            status: BatchStatus::Processing,
        }
    }

    /// Terminate the batch. `Processing` is not a terminal status and is
    /// rejected (the batch is handed back unchanged).
    pub fn complete(mut self, status: BatchStatus) -> Result<Self, Self> {
        if status == BatchStatus::Processing {
            return Err(self);
        }
        self.status = status;
        Ok(self)
    }
}

/// One line of the log together with its position in the file.
///
/// The lower-cased copy is computed once and shared by every rule guard.
#[derive(Debug, Clone)]
pub struct LogLine<'a> {
    pub index: usize,
    pub text: &'a str,
    pub lower: String,
}

impl<'a> LogLine<'a> {
    pub fn new(index: usize, text: &'a str) -> Self {
        Self {
            index,
            text,
            lower: text.to_lowercase(),
        }
    }

    /// Case-insensitive containment; `needle` must already be lower-case.
    #[inline]
    pub fn has(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    pub fn has_all(&self, needles: &[&str]) -> bool {
        needles.iter().all(|n| self.has(n))
    }

    pub fn has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.has(n))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Pattern did not match")]
    NoMatch,

    #[error("Missing capture group {0}")]
    MissingGroup(usize),

    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
}

/// The result of one extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Modification time of the log file (not a time found in the log)
    pub last_run: DateTime<Utc>,
    pub dialect: Dialect,

    pub total_records: u64,
    pub successful: u64,
    pub errors: u64,
    pub skipped_records: u64,

    pub users_found: u64,
    pub users_missing: u64,
    pub courses_found: u64,
    pub courses_missing: u64,

    pub api_errors: u64,
    /// "successfully removed" lines (push-style logs)
    pub unenrolled: u64,

    /// Every "Batch i: n enrollments" line seen
    pub batches_opened: u64,
    /// Open batches discarded because a new batch started before they finished
    pub batches_dropped: u64,
    /// In completion order
    pub completed_batches: Vec<BatchState>,

    pub category_breakdown: BTreeMap<String, u64>,
    pub code_breakdown: BTreeMap<String, u64>,

    /// Most recent last
    pub recent_lines: Vec<String>,
}

impl MetricsSnapshot {
    pub fn empty(last_run: DateTime<Utc>) -> Self {
        Self {
            last_run,
            dialect: Dialect::Unknown,
            total_records: 0,
            successful: 0,
            errors: 0,
            skipped_records: 0,
            users_found: 0,
            users_missing: 0,
            courses_found: 0,
            courses_missing: 0,
            api_errors: 0,
            unenrolled: 0,
            batches_opened: 0,
            batches_dropped: 0,
            completed_batches: Vec::new(),
            category_breakdown: BTreeMap::new(),
            code_breakdown: BTreeMap::new(),
            recent_lines: Vec::new(),
        }
    }

    pub fn successful_batches(&self) -> usize {
        self.batches_with(BatchStatus::Success)
    }

    pub fn failed_batches(&self) -> usize {
        self.batches_with(BatchStatus::Failed)
    }

    fn batches_with(&self, status: BatchStatus) -> usize {
        self.completed_batches.iter().filter(|b| b.status == status).count()
    }

    /// Percentage of records that succeeded (0.0 when nothing was recorded).
    pub fn success_rate(&self) -> f64 {
        self.successful as f64 / self.total_records.max(1) as f64 * 100.0
    }

    /// Category tallies, highest count first (ties broken by name).
    pub fn ranked_categories(&self) -> Vec<(&str, u64)> {
        rank(&self.category_breakdown)
    }

    /// Code tallies, highest count first (ties broken by code).
    pub fn ranked_codes(&self) -> Vec<(&str, u64)> {
        rank(&self.code_breakdown)
    }
}

fn rank(map: &BTreeMap<String, u64>) -> Vec<(&str, u64)> {
    let mut entries: Vec<(&str, u64)> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    // BTreeMap iteration is already label-ordered, so a stable sort keeps ties by label
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}
