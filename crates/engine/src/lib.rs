/// Enrolment-sync log metrics extraction
///
/// This crate turns the free-text log of an enrolment-sync run into a
/// [`MetricsSnapshot`]. It never touches the filesystem: callers hand it the
/// decoded lines and the file's modification time.
///
/// # Architecture
///
/// - `registry.rs`: Code → category lookup table
/// - `detector.rs`: Dialect detection over a bounded sample
/// - `rules/`: Per-dialect ordered line rules
/// - `accumulator.rs`: Running aggregate, batch tracking and reconciliation
/// - `breakdown.rs`: Category / code tallies
/// - `pipeline.rs`: Orchestrates one extraction pass
///
/// # Guarantees
///
/// - Never fails on malformed input (bad captures are skipped per line)
/// - Deterministic (no wall-clock reads)
/// - `total_records >= successful + errors` on every returned snapshot

pub mod model;
pub mod registry;
pub mod detector;
pub mod rules;
pub mod accumulator;
pub mod breakdown;
pub mod pipeline;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

// Re-export commonly used types
pub use model::{BatchState, BatchStatus, Dialect, LogLine, MetricsSnapshot};
pub use registry::CodeRegistry;
pub use detector::DialectDetector;
pub use pipeline::{ExtractOptions, Extractor};
pub use accumulator::reconcile;

// Constants
pub const DETECTION_SAMPLE_LINES: usize = 50;
pub const BATCH_LOOKAHEAD_LINES: usize = 5;
pub const RECENT_LINES: usize = 30;
pub const SEMESTER_MARKER: &str = "_SEM";

static DEFAULT_EXTRACTOR: Lazy<Extractor> = Lazy::new(Extractor::default);

/// Extract a snapshot using the built-in code registry and default options.
pub fn extract<S: AsRef<str>>(lines: &[S], file_mtime: DateTime<Utc>) -> MetricsSnapshot {
    DEFAULT_EXTRACTOR.extract(lines, file_mtime)
}
