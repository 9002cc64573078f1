use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::accumulator::MetricsAccumulator;
use crate::breakdown::BreakdownBuilder;
use crate::detector::DialectDetector;
use crate::model::{LogLine, MetricsSnapshot};
use crate::registry::CodeRegistry;
use crate::rules::{evaluate, rule_table, LineContext};

/// Tunables for one extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// How many trailing lines to keep as recent activity
    pub recent_lines: usize,
    /// How many leading lines the dialect detector looks at
    pub detection_sample_lines: usize,
    /// Substring that marks a semester-qualified course id (e.g. `ANLA101_SEM1`)
    pub semester_marker: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            recent_lines: super::RECENT_LINES,
            detection_sample_lines: super::DETECTION_SAMPLE_LINES,
            semester_marker: super::SEMESTER_MARKER.to_string(),
        }
    }
}

/// Extraction pipeline
/// 1. Detect the dialect from the head of the file
/// 2. Fold every line through the dialect's rule table (carrying the open batch)
/// 3. Tally the category / code breakdown over all lines
/// 4. Reconcile totals
/// 5. Keep the tail of the file as recent activity
///
/// Holds no per-call state, so one extractor can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct Extractor {
    registry: Arc<CodeRegistry>,
    detector: DialectDetector,
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(registry: Arc<CodeRegistry>, options: ExtractOptions) -> Self {
        Self {
            registry,
            detector: DialectDetector::new(options.detection_sample_lines),
            options,
        }
    }

    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn extract<S: AsRef<str>>(&self, lines: &[S], file_mtime: DateTime<Utc>) -> MetricsSnapshot {
        let texts: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();
        let _span = debug_span!("extract", lines = texts.len()).entered();

        let dialect = self.detector.detect(&texts);
        let table = rule_table(dialect);

        let mut start = MetricsSnapshot::empty(file_mtime);
        start.dialect = dialect;

        let mut acc = texts
            .iter()
            .enumerate()
            .fold(MetricsAccumulator::new(start), |mut acc, (index, text)| {
                let line = LogLine::new(index, text);
                let ctx = LineContext { line: &line, lines: &texts };
                for update in evaluate(table, &ctx) {
                    acc.apply(update);
                }
                acc
            });

        let breakdown = BreakdownBuilder::new(&self.registry, &self.options.semester_marker).build(&texts);
        acc.snapshot.category_breakdown = breakdown.categories;
        acc.snapshot.code_breakdown = breakdown.codes;

        let mut snapshot = acc.finish();
        snapshot.recent_lines = recent_activity(&texts, self.options.recent_lines);

        debug!(
            dialect = %snapshot.dialect,
            total = snapshot.total_records,
            successful = snapshot.successful,
            errors = snapshot.errors,
            batches = snapshot.completed_batches.len(),
            "Extraction finished"
        );
        snapshot
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Arc::new(CodeRegistry::default()), ExtractOptions::default())
    }
}

/// The last `keep` lines, trimmed, with blank lines dropped.
fn recent_activity(lines: &[&str], keep: usize) -> Vec<String> {
    let start = lines.len().saturating_sub(keep);
    lines[start..]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
