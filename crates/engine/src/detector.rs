use tracing::debug;

use crate::model::Dialect;

/// One step of the detection chain: every needle must occur in the sample.
#[derive(Debug, Clone, Copy)]
pub struct DetectionRule {
    pub needles: &'static [&'static str],
    pub dialect: Dialect,
}

/// Order matters! Resolution markers win over push markers, and the
/// "prepared ... enrollments" fallback is checked last because that phrase
/// also shows up in batch-style logs.
const DETECTION_CHAIN: &[DetectionRule] = &[
    DetectionRule { needles: &["resolved", "users"], dialect: Dialect::FormatA },
    DetectionRule { needles: &["push complete:"], dialect: Dialect::FormatC },
    DetectionRule { needles: &["batch", "enrolments"], dialect: Dialect::FormatB },
    DetectionRule { needles: &["prepared", "enrollments"], dialect: Dialect::FormatA },
];

/// Dialect detector over a bounded prefix of the file
/// 1. Join the first `sample_lines` lines with spaces and lower-case them
/// 2. Walk the detection chain, first match wins
/// 3. Nothing matched → `Dialect::Unknown`
#[derive(Debug, Clone)]
pub struct DialectDetector {
    sample_lines: usize,
}

impl DialectDetector {
    pub fn new(sample_lines: usize) -> Self {
        Self { sample_lines }
    }

    pub fn detect<S: AsRef<str>>(&self, lines: &[S]) -> Dialect {
        let end = lines.len().min(self.sample_lines);
        let sample = lines[..end]
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let dialect = DETECTION_CHAIN
            .iter()
            .find(|rule| rule.needles.iter().all(|n| sample.contains(n)))
            .map(|rule| rule.dialect)
            .unwrap_or(Dialect::Unknown);

        debug!(dialect = %dialect, sampled = end, "Detected log dialect");
        dialect
    }
}

impl Default for DialectDetector {
    fn default() -> Self {
        Self::new(super::DETECTION_SAMPLE_LINES)
    }
}
