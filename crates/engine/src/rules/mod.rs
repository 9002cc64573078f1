//! Rules: per-dialect ordered line matchers.
//!
//! Every dialect maps to a closed table of rule groups. A rule is a cheap
//! case-insensitive guard plus an extractor that turns the line into a
//! partial [`Update`]. Rules run in table order; a matching rule with
//! [`Flow::Stop`] ends evaluation for that line even if its capture failed.

pub mod resolution;
pub mod batch;
pub mod push;

use regex::{Captures, Regex};
use tracing::trace;

use crate::model::{BatchStatus, CaptureError, Dialect, LogLine};

/// A partial metrics update produced by one rule for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    UsersResolved { found: u64, total: u64 },
    CoursesResolved { found: u64, total: u64 },
    UsersFound(u64),
    CoursesFound(u64),
    Prepared { total: u64, skipped: u64 },
    TotalRecords(u64),
    Outcome { successful: u64, failed: u64 },
    BatchOpened { batch_id: u64, record_count: u64 },
    BatchClosed(BatchStatus),
    ApiFailure,
    Unenrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep evaluating later rules on the same line
    Continue,
    /// A guard match ends evaluation for the line
    Stop,
}

/// What an extractor sees: the current line and the whole file (for lookahead).
pub struct LineContext<'l, 'a> {
    pub line: &'l LogLine<'a>,
    pub lines: &'l [&'a str],
}

pub type Guard = fn(&LogLine<'_>) -> bool;
pub type Extract = fn(&LineContext<'_, '_>) -> Result<Option<Update>, CaptureError>;

pub struct Rule {
    pub name: &'static str,
    pub guard: Guard,
    pub extract: Extract,
    pub flow: Flow,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("flow", &self.flow)
            .finish()
    }
}

const FORMAT_A: &[&[Rule]] = &[resolution::RULES];
const FORMAT_B: &[&[Rule]] = &[batch::RULES];
const FORMAT_C: &[&[Rule]] = &[push::RULES, batch::RULES];

/// Rule groups for a dialect, in evaluation order.
///
/// Unknown logs get the batch-style rules: with no recognized markers they
/// simply never match.
pub fn rule_table(dialect: Dialect) -> &'static [&'static [Rule]] {
    match dialect {
        Dialect::FormatA => FORMAT_A,
        Dialect::FormatB | Dialect::Unknown => FORMAT_B,
        Dialect::FormatC => FORMAT_C,
    }
}

/// Run a rule table against one line and collect the updates it produced.
pub fn evaluate(table: &[&[Rule]], ctx: &LineContext<'_, '_>) -> Vec<Update> {
    let mut updates = Vec::new();

    for rule in table.iter().flat_map(|group| group.iter()) {
        if !(rule.guard)(ctx.line) {
            continue;
        }

        match (rule.extract)(ctx) {
            Ok(Some(update)) => updates.push(update),
            Ok(None) => {}
            Err(e) => trace!(
                rule = rule.name,
                line = ctx.line.index,
                error = %e,
                "Rule matched but capture was unusable"
            ),
        }

        if rule.flow == Flow::Stop {
            break;
        }
    }

    updates
}

/// Parse a captured count, dropping thousands separators ("1,234" → 1234).
pub fn parse_count(raw: &str) -> Result<u64, CaptureError> {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    digits
        .trim()
        .parse()
        .map_err(|_| CaptureError::InvalidNumber(raw.to_string()))
}

pub(crate) fn capture<'t>(re: &Regex, text: &'t str) -> Result<Captures<'t>, CaptureError> {
    re.captures(text).ok_or(CaptureError::NoMatch)
}

pub(crate) fn count(caps: &Captures<'_>, group: usize) -> Result<u64, CaptureError> {
    let m = caps.get(group).ok_or(CaptureError::MissingGroup(group))?;
    parse_count(m.as_str())
}

/// Like [`count`], but an absent group counts as zero.
pub(crate) fn count_or_zero(caps: &Captures<'_>, group: usize) -> Result<u64, CaptureError> {
    match caps.get(group) {
        Some(m) => parse_count(m.as_str()),
        None => Ok(0),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Evaluate `table` on `lines[index]`.
    pub fn run(table: &[&[Rule]], lines: &[&str], index: usize) -> Vec<Update> {
        let line = LogLine::new(index, lines[index]);
        let ctx = LineContext { line: &line, lines };
        evaluate(table, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::run;

    #[test]
    fn test_parse_count_strips_separators() {
        assert_eq!(parse_count("1,234"), Ok(1234));
        assert_eq!(parse_count("12,345,678"), Ok(12_345_678));
        assert_eq!(parse_count("7"), Ok(7));
    }

    #[test]
    fn test_parse_count_rejects_garbage() {
        assert_eq!(parse_count(","), Err(CaptureError::InvalidNumber(",".into())));
        assert!(parse_count("").is_err());
        assert!(parse_count("99999999999999999999999").is_err());
    }

    #[test]
    fn test_rule_table_selection() {
        assert_eq!(rule_table(Dialect::FormatA).len(), 1);
        assert_eq!(rule_table(Dialect::FormatC).len(), 2);
        // Unknown shares the batch-style table
        let names = |d: Dialect| -> Vec<&str> {
            rule_table(d).iter().flat_map(|g| g.iter()).map(|r| r.name).collect()
        };
        assert_eq!(names(Dialect::Unknown), names(Dialect::FormatB));
        assert_eq!(names(Dialect::FormatC)[0], "push_complete");
    }

    #[test]
    fn test_stop_rule_ends_line_even_on_bad_capture() {
        // Guard for "batch ... enrollments" matches, capture fails, later rules are skipped
        let lines = ["Batch x: lots of enrollments, api call failed"];
        assert!(run(FORMAT_B, &lines, 0).is_empty());
    }

    #[test]
    fn test_continue_rules_stack_on_one_line() {
        let lines = ["Total enrollments: 1,500 | Unique users: 700 | Unique courses: 42"];
        let updates = run(FORMAT_B, &lines, 0);
        assert_eq!(updates, vec![
            Update::TotalRecords(1500),
            Update::UsersFound(700),
            Update::CoursesFound(42),
        ]);
    }
}
