//! Resolution-style dialect (`FormatA`).
//!
//! ```text
//! Resolved 812/830 users
//! Resolved 57/60 courses
//! Prepared 1,204 enrollments (18 skipped)
//! Enrollment complete.
//! Successful: 1,180 Failed: 6
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture, count, count_or_zero, Flow, LineContext, Rule, Update};
use crate::model::{CaptureError, LogLine};
use crate::BATCH_LOOKAHEAD_LINES;

static USERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)resolved\s+([\d,]+)\s*/\s*([\d,]+)\s+users").expect("valid users pattern")
});
static COURSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)resolved\s+([\d,]+)\s*/\s*([\d,]+)\s+courses").expect("valid courses pattern")
});
// The skipped count may sit before or after the word "enrollments", or be absent
static PREPARED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)prepared\s+([\d,]+)(?:[^(]*\(\s*([\d,]+)\s+skipped\s*\))?")
        .expect("valid prepared pattern")
});
static OUTCOME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)successful:\s*([\d,]+).*?failed:\s*([\d,]+)").expect("valid outcome pattern")
});

pub const RULES: &[Rule] = &[
    Rule { name: "resolved_users", guard: is_users, extract: users, flow: Flow::Stop },
    Rule { name: "resolved_courses", guard: is_courses, extract: courses, flow: Flow::Stop },
    Rule { name: "prepared", guard: is_prepared, extract: prepared, flow: Flow::Stop },
    Rule { name: "enrollment_complete", guard: is_complete, extract: outcome_lookahead, flow: Flow::Stop },
];

fn is_users(line: &LogLine<'_>) -> bool {
    line.has_all(&["resolved", "users"])
}

fn is_courses(line: &LogLine<'_>) -> bool {
    line.has_all(&["resolved", "courses"])
}

fn is_prepared(line: &LogLine<'_>) -> bool {
    line.has_all(&["prepared", "enrollments"])
}

fn is_complete(line: &LogLine<'_>) -> bool {
    line.has("enrollment complete")
}

fn users(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&USERS, ctx.line.text)?;
    Ok(Some(Update::UsersResolved { found: count(&caps, 1)?, total: count(&caps, 2)? }))
}

fn courses(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&COURSES, ctx.line.text)?;
    Ok(Some(Update::CoursesResolved { found: count(&caps, 1)?, total: count(&caps, 2)? }))
}

fn prepared(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&PREPARED, ctx.line.text)?;
    Ok(Some(Update::Prepared { total: count(&caps, 1)?, skipped: count_or_zero(&caps, 2)? }))
}

/// The summary counts are written on one of the lines following the
/// "Enrollment complete" marker. Scan a small window starting at the marker
/// and stop at the first line carrying both labels.
fn outcome_lookahead(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let start = ctx.line.index;
    let end = ctx.lines.len().min(start + BATCH_LOOKAHEAD_LINES);

    let found = ctx.lines.get(start..end).unwrap_or_default().iter().find(|candidate| {
        let lower = candidate.to_lowercase();
        lower.contains("successful:") && lower.contains("failed:")
    });

    let Some(summary) = found else {
        return Ok(None);
    };

    let caps = capture(&OUTCOME, summary)?;
    Ok(Some(Update::Outcome { successful: count(&caps, 1)?, failed: count(&caps, 2)? }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::run;

    const TABLE: &[&[Rule]] = &[RULES];

    #[test]
    fn test_resolved_users() {
        let lines = ["2026-03-02 06:00:04 - INFO - Resolved 8/10 users"];
        assert_eq!(run(TABLE, &lines, 0), vec![Update::UsersResolved { found: 8, total: 10 }]);
    }

    #[test]
    fn test_resolved_courses_with_separators() {
        let lines = ["Resolved 1,050/1,100 courses"];
        assert_eq!(
            run(TABLE, &lines, 0),
            vec![Update::CoursesResolved { found: 1050, total: 1100 }]
        );
    }

    #[test]
    fn test_lookahead_with_index_past_end_finds_nothing() {
        let lines = ["Enrollment complete.", "Successful: 98 Failed: 2"];
        let line = LogLine::new(7, "Enrollment complete.");
        let ctx = LineContext { line: &line, lines: &lines };
        assert_eq!(outcome_lookahead(&ctx), Ok(None));
    }

    #[test]
    fn test_prepared_variants() {
        let lines = [
            "Prepared 100 enrollments (2 skipped)",
            "Prepared 1,204 (18 skipped) enrollments",
            "Prepared 40 enrollments",
        ];
        assert_eq!(run(TABLE, &lines, 0), vec![Update::Prepared { total: 100, skipped: 2 }]);
        assert_eq!(run(TABLE, &lines, 1), vec![Update::Prepared { total: 1204, skipped: 18 }]);
        assert_eq!(run(TABLE, &lines, 2), vec![Update::Prepared { total: 40, skipped: 0 }]);
    }

    #[test]
    fn test_outcome_on_following_line() {
        let lines = ["Enrollment complete.", "Successful: 98 Failed: 0"];
        assert_eq!(
            run(TABLE, &lines, 0),
            vec![Update::Outcome { successful: 98, failed: 0 }]
        );
    }

    #[test]
    fn test_outcome_on_marker_line() {
        let lines = ["Enrollment complete - successful: 1,180, failed: 6"];
        assert_eq!(
            run(TABLE, &lines, 0),
            vec![Update::Outcome { successful: 1180, failed: 6 }]
        );
    }

    #[test]
    fn test_outcome_outside_window_is_ignored() {
        let lines = [
            "Enrollment complete.",
            "a",
            "b",
            "c",
            "d",
            "Successful: 98 Failed: 0",
        ];
        assert!(run(TABLE, &lines, 0).is_empty());
    }

    #[test]
    fn test_outcome_window_truncated_at_end_of_file() {
        let lines = ["noise", "Enrollment complete."];
        assert!(run(TABLE, &lines, 1).is_empty());
    }

    #[test]
    fn test_unparseable_users_line_is_skipped() {
        let lines = ["Resolved all users"];
        assert!(run(TABLE, &lines, 0).is_empty());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // Both resolution guards match; users comes first in the table
        let lines = ["Resolved 3/4 users across resolved courses"];
        assert_eq!(run(TABLE, &lines, 0), vec![Update::UsersResolved { found: 3, total: 4 }]);
    }
}
