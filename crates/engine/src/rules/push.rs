//! Push-style dialect (`FormatC`).
//!
//! Evaluated ahead of the batch-style rules; "successfully removed" would
//! otherwise be taken for a batch success marker when a ✓ glyph is present.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture, count, Flow, LineContext, Rule, Update};
use crate::model::{CaptureError, LogLine};

static PUSH_COMPLETE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)push complete:\s*([\d,]+)\s+successful,\s*([\d,]+)\s+failed")
        .expect("valid push pattern")
});

pub const RULES: &[Rule] = &[
    Rule { name: "push_complete", guard: is_push_complete, extract: push_complete, flow: Flow::Stop },
    Rule { name: "unenrolled", guard: is_removed, extract: removed, flow: Flow::Stop },
];

fn is_push_complete(line: &LogLine<'_>) -> bool {
    line.has("push complete:")
}

fn is_removed(line: &LogLine<'_>) -> bool {
    line.has("successfully removed")
}

fn push_complete(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&PUSH_COMPLETE, ctx.line.text)?;
    Ok(Some(Update::Outcome { successful: count(&caps, 1)?, failed: count(&caps, 2)? }))
}

fn removed(_ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::Unenrolled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;
    use crate::rules::rule_table;
    use crate::rules::test_support::run;

    fn one(line: &str) -> Vec<Update> {
        run(rule_table(Dialect::FormatC), &[line], 0)
    }

    #[test]
    fn test_push_complete() {
        assert_eq!(
            one("INFO - Push complete: 2,310 successful, 12 failed"),
            vec![Update::Outcome { successful: 2310, failed: 12 }]
        );
    }

    #[test]
    fn test_push_complete_unparseable() {
        assert!(one("Push complete: see report").is_empty());
    }

    #[test]
    fn test_removed_is_not_a_batch_success() {
        assert_eq!(
            one("✓ Successfully removed user 4411 from ANLA101_SEM1"),
            vec![Update::Unenrolled]
        );
    }

    #[test]
    fn test_falls_through_to_batch_rules() {
        assert_eq!(
            one("Batch 3: 25 enrollments"),
            vec![Update::BatchOpened { batch_id: 3, record_count: 25 }]
        );
    }
}
