//! Batch-style dialect (`FormatB`, also used for unknown logs).
//!
//! ```text
//! Total enrollments: 1,500
//! Unique users: 700
//! Batch 1: 100 enrollments
//! ✓ Batch 1 success
//! Batch 2: 100 enrollments
//! ✗ Batch 2 failed: timeout
//! API call failed: core_course_get_courses
//! Enrollment complete: 1,400 success, 100 failed
//! ```
//!
//! The three summary rules run on every line; the rest form a first-match chain.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{capture, count, Flow, LineContext, Rule, Update};
use crate::model::{BatchStatus, CaptureError, LogLine};

static TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)total enrollments:\s*([\d,]+)").expect("valid total pattern")
});
static UNIQUE_USERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unique users:\s*([\d,]+)").expect("valid unique users pattern")
});
static UNIQUE_COURSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unique courses:\s*([\d,]+)").expect("valid unique courses pattern")
});
static BATCH_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)batch\s+(\d+):\s*([\d,]+)\s+enrollments").expect("valid batch pattern")
});
static SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d,]+)\s+success,\s*([\d,]+)\s+failed").expect("valid summary pattern")
});
static PREPARED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)prepared\s+([\d,]+)\s+enrollments\s*\(\s*([\d,]+)\s+skipped\s*\)")
        .expect("valid prepared pattern")
});

const SUCCESS_GLYPH: &str = "✓";
const FAILURE_GLYPH: &str = "✗";

pub const RULES: &[Rule] = &[
    Rule { name: "total_enrollments", guard: is_total, extract: total, flow: Flow::Continue },
    Rule { name: "unique_users", guard: is_unique_users, extract: unique_users, flow: Flow::Continue },
    Rule { name: "unique_courses", guard: is_unique_courses, extract: unique_courses, flow: Flow::Continue },
    Rule { name: "batch_open", guard: is_batch_open, extract: batch_open, flow: Flow::Stop },
    Rule { name: "batch_success", guard: is_batch_success, extract: batch_success, flow: Flow::Stop },
    Rule { name: "batch_failed", guard: is_batch_failed, extract: batch_failed, flow: Flow::Stop },
    Rule { name: "api_failure", guard: is_api_failure, extract: api_failure, flow: Flow::Stop },
    Rule { name: "enrollment_summary", guard: is_summary, extract: summary, flow: Flow::Stop },
    Rule { name: "prepared", guard: is_prepared, extract: prepared, flow: Flow::Stop },
];

fn is_total(line: &LogLine<'_>) -> bool {
    line.has("total enrollments:")
}

fn is_unique_users(line: &LogLine<'_>) -> bool {
    line.has("unique users:")
}

fn is_unique_courses(line: &LogLine<'_>) -> bool {
    line.has("unique courses:")
}

fn is_batch_open(line: &LogLine<'_>) -> bool {
    line.has_all(&["batch", "enrollments"])
}

fn is_batch_success(line: &LogLine<'_>) -> bool {
    line.has("success") && line.has_any(&["batch", SUCCESS_GLYPH])
}

fn is_batch_failed(line: &LogLine<'_>) -> bool {
    line.has("fail") && line.has_any(&["batch", FAILURE_GLYPH])
}

fn is_api_failure(line: &LogLine<'_>) -> bool {
    line.has_all(&["api call", "failed"])
}

fn is_summary(line: &LogLine<'_>) -> bool {
    line.has("enrollment complete:")
}

fn is_prepared(line: &LogLine<'_>) -> bool {
    line.has_all(&["prepared", "enrollments"])
}

fn single(re: &Regex, ctx: &LineContext<'_, '_>) -> Result<u64, CaptureError> {
    let caps = capture(re, ctx.line.text)?;
    count(&caps, 1)
}

fn total(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::TotalRecords(single(&TOTAL, ctx)?)))
}

fn unique_users(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::UsersFound(single(&UNIQUE_USERS, ctx)?)))
}

fn unique_courses(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::CoursesFound(single(&UNIQUE_COURSES, ctx)?)))
}

fn batch_open(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&BATCH_OPEN, ctx.line.text)?;
    Ok(Some(Update::BatchOpened {
        batch_id: count(&caps, 1)?,
        record_count: count(&caps, 2)?,
    }))
}

fn batch_success(_ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::BatchClosed(BatchStatus::Success)))
}

fn batch_failed(_ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::BatchClosed(BatchStatus::Failed)))
}

fn api_failure(_ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    Ok(Some(Update::ApiFailure))
}

fn summary(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&SUMMARY, ctx.line.text)?;
    Ok(Some(Update::Outcome { successful: count(&caps, 1)?, failed: count(&caps, 2)? }))
}

fn prepared(ctx: &LineContext<'_, '_>) -> Result<Option<Update>, CaptureError> {
    let caps = capture(&PREPARED, ctx.line.text)?;
    Ok(Some(Update::Prepared { total: count(&caps, 1)?, skipped: count(&caps, 2)? }))
}
