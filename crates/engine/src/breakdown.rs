//! Breakdown: category / code tallies over every line of the log.
//!
//! Independent of the dialect. A line counts for a code when the code text
//! occurs in it (case-sensitive) and the line also carries a guard token:
//! the semester marker or the word "course" (both case-insensitive). A line
//! naming several codes counts once for each of them.

use std::collections::BTreeMap;

use crate::registry::CodeRegistry;

const COURSE_TOKEN: &str = "course";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown {
    pub categories: BTreeMap<String, u64>,
    pub codes: BTreeMap<String, u64>,
}

impl Breakdown {
    fn record(&mut self, code: &str, category: &str) {
        *self.codes.entry(code.to_string()).or_insert(0) += 1;
        *self.categories.entry(category.to_string()).or_insert(0) += 1;
    }
}

pub struct BreakdownBuilder<'r> {
    registry: &'r CodeRegistry,
    semester_marker: String,
}

impl<'r> BreakdownBuilder<'r> {
    pub fn new(registry: &'r CodeRegistry, semester_marker: &str) -> Self {
        Self {
            registry,
            semester_marker: semester_marker.to_lowercase(),
        }
    }

    fn is_guarded(&self, lower: &str) -> bool {
        (!self.semester_marker.is_empty() && lower.contains(&self.semester_marker))
            || lower.contains(COURSE_TOKEN)
    }

    pub fn scan_line(&self, line: &str, into: &mut Breakdown) {
        if !self.is_guarded(&line.to_lowercase()) {
            return;
        }
        for (code, category) in self.registry.all_codes() {
            if line.contains(code) {
                into.record(code, category);
            }
        }
    }

    pub fn build<S: AsRef<str>>(&self, lines: &[S]) -> Breakdown {
        let mut breakdown = Breakdown::default();
        for line in lines {
            self.scan_line(line.as_ref(), &mut breakdown);
        }
        breakdown
    }
}
