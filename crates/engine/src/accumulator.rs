//! Accumulator: folds rule updates into a snapshot and reconciles totals.

use tracing::{debug, trace, warn};

use crate::model::{BatchState, BatchStatus, MetricsSnapshot};
use crate::rules::Update;

/// Snapshot-in-progress for one extraction pass.
///
/// `open_batch` is the in-flight batch slot. Transitions:
/// - `BatchOpened` with the slot empty → slot holds the new batch
/// - `BatchOpened` with the slot taken → previous batch is dropped, slot holds the new one
/// - `BatchClosed(Success | Failed)` → batch moves to `completed_batches`, slot cleared
/// - `BatchClosed` with the slot empty → ignored
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    pub snapshot: MetricsSnapshot,
    pub open_batch: Option<BatchState>,
}

impl MetricsAccumulator {
    pub fn new(snapshot: MetricsSnapshot) -> Self {
        Self {
            snapshot,
            open_batch: None,
        }
    }

    /// Apply one partial update. Scalar fields are last-match-wins.
    pub fn apply(&mut self, update: Update) {
        let s = &mut self.snapshot;

        match update {
            Update::UsersResolved { found, total } => {
                s.users_found = found;
                s.users_missing = total.saturating_sub(found);
            }
            Update::CoursesResolved { found, total } => {
                s.courses_found = found;
                s.courses_missing = total.saturating_sub(found);
            }
            Update::UsersFound(found) => s.users_found = found,
            Update::CoursesFound(found) => s.courses_found = found,
            Update::Prepared { total, skipped } => {
                s.total_records = total;
                s.skipped_records = skipped;
            }
            Update::TotalRecords(total) => s.total_records = total,
            Update::Outcome { successful, failed } => {
                s.successful = successful;
                s.errors = failed;
            }
            Update::BatchOpened { batch_id, record_count } => {
                s.batches_opened += 1;
                if let Some(dropped) = self.open_batch.replace(BatchState::open(batch_id, record_count)) {
                    s.batches_dropped += 1;
                    warn!(
                        dropped_batch = dropped.batch_id,
                        dropped_records = dropped.record_count,
                        next_batch = batch_id,
                        "Batch superseded before it finished; discarding it"
                    );
                }
            }
            Update::BatchClosed(status) => self.close_batch(status),
            Update::ApiFailure => {
                s.api_errors += 1;
                // An in-flight batch accounts for its own records when it closes
                if self.open_batch.is_none() {
                    s.errors = s.errors.saturating_add(1);
                }
            }
            Update::Unenrolled => s.unenrolled += 1,
        }
    }

    fn close_batch(&mut self, status: BatchStatus) {
        let Some(batch) = self.open_batch.take() else {
            trace!(?status, "Batch outcome marker without an open batch");
            return;
        };

        match batch.complete(status) {
            Ok(done) => {
                let s = &mut self.snapshot;
                match done.status {
                    BatchStatus::Success => s.successful = s.successful.saturating_add(done.record_count),
                    BatchStatus::Failed => s.errors = s.errors.saturating_add(done.record_count),
                    BatchStatus::Processing => {}
                }
                trace!(batch = done.batch_id, records = done.record_count, status = ?done.status, "Batch completed");
                s.completed_batches.push(done);
            }
            Err(still_open) => self.open_batch = Some(still_open),
        }
    }

    /// End the pass: reconcile and hand out the snapshot.
    pub fn finish(mut self) -> MetricsSnapshot {
        if let Some(batch) = self.open_batch.take() {
            debug!(batch = batch.batch_id, records = batch.record_count, "Log ended with a batch still open");
        }
        reconcile(&mut self.snapshot);
        self.snapshot
    }
}

/// Fill in totals the log did not state explicitly.
///
/// 1. No outcome at all → derive successful/errors from completed batches
/// 2. No total → successful + errors + skipped
/// 3. Total never below successful + errors
///
/// Running it again on its own output changes nothing.
pub fn reconcile(snapshot: &mut MetricsSnapshot) {
    if snapshot.successful == 0 && snapshot.errors == 0 {
        let (successful, errors) = snapshot.completed_batches.iter().fold((0u64, 0u64), |(ok, bad), b| {
            match b.status {
                BatchStatus::Success => (ok.saturating_add(b.record_count), bad),
                BatchStatus::Failed => (ok, bad.saturating_add(b.record_count)),
                BatchStatus::Processing => (ok, bad),
            }
        });
        if successful > 0 || errors > 0 {
            debug!(successful, errors, "Outcome derived from completed batches");
        }
        snapshot.successful = successful;
        snapshot.errors = errors;
    }

    let outcomes = snapshot.successful.saturating_add(snapshot.errors);

    if snapshot.total_records == 0 {
        snapshot.total_records = outcomes.saturating_add(snapshot.skipped_records);
        if snapshot.total_records > 0 {
            debug!(total = snapshot.total_records, "Total records derived from outcomes");
        }
    }

    if snapshot.total_records < outcomes {
        debug!(
            reported = snapshot.total_records,
            outcomes,
            "Reported total below known outcomes; raising it"
        );
        snapshot.total_records = outcomes;
    }
}
