use std::sync::Mutex;
use std::time::Duration;

use grid_model::{JobId, TableId};

use crate::client::{BulkJobStatus, GridClient, JobStatus};
use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackerState {
    Idle,
    /// Slot reserved while the start request is in flight.
    Starting,
    Running {
        job: JobId,
        inserted: u64,
        total: u64,
    },
}

/// Tracks one server-side bulk append job per table:
/// `Idle → Running → {Done, Error} → Idle`.
///
/// While `Running`, the status is polled at a fixed sub-second interval and
/// `progress()` derives a display fraction. Jobs are transient: once a job
/// settles the tracker returns to `Idle` and never queries that job again.
/// The caller owns reconciliation: a settled `Done` means the paginated
/// cache must be refetched from scratch, since bulk inserts are too large to
/// reconcile incrementally.
pub struct BulkJobTracker<C> {
    client: C,
    table: TableId,
    state: Mutex<TrackerState>,
}

impl<C: GridClient> BulkJobTracker<C> {
    pub fn new(client: C, table: TableId) -> Self {
        Self {
            client,
            table,
            state: Mutex::new(TrackerState::Idle),
        }
    }

    pub fn is_running(&self) -> bool {
        !matches!(
            *self.state.lock().expect("tracker mutex poisoned"),
            TrackerState::Idle
        )
    }

    /// Progress fraction in `[0, 1]` for display. `Idle` and `total == 0`
    /// both read as 0.
    pub fn progress(&self) -> f64 {
        match *self.state.lock().expect("tracker mutex poisoned") {
            TrackerState::Idle | TrackerState::Starting => 0.0,
            TrackerState::Running { total: 0, .. } => 0.0,
            TrackerState::Running {
                inserted, total, ..
            } => inserted as f64 / total as f64,
        }
    }

    /// Start a bulk append of `total` rows inserted in `batch_size` batches.
    ///
    /// Starting a second job while one is `Running` is a caller error and is
    /// rejected before any network call.
    pub async fn start(&self, total: u64, batch_size: u64) -> Result<JobId> {
        // Reserve the slot before dispatching, so a second caller that lands
        // while the start request is still in flight is rejected too.
        {
            let mut state = self.state.lock().expect("tracker mutex poisoned");
            if !matches!(*state, TrackerState::Idle) {
                return Err(SyncError::ValidationFailed(
                    "a bulk job is already running for this table".into(),
                ));
            }
            *state = TrackerState::Starting;
        }
        let job = match self.client.start_bulk_insert(self.table, total, batch_size).await {
            Ok(job) => job,
            Err(err) => {
                *self.state.lock().expect("tracker mutex poisoned") = TrackerState::Idle;
                return Err(err);
            }
        };
        *self.state.lock().expect("tracker mutex poisoned") = TrackerState::Running {
            job,
            inserted: 0,
            total,
        };
        Ok(job)
    }

    /// Poll the running job at `interval` until it settles.
    ///
    /// Returns the final status on `done`; surfaces `JobFailed` on `error`.
    /// Either way the tracker is back at `Idle` when this returns, and no
    /// rows inserted by a failed job are trusted until a refetch confirms
    /// actual server state.
    pub async fn poll_until_settled(&self, interval: Duration) -> Result<BulkJobStatus> {
        loop {
            tokio::time::sleep(interval).await;

            let (job, previous) = match *self.state.lock().expect("tracker mutex poisoned") {
                TrackerState::Running { job, inserted, .. } => (job, inserted),
                TrackerState::Idle | TrackerState::Starting => {
                    return Err(SyncError::ValidationFailed(
                        "no bulk job is running".into(),
                    ))
                }
            };

            let mut status = match self.client.bulk_job_status(job).await {
                Ok(status) => status,
                Err(err) => {
                    *self.state.lock().expect("tracker mutex poisoned") = TrackerState::Idle;
                    return Err(err);
                }
            };
            // Progress never moves backwards, even if a stale poll result
            // arrives out of order.
            status.inserted = status.inserted.max(previous);

            match status.status {
                JobStatus::Running => {
                    let mut state = self.state.lock().expect("tracker mutex poisoned");
                    if let TrackerState::Running { inserted, .. } = &mut *state {
                        *inserted = status.inserted;
                    }
                }
                JobStatus::Done => {
                    *self.state.lock().expect("tracker mutex poisoned") = TrackerState::Idle;
                    return Ok(status);
                }
                JobStatus::Error => {
                    *self.state.lock().expect("tracker mutex poisoned") = TrackerState::Idle;
                    return Err(SyncError::JobFailed(
                        status.error.unwrap_or_else(|| "bulk insert aborted".into()),
                    ));
                }
            }
        }
    }
}
