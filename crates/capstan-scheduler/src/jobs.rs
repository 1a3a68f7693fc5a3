//! Job definitions — the unit of deferred capture work.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A scheduled capture job. At most one live job exists per order.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledCaptureJob {
    /// Unique job ID.
    pub id: String,
    /// Order this capture belongs to — the registry key.
    pub order_id: String,
    /// The authorized transaction to capture against.
    pub transaction_id: String,
    /// When the capture should be attempted.
    pub due_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub state: JobState,
    /// When the job was scheduled.
    pub created_at: DateTime<Utc>,
}

/// Job lifecycle state.
///
/// `Pending` and `Executing` are the live states; the rest are terminal
/// and a job leaves the registry the moment it reaches one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobState {
    Pending,
    Executing,
    Completed,
    Cancelled,
    Failed,
}

/// Handle returned by `schedule` for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct JobHandle {
    pub id: String,
    pub order_id: String,
    pub due_at: DateTime<Utc>,
}

/// One row of the diagnostics listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub order_id: String,
    pub due_at: DateTime<Utc>,
    /// Seconds until due, clamped at zero for overdue jobs.
    pub time_remaining_secs: i64,
}

impl ScheduledCaptureJob {
    pub(crate) fn new(order_id: &str, transaction_id: &str, due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            transaction_id: transaction_id.to_string(),
            due_at,
            state: JobState::Pending,
            created_at: now,
        }
    }

    /// Whether the job is still live (not yet terminal).
    pub fn is_live(&self) -> bool {
        matches!(self.state, JobState::Pending | JobState::Executing)
    }
}
