//! # Capstan Scheduler
//!
//! In-memory deferred-capture scheduler. Given an order id, an authorized
//! transaction id, and a target time, it guarantees a capture attempt at
//! or after that time, retried per policy, and cancellable until dispatch.
//!
//! ## Architecture
//! ```text
//! schedule(order, txn, due) ──► registry (one live job per order)
//!                                  │
//!              one-shot timer ─────┤───── periodic sweep (60s)
//!                                  ▼
//!                        claim Pending → Executing   (exclusive, per job)
//!                                  ▼
//!                        capture(order, txn)         (outside the lock)
//!                                  ▼
//!                        Completed / Failed → removed from registry
//! ```
//!
//! Both dispatch paths funnel through the same claim, so a timer fire
//! racing a sweep pass produces exactly one capture attempt.

pub mod engine;
pub mod jobs;

pub use engine::CaptureScheduler;
pub use jobs::{JobHandle, JobState, JobSummary, ScheduledCaptureJob};
