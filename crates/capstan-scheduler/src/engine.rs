//! Capture scheduler engine — registry, dual dispatch paths, retry policy.
//!
//! All registry mutation happens under one `Mutex`; the outbound capture
//! call never runs inside that critical section. A per-job generation
//! counter makes stale timers and superseded attempts harmless: whoever
//! observes a job as `Pending` first wins the claim, everyone else no-ops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use capstan_core::config::{RetryConfig, SchedulerConfig};
use capstan_core::error::{CapstanError, PlatformError, Result};
use capstan_core::traits::{CapturePort, Clock, SystemClock};

use crate::jobs::{JobHandle, JobState, JobSummary, ScheduledCaptureJob};

struct JobEntry {
    job: ScheduledCaptureJob,
    /// Bumped on every (re-)schedule; guards against stale timer fires.
    generation: u64,
    /// Insertion order for the diagnostics listing.
    seq: u64,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Registry {
    jobs: HashMap<String, JobEntry>,
    next_generation: u64,
    next_seq: u64,
}

/// A successfully claimed job, ready for dispatch outside the lock.
struct Claimed {
    job_id: String,
    order_id: String,
    transaction_id: String,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// The deferred-capture scheduler.
///
/// Owns the live-job registry exclusively; callers interact only through
/// `schedule`, `cancel`, and `list`. Clock and capture capability are
/// injected at construction.
pub struct CaptureScheduler {
    registry: Mutex<Registry>,
    clock: Arc<dyn Clock>,
    capture: Arc<dyn CapturePort>,
    capture_timeout: Duration,
    retry: RetryConfig,
    sweep_interval: Duration,
    reconcile_interval: Duration,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl CaptureScheduler {
    /// Create a scheduler with the wall clock.
    pub fn new(capture: Arc<dyn CapturePort>, config: &SchedulerConfig) -> Self {
        Self::with_clock(capture, Arc::new(SystemClock), config)
    }

    /// Create a scheduler with an injected clock (tests drive this).
    pub fn with_clock(
        capture: Arc<dyn CapturePort>,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            clock,
            capture,
            capture_timeout: Duration::from_secs(config.capture_timeout_secs),
            retry: config.retry.clone(),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            reconcile_interval: Duration::from_secs(config.reconcile_interval_secs),
            loops: Mutex::new(Vec::new()),
        }
    }

    /// Schedule a capture for `order_id` at `due_at`.
    ///
    /// Replaces any live job for the order (most recent intent wins — the
    /// prior job's capture will never fire). A `due_at` in the past is
    /// valid and means "due immediately". No network call happens here;
    /// capture only runs at dispatch.
    pub fn schedule(
        self: &Arc<Self>,
        order_id: &str,
        transaction_id: &str,
        due_at: DateTime<Utc>,
    ) -> Result<JobHandle> {
        if order_id.trim().is_empty() {
            return Err(CapstanError::Validation("order id must not be empty".into()));
        }
        if transaction_id.trim().is_empty() {
            return Err(CapstanError::Validation(
                "transaction id must not be empty".into(),
            ));
        }

        let now = self.clock.now();
        let job = ScheduledCaptureJob::new(order_id, transaction_id, due_at, now);
        let handle = JobHandle {
            id: job.id.clone(),
            order_id: job.order_id.clone(),
            due_at,
        };

        let generation = {
            let mut reg = self.registry.lock().unwrap();
            if let Some(prev) = reg.jobs.remove(order_id) {
                if let Some(t) = prev.timer {
                    t.abort();
                }
                tracing::info!(
                    "📅 Replacing scheduled capture for order {order_id} (was due {})",
                    prev.job.due_at.to_rfc3339()
                );
            }
            let generation = reg.next_generation;
            reg.next_generation += 1;
            let seq = reg.next_seq;
            reg.next_seq += 1;
            reg.jobs.insert(
                order_id.to_string(),
                JobEntry {
                    job,
                    generation,
                    seq,
                    timer: None,
                },
            );
            generation
        };

        // Arm the one-shot timer. The sweep will still catch this job if
        // the timer never fires (host suspend, throttling).
        let delay = (due_at - now).to_std().unwrap_or(Duration::ZERO);
        let me = Arc::clone(self);
        let order = order_id.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            me.fire_timer(&order, generation).await;
        });

        // Attach the handle; if the job vanished in between, kill the timer.
        {
            let mut reg = self.registry.lock().unwrap();
            match reg.jobs.get_mut(order_id) {
                Some(entry) if entry.generation == generation => {
                    if entry.job.state == JobState::Pending {
                        entry.timer = Some(timer);
                    }
                    // Already claimed: the zero-delay fire beat us here and
                    // the task is mid-capture — it must not be aborted.
                }
                _ => timer.abort(),
            }
        }

        tracing::info!(
            "⏱️ Capture scheduled: order={order_id} txn={transaction_id} due={}",
            due_at.to_rfc3339()
        );
        Ok(handle)
    }

    /// Cancel the live job for `order_id`, if any.
    ///
    /// Returns false when no job exists — not an error; cancelling an
    /// order that was never flagged for deferred capture is common.
    /// An attempt already claimed for execution is not interrupted.
    pub fn cancel(&self, order_id: &str) -> bool {
        let mut reg = self.registry.lock().unwrap();
        match reg.jobs.remove(order_id) {
            Some(entry) => {
                if let Some(t) = entry.timer {
                    t.abort();
                }
                tracing::info!(
                    "🗑️ Cancelled scheduled capture for order {order_id} (was due {}, state {:?} → {:?})",
                    entry.job.due_at.to_rfc3339(),
                    entry.job.state,
                    JobState::Cancelled
                );
                true
            }
            None => false,
        }
    }

    /// Diagnostics listing of live jobs, in insertion order.
    pub fn list(&self) -> Vec<JobSummary> {
        let now = self.clock.now();
        let reg = self.registry.lock().unwrap();
        let mut entries: Vec<&JobEntry> = reg.jobs.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
            .into_iter()
            .map(|e| JobSummary {
                order_id: e.job.order_id.clone(),
                due_at: e.job.due_at,
                time_remaining_secs: (e.job.due_at - now).num_seconds().max(0),
            })
            .collect()
    }

    /// Snapshot of the live job for an order, if any.
    pub fn job_for_order(&self, order_id: &str) -> Option<ScheduledCaptureJob> {
        let reg = self.registry.lock().unwrap();
        reg.jobs.get(order_id).map(|e| e.job.clone())
    }

    /// Number of live jobs in the registry.
    pub fn job_count(&self) -> usize {
        self.registry.lock().unwrap().jobs.len()
    }

    /// Start the background sweep and reconciliation loops.
    pub fn start(self: &Arc<Self>) {
        let mut loops = self.loops.lock().unwrap();
        if !loops.is_empty() {
            tracing::warn!("⚠️ Scheduler already started");
            return;
        }

        let me = Arc::clone(self);
        loops.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(me.sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the loop
            // waits a full period before its first sweep.
            interval.tick().await;
            loop {
                interval.tick().await;
                me.sweep_once().await;
            }
        }));

        let me = Arc::clone(self);
        loops.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(me.reconcile_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                me.reconcile_once();
            }
        }));

        tracing::info!(
            "⏰ Capture scheduler started (sweep every {}s, reconcile every {}s)",
            self.sweep_interval.as_secs(),
            self.reconcile_interval.as_secs()
        );
    }

    /// Stop background loops and disarm all timers. Live jobs stay in the
    /// registry; nothing dispatches after this returns.
    pub fn stop(&self) {
        for handle in self.loops.lock().unwrap().drain(..) {
            handle.abort();
        }
        let mut reg = self.registry.lock().unwrap();
        for entry in reg.jobs.values_mut() {
            if let Some(t) = entry.timer.take() {
                t.abort();
            }
        }
        tracing::info!(
            "⏹️ Capture scheduler stopped ({} live job(s) parked)",
            reg.jobs.len()
        );
    }

    /// One sweep pass: claim and dispatch every overdue Pending job.
    ///
    /// Covers jobs whose timer never fired. Returns how many jobs were
    /// dispatched. Dispatches run concurrently; the pass completes when
    /// all of them have reached a terminal state.
    pub async fn sweep_once(&self) -> usize {
        let now = self.clock.now();
        let due: Vec<(String, u64)> = {
            let reg = self.registry.lock().unwrap();
            reg.jobs
                .values()
                .filter(|e| e.job.state == JobState::Pending && e.job.due_at <= now)
                .map(|e| (e.job.order_id.clone(), e.generation))
                .collect()
        };
        if due.is_empty() {
            return 0;
        }

        let mut claims = Vec::new();
        for (order_id, generation) in due {
            // A timer may have claimed the job between the scan and here;
            // the claim simply fails in that case.
            if let Some(mut claimed) = self.try_claim(&order_id, generation) {
                if let Some(t) = claimed.timer.take() {
                    t.abort();
                }
                claims.push(claimed);
            }
        }

        let count = claims.len();
        if count > 0 {
            tracing::info!("🧹 Sweep dispatching {count} overdue capture job(s)");
        }
        futures::future::join_all(claims.into_iter().map(|c| self.execute(c))).await;
        count
    }

    /// Timer callback for one job instance.
    async fn fire_timer(&self, order_id: &str, generation: u64) {
        // The timer keeps its own JoinHandle in the claim; dropping it
        // detaches rather than aborts, which is what we want here.
        if let Some(claimed) = self.try_claim(order_id, generation) {
            self.execute(claimed).await;
        }
    }

    /// The exclusive Pending → Executing transition.
    ///
    /// Succeeds only if the job still exists, is the same scheduled
    /// instance (generation match), and nobody claimed it yet. Timer and
    /// sweep both go through here, so a race resolves to a single winner.
    fn try_claim(&self, order_id: &str, generation: u64) -> Option<Claimed> {
        let mut reg = self.registry.lock().unwrap();
        let entry = reg.jobs.get_mut(order_id)?;
        if entry.generation != generation || entry.job.state != JobState::Pending {
            return None;
        }
        entry.job.state = JobState::Executing;
        Some(Claimed {
            job_id: entry.job.id.clone(),
            order_id: entry.job.order_id.clone(),
            transaction_id: entry.job.transaction_id.clone(),
            generation,
            timer: entry.timer.take(),
        })
    }

    /// Run a claimed capture to a terminal state. Never holds the registry
    /// lock across the network call.
    async fn execute(&self, claimed: Claimed) {
        let Claimed {
            job_id,
            order_id,
            transaction_id,
            generation,
            ..
        } = claimed;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(
                self.capture_timeout,
                self.capture.capture(&order_id, &transaction_id),
            )
            .await
            {
                Ok(res) => res,
                Err(_) => Err(PlatformError::NetworkTimeout(self.capture_timeout.as_secs())),
            };

            match outcome {
                Ok(result) => {
                    self.finish(&order_id, generation, JobState::Completed);
                    tracing::info!(
                        "✅ Captured payment: order={order_id} txn={} captured_txn={} at={} (job {job_id})",
                        transaction_id,
                        result.transaction_id,
                        self.clock.now().to_rfc3339()
                    );
                    return;
                }
                Err(e)
                    if self.retry.enabled
                        && e.is_retryable()
                        && attempt < self.retry.max_attempts =>
                {
                    let shift = (attempt - 1).min(16);
                    let backoff = Duration::from_secs(
                        self.retry.base_backoff_secs.saturating_mul(1u64 << shift),
                    );
                    tracing::warn!(
                        "⚠️ Capture attempt {attempt}/{} failed for order {order_id}: {e} — retrying in {}s",
                        self.retry.max_attempts,
                        backoff.as_secs()
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    self.finish(&order_id, generation, JobState::Failed);
                    match &e {
                        PlatformError::PermissionDenied(_) => tracing::error!(
                            "🚫 Capture permission denied for order {order_id}: {e} — check app credentials and scopes"
                        ),
                        _ => tracing::error!(
                            "❌ Capture failed: order={order_id} txn={transaction_id} cause={e} (job {job_id})"
                        ),
                    }
                    return;
                }
            }
        }
    }

    /// Record a terminal state: drop the job from the registry, unless the
    /// order was re-scheduled while this attempt was in flight.
    fn finish(&self, order_id: &str, generation: u64, terminal: JobState) {
        let mut reg = self.registry.lock().unwrap();
        let same_instance = reg
            .jobs
            .get(order_id)
            .is_some_and(|e| e.generation == generation);
        if same_instance {
            reg.jobs.remove(order_id);
            tracing::debug!("Job for order {order_id} left registry as {terminal:?}");
        } else {
            tracing::debug!(
                "Attempt for order {order_id} ended as {terminal:?}; registry entry already superseded"
            );
        }
    }

    /// Low-frequency reconciliation pass. With no persistent job store
    /// there is no external source of truth to re-derive from, so this
    /// only reports registry health.
    fn reconcile_once(&self) {
        let count = self.registry.lock().unwrap().jobs.len();
        tracing::debug!("🔍 Reconciliation pass: {count} live job(s)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use capstan_core::types::CaptureResult;

    /// Capture port that records calls and plays back scripted failures.
    #[derive(Default)]
    struct RecordingCapture {
        calls: Mutex<Vec<(String, String)>>,
        /// Errors consumed front-to-back before successes begin.
        failures: Mutex<Vec<PlatformError>>,
    }

    impl RecordingCapture {
        fn failing_with(errors: Vec<PlatformError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failures: Mutex::new(errors),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CapturePort for RecordingCapture {
        async fn capture(
            &self,
            order_id: &str,
            transaction_id: &str,
        ) -> std::result::Result<CaptureResult, PlatformError> {
            self.calls
                .lock()
                .unwrap()
                .push((order_id.to_string(), transaction_id.to_string()));
            let next_failure = {
                let mut failures = self.failures.lock().unwrap();
                if failures.is_empty() {
                    None
                } else {
                    Some(failures.remove(0))
                }
            };
            match next_failure {
                Some(e) => Err(e),
                None => Ok(CaptureResult {
                    transaction_id: format!("cap-{transaction_id}"),
                    status: Some("APPROVED".into()),
                    captured_at: None,
                }),
            }
        }
    }

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn at_epoch() -> Self {
            Self(Mutex::new(
                DateTime::parse_from_rfc3339("2026-01-15T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            ))
        }

        fn advance_secs(&self, secs: i64) {
            *self.0.lock().unwrap() += chrono::Duration::seconds(secs);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn scheduler_with(
        capture: Arc<RecordingCapture>,
        clock: Arc<ManualClock>,
        retry: Option<RetryConfig>,
    ) -> Arc<CaptureScheduler> {
        let mut config = SchedulerConfig::default();
        if let Some(r) = retry {
            config.retry = r;
        }
        Arc::new(CaptureScheduler::with_clock(capture, clock, &config))
    }

    #[tokio::test]
    async fn test_schedule_rejects_empty_ids() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        assert!(matches!(
            sched.schedule("", "txn-1", clock.now()),
            Err(CapstanError::Validation(_))
        ));
        assert!(matches!(
            sched.schedule("1001", "  ", clock.now()),
            Err(CapstanError::Validation(_))
        ));
        assert_eq!(sched.job_count(), 0);
        assert!(capture.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_missing_job_returns_false() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture, clock, None);
        assert!(!sched.cancel("no-such-order"));
    }

    #[tokio::test]
    async fn test_at_most_one_live_job_per_order() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture, clock.clone(), None);

        let due = clock.now() + chrono::Duration::hours(1);
        sched.schedule("1001", "txn-a", due).unwrap();
        sched.schedule("1001", "txn-b", due).unwrap();
        sched.schedule("1002", "txn-c", due).unwrap();
        sched.cancel("1002");
        sched.schedule("1002", "txn-d", due).unwrap();

        assert_eq!(sched.job_count(), 2);
        let job = sched.job_for_order("1001").unwrap();
        assert_eq!(job.transaction_id, "txn-b");
        assert_eq!(job.state, JobState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_prior_job() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        // First intent: capture in 2s. Second intent replaces it before it fires.
        sched
            .schedule("1001", "txn-a", clock.now() + chrono::Duration::seconds(2))
            .unwrap();
        sched
            .schedule("1001", "txn-b", clock.now() + chrono::Duration::seconds(4))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(4100)).await;

        // Only the replacement fired; txn-a never did.
        assert_eq!(capture.calls(), vec![("1001".to_string(), "txn-b".to_string())]);
        assert!(sched.list().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_dispatches_once_and_clears_listing() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        sched
            .schedule("1001", "tx-A", clock.now() + chrono::Duration::seconds(2))
            .unwrap();
        assert_eq!(sched.list().len(), 1);

        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert_eq!(capture.calls(), vec![("1001".to_string(), "tx-A".to_string())]);
        assert!(sched.list().iter().all(|j| j.order_id != "1001"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_dispatch() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        sched
            .schedule("1002", "tx-B", clock.now() + chrono::Duration::seconds(5))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(sched.cancel("1002"));

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(capture.calls().is_empty());
        assert!(sched.list().is_empty());
    }

    #[tokio::test]
    async fn test_overdue_job_dispatched_by_sweep() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        // Already 10s overdue at schedule time.
        sched
            .schedule("1004", "tx-D", clock.now() - chrono::Duration::seconds(10))
            .unwrap();

        let dispatched = sched.sweep_once().await;
        assert_eq!(dispatched, 1);
        assert_eq!(capture.calls(), vec![("1004".to_string(), "tx-D".to_string())]);
        assert!(sched.list().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_ignores_jobs_not_yet_due() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        sched
            .schedule("1001", "tx-A", clock.now() + chrono::Duration::seconds(120))
            .unwrap();
        assert_eq!(sched.sweep_once().await, 0);
        assert!(capture.calls().is_empty());

        // Past due after the clock moves.
        clock.advance_secs(121);
        assert_eq!(sched.sweep_once().await, 1);
        assert_eq!(capture.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sweeps_and_timer_claim_once() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        // Overdue at schedule time: the timer arms with zero delay, and two
        // sweeps race it for the same job.
        sched
            .schedule("1001", "tx-A", clock.now() - chrono::Duration::seconds(30))
            .unwrap();

        let (a, b) = tokio::join!(sched.sweep_once(), sched.sweep_once());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(a + b <= 1);
        assert_eq!(capture.calls().len(), 1);
        assert!(sched.list().is_empty());
    }

    #[tokio::test]
    async fn test_failed_capture_is_terminal_without_retry() {
        let capture = Arc::new(RecordingCapture::failing_with(vec![PlatformError::Remote(
            "500 Internal Server Error".into(),
        )]));
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        sched
            .schedule("1003", "tx-C", clock.now() - chrono::Duration::seconds(1))
            .unwrap();
        sched.sweep_once().await;

        // One attempt, job gone, nothing re-queued.
        assert_eq!(capture.calls().len(), 1);
        assert!(sched.list().is_empty());
        assert_eq!(sched.sweep_once().await, 0);
        assert_eq!(capture.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_retries_transient_failures() {
        let capture = Arc::new(RecordingCapture::failing_with(vec![
            PlatformError::NetworkTimeout(30),
            PlatformError::Remote("502 Bad Gateway".into()),
        ]));
        let clock = Arc::new(ManualClock::at_epoch());
        let retry = RetryConfig {
            enabled: true,
            max_attempts: 3,
            base_backoff_secs: 5,
        };
        let sched = scheduler_with(capture.clone(), clock.clone(), Some(retry));

        sched
            .schedule("1005", "tx-E", clock.now() - chrono::Duration::seconds(1))
            .unwrap();
        sched.sweep_once().await;

        // Two transient failures, then success on the third attempt.
        assert_eq!(capture.calls().len(), 3);
        assert!(sched.list().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied_is_never_retried() {
        let capture = Arc::new(RecordingCapture::failing_with(vec![
            PlatformError::PermissionDenied("missing CAPTURE scope".into()),
        ]));
        let clock = Arc::new(ManualClock::at_epoch());
        let retry = RetryConfig {
            enabled: true,
            max_attempts: 5,
            base_backoff_secs: 1,
        };
        let sched = scheduler_with(capture.clone(), clock.clone(), Some(retry));

        sched
            .schedule("1006", "tx-F", clock.now() - chrono::Duration::seconds(1))
            .unwrap();
        sched.sweep_once().await;

        assert_eq!(capture.calls().len(), 1);
        assert!(sched.list().is_empty());
    }

    #[tokio::test]
    async fn test_list_reports_remaining_time_clamped() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture, clock.clone(), None);

        sched
            .schedule("1001", "tx-A", clock.now() + chrono::Duration::seconds(90))
            .unwrap();
        sched
            .schedule("1002", "tx-B", clock.now() - chrono::Duration::seconds(90))
            .unwrap();

        let listing = sched.list();
        assert_eq!(listing.len(), 2);
        // Insertion order preserved.
        assert_eq!(listing[0].order_id, "1001");
        assert_eq!(listing[0].time_remaining_secs, 90);
        assert_eq!(listing[1].order_id, "1002");
        assert_eq!(listing[1].time_remaining_secs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_disarms_timers() {
        let capture = Arc::new(RecordingCapture::default());
        let clock = Arc::new(ManualClock::at_epoch());
        let sched = scheduler_with(capture.clone(), clock.clone(), None);

        sched
            .schedule("1001", "tx-A", clock.now() + chrono::Duration::seconds(1))
            .unwrap();
        sched.stop();

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(capture.calls().is_empty());
        // The job is parked, not cancelled.
        assert_eq!(sched.job_count(), 1);
    }
}
