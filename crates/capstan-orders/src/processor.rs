//! The order processor — turns decoded webhook events into capture
//! actions.
//!
//! Dispatch-time failures are never surfaced to the webhook caller; they
//! show up in logs and in the scheduled job's terminal state only.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use capstan_core::config::SchedulerConfig;
use capstan_core::error::{CapstanError, PlatformError, Result};
use capstan_core::traits::{Clock, PlatformPort, SystemClock};
use capstan_core::types::{CaptureIntent, OrderEvent, Transaction};
use capstan_scheduler::{CaptureScheduler, JobHandle};

use crate::intent;

pub struct OrderProcessor {
    platform: Arc<dyn PlatformPort>,
    scheduler: Arc<CaptureScheduler>,
    clock: Arc<dyn Clock>,
    default_deferred_delay_hours: u64,
}

impl OrderProcessor {
    pub fn new(
        platform: Arc<dyn PlatformPort>,
        scheduler: Arc<CaptureScheduler>,
        config: &SchedulerConfig,
    ) -> Self {
        Self::with_clock(platform, scheduler, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        platform: Arc<dyn PlatformPort>,
        scheduler: Arc<CaptureScheduler>,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            platform,
            scheduler,
            clock,
            default_deferred_delay_hours: config.default_deferred_delay_hours,
        }
    }

    /// Process one order event end to end, logging any failure.
    /// This is the entry point the gateway's fire-and-forget task calls.
    pub async fn handle_event(&self, event: &OrderEvent) {
        tracing::info!("📦 Order event: {:?} order={}", event.kind, event.order_id);
        if let Err(e) = self.process(event).await {
            tracing::error!(
                "❌ Order event processing failed: order={} cause={e}",
                event.order_id
            );
        }
    }

    async fn process(&self, event: &OrderEvent) -> Result<()> {
        let order = self.platform.get_order(&event.order_id).await?;
        let now = self.clock.now();
        match intent::classify(&order, now, self.default_deferred_delay_hours) {
            CaptureIntent::Immediate => {
                // A flag change to immediate supersedes any scheduled capture.
                self.scheduler.cancel(&order.id);
                match self.authorized_transaction(&order.id).await? {
                    Some(txn) => self.capture_now(&order.id, &txn.id).await,
                    None => tracing::warn!(
                        "💤 Order {} flagged for immediate capture but has no authorized transaction",
                        order.id
                    ),
                }
            }
            CaptureIntent::Deferred(due_at) => match self.authorized_transaction(&order.id).await? {
                Some(txn) => {
                    self.scheduler.schedule(&order.id, &txn.id, due_at)?;
                }
                None => tracing::warn!(
                    "💤 Order {} flagged for deferred capture but has no authorized transaction — no job created",
                    order.id
                ),
            },
            CaptureIntent::None => {
                if self.scheduler.cancel(&order.id) {
                    tracing::info!(
                        "🚩 Capture flag removed from order {} — scheduled capture cancelled",
                        order.id
                    );
                }
            }
        }
        Ok(())
    }

    /// Operator-facing scheduling: resolve the authorization, then defer.
    pub async fn schedule_capture(
        &self,
        order_id: &str,
        due_at: DateTime<Utc>,
    ) -> Result<JobHandle> {
        match self.authorized_transaction(order_id).await? {
            Some(txn) => self.scheduler.schedule(order_id, &txn.id, due_at),
            None => Err(CapstanError::Validation(format!(
                "order {order_id} has no authorized transaction to capture"
            ))),
        }
    }

    async fn authorized_transaction(&self, order_id: &str) -> Result<Option<Transaction>> {
        let transactions = self.platform.get_order_transactions(order_id).await?;
        Ok(intent::find_authorization(&transactions).cloned())
    }

    async fn capture_now(&self, order_id: &str, transaction_id: &str) {
        match self.platform.capture(order_id, transaction_id).await {
            Ok(result) => tracing::info!(
                "✅ Immediate capture: order={order_id} txn={transaction_id} → {}",
                result.transaction_id
            ),
            Err(PlatformError::AlreadyCaptured) => tracing::info!(
                "ℹ️ Immediate capture: order={order_id} txn={transaction_id} already captured"
            ),
            Err(e) => tracing::error!(
                "❌ Immediate capture failed: order={order_id} txn={transaction_id} cause={e}"
            ),
        }
    }
}
