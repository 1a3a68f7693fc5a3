//! Commerce-platform capability traits.

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::types::{CaptureResult, Order, Transaction};

/// The one capability the scheduler needs: capture an authorized payment.
#[async_trait]
pub trait CapturePort: Send + Sync {
    /// Capture the given authorization transaction on an order.
    async fn capture(
        &self,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<CaptureResult, PlatformError>;
}

/// Full read/write surface of the platform, consumed by the order processor.
/// Token lifecycle is internal to the implementation; callers always see a
/// valid credential.
#[async_trait]
pub trait PlatformPort: CapturePort {
    async fn get_order(&self, order_id: &str) -> Result<Order, PlatformError>;

    async fn get_order_transactions(
        &self,
        order_id: &str,
    ) -> Result<Vec<Transaction>, PlatformError>;
}
