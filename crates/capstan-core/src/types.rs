//! Commerce domain types — orders, transactions, capture results.
//!
//! These mirror the platform's REST payloads; serde attributes map the
//! wire casing. Unknown enum values collapse into `Other` so a platform
//! API addition never breaks deserialization.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An order as returned by `GET /v2/orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-facing order number.
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "paymentStatus")]
    pub payment_status: Option<String>,
    /// Merchant-defined metadata fields. The payment-intent flag lives here.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A payment transaction attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    /// Parent transaction (a capture references its authorization).
    #[serde(default, rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Authorization,
    Capture,
    Refund,
    Void,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Approved,
    Pending,
    Declined,
    #[serde(other)]
    Other,
}

/// Result of a successful capture call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureResult {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "capturedAt")]
    pub captured_at: Option<DateTime<Utc>>,
}

/// Payment intent read off an order's metadata flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureIntent {
    /// Capture the authorization right away.
    Immediate,
    /// Capture at the given time.
    Deferred(DateTime<Utc>),
    /// No capture flag present (or flag removed).
    None,
}

/// A decoded order webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub kind: OrderEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    Updated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_wire_format() {
        let json = r#"{
            "id": "txn-1",
            "type": "AUTHORIZATION",
            "status": "APPROVED",
            "parentId": null,
            "amount": "49.90"
        }"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.kind, TransactionKind::Authorization);
        assert_eq!(txn.status, TransactionStatus::Approved);
        assert_eq!(txn.amount.as_deref(), Some("49.90"));
    }

    #[test]
    fn test_unknown_kind_is_other() {
        let json = r#"{"id": "txn-2", "type": "CHARGEBACK", "status": "SETTLED"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.kind, TransactionKind::Other);
        assert_eq!(txn.status, TransactionStatus::Other);
    }

    #[test]
    fn test_order_metadata_default() {
        let json = r#"{"id": "1001"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.metadata.is_empty());
        assert!(order.payment_status.is_none());
    }
}
