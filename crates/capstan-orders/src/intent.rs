//! Payment-intent classification from order metadata.
//!
//! Merchants flag orders through metadata fields: `payment-capture`
//! selects the mode, and for deferred capture either `capture-at`
//! (RFC 3339) or `capture-delay-hours` names the target time. A deferred
//! flag with no usable time falls back to a configured default delay.

use chrono::{DateTime, Utc};

use capstan_core::types::{CaptureIntent, Order, Transaction, TransactionKind, TransactionStatus};

pub const CAPTURE_MODE_KEY: &str = "payment-capture";
pub const CAPTURE_AT_KEY: &str = "capture-at";
pub const CAPTURE_DELAY_HOURS_KEY: &str = "capture-delay-hours";

/// Read the payment intent off an order's metadata.
pub fn classify(order: &Order, now: DateTime<Utc>, default_delay_hours: u64) -> CaptureIntent {
    let mode = order
        .metadata
        .get(CAPTURE_MODE_KEY)
        .map(|s| s.trim().to_ascii_lowercase());

    match mode.as_deref() {
        Some("immediate") | Some("now") => CaptureIntent::Immediate,
        Some("deferred") | Some("later") => {
            if let Some(raw) = order.metadata.get(CAPTURE_AT_KEY) {
                match DateTime::parse_from_rfc3339(raw.trim()) {
                    Ok(at) => return CaptureIntent::Deferred(at.with_timezone(&Utc)),
                    Err(_) => tracing::warn!(
                        "⚠️ Order {}: unparseable {CAPTURE_AT_KEY} value '{raw}' — falling through",
                        order.id
                    ),
                }
            }
            if let Some(raw) = order.metadata.get(CAPTURE_DELAY_HOURS_KEY) {
                match raw.trim().parse::<i64>() {
                    Ok(hours) if hours >= 0 => {
                        return CaptureIntent::Deferred(now + chrono::Duration::hours(hours));
                    }
                    _ => tracing::warn!(
                        "⚠️ Order {}: invalid {CAPTURE_DELAY_HOURS_KEY} value '{raw}' — falling through",
                        order.id
                    ),
                }
            }
            CaptureIntent::Deferred(now + chrono::Duration::hours(default_delay_hours as i64))
        }
        Some(other) => {
            tracing::warn!(
                "⚠️ Order {}: unknown {CAPTURE_MODE_KEY} value '{other}' — treating as unflagged",
                order.id
            );
            CaptureIntent::None
        }
        None => CaptureIntent::None,
    }
}

/// Find the capturable transaction: the first approved authorization.
pub fn find_authorization(transactions: &[Transaction]) -> Option<&Transaction> {
    transactions.iter().find(|t| {
        t.kind == TransactionKind::Authorization && t.status == TransactionStatus::Approved
    })
}
