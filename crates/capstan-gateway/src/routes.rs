//! Route handlers for the gateway API.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde_json::{Value, json};

use capstan_core::types::{OrderEvent, OrderEventKind};

use crate::server::AppState;

/// Health check endpoint (public).
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "scheduled_jobs": state.scheduler.job_count(),
    }))
}

/// Inbound order webhook.
///
/// The platform expects a fast 200; the event is acknowledged as soon as
/// it decodes and processing continues on a spawned task. Failures past
/// this point are visible only in logs and job state.
pub async fn webhook_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    // Signature check. This is the shared-secret digest stub, not real
    // platform signature verification.
    let secret = &state.gateway_config.webhook_secret;
    if !secret.is_empty() {
        let signature = headers
            .get("X-Webhook-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(secret, &body, signature) {
            tracing::warn!("[webhook] Invalid or missing signature on order event");
            return Json(json!({
                "ok": false,
                "error": "Invalid webhook signature"
            }));
        }
    }

    let payload: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return Json(json!({
                "ok": false,
                "error": format!("Invalid JSON: {e}")
            }));
        }
    };

    let event = match parse_order_event(&payload) {
        Ok(Some(event)) => event,
        Ok(None) => {
            // Event types we don't handle are acked so the platform
            // doesn't redeliver them.
            return Json(json!({"ok": true, "ignored": true}));
        }
        Err(msg) => {
            return Json(json!({"ok": false, "error": msg}));
        }
    };

    // Ack now; process off the request cycle.
    let processor = state.processor.clone();
    tokio::spawn(async move {
        processor.handle_event(&event).await;
    });

    Json(json!({"ok": true}))
}

/// Diagnostics: all live scheduled captures with time remaining.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Value> {
    let jobs = state.scheduler.list();
    Json(json!({
        "ok": true,
        "count": jobs.len(),
        "jobs": jobs,
    }))
}

/// Schedule a capture for an order at a given time (operator API).
pub async fn schedule_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let order_id = body["orderId"].as_str().unwrap_or("").to_string();
    let due_raw = body["dueAt"].as_str().unwrap_or("");
    let due_at = match chrono::DateTime::parse_from_rfc3339(due_raw) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            return Json(json!({
                "ok": false,
                "error": format!("Invalid 'dueAt' (want RFC 3339): {e}")
            }));
        }
    };

    match state.processor.schedule_capture(&order_id, due_at).await {
        Ok(handle) => Json(json!({"ok": true, "job": handle})),
        Err(e) => Json(json!({"ok": false, "error": e.to_string()})),
    }
}

/// Cancel the scheduled capture for an order, if any.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Json<Value> {
    let cancelled = state.scheduler.cancel(&order_id);
    Json(json!({"ok": true, "cancelled": cancelled}))
}

/// Decode an order event from a webhook payload.
///
/// Returns Ok(None) for event types this service doesn't consume, and
/// Err for structurally invalid payloads.
pub(crate) fn parse_order_event(payload: &Value) -> Result<Option<OrderEvent>, String> {
    let event_type = payload["eventType"].as_str().unwrap_or("");
    let kind = match event_type {
        "order.created" => OrderEventKind::Created,
        "order.updated" => OrderEventKind::Updated,
        "" => return Err("Missing 'eventType' field".into()),
        other => {
            tracing::debug!("[webhook] Ignoring event type '{other}'");
            return Ok(None);
        }
    };

    let order_id = payload["orderId"].as_str().unwrap_or("");
    if order_id.is_empty() {
        return Err("Missing 'orderId' field".into());
    }

    Ok(Some(OrderEvent {
        order_id: order_id.to_string(),
        kind,
    }))
}

/// Shared-secret digest check over the raw body.
pub(crate) fn verify_signature(secret: &str, body: &str, signature: &str) -> bool {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(format!("{secret}{body}"));
    let expected = format!("{:x}", hasher.finalize());
    !signature.is_empty() && expected == signature
}
