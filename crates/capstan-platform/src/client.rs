//! The platform REST client.
//!
//! Token lifecycle is internal: every API call goes through
//! `ensure_valid_token`, which refreshes the cached client-credentials
//! token when it is missing or close to expiry. The token request has its
//! own short timeout, distinct from the order-API timeout, so a wedged
//! auth endpoint fails fast.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::RwLock;

use capstan_core::config::PlatformConfig;
use capstan_core::error::PlatformError;
use capstan_core::traits::{CapturePort, PlatformPort};
use capstan_core::types::{CaptureResult, Order, Transaction};

/// Refresh the token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) > now
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds.
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// REST client for the commerce platform's order API.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    request_timeout: Duration,
    token_timeout: Duration,
    token: RwLock<Option<CachedToken>>,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.resolved_secret(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            token_timeout: Duration::from_secs(config.token_timeout_secs),
            token: RwLock::new(None),
        }
    }

    /// Return a valid access token, refreshing the cached one if needed.
    async fn ensure_valid_token(&self) -> Result<String, PlatformError> {
        {
            let token = self.token.read().await;
            if let Some(t) = token.as_ref()
                && t.is_fresh(Utc::now())
            {
                return Ok(t.access_token.clone());
            }
        }

        let mut token = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(t) = token.as_ref()
            && t.is_fresh(Utc::now())
        {
            return Ok(t.access_token.clone());
        }

        let refreshed = self.refresh_token().await?;
        let access = refreshed.access_token.clone();
        *token = Some(refreshed);
        Ok(access)
    }

    /// Exchange client credentials for a fresh access token.
    async fn refresh_token(&self) -> Result<CachedToken, PlatformError> {
        let url = format!("{}/oauth/token", self.base_url);
        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.app_id, self.app_secret));

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Basic {basic}"))
            .json(&serde_json::json!({"grant_type": "client_credentials"}))
            .timeout(self.token_timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.token_timeout.as_secs()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_status(status, "token refresh", &body));
        }

        let parsed: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PlatformError::Remote(format!("malformed token response: {e}")))?;

        tracing::debug!("🔑 Platform token refreshed (expires in {}s)", parsed.expires_in);
        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(parsed.expires_in),
        })
    }

    async fn authed(
        &self,
        method: reqwest::Method,
        url: String,
    ) -> Result<reqwest::RequestBuilder, PlatformError> {
        let token = self.ensure_valid_token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .timeout(self.request_timeout))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        context: &str,
    ) -> Result<T, PlatformError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_status(status, context, &body));
        }
        resp.json()
            .await
            .map_err(|e| PlatformError::Remote(format!("malformed {context} response: {e}")))
    }
}

#[async_trait]
impl CapturePort for PlatformClient {
    async fn capture(
        &self,
        order_id: &str,
        transaction_id: &str,
    ) -> Result<CaptureResult, PlatformError> {
        let url = format!(
            "{}/v2/orders/{order_id}/transactions/{transaction_id}/capture",
            self.base_url
        );
        let resp = self
            .authed(reqwest::Method::POST, url)
            .await?
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| map_send_error(e, self.request_timeout.as_secs()))?;

        let result: CaptureResult = self.read_json(resp, "capture").await?;
        tracing::info!(
            "💳 Platform capture accepted: order={order_id} txn={transaction_id} → {}",
            result.transaction_id
        );
        Ok(result)
    }
}

#[async_trait]
impl PlatformPort for PlatformClient {
    async fn get_order(&self, order_id: &str) -> Result<Order, PlatformError> {
        let url = format!("{}/v2/orders/{order_id}", self.base_url);
        let resp = self
            .authed(reqwest::Method::GET, url)
            .await?
            .send()
            .await
            .map_err(|e| map_send_error(e, self.request_timeout.as_secs()))?;
        self.read_json(resp, "order fetch").await
    }

    async fn get_order_transactions(
        &self,
        order_id: &str,
    ) -> Result<Vec<Transaction>, PlatformError> {
        let url = format!("{}/v2/orders/{order_id}/transactions", self.base_url);
        let resp = self
            .authed(reqwest::Method::GET, url)
            .await?
            .send()
            .await
            .map_err(|e| map_send_error(e, self.request_timeout.as_secs()))?;
        let parsed: TransactionsResponse = self.read_json(resp, "transaction list").await?;
        Ok(parsed.transactions)
    }
}

/// Map a reqwest transport error. Timeouts get their own variant since the
/// scheduler treats them as transient.
fn map_send_error(e: reqwest::Error, timeout_secs: u64) -> PlatformError {
    if e.is_timeout() {
        PlatformError::NetworkTimeout(timeout_secs)
    } else {
        PlatformError::Remote(e.to_string())
    }
}

/// Map a non-2xx platform response to the error taxonomy.
fn map_status(status: StatusCode, context: &str, body: &str) -> PlatformError {
    match status {
        StatusCode::NOT_FOUND => PlatformError::NotFound(context.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            PlatformError::PermissionDenied(format!("{context}: {status}"))
        }
        StatusCode::CONFLICT => PlatformError::AlreadyCaptured,
        _ => PlatformError::Remote(format!("{context}: {status} {body}")),
    }
}
