//! Capstan configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CapstanError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CapstanConfig {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl CapstanConfig {
    /// Load config from the default path (~/.capstan/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CapstanError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CapstanError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CapstanError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path, honoring the CAPSTAN_CONFIG override.
    pub fn default_path() -> PathBuf {
        if let Ok(p) = std::env::var("CAPSTAN_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".capstan")
            .join("config.toml")
    }
}

/// Commerce-platform API credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// OAuth client id issued for the app.
    #[serde(default)]
    pub app_id: String,
    /// OAuth client secret. Prefer the CAPSTAN_APP_SECRET env var.
    #[serde(default)]
    pub app_secret: String,
    /// Timeout for order API calls (reads and capture).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for the token refresh call. Kept short so a wedged auth
    /// endpoint fails fast instead of stalling a capture attempt.
    #[serde(default = "default_token_timeout")]
    pub token_timeout_secs: u64,
}

fn default_base_url() -> String { "https://api.commerce.example.com".into() }
fn default_request_timeout() -> u64 { 30 }
fn default_token_timeout() -> u64 { 10 }

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_id: String::new(),
            app_secret: String::new(),
            request_timeout_secs: default_request_timeout(),
            token_timeout_secs: default_token_timeout(),
        }
    }
}

impl PlatformConfig {
    /// Resolve the client secret: env var wins over the config file.
    pub fn resolved_secret(&self) -> String {
        std::env::var("CAPSTAN_APP_SECRET").unwrap_or_else(|_| self.app_secret.clone())
    }
}

/// Deferred-capture scheduler tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Overdue-job sweep cadence. Covers timer gaps after host suspend.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Low-frequency reconciliation pass cadence.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
    /// Upper bound on a single dispatched capture attempt.
    #[serde(default = "default_capture_timeout")]
    pub capture_timeout_secs: u64,
    /// Fallback delay when an order is flagged deferred without a usable time.
    #[serde(default = "default_deferred_delay")]
    pub default_deferred_delay_hours: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_sweep_interval() -> u64 { 60 }
fn default_reconcile_interval() -> u64 { 86_400 }
fn default_capture_timeout() -> u64 { 30 }
fn default_deferred_delay() -> u64 { 24 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            reconcile_interval_secs: default_reconcile_interval(),
            capture_timeout_secs: default_capture_timeout(),
            default_deferred_delay_hours: default_deferred_delay(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy for failed capture attempts.
///
/// Disabled by default: a failed capture goes terminal on the first error.
/// When enabled, transient failures back off exponentially
/// (base, 2x base, 4x base, ...) up to `max_attempts` total attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_backoff")]
    pub base_backoff_secs: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_base_backoff() -> u64 { 5 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: default_max_attempts(),
            base_backoff_secs: default_base_backoff(),
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret for the webhook signature check. Empty disables the check.
    #[serde(default)]
    pub webhook_secret: String,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8733 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_secret: String::new(),
        }
    }
}
