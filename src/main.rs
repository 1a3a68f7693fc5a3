//! # Capstan — deferred payment capture service
//!
//! Receives order webhooks from the commerce platform, reads the
//! payment-intent flag off order metadata, and captures authorized
//! payments either immediately or at the flagged future time.
//!
//! Usage:
//!   capstan                          # Start with ~/.capstan/config.toml
//!   capstan --config ./capstan.toml  # Custom config path
//!   capstan --port 9000              # Override the gateway port

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "capstan",
    version,
    about = "⚓ Capstan — deferred payment capture for e-commerce orders"
)]
struct Cli {
    /// Path to config file (default: ~/.capstan/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Gateway bind host override
    #[arg(long)]
    host: Option<String>,

    /// Gateway bind port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "debug,hyper=info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => capstan_core::CapstanConfig::load_from(std::path::Path::new(path))?,
        None => capstan_core::CapstanConfig::load()?,
    };

    let mut gateway_config = config.gateway.clone();
    if let Some(host) = cli.host {
        gateway_config.host = host;
    }
    if let Some(port) = cli.port {
        gateway_config.port = port;
    }

    if config.platform.app_id.is_empty() {
        tracing::warn!("⚠️ No platform app_id configured — platform API calls will be rejected");
    }
    if gateway_config.webhook_secret.is_empty() {
        tracing::warn!("⚠️ No webhook secret configured — inbound signature check is disabled");
    }

    let platform = Arc::new(capstan_platform::PlatformClient::new(&config.platform));
    let scheduler = Arc::new(capstan_scheduler::CaptureScheduler::new(
        platform.clone(),
        &config.scheduler,
    ));
    scheduler.start();
    let processor = Arc::new(capstan_orders::OrderProcessor::new(
        platform,
        scheduler.clone(),
        &config.scheduler,
    ));

    tracing::info!("⚓ Capstan v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("   platform:  {}", config.platform.base_url);
    tracing::info!("   sweep:     every {}s", config.scheduler.sweep_interval_secs);
    tracing::info!(
        "   retry:     {}",
        if config.scheduler.retry.enabled {
            "enabled"
        } else {
            "disabled (failed captures are terminal)"
        }
    );

    let state = Arc::new(capstan_gateway::AppState {
        gateway_config,
        scheduler: scheduler.clone(),
        processor,
        start_time: std::time::Instant::now(),
    });

    let result = capstan_gateway::start(state).await;
    scheduler.stop();
    result
}
