//! Mock WhatsApp Business API server.
//!
//! A stand-in for the provider's HTTP API, built with Tokio and Axum, for
//! integration testing of clients and webhook consumers.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!       │
//!       ▼
//!   ┌─────────┐   ┌─────────────┐   ┌────────────┐   ┌───────────────┐   ┌──────────┐
//!   │ tracing │──▶│ correlation │──▶│ rate limit │──▶│     auth      │──▶│ handlers │
//!   │  span   │   │     id      │   │  (bucket)  │   │ Bearer/Apikey │   │          │
//!   └─────────┘   └─────────────┘   └────────────┘   └───────────────┘   └────┬─────┘
//!                                                                             │
//!                                                          accepted message   │
//!                                                                             ▼
//!   ┌──────────────┐   ┌─────────────┐   ┌──────────────┐              ┌──────────┐
//!   │   webhook    │◀──│  transcode  │◀──│   emitter    │◀─────────────│ timeline │
//!   │    client    │   │             │   │ (background) │              │sent→read │
//!   └──────┬───────┘   └─────────────┘   └──────────────┘              └──────────┘
//!          │
//!          ▼
//!   Webhook Receiver
//! ```

use std::path::PathBuf;

use clap::Parser;
use wabiz_mock::config::load_config;
use wabiz_mock::lifecycle;
use wabiz_mock::observability::init_logging;

#[derive(Parser)]
#[command(name = "wabiz-mock", version)]
#[command(about = "Mock WhatsApp Business API server", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "WABIZ_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    init_logging(&config.observability)?;

    tracing::info!("wabiz-mock v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        requests_per_second = config.rate_limit.requests_per_second,
        burst_size = config.rate_limit.burst_size,
        webhook_url = ?config.webhook.url,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
