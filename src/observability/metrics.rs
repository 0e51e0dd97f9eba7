//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wabiz_http_requests_total` (counter): requests by method, status
//! - `wabiz_http_request_duration_seconds` (histogram): latency through the full pipeline
//! - `wabiz_requests_rejected_total` (counter): admission rejections by reason
//! - `wabiz_webhook_deliveries_total` (counter): webhook outcomes
//!
//! Without an installed recorder every call here is a no-op, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Rejection reasons reported by the admission stages.
pub const REJECTED_UNAUTHORIZED: &str = "unauthorized";
pub const REJECTED_RATE_LIMIT: &str = "rate_limit";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "wabiz_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("wabiz_http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    counter!("wabiz_requests_rejected_total", "reason" => reason).increment(1);
}

pub fn record_webhook_delivery(outcome: &'static str) {
    counter!("wabiz_webhook_deliveries_total", "outcome" => outcome).increment(1);
}
