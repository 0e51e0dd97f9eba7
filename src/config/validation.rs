//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and formats. Every problem
//! is reported, not just the first one.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::MockConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &MockConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::new(
                "listener.tls",
                "cert_path and key_path are both required",
            ));
        }
    }

    if config.rate_limit.requests_per_second == 0 {
        errors.push(ValidationError::new(
            "rate_limit.requests_per_second",
            "must be greater than zero",
        ));
    }
    if config.rate_limit.burst_size == 0 {
        errors.push(ValidationError::new(
            "rate_limit.burst_size",
            "must be greater than zero",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.tracing.service_name.trim().is_empty() {
        errors.push(ValidationError::new("tracing.service_name", "must not be empty"));
    }
    if let Some(endpoint) = &config.tracing.otlp_endpoint {
        if let Err(message) = check_http_url(endpoint) {
            errors.push(ValidationError::new("tracing.otlp_endpoint", message));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if config.business.account_id.is_empty() {
        errors.push(ValidationError::new("business.account_id", "must not be empty"));
    }
    if config.business.phone_number_id.is_empty() {
        errors.push(ValidationError::new(
            "business.phone_number_id",
            "must not be empty",
        ));
    }

    if let Some(url) = &config.webhook.url {
        if let Err(message) = check_http_url(url) {
            errors.push(ValidationError::new("webhook.url", message));
        }
    }
    if config.webhook.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "webhook.timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.webhook.retries.max_attempts == 0 {
        errors.push(ValidationError::new(
            "webhook.retries.max_attempts",
            "must be at least 1",
        ));
    }
    if config.webhook.retries.base_delay_ms > config.webhook.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "webhook.retries.base_delay_ms",
            "must not exceed max_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{raw}' is not a valid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    parse_http_url(raw).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MockConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = MockConfig::default();
        config.listener.bind_address = "not-an-addr".into();
        config.rate_limit.requests_per_second = 0;
        config.rate_limit.burst_size = 0;
        config.webhook.url = Some("ftp://example.com/hook".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "rate_limit.requests_per_second",
                "rate_limit.burst_size",
                "webhook.url",
            ]
        );
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://hooks.example.com/wa").is_ok());
        assert!(parse_http_url("relative/path").is_err());
        assert!(parse_http_url("mailto:ops@example.com").is_err());
    }
}
