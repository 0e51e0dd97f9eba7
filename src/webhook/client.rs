//! Webhook delivery client.
//!
//! POSTs a transcoded payload to the currently configured URL. The URL can be
//! replaced at runtime by the settings API while deliveries are in flight;
//! each delivery reads it once and keeps that value for all its attempts.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::validation::parse_http_url;
use crate::config::WebhookConfig;
use crate::resilience::{is_retryable_status, RetryPolicy};
use crate::webhook::payload::WebhookPayload;

const USER_AGENT: &str = concat!("wabiz-mock/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no webhook URL configured")]
    NotConfigured,

    #[error("invalid webhook URL: {0}")]
    InvalidUrl(String),

    #[error("failed to encode webhook payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook endpoint answered {status}")]
    Rejected { status: StatusCode },
}

impl DeliveryError {
    fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Transport(_) => true,
            DeliveryError::Rejected { status } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub url: Url,
    pub status: StatusCode,
    pub attempts: u32,
}

pub struct WebhookClient {
    http: Client,
    endpoint: ArcSwapOption<Url>,
    retry: RetryPolicy,
}

impl WebhookClient {
    /// Build a client from configuration.
    pub fn new(config: &WebhookConfig) -> Result<Self, DeliveryError> {
        let endpoint = config
            .url
            .as_deref()
            .map(parse_http_url)
            .transpose()
            .map_err(DeliveryError::InvalidUrl)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoint: ArcSwapOption::from(endpoint.map(Arc::new)),
            retry: RetryPolicy::from(&config.retries),
        })
    }

    /// Current destination.
    pub fn endpoint(&self) -> Option<Arc<Url>> {
        self.endpoint.load_full()
    }

    /// Replace the destination; `None` stops deliveries.
    pub fn set_endpoint(&self, url: Option<Url>) {
        tracing::info!(url = ?url.as_ref().map(Url::as_str), "Webhook URL updated");
        self.endpoint.store(url.map(Arc::new));
    }

    /// Serialize `payload` and POST it, retrying per the configured policy.
    pub async fn deliver(
        &self,
        payload: &WebhookPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let url = self.endpoint().ok_or(DeliveryError::NotConfigured)?;
        let body = serde_json::to_vec(payload)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.post_once(&url, body.clone()).await {
                Ok(status) => {
                    return Ok(DeliveryReceipt {
                        url: Url::clone(&url),
                        status,
                        attempts: attempt,
                    });
                }
                Err(e) if e.is_retryable() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        url = %url,
                        attempt,
                        delay = ?delay,
                        error = %e,
                        "Retrying webhook delivery"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(&self, url: &Url, body: Vec<u8>) -> Result<StatusCode, DeliveryError> {
        let response = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(DeliveryError::Rejected { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WebhookRequest;
    use crate::webhook::transcode::to_webhook_payload;

    #[test]
    fn test_rejects_invalid_initial_url() {
        let config = WebhookConfig {
            url: Some("not a url".into()),
            ..WebhookConfig::default()
        };
        assert!(matches!(
            WebhookClient::new(&config),
            Err(DeliveryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_swap() {
        let client = WebhookClient::new(&WebhookConfig::default()).unwrap();
        assert!(client.endpoint().is_none());

        let url = Url::parse("http://127.0.0.1:9/hook").unwrap();
        client.set_endpoint(Some(url.clone()));
        assert_eq!(client.endpoint().as_deref(), Some(&url));

        client.set_endpoint(None);
        assert!(client.endpoint().is_none());
    }

    #[tokio::test]
    async fn test_deliver_without_url() {
        let client = WebhookClient::new(&WebhookConfig::default()).unwrap();
        let payload = to_webhook_payload(&WebhookRequest::default(), "b", "p", "d");

        let err = client.deliver(&payload).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured));
    }

    #[test]
    fn test_retry_classification() {
        assert!(DeliveryError::Rejected {
            status: StatusCode::SERVICE_UNAVAILABLE
        }
        .is_retryable());
        assert!(!DeliveryError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY
        }
        .is_retryable());
        assert!(!DeliveryError::NotConfigured.is_retryable());
    }
}
