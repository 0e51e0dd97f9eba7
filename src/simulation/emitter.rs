//! Event emission: turns simulated events into webhook deliveries.
//!
//! Every delivery runs on its own task. The HTTP request that caused it has
//! already been answered by then and never waits for, or learns about, the
//! outcome; results only reach the logs and metrics.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;

use crate::config::BusinessConfig;
use crate::model::{Contact, WebhookRequest};
use crate::observability::metrics;
use crate::simulation::timeline::StatusTimeline;
use crate::webhook::{to_webhook_payload, DeliveryError, DeliveryReceipt, WebhookClient};

#[derive(Clone)]
pub struct EventEmitter {
    client: Arc<WebhookClient>,
    business: Arc<BusinessConfig>,
    timeline: StatusTimeline,
}

impl EventEmitter {
    pub fn new(
        client: Arc<WebhookClient>,
        business: BusinessConfig,
        timeline: StatusTimeline,
    ) -> Self {
        Self {
            client,
            business: Arc::new(business),
            timeline,
        }
    }

    pub fn client(&self) -> &Arc<WebhookClient> {
        &self.client
    }

    /// Transcode and deliver one batch for `phone_number_id`.
    pub async fn deliver(
        &self,
        phone_number_id: &str,
        request: &WebhookRequest,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let payload = to_webhook_payload(
            request,
            &self.business.account_id,
            phone_number_id,
            &self.business.display_phone_number,
        );
        let result = self.client.deliver(&payload).await;
        report(&result, request.statuses.len());
        result
    }

    /// Play the status timeline of an accepted message on a background task.
    ///
    /// Statuses go out one at a time, in order, each waiting for the previous
    /// delivery to finish. A failed delivery does not stop later ones.
    pub fn schedule_statuses(
        &self,
        phone_number_id: String,
        message_id: String,
        recipient: Contact,
    ) -> JoinHandle<()> {
        let emitter = self.clone();
        tokio::spawn(async move {
            let statuses = emitter
                .timeline
                .statuses(&message_id, &recipient.wa_id, unix_now());

            for status in statuses {
                tokio::time::sleep(emitter.timeline.delay()).await;
                let _ = emitter
                    .deliver(&phone_number_id, &WebhookRequest::status(status))
                    .await;
            }
        })
    }
}

fn report(result: &Result<DeliveryReceipt, DeliveryError>, statuses: usize) {
    match result {
        Ok(receipt) => {
            metrics::record_webhook_delivery("delivered");
            tracing::info!(
                url = %receipt.url,
                status = %receipt.status,
                attempts = receipt.attempts,
                statuses,
                "Webhook delivered"
            );
        }
        Err(DeliveryError::NotConfigured) => {
            metrics::record_webhook_delivery("skipped");
            tracing::debug!("No webhook URL configured, dropping event");
        }
        Err(e) => {
            metrics::record_webhook_delivery("failed");
            tracing::warn!(error = %e, statuses, "Webhook delivery failed");
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
