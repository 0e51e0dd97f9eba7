//! Simulated delivery timeline for an accepted outbound message.

use std::time::Duration;

use uuid::Uuid;

use crate::config::SimulationConfig;
use crate::model::{Conversation, ConversationOrigin, Pricing, PricingModel, Status, StatusKind};

/// Conversations stay open for 24 hours.
const CONVERSATION_WINDOW_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct StatusTimeline {
    delay: Duration,
    read_receipts: bool,
}

impl StatusTimeline {
    pub fn new(delay: Duration, read_receipts: bool) -> Self {
        Self {
            delay,
            read_receipts,
        }
    }

    /// Spacing between two consecutive statuses.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Statuses for `message_id` in emission order, starting at unix time `sent_at`.
    ///
    /// All statuses share one business-initiated conversation billed under
    /// conversation-based pricing. Timestamps are whole seconds, so the delay
    /// is rounded up and each status lands at least one second after the
    /// previous one.
    pub fn statuses(&self, message_id: &str, recipient_id: &str, sent_at: i64) -> Vec<Status> {
        let conversation = Conversation {
            id: Uuid::new_v4().simple().to_string(),
            origin: Some(ConversationOrigin {
                kind: "business_initiated".to_string(),
            }),
            expiration_timestamp: Some(sent_at + CONVERSATION_WINDOW_SECS),
        };
        let pricing = Pricing {
            pricing_model: PricingModel::Cbp,
            billable: true,
        };

        let mut kinds = vec![StatusKind::Sent, StatusKind::Delivered];
        if self.read_receipts {
            kinds.push(StatusKind::Read);
        }

        let step = self.delay.as_millis().div_ceil(1000).max(1) as i64;
        kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Status {
                id: message_id.to_string(),
                status: kind,
                recipient_id: recipient_id.to_string(),
                timestamp: sent_at + step * i as i64,
                conversation: Some(conversation.clone()),
                pricing: Some(pricing),
            })
            .collect()
    }
}

impl From<&SimulationConfig> for StatusTimeline {
    fn from(config: &SimulationConfig) -> Self {
        Self::new(
            Duration::from_millis(config.status_delay_ms),
            config.read_receipts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_timeline_order() {
        let timeline = StatusTimeline::new(Duration::from_secs(2), true);
        let statuses = timeline.statuses("wamid.1", "5511999999999", 1_000);

        let kinds: Vec<_> = statuses.iter().map(|s| s.status).collect();
        assert_eq!(
            kinds,
            vec![StatusKind::Sent, StatusKind::Delivered, StatusKind::Read]
        );
        let stamps: Vec<_> = statuses.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![1_000, 1_002, 1_004]);

        let conversation = statuses[0].conversation.as_ref().unwrap();
        assert!(statuses
            .iter()
            .all(|s| s.conversation.as_ref() == Some(conversation)));
        assert_eq!(conversation.expiration_timestamp, Some(1_000 + 86_400));
        assert_eq!(
            statuses[0].pricing,
            Some(Pricing {
                pricing_model: PricingModel::Cbp,
                billable: true
            })
        );
    }

    #[test]
    fn test_sub_second_delay_keeps_timestamps_distinct() {
        let timeline = StatusTimeline::new(Duration::from_millis(500), true);
        let stamps: Vec<_> = timeline
            .statuses("wamid.1", "1", 1_000)
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![1_000, 1_001, 1_002]);

        let timeline = StatusTimeline::new(Duration::from_millis(1_500), true);
        let stamps: Vec<_> = timeline
            .statuses("wamid.1", "1", 1_000)
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![1_000, 1_002, 1_004]);
    }

    #[test]
    fn test_without_read_receipts() {
        let timeline = StatusTimeline::new(Duration::ZERO, false);
        let statuses = timeline.statuses("wamid.1", "1", 0);
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[1].status, StatusKind::Delivered);
        assert!(statuses[1].timestamp > statuses[0].timestamp);
    }
}
