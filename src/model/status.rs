//! Delivery statuses and their pricing/conversation metadata.
//!
//! The enums here are internal. They mirror the provider's numeric wire codes
//! and never serialize directly; the webhook transcoder renders them as text.

use serde::{Deserialize, Serialize};

/// Delivery state of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum StatusKind {
    #[default]
    Unknown = 0,
    Sent = 1,
    Delivered = 2,
    Read = 3,
}

impl From<i32> for StatusKind {
    fn from(code: i32) -> Self {
        match code {
            1 => StatusKind::Sent,
            2 => StatusKind::Delivered,
            3 => StatusKind::Read,
            _ => StatusKind::Unknown,
        }
    }
}

/// Billing model applied to a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum PricingModel {
    #[default]
    Unknown = 0,
    /// Conversation-based pricing.
    Cbp = 1,
    /// Notification-based pricing.
    Nbp = 2,
}

impl From<i32> for PricingModel {
    fn from(code: i32) -> Self {
        match code {
            1 => PricingModel::Cbp,
            2 => PricingModel::Nbp,
            _ => PricingModel::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub pricing_model: PricingModel,
    pub billable: bool,
}

/// Conversation a status belongs to. Serialized as-is into webhooks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ConversationOrigin>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationOrigin {
    #[serde(rename = "type")]
    pub kind: String,
}

/// A status update for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub id: String,
    pub status: StatusKind,
    /// Recipient `wa_id`. Empty when unknown.
    pub recipient_id: String,
    /// Unix seconds. Zero when unknown.
    pub timestamp: i64,
    pub conversation: Option<Conversation>,
    pub pricing: Option<Pricing>,
}
