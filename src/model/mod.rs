//! Internal domain model of the mock provider.
//!
//! Contacts, messages and errors already have the provider's external shape
//! and serialize directly. Statuses carry internal enums and go through
//! [`crate::webhook::transcode`] before leaving the process.

pub mod message;
pub mod status;

use serde::{Deserialize, Serialize};

pub use message::{ImageMessage, Message, MessageType, TextMessage};
pub use status::{Conversation, ConversationOrigin, Pricing, PricingModel, Status, StatusKind};

/// A WhatsApp user known to the mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub wa_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,

    /// The phone number as the caller originally wrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
}

/// Provider error entry, used both in API error responses and webhooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: i32,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A batch of events destined for one webhook delivery.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WebhookRequest {
    pub contacts: Vec<Contact>,
    pub messages: Vec<Message>,
    pub statuses: Vec<Status>,
    pub errors: Vec<ErrorDetail>,
}

impl WebhookRequest {
    /// A request carrying a single status update.
    pub fn status(status: Status) -> Self {
        Self {
            statuses: vec![status],
            ..Self::default()
        }
    }
}
