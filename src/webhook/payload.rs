//! External webhook document, in the provider's exact wire shape.

use serde::{Deserialize, Serialize};

use crate::model::{Contact, Conversation, ErrorDetail, Message};

/// Value of the top-level `object` field.
pub const OBJECT_BUSINESS_ACCOUNT: &str = "whatsapp_business_account";
/// Value of `change.field` for message and status notifications.
pub const FIELD_MESSAGES: &str = "messages";
/// Value of `value.messaging_product`.
pub const MESSAGING_PRODUCT: &str = "whatsapp";

/// A complete webhook notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    pub entry: Vec<WebhookEntry>,
}

/// One business account's changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEntry {
    pub id: String,
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookChange {
    pub field: String,
    pub value: WebhookValue,
}

/// The notification body. Empty lists are left out of the document entirely,
/// consumers tell "no data" from "empty update" by key presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookValue {
    pub messaging_product: String,
    pub metadata: WebhookMetadata,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Contact>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<WebhookStatus>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMetadata {
    pub display_phone_number: String,
    pub phone_number_id: String,
}

/// A status with its enum rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookStatus {
    pub id: String,
    pub status: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub recipient_id: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Conversation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<WebhookPricing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPricing {
    pub pricing_model: String,
    pub billable: bool,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl WebhookPayload {
    /// The single value this payload wraps.
    pub fn value(&self) -> Option<&WebhookValue> {
        self.entry
            .first()
            .and_then(|entry| entry.changes.first())
            .map(|change| &change.value)
    }
}
