//! Domain model → webhook document.
//!
//! Everything here is pure. The mapping is total: enum values without a
//! canonical token render as `"unknown"` so one odd status never blocks the
//! rest of a batch.

use crate::model::{Pricing, PricingModel, Status, StatusKind, WebhookRequest};
use crate::webhook::payload::{
    WebhookChange, WebhookEntry, WebhookMetadata, WebhookPayload, WebhookPricing, WebhookStatus,
    WebhookValue, FIELD_MESSAGES, MESSAGING_PRODUCT, OBJECT_BUSINESS_ACCOUNT,
};

/// Token used for enum values with no external spelling.
pub const UNKNOWN_TOKEN: &str = "unknown";

/// External spelling of a delivery status.
pub fn status_token(status: StatusKind) -> &'static str {
    match status {
        StatusKind::Sent => "sent",
        StatusKind::Delivered => "delivered",
        StatusKind::Read => "read",
        StatusKind::Unknown => UNKNOWN_TOKEN,
    }
}

/// External spelling of a pricing model.
pub fn pricing_model_token(model: PricingModel) -> &'static str {
    match model {
        PricingModel::Cbp => "CBP",
        PricingModel::Nbp => "NBP",
        PricingModel::Unknown => UNKNOWN_TOKEN,
    }
}

fn transcode_pricing(pricing: &Pricing) -> WebhookPricing {
    WebhookPricing {
        pricing_model: pricing_model_token(pricing.pricing_model).to_string(),
        billable: pricing.billable,
    }
}

fn transcode_status(status: &Status) -> WebhookStatus {
    WebhookStatus {
        id: status.id.clone(),
        status: status_token(status.status).to_string(),
        recipient_id: status.recipient_id.clone(),
        timestamp: status.timestamp,
        conversation: status.conversation.clone(),
        pricing: status.pricing.as_ref().map(transcode_pricing),
    }
}

/// Build the webhook document for one business account / phone number.
///
/// Status order is preserved. The result always holds exactly one entry with
/// exactly one change.
pub fn to_webhook_payload(
    request: &WebhookRequest,
    business_account_id: &str,
    phone_number_id: &str,
    display_phone_number: &str,
) -> WebhookPayload {
    let value = WebhookValue {
        messaging_product: MESSAGING_PRODUCT.to_string(),
        metadata: WebhookMetadata {
            display_phone_number: display_phone_number.to_string(),
            phone_number_id: phone_number_id.to_string(),
        },
        contacts: request.contacts.clone(),
        messages: request.messages.clone(),
        statuses: request.statuses.iter().map(transcode_status).collect(),
        errors: request.errors.clone(),
    };

    WebhookPayload {
        object: OBJECT_BUSINESS_ACCOUNT.to_string(),
        entry: vec![WebhookEntry {
            id: business_account_id.to_string(),
            changes: vec![WebhookChange {
                field: FIELD_MESSAGES.to_string(),
                value,
            }],
        }],
    }
}
