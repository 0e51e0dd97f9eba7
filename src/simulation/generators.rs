//! Identifier generation and the contact registry.

use dashmap::DashMap;
use uuid::Uuid;

use crate::model::Contact;

const MESSAGE_ID_PREFIX: &str = "wamid.";

/// Generates provider-style message ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageIdGenerator;

impl MessageIdGenerator {
    pub fn next_id(&self) -> String {
        format!("{}{}", MESSAGE_ID_PREFIX, Uuid::new_v4().simple())
    }
}

/// Derive a `wa_id` from a phone number as written by a caller.
///
/// Returns `None` when the input holds no digits at all.
pub fn wa_id_for(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// Contacts seen by the mock, keyed by `wa_id`.
#[derive(Debug, Default)]
pub struct ContactStore {
    contacts: DashMap<String, Contact>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up or register the contact behind `input`.
    pub fn resolve(&self, input: &str) -> Option<Contact> {
        let wa_id = wa_id_for(input)?;
        let contact = self
            .contacts
            .entry(wa_id.clone())
            .or_insert_with(|| Contact {
                wa_id,
                profile: None,
                input: None,
            })
            .clone();

        Some(Contact {
            input: Some(input.to_string()),
            ..contact
        })
    }

    #[cfg(test)]
    pub fn get(&self, wa_id: &str) -> Option<Contact> {
        self.contacts.get(wa_id).map(|entry| entry.value().clone())
    }
}
