// Contact Details - typed replacement for the schema-less contact blob

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contact payload submitted when joining a queue.
///
/// `name` is required; `email` and `phone` gate which notification channels
/// an entry can receive. Custom field keys must be declared by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, String>,
}

impl ContactDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            custom_fields: BTreeMap::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_custom_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    /// Validate the payload against a queue's declared custom-field keys.
    ///
    /// Undeclared keys are rejected rather than silently passed through.
    pub fn validate(&self, declared_fields: &[String]) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "contact name must not be empty".to_string(),
            ));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(DomainError::ValidationError(format!(
                    "invalid email address: {email}"
                )));
            }
        }
        for key in self.custom_fields.keys() {
            if !declared_fields.iter().any(|f| f == key) {
                return Err(DomainError::ValidationError(format!(
                    "custom field not declared by queue: {key}"
                )));
            }
        }
        Ok(())
    }
}
