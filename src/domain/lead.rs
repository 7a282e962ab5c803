//! Validated lead record.

use super::email::EmailAddress;
use super::errors::ValidationError;
use super::phone::PhoneNumber;
use crate::models::LeadForm;
use serde::Serialize;

/// Minimum length of the visitor's name.
pub const MIN_NAME_LEN: usize = 2;

/// Minimum length of the message when the form requires one.
pub const MIN_MESSAGE_LEN: usize = 10;

/// A contact-form submission that passed validation.
///
/// Fields other than the email are trimmed but otherwise kept as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadRecord {
    name: String,
    email: EmailAddress,
    phone: Option<PhoneNumber>,
    company: Option<String>,
    message: Option<String>,
}

impl LeadRecord {
    /// Validate raw form fields.
    ///
    /// Rules run in order (name, email, phone, message) and the first
    /// failure is returned.
    pub fn from_form(form: &LeadForm, require_message: bool) -> Result<Self, ValidationError> {
        let name = trimmed(form.name.as_deref()).unwrap_or_default();
        if name.chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::InvalidName);
        }

        let email = EmailAddress::parse(form.email.as_deref().unwrap_or_default())?;

        let phone = trimmed(form.phone.as_deref())
            .map(|p| PhoneNumber::parse(&p))
            .transpose()?;

        let message = trimmed(form.message.as_deref());
        if require_message {
            let len = message.as_deref().map(|m| m.chars().count()).unwrap_or(0);
            if len < MIN_MESSAGE_LEN {
                return Err(ValidationError::InvalidMessage);
            }
        }

        Ok(Self {
            name,
            email,
            phone,
            company: trimmed(form.company.as_deref()),
            message,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn phone(&self) -> Option<&PhoneNumber> {
        self.phone.as_ref()
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Split the name into first token and the remainder.
    ///
    /// `"Jane  van Doe"` gives `("Jane", "van Doe")`; a single token gives an
    /// empty last name.
    pub fn split_name(&self) -> (String, String) {
        let mut tokens = self.name.split_whitespace();
        let first = tokens.next().unwrap_or_default().to_string();
        let last = tokens.collect::<Vec<_>>().join(" ");
        (first, last)
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
