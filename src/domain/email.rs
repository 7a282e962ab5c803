//! EmailAddress value object.

use super::errors::ValidationError;
use serde::{Serialize, Serializer};
use std::fmt;

/// A normalized, validated email address.
///
/// Input is trimmed and lower-cased before validation, so two submissions
/// that differ only in case resolve to the same CRM contact.
///
/// # Example
///
/// ```
/// use brevo_lead_server::domain::EmailAddress;
///
/// let email = EmailAddress::parse("  Jane@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "jane@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalize and validate a raw email string.
    ///
    /// # Validation Rules
    ///
    /// - Must not be empty after trimming (`MissingEmail`)
    /// - Must not contain whitespace
    /// - Must contain exactly one '@' with a non-empty local part
    /// - Domain must contain at least one '.' and no empty labels
    ///
    /// # Errors
    ///
    /// Returns `MissingEmail` or `InvalidEmailFormat`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let email = raw.trim().to_lowercase();

        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }

        if !Self::is_valid(&email) {
            return Err(ValidationError::InvalidEmailFormat(email));
        }

        Ok(Self(email))
    }

    fn is_valid(email: &str) -> bool {
        if email.chars().any(char::is_whitespace) {
            return false;
        }

        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || domain.contains('@') {
            return false;
        }

        if !domain.contains('.') {
            return false;
        }

        domain.split('.').all(|label| !label.is_empty())
    }

    /// Get the email address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
