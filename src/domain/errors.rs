//! Domain validation errors.

use std::fmt;

/// Errors that can occur while validating a submitted lead.
///
/// Variants are ordered the way the validator checks them; the first
/// failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is empty or shorter than two characters.
    InvalidName,

    /// Email is missing or blank.
    MissingEmail,

    /// Email does not look like `local@domain.tld`.
    InvalidEmailFormat(String),

    /// Phone has fewer than seven characters once separators are removed.
    InvalidPhone(String),

    /// Message is required and shorter than ten characters.
    InvalidMessage,

    /// A CRM contact identifier was not positive.
    InvalidContactId(i64),
}

impl ValidationError {
    /// Name of the form field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidName => "name",
            Self::MissingEmail | Self::InvalidEmailFormat(_) => "email",
            Self::InvalidPhone(_) => "phone",
            Self::InvalidMessage => "message",
            Self::InvalidContactId(_) => "id",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "Name must be at least 2 characters"),
            Self::MissingEmail => write!(f, "Email is required"),
            Self::InvalidEmailFormat(email) => write!(f, "Invalid email address: {}", email),
            Self::InvalidPhone(phone) => write!(f, "Invalid phone number: {}", phone),
            Self::InvalidMessage => write!(f, "Message must be at least 10 characters"),
            Self::InvalidContactId(id) => write!(f, "Invalid contact id: {}", id),
        }
    }
}

impl std::error::Error for ValidationError {}
