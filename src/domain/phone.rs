//! PhoneNumber value object and normalization strategies.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Minimum length of a phone number once separators are removed.
pub const MIN_PHONE_LEN: usize = 7;

/// Country code written out and separated from the rest, e.g. `+34 600 123 456`.
static SEPARATED_COUNTRY_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+|00)(\d{1,3})[\s.\-()]+(.+)$").expect("valid country code regex")
});

/// A validated phone number as the visitor typed it (trimmed).
///
/// # Example
///
/// ```
/// use brevo_lead_server::domain::PhoneNumber;
///
/// let phone = PhoneNumber::parse("(600) 123-456").unwrap();
/// assert_eq!(phone.compact(), "600123456");
/// assert_eq!(phone.to_e164(), "+600123456");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

/// A phone number split into a local part and a full E.164 value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneParts {
    /// Digits without any country code.
    pub local: String,
    /// `+` followed by country code and local digits.
    pub international: String,
}

impl PhoneNumber {
    /// Validate a raw, non-empty phone string.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPhone` if fewer than seven characters
    /// remain after stripping spaces, dashes, parentheses and periods.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let phone = raw.trim().to_string();

        if strip_separators(&phone).chars().count() < MIN_PHONE_LEN {
            return Err(ValidationError::InvalidPhone(phone));
        }

        Ok(Self(phone))
    }

    /// Get the phone number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number with separators removed.
    pub fn compact(&self) -> String {
        strip_separators(&self.0)
    }

    /// E.164 rendering: a leading `00` becomes `+`, otherwise `+` is
    /// prefixed when absent.
    pub fn to_e164(&self) -> String {
        let compact = self.compact();
        if let Some(rest) = compact.strip_prefix("00") {
            format!("+{}", rest)
        } else if compact.starts_with('+') {
            compact
        } else {
            format!("+{}", compact)
        }
    }

    /// Split into a local number and a full international number.
    ///
    /// The country code is taken from the input when it is written with a
    /// separator after it (`+34 600...`) or when the prefixed digits start
    /// with `default_country_code`. Unprefixed numbers are assumed local to
    /// `default_country_code`.
    pub fn split_country_code(&self, default_country_code: &str) -> PhoneParts {
        if let Some(caps) = SEPARATED_COUNTRY_CODE.captures(&self.0) {
            let country = &caps[1];
            let local = digits(&caps[2]);
            return PhoneParts {
                international: format!("+{}{}", country, local),
                local,
            };
        }

        let compact = self.compact();
        let prefixed = compact
            .strip_prefix('+')
            .or_else(|| compact.strip_prefix("00"));

        match prefixed {
            Some(rest) => {
                let all = digits(rest);
                let local = match all.strip_prefix(default_country_code) {
                    Some(local) if !local.is_empty() => local.to_string(),
                    _ => all.clone(),
                };
                PhoneParts {
                    local,
                    international: format!("+{}", all),
                }
            }
            None => {
                let local = digits(&compact);
                PhoneParts {
                    international: format!("+{}{}", default_country_code, local),
                    local,
                }
            }
        }
    }
}

fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

impl Serialize for PhoneNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
