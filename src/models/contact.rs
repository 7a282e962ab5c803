//! Brevo contact payloads built from a validated lead.

use crate::domain::LeadRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// First whitespace-delimited token of the name.
pub const ATTR_FIRST_NAME: &str = "FIRSTNAME";
/// Remainder of the name.
pub const ATTR_LAST_NAME: &str = "LASTNAME";
pub const ATTR_COMPANY: &str = "COMPANY";
/// Brevo's unique phone attribute.
pub const ATTR_SMS: &str = "SMS";
/// Local number without country code (local-split strategy only).
pub const ATTR_LOCAL_PHONE: &str = "PHONE";
/// Non-unique attribute that keeps a phone number Brevo refused in `SMS`.
pub const ATTR_BACKUP_PHONE: &str = "PHONE_BACKUP";

/// List new leads are added to when none is configured.
pub const DEFAULT_LIST_ID: i64 = 2;

/// How the lead's phone is written into contact attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhoneStrategy {
    /// One `SMS` attribute in E.164 form.
    #[default]
    E164,
    /// Local number in `PHONE` plus a synthesized E.164 `SMS` value that
    /// assumes the default country code when none was typed.
    LocalSplit,
}

impl FromStr for PhoneStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e164" | "e.164" => Ok(Self::E164),
            "local_split" | "local-split" | "split" => Ok(Self::LocalSplit),
            other => Err(format!("unknown phone strategy: {}", other)),
        }
    }
}

impl fmt::Display for PhoneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::E164 => write!(f, "e164"),
            Self::LocalSplit => write!(f, "local_split"),
        }
    }
}

/// Settings that shape a payload but do not come from the lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadOptions {
    pub list_id: i64,
    pub phone_strategy: PhoneStrategy,
    pub default_country_code: String,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            list_id: DEFAULT_LIST_ID,
            phone_strategy: PhoneStrategy::E164,
            default_country_code: "34".to_string(),
        }
    }
}

/// The contact Brevo should hold for a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPayload {
    email: String,
    attributes: BTreeMap<String, String>,
    list_ids: Vec<i64>,
}

/// Body of `POST /contacts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest<'a> {
    pub email: &'a str,
    pub attributes: &'a BTreeMap<String, String>,
    pub list_ids: &'a [i64],
    pub update_enabled: bool,
}

/// Body of `PUT /contacts/{email}`. The email travels in the path.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactRequest<'a> {
    pub attributes: &'a BTreeMap<String, String>,
    pub list_ids: &'a [i64],
}

impl ContactPayload {
    /// Build the full payload, phone included.
    pub fn build(lead: &LeadRecord, options: &PayloadOptions) -> Self {
        let mut attributes = BTreeMap::new();

        let (first, last) = lead.split_name();
        attributes.insert(ATTR_FIRST_NAME.to_string(), first);
        attributes.insert(ATTR_LAST_NAME.to_string(), last);

        if let Some(company) = lead.company().filter(|c| !c.is_empty()) {
            attributes.insert(ATTR_COMPANY.to_string(), company.to_string());
        }

        if let Some(phone) = lead.phone() {
            match options.phone_strategy {
                PhoneStrategy::E164 => {
                    attributes.insert(ATTR_SMS.to_string(), phone.to_e164());
                }
                PhoneStrategy::LocalSplit => {
                    let parts = phone.split_country_code(&options.default_country_code);
                    attributes.insert(ATTR_LOCAL_PHONE.to_string(), parts.local);
                    attributes.insert(ATTR_SMS.to_string(), parts.international);
                }
            }
        }

        Self {
            email: lead.email().as_str().to_string(),
            attributes,
            list_ids: vec![options.list_id],
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn list_ids(&self) -> &[i64] {
        &self.list_ids
    }

    /// Whether the unique phone attribute is set.
    pub fn has_phone(&self) -> bool {
        self.attributes.contains_key(ATTR_SMS)
    }

    /// Same payload with every phone attribute removed.
    pub fn without_phone(&self) -> Self {
        let mut payload = self.clone();
        for attr in [ATTR_SMS, ATTR_LOCAL_PHONE, ATTR_BACKUP_PHONE] {
            payload.attributes.remove(attr);
        }
        payload
    }

    /// Same payload with the unique phone moved to the backup attribute.
    pub fn with_phone_as_backup(&self) -> Self {
        let mut payload = self.clone();
        if let Some(phone) = payload.attributes.remove(ATTR_SMS) {
            payload
                .attributes
                .insert(ATTR_BACKUP_PHONE.to_string(), phone);
        }
        payload
    }

    pub fn create_request(&self) -> CreateContactRequest<'_> {
        CreateContactRequest {
            email: &self.email,
            attributes: &self.attributes,
            list_ids: &self.list_ids,
            update_enabled: true,
        }
    }

    pub fn update_request(&self) -> UpdateContactRequest<'_> {
        UpdateContactRequest {
            attributes: &self.attributes,
            list_ids: &self.list_ids,
        }
    }
}
