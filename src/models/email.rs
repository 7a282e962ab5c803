//! Transactional email body for `POST /smtp/email`.

use serde::Serialize;

/// A sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailParty {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailParty {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }
}

/// A Brevo transactional email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub sender: EmailParty,
    pub to: Vec<EmailParty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<EmailParty>,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}
