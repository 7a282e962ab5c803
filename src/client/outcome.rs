//! Classification of Brevo responses.

use crate::domain::ContactId;
use serde::{Deserialize, Serialize};

/// Brevo's structured code for a uniqueness violation.
pub const DUPLICATE_PARAMETER_CODE: &str = "duplicate_parameter";

/// Longest CRM message passed on to callers.
const MAX_MESSAGE_LEN: usize = 300;

/// Which unique attribute a duplicate conflict is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Email,
    Phone,
}

/// Result of one call to the Brevo contacts API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// Any 2xx. Brevo only returns an id when a contact is created.
    Success { contact_id: Option<ContactId> },

    /// `400` caused by an email or phone that already belongs to a contact.
    Conflict {
        kind: ConflictKind,
        code: Option<String>,
        message: String,
    },

    /// Any other error. `status` is `None` when no response was received.
    Failure { status: Option<u16>, message: String },
}

impl RemoteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether this is a conflict of the given kind.
    pub fn is_conflict(&self, kind: ConflictKind) -> bool {
        matches!(self, Self::Conflict { kind: k, .. } if *k == kind)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedContact {
    id: Option<ContactId>,
}

#[derive(Debug, Default, Deserialize)]
struct BrevoErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Classify a Brevo contacts response.
///
/// Every 2xx is a success. `204 No Content` and empty bodies are never
/// parsed, and a 2xx body that is not JSON still counts as success because
/// Brevo has already stored the contact.
pub fn classify_response(status: u16, body: &str) -> RemoteOutcome {
    if (200..300).contains(&status) {
        if status == 204 || body.trim().is_empty() {
            return RemoteOutcome::Success { contact_id: None };
        }

        let contact_id = match serde_json::from_str::<CreatedContact>(body) {
            Ok(created) => created.id,
            Err(e) => {
                tracing::debug!(status, "Unparsable success body from Brevo: {}", e);
                None
            }
        };
        return RemoteOutcome::Success { contact_id };
    }

    let parsed = serde_json::from_str::<BrevoErrorBody>(body).ok();
    let (code, message) = match parsed {
        Some(err) => (err.code, err.message.unwrap_or_default()),
        None => (None, body.trim().to_string()),
    };
    let message = if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        truncate(&message, MAX_MESSAGE_LEN)
    };

    if status == 400 {
        if let Some(kind) = detect_conflict(code.as_deref(), &message) {
            return RemoteOutcome::Conflict {
                kind,
                code,
                message,
            };
        }
    }

    RemoteOutcome::Failure {
        status: Some(status),
        message,
    }
}

/// Decide whether an error is a duplicate conflict and on which attribute.
///
/// Brevo reports both email and phone duplicates as `duplicate_parameter`,
/// so the attribute can only be told apart from the message text. Bodies
/// without a `code` fall back to matching Brevo's known messages. Both text
/// matches break if Brevo rewords its messages.
pub fn detect_conflict(code: Option<&str>, message: &str) -> Option<ConflictKind> {
    let lower = message.to_lowercase();
    let mentions_phone = ["sms", "phone", "whatsapp", "landline"]
        .iter()
        .any(|word| lower.contains(word));

    match code {
        Some(DUPLICATE_PARAMETER_CODE) => Some(if mentions_phone {
            ConflictKind::Phone
        } else {
            ConflictKind::Email
        }),
        Some(_) => None,
        None => {
            if lower.contains("already associated with another contact") {
                Some(ConflictKind::Phone)
            } else if lower.contains("contact already exist") {
                Some(ConflictKind::Email)
            } else {
                None
            }
        }
    }
}

fn truncate(message: &str, max: usize) -> String {
    if message.chars().count() <= max {
        message.to_string()
    } else {
        let cut: String = message.chars().take(max).collect();
        format!("{}...", cut)
    }
}
