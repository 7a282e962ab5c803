//! Duplicate-contact reconciliation.
//!
//! Brevo enforces uniqueness on the email and on the `SMS` phone attribute
//! independently. A lead may reuse an email (returning visitor) or a phone
//! already tied to another contact (shared company line). The protocol never
//! drops the lead: it updates the contact that owns the email, and a phone it
//! cannot store in `SMS` is either left out or kept in `PHONE_BACKUP`.
//!
//! ```text
//! CREATE ──dup email──▶ UPDATE_BY_EMAIL ──dup phone──▶ CREATE_WITH_PHONE_BACKUP
//!    └────dup phone──▶ CREATE_WITHOUT_PHONE
//! ```
//!
//! Every other answer is terminal. Calls run strictly one after another and
//! at most three are made.

use crate::client::{AsyncBrevoClient, ConflictKind, RemoteOutcome};
use crate::domain::ContactId;
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::models::ContactPayload;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A step of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileStep {
    /// `POST /contacts` with the full payload.
    Create,
    /// `PUT /contacts/{email}` with the full payload.
    UpdateByEmail,
    /// `POST /contacts` without any phone attribute.
    CreateWithoutPhone,
    /// Phone moved to `PHONE_BACKUP`; `PUT` if the email exists, else `POST`.
    CreateWithPhoneBackup,
}

impl ReconcileStep {
    /// The step that handles `outcome`, or `None` if `outcome` is terminal.
    pub fn next(self, outcome: &RemoteOutcome) -> Option<ReconcileStep> {
        let RemoteOutcome::Conflict { kind, .. } = outcome else {
            return None;
        };

        match (self, kind) {
            (Self::Create, ConflictKind::Email) => Some(Self::UpdateByEmail),
            (Self::Create, ConflictKind::Phone) => Some(Self::CreateWithoutPhone),
            (Self::UpdateByEmail, ConflictKind::Phone) => Some(Self::CreateWithPhoneBackup),
            _ => None,
        }
    }
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "CREATE",
            Self::UpdateByEmail => "UPDATE_BY_EMAIL",
            Self::CreateWithoutPhone => "CREATE_WITHOUT_PHONE",
            Self::CreateWithPhoneBackup => "CREATE_WITH_PHONE_BACKUP",
        };
        f.write_str(name)
    }
}

/// What happened to the phone when it could not be stored as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileNote {
    PhoneNotAssociated,
    PhoneStoredAsBackup,
}

impl ReconcileNote {
    pub fn message(&self) -> &'static str {
        match self {
            Self::PhoneNotAssociated => {
                "phone not associated: it already belongs to another contact"
            }
            Self::PhoneStoredAsBackup => "phone stored as backup",
        }
    }
}

/// Terminal result of the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Step the protocol terminated in.
    pub step: ReconcileStep,
    pub outcome: RemoteOutcome,
    /// Set only on success after a phone remediation.
    pub note: Option<ReconcileNote>,
    /// Remote calls made.
    pub calls: usize,
}

impl Reconciliation {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn contact_id(&self) -> Option<ContactId> {
        match &self.outcome {
            RemoteOutcome::Success { contact_id } => *contact_id,
            _ => None,
        }
    }

    /// Map a failed reconciliation onto the error taxonomy.
    pub fn into_result(self) -> Result<Reconciliation, AppError> {
        let step = self.step;
        match self.outcome {
            RemoteOutcome::Success { .. } => Ok(self),
            RemoteOutcome::Conflict { message, .. } => {
                Err(AppError::UpstreamConflict(format!("{} in {}", message, step)))
            }
            RemoteOutcome::Failure {
                status: None,
                message,
            } => Err(AppError::UpstreamCommunication(message)),
            RemoteOutcome::Failure {
                status: Some(status),
                message,
            } => Err(AppError::UpstreamRejection { status, message }),
        }
    }
}

/// Runs the reconciliation protocol against Brevo.
#[derive(Clone)]
pub struct Reconciler {
    client: Arc<dyn AsyncBrevoClient>,
    metrics: Metrics,
}

impl Reconciler {
    pub fn new(client: Arc<dyn AsyncBrevoClient>, metrics: Metrics) -> Self {
        Self { client, metrics }
    }

    /// Save `payload` in Brevo, resolving duplicate conflicts.
    pub async fn reconcile(&self, payload: &ContactPayload) -> Reconciliation {
        let mut step = ReconcileStep::Create;
        let mut email_exists = false;
        let mut calls = 0;

        loop {
            let outcome = self.execute(step, payload, email_exists).await;
            calls += 1;

            tracing::info!(
                step = %step,
                email = %payload.email(),
                outcome = ?outcome,
                "Reconciliation step completed"
            );

            if outcome.is_conflict(ConflictKind::Email) {
                email_exists = true;
            }

            match step.next(&outcome) {
                Some(next) => step = next,
                None => return self.finish(step, outcome, calls),
            }
        }
    }

    async fn execute(
        &self,
        step: ReconcileStep,
        payload: &ContactPayload,
        email_exists: bool,
    ) -> RemoteOutcome {
        let result = match step {
            ReconcileStep::Create => self.client.create_contact(payload).await,
            ReconcileStep::UpdateByEmail => self.client.update_contact(payload).await,
            ReconcileStep::CreateWithoutPhone => {
                self.client.create_contact(&payload.without_phone()).await
            }
            ReconcileStep::CreateWithPhoneBackup => {
                let backup = payload.with_phone_as_backup();
                if email_exists {
                    self.client.update_contact(&backup).await
                } else {
                    self.client.create_contact(&backup).await
                }
            }
        };

        result.unwrap_or_else(|e| RemoteOutcome::Failure {
            status: None,
            message: e.to_string(),
        })
    }

    fn finish(&self, step: ReconcileStep, outcome: RemoteOutcome, calls: usize) -> Reconciliation {
        let note = if outcome.is_success() {
            match step {
                ReconcileStep::Create => {
                    self.metrics.record_contact_created();
                    None
                }
                ReconcileStep::UpdateByEmail => {
                    self.metrics.record_contact_updated();
                    None
                }
                ReconcileStep::CreateWithoutPhone => {
                    self.metrics.record_phone_dropped();
                    Some(ReconcileNote::PhoneNotAssociated)
                }
                ReconcileStep::CreateWithPhoneBackup => {
                    self.metrics.record_phone_backup();
                    Some(ReconcileNote::PhoneStoredAsBackup)
                }
            }
        } else {
            self.metrics.record_reconcile_failure();
            tracing::warn!(step = %step, outcome = ?outcome, "Reconciliation failed");
            None
        };

        Reconciliation {
            step,
            outcome,
            note,
            calls,
        }
    }
}
