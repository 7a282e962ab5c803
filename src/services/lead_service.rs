//! Lead submission service.
//!
//! Validates a form, builds the contact payload, runs the reconciliation
//! protocol and fires the operator notification.

use super::notification_service::{
    NotificationService, NotificationServiceImpl, NotificationSettings,
};
use super::reconciler::{Reconciler, Reconciliation};
use crate::client::{AsyncBrevoClient, AsyncBrevoClientImpl, BrevoClient};
use crate::config::Config;
use crate::domain::LeadRecord;
use crate::error::{AppError, ConfigError};
use crate::metrics::Metrics;
use crate::models::{ContactPayload, LeadForm, PayloadOptions};
use async_trait::async_trait;
use std::sync::Arc;

/// A lead that was saved in the CRM.
#[derive(Debug, Clone)]
pub struct Submission {
    pub lead: LeadRecord,
    pub reconciliation: Reconciliation,
}

/// Lead service trait for the submission endpoint.
#[async_trait]
pub trait LeadService: Send + Sync {
    /// Validate and save a lead.
    async fn submit(&self, form: LeadForm) -> Result<Submission, AppError>;
}

/// Default implementation of LeadService.
pub struct LeadServiceImpl {
    reconciler: Reconciler,
    notifier: Option<Arc<dyn NotificationService>>,
    payload_options: PayloadOptions,
    require_message: bool,
}

impl LeadServiceImpl {
    /// Create a new lead service.
    pub fn new(
        reconciler: Reconciler,
        notifier: Option<Arc<dyn NotificationService>>,
        payload_options: PayloadOptions,
        require_message: bool,
    ) -> Self {
        Self {
            reconciler,
            notifier,
            payload_options,
            require_message,
        }
    }

    /// Wire the service to Brevo from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` when `BREVO_API_KEY` is not set.
    pub fn from_config(config: &Config, metrics: Metrics) -> Result<Self, ConfigError> {
        let client = BrevoClient::new(config, metrics.clone())?;
        let client = Arc::new(AsyncBrevoClientImpl::new(client)) as Arc<dyn AsyncBrevoClient>;
        Ok(Self::with_client(config, client, metrics))
    }

    /// Wire the service to any client implementation.
    pub fn with_client(config: &Config, client: Arc<dyn AsyncBrevoClient>, metrics: Metrics) -> Self {
        let notifier = config.notify_email.as_ref().map(|recipient| {
            Arc::new(NotificationServiceImpl::new(
                client.clone(),
                NotificationSettings {
                    recipient: recipient.clone(),
                    sender_email: config.sender_email.clone(),
                    sender_name: config.sender_name.clone(),
                },
                metrics.clone(),
            )) as Arc<dyn NotificationService>
        });

        Self::new(
            Reconciler::new(client, metrics),
            notifier,
            config.payload_options(),
            config.require_message,
        )
    }
}

#[async_trait]
impl LeadService for LeadServiceImpl {
    async fn submit(&self, form: LeadForm) -> Result<Submission, AppError> {
        let lead = LeadRecord::from_form(&form, self.require_message)?;
        let payload = ContactPayload::build(&lead, &self.payload_options);

        let reconciliation = self.reconciler.reconcile(&payload).await.into_result()?;

        if let Some(notifier) = &self.notifier {
            let notifier = notifier.clone();
            let lead = lead.clone();
            tokio::spawn(async move {
                notifier.notify(&lead).await;
            });
        }

        Ok(Submission {
            lead,
            reconciliation,
        })
    }
}
