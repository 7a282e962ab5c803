//! Async wrapper around the synchronous BrevoClient.
//!
//! This module provides an async interface to the synchronous BrevoClient by using
//! `tokio::task::spawn_blocking` to run HTTP operations on a dedicated thread pool,
//! preventing blocking of the async runtime.

use crate::client::{BrevoClient, RemoteOutcome};
use crate::error::{BrevoApiError, BrevoApiResult};
use crate::models::{ContactPayload, EmailRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Async CRM operations used by the reconciler and the notifier.
///
/// Contact calls return the classified [`RemoteOutcome`] for any HTTP
/// answer; `Err` means no answer was received.
#[async_trait]
pub trait AsyncBrevoClient: Send + Sync {
    async fn create_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome>;
    async fn update_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome>;
    async fn send_email(&self, email: &EmailRequest) -> BrevoApiResult<()>;
}

/// Async wrapper around synchronous BrevoClient.
///
/// Uses `tokio::task::spawn_blocking` to run synchronous HTTP
/// operations on a dedicated thread pool, preventing blocking
/// the async runtime.
#[derive(Clone)]
pub struct AsyncBrevoClientImpl {
    client: Arc<BrevoClient>,
}

impl AsyncBrevoClientImpl {
    pub fn new(client: BrevoClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl AsyncBrevoClient for AsyncBrevoClientImpl {
    async fn create_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome> {
        let client = self.client.clone();
        let payload = payload.clone();

        tokio::task::spawn_blocking(move || client.create_contact(&payload))
            .await
            .map_err(|e| BrevoApiError::HttpError(format!("Task join error: {}", e)))?
    }

    async fn update_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome> {
        let client = self.client.clone();
        let payload = payload.clone();

        tokio::task::spawn_blocking(move || client.update_contact(&payload))
            .await
            .map_err(|e| BrevoApiError::HttpError(format!("Task join error: {}", e)))?
    }

    async fn send_email(&self, email: &EmailRequest) -> BrevoApiResult<()> {
        let client = self.client.clone();
        let email = email.clone();

        tokio::task::spawn_blocking(move || client.send_email(&email))
            .await
            .map_err(|e| BrevoApiError::HttpError(format!("Task join error: {}", e)))?
    }
}
