//! HTTP client for the Brevo REST API.
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking`. The client handles authentication, timeouts
//! and classification of contact responses.

mod async_wrapper;
mod outcome;

pub use async_wrapper::{AsyncBrevoClient, AsyncBrevoClientImpl};
pub use outcome::{classify_response, detect_conflict, ConflictKind, RemoteOutcome};

use crate::config::Config;
use crate::error::{BrevoApiError, BrevoApiResult, ConfigError};
use crate::metrics::{HttpTimer, Metrics};
use crate::models::{ContactPayload, EmailRequest};
use serde::Serialize;
use std::error::Error as _;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client for the Brevo API.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct BrevoClient {
    /// Base URL for the Brevo API (including `/v3`)
    base_url: String,

    /// API key sent in the `api-key` header
    api_key: String,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,

    /// Metrics collector
    metrics: Metrics,
}

impl BrevoClient {
    /// Create a new BrevoClient from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` when no API key is configured.
    pub fn new(config: &Config, metrics: Metrics) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?.to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout))
            .build();

        Ok(Self {
            base_url: config.brevo_api_url.clone(),
            api_key,
            agent: Arc::new(agent),
            metrics,
        })
    }

    /// Create a BrevoClient with a custom base URL (useful for testing).
    #[doc(hidden)]
    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();

        Self {
            base_url,
            api_key,
            agent: Arc::new(agent),
            metrics: Metrics::new(),
        }
    }

    /// Get a reference to the metrics collector.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Send a JSON body and return the status and raw body, whatever the status.
    ///
    /// Only transport failures are errors.
    fn send<T: Serialize>(&self, method: &str, path: &str, body: &T) -> BrevoApiResult<(u16, String)> {
        let url = self.build_url(path);
        let body = serde_json::to_value(body)?;

        tracing::debug!("{} {}", method, url);
        tracing::debug!(
            "Request body: {}",
            serde_json::to_string(&body).unwrap_or_else(|_| "<invalid json>".to_string())
        );

        let timer = HttpTimer::new(self.metrics.clone());
        let result = self
            .agent
            .request(method, &url)
            .set("api-key", &self.api_key)
            .set("content-type", "application/json")
            .set("accept", "application/json")
            .send_json(body);

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                timer.complete_with_error();
                let error = Self::map_transport_error(transport);
                tracing::error!("{} {} - Error: {}", method, url, error);
                return Err(error);
            }
        };

        let status = response.status();
        let success = (200..300).contains(&status);

        let text = match response.into_string() {
            Ok(text) => text,
            // The CRM has already acted on a 2xx; the body is informational
            Err(e) if success => {
                tracing::debug!("{} {} - Unreadable success body: {}", method, url, e);
                String::new()
            }
            Err(e) => {
                timer.complete_with_error();
                let error = Self::map_io_error(&e, "Failed to read response body");
                tracing::error!("{} {} - Status {}, {}", method, url, status, error);
                return Err(error);
            }
        };

        if success {
            timer.complete();
            tracing::debug!("{} {} - Success (status: {})", method, url, status);
        } else {
            timer.complete_with_error();
            tracing::debug!("{} {} - Status {}: {}", method, url, status, text);
        }

        Ok((status, text))
    }

    /// Map a ureq transport error to a BrevoApiError.
    fn map_transport_error(transport: ureq::Transport) -> BrevoApiError {
        match transport.kind() {
            ureq::ErrorKind::ConnectionFailed => {
                BrevoApiError::HttpError("Connection failed".to_string())
            }
            ureq::ErrorKind::Io => {
                let io_error = transport
                    .source()
                    .and_then(|e| e.downcast_ref::<io::Error>());
                match io_error {
                    Some(e) => Self::map_io_error(e, "I/O error"),
                    None => BrevoApiError::HttpError(transport.to_string()),
                }
            }
            _ => BrevoApiError::HttpError(transport.to_string()),
        }
    }

    /// Timeouts become `Timeout`; anything else is an `HttpError`.
    fn map_io_error(error: &io::Error, context: &str) -> BrevoApiError {
        match error.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => BrevoApiError::Timeout,
            _ => BrevoApiError::HttpError(format!("{}: {}", context, error)),
        }
    }

    // ========================= Contact Operations =========================

    /// `POST /contacts` with `updateEnabled: true`.
    pub fn create_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome> {
        let (status, body) = self.send("POST", "/contacts", &payload.create_request())?;
        Ok(classify_response(status, &body))
    }

    /// `PUT /contacts/{email}`.
    pub fn update_contact(&self, payload: &ContactPayload) -> BrevoApiResult<RemoteOutcome> {
        let path = format!("/contacts/{}", urlencoding::encode(payload.email()));
        let (status, body) = self.send("PUT", &path, &payload.update_request())?;
        Ok(classify_response(status, &body))
    }

    // ========================= Transactional Email =========================

    /// `POST /smtp/email`.
    pub fn send_email(&self, email: &EmailRequest) -> BrevoApiResult<()> {
        let (status, body) = self.send("POST", "/smtp/email", email)?;

        if (200..300).contains(&status) {
            return Ok(());
        }

        let message = match classify_response(status, &body) {
            RemoteOutcome::Failure { message, .. } | RemoteOutcome::Conflict { message, .. } => {
                message
            }
            RemoteOutcome::Success { .. } => String::new(),
        };
        Err(BrevoApiError::ApiError { status, message })
    }
}
