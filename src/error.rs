//! Error types for the Brevo lead server.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use crate::domain::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur when talking to the Brevo API at the transport level.
///
/// HTTP error statuses are not errors here; they are classified into a
/// [`RemoteOutcome`](crate::client::RemoteOutcome).
#[derive(Error, Debug)]
pub enum BrevoApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Network timeout
    #[error("Request timeout")]
    Timeout,

    /// Failed to serialize a request body
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// API returned an error status code outside the contact protocol
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Errors a lead submission can end with, mapped onto HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// The visitor sent invalid data
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The body could not be read as JSON or form data
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The server is missing configuration it needs for the CRM
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The CRM could not be reached or did not answer in time
    #[error("CRM communication error: {0}")]
    UpstreamCommunication(String),

    /// A duplicate conflict survived every remediation path
    #[error("CRM conflict could not be resolved: {0}")]
    UpstreamConflict(String),

    /// The CRM rejected the contact for a reason other than duplication
    #[error("CRM rejected the request (status {status}): {message}")]
    UpstreamRejection { status: u16, message: String },

    /// Too many submissions from one client address
    #[error("Too many requests")]
    RateLimited,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Configuration(_)
            | Self::UpstreamCommunication(_)
            | Self::UpstreamConflict(_)
            | Self::UpstreamRejection { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client. Configuration and transport details
    /// stay in the server log.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::InvalidBody(_) => "Invalid request body".to_string(),
            Self::Configuration(_) => "Server configuration error".to_string(),
            Self::UpstreamCommunication(_) => "Error communicating with CRM".to_string(),
            Self::UpstreamConflict(_) => {
                "Contact could not be saved because it conflicts with an existing contact"
                    .to_string()
            }
            Self::UpstreamRejection { message, .. } => format!("CRM error: {}", message),
            Self::RateLimited => "Too many requests, please try again later".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Lead submission failed");
        } else {
            tracing::warn!(error = %self, "Lead submission rejected");
        }

        let body = match &self {
            Self::Validation(e) => json!({
                "error": self.client_message(),
                "field": e.field(),
            }),
            _ => json!({
                "error": self.client_message(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results with BrevoApiError
pub type BrevoApiResult<T> = Result<T, BrevoApiError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
