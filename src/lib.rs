//! Brevo lead server - contact-form backend for the Brevo CRM.
//!
//! Receives a website contact form, validates it, and saves the visitor as a
//! Brevo contact. Duplicate emails and phone numbers are reconciled instead of
//! rejected, and an optional notification email is sent for each lead.
//!
//! # Architecture
//!
//! - **domain**: Validated value objects (email, phone, lead)
//! - **models**: Inbound form and Brevo request bodies
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **client**: HTTP client for the Brevo API and response classification
//! - **services**: Lead submission, reconciliation and notifications
//! - **metrics**: CRM call and outcome counters
//! - **server**: axum router, handlers and rate limiting

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod models;
pub mod server;
pub mod services;

pub use client::{AsyncBrevoClient, AsyncBrevoClientImpl, BrevoClient, ConflictKind, RemoteOutcome};
pub use config::Config;
pub use domain::{ContactId, EmailAddress, LeadRecord, PhoneNumber, ValidationError};
pub use error::{AppError, BrevoApiError, ConfigError};
pub use metrics::{HttpTimer, Metrics, MetricsSummary};
pub use models::{ContactPayload, LeadForm, PayloadOptions, PhoneStrategy};
pub use server::{build_router, run_server, AppState, RateLimiter};
pub use services::{LeadService, LeadServiceImpl, ReconcileStep, Reconciler, Reconciliation};
