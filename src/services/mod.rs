//! Application service layer.
//!
//! Services contain the business logic between the HTTP handlers and the
//! Brevo client: lead submission, conflict reconciliation and notifications.

mod lead_service;
mod notification_service;
mod reconciler;

pub use lead_service::{LeadService, LeadServiceImpl, Submission};
pub use notification_service::{
    escape_html, NotificationService, NotificationServiceImpl, NotificationSettings,
};
pub use reconciler::{ReconcileNote, ReconcileStep, Reconciler, Reconciliation};
