//! HTTP handlers for the lead endpoint and health check.

use super::AppState;
use crate::error::AppError;
use crate::models::LeadForm;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde_json::json;

/// A contact form posted as JSON or as `application/x-www-form-urlencoded`.
pub struct LeadBody(pub LeadForm);

#[axum::async_trait]
impl<S> FromRequest<S> for LeadBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<LeadForm>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidBody(e.body_text()))?;
            return Ok(Self(form));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidBody(e.body_text()))?;

        // An empty body is an empty form; validation reports the first field
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(LeadForm::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::InvalidBody(e.to_string()))
    }
}

/// `POST /api/brevo`: validate a lead and save it in Brevo.
///
/// Without a CRM configuration every submission fails with 500 before the
/// body is looked at.
pub async fn submit_lead(
    State(state): State<AppState>,
    body: Result<LeadBody, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let leads = state.leads.as_ref().ok_or_else(|| {
        AppError::Configuration("BREVO_API_KEY is not configured".to_string())
    })?;

    let LeadBody(form) = body?;
    let submission = leads.submit(form).await?;
    let reconciliation = &submission.reconciliation;

    let message = match reconciliation.note {
        Some(note) => format!("Contact saved ({})", note.message()),
        None => "Contact saved".to_string(),
    };

    tracing::info!(
        email = %submission.lead.email(),
        step = %reconciliation.step,
        calls = reconciliation.calls,
        "Lead saved"
    );

    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": {
            "email": submission.lead.email(),
            "contactId": reconciliation.contact_id(),
            "step": reconciliation.step,
            "note": reconciliation.note,
            "calls": reconciliation.calls,
        }
    })))
}

/// `GET /health`: liveness plus CRM configuration status and counters.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "crmConfigured": state.leads.is_some(),
        "metrics": state.metrics.summary(),
    }))
}
