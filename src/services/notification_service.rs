//! New-lead notification emails.
//!
//! Notifications are best effort: failures are logged and counted, never
//! returned.

use crate::client::AsyncBrevoClient;
use crate::domain::LeadRecord;
use crate::metrics::Metrics;
use crate::models::{EmailParty, EmailRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Notifies an operator about a saved lead.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Send the notification. Never fails.
    async fn notify(&self, lead: &LeadRecord);
}

/// Sender and recipient of notification emails.
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    pub recipient: String,
    pub sender_email: String,
    pub sender_name: String,
}

/// Sends notifications through Brevo's transactional email API.
pub struct NotificationServiceImpl {
    client: Arc<dyn AsyncBrevoClient>,
    settings: NotificationSettings,
    metrics: Metrics,
}

impl NotificationServiceImpl {
    pub fn new(
        client: Arc<dyn AsyncBrevoClient>,
        settings: NotificationSettings,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            settings,
            metrics,
        }
    }

    /// Build the email for a lead.
    pub fn build_email(&self, lead: &LeadRecord) -> EmailRequest {
        let received_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();

        let fields = [
            ("Name", Some(lead.name())),
            ("Email", Some(lead.email().as_str())),
            ("Phone", lead.phone().map(|p| p.as_str())),
            ("Company", lead.company()),
            ("Message", lead.message()),
        ];

        let mut text = format!("New contact form submission ({})\n\n", received_at);
        let mut html = format!(
            "<h2>New contact form submission</h2>\n<p><small>{}</small></p>\n<table>\n",
            received_at
        );
        for (label, value) in fields {
            let value = value.unwrap_or("-");
            text.push_str(&format!("{}: {}\n", label, value));
            html.push_str(&format!(
                "<tr><th align=\"left\">{}</th><td>{}</td></tr>\n",
                label,
                escape_html(value).replace('\n', "<br>")
            ));
        }
        html.push_str("</table>\n");

        EmailRequest {
            sender: EmailParty::new(
                self.settings.sender_email.clone(),
                Some(self.settings.sender_name.clone()),
            ),
            to: vec![EmailParty::new(self.settings.recipient.clone(), None)],
            reply_to: Some(EmailParty::new(
                lead.email().as_str(),
                Some(lead.name().to_string()),
            )),
            subject: format!("New lead: {}", lead.name()),
            html_content: html,
            text_content: text,
        }
    }
}

#[async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn notify(&self, lead: &LeadRecord) {
        let email = self.build_email(lead);

        match self.client.send_email(&email).await {
            Ok(()) => {
                self.metrics.record_notification(true);
                tracing::info!(lead = %lead.email(), "Notification email sent");
            }
            Err(e) => {
                self.metrics.record_notification(false);
                tracing::warn!(lead = %lead.email(), error = %e, "Notification email failed");
            }
        }
    }
}

/// Escape text for inclusion in HTML.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
