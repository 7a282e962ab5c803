//! Basic metrics instrumentation for tracking CRM traffic and protocol outcomes.
//!
//! Provides counters and duration tracking for Brevo requests and the
//! reconciliation paths leads end up taking.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector shared by the client, the reconciler and the notifier.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Total number of requests made to Brevo
    crm_requests_total: Arc<AtomicU64>,

    /// Requests that failed at transport level or got a non-2xx status
    crm_errors_total: Arc<AtomicU64>,

    /// Total duration of all Brevo requests in milliseconds
    crm_duration_total_ms: Arc<AtomicU64>,

    /// Leads that ended as a plain create
    contacts_created_total: Arc<AtomicU64>,

    /// Leads merged into an existing contact by email
    contacts_updated_total: Arc<AtomicU64>,

    /// Leads saved without their phone
    phone_dropped_total: Arc<AtomicU64>,

    /// Leads whose phone went to the backup attribute
    phone_backup_total: Arc<AtomicU64>,

    /// Leads the protocol could not save
    reconcile_failures_total: Arc<AtomicU64>,

    notifications_sent_total: Arc<AtomicU64>,
    notifications_failed_total: Arc<AtomicU64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            crm_requests_total: Arc::new(AtomicU64::new(0)),
            crm_errors_total: Arc::new(AtomicU64::new(0)),
            crm_duration_total_ms: Arc::new(AtomicU64::new(0)),
            contacts_created_total: Arc::new(AtomicU64::new(0)),
            contacts_updated_total: Arc::new(AtomicU64::new(0)),
            phone_dropped_total: Arc::new(AtomicU64::new(0)),
            phone_backup_total: Arc::new(AtomicU64::new(0)),
            reconcile_failures_total: Arc::new(AtomicU64::new(0)),
            notifications_sent_total: Arc::new(AtomicU64::new(0)),
            notifications_failed_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a CRM request with duration.
    pub fn record_crm_request(&self, duration: Duration) {
        self.crm_requests_total.fetch_add(1, Ordering::Relaxed);
        self.crm_duration_total_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record a CRM error.
    pub fn record_crm_error(&self) {
        self.crm_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_contact_created(&self) {
        self.contacts_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_contact_updated(&self) {
        self.contacts_updated_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_phone_dropped(&self) {
        self.phone_dropped_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_phone_backup(&self) {
        self.phone_backup_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconcile_failure(&self) {
        self.reconcile_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of a notification email.
    pub fn record_notification(&self, sent: bool) {
        if sent {
            self.notifications_sent_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notifications_failed_total
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn crm_requests_total(&self) -> u64 {
        self.crm_requests_total.load(Ordering::Relaxed)
    }

    pub fn crm_errors_total(&self) -> u64 {
        self.crm_errors_total.load(Ordering::Relaxed)
    }

    pub fn crm_duration_total_ms(&self) -> u64 {
        self.crm_duration_total_ms.load(Ordering::Relaxed)
    }

    /// Get average CRM request duration in milliseconds.
    pub fn crm_duration_avg_ms(&self) -> f64 {
        let total = self.crm_duration_total_ms.load(Ordering::Relaxed);
        let count = self.crm_requests_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        for counter in [
            &self.crm_requests_total,
            &self.crm_errors_total,
            &self.crm_duration_total_ms,
            &self.contacts_created_total,
            &self.contacts_updated_total,
            &self.phone_dropped_total,
            &self.phone_backup_total,
            &self.reconcile_failures_total,
            &self.notifications_sent_total,
            &self.notifications_failed_total,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            crm_requests_total: self.crm_requests_total(),
            crm_errors_total: self.crm_errors_total(),
            crm_duration_total_ms: self.crm_duration_total_ms(),
            crm_duration_avg_ms: self.crm_duration_avg_ms(),
            contacts_created_total: self.contacts_created_total.load(Ordering::Relaxed),
            contacts_updated_total: self.contacts_updated_total.load(Ordering::Relaxed),
            phone_dropped_total: self.phone_dropped_total.load(Ordering::Relaxed),
            phone_backup_total: self.phone_backup_total.load(Ordering::Relaxed),
            reconcile_failures_total: self.reconcile_failures_total.load(Ordering::Relaxed),
            notifications_sent_total: self.notifications_sent_total.load(Ordering::Relaxed),
            notifications_failed_total: self.notifications_failed_total.load(Ordering::Relaxed),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub crm_requests_total: u64,
    pub crm_errors_total: u64,
    pub crm_duration_total_ms: u64,
    pub crm_duration_avg_ms: f64,
    pub contacts_created_total: u64,
    pub contacts_updated_total: u64,
    pub phone_dropped_total: u64,
    pub phone_backup_total: u64,
    pub reconcile_failures_total: u64,
    pub notifications_sent_total: u64,
    pub notifications_failed_total: u64,
}

/// Helper for timing CRM requests.
pub struct HttpTimer {
    start: Instant,
    metrics: Metrics,
}

impl HttpTimer {
    /// Start timing a CRM request.
    pub fn new(metrics: Metrics) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    /// Complete the timing and record the duration.
    pub fn complete(self) {
        let duration = self.start.elapsed();
        self.metrics.record_crm_request(duration);
    }

    /// Complete the timing and record as an error.
    pub fn complete_with_error(self) {
        let duration = self.start.elapsed();
        self.metrics.record_crm_request(duration);
        self.metrics.record_crm_error();
    }
}
