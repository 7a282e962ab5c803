//! HTTP server for the contact form.
//!
//! Routes:
//! - `POST /api/brevo` (alias `POST /api/contact`): submit a lead
//! - `GET /health`: status and counters
//! - everything else: static files from `STATIC_DIR`, when it exists

pub mod handlers;
pub mod rate_limit;

pub use rate_limit::{RateDecision, RateLimiter};

use crate::config::Config;
use crate::metrics::Metrics;
use crate::services::{LeadService, LeadServiceImpl};
use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// How often idle rate-limit keys are dropped.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when the CRM is not configured; submissions then fail with 500.
    pub leads: Option<Arc<dyn LeadService>>,
    pub metrics: Metrics,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, leads: Option<Arc<dyn LeadService>>, metrics: Metrics) -> Self {
        let rate_limiter = RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
            config.trust_forwarded_for,
        );

        Self {
            config: Arc::new(config),
            leads,
            metrics,
            rate_limiter,
        }
    }

    /// Wire the lead service to Brevo. A missing API key is logged, not fatal.
    pub fn from_config(config: Config) -> Self {
        let metrics = Metrics::new();

        let leads = match LeadServiceImpl::from_config(&config, metrics.clone()) {
            Ok(service) => Some(Arc::new(service) as Arc<dyn LeadService>),
            Err(e) => {
                warn!(error = %e, "CRM not configured, lead submissions will fail");
                None
            }
        };

        Self::new(config, leads, metrics)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/brevo", post(handlers::submit_lead))
        .route("/api/contact", post(handlers::submit_lead))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit::rate_limit,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .merge(api);

    let static_dir = Path::new(&state.config.static_dir);
    if static_dir.is_dir() {
        info!(dir = %static_dir.display(), "Serving static files");
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.with_state(state).layer(TraceLayer::new_for_http())
}

/// Bind to the configured address and serve until Ctrl-C.
pub async fn run_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
