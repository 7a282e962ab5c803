//! Per-client rate limiting on the lead endpoint.
//!
//! Each client address may send `max_requests` submissions in a burst; the
//! allowance refills evenly over the window. Clones share the same state.

use crate::error::AppError;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::Quota;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type KeyedLimiter = governor::RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

/// A keyed rate limiter for client addresses.
#[derive(Clone)]
pub struct RateLimiter {
    /// `None` when limiting is disabled.
    limiter: Option<Arc<KeyedLimiter>>,
    clock: DefaultClock,
    max_requests: u32,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    /// Allow `max_requests` per `window` for each key.
    ///
    /// A `max_requests` of zero, or an empty window, disables limiting.
    /// With `trust_forwarded_for` the first `X-Forwarded-For` entry is used
    /// as the client address; only enable it behind a proxy that sets it.
    pub fn new(max_requests: u32, window: Duration, trust_forwarded_for: bool) -> Self {
        let limiter = NonZeroU32::new(max_requests)
            .and_then(|burst| {
                Quota::with_period(window / max_requests).map(|q| q.allow_burst(burst))
            })
            .map(|quota| Arc::new(governor::RateLimiter::keyed(quota)));

        if limiter.is_none() {
            tracing::warn!("Rate limiting disabled");
        }

        Self {
            limiter,
            clock: DefaultClock::default(),
            max_requests,
            trust_forwarded_for,
        }
    }

    /// Count a request for `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateDecision {
        let Some(limiter) = &self.limiter else {
            return RateDecision::Allowed;
        };

        match limiter.check_key(&key.to_string()) {
            Ok(()) => RateDecision::Allowed,
            Err(not_until) => RateDecision::Limited {
                retry_after: not_until.wait_time_from(self.clock.now()),
            },
        }
    }

    /// Drop state for keys whose allowance has fully refilled.
    pub fn retain_recent(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
        }
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.limiter.as_ref().map_or(0, |l| l.len())
    }

    /// Check if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The address a request is attributed to.
    ///
    /// The socket peer address, or the first `X-Forwarded-For` entry when
    /// forwarded addresses are trusted.
    pub fn client_key(&self, request: &Request) -> String {
        if self.trust_forwarded_for {
            let forwarded = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());

            if let Some(addr) = forwarded {
                return addr.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("enabled", &self.limiter.is_some())
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("entries", &self.len())
            .finish()
    }
}

/// Middleware rejecting clients over their limit with `429`.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = limiter.client_key(&request);

    match limiter.check(&key) {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %key, "Rate limit exceeded");
            let mut response = AppError::RateLimited.into_response();
            let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::thread;

    fn request(forwarded_for: Option<&str>, peer: Option<[u8; 4]>) -> Request {
        let mut builder = axum::http::Request::builder();
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        if let Some(ip) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::from((ip, 4000))));
        }
        request
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60), false);

        for _ in 0..3 {
            assert_eq!(limiter.check("a"), RateDecision::Allowed);
        }
        match limiter.check("a") {
            RateDecision::Limited { retry_after } => {
                assert!(retry_after > Duration::ZERO);
                assert!(retry_after <= Duration::from_secs(20));
            }
            other => panic!("Expected Limited, got {:?}", other),
        }

        // Other keys are independent
        assert_eq!(limiter.check("b"), RateDecision::Allowed);
    }

    #[test]
    fn test_allowance_refills() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50), false);
        assert_eq!(limiter.check("a"), RateDecision::Allowed);
        assert!(matches!(limiter.check("a"), RateDecision::Limited { .. }));

        thread::sleep(Duration::from_millis(70));

        assert_eq!(limiter.check("a"), RateDecision::Allowed);
    }

    #[test]
    fn test_zero_disables_limit() {
        let limiter = RateLimiter::new(0, Duration::from_secs(60), false);
        for _ in 0..100 {
            assert_eq!(limiter.check("a"), RateDecision::Allowed);
        }
        assert!(limiter.is_empty());

        let limiter = RateLimiter::new(5, Duration::ZERO, false);
        assert_eq!(limiter.check("a"), RateDecision::Allowed);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_retain_recent() {
        let limiter = RateLimiter::new(5, Duration::from_millis(50), false);
        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.len(), 2);

        thread::sleep(Duration::from_millis(70));
        limiter.retain_recent();
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_clone_shares_state() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), false);
        let other = limiter.clone();
        limiter.check("a");
        assert!(matches!(other.check("a"), RateDecision::Limited { .. }));
    }

    #[test]
    fn test_client_key_uses_peer_by_default() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60), false);

        let req = request(Some("203.0.113.7"), Some([192, 0, 2, 1]));
        assert_eq!(limiter.client_key(&req), "192.0.2.1");

        let req = request(Some("203.0.113.7"), None);
        assert_eq!(limiter.client_key(&req), "unknown");
    }

    #[test]
    fn test_client_key_trusts_forwarded_for_when_enabled() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60), true);

        let req = request(Some("203.0.113.7, 10.0.0.1"), Some([192, 0, 2, 1]));
        assert_eq!(limiter.client_key(&req), "203.0.113.7");

        let req = request(None, Some([192, 0, 2, 1]));
        assert_eq!(limiter.client_key(&req), "192.0.2.1");
    }
}
