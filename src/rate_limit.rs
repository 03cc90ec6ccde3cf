//! Per-client request gate
//!
//! Fixed-window counters keyed by client address. The gate keeps nothing
//! but a counter and a window start per key; windows past their expiry are
//! dropped lazily.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::ProxyError;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Result of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed { limit: u32, remaining: u32 },
    Denied { limit: u32, retry_after: Duration },
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Admission control keyed by client identity
pub trait RequestGate: Send + Sync {
    /// Count one request for `key` and decide whether it may proceed
    fn check(&self, key: &str) -> Decision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter: at most `max_requests` per key per `window`
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    windows: HashMap<String, Window>,
    last_purge: Instant,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                last_purge: Instant::now(),
            }),
        }
    }

    /// [`RequestGate::check`] against an explicit clock reading
    pub fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now.saturating_duration_since(state.last_purge) >= self.window {
            let window = self.window;
            state
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
            state.last_purge = now;
        }

        let entry = state.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let elapsed = now.saturating_duration_since(entry.started);
            return Decision::Denied {
                limit: self.max_requests,
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        Decision::Allowed {
            limit: self.max_requests,
            remaining: self.max_requests - entry.count,
        }
    }

    /// Number of client keys currently tracked
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }
}

impl RequestGate for FixedWindowLimiter {
    fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }
}

/// Axum middleware rejecting clients over quota before any other handling
pub async fn enforce(
    State(gate): State<Arc<dyn RequestGate>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();

    match gate.check(&key) {
        Decision::Allowed { limit, remaining } => {
            debug!(client = %key, remaining, "Request admitted");
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Decision::Denied { limit, retry_after } => {
            warn!(client = %key, "Rate limit exceeded");
            let mut response =
                ProxyError::rate_limited(format!("client {key} exceeded {limit} requests"))
                    .into_response();
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u32));
            headers.insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
            response
        }
    }
}
