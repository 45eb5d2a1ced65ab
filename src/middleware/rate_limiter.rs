// Per-client sliding-window rate limiter
//
// One window per client, keyed by peer IP address. Each admission check
// prunes timestamps that fell out of the trailing window, then counts
// what remains; denied attempts are not recorded. Stale client entries
// are swept so memory stays bounded by recently-active clients.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::errors::DetectError;
use crate::core::types::AppState;

/// Admission decision for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

pub struct RateLimiter {
    clients: DashMap<IpAddr, Vec<Instant>>,
    max_requests: usize,
    window: Duration,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            max_requests: max_requests as usize,
            window,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Check whether a request from `client` may proceed.
    ///
    /// Prune-then-count-then-append runs under the client entry's shard
    /// lock, so concurrent requests from the same client cannot slip past
    /// the cap or lose an admission.
    pub fn check(&self, client: IpAddr) -> Admission {
        self.maybe_sweep();

        let now = Instant::now();
        let mut window = self.clients.entry(client).or_default();
        window.retain(|stamp| now.duration_since(*stamp) < self.window);

        if window.len() >= self.max_requests {
            return Admission::Denied;
        }

        window.push(now);
        Admission::Allowed
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Drop clients whose windows are empty after pruning, at most once
    /// per window length.
    fn maybe_sweep(&self) {
        {
            let mut last_sweep = self.last_sweep.lock();
            if last_sweep.elapsed() < self.window {
                return;
            }
            *last_sweep = Instant::now();
        }

        let now = Instant::now();
        let window = self.window;
        let before = self.clients.len();
        self.clients.retain(|_, stamps| {
            stamps.retain(|stamp| now.duration_since(*stamp) < window);
            !stamps.is_empty()
        });

        let dropped = before.saturating_sub(self.clients.len());
        if dropped > 0 {
            debug!(dropped, "swept stale rate-limit entries");
        }
    }
}

/// Admission middleware for the detection route.
///
/// Runs before the handler and short-circuits with 429 on denial, so no
/// downstream component sees a rate-limited request.
pub async fn admission_guard(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    match state.limiter.check(addr.ip()) {
        Admission::Allowed => next.run(request).await,
        Admission::Denied => {
            state.metrics.record_rate_limited();
            debug!(client = %addr.ip(), "admission denied");
            DetectError::RateLimited.into_response()
        }
    }
}
