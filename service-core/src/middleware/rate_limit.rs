use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by client IP.
///
/// Each key holds a request count and the instant its window resets. A
/// request arriving past the reset instant starts a fresh window with
/// count 1; otherwise the count is incremented and compared against the
/// maximum. Rejected requests keep their increment, so hammering a
/// closed window never shortens the wait.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    entries: Arc<DashMap<IpAddr, WindowEntry>>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Count one request for `key`. Returns how long the caller should
    /// wait when the quota is exhausted.
    pub fn check(&self, key: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert(WindowEntry {
            count: 0,
            reset_at: now + self.window,
        });

        if now >= entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return Ok(());
        }

        entry.count += 1;
        if entry.count > self.max_requests {
            Err(entry.reset_at.saturating_duration_since(now))
        } else {
            Ok(())
        }
    }

    /// Drop entries whose window has already elapsed.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.reset_at > now);
    }

    /// Number of client addresses currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }

    /// Background task that sweeps expired entries every `period` so the
    /// map stays bounded by the number of clients active per window.
    pub fn spawn_sweeper(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.sweep();
            }
        })
    }
}

/// Middleware for IP-keyed rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<FixedWindowLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(&request) else {
        tracing::warn!("Could not determine IP for rate limiting");
        return Ok(next.run(request).await);
    };

    match limiter.check(ip) {
        Ok(()) => Ok(next.run(request).await),
        Err(wait) => Err(AppError::TooManyRequests(
            "Muitas requisições. Tente novamente em instantes.".to_string(),
            Some(wait.as_secs().max(1)),
        )),
    }
}

/// Client address as seen through proxies: first `X-Forwarded-For` hop,
/// falling back to the socket peer address.
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        request
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|axum::extract::ConnectInfo(addr)| addr.ip())
    })
}
