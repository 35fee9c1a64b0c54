//! Per-IP fixed-window rate limiting for authentication endpoints.
//!
//! - Login: 5 attempts per 15 minutes per IP
//! - Registration: 3 attempts per 60 minutes per IP
//!
//! Counters live in process memory and reset on restart.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tokio::task::JoinHandle;

use crate::error::AppError;

/// Decides whether a client may make another attempt.
///
/// Handlers only see this trait, so the in-memory limiter can be replaced by
/// a shared one without touching call sites.
pub trait RateLimiter: Send + Sync {
    /// Record an attempt from `key` and report whether it is allowed.
    fn is_allowed(&self, key: IpAddr) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window counter keyed by client IP.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    entries: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter for login attempts: 5 per 15 minutes.
    #[must_use]
    pub fn login() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }

    /// Limiter for registrations: 3 per hour.
    #[must_use]
    pub fn register() -> Self {
        Self::new(3, Duration::from_secs(60 * 60))
    }

    /// Length of one window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Record an attempt at `now`.
    pub fn is_allowed_at(&self, key: IpAddr, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = entries.get_mut(&key) else {
            entries.insert(
                key,
                Window {
                    count: 1,
                    started: now,
                },
            );
            return true;
        };

        if now.saturating_duration_since(entry.started) > self.window {
            *entry = Window {
                count: 1,
                started: now,
            };
            return true;
        }

        if entry.count >= self.limit {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Drop entries whose window has fully elapsed. Returns how many were removed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.started) <= self.window);
        before - entries.len()
    }

    /// Number of tracked clients.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sweep expired entries once per window for the life of the process.
    pub fn spawn_sweeper(self: &Arc<Self>, name: &'static str) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = limiter.sweep_at(Instant::now());
                if removed > 0 {
                    tracing::debug!(limiter = name, removed, "Swept rate limit entries");
                }
            }
        })
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn is_allowed(&self, key: IpAddr) -> bool {
        self.is_allowed_at(key, Instant::now())
    }
}

// =============================================================================
// Client IP Extraction (Cloudflare + Fly.io)
// =============================================================================

/// Determine the client IP from proxy headers, falling back to the peer address.
///
/// Checks Cloudflare's `CF-Connecting-IP` first, then `X-Forwarded-For`
/// (first hop), `X-Real-IP`, and Fly.io's `Fly-Client-IP`.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip("cf-connecting-ip")
        .or_else(|| header_ip("x-forwarded-for"))
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| header_ip("fly-client-ip"))
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware that rejects requests once the client's window is exhausted.
///
/// # Errors
///
/// Returns `AppError::RateLimited` (429) when the limiter denies the attempt.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<dyn RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);

    if !limiter.is_allowed(ip) {
        tracing::warn!(client_ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
