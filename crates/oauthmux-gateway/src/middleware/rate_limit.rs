//! Fixed-window rate limiting middleware for OAuth endpoints.
//!
//! Rates are written as `<limit>-<period>` (`5-M` = 5 requests per minute).
//! Uses a DashMap to track request counts per client key; the map is owned
//! by a [`RateLimiter`] shared by every endpoint of one server, so counters
//! survive for as long as the routes do. Buckets whose window has ended are
//! swept every [`SWEEP_INTERVAL`] checks.
//!
//! `X-RateLimit-Reset` carries the Unix timestamp (seconds) at which the
//! current window ends.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use dashmap::DashMap;
use futures::future::BoxFuture;
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Key used when no client address can be determined
const UNKNOWN_CLIENT: &str = "unknown";

/// Number of checks between two sweeps of expired buckets
pub const SWEEP_INTERVAL: u64 = 1024;

/// Malformed rate string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateParseError {
    #[error("rate '{0}' must be formatted as <limit>-<period>")]
    InvalidFormat(String),

    #[error("rate '{0}' has an invalid limit")]
    InvalidLimit(String),

    #[error("rate '{0}' has an invalid period (expected S, M, H or D)")]
    InvalidPeriod(String),
}

/// Allowed requests per period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub limit: u64,
    pub period: Duration,
}

impl Rate {
    /// Rate used when the configured one cannot be parsed.
    ///
    /// Every request exceeds it.
    pub const ZERO: Rate = Rate {
        limit: 0,
        period: Duration::ZERO,
    };

    pub fn new(limit: u64, period: Duration) -> Self {
        Self { limit, period }
    }

    /// Parse a `<limit>-<period>` string
    pub fn parse(formatted: &str) -> Result<Self, RateParseError> {
        let trimmed = formatted.trim();
        let (limit, period) = trimmed
            .split_once('-')
            .ok_or_else(|| RateParseError::InvalidFormat(formatted.to_string()))?;

        let limit: u64 = limit
            .parse()
            .map_err(|_| RateParseError::InvalidLimit(formatted.to_string()))?;

        let period = match period.to_ascii_uppercase().as_str() {
            "S" => Duration::from_secs(1),
            "M" => Duration::from_secs(60),
            "H" => Duration::from_secs(60 * 60),
            "D" => Duration::from_secs(24 * 60 * 60),
            _ => return Err(RateParseError::InvalidPeriod(formatted.to_string())),
        };

        Ok(Self { limit, period })
    }
}

impl FromStr for Rate {
    type Err = RateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rate::parse(s)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}s", self.limit, self.period.as_secs())
    }
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub limit: u64,
    pub remaining: u64,
    /// Time until the current window resets
    pub reset: Duration,
    pub reached: bool,
}

impl RateLimitDecision {
    /// Unix timestamp at which the current window ends
    pub fn reset_at(&self) -> i64 {
        let reset = i64::try_from(self.reset.as_secs()).unwrap_or(i64::MAX);
        chrono::Utc::now().timestamp().saturating_add(reset)
    }

    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(HEADER_LIMIT, HeaderValue::from(self.limit));
        headers.insert(HEADER_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(HEADER_RESET, HeaderValue::from(self.reset_at()));
    }
}

/// Shared rate limiter state (clone-friendly via Arc).
#[derive(Debug)]
pub struct RateLimiter {
    rate: Rate,
    /// Map from client key → (window_start, request_count).
    buckets: DashMap<String, (Instant, u64)>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(rate: Rate) -> Self {
        Self {
            rate,
            buckets: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Count a request for `key` and report whether the limit is reached.
    ///
    /// The bucket entry stays locked while it is updated, so concurrent
    /// callers for the same key are serialized.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let decision = self.count(key);

        let checks = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if checks % SWEEP_INTERVAL == 0 {
            self.sweep_expired();
        }
        decision
    }

    fn count(&self, key: &str) -> RateLimitDecision {
        let mut entry = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| (Instant::now(), 0));
        let (window_start, count) = entry.value_mut();

        if window_start.elapsed() >= self.rate.period {
            // Reset window
            *window_start = Instant::now();
            *count = 0;
        }
        *count += 1;

        RateLimitDecision {
            limit: self.rate.limit,
            remaining: self.rate.limit.saturating_sub(*count),
            reset: self.rate.period.saturating_sub(window_start.elapsed()),
            reached: *count > self.rate.limit,
        }
    }

    /// Drop buckets whose window has ended and return how many were removed
    pub fn sweep_expired(&self) -> usize {
        let before = self.buckets.len();
        let period = self.rate.period;
        self.buckets
            .retain(|_, (window_start, _)| window_start.elapsed() < period);
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            debug!(removed, "[RateLimit] Swept expired buckets");
        }
        removed
    }

    /// Number of client keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

/// Tower [`Layer`](tower::Layer) that applies [`RateLimitService`].
#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
    key_header: Option<HeaderName>,
    trust_forward_headers: bool,
}

impl RateLimitLayer {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            key_header: None,
            trust_forward_headers: false,
        }
    }

    /// Key counters by this header before falling back to the client address
    pub fn with_key_header(mut self, header: Option<HeaderName>) -> Self {
        self.key_header = header;
        self
    }

    /// Key counters by `X-Forwarded-For` / `X-Real-IP` when present.
    ///
    /// Only enable behind a proxy that overwrites these headers.
    pub fn with_trust_forward_headers(mut self, trust: bool) -> Self {
        self.trust_forward_headers = trust;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

impl<S> tower::Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            limiter: self.limiter.clone(),
            key_header: self.key_header.clone(),
            trust_forward_headers: self.trust_forward_headers,
            inner,
        }
    }
}

/// Tower service that counts requests before forwarding them.
#[derive(Debug, Clone)]
pub struct RateLimitService<S> {
    limiter: Arc<RateLimiter>,
    key_header: Option<HeaderName>,
    trust_forward_headers: bool,
    inner: S,
}

impl<S> tower::Service<Request<Body>> for RateLimitService<S>
where
    S: tower::Service<Request<Body>, Response = Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let key = client_key(&req, self.key_header.as_ref(), self.trust_forward_headers);
        let decision = self.limiter.check(&key);

        if decision.reached {
            warn!(
                client = %key,
                path = %req.uri().path(),
                "[RateLimit] Limit of {} exceeded",
                self.limiter.rate()
            );
            return Box::pin(async move { Ok(too_many_requests(&decision)) });
        }

        let mut inner = self.inner.clone();
        // swap to ensure poll_ready state is preserved
        std::mem::swap(&mut self.inner, &mut inner);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            decision.write_headers(response.headers_mut());
            Ok(response)
        })
    }
}

fn too_many_requests(decision: &RateLimitDecision) -> Response<Body> {
    let mut response = Response::new(Body::from(
        "Rate limit exceeded. Please try again later.",
    ));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    decision.write_headers(response.headers_mut());
    response
}

/// Resolve the counter key for a request.
///
/// Order: configured header, first `X-Forwarded-For` hop and `X-Real-IP`
/// (only when forwarding headers are trusted), peer address.
fn client_key<B>(
    req: &Request<B>,
    key_header: Option<&HeaderName>,
    trust_forward_headers: bool,
) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(value) = key_header.and_then(|h| header(h.as_str())) {
        return value.to_string();
    }
    if trust_forward_headers {
        if let Some(first_hop) = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return first_hop.to_string();
        }
        if let Some(real_ip) = header("x-real-ip") {
            return real_ip.to_string();
        }
    }
    req.extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
