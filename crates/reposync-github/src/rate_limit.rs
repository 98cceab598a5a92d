//! Rate limiting and adaptive throttling for the GitHub REST API
//!
//! GitHub enforces a primary limit on all requests and a stricter secondary
//! limit on content-creating requests (file writes, repository creation).
//! This module keeps the client under both proactively and backs off when
//! the server signals a throttle anyway.
//!
//! ## Architecture
//!
//! - [`TokenBucket`]: Token bucket for one [`EndpointCategory`], with an
//!   effective capacity that halves on throttle and recovers on success
//! - [`AdaptiveRateLimiter`]: Owns one bucket per category and also honors
//!   server-imposed pauses (`Retry-After`, `x-ratelimit-reset`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reposync_github::rate_limit::{AdaptiveRateLimiter, EndpointCategory};
//!
//! # async fn example() {
//! let limiter = AdaptiveRateLimiter::with_defaults();
//! limiter.acquire(EndpointCategory::ContentWrite).await;
//! // ... make API call ...
//! limiter.on_success(EndpointCategory::ContentWrite);
//! # }
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reposync_core::config::RateLimitingConfig;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Longest server-requested pause that is honored as-is
const MAX_SERVER_PAUSE: Duration = Duration::from_secs(3600);

/// Consecutive successes needed before capacity grows again
const RECOVERY_INTERVAL: u64 = 50;

// ============================================================================
// EndpointCategory
// ============================================================================

/// Logical class of API request, each with its own budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    /// Any request (reads, lookups, listings)
    Core,
    /// Content-creating requests, subject to the secondary rate limit
    ContentWrite,
}

impl EndpointCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::ContentWrite => "contents-write",
        }
    }

    /// Buckets a request of this category draws from
    ///
    /// Content writes count against the primary limit as well.
    fn buckets(self) -> &'static [EndpointCategory] {
        match self {
            Self::Core => &[Self::Core],
            Self::ContentWrite => &[Self::ContentWrite, Self::Core],
        }
    }
}

impl Display for EndpointCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TokenBucket
// ============================================================================

/// Token bucket for a single endpoint category
///
/// Tokens refill continuously at `refill_rate` per second up to the
/// effective capacity. Not synchronized; [`AdaptiveRateLimiter`] guards all
/// buckets with one mutex.
#[derive(Debug)]
pub struct TokenBucket {
    original_capacity: u32,
    effective_capacity: u32,
    refill_rate: f64,
    tokens: f64,
    last_refill: Instant,
    success_count: u64,
    /// No token is handed out before this instant
    paused_until: Option<Instant>,
}

impl TokenBucket {
    /// Creates a full bucket
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of tokens
    /// * `refill_rate` - Tokens added per second
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            original_capacity: capacity,
            effective_capacity: capacity,
            refill_rate,
            tokens: f64::from(capacity),
            last_refill: Instant::now(),
            success_count: 0,
            paused_until: None,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens =
                (self.tokens + elapsed * self.refill_rate).min(f64::from(self.effective_capacity));
            self.last_refill = now;
        }
    }

    /// Takes one token, or returns how long to wait before one is available
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(until) = self.paused_until {
            if until > now {
                return Err(until - now);
            }
            self.paused_until = None;
        }

        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }

        if self.refill_rate > 0.0 {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate))
        } else {
            Err(MAX_SERVER_PAUSE)
        }
    }

    pub fn capacity(&self) -> u32 {
        self.original_capacity
    }

    pub fn effective_capacity(&self) -> u32 {
        self.effective_capacity
    }

    /// Records a successful call
    ///
    /// Every [`RECOVERY_INTERVAL`] consecutive successes the effective
    /// capacity grows by 5% (at least 1), up to the original capacity.
    pub fn on_success(&mut self) {
        self.success_count += 1;
        if self.success_count % RECOVERY_INTERVAL == 0
            && self.effective_capacity < self.original_capacity
        {
            let increase = ((f64::from(self.effective_capacity) * 0.05) as u32).max(1);
            let new_cap = (self.effective_capacity + increase).min(self.original_capacity);
            debug!(
                old_capacity = self.effective_capacity,
                new_capacity = new_cap,
                "Adaptive recovery: increasing bucket capacity"
            );
            self.effective_capacity = new_cap;
        }
    }

    /// Records a throttle response
    ///
    /// Halves the effective capacity (minimum 1), drains the bucket, resets
    /// the success streak and, if the server named a delay, pauses the
    /// bucket until it has passed.
    pub fn on_throttle(&mut self, now: Instant, retry_after: Option<Duration>) {
        let old = self.effective_capacity;
        self.effective_capacity = (self.effective_capacity / 2).max(1);
        self.tokens = 0.0;
        self.last_refill = now;
        self.success_count = 0;
        if let Some(delay) = retry_after {
            let until = now + delay.min(MAX_SERVER_PAUSE);
            self.paused_until = Some(self.paused_until.map_or(until, |p| p.max(until)));
        }
        warn!(
            old_capacity = old,
            new_capacity = self.effective_capacity,
            "Throttle detected: reducing bucket capacity by 50%"
        );
    }
}

// ============================================================================
// RateLimitConfig
// ============================================================================

/// Capacity and refill rate of one bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketConfig {
    pub capacity: u32,
    /// Tokens per second
    pub refill_rate: f64,
}

/// Configuration for the adaptive rate limiter
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub core: BucketConfig,
    pub content_write: BucketConfig,
}

impl RateLimitConfig {
    fn bucket(&self, category: EndpointCategory) -> BucketConfig {
        match category {
            EndpointCategory::Core => self.core,
            EndpointCategory::ContentWrite => self.content_write,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&RateLimitingConfig::default())
    }
}

impl From<&RateLimitingConfig> for RateLimitConfig {
    fn from(config: &RateLimitingConfig) -> Self {
        let writes_per_minute = config.content_writes_per_minute.max(1);
        Self {
            core: BucketConfig {
                capacity: config.burst.max(1),
                refill_rate: f64::from(config.requests_per_second.max(1)),
            },
            content_write: BucketConfig {
                capacity: config.burst.clamp(1, writes_per_minute),
                refill_rate: f64::from(writes_per_minute) / 60.0,
            },
        }
    }
}

// ============================================================================
// AdaptiveRateLimiter
// ============================================================================

/// Adaptive rate limiter managing one token bucket per endpoint category
///
/// Thread-safe and designed to be shared via `Arc<AdaptiveRateLimiter>`
/// between every client of a process, so that concurrent syncs draw from
/// the same budget.
pub struct AdaptiveRateLimiter {
    buckets: Mutex<HashMap<EndpointCategory, TokenBucket>>,
    config: RateLimitConfig,
}

impl fmt::Debug for AdaptiveRateLimiter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveRateLimiter")
            .field("config", &self.config)
            .finish()
    }
}

impl AdaptiveRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Creates a limiter with the default budget
    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EndpointCategory, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_bucket<R>(&self, category: EndpointCategory, f: impl FnOnce(&mut TokenBucket) -> R) -> R {
        let mut buckets = self.lock();
        let bucket = buckets.entry(category).or_insert_with(|| {
            let BucketConfig {
                capacity,
                refill_rate,
            } = self.config.bucket(category);
            debug!(%category, capacity, refill_rate, "Creating token bucket");
            TokenBucket::new(capacity, refill_rate)
        });
        f(bucket)
    }

    /// Waits until a request of `category` may be sent
    ///
    /// Yields to the runtime while waiting for refill or for a
    /// server-imposed pause to pass.
    pub async fn acquire(&self, category: EndpointCategory) {
        for &bucket in category.buckets() {
            loop {
                let now = Instant::now();
                match self.with_bucket(bucket, |b| b.try_acquire(now)) {
                    Ok(()) => break,
                    Err(wait) => {
                        let wait = wait.max(Duration::from_millis(10));
                        debug!(
                            category = %bucket,
                            wait_ms = wait.as_millis() as u64,
                            "No tokens available, waiting"
                        );
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }
    }

    /// Records a successful response for adaptive recovery
    pub fn on_success(&self, category: EndpointCategory) {
        for &bucket in category.buckets() {
            self.with_bucket(bucket, TokenBucket::on_success);
        }
    }

    /// Records a throttle response
    ///
    /// Only the category's own bucket shrinks; a named delay pauses it.
    pub fn on_throttle(&self, category: EndpointCategory, retry_after: Option<Duration>) {
        info!(
            %category,
            retry_after_ms = retry_after.map(|d| d.as_millis() as u64),
            "Recording throttle event"
        );
        let now = Instant::now();
        self.with_bucket(category, |b| b.on_throttle(now, retry_after));
    }

    /// Effective capacity of a category's bucket, if it has been used
    pub fn effective_capacity(&self, category: EndpointCategory) -> Option<u32> {
        self.lock().get(&category).map(TokenBucket::effective_capacity)
    }
}

// ============================================================================
// Header parsing helpers
// ============================================================================

/// Parses a `Retry-After` header value
///
/// Accepts delay-seconds (`"30"`) or an HTTP-date. Falls back to `default`
/// when the value is unparseable or the date is in the past or too far out.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let diff = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        if let Ok(diff) = diff.to_std() {
            if diff <= MAX_SERVER_PAUSE {
                return diff;
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}

/// Extracts the server-requested delay from a throttle response
///
/// Prefers `Retry-After`; otherwise, when `x-ratelimit-remaining` is `0`,
/// waits until the epoch second in `x-ratelimit-reset`.
pub fn retry_after_from_headers(headers: &HeaderMap, default: Duration) -> Option<Duration> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(value) = header("retry-after") {
        return Some(parse_retry_after(value, default));
    }

    if header("x-ratelimit-remaining").map(str::trim) == Some("0") {
        let reset = header("x-ratelimit-reset")?.trim().parse::<i64>().ok()?;
        let wait = (reset - chrono::Utc::now().timestamp()).max(1);
        let wait = Duration::from_secs(u64::try_from(wait).unwrap_or(1));
        return Some(wait.min(MAX_SERVER_PAUSE));
    }

    None
}
