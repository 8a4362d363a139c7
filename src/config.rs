//! Configuration types for the HTTP manager.
//!
//! [`HttpConfig`] is consumed once at manager construction and is immutable
//! afterwards; build it with [`HttpConfigBuilder`] for a fluent API that
//! still produces an immutable final value.

use std::time::Duration;

/// Retry policy for HTTP requests.
///
/// `max_retries` denotes the *total* number of attempts, with a minimum of
/// one: a value of 0 still yields a single attempt. When `enabled` is
/// false, exactly one attempt is made regardless of `max_retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether failed attempts are retried at all.
    pub enabled: bool,
    /// Maximum number of attempts (total, minimum 1).
    pub max_retries: u32,
    /// Fixed delay between attempts. No jitter, no backoff.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub fn attempt_budget(&self) -> u32 {
        if self.enabled { self.max_retries.max(1) } else { 1 }
    }
}

/// HTTP client configuration.
///
/// # Example
///
/// ```rust
/// use http_manager::config::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::builder()
///     .connect_timeout(Duration::from_secs(5))
///     .read_timeout(Duration::from_secs(20))
///     .user_agent("my-service/2.1")
///     .max_retries(5)
///     .build();
/// assert_eq!(config.retry.max_retries, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// TCP connection timeout.
    pub connect_timeout: Duration,
    /// Response read timeout; overridable per request.
    pub read_timeout: Duration,
    /// Maximum total pooled connections. The underlying client enforces
    /// pooling per host, so `max_connections_per_route` is the operative
    /// limit; this field is kept for configuration-surface completeness.
    pub max_connections: usize,
    /// Maximum pooled connections per route/host.
    pub max_connections_per_route: usize,
    /// Whether the client follows redirects.
    pub follow_redirects: bool,
    /// Default User-Agent header value, applied when a request does not
    /// carry its own.
    pub user_agent: String,
    /// Retry policy for failed requests.
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            max_connections: 20,
            max_connections_per_route: 10,
            follow_redirects: true,
            user_agent: format!("http-manager/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
        }
    }
}

impl HttpConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::default()
    }
}

/// Builder for [`HttpConfig`].
#[derive(Debug, Clone, Default)]
pub struct HttpConfigBuilder {
    config: HttpConfig,
}

impl HttpConfigBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TCP connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the response read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Sets the maximum total pooled connections.
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Sets the maximum pooled connections per route.
    pub fn max_connections_per_route(mut self, max: usize) -> Self {
        self.config.max_connections_per_route = max;
        self
    }

    /// Enables or disables redirect following.
    pub fn follow_redirects(mut self, enabled: bool) -> Self {
        self.config.follow_redirects = enabled;
        self
    }

    /// Sets the default User-Agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enables or disables the retry mechanism.
    pub fn enable_retry(mut self, enabled: bool) -> Self {
        self.config.retry.enabled = enabled;
        self
    }

    /// Sets the total attempt budget (minimum 1).
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.retry.max_retries = max_retries;
        self
    }

    /// Sets the fixed delay between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry.delay = delay;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Builds the immutable configuration.
    pub fn build(self) -> HttpConfig {
        self.config
    }
}
