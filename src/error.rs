//! Error handling for the HTTP manager.
//!
//! A single strongly-typed [`Error`] enum covers every failure mode of the
//! request path. Design points:
//!
//! 1. **Two signaling channels**: an HTTP 4xx/5xx status is *not* an error;
//!    it arrives as a fully populated [`HttpResponse`](crate::HttpResponse).
//!    An `Error` means the request could not be completed at all.
//! 2. **API stability**: the enum is `#[non_exhaustive]` and never exposes
//!    `reqwest` types.
//! 3. **Retryability**: [`Error::is_retryable`] drives the retry executor;
//!    only transient transport failures (network, timeout) qualify.
//! 4. **Context chain**: [`ContextExt`] attaches operation context without
//!    losing the source chain.
//!
//! String fields use `Cow<'static, str>` so static messages allocate nothing.

use std::borrow::Cow;
use std::error::Error as StdError;

use thiserror::Error;

use crate::request::HttpMethod;

/// Result type alias for all HTTP manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length for error messages to prevent memory bloat from large
/// transport error strings.
const MAX_ERROR_MESSAGE_LEN: usize = 1024;

/// Truncates a message to [`MAX_ERROR_MESSAGE_LEN`], marking the cut.
fn truncate_message(mut msg: String) -> String {
    if msg.len() > MAX_ERROR_MESSAGE_LEN {
        msg.truncate(MAX_ERROR_MESSAGE_LEN);
        msg.push_str("... (truncated)");
    }
    msg
}

/// The error type for all request failures.
///
/// # Example
///
/// ```rust
/// use http_manager::error::Error;
///
/// let err = Error::network("Connection refused");
/// assert!(err.is_retryable());
/// assert!(err.to_string().contains("Connection refused"));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Connection or I/O failure at the transport layer.
    #[error("Network error: {0}")]
    Network(Cow<'static, str>),

    /// Connect or read timeout exceeded.
    #[error("Timeout: {0}")]
    Timeout(Cow<'static, str>),

    /// Method outside the supported execution set (programmer error, no
    /// network call is attempted).
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(HttpMethod),

    /// All allowed attempts failed; wraps the last underlying failure.
    #[error("Request failed after {attempts} attempt(s)")]
    RetryExhausted {
        /// Number of attempts that were made.
        attempts: u32,
        /// The failure of the final attempt.
        #[source]
        source: Box<Error>,
    },

    /// Operation aborted externally; never retried and never reported as
    /// [`Error::RetryExhausted`].
    #[error("Cancelled: {0}")]
    Cancelled(Cow<'static, str>),

    /// Invalid request parameters (empty URL, malformed header, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(Cow<'static, str>),

    /// The manager was closed; no further requests are accepted.
    #[error("HTTP manager is closed")]
    Closed,

    /// A configured global manager already exists; late configuration is
    /// rejected rather than silently ignored.
    #[error("Global HTTP manager is already initialized")]
    AlreadyInitialized,

    /// Error with additional context, preserving the error chain.
    #[error("{context}")]
    Context {
        /// Context message describing what operation failed.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a network error. Accepts both `&'static str` and `String`.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(Cow::Owned(truncate_message(msg.into())))
    }

    /// Creates a timeout error.
    pub fn timeout(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a cancellation error.
    pub fn cancelled(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Creates an invalid request error.
    pub fn invalid_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Wraps the final failure of a retry loop.
    pub fn retry_exhausted(attempts: u32, source: Error) -> Self {
        Self::RetryExhausted {
            attempts,
            source: Box::new(source),
        }
    }

    /// Attaches context to an existing error.
    ///
    /// ```rust
    /// use http_manager::error::Error;
    ///
    /// let err = Error::network("Connection refused")
    ///     .context("GET https://example.test/status");
    /// assert!(err.root_cause().is_retryable());
    /// ```
    #[must_use]
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Iterates the error chain, penetrating `Context` and `RetryExhausted`
    /// layers.
    fn iter_chain(&self) -> impl Iterator<Item = &Error> {
        std::iter::successors(Some(self), |err| match err {
            Error::Context { source, .. } | Error::RetryExhausted { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        })
    }

    /// Returns the root cause, skipping `Context` and `RetryExhausted`
    /// wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        self.iter_chain().last().unwrap_or(self)
    }

    /// Whether the retry executor may attempt this operation again.
    ///
    /// Only transient transport failures qualify: [`Error::Network`] and
    /// [`Error::Timeout`]. Cancellation and programmer errors never do.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) => true,
            Error::Context { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Whether this error is a cancellation (penetrates `Context` layers).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled(_) => true,
            Error::Context { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Number of attempts recorded by a `RetryExhausted` error, if any.
    #[must_use]
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::RetryExhausted { attempts, .. } => Some(*attempts),
            Error::Context { source, .. } => source.attempts(),
            _ => None,
        }
    }

    /// Generates a detailed report including the full cause chain.
    #[must_use]
    pub fn report(&self) -> String {
        use std::fmt::Write;
        let mut report = String::new();
        report.push_str(&self.to_string());

        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            let _ = write!(report, "\nCaused by: {err}");
            current = err.source();
        }
        report
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(Cow::Owned(truncate_message(e.to_string())))
        } else if e.is_connect() {
            Error::network(format!("Connection failed: {e}"))
        } else {
            Error::network(e.to_string())
        }
    }
}

/// Extension trait for attaching context to `Result` values.
///
/// ```rust
/// use http_manager::error::{ContextExt, Error, Result};
///
/// fn fetch() -> Result<()> {
///     Err(Error::network("refused"))
/// }
///
/// let err = fetch().context("fetching status page").unwrap_err();
/// assert!(err.to_string().contains("fetching status page"));
/// ```
pub trait ContextExt<T> {
    /// Attaches a static context message.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Attaches a lazily computed context message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ContextExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
