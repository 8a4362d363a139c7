//! HTTP request value object and method enum.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP method.
///
/// The full enum covers every common method, but only GET, POST, PUT,
/// DELETE and PATCH are in the supported execution set; executing a request
/// with any other method fails with
/// [`Error::UnsupportedMethod`](crate::error::Error::UnsupportedMethod)
/// before a network call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request; carries no body.
    Get,
    /// POST request; may carry a JSON body.
    Post,
    /// PUT request; may carry a JSON body.
    Put,
    /// DELETE request; carries no body.
    Delete,
    /// PATCH request; may carry a JSON body.
    Patch,
    /// HEAD request (outside the supported execution set).
    Head,
    /// OPTIONS request (outside the supported execution set).
    Options,
}

impl HttpMethod {
    /// Whether this method is in the supported execution set.
    #[must_use]
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::Get | Self::Post | Self::Put | Self::Delete | Self::Patch
        )
    }

    /// Whether a request body is attached for this method.
    ///
    /// GET and DELETE never carry a body even if one is set on the request.
    #[must_use]
    pub fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// The canonical uppercase method name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request.
///
/// Built via [`HttpRequestBuilder`]; treated as an immutable value once
/// passed to an execute path. The URL may be empty while building but must
/// be non-empty at execute time.
///
/// # Example
///
/// ```rust
/// use http_manager::request::{HttpMethod, HttpRequest};
///
/// let request = HttpRequest::builder()
///     .url("https://example.test/items")
///     .method(HttpMethod::Post)
///     .header("X-Trace-Id", "abc123")
///     .body(r#"{"name":"widget"}"#)
///     .build();
/// assert_eq!(request.method, HttpMethod::Post);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL. Required, non-empty at execute time.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Request headers. Keys are kept as given; insertion order is
    /// irrelevant.
    pub headers: HashMap<String, String>,
    /// Optional request body, passed through as an opaque string.
    pub body: Option<String>,
    /// Per-request timeout, overriding the configured read timeout.
    pub timeout: Duration,
    /// Whether redirects should be followed. Carried on the value; the
    /// pooled client applies its configured policy client-wide.
    pub follow_redirects: bool,
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            body: None,
            timeout: Duration::from_millis(30_000),
            follow_redirects: true,
        }
    }
}

impl HttpRequest {
    /// Creates a new request builder.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Convenience constructor for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug, Clone, Default)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.request.url = url.into();
        self
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.request.method = method;
        self
    }

    /// Adds a single header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(key.into(), value.into());
        self
    }

    /// Adds multiple headers, overwriting existing keys.
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.request.headers.extend(headers);
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    /// Sets whether redirects should be followed.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.request.follow_redirects = follow;
        self
    }

    /// Builds the immutable request value.
    pub fn build(self) -> HttpRequest {
        self.request
    }
}
