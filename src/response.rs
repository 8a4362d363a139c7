//! HTTP response value object.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// An HTTP response.
///
/// A call either yields a fully populated response or an
/// [`Error`](crate::error::Error), never both. A 4xx/5xx status arrives
/// here, not as an error; use the status predicates to distinguish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code; 0 if a status was never obtained.
    pub status_code: u16,
    /// Response headers, flattened with last-value-wins on duplicates.
    pub headers: HashMap<String, String>,
    /// Response body; empty string if the response carried none.
    pub body: String,
    /// Wall-clock time for the whole call, including retries. Stamped by
    /// the client, not the transport.
    pub elapsed: Duration,
    /// Optional error message attached by a transport implementation.
    pub error_message: Option<String>,
}

impl HttpResponse {
    /// Creates a response from status, headers and body.
    pub fn new(status_code: u16, headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers,
            body: body.into(),
            elapsed: Duration::ZERO,
            error_message: None,
        }
    }

    /// True iff the status is in `[200, 300)` and no error message is set.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code) && self.error_message.is_none()
    }

    /// True iff the status is in `[400, 500)`.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// True iff the status is in `[500, 600)`.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Returns a header value by name, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
