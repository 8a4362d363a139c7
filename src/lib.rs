//! # http-manager
//!
//! A convenience layer over [`reqwest`], offering a single entry point for
//! issuing GET/POST/PUT/DELETE requests with default headers, timeouts,
//! and a capped fixed-delay retry loop.
//!
//! # Features
//!
//! - **One execute path**: every convenience method funnels through the
//!   same merge → retry → transport pipeline
//! - **Default headers**: process-wide headers merged into every request,
//!   with caller-supplied headers winning on collision
//! - **Bounded retry**: total-attempt budget with a fixed inter-attempt
//!   delay, cancellable at any suspension point
//! - **Two signaling channels**: HTTP 4xx/5xx arrive as a
//!   [`HttpResponse`]; failing to complete a request at all is an
//!   [`Error`]
//! - **Observability**: structured `tracing` events and spans across the
//!   request path
//!
//! # Example
//!
//! ```rust,no_run
//! use http_manager::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let manager = HttpManager::new(HttpConfig::default())?;
//!
//! let response = manager
//!     .post("https://example.test/items", r#"{"name":"widget"}"#)
//!     .await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Practical global suppressions:
// - module_name_repetitions: HttpRequest in `request`, HttpResponse in
//   `response` and friends are the natural names
// - missing_errors_doc / missing_panics_doc: not every Result-returning
//   function needs a section
// - must_use_candidate: not all return values need #[must_use]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

// Re-exports of core types for convenience
pub use client::HttpClient;
pub use config::{HttpConfig, HttpConfigBuilder, RetryPolicy};
pub use error::{ContextExt, Error, Result};
pub use manager::HttpManager;
pub use request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use response::HttpResponse;
pub use retry::RetryExecutor;
pub use transport::{HttpTransport, ReqwestTransport};
// Re-export CancellationToken for convenient access
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports.
///
/// ```rust
/// use http_manager::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{HttpConfig, HttpConfigBuilder, RetryPolicy};
    pub use crate::error::{ContextExt, Error, Result};
    pub use crate::logging::{LogConfig, LogFormat, LogLevel, init_logging, try_init_logging};
    pub use crate::manager::HttpManager;
    pub use crate::request::{HttpMethod, HttpRequest, HttpRequestBuilder};
    pub use crate::response::HttpResponse;
    pub use crate::retry::RetryExecutor;
    pub use crate::transport::{HttpTransport, ReqwestTransport};
    pub use tokio_util::sync::CancellationToken;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
