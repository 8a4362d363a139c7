//! HTTP client: the execute path tying validation, retry and transport
//! together.
//!
//! Layering mirrors the call flow: [`HttpClient::execute`] validates the
//! request, runs the [`RetryExecutor`] over the transport, and stamps the
//! elapsed wall-clock time (covering all attempts) on the response.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::{HttpConfig, RetryPolicy};
use crate::error::{Error, Result};
use crate::request::{HttpMethod, HttpRequest};
use crate::response::HttpResponse;
use crate::retry::RetryExecutor;
use crate::transport::{HttpTransport, ReqwestTransport};

/// HTTP client with retry support.
///
/// Owns a shared transport and a retry executor. Cloning is cheap; clones
/// share the transport's connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    retry: RetryExecutor,
}

impl HttpClient {
    /// Creates a client with the production transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying pooled client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(ReqwestTransport::new(config)?),
            retry: RetryExecutor::new(config.retry),
        })
    }

    /// Creates a client over a custom transport (test stubs, alternative
    /// backends).
    pub fn with_transport(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            retry: RetryExecutor::new(policy),
        }
    }

    /// Executes a request with retry, without external cancellation.
    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.execute_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Executes a request with retry, racing the given cancellation token.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for an empty URL (no attempt is made)
    /// - [`Error::UnsupportedMethod`] for methods outside the supported
    ///   set (no attempt is made)
    /// - [`Error::Cancelled`] if the token fires mid-flight or mid-delay
    /// - [`Error::RetryExhausted`] when every allowed attempt failed
    #[instrument(
        name = "http_execute",
        skip(self, request, cancel),
        fields(method = %request.method, url = %request.url)
    )]
    pub async fn execute_with_cancellation(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        validate(request)?;

        let started = Instant::now();
        let mut response = self
            .retry
            .execute(|| self.transport.execute(request), cancel)
            .await?;
        response.elapsed = started.elapsed();
        Ok(response)
    }

    /// Executes a GET request.
    pub async fn get(
        &self,
        url: &str,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse> {
        self.execute(&build_request(url, HttpMethod::Get, None, headers))
            .await
    }

    /// Executes a POST request.
    pub async fn post(
        &self,
        url: &str,
        body: Option<String>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse> {
        self.execute(&build_request(url, HttpMethod::Post, body, headers))
            .await
    }

    /// Executes a PUT request.
    pub async fn put(
        &self,
        url: &str,
        body: Option<String>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse> {
        self.execute(&build_request(url, HttpMethod::Put, body, headers))
            .await
    }

    /// Executes a DELETE request.
    pub async fn delete(
        &self,
        url: &str,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse> {
        self.execute(&build_request(url, HttpMethod::Delete, None, headers))
            .await
    }

    /// Returns the retry policy in effect.
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retry.policy()
    }
}

fn build_request(
    url: &str,
    method: HttpMethod,
    body: Option<String>,
    headers: Option<HashMap<String, String>>,
) -> HttpRequest {
    let mut builder = HttpRequest::builder().url(url).method(method);
    if let Some(headers) = headers {
        builder = builder.headers(headers);
    }
    if let Some(body) = body {
        builder = builder.body(body);
    }
    builder.build()
}

/// Rejects requests that must not reach the retry loop: these are
/// programmer errors and make zero attempts.
fn validate(request: &HttpRequest) -> Result<()> {
    if request.url.trim().is_empty() {
        return Err(Error::invalid_request("Request URL must not be empty"));
    }
    if !request.method.is_supported() {
        return Err(Error::UnsupportedMethod(request.method));
    }
    Ok(())
}
