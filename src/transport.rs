//! Transport adapter layer.
//!
//! [`HttpTransport`] is the seam between the retry/execute path and the
//! actual network: one request in, one response out, no retry logic of its
//! own. [`ReqwestTransport`] is the production implementation, wrapping a
//! pooled `reqwest::Client` that provides connection pooling, TLS and
//! redirect following.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect;
use tracing::{debug, error, instrument};

use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::request::{HttpMethod, HttpRequest};
use crate::response::HttpResponse;

/// Contract for sending one HTTP request.
///
/// Implementations translate a single [`HttpRequest`] into a single
/// outbound call and must not retry internally; the retry executor owns
/// that. The `elapsed` field of the returned response is left at zero;
/// the caller stamps it.
#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    /// Executes one attempt of the given request.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    user_agent: String,
}

impl ReqwestTransport {
    /// Builds the pooled client from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let redirect_policy = if config.follow_redirects {
            redirect::Policy::default()
        } else {
            redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_max_idle_per_host(config.max_connections_per_route)
            .redirect(redirect_policy)
            .gzip(true)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Converts request headers to a `HeaderMap`, seeding the default
    /// User-Agent only when the caller did not supply one.
    fn build_headers(&self, request: &HttpRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(request.headers.len() + 1);

        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::invalid_request(format!("Invalid header name {key:?}: {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                Error::invalid_request(format!("Invalid value for header {key:?}: {e}"))
            })?;
            headers.insert(name, value);
        }

        if !headers.contains_key(header::USER_AGENT) {
            let value = HeaderValue::from_str(&self.user_agent).map_err(|e| {
                Error::invalid_request(format!("Invalid configured user agent: {e}"))
            })?;
            headers.insert(header::USER_AGENT, value);
        }

        if request.method.allows_body()
            && request.body.is_some()
            && !headers.contains_key(header::CONTENT_TYPE)
        {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(
        name = "http_execute_once",
        skip(self, request),
        fields(method = %request.method, url = %request.url, has_body = request.body.is_some())
    )]
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let method = reqwest_method(request.method)?;
        let headers = self.build_headers(request)?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .timeout(request.timeout);

        if request.method.allows_body()
            && let Some(body) = &request.body
        {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "HTTP request send failed");
            Error::from(e)
        })?;

        let status = response.status().as_u16();

        // Flatten headers; last value wins on duplicate names.
        let mut flat_headers = HashMap::with_capacity(response.headers().len());
        for (name, value) in response.headers() {
            flat_headers.insert(
                name.as_str().to_string(),
                value.to_str().unwrap_or("").to_string(),
            );
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response body: {e}")))?;

        let body_preview: String = body.chars().take(200).collect();
        debug!(
            status,
            body_length = body.len(),
            body_preview = %body_preview,
            "HTTP response received"
        );

        Ok(HttpResponse {
            status_code: status,
            headers: flat_headers,
            body,
            elapsed: Duration::ZERO,
            error_message: None,
        })
    }
}

/// Maps a supported method onto the wire type; anything outside the
/// supported set is rejected before a network call is attempted.
fn reqwest_method(method: HttpMethod) -> Result<reqwest::Method> {
    match method {
        HttpMethod::Get => Ok(reqwest::Method::GET),
        HttpMethod::Post => Ok(reqwest::Method::POST),
        HttpMethod::Put => Ok(reqwest::Method::PUT),
        HttpMethod::Delete => Ok(reqwest::Method::DELETE),
        HttpMethod::Patch => Ok(reqwest::Method::PATCH),
        HttpMethod::Head | HttpMethod::Options => Err(Error::UnsupportedMethod(method)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let config = HttpConfig::default();
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn test_transport_creation_without_redirects() {
        let config = HttpConfig::builder().follow_redirects(false).build();
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_method_makes_no_call() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        // The host does not resolve; an attempted call would fail with a
        // network error, not UnsupportedMethod.
        let request = HttpRequest::builder()
            .url("http://host.invalid/ping")
            .method(HttpMethod::Head)
            .build();

        let err = transport.execute(&request).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod(HttpMethod::Head)));
    }

    #[tokio::test]
    async fn test_invalid_header_name_rejected() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        let request = HttpRequest::builder()
            .url("http://host.invalid/ping")
            .header("bad header name", "v")
            .build();

        let err = transport.execute(&request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_default_user_agent_only_when_absent() {
        let config = HttpConfig::builder().user_agent("ua-test/1.0").build();
        let transport = ReqwestTransport::new(&config).unwrap();

        let plain = HttpRequest::get("http://example.test");
        let headers = transport.build_headers(&plain).unwrap();
        assert_eq!(headers.get(header::USER_AGENT).unwrap(), "ua-test/1.0");

        let custom = HttpRequest::builder()
            .url("http://example.test")
            .header("User-Agent", "caller/2.0")
            .build();
        let headers = transport.build_headers(&custom).unwrap();
        assert_eq!(headers.get(header::USER_AGENT).unwrap(), "caller/2.0");
    }

    #[test]
    fn test_content_type_for_body_methods_only() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();

        let post = HttpRequest::builder()
            .url("http://example.test")
            .method(HttpMethod::Post)
            .body("{}")
            .build();
        let headers = transport.build_headers(&post).unwrap();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");

        let get = HttpRequest::builder()
            .url("http://example.test")
            .body("{}")
            .build();
        let headers = transport.build_headers(&get).unwrap();
        assert!(!headers.contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn test_caller_content_type_wins() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        let request = HttpRequest::builder()
            .url("http://example.test")
            .method(HttpMethod::Put)
            .header("Content-Type", "text/plain")
            .body("hello")
            .build();
        let headers = transport.build_headers(&request).unwrap();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }
}
