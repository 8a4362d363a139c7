//! HTTP manager facade.
//!
//! One shared entry point over the client: process-wide default headers,
//! convenience methods for the common verbs, bearer-token API requests,
//! and lifecycle (`close`). The manager is an explicitly constructed,
//! dependency-injectable value; a process-wide handle is available through
//! [`HttpManager::global`] / [`HttpManager::init_global`] for callers that
//! want the one-instance convenience without hidden mutable state.
//!
//! # Example
//!
//! ```rust,no_run
//! use http_manager::{HttpConfig, HttpManager};
//!
//! # async fn example() -> http_manager::Result<()> {
//! let manager = HttpManager::new(HttpConfig::default())?;
//! manager.add_default_header("X-API-Key", "k1");
//!
//! let response = manager.get("https://example.test/items").await?;
//! if response.is_success() {
//!     println!("{}", response.body);
//! }
//! manager.close();
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::client::HttpClient;
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::request::{HttpMethod, HttpRequest};
use crate::response::HttpResponse;
use crate::transport::HttpTransport;

static GLOBAL: OnceLock<Arc<HttpManager>> = OnceLock::new();

/// Facade over the HTTP client with process-wide default headers.
///
/// All request methods funnel through one execute path that merges the
/// default headers into the request (caller-supplied headers win on key
/// collision) and delegates to the retrying client. The manager is
/// `Send + Sync`; concurrent requests and header mutations are safe to
/// interleave, and each request sees a consistent header snapshot.
#[derive(Debug)]
pub struct HttpManager {
    config: HttpConfig,
    client: HttpClient,
    default_headers: RwLock<HashMap<String, String>>,
    closed: AtomicBool,
}

impl HttpManager {
    /// Creates a manager with the production transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the pooled HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self> {
        info!(user_agent = %config.user_agent, "Initializing HTTP manager");
        let client = HttpClient::new(&config)?;
        Ok(Self::from_parts(config, client))
    }

    /// Creates a manager over a custom transport (test stubs, alternative
    /// backends).
    pub fn with_transport(config: HttpConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let client = HttpClient::with_transport(transport, config.retry);
        Self::from_parts(config, client)
    }

    fn from_parts(config: HttpConfig, client: HttpClient) -> Self {
        let default_headers = RwLock::new(initial_headers(&config));
        Self {
            config,
            client,
            default_headers,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the process-wide manager, creating it with the default
    /// configuration on first access.
    ///
    /// Concurrent first-time access is safe: exactly one instance wins and
    /// every caller receives it.
    ///
    /// # Errors
    ///
    /// Returns an error if first-time construction fails.
    pub fn global() -> Result<Arc<Self>> {
        if let Some(existing) = GLOBAL.get() {
            return Ok(Arc::clone(existing));
        }
        let manager = Arc::new(Self::new(HttpConfig::default())?);
        Ok(Arc::clone(GLOBAL.get_or_init(|| manager)))
    }

    /// Installs a configured process-wide manager, exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if a global manager already
    /// exists; late configuration is rejected, never silently ignored.
    pub fn init_global(config: HttpConfig) -> Result<Arc<Self>> {
        let manager = Arc::new(Self::new(config)?);
        match GLOBAL.set(Arc::clone(&manager)) {
            Ok(()) => Ok(manager),
            Err(_) => {
                warn!("Global HTTP manager already initialized; new configuration rejected");
                Err(Error::AlreadyInitialized)
            }
        }
    }

    /// Returns the configuration this manager was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    // ==================== Default headers ====================

    /// Adds a default header included in all subsequent requests.
    pub fn add_default_header(&self, key: impl Into<String>, value: impl Into<String>) {
        self.headers_mut().insert(key.into(), value.into());
    }

    /// Removes a default header, returning its previous value.
    pub fn remove_default_header(&self, key: &str) -> Option<String> {
        self.headers_mut().remove(key)
    }

    /// Clears all default headers and re-seeds the initial set
    /// (Content-Type, Accept, User-Agent).
    pub fn clear_default_headers(&self) {
        let mut headers = self.headers_mut();
        headers.clear();
        headers.extend(initial_headers(&self.config));
    }

    /// Returns a snapshot of the current default headers.
    pub fn default_headers(&self) -> HashMap<String, String> {
        self.headers().clone()
    }

    fn headers(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn headers_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Requests ====================

    /// Sends a GET request.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.request(url, HttpMethod::Get, None, None).await
    }

    /// Sends a GET request with additional headers.
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.request(url, HttpMethod::Get, None, Some(headers)).await
    }

    /// Sends a POST request with a JSON string body.
    pub async fn post(&self, url: &str, body: impl Into<String>) -> Result<HttpResponse> {
        self.request(url, HttpMethod::Post, Some(body.into()), None)
            .await
    }

    /// Sends a POST request with a JSON string body and additional headers.
    pub async fn post_with_headers(
        &self,
        url: &str,
        body: impl Into<String>,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.request(url, HttpMethod::Post, Some(body.into()), Some(headers))
            .await
    }

    /// Sends a POST request with a JSON value body.
    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        self.post(url, body.to_string()).await
    }

    /// Sends a POST request with a JSON value body and additional headers.
    pub async fn post_json_with_headers(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse> {
        self.post_with_headers(url, body.to_string(), headers).await
    }

    /// Sends a PUT request with a JSON string body.
    pub async fn put(&self, url: &str, body: impl Into<String>) -> Result<HttpResponse> {
        self.request(url, HttpMethod::Put, Some(body.into()), None)
            .await
    }

    /// Sends a PUT request with a JSON value body.
    pub async fn put_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        self.put(url, body.to_string()).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, url: &str) -> Result<HttpResponse> {
        self.request(url, HttpMethod::Delete, None, None).await
    }

    /// Executes a custom request, merging the default headers under the
    /// request's own.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.dispatch(request, None).await
    }

    /// Executes a custom request racing a cancellation token.
    pub async fn execute_with_cancellation(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        self.dispatch(request, Some(cancel)).await
    }

    /// Sends an API request, injecting `Authorization: Bearer <token>` when
    /// a non-empty token is supplied.
    #[instrument(name = "http_api_request", skip(self, body, auth_token), fields(method = %method, url = %url))]
    pub async fn send_api_request(
        &self,
        url: &str,
        method: HttpMethod,
        body: Option<String>,
        auth_token: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut builder = HttpRequest::builder().url(url).method(method);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(token) = auth_token
            && !token.is_empty()
        {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        self.dispatch(builder.build(), None).await
    }

    async fn request(
        &self,
        url: &str,
        method: HttpMethod,
        body: Option<String>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<HttpResponse> {
        debug!(%method, url, "Sending request");
        let mut builder = HttpRequest::builder().url(url).method(method);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }
        self.dispatch(builder.build(), None).await
    }

    /// The single funnel: closed check, default-header merge, delegate.
    async fn dispatch(
        &self,
        request: HttpRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let merged = self.merge_default_headers(request);
        match cancel {
            Some(token) => self.client.execute_with_cancellation(&merged, token).await,
            None => self.client.execute(&merged).await,
        }
    }

    /// Merges a snapshot of the default headers into the request;
    /// request headers win on key collision.
    fn merge_default_headers(&self, mut request: HttpRequest) -> HttpRequest {
        let mut headers = self.default_headers();
        headers.extend(std::mem::take(&mut request.headers));
        request.headers = headers;
        request
    }

    // ==================== Lifecycle ====================

    /// Closes the manager. Idempotent; any request issued afterwards fails
    /// with [`Error::Closed`]. Pooled connections are released when the
    /// manager is dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Closing HTTP manager");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Default headers applied to every outgoing request unless overridden.
fn initial_headers(config: &HttpConfig) -> HashMap<String, String> {
    HashMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
        ("User-Agent".to_string(), config.user_agent.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Stub transport that records the last request and returns 200.
    #[derive(Debug, Default)]
    struct RecordingTransport {
        last: Mutex<Option<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(HttpResponse {
                status_code: 200,
                ..HttpResponse::default()
            })
        }
    }

    fn manager_with_recorder() -> (HttpManager, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let manager = HttpManager::with_transport(
            HttpConfig::default(),
            transport.clone() as Arc<dyn HttpTransport>,
        );
        (manager, transport)
    }

    fn last_request(transport: &RecordingTransport) -> HttpRequest {
        transport.last.lock().unwrap().clone().expect("no request recorded")
    }

    #[test]
    fn test_initial_default_headers() {
        let (manager, _) = manager_with_recorder();
        let headers = manager.default_headers();
        assert_eq!(headers.get("Content-Type").map(String::as_str), Some("application/json"));
        assert_eq!(headers.get("Accept").map(String::as_str), Some("application/json"));
        assert_eq!(
            headers.get("User-Agent"),
            Some(&manager.config().user_agent)
        );
    }

    #[test]
    fn test_add_remove_clear_default_headers() {
        let (manager, _) = manager_with_recorder();

        manager.add_default_header("X-API-Key", "k1");
        assert_eq!(
            manager.default_headers().get("X-API-Key").map(String::as_str),
            Some("k1")
        );

        assert_eq!(manager.remove_default_header("X-API-Key"), Some("k1".to_string()));
        assert!(!manager.default_headers().contains_key("X-API-Key"));

        manager.add_default_header("X-Other", "v");
        manager.clear_default_headers();
        let headers = manager.default_headers();
        assert!(!headers.contains_key("X-Other"));
        // Re-seeded initial set.
        assert_eq!(headers.len(), 3);
        assert!(headers.contains_key("Content-Type"));
    }

    #[tokio::test]
    async fn test_default_headers_merged_into_request() {
        let (manager, transport) = manager_with_recorder();
        manager.add_default_header("X-API-Key", "k1");

        manager.get("https://example.test/items").await.unwrap();
        let sent = last_request(&transport);
        assert_eq!(sent.headers.get("X-API-Key").map(String::as_str), Some("k1"));
        assert_eq!(
            sent.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_per_call_headers_win_on_collision() {
        let (manager, transport) = manager_with_recorder();
        manager.add_default_header("X-API-Key", "default");

        let headers = HashMap::from([("X-API-Key".to_string(), "override".to_string())]);
        manager
            .get_with_headers("https://example.test", headers)
            .await
            .unwrap();

        let sent = last_request(&transport);
        assert_eq!(
            sent.headers.get("X-API-Key").map(String::as_str),
            Some("override")
        );
    }

    #[tokio::test]
    async fn test_execute_merges_defaults_under_request_headers() {
        let (manager, transport) = manager_with_recorder();

        let request = HttpRequest::builder()
            .url("https://example.test")
            .header("Accept", "text/html")
            .build();
        manager.execute(request).await.unwrap();

        let sent = last_request(&transport);
        assert_eq!(sent.headers.get("Accept").map(String::as_str), Some("text/html"));
        assert!(sent.headers.contains_key("Content-Type"));
    }

    #[tokio::test]
    async fn test_send_api_request_injects_bearer_token() {
        let (manager, transport) = manager_with_recorder();

        manager
            .send_api_request(
                "https://example.test/api",
                HttpMethod::Post,
                Some("{}".to_string()),
                Some("secret-token"),
            )
            .await
            .unwrap();

        let sent = last_request(&transport);
        assert_eq!(
            sent.headers.get("Authorization").map(String::as_str),
            Some("Bearer secret-token")
        );
    }

    #[tokio::test]
    async fn test_send_api_request_skips_empty_token() {
        let (manager, transport) = manager_with_recorder();

        manager
            .send_api_request("https://example.test/api", HttpMethod::Get, None, Some(""))
            .await
            .unwrap();
        assert!(!last_request(&transport).headers.contains_key("Authorization"));

        manager
            .send_api_request("https://example.test/api", HttpMethod::Get, None, None)
            .await
            .unwrap();
        assert!(!last_request(&transport).headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_rejects_requests() {
        let (manager, _) = manager_with_recorder();

        assert!(!manager.is_closed());
        manager.close();
        manager.close();
        assert!(manager.is_closed());

        let err = manager.get("https://example.test").await.unwrap_err();
        assert!(matches!(err, Error::Closed));
    }

    #[tokio::test]
    async fn test_post_json_serializes_value() {
        let (manager, transport) = manager_with_recorder();

        let body = serde_json::json!({"a": 1});
        manager
            .post_json("https://example.test/items", &body)
            .await
            .unwrap();

        let sent = last_request(&transport);
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.body.as_deref(), Some("{\"a\":1}"));
    }
}
