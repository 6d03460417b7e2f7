//! Hardened reqwest client with bounded retries.
//!
//! TLS 1.2 is the minimum protocol version and redirects are never
//! followed: a 3xx response is handed back to the caller as-is.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use actuator_core::config::HttpConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::HttpError;
use crate::redact::{redact_header_map, redact_pairs, truncate};
use crate::retry::{run_with_retry, RetryPolicy};

/// Characters of a failing response body kept in error text.
pub const ERROR_BODY_LIMIT: usize = 200;

/// Client-wide settings.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Duration::from_secs(30),
            user_agent: "actuator/1.0".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&HttpConfig> for HttpClientConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            pool_idle_timeout: Duration::from_secs(config.pool_idle_timeout_secs),
            user_agent: config.user_agent.clone(),
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.initial_backoff_ms),
            ),
            ..Self::default()
        }
    }
}

/// Request body variants.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Text(String),
    Form(Vec<(String, String)>),
}

/// One logical request. Retries resend it unchanged.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Per-request timeout overriding the client default.
    pub timeout: Option<Duration>,
    /// Per-request attempt budget overriding the client policy.
    pub max_attempts: Option<u32>,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            max_attempts: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

/// A fully read response with status below 400.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Lower-cased header names.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(&self.body).map_err(|e| {
            HttpError::Decode(format!("{} (body: {})", e, truncate(&self.body, ERROR_BODY_LIMIT)))
        })
    }
}

/// Outbound HTTP client shared by every handler.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_keepalive(config.tcp_keepalive)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Send `request`, retrying transient failures per the client policy.
    ///
    /// Responses with status >= 400 become [`HttpError::Status`].
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        request: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        let policy = match request.max_attempts {
            Some(attempts) => RetryPolicy::new(attempts, self.config.retry.initial_backoff),
            None => self.config.retry,
        };
        let label = format!("{} {}", request.method, request.url);
        run_with_retry(&policy, cancel, &label, |attempt| {
            self.send_once(&request, attempt)
        })
        .await
    }

    /// Convenience for a form-encoded POST through the same retry loop.
    pub async fn form_post(
        &self,
        cancel: &CancellationToken,
        url: &str,
        fields: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, HttpError> {
        let request = RequestConfig::post(url).headers(headers).form(fields);
        self.execute(cancel, request).await
    }

    async fn send_once(
        &self,
        request: &RequestConfig,
        attempt: u32,
    ) -> Result<HttpResponse, HttpError> {
        let mut builder = self.inner.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                if request.has_header(CONTENT_TYPE.as_str()) {
                    builder.body(value.to_string())
                } else {
                    builder.json(value)
                }
            }
            RequestBody::Text(text) => {
                if request.has_header(CONTENT_TYPE.as_str()) {
                    builder.body(text.clone())
                } else {
                    builder.header(CONTENT_TYPE, "text/plain").body(text.clone())
                }
            }
            RequestBody::Form(fields) => builder.form(fields),
        };
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(
            method = %request.method,
            url = %request.url,
            attempt,
            headers = ?redact_pairs(request.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
            "sending request"
        );

        let started = Instant::now();
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let redacted = redact_header_map(response.headers());
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        debug!(
            url = %request.url,
            status,
            attempt,
            duration_ms = started.elapsed().as_millis() as u64,
            headers = ?redacted,
            body_len = body.len(),
            "received response"
        );

        if status >= 400 {
            return Err(HttpError::Status {
                status,
                url: request.url.clone(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_client() -> HttpClient {
        HttpClient::new(HttpClientConfig {
            retry: RetryPolicy::new(3, Duration::from_millis(25)),
            ..HttpClientConfig::default()
        })
        .unwrap()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[test]
    fn test_config_from_http_section() {
        let section = HttpConfig {
            max_attempts: 5,
            initial_backoff_ms: 250,
            request_timeout_secs: 12,
            ..HttpConfig::default()
        };
        let config = HttpClientConfig::from(&section);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_request_builder() {
        let req = RequestConfig::get("https://api.example.com/x")
            .header("Accept", "application/json")
            .query("page", 2)
            .max_attempts(1);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query, vec![("page".to_string(), "2".to_string())]);
        assert!(req.has_header("accept"));
        assert_eq!(req.max_attempts, Some(1));
    }

    // =========================================================================
    // Live requests against a mock server
    // =========================================================================

    #[tokio::test]
    async fn test_get_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("days", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fast_client()
            .execute(
                &CancellationToken::new(),
                RequestConfig::get(format!("{}/forecast", server.uri())).query("days", 2),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        let parsed: serde_json::Value = response.json().unwrap();
        assert_eq!(parsed["ok"], true);
    }

    #[tokio::test]
    async fn test_server_error_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .with_priority(1)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
            .expect(1)
            .mount(&server)
            .await;

        let started = Instant::now();
        let response = fast_client()
            .execute(
                &CancellationToken::new(),
                RequestConfig::post(format!("{}/flaky", server.uri()))
                    .json(serde_json::json!({"a": 1})),
            )
            .await
            .unwrap();
        assert_eq!(response.body, "fine");
        // Two backoffs: 25ms then 50ms.
        assert!(started.elapsed() >= Duration::from_millis(75));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fast_client()
            .execute(
                &CancellationToken::new(),
                RequestConfig::get(format!("{}/missing", server.uri())),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(matches!(err, HttpError::Status { .. }));
    }

    #[tokio::test]
    async fn test_rate_limited_exhausts_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = fast_client()
            .execute(&CancellationToken::new(), RequestConfig::get(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Exhausted { attempts: 3, .. }));
        assert_eq!(err.status(), Some(429));
    }

    #[tokio::test]
    async fn test_single_attempt_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = fast_client()
            .execute(
                &CancellationToken::new(),
                RequestConfig::post(server.uri()).max_attempts(1),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_redirect_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/new"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let response = fast_client()
            .execute(
                &CancellationToken::new(),
                RequestConfig::get(format!("{}/old", server.uri())),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 302);
        assert!(response.is_redirect());
        assert_eq!(response.header("Location"), Some("/new"));
    }

    #[tokio::test]
    async fn test_text_body_and_form_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(header("content-type", "text/plain"))
            .and(body_string("hello"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = fast_client();
        let cancel = CancellationToken::new();
        client
            .execute(
                &cancel,
                RequestConfig::post(format!("{}/notify", server.uri())).text("hello"),
            )
            .await
            .unwrap();
        client
            .form_post(
                &cancel,
                &format!("{}/token", server.uri()),
                vec![("grant_type".into(), "password".into())],
                vec![],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_body_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("x".repeat(1000)))
            .mount(&server)
            .await;

        let err = fast_client()
            .execute(&CancellationToken::new(), RequestConfig::get(server.uri()))
            .await
            .unwrap_err();
        match err {
            HttpError::Status { body, .. } => assert_eq!(body.len(), ERROR_BODY_LIMIT + 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        let client = HttpClient::new(HttpClientConfig {
            retry: RetryPolicy::new(2, Duration::from_millis(5)),
            ..HttpClientConfig::default()
        })
        .unwrap();
        // Port 9 (discard) on localhost is essentially never listening.
        let err = client
            .execute(
                &CancellationToken::new(),
                RequestConfig::get("http://127.0.0.1:9/"),
            )
            .await
            .unwrap_err();
        match err {
            HttpError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.is_retryable());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(HttpClientConfig {
            retry: RetryPolicy::new(3, Duration::from_secs(30)),
            ..HttpClientConfig::default()
        })
        .unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let err = client
            .execute(&cancel, RequestConfig::get(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Cancelled));
    }
}
