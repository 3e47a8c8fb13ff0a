//! HTTP client for the language-detection service.
//!
//! Talks to the service under a fixed `/api` base path using the synchronous
//! `ureq` HTTP client. Every endpoint answers with the same envelope:
//!
//! - `{"success": true, "data": {...}}`
//! - `{"success": false, "error": "..."}`
//!
//! The client unwraps the envelope and deserializes `data`. It never retries;
//! a failed call surfaces immediately. Requests go through the [`Transport`]
//! trait so the dashboard pipeline can run against an in-process fake.
pub mod types;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{DashboardError, Result};

use types::{DetectRequest, DetectionResult, HistoryPayload, Language, SelfTestReport, StatisticsSnapshot};

/// Fixed base path of every endpoint.
pub const API_BASE: &str = "/api";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A single request, independent of the HTTP library that sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute path including [`API_BASE`], e.g. `/api/statistics/`.
    pub path: String,
    /// Query parameters; values are encoded by the transport.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(endpoint: &str) -> Self {
        Self {
            method: Method::Get,
            path: format!("{API_BASE}{endpoint}"),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(endpoint: &str, body: &B) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| DashboardError::Validation(format!("could not encode request: {e}")))?;
        Ok(Self {
            method: Method::Post,
            path: format!("{API_BASE}{endpoint}"),
            query: Vec::new(),
            body: Some(body),
        })
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Look up a query parameter by name.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Query of one history page: page position plus active filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub page: u32,
    pub per_page: u32,
    pub language: Option<Language>,
    pub search: Option<String>,
}

impl HistoryQuery {
    /// Build the request. Absent filters are left out of the query string.
    pub fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::get("/detection-history/")
            .with_query("page", self.page)
            .with_query("per_page", self.per_page);
        if let Some(language) = self.language {
            request = request.with_query("language", language.as_str());
        }
        if let Some(search) = &self.search {
            request = request.with_query("search", search);
        }
        request
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends an [`ApiRequest`] and returns the body of a 2xx response.
///
/// Implementations map connection failures and non-2xx statuses to
/// [`DashboardError::Network`].
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<String>;
}

/// Production transport backed by `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    base_url: String,
    timeout: Option<Duration>,
}

impl UreqTransport {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Build a transport from the resolved `[api]` config. A zero timeout
    /// means none.
    pub fn from_config(config: &ApiConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.base_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<String> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut req = match request.method {
            Method::Get => ureq::get(&url),
            Method::Post => ureq::post(&url),
        };
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        for (key, value) in &request.query {
            req = req.query(key, value);
        }

        debug!(method = ?request.method, %url, "sending request");

        let result = match &request.body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };

        match result {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| DashboardError::Network(format!("failed to read response body: {e}"))),
            Err(ureq::Error::Status(code, _)) => {
                Err(DashboardError::Network(format!("HTTP {code} from {}", request.path)))
            }
            Err(e) => Err(DashboardError::Network(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Typed client over a [`Transport`].
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and unwrap the `{success, data, error}` envelope.
    pub fn fetch_json<D: DeserializeOwned>(&self, request: &ApiRequest) -> Result<D> {
        let body = self.transport.send(request)?;
        parse_envelope(&body)
    }

    /// `POST /api/detect-language/`.
    pub fn detect_language(&self, text: &str) -> Result<DetectionResult> {
        let request = ApiRequest::post("/detect-language/", &DetectRequest { text })?;
        self.fetch_json(&request)
    }

    /// `GET /api/detection-history/`.
    pub fn detection_history(&self, query: &HistoryQuery) -> Result<HistoryPayload> {
        self.fetch_json(&query.to_request())
    }

    /// `GET /api/statistics/`.
    pub fn statistics(&self) -> Result<StatisticsSnapshot> {
        self.fetch_json(&ApiRequest::get("/statistics/"))
    }

    /// `POST /api/test-detection/`: run the server's predefined cases.
    pub fn self_test(&self) -> Result<SelfTestReport> {
        let request = ApiRequest::post("/test-detection/", &serde_json::json!({}))?;
        self.fetch_json(&request)
    }
}

/// Unwrap a response envelope.
///
/// - body is not JSON → [`DashboardError::Network`]
/// - `success: false` → [`DashboardError::Application`] with the server text
/// - `data` missing or mis-shaped → [`DashboardError::DataShape`]
fn parse_envelope<D: DeserializeOwned>(body: &str) -> Result<D> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DashboardError::Network(format!("response is not JSON: {e}")))?;

    let Value::Object(mut envelope) = value else {
        return Err(DashboardError::DataShape("response is not a JSON object".to_string()));
    };

    let success = envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if !success {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| envelope.get(*key).and_then(Value::as_str))
            .unwrap_or("request failed")
            .to_string();
        return Err(DashboardError::Application(message));
    }

    let data = envelope
        .remove("data")
        .filter(|d| !d.is_null())
        .ok_or_else(|| DashboardError::DataShape("missing `data` in response".to_string()))?;

    serde_json::from_value(data).map_err(|e| DashboardError::DataShape(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
