//! Financial data fetcher
//!
//! Issues GET requests against the provider with a bounded retry budget.
//! Every outcome is returned as a `ToolResult`; failures are data, not `Err`.
//!
//! Only transient emptiness (empty body, falsy JSON) is retried. A 403, any
//! other HTTP error status, a transport failure, unparseable JSON and a
//! provider-reported "Error Message" all end the call on the spot.

pub mod retry;

pub use retry::RetryPolicy;

use crate::config::FmpConfig;
use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError, API_USER_AGENT};
use crate::models::ToolResult;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Query parameters in the order they are sent
pub type QueryParams = Vec<(String, String)>;

/// Classification of a single HTTP try
#[derive(Debug, Clone, PartialEq)]
pub enum FetchAttempt {
    Success(Value),
    EmptyBody,
    EmptyJson,
    Malformed,
    ProviderError(String),
    Forbidden,
    HttpStatus { code: u16, reason: String },
    Network(String),
}

impl FetchAttempt {
    pub fn classify(outcome: Result<HttpResponse, TransportError>) -> Self {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => return FetchAttempt::Network(e.to_string()),
        };

        if response.status == 403 {
            return FetchAttempt::Forbidden;
        }
        if !response.is_success() {
            return FetchAttempt::HttpStatus {
                code: response.status,
                reason: response.reason,
            };
        }
        if response.body.is_empty() {
            return FetchAttempt::EmptyBody;
        }

        let parsed: Value = match serde_json::from_str(&response.body) {
            Ok(value) => value,
            Err(_) => return FetchAttempt::Malformed,
        };

        if is_falsy(&parsed) {
            return FetchAttempt::EmptyJson;
        }

        if let Some(message) = parsed.get("Error Message") {
            let message = match message {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return FetchAttempt::ProviderError(message);
        }

        FetchAttempt::Success(parsed)
    }

    /// Worth another try if attempts remain
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchAttempt::EmptyBody | FetchAttempt::EmptyJson)
    }

    /// Human-readable reason for anything but success
    pub fn reason(&self) -> String {
        match self {
            FetchAttempt::Success(_) => String::new(),
            FetchAttempt::EmptyBody => "No data returned from API".to_string(),
            FetchAttempt::EmptyJson => "Empty response from API".to_string(),
            FetchAttempt::Malformed => "Invalid JSON response from API".to_string(),
            FetchAttempt::ProviderError(message) => message.clone(),
            FetchAttempt::Forbidden => {
                "API access forbidden. Please check your API key.".to_string()
            }
            FetchAttempt::HttpStatus { code, reason } => format!("HTTP Error {}: {}", code, reason),
            FetchAttempt::Network(reason) => format!("URL Error: {}", reason),
        }
    }
}

/// JSON values the provider uses to say "nothing here"
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Provider client with retry
pub struct DataFetcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
    policy: RetryPolicy,
}

impl DataFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &FmpConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            policy: RetryPolicy::new(config.max_attempts, config.retry_delay),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch `endpoint` using the configured retry policy
    pub async fn fetch(&self, endpoint: &str, params: QueryParams) -> ToolResult {
        self.fetch_with(endpoint, params, self.policy).await
    }

    /// Fetch `endpoint` with an explicit retry policy
    pub async fn fetch_with(
        &self,
        endpoint: &str,
        mut params: QueryParams,
        policy: RetryPolicy,
    ) -> ToolResult {
        params.push(("apikey".to_string(), self.api_key.clone()));

        let url = match Url::parse_with_params(&format!("{}/{}", self.base_url, endpoint), &params) {
            Ok(url) => url,
            Err(e) => {
                error!(endpoint, error = %e, "Could not build provider URL");
                return ToolResult::error(format!("Invalid request URL: {}", e));
            }
        };
        let request = HttpRequest::get(url.as_str(), API_USER_AGENT);

        let max_attempts = policy.max_attempts();
        for attempt in 1..=max_attempts {
            debug!(endpoint, attempt, max_attempts, "Requesting provider data");

            let outcome = FetchAttempt::classify(self.transport.get(&request).await);

            match outcome {
                FetchAttempt::Success(value) => return ToolResult::Data(value),
                ref transient if transient.is_transient() => {
                    warn!(endpoint, attempt, reason = %transient.reason(), "Transient empty response");
                    if policy.allows_retry_after(attempt) {
                        policy.pause().await;
                    }
                }
                FetchAttempt::Forbidden => {
                    error!(endpoint, "HTTP Error 403: API access forbidden");
                    return ToolResult::error(FetchAttempt::Forbidden.reason());
                }
                terminal => {
                    error!(endpoint, attempt, reason = %terminal.reason(), "Provider request failed");
                    return ToolResult::error(terminal.reason());
                }
            }
        }

        warn!(endpoint, max_attempts, "No valid data after exhausting attempts");
        ToolResult::error(format!("No valid data after {} attempts", max_attempts))
    }
}
