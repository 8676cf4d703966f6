//! Shared HTTP plumbing: client construction with the configured timeout and
//! JSON defaults, and mapping of failure responses into [`Error::Http`].

use crate::{
    config::ClientConfig,
    error::{Error, Result},
};
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

pub(crate) fn client(config: &ClientConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .default_headers(headers)
        .build()
        .map_err(|err| Error::Config(format!("Failed to initialize HTTP client: {err}")))
}

/// Reads a failure response into an error carrying its status and message.
pub(crate) async fn failure(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    http_error(status, &body)
}

pub(crate) fn http_error(status: StatusCode, body: &str) -> Error {
    Error::Http {
        status: status.as_u16(),
        message: error_message(body),
    }
}

/// Prefers the service's own `detail`/`error`/`message` text over the raw body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["detail", "error", "message"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .map_or_else(|| sanitize_body(body), |message| sanitize_body(&message))
}

/// Trims and truncates a body for user-facing messages.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
