//! Shared blocking HTTP plumbing.

use std::time::Duration;

/// Error type for provider calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Could not build the HTTP client
    Client(String),
    /// Network error (connect, timeout, TLS)
    Network(String),
    /// Non-2xx status with response body
    Http(u16, String),
    /// Body is not the expected JSON
    Parse(String),
    /// Well-formed response that reports failure or lacks required data
    Invalid(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Client(msg) => write!(f, "HTTP client error: {}", msg),
            ProviderError::Network(msg) => write!(f, "Network error: {}", msg),
            ProviderError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ProviderError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ProviderError::Invalid(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, ProviderError> {
    reqwest::blocking::Client::builder()
        .user_agent(format!("typecalc/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Client(e.to_string()))
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ProviderError> {
    let status = response.status().as_u16();
    if !response.status().is_success() {
        let body = response.text().unwrap_or_default();
        return Err(ProviderError::Http(status, body));
    }
    Ok(response)
}

pub(crate) fn get_json(
    http: &reqwest::blocking::Client,
    url: &str,
) -> Result<serde_json::Value, ProviderError> {
    let response = http
        .get(url)
        .send()
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    check_status(response)?
        .json()
        .map_err(|e| ProviderError::Parse(e.to_string()))
}

pub(crate) fn post_json(
    http: &reqwest::blocking::Client,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value, ProviderError> {
    let response = http
        .post(url)
        .json(body)
        .send()
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    check_status(response)?
        .json()
        .map_err(|e| ProviderError::Parse(e.to_string()))
}
