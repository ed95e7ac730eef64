// AI completion client
//
// POSTs the whole document as `{"input": ...}` and returns the `output`
// text. The endpoint sometimes answers with a JSON string that itself
// contains the response object, so string bodies are parsed a second time.

use serde::Serialize;
use std::time::Duration;

use crate::http::{build_client, post_json, ProviderError};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    input: &'a str,
}

/// AI endpoint client (blocking). Meant to be called from a background thread.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl AiClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `input` and return the non-empty `output` text
    pub fn complete(&self, input: &str) -> Result<String, ProviderError> {
        let body = serde_json::to_value(CompletionRequest { input })
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let json = post_json(&self.http, &self.endpoint, &body)?;
        parse_completion(json)
    }
}

fn parse_completion(json: serde_json::Value) -> Result<String, ProviderError> {
    let json = match json {
        serde_json::Value::String(inner) => {
            log::debug!("AI response is a JSON string; parsing the inner object");
            serde_json::from_str(&inner).map_err(|e| {
                log::warn!("Error in AI response: {}", e);
                ProviderError::Parse(format!("string-wrapped response: {}", e))
            })?
        }
        other => other,
    };

    let status_ok = match &json["status_code"] {
        serde_json::Value::Number(n) => n.as_u64() == Some(200),
        serde_json::Value::String(s) => s == "200",
        _ => false,
    };
    if !status_ok {
        log::warn!("Error in AI response: status_code {}", json["status_code"]);
        return Err(ProviderError::Invalid(format!(
            "status_code is {}",
            json["status_code"]
        )));
    }

    match json["output"].as_str() {
        Some(output) if !output.is_empty() => Ok(output.to_string()),
        _ => {
            log::info!("Assuming no response from AI: missing or empty output");
            Err(ProviderError::Invalid("missing or empty output".into()))
        }
    }
}
