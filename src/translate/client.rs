use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::UpstreamError;
use super::interface::{TranslationBackend, TranslationRequest, UpstreamTranslation};

const MAX_DIAGNOSTIC_BODY: usize = 500;

#[derive(Debug, Deserialize)]
struct LibreTranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
    /// Object, batch array or bare string depending on the upstream
    #[serde(rename = "detectedLanguage", default)]
    detected_language: Option<Value>,
}

/// Best-effort language code from whatever shape `detectedLanguage` has.
fn detected_language_code(value: &Value) -> Option<String> {
    match value {
        Value::String(code) if !code.is_empty() => Some(code.clone()),
        Value::Object(map) => map
            .get("language")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => items.first().and_then(detected_language_code),
        _ => None,
    }
}

/// Client for a LibreTranslate-compatible HTTP service
#[derive(Debug, Clone)]
pub struct LibreTranslateClient {
    client: Client,
    name: String,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl LibreTranslateClient {
    pub fn new(client: Client, service: &ServiceConfig, timeout: Duration) -> Self {
        Self {
            client,
            name: service.identity(),
            base_url: service.normalized_url(),
            api_key: service.api_key.clone().filter(|k| !k.is_empty()),
            timeout,
        }
    }

    fn request_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                service: self.name.clone(),
                timeout_secs: self.timeout.as_secs_f64(),
            }
        } else {
            UpstreamError::Transport {
                service: self.name.clone(),
                message: err.to_string(),
            }
        }
    }

    /// Read the body of a 200 response, or turn anything else into a diagnostic.
    async fn read_success(&self, response: reqwest::Response) -> Result<Vec<u8>, UpstreamError> {
        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: self.name.clone(),
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_DIAGNOSTIC_BODY),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| self.request_error(e))
    }

    fn invalid(&self, err: serde_json::Error) -> UpstreamError {
        UpstreamError::InvalidResponse {
            service: self.name.clone(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<UpstreamTranslation, UpstreamError> {
        let url = format!("{}/translate", self.base_url);

        let mut form = vec![
            ("q", request.text.as_str()),
            ("source", request.source_language.as_str()),
            ("target", request.target_language.as_str()),
            ("format", "text"),
        ];
        if let Some(api_key) = &self.api_key {
            form.push(("api_key", api_key.as_str()));
        }

        debug!("POST {} ({} -> {})", url, request.source_language, request.target_language);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let body = self.read_success(response).await?;
        let parsed: LibreTranslateResponse =
            serde_json::from_slice(&body).map_err(|e| self.invalid(e))?;

        Ok(UpstreamTranslation {
            translated_text: parsed.translated_text,
            detected_language: parsed
                .detected_language
                .as_ref()
                .and_then(detected_language_code),
        })
    }

    async fn languages(&self) -> Result<Value, UpstreamError> {
        let url = format!("{}/languages", self.base_url);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let body = self.read_success(response).await?;
        serde_json::from_slice(&body).map_err(|e| self.invalid(e))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
