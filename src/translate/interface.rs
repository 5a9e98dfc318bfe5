use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, UpstreamError};

pub const AUTO_DETECT: &str = "auto";

/// A validated translation request
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

impl TranslationRequest {
    /// Parse the inbound `{q, source?, target}` body.
    ///
    /// Bodies that are not JSON at all are processing errors; JSON that lacks
    /// `q` or `target` is a validation error.
    pub fn from_json(body: &[u8]) -> Result<Self, GatewayError> {
        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| GatewayError::RequestProcessing(format!("Invalid JSON body: {}", e)))?;

        let missing =
            || GatewayError::Validation("Missing \"q\" or \"target\" in request".to_string());

        let text = payload
            .get("q")
            .and_then(Value::as_str)
            .ok_or_else(missing)?;

        let target_language = payload
            .get("target")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(missing)?;

        let source_language = payload
            .get("source")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(AUTO_DETECT);

        Ok(Self {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        })
    }
}

/// What an upstream hands back for a successful translation
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamTranslation {
    pub translated_text: String,
    pub detected_language: Option<String>,
}

/// Gateway response body for `/translate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(rename = "service", skip_serializing_if = "Option::is_none")]
    pub service_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
}

/// One upstream translation service
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Identity used in responses and diagnostics
    fn name(&self) -> &str;

    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<UpstreamTranslation, UpstreamError>;

    /// Language list as returned by the upstream, unmodified
    async fn languages(&self) -> Result<Value, UpstreamError>;
}
