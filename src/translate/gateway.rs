use std::future::Future;
use std::sync::Arc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{GatewayError, UpstreamError};
use super::interface::{TranslationBackend, TranslationRequest, TranslationResult};

/// Sequential fallback over an ordered list of upstream backends.
///
/// Every call starts again from the first backend. Each backend is tried at
/// most once per call and the first success wins; when all of them fail the
/// diagnostic of the last attempt is reported.
#[derive(Clone)]
pub struct Gateway {
    backends: Vec<Arc<dyn TranslationBackend>>,
}

impl Gateway {
    pub fn new(backends: Vec<Arc<dyn TranslationBackend>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, GatewayError> {
        let (service, translation) = self
            .first_success("translate", |backend| async move {
                backend.translate(request).await
            })
            .await?;

        Ok(TranslationResult {
            translated_text: translation.translated_text,
            source_language: request.source_language.clone(),
            target_language: request.target_language.clone(),
            service_used: Some(service),
            detected_language: translation.detected_language,
        })
    }

    pub async fn list_languages(&self) -> Result<Value, GatewayError> {
        let (_, languages) = self
            .first_success("languages", |backend| async move { backend.languages().await })
            .await?;
        Ok(languages)
    }

    async fn first_success<'a, T, F, Fut>(
        &'a self,
        operation: &str,
        attempt: F,
    ) -> Result<(String, T), GatewayError>
    where
        F: Fn(&'a dyn TranslationBackend) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut last_error: Option<UpstreamError> = None;

        for (index, backend) in self.backends.iter().enumerate() {
            debug!(
                "{}: trying {} ({}/{})",
                operation,
                backend.name(),
                index + 1,
                self.backends.len()
            );

            match attempt(backend.as_ref()).await {
                Ok(value) => {
                    info!("{}: served by {}", operation, backend.name());
                    return Ok((backend.name().to_string(), value));
                }
                Err(e) => {
                    warn!("{}: {}", operation, e);
                    last_error = Some(e);
                }
            }
        }

        error!(
            "{}: all {} upstream services failed",
            operation,
            self.backends.len()
        );
        Err(GatewayError::AllServicesFailed {
            details: last_error.map(|e| e.to_string()),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::translate::interface::UpstreamTranslation;

    /// Backend with a fixed outcome that counts how often it is called.
    pub(crate) struct ScriptedBackend {
        name: String,
        outcome: Result<String, UpstreamError>,
        languages: Value,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub(crate) fn ok(name: &str, text: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                outcome: Ok(text.to_string()),
                languages: json!([{ "code": "en", "name": "English", "from": name }]),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing(name: &str, status: u16) -> Arc<Self> {
            Self::failing_with(UpstreamError::Status {
                service: name.to_string(),
                status,
                body: format!("{} is down", name),
            })
        }

        pub(crate) fn timing_out(name: &str) -> Arc<Self> {
            Self::failing_with(UpstreamError::Timeout {
                service: name.to_string(),
                timeout_secs: 10.0,
            })
        }

        pub(crate) fn garbled(name: &str) -> Arc<Self> {
            Self::failing_with(UpstreamError::InvalidResponse {
                service: name.to_string(),
                message: "expected value at line 1 column 1".to_string(),
            })
        }

        fn failing_with(error: UpstreamError) -> Arc<Self> {
            let name = match &error {
                UpstreamError::Status { service, .. }
                | UpstreamError::Timeout { service, .. }
                | UpstreamError::Transport { service, .. }
                | UpstreamError::InvalidResponse { service, .. } => service.clone(),
            };
            Arc::new(Self {
                name,
                outcome: Err(error),
                languages: Value::Null,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranslationBackend for ScriptedBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn translate(
            &self,
            _request: &TranslationRequest,
        ) -> Result<UpstreamTranslation, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(text) => Ok(UpstreamTranslation {
                    translated_text: text.clone(),
                    detected_language: None,
                }),
                Err(e) => Err(e.clone()),
            }
        }

        async fn languages(&self) -> Result<Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(_) => Ok(self.languages.clone()),
                Err(e) => Err(e.clone()),
            }
        }
    }

    pub(crate) fn gateway_of(backends: &[Arc<ScriptedBackend>]) -> Gateway {
        Gateway::new(
            backends
                .iter()
                .map(|b| b.clone() as Arc<dyn TranslationBackend>)
                .collect(),
        )
    }

    fn request() -> TranslationRequest {
        TranslationRequest {
            text: "hello".into(),
            source_language: "auto".into(),
            target_language: "es".into(),
        }
    }

    #[tokio::test]
    async fn test_first_success_stops_the_loop() {
        let first = ScriptedBackend::ok("first", "hola");
        let second = ScriptedBackend::ok("second", "buenas");
        let gateway = gateway_of(&[first.clone(), second.clone()]);

        let result = gateway.translate(&request()).await.unwrap();
        assert_eq!(result.translated_text, "hola");
        assert_eq!(result.service_used.as_deref(), Some("first"));
        assert_eq!(result.source_language, "auto");
        assert_eq!(result.target_language, "es");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_service() {
        let first = ScriptedBackend::failing("first", 500);
        let second = ScriptedBackend::ok("second", "hola");
        let third = ScriptedBackend::ok("third", "unused");
        let gateway = gateway_of(&[first.clone(), second.clone(), third.clone()]);

        let result = gateway.translate(&request()).await.unwrap();
        assert_eq!(result.translated_text, "hola");
        assert_eq!(result.service_used.as_deref(), Some("second"));
        assert_eq!(first.calls() + second.calls() + third.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_next_service() {
        let first = ScriptedBackend::timing_out("first");
        let second = ScriptedBackend::ok("second", "hola");
        let third = ScriptedBackend::ok("third", "unused");
        let gateway = gateway_of(&[first.clone(), second.clone(), third.clone()]);

        let result = gateway.translate(&request()).await.unwrap();
        assert_eq!(result.translated_text, "hola");
        assert_eq!(result.service_used.as_deref(), Some("second"));
        assert_eq!((first.calls(), second.calls(), third.calls()), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_invalid_body_falls_back_to_next_service() {
        let first = ScriptedBackend::garbled("first");
        let second = ScriptedBackend::ok("second", "hola");
        let gateway = gateway_of(&[first.clone(), second.clone()]);

        let result = gateway.translate(&request()).await.unwrap();
        assert_eq!(result.service_used.as_deref(), Some("second"));
        assert_eq!(first.calls() + second.calls(), 2);

        let languages = gateway.list_languages().await.unwrap();
        assert_eq!(languages[0]["from"], "second");
    }

    #[tokio::test]
    async fn test_last_diagnostic_is_a_timeout() {
        let gateway = gateway_of(&[
            ScriptedBackend::failing("first", 500),
            ScriptedBackend::timing_out("second"),
        ]);

        let err = gateway.translate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::AllServicesFailed { details: Some(ref d) } if d == "second timed out after 10s"
        ));
    }

    #[tokio::test]
    async fn test_all_failed_reports_last_diagnostic() {
        let first = ScriptedBackend::failing("first", 500);
        let second = ScriptedBackend::failing("second", 429);
        let gateway = gateway_of(&[first.clone(), second.clone()]);

        let err = gateway.translate(&request()).await.unwrap_err();
        match err {
            GatewayError::AllServicesFailed { details } => {
                assert_eq!(details.as_deref(), Some("second returned HTTP 429: second is down"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_each_call_restarts_from_first_service() {
        let first = ScriptedBackend::failing("first", 503);
        let second = ScriptedBackend::ok("second", "hola");
        let gateway = gateway_of(&[first.clone(), second.clone()]);

        gateway.translate(&request()).await.unwrap();
        gateway.translate(&request()).await.unwrap();
        assert_eq!(first.calls(), 2);
        assert_eq!(second.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_backends() {
        let gateway = Gateway::new(Vec::new());
        let err = gateway.list_languages().await.unwrap_err();
        assert!(matches!(err, GatewayError::AllServicesFailed { details: None }));
    }

    #[tokio::test]
    async fn test_languages_fallback() {
        let first = ScriptedBackend::failing("first", 502);
        let second = ScriptedBackend::ok("second", "");
        let gateway = gateway_of(&[first.clone(), second.clone()]);

        let languages = gateway.list_languages().await.unwrap();
        assert_eq!(languages, json!([{ "code": "en", "name": "English", "from": "second" }]));
        assert_eq!(first.calls(), 1);
    }
}
