use std::sync::Arc;
use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use crate::config::UpstreamConfig;
use super::client::LibreTranslateClient;
use super::interface::TranslationBackend;

/// Factory for creating upstream translation backends
pub struct BackendFactory;

impl BackendFactory {
    /// Build one backend per configured service, preserving priority order.
    ///
    /// All backends share a single connection pool; timeouts are applied per request.
    pub fn create_backends(config: &UpstreamConfig) -> Result<Vec<Arc<dyn TranslationBackend>>> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let backends = config
            .services
            .iter()
            .enumerate()
            .map(|(priority, service)| {
                let timeout = service.timeout(config.timeout_secs);
                info!(
                    "Upstream #{}: {} ({}, timeout {:?})",
                    priority + 1,
                    service.identity(),
                    service.normalized_url(),
                    timeout
                );
                Arc::new(LibreTranslateClient::new(client.clone(), service, timeout))
                    as Arc<dyn TranslationBackend>
            })
            .collect();

        Ok(backends)
    }
}
