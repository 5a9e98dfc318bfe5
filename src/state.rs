use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::translate::{BackendFactory, Gateway};

/// Shared, read-only state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backends = BackendFactory::create_backends(&config.upstream)?;
        Ok(Self::with_gateway(config, Gateway::new(backends)))
    }

    pub fn with_gateway(config: Config, gateway: Gateway) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
        }
    }

    /// Short id used to correlate the log lines of one request
    pub fn generate_request_id(&self) -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }
}
