use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Upstream translation services, tried in list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_services")]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Overrides `upstream.timeout_secs` for this service only
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::from_url("https://libretranslate.de"),
        ServiceConfig::from_url("https://translate.argosopentech.com"),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            services: default_services(),
        }
    }
}

impl ServiceConfig {
    pub fn from_url(base_url: &str) -> Self {
        Self {
            name: None,
            base_url: base_url.to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }

    /// Name reported to clients and used in diagnostics.
    pub fn identity(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.normalized_url(),
        }
    }

    pub fn normalized_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }

    pub fn timeout(&self, default_secs: u64) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(default_secs))
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file, picked by extension.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let content = substitute_env_vars(&content);

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Resolve the configuration the way the binary does at startup:
    /// first readable file wins, otherwise defaults, then env overrides.
    pub fn from_env() -> Result<(Self, Option<String>)> {
        let candidates: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut loaded = None;
        for path in candidates {
            if !Path::new(&path).exists() {
                debug!("No config file at {}", path);
                continue;
            }
            let config = Config::load(&path)
                .with_context(|| format!("Invalid configuration in {}", path))?;
            loaded = Some((config, path));
            break;
        }

        let (mut config, path) = match loaded {
            Some((config, path)) => (config, Some(path)),
            None => (Config::default(), None),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok((config, path))
    }

    /// Apply `HOST`, `PORT`, `TRANSLATE_SERVICES` and `UPSTREAM_TIMEOUT_SECS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        if let Some(services) = lookup("TRANSLATE_SERVICES") {
            let services: Vec<ServiceConfig> = services
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ServiceConfig::from_url)
                .collect();
            if !services.is_empty() {
                self.upstream.services = services;
            }
        }
        if let Some(timeout) = lookup("UPSTREAM_TIMEOUT_SECS").filter(|t| !t.trim().is_empty()) {
            self.upstream.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("UPSTREAM_TIMEOUT_SECS is not a number: {}", timeout))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.services.is_empty() {
            anyhow::bail!("At least one upstream translation service must be configured");
        }
        if self.upstream.timeout_secs == 0 {
            anyhow::bail!("upstream.timeout_secs must be greater than zero");
        }
        for service in &self.upstream.services {
            let url = service.normalized_url();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Upstream base_url must be http(s): {}", service.base_url);
            }
            if service.timeout_secs == Some(0) {
                anyhow::bail!("timeout_secs for {} must be greater than zero", url);
            }
        }
        Ok(())
    }
}

/// Replace `${VAR_NAME}` with the environment value, leaving unknown variables untouched.
fn substitute_env_vars(content: &str) -> String {
    substitute_with(content, |name| std::env::var(name).ok())
}

fn substitute_with<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = match Regex::new(r"\$\{(\w+)\}") {
        Ok(pattern) => pattern,
        Err(_) => return content.to_string(),
    };
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
