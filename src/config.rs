//! Client configuration: file/serde defaults plus environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::retry::policy::DEFAULT_MAX_ATTEMPTS;
use crate::{Error, ErrorContext, Result};

/// Maps setting names to the environment variables that override them.
///
/// The defaults use the `SVC_` prefix; a session can remap any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVars {
    map: HashMap<String, String>,
}

impl Default for EnvVars {
    fn default() -> Self {
        let map = [
            ("max_attempts", "SVC_MAX_ATTEMPTS"),
            ("http_timeout_secs", "SVC_HTTP_TIMEOUT_SECS"),
            ("connect_timeout_secs", "SVC_CONNECT_TIMEOUT_SECS"),
            ("attempt_timeout_ms", "SVC_ATTEMPT_TIMEOUT_MS"),
            ("pool_max_idle_per_host", "SVC_HTTP_POOL_MAX_IDLE_PER_HOST"),
            ("proxy_url", "SVC_PROXY_URL"),
            ("endpoint_url", "SVC_ENDPOINT_URL"),
            ("access_key_id", "SVC_ACCESS_KEY_ID"),
            ("secret_access_key", "SVC_SECRET_ACCESS_KEY"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { map }
    }
}

impl EnvVars {
    /// Point `setting` at a different environment variable.
    pub fn with(mut self, setting: impl Into<String>, var: impl Into<String>) -> Self {
        self.map.insert(setting.into(), var.into());
        self
    }

    pub fn var_name(&self, setting: &str) -> Option<&str> {
        self.map.get(setting).map(|s| s.as_str())
    }

    /// Current value of the variable mapped to `setting`; empty counts as unset.
    pub fn get(&self, setting: &str) -> Option<String> {
        self.var_name(setting)
            .and_then(|name| std::env::var(name).ok())
            .filter(|v| !v.trim().is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, setting: &str) -> Option<T> {
        self.get(setting).and_then(|s| s.trim().parse::<T>().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Total attempts per call, first attempt included.
    pub max_attempts: u32,
    pub http_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Bound on one attempt (send plus body read). Unset means unbounded.
    pub attempt_timeout_ms: Option<u64>,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub proxy_url: Option<String>,
    pub endpoint_url: Option<String>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            http_timeout_secs: 60,
            connect_timeout_secs: 60,
            attempt_timeout_ms: None,
            pool_max_idle_per_host: 10,
            pool_idle_timeout_secs: 90,
            proxy_url: None,
            endpoint_url: None,
            user_agent: format!("svc-lib-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Defaults with `SVC_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(&EnvVars::default())
    }

    /// Load from a YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| Error::Configuration {
            message: format!("invalid client config: {}", e),
            context: ErrorContext::new()
                .with_details(path.display().to_string())
                .with_source("client_config"),
        })
    }

    pub fn with_env_overrides(mut self, vars: &EnvVars) -> Self {
        if let Some(n) = vars.parse::<u32>("max_attempts") {
            self.max_attempts = n.max(1);
        }
        if let Some(n) = vars.parse::<u64>("http_timeout_secs") {
            self.http_timeout_secs = n;
        }
        if let Some(n) = vars.parse::<u64>("connect_timeout_secs") {
            self.connect_timeout_secs = n;
        }
        if let Some(ms) = vars.parse::<u64>("attempt_timeout_ms") {
            self.attempt_timeout_ms = Some(ms).filter(|ms| *ms > 0);
        }
        if let Some(n) = vars.parse::<usize>("pool_max_idle_per_host") {
            self.pool_max_idle_per_host = n;
        }
        if let Some(url) = vars.get("proxy_url") {
            self.proxy_url = Some(url);
        }
        if let Some(url) = vars.get("endpoint_url") {
            self.endpoint_url = Some(url);
        }
        self
    }

    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout_ms = Some(timeout.as_millis() as u64).filter(|ms| *ms > 0);
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }
}
