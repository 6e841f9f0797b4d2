//! Cache configuration
//!
//! Defaults keep the session-scoped, never-evicting behaviour. TTL and download
//! timeout are opt-in.

use crate::constants::{defaults, env as env_vars};
use crate::error::{ResourceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCacheConfig {
    /// Age after which a loaded entry is downloaded again on the next subscription
    pub ttl_seconds: Option<u64>,
    /// Upper bound on a single download
    pub download_timeout_ms: Option<u64>,
    /// Capacity of the transition broadcast channel
    pub event_channel_capacity: usize,
    /// Emit an `info!` record for every state transition
    pub log_transitions: bool,
}

impl Default for ResourceCacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: None,
            download_timeout_ms: None,
            event_channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
            log_transitions: true,
        }
    }
}

impl ResourceCacheConfig {
    /// Test configuration: bounded downloads so a stuck test fails instead of hanging
    pub fn for_test() -> Self {
        Self {
            ttl_seconds: None,
            download_timeout_ms: Some(defaults::TEST_DOWNLOAD_TIMEOUT_MS),
            event_channel_capacity: defaults::TEST_EVENT_CHANNEL_CAPACITY,
            log_transitions: false,
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ttl) = std::env::var(env_vars::TTL_SECONDS) {
            let seconds = ttl.parse().map_err(|e| {
                ResourceError::Configuration(format!("Invalid ttl_seconds: {e}"))
            })?;
            config.ttl_seconds = Some(seconds);
        }

        if let Ok(timeout) = std::env::var(env_vars::DOWNLOAD_TIMEOUT_MS) {
            let millis = timeout.parse().map_err(|e| {
                ResourceError::Configuration(format!("Invalid download_timeout_ms: {e}"))
            })?;
            config.download_timeout_ms = Some(millis);
        }

        if let Ok(capacity) = std::env::var(env_vars::EVENT_CAPACITY) {
            config.event_channel_capacity = capacity.parse().map_err(|e| {
                ResourceError::Configuration(format!("Invalid event_channel_capacity: {e}"))
            })?;
        }

        if let Ok(log_transitions) = std::env::var(env_vars::LOG_TRANSITIONS) {
            config.log_transitions = log_transitions.parse().map_err(|e| {
                ResourceError::Configuration(format!("Invalid log_transitions: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML/YAML/JSON file, with `RESOURCE_CACHE_*` variables layered on top
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading resource cache configuration from: {}", path.display());

        let config: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(env_vars::PREFIX))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_channel_capacity == 0 {
            return Err(ResourceError::Configuration(
                "event_channel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.ttl_seconds == Some(0) {
            return Err(ResourceError::Configuration(
                "ttl_seconds must be greater than 0 when set".to_string(),
            ));
        }

        if self.download_timeout_ms == Some(0) {
            return Err(ResourceError::Configuration(
                "download_timeout_ms must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }

    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = Some(ttl.as_secs().max(1));
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1));
        self
    }
}
