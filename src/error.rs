use std::sync::Arc;

use crate::state_machine::{ResourceEvent, ResourceState};

/// Opaque error produced by a downloader.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared form of a downloader error so one failure can reach every subscriber.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ResourceError {
    #[error("Download failed for resource '{key}': {source}")]
    DownloadFailed { key: String, source: SharedError },

    #[error("Invalid transition for resource '{key}': cannot apply '{event}' in state '{from}'")]
    InvalidTransition {
        key: String,
        from: ResourceState,
        event: ResourceEvent,
    },

    #[error("No tokio runtime available to drive downloads")]
    RuntimeUnavailable,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ResourceError {
    pub fn download_failed(key: impl Into<String>, source: BoxError) -> Self {
        Self::DownloadFailed {
            key: key.into(),
            source: Arc::from(source),
        }
    }

    /// Key of the resource this error belongs to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::DownloadFailed { key, .. } | Self::InvalidTransition { key, .. } => Some(key),
            Self::RuntimeUnavailable | Self::Configuration(_) => None,
        }
    }

    pub fn is_download_failure(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. })
    }
}

impl From<config::ConfigError> for ResourceError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;
