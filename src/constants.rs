//! # Cache Constants
//!
//! Environment variable names and default values shared by the configuration
//! and logging layers.

// Re-export state types for convenience
pub use crate::state_machine::{ResourceEvent, ResourceState};

/// Environment variables read by [`crate::config::ResourceCacheConfig::from_env`]
/// and [`crate::logging`]
pub mod env {
    pub const PREFIX: &str = "RESOURCE_CACHE";
    pub const ENVIRONMENT: &str = "RESOURCE_CACHE_ENV";
    pub const TTL_SECONDS: &str = "RESOURCE_CACHE_TTL_SECONDS";
    pub const DOWNLOAD_TIMEOUT_MS: &str = "RESOURCE_CACHE_DOWNLOAD_TIMEOUT_MS";
    pub const EVENT_CAPACITY: &str = "RESOURCE_CACHE_EVENT_CAPACITY";
    pub const LOG_TRANSITIONS: &str = "RESOURCE_CACHE_LOG_TRANSITIONS";
    pub const LOG_FORMAT: &str = "RESOURCE_CACHE_LOG_FORMAT";
}

/// Default configuration values
pub mod defaults {
    pub const EVENT_CHANNEL_CAPACITY: usize = 256;
    pub const TEST_EVENT_CHANNEL_CAPACITY: usize = 64;
    pub const TEST_DOWNLOAD_TIMEOUT_MS: u64 = 5_000;
}

/// Operation names used in structured log records
pub mod operations {
    pub const DOWNLOAD_STARTED: &str = "download_started";
    pub const DOWNLOAD_SUCCEEDED: &str = "download_succeeded";
    pub const DOWNLOAD_FAILED: &str = "download_failed";
    pub const INVALIDATE: &str = "invalidate";
}
