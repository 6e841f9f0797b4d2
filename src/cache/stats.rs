use serde::{Deserialize, Serialize};

/// Point-in-time view of a cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub idle: usize,
    pub loading: usize,
    pub loaded: usize,
    pub errored: usize,
    pub in_flight: usize,
    pub subscribers: usize,
    pub downloads_started: u64,
    pub downloads_succeeded: u64,
    pub downloads_failed: u64,
}
