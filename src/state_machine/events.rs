use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that drive resource state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceEvent {
    /// A subscription started a download
    Start,
    /// The downloader produced a value
    Succeed,
    /// The downloader failed
    Fail,
    /// A settled entry was reset to idle
    Invalidate,
    /// A loaded entry outlived its TTL and a new download started
    Refresh,
}

impl ResourceEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Fail => "fail",
            Self::Invalidate => "invalidate",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}
