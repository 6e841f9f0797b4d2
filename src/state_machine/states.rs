use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single cached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Entry exists but no download has been started
    #[default]
    Idle,
    /// A download is in flight
    Loading,
    /// The value is cached
    Loaded,
    /// The last download failed
    Errored,
}

impl ResourceState {
    /// Check if a download has settled for this resource
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Errored)
    }

    /// Check if a new subscription may start a download from this state
    pub fn accepts_download(&self) -> bool {
        matches!(self, Self::Idle | Self::Errored)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

impl std::str::FromStr for ResourceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "loading" => Ok(Self::Loading),
            "loaded" => Ok(Self::Loaded),
            "errored" => Ok(Self::Errored),
            _ => Err(format!("Invalid resource state: {s}")),
        }
    }
}
