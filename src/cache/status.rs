use crate::error::ResourceError;
use crate::state_machine::ResourceState;
use std::fmt;
use std::sync::Arc;

/// What a subscriber sees: the state plus the value or error belonging to it
pub enum ResourceStatus<T> {
    Idle,
    Loading,
    Loaded(Arc<T>),
    Errored(ResourceError),
}

impl<T> ResourceStatus<T> {
    pub fn state(&self) -> ResourceState {
        match self {
            Self::Idle => ResourceState::Idle,
            Self::Loading => ResourceState::Loading,
            Self::Loaded(_) => ResourceState::Loaded,
            Self::Errored(_) => ResourceState::Errored,
        }
    }

    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ResourceError> {
        match self {
            Self::Errored(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl<T> Clone for ResourceStatus<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Loaded(value) => Self::Loaded(Arc::clone(value)),
            Self::Errored(err) => Self::Errored(err.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ResourceStatus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading => f.write_str("Loading"),
            Self::Loaded(value) => f.debug_tuple("Loaded").field(value).finish(),
            Self::Errored(err) => f.debug_tuple("Errored").field(err).finish(),
        }
    }
}
