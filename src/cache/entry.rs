use super::status::ResourceStatus;
use crate::error::{ResourceError, Result};
use crate::state_machine::{self, ResourceEvent, ResourceState};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A state change applied to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ResourceState,
    pub to: ResourceState,
    pub event: ResourceEvent,
    pub generation: u64,
}

/// Cached state of one key. Value and error are never set together.
#[derive(Debug)]
pub struct ResourceEntry<T> {
    key: String,
    state: ResourceState,
    value: Option<Arc<T>>,
    error: Option<ResourceError>,
    in_flight: bool,
    loaded_at: Option<Instant>,
    generation: u64,
}

impl<T> ResourceEntry<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: ResourceState::Idle,
            value: None,
            error: None,
            in_flight: false,
            loaded_at: None,
            generation: 0,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn value(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&ResourceError> {
        self.error.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Number of downloads started for this key
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> ResourceStatus<T> {
        match (self.state, &self.value, &self.error) {
            (ResourceState::Loaded, Some(value), _) => ResourceStatus::Loaded(Arc::clone(value)),
            (ResourceState::Errored, _, Some(err)) => ResourceStatus::Errored(err.clone()),
            (ResourceState::Loading, _, _) => ResourceStatus::Loading,
            _ => ResourceStatus::Idle,
        }
    }

    /// Loaded longer ago than `ttl`. Always `false` without a TTL.
    pub fn is_stale(&self, ttl: Option<Duration>) -> bool {
        match (self.state, self.loaded_at, ttl) {
            (ResourceState::Loaded, Some(loaded_at), Some(ttl)) => loaded_at.elapsed() >= ttl,
            _ => false,
        }
    }

    /// Whether a new subscription must start a download
    pub fn needs_download(&self, ttl: Option<Duration>) -> bool {
        !self.in_flight && (self.state.accepts_download() || self.is_stale(ttl))
    }

    /// Mark a download as started: `idle|errored -> loading`, or `loaded -> loading` on refresh
    pub fn begin_download(&mut self) -> Result<Transition> {
        let event = if self.state == ResourceState::Loaded {
            ResourceEvent::Refresh
        } else {
            ResourceEvent::Start
        };
        let transition = self.apply(event)?;
        self.in_flight = true;
        self.value = None;
        self.error = None;
        self.loaded_at = None;
        Ok(transition)
    }

    pub fn complete(&mut self, value: Arc<T>) -> Result<Transition> {
        let transition = self.apply(ResourceEvent::Succeed)?;
        self.in_flight = false;
        self.value = Some(value);
        self.error = None;
        self.loaded_at = Some(Instant::now());
        Ok(transition)
    }

    pub fn fail(&mut self, error: ResourceError) -> Result<Transition> {
        let transition = self.apply(ResourceEvent::Fail)?;
        self.in_flight = false;
        self.value = None;
        self.error = Some(error);
        Ok(transition)
    }

    pub fn invalidate(&mut self) -> Result<Transition> {
        let transition = self.apply(ResourceEvent::Invalidate)?;
        self.value = None;
        self.error = None;
        self.loaded_at = None;
        Ok(transition)
    }

    fn apply(&mut self, event: ResourceEvent) -> Result<Transition> {
        let from = self.state;
        let to = state_machine::transition(&self.key, from, event)?;
        if matches!(event, ResourceEvent::Start | ResourceEvent::Refresh) {
            self.generation += 1;
        }
        self.state = to;
        Ok(Transition {
            from,
            to,
            event,
            generation: self.generation,
        })
    }
}
