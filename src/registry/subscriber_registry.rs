//! # Subscriber Registry
//!
//! Per-key subscriber sets. A registry is owned by a single cache entry and is
//! only mutated under that entry's lock; fan-out works on a [`snapshot`] taken
//! while the lock is held so callbacks run without it.
//!
//! [`snapshot`]: SubscriberRegistry::snapshot

use crate::cache::ResourceStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Callback invoked with every status change of the key it is registered on
pub type ResourceSubscriber<T> = Arc<dyn Fn(&ResourceStatus<T>) + Send + Sync>;

/// Identity of one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Subscribers of a single key, in registration order
pub struct SubscriberRegistry<T> {
    subscribers: Vec<(SubscriberId, ResourceSubscriber<T>)>,
}

impl<T> SubscriberRegistry<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub fn register(&mut self, subscriber: ResourceSubscriber<T>) -> SubscriberId {
        let id = SubscriberId::new();
        self.subscribers.push((id, subscriber));
        id
    }

    /// Remove a registration. Returns `false` if it was already gone.
    pub fn unregister(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.iter().any(|(existing, _)| *existing == id)
    }

    /// Everyone registered right now, for delivery outside the entry lock
    pub fn snapshot(&self) -> Vec<(SubscriberId, ResourceSubscriber<T>)> {
        self.subscribers
            .iter()
            .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SubscriberRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = self.subscribers.iter().map(|(id, _)| *id).collect();
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &ids)
            .finish()
    }
}
