use crate::registry::SubscriberId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

/// Removes a registration from whatever owns it
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, key: &str, id: SubscriberId) -> bool;
}

/// Handle returned by [`ResourceCache::subscribe`](super::ResourceCache::subscribe).
///
/// Dropping it leaves the subscriber registered; call [`unsubscribe`](Self::unsubscribe)
/// or convert it with [`unsubscribe_on_drop`](Self::unsubscribe_on_drop).
pub struct Subscription {
    key: String,
    id: SubscriberId,
    owner: Weak<dyn Detach>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(key: String, id: SubscriberId, owner: Weak<dyn Detach>) -> Self {
        Self {
            key,
            id,
            owner,
            active: AtomicBool::new(true),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop notifications to this subscriber. Idempotent; never cancels a download.
    ///
    /// Returns `true` only for the call that actually removed the registration.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        match self.owner.upgrade() {
            Some(owner) => owner.detach(&self.key, self.id),
            None => false,
        }
    }

    pub fn unsubscribe_on_drop(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Unsubscribes when dropped
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
