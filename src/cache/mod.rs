//! # Resource Cache
//!
//! Keyed cache of asynchronously downloaded values with subscriber fan-out and
//! at most one download in flight per key.
//!
//! ## Overview
//!
//! Each key owns a [`ResourceEntry`] moving through `idle -> loading -> loaded | errored`.
//! Subscribing registers a callback, immediately tells it where the key stands,
//! and starts a download only when none is running and no (fresh) value is cached.
//! Everyone subscribed to the key then sees every transition in order.
//!
//! ## Concurrency
//!
//! All mutation of a key happens under that key's mutex, so "is a download in
//! flight" and "mark loading" are one step. Notifications are queued under the
//! same lock and delivered by a single drainer with the lock released: per-key
//! order is preserved and callbacks may call back into the cache.
//!
//! ```rust,no_run
//! use resource_cache::{ResourceCache, ResourceCacheConfig, ResourceStatus};
//!
//! # async fn example() -> resource_cache::Result<()> {
//! let cache: ResourceCache<String> = ResourceCache::new(ResourceCacheConfig::default())?;
//!
//! let subscription = cache.subscribe(
//!     "/img/logo.png",
//!     || async { Ok::<_, std::io::Error>("data:image/png;base64,...".to_string()) },
//!     |status: &ResourceStatus<String>| println!("logo is {}", status.state()),
//! );
//!
//! subscription.unsubscribe();
//! # Ok(())
//! # }
//! ```

mod downloader;
mod entry;
mod handle;
mod stats;
mod status;
mod subscription;

pub use downloader::ResourceDownloader;
pub use entry::{ResourceEntry, Transition};
pub use handle::ResourceHandle;
pub use stats::CacheStats;
pub use status::ResourceStatus;
pub use subscription::{Subscription, SubscriptionGuard};

use crate::config::ResourceCacheConfig;
use crate::constants::operations;
use crate::error::{BoxError, ResourceError, Result};
use crate::events::{TransitionEvent, TransitionPublisher};
use crate::logging::log_resource_operation;
use crate::registry::{ResourceSubscriber, SubscriberId, SubscriberRegistry};
use crate::state_machine::{ResourceEvent, ResourceState};
use chrono::Utc;
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use subscription::Detach;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Shared, explicitly constructed resource cache.
///
/// Cloning is cheap and yields another handle to the same cache.
pub struct ResourceCache<T> {
    inner: Arc<CacheInner<T>>,
}

struct CacheInner<T> {
    slots: DashMap<String, Arc<KeySlot<T>>>,
    config: ResourceCacheConfig,
    runtime: Handle,
    publisher: TransitionPublisher,
    downloads_started: AtomicU64,
    downloads_succeeded: AtomicU64,
    downloads_failed: AtomicU64,
}

struct KeySlot<T> {
    key: String,
    state: Mutex<SlotState<T>>,
}

struct SlotState<T> {
    entry: ResourceEntry<T>,
    subscribers: SubscriberRegistry<T>,
    outbox: VecDeque<Notification<T>>,
    draining: bool,
}

struct Notification<T> {
    recipients: Vec<(SubscriberId, ResourceSubscriber<T>)>,
    status: ResourceStatus<T>,
}

impl<T: Send + Sync + 'static> ResourceCache<T> {
    /// Build a cache whose downloads run on the current tokio runtime
    pub fn new(config: ResourceCacheConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ResourceError::RuntimeUnavailable)?;
        Self::with_runtime(config, runtime)
    }

    pub fn with_runtime(config: ResourceCacheConfig, runtime: Handle) -> Result<Self> {
        config.validate()?;
        let publisher = TransitionPublisher::new(config.event_channel_capacity);

        Ok(Self {
            inner: Arc::new(CacheInner {
                slots: DashMap::new(),
                config,
                runtime,
                publisher,
                downloads_started: AtomicU64::new(0),
                downloads_succeeded: AtomicU64::new(0),
                downloads_failed: AtomicU64::new(0),
            }),
        })
    }

    /// Subscribe to `key`, downloading it with `downloader` if nothing is cached or in flight.
    ///
    /// `on_update` first receives the current status, then every later transition of
    /// the key until the returned [`Subscription`] is unsubscribed. A download that
    /// fails is reported through `on_update` as [`ResourceStatus::Errored`]; the next
    /// subscription to the key starts a fresh attempt.
    pub fn subscribe<D, F>(&self, key: impl Into<String>, downloader: D, on_update: F) -> Subscription
    where
        D: ResourceDownloader<T>,
        F: Fn(&ResourceStatus<T>) + Send + Sync + 'static,
    {
        let key = key.into();
        let slot = self.inner.slot(&key);
        let subscriber: ResourceSubscriber<T> = Arc::new(on_update);
        let ttl = self.inner.config.ttl();

        let (id, download, claimed) = {
            let mut state = slot.state.lock();
            let id = state.subscribers.register(Arc::clone(&subscriber));
            let current = state.entry.status();
            state.send_to(id, subscriber, current);

            let download = if state.entry.needs_download(ttl) {
                match state.entry.begin_download() {
                    Ok(transition) => {
                        self.inner.record(&key, transition);
                        state.broadcast(ResourceStatus::Loading);
                        Some(transition.generation)
                    }
                    Err(err) => {
                        warn!(key = %key, error = %err, "Could not start resource download");
                        None
                    }
                }
            } else {
                None
            };

            debug!(
                key = %key,
                subscriber = %id,
                state = %state.entry.state(),
                subscribers = state.subscribers.len(),
                "Subscribed to resource"
            );
            (id, download, state.claim_drain())
        };

        if let Some(generation) = download {
            self.inner
                .spawn_download(Arc::clone(&slot), generation, Arc::new(downloader));
        }
        slot.drain(claimed);

        let owner: Weak<dyn Detach> = Arc::downgrade(&self.inner) as Weak<dyn Detach>;
        Subscription::new(key, id, owner)
    }

    /// Current state of `key`. Creates an idle entry on first use; never downloads.
    pub fn state(&self, key: &str) -> ResourceState {
        self.inner.slot(key).state.lock().entry.state()
    }

    /// Current status of `key`, `Idle` if the key is unknown
    pub fn status(&self, key: &str) -> ResourceStatus<T> {
        self.inner
            .existing_slot(key)
            .map(|slot| slot.state.lock().entry.status())
            .unwrap_or(ResourceStatus::Idle)
    }

    /// Cached value of `key` when loaded
    pub fn value(&self, key: &str) -> Option<Arc<T>> {
        self.inner
            .existing_slot(key)
            .and_then(|slot| slot.state.lock().entry.value().cloned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.slots.contains_key(key)
    }

    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .existing_slot(key)
            .map(|slot| slot.state.lock().subscribers.len())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner
            .slots
            .iter()
            .map(|slot| slot.key().clone())
            .collect()
    }

    /// Reset a settled entry to idle and drop its value.
    ///
    /// Returns `false` when the key is unknown, idle, or has a download in flight.
    pub fn invalidate(&self, key: &str) -> bool {
        let Some(slot) = self.inner.existing_slot(key) else {
            return false;
        };

        let (claimed, subscribers) = {
            let mut state = slot.state.lock();
            if state.entry.in_flight() || !state.entry.state().is_settled() {
                return false;
            }
            match state.entry.invalidate() {
                Ok(transition) => {
                    self.inner.record(key, transition);
                    state.broadcast(ResourceStatus::Idle);
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "Could not invalidate resource");
                    return false;
                }
            }
            (state.claim_drain(), state.subscribers.len())
        };

        slot.drain(claimed);
        log_resource_operation(
            operations::INVALIDATE,
            key,
            Some("idle"),
            Some(subscribers),
            None,
        );
        true
    }

    pub fn handle(&self, key: impl Into<String>) -> ResourceHandle<T> {
        ResourceHandle::new(self.clone(), key.into())
    }

    /// Receiver of every transition of every key
    pub fn events(&self) -> broadcast::Receiver<TransitionEvent> {
        self.inner.publisher.subscribe()
    }

    pub fn config(&self) -> &ResourceCacheConfig {
        &self.inner.config
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            downloads_started: self.inner.downloads_started.load(Ordering::SeqCst),
            downloads_succeeded: self.inner.downloads_succeeded.load(Ordering::SeqCst),
            downloads_failed: self.inner.downloads_failed.load(Ordering::SeqCst),
            ..CacheStats::default()
        };

        for slot in self.inner.slots.iter() {
            let state = slot.value().state.lock();
            stats.entries += 1;
            stats.subscribers += state.subscribers.len();
            if state.entry.in_flight() {
                stats.in_flight += 1;
            }
            match state.entry.state() {
                ResourceState::Idle => stats.idle += 1,
                ResourceState::Loading => stats.loading += 1,
                ResourceState::Loaded => stats.loaded += 1,
                ResourceState::Errored => stats.errored += 1,
            }
        }

        stats
    }
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for ResourceCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.inner.slots.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<T: Send + Sync + 'static> CacheInner<T> {
    fn slot(&self, key: &str) -> Arc<KeySlot<T>> {
        if let Some(slot) = self.existing_slot(key) {
            return slot;
        }
        self.slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(KeySlot::new(key)))
            .value()
            .clone()
    }

    fn existing_slot(&self, key: &str) -> Option<Arc<KeySlot<T>>> {
        self.slots.get(key).map(|slot| Arc::clone(slot.value()))
    }

    /// Publish a transition and log it. Called with the key's lock held so
    /// events leave in transition order.
    fn record(&self, key: &str, transition: Transition) {
        self.publisher.publish(TransitionEvent {
            key: key.to_string(),
            from: transition.from,
            to: transition.to,
            event: transition.event,
            generation: transition.generation,
            occurred_at: Utc::now(),
        });

        if self.config.log_transitions {
            let operation = match transition.event {
                ResourceEvent::Start | ResourceEvent::Refresh => operations::DOWNLOAD_STARTED,
                ResourceEvent::Succeed => operations::DOWNLOAD_SUCCEEDED,
                ResourceEvent::Fail => operations::DOWNLOAD_FAILED,
                ResourceEvent::Invalidate => operations::INVALIDATE,
            };
            let to = transition.to.to_string();
            log_resource_operation(operation, key, Some(&to), None, None);
        }
    }

    fn spawn_download(
        self: &Arc<Self>,
        slot: Arc<KeySlot<T>>,
        generation: u64,
        downloader: Arc<dyn ResourceDownloader<T>>,
    ) {
        let inner = Arc::clone(self);
        let timeout = self.config.download_timeout();
        self.downloads_started.fetch_add(1, Ordering::SeqCst);
        info!(key = %slot.key, generation = generation, "Starting resource download");

        self.runtime.spawn(async move {
            let download = AssertUnwindSafe(async { downloader.download().await }).catch_unwind();
            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, download)
                    .await
                    .unwrap_or_else(|_| {
                        Ok(Err(format!("download timed out after {}ms", limit.as_millis()).into()))
                    }),
                None => download.await,
            };
            let result = outcome.unwrap_or_else(|panic| {
                Err(format!("downloader panicked: {}", panic_message(panic.as_ref())).into())
            });
            inner.settle(&slot, generation, result);
        });
    }

    fn settle(&self, slot: &KeySlot<T>, generation: u64, result: std::result::Result<T, BoxError>) {
        let claimed = {
            let mut state = slot.state.lock();
            if !state.entry.in_flight() || state.entry.generation() != generation {
                warn!(
                    key = %slot.key,
                    generation = generation,
                    "Ignoring settlement of a download that is no longer tracked"
                );
                return;
            }

            let applied = match result {
                Ok(value) => {
                    let value = Arc::new(value);
                    state
                        .entry
                        .complete(Arc::clone(&value))
                        .map(|transition| (transition, ResourceStatus::Loaded(value)))
                }
                Err(source) => {
                    let error = ResourceError::download_failed(&slot.key, source);
                    warn!(key = %slot.key, error = %error, "Resource download failed");
                    state
                        .entry
                        .fail(error.clone())
                        .map(|transition| (transition, ResourceStatus::Errored(error)))
                }
            };

            match applied {
                Ok((transition, status)) => {
                    let counter = if status.is_loaded() {
                        &self.downloads_succeeded
                    } else {
                        &self.downloads_failed
                    };
                    counter.fetch_add(1, Ordering::SeqCst);
                    self.record(&slot.key, transition);
                    state.broadcast(status);
                }
                Err(err) => {
                    warn!(key = %slot.key, error = %err, "Could not settle resource download");
                }
            }

            state.claim_drain()
        };

        slot.drain(claimed);
    }
}

impl<T: Send + Sync + 'static> Detach for CacheInner<T> {
    fn detach(&self, key: &str, id: SubscriberId) -> bool {
        let Some(slot) = self.existing_slot(key) else {
            return false;
        };
        let (removed, remaining) = {
            let mut state = slot.state.lock();
            (state.subscribers.unregister(id), state.subscribers.len())
        };
        if removed {
            debug!(key = %key, subscriber = %id, remaining = remaining, "Unsubscribed from resource");
        }
        removed
    }
}

impl<T> KeySlot<T> {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            state: Mutex::new(SlotState {
                entry: ResourceEntry::new(key),
                subscribers: SubscriberRegistry::new(),
                outbox: VecDeque::new(),
                draining: false,
            }),
        }
    }

    /// Deliver queued notifications if this caller claimed the drainer role.
    ///
    /// Recipients that unsubscribed after a notification was queued are skipped.
    /// A panicking subscriber is logged and the remaining recipients still run.
    fn drain(&self, claimed: bool) {
        if !claimed {
            return;
        }

        loop {
            let notification = {
                let mut state = self.state.lock();
                match state.outbox.pop_front() {
                    Some(notification) => notification,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };

            for (id, subscriber) in &notification.recipients {
                let registered = self.state.lock().subscribers.contains(*id);
                if !registered {
                    continue;
                }
                let delivered =
                    std::panic::catch_unwind(AssertUnwindSafe(|| subscriber(&notification.status)));
                if let Err(panic) = delivered {
                    warn!(
                        key = %self.key,
                        subscriber = %id,
                        state = %notification.status.state(),
                        panic = %panic_message(panic.as_ref()),
                        "Subscriber panicked while handling a resource update"
                    );
                }
            }
        }
    }
}

impl<T> SlotState<T> {
    fn broadcast(&mut self, status: ResourceStatus<T>) {
        let recipients = self.subscribers.snapshot();
        if !recipients.is_empty() {
            self.outbox.push_back(Notification { recipients, status });
        }
    }

    fn send_to(&mut self, id: SubscriberId, subscriber: ResourceSubscriber<T>, status: ResourceStatus<T>) {
        self.outbox.push_back(Notification {
            recipients: vec![(id, subscriber)],
            status,
        });
    }

    /// Take the drainer role if there is work and nobody holds it
    fn claim_drain(&mut self) -> bool {
        if self.draining || self.outbox.is_empty() {
            return false;
        }
        self.draining = true;
        true
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
