use super::{ResourceCache, ResourceDownloader, ResourceStatus, Subscription};
use crate::state_machine::ResourceState;

/// A cache view bound to one key
pub struct ResourceHandle<T> {
    cache: ResourceCache<T>,
    key: String,
}

impl<T: Send + Sync + 'static> ResourceHandle<T> {
    pub(crate) fn new(cache: ResourceCache<T>, key: String) -> Self {
        Self { cache, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> ResourceState {
        self.cache.state(&self.key)
    }

    pub fn status(&self) -> ResourceStatus<T> {
        self.cache.status(&self.key)
    }

    pub fn subscribe<D, F>(&self, downloader: D, on_update: F) -> Subscription
    where
        D: ResourceDownloader<T>,
        F: Fn(&ResourceStatus<T>) + Send + Sync + 'static,
    {
        self.cache.subscribe(self.key.clone(), downloader, on_update)
    }
}

impl<T> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
        }
    }
}
