//! Shared helpers for cache integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use resource_cache::{BoxError, ResourceDownloader, ResourceState, ResourceStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Collects every status a subscriber receives
#[derive(Clone)]
pub struct Recorder<T> {
    log: Arc<Mutex<Vec<ResourceStatus<T>>>>,
}

impl<T: Send + Sync + 'static> Recorder<T> {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn callback(&self) -> impl Fn(&ResourceStatus<T>) + Send + Sync + 'static {
        let log = Arc::clone(&self.log);
        move |status: &ResourceStatus<T>| log.lock().push(status.clone())
    }

    pub fn states(&self) -> Vec<ResourceState> {
        self.log.lock().iter().map(ResourceStatus::state).collect()
    }

    pub fn statuses(&self) -> Vec<ResourceStatus<T>> {
        self.log.lock().clone()
    }

    pub fn last(&self) -> Option<ResourceStatus<T>> {
        self.log.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn last_state(&self) -> Option<ResourceState> {
        self.last().map(|status| status.state())
    }
}

/// Downloader that counts calls and settles only when released
#[derive(Clone)]
pub struct GatedDownloader {
    calls: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
    outcome: Result<u32, String>,
}

impl GatedDownloader {
    pub fn succeeding(value: u32) -> Self {
        Self::with_outcome(Ok(value))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(Err(message.to_string()))
    }

    fn with_outcome(outcome: Result<u32, String>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Semaphore::new(0)),
            outcome,
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceDownloader<u32> for GatedDownloader {
    async fn download(&self) -> Result<u32, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.acquire().await?.forget();
        self.outcome.clone().map_err(Into::into)
    }
}

/// Downloader that resolves immediately and counts calls
pub fn counting_downloader(
    calls: &Arc<AtomicUsize>,
    value: u32,
) -> impl Fn() -> futures::future::Ready<Result<u32, BoxError>> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok(value))
    }
}

/// Poll `condition` until it holds, failing the test after five seconds
pub async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}

/// Let spawned downloads make progress without settling gated ones
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
