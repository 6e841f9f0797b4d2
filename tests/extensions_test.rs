//! Invalidation, TTL, timeouts, transition events and the data URI downloader.

mod common;

use common::{counting_downloader, settle_tasks, wait_for, GatedDownloader, Recorder};
use resource_cache::{
    DataUriDownloader, ResourceCache, ResourceCacheConfig, ResourceEvent, ResourceState,
    ResourceStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn cache_with(config: ResourceCacheConfig) -> ResourceCache<u32> {
    ResourceCache::new(config).expect("cache inside runtime")
}

#[tokio::test]
async fn invalidate_resets_loaded_entry() {
    let cache = cache_with(ResourceCacheConfig::for_test());
    let calls = Arc::new(AtomicUsize::new(0));
    let recorder = Recorder::new();

    cache.subscribe("k", counting_downloader(&calls, 1), recorder.callback());
    wait_for(|| cache.state("k") == ResourceState::Loaded).await;

    assert!(cache.invalidate("k"));
    assert_eq!(cache.state("k"), ResourceState::Idle);
    assert!(cache.value("k").is_none());
    assert_eq!(recorder.last_state(), Some(ResourceState::Idle));

    cache.subscribe("k", counting_downloader(&calls, 2), |_: &ResourceStatus<u32>| {});
    wait_for(|| cache.state("k") == ResourceState::Loaded).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.value("k").map(|v| *v), Some(2));
}

#[tokio::test]
async fn invalidate_leaves_in_flight_and_unknown_keys_alone() {
    let cache = cache_with(ResourceCacheConfig::for_test());
    let downloader = GatedDownloader::succeeding(1);

    assert!(!cache.invalidate("unknown"));
    assert!(!cache.contains("unknown"));

    cache.subscribe("k", downloader.clone(), |_: &ResourceStatus<u32>| {});
    assert!(!cache.invalidate("k"));
    assert_eq!(cache.state("k"), ResourceState::Loading);

    downloader.release();
    wait_for(|| cache.state("k") == ResourceState::Loaded).await;
    assert_eq!(downloader.calls(), 1);
}

#[tokio::test]
async fn without_ttl_loaded_entries_never_refresh() {
    let cache = cache_with(ResourceCacheConfig::for_test());
    let calls = Arc::new(AtomicUsize::new(0));

    cache.subscribe("k", counting_downloader(&calls, 1), |_: &ResourceStatus<u32>| {});
    wait_for(|| cache.state("k") == ResourceState::Loaded).await;

    for _ in 0..5 {
        cache.subscribe("k", counting_downloader(&calls, 1), |_: &ResourceStatus<u32>| {});
    }
    settle_tasks().await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stale_entry_is_downloaded_again_once() {
    let config = ResourceCacheConfig::for_test().with_ttl(Duration::from_secs(1));
    let cache = cache_with(config);
    let calls = Arc::new(AtomicUsize::new(0));

    cache.subscribe("k", counting_downloader(&calls, 1), |_: &ResourceStatus<u32>| {});
    wait_for(|| cache.state("k") == ResourceState::Loaded).await;

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    // readers still see the old value until someone subscribes
    assert_eq!(cache.state("k"), ResourceState::Loaded);

    let refreshed = GatedDownloader::succeeding(2);
    let recorder = Recorder::new();
    cache.subscribe("k", refreshed.clone(), recorder.callback());
    cache.subscribe("k", refreshed.clone(), |_: &ResourceStatus<u32>| {});
    refreshed.release();
    wait_for(|| recorder.last_state() == Some(ResourceState::Loaded)).await;

    assert_eq!(refreshed.calls(), 1);
    assert_eq!(
        recorder.states(),
        vec![ResourceState::Loaded, ResourceState::Loading, ResourceState::Loaded]
    );
    assert_eq!(cache.value("k").map(|v| *v), Some(2));
}

#[tokio::test]
async fn slow_download_times_out_as_failure() {
    let config = ResourceCacheConfig::for_test().with_download_timeout(Duration::from_millis(50));
    let cache = cache_with(config);
    let never = GatedDownloader::succeeding(1);
    let recorder = Recorder::new();

    cache.subscribe("slow", never.clone(), recorder.callback());
    wait_for(|| recorder.last_state() == Some(ResourceState::Errored)).await;

    let error = recorder.last().unwrap().error().cloned().unwrap();
    assert!(error.is_download_failure());
    assert!(error.to_string().contains("timed out after 50ms"));
    assert_eq!(cache.stats().in_flight, 0);
}

#[tokio::test]
async fn panicking_downloader_is_reported_as_failure() {
    let cache = cache_with(ResourceCacheConfig::for_test());
    let recorder = Recorder::new();

    cache.subscribe(
        "boom",
        || async {
            if true {
                panic!("decoder exploded");
            }
            Ok::<u32, std::io::Error>(0)
        },
        recorder.callback(),
    );
    wait_for(|| recorder.last_state() == Some(ResourceState::Errored)).await;

    let error = recorder.last().unwrap().error().cloned().unwrap();
    assert!(error.to_string().contains("downloader panicked: decoder exploded"));

    // the key is usable again
    let calls = Arc::new(AtomicUsize::new(0));
    cache.subscribe("boom", counting_downloader(&calls, 3), |_: &ResourceStatus<u32>| {});
    wait_for(|| cache.state("boom") == ResourceState::Loaded).await;
}

#[tokio::test]
async fn transitions_are_published_in_order() {
    let cache = cache_with(ResourceCacheConfig::for_test());
    let mut events = cache.events();
    let failing = GatedDownloader::failing("gone");
    let retry = GatedDownloader::succeeding(9);

    cache.subscribe("img", failing.clone(), |_: &ResourceStatus<u32>| {});
    failing.release();
    wait_for(|| cache.state("img") == ResourceState::Errored).await;

    cache.subscribe("img", retry.clone(), |_: &ResourceStatus<u32>| {});
    retry.release();
    wait_for(|| cache.state("img") == ResourceState::Loaded).await;
    assert!(cache.invalidate("img"));

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.key, "img");
        seen.push((event.from, event.to, event.event, event.generation));
    }

    assert_eq!(
        seen,
        vec![
            (ResourceState::Idle, ResourceState::Loading, ResourceEvent::Start, 1),
            (ResourceState::Loading, ResourceState::Errored, ResourceEvent::Fail, 1),
            (ResourceState::Errored, ResourceState::Loading, ResourceEvent::Start, 2),
            (ResourceState::Loading, ResourceState::Loaded, ResourceEvent::Succeed, 2),
            (ResourceState::Loaded, ResourceState::Idle, ResourceEvent::Invalidate, 2),
        ]
    );
}

#[tokio::test]
async fn subscription_guard_unsubscribes_on_drop() {
    let cache = cache_with(ResourceCacheConfig::for_test());
    let downloader = GatedDownloader::succeeding(1);
    let recorder = Recorder::new();

    {
        let _guard = cache
            .subscribe("k", downloader.clone(), recorder.callback())
            .unsubscribe_on_drop();
        assert_eq!(cache.subscriber_count("k"), 1);
    }
    assert_eq!(cache.subscriber_count("k"), 0);

    downloader.release();
    wait_for(|| cache.state("k") == ResourceState::Loaded).await;
    assert_eq!(recorder.last_state(), Some(ResourceState::Loading));
}

#[tokio::test]
async fn data_uri_downloader_through_cache() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    tokio::fs::write(&logo, [0x89, b'P', b'N', b'G']).await.unwrap();

    let cache: ResourceCache<String> =
        ResourceCache::new(ResourceCacheConfig::for_test()).unwrap();
    let key = logo.display().to_string();

    cache.subscribe(
        key.clone(),
        DataUriDownloader::new(&logo).images_only(),
        |_: &ResourceStatus<String>| {},
    );
    wait_for(|| cache.state(&key) == ResourceState::Loaded).await;

    let uri = cache.value(&key).unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));

    let missing = dir.path().join("missing.png").display().to_string();
    cache.subscribe(
        missing.clone(),
        DataUriDownloader::new(&missing),
        |_: &ResourceStatus<String>| {},
    );
    wait_for(|| cache.state(&missing) == ResourceState::Errored).await;
}
