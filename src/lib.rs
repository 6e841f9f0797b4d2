#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Resource Cache
//!
//! Session-scoped cache of asynchronously downloaded values, shared by many
//! consumers.
//!
//! ## Overview
//!
//! A [`ResourceCache`] maps string keys to resources that are fetched once and
//! read many times. Consumers subscribe to a key with a downloader and a
//! callback; the cache guarantees:
//!
//! - **De-duplication**: at most one download per key is in flight at a time
//! - **Replay**: late subscribers immediately learn the current state, including
//!   the cached value once loaded
//! - **Fan-out**: every subscriber of a key sees the same transitions in the same order
//! - **Contained failures**: download errors are delivered as an `errored` status,
//!   never returned to the subscriber; subscribing again retries
//!
//! ## Module Organization
//!
//! - [`cache`] - The cache, its entries, statuses and subscription handles
//! - [`state_machine`] - Per-key `idle / loading / loaded / errored` machine
//! - [`registry`] - Per-key subscriber sets
//! - [`events`] - Broadcast of every state transition for observers
//! - [`downloaders`] - Ready-made downloaders (local file to `data:` URI)
//! - [`config`] - Configuration with environment and file overrides
//! - [`logging`] - Structured logging setup
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resource_cache::{DataUriDownloader, ResourceCache, ResourceCacheConfig};
//!
//! # async fn example() -> resource_cache::Result<()> {
//! resource_cache::logging::init_structured_logging();
//!
//! let cache: ResourceCache<String> = ResourceCache::new(ResourceCacheConfig::from_env()?)?;
//! let logo = cache.handle("assets/img/logo.png");
//!
//! let _subscription = logo.subscribe(
//!     DataUriDownloader::new("assets/img/logo.png").images_only(),
//!     |status| {
//!         if let Some(uri) = status.data() {
//!             println!("logo ready ({} bytes)", uri.len());
//!         }
//!     },
//! );
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod downloaders;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod state_machine;

pub use cache::{
    CacheStats, ResourceCache, ResourceDownloader, ResourceEntry, ResourceHandle,
    ResourceStatus, Subscription, SubscriptionGuard,
};
pub use config::ResourceCacheConfig;
pub use downloaders::DataUriDownloader;
pub use error::{BoxError, ResourceError, Result};
pub use events::{TransitionEvent, TransitionPublisher};
pub use registry::{ResourceSubscriber, SubscriberId};
pub use state_machine::{ResourceEvent, ResourceState};
