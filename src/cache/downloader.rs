//! Downloader contract
//!
//! Any `Fn() -> impl Future<Output = Result<T, E>>` closure is a downloader, so
//! call sites can pass `|| async { ... }` directly. Types with their own state
//! (see [`crate::downloaders`]) implement the trait by hand.

use crate::error::BoxError;
use async_trait::async_trait;
use std::future::Future;

/// Produces the value of a resource. Invoked at most once per download window.
///
/// A panic inside `download` is reported to subscribers as a failed download.
/// This relies on the default `panic = "unwind"` strategy.
#[async_trait]
pub trait ResourceDownloader<T>: Send + Sync + 'static {
    async fn download(&self) -> Result<T, BoxError>;
}

#[async_trait]
impl<T, F, Fut, E> ResourceDownloader<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    E: Into<BoxError>,
{
    async fn download(&self) -> Result<T, BoxError> {
        (self)().await.map_err(Into::into)
    }
}
