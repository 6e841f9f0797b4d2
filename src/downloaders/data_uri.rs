//! Local asset to `data:` URI downloader
//!
//! Reads a file and returns it base64-encoded behind a MIME prefix, e.g.
//! `data:image/png;base64,iVBORw0...`.

use crate::cache::ResourceDownloader;
use crate::error::BoxError;
use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataUriDownloader {
    path: PathBuf,
    images_only: bool,
}

impl DataUriDownloader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            images_only: false,
        }
    }

    /// Reject files whose MIME type is not `image/*`
    pub fn images_only(mut self) -> Self {
        self.images_only = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &'static str {
        mime_for_path(&self.path)
    }
}

#[async_trait]
impl ResourceDownloader<String> for DataUriDownloader {
    async fn download(&self) -> Result<String, BoxError> {
        let mime = self.mime_type();
        if self.images_only && !mime.starts_with("image/") {
            return Err(format!(
                "Invalid image data: {} has MIME type {mime}",
                self.path.display()
            )
            .into());
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| format!("Failed to read {}: {e}", self.path.display()))?;

        Ok(encode_data_uri(mime, &bytes))
    }
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{payload}")
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
