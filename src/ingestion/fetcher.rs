//! Media fetch boundary

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Network-like dereference of a media reference into bytes
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, media_url: &str) -> Result<Bytes>;
}

/// HTTP fetcher for platform-hosted media
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a fresh HTTP client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, media_url: &str) -> Result<Bytes> {
        let response = self.client.get(media_url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Transient(format!(
                "media fetch returned status {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?)
    }
}
