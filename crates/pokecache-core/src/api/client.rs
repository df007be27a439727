//! Cache-first client for the catalog REST API.
//!
//! This module provides the `CatalogClient` struct, which resolves document
//! and sprite keys to their content, consulting the local cache before the
//! network and storing whatever it downloads.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::cache::{CacheError, CacheStore, CacheValue};
use crate::config::Config;
use crate::endpoint::{DocumentKey, Endpoint, ResourceRef, SpriteKey};
use crate::error::Result;
use crate::graph::ResourceList;

use super::ApiError;

/// A sprite on disk together with its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteFile {
    pub path: PathBuf,
    pub bytes: Arc<[u8]>,
}

/// Catalog client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    api_base_url: String,
    sprite_base_url: String,
    cache: CacheStore,
}

/// Declared total of a listing page, when the page holds fewer results.
fn listing_shortfall(doc: &serde_json::Value) -> Option<u64> {
    let count = doc.get("count")?.as_u64()?;
    let returned = doc
        .get("results")
        .and_then(|r| r.as_array())
        .map_or(0, |r| r.len() as u64);
    (count > returned).then_some(count)
}

impl CatalogClient {
    /// Create a client using the cache root from `config` (or the default root).
    pub fn new(config: &Config) -> Result<Self> {
        let cache = CacheStore::with_root(config.cache_dir()?)?;
        Self::with_cache(config, cache)
    }

    /// Create a client over an already opened cache.
    pub fn with_cache(config: &Config, cache: CacheStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url().trim_end_matches('/').to_string(),
            sprite_base_url: config.sprite_base_url().trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn sprite_base_url(&self) -> &str {
        &self.sprite_base_url
    }

    /// Canonical URL of a catalog entry.
    pub fn resource_url(&self, reference: ResourceRef) -> String {
        reference.document_key().url(&self.api_base_url)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(
        url: &str,
        response: reqwest::Response,
    ) -> std::result::Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(url, status, &body))
        }
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        debug!(url = url, "Fetching document");
        let response = self.client.get(url).send().await.map_err(ApiError::from)?;
        let response = Self::check_response(url, response).await?;
        let text = response.text().await.map_err(ApiError::from)?;

        let doc = serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse {
            url: url.to_string(),
            detail: format!("Failed to parse JSON: {}", e),
        })?;
        Ok(doc)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url = url, "Fetching sprite");
        let response = self.client.get(url).send().await.map_err(ApiError::from)?;
        let response = Self::check_response(url, response).await?;
        let bytes = response.bytes().await.map_err(ApiError::from)?;
        Ok(bytes.to_vec())
    }

    /// Resolve a document key to its JSON document, cache first.
    ///
    /// A listing whose first page is incomplete is fetched again with a
    /// `limit` covering the declared count, so the cached listing is always
    /// whole. Pass `force` to skip the cache lookup (the result is still
    /// stored).
    pub async fn get_document(&self, key: &DocumentKey, force: bool) -> Result<serde_json::Value> {
        let cache_key = key.cache_key();

        if !force {
            match self.cache.load_document(&cache_key) {
                Ok(doc) => {
                    debug!(key = %cache_key, "Cache hit");
                    return Ok(doc);
                }
                Err(CacheError::NotFound(_)) => debug!(key = %cache_key, "Cache miss"),
                Err(e) => warn!(key = %cache_key, error = %e, "Cache unreadable, fetching"),
            }
        }

        let url = key.url(&self.api_base_url);
        let mut doc = self.fetch_json(&url).await?;

        if key.is_listing() {
            if let Some(count) = listing_shortfall(&doc) {
                debug!(endpoint = %key.endpoint(), count = count, "Listing is paginated, refetching in full");
                doc = self.fetch_json(&format!("{}?limit={}", url, count)).await?;
            }
        }

        if let Err(e) = self.cache.save(&cache_key, CacheValue::Document(&doc)) {
            warn!(key = %cache_key, error = %e, "Failed to cache document");
        }

        Ok(doc)
    }

    /// Resolve a sprite key to a file in the sprite cache, downloading it
    /// when missing (or when `force` is set).
    pub async fn get_image(&self, key: &SpriteKey, force: bool) -> Result<SpriteFile> {
        let cache_key = key.cache_key();
        let path = self.cache.blob_path(cache_key);

        if !force {
            match self.cache.load_blob(cache_key) {
                Ok(bytes) => {
                    debug!(key = cache_key, "Sprite cache hit");
                    return Ok(SpriteFile {
                        path,
                        bytes: bytes.into(),
                    });
                }
                Err(CacheError::NotFound(_)) => debug!(key = cache_key, "Sprite cache miss"),
                Err(e) => warn!(key = cache_key, error = %e, "Sprite cache unreadable, fetching"),
            }
        }

        let bytes = self.fetch_bytes(&key.url(&self.sprite_base_url)).await?;
        self.cache.save(cache_key, CacheValue::Blob(&bytes))?;

        Ok(SpriteFile {
            path,
            bytes: bytes.into(),
        })
    }

    /// Full listing of an endpoint.
    pub async fn list(&self, endpoint: Endpoint) -> Result<ResourceList> {
        let doc = self.get_document(&DocumentKey::listing(endpoint), false).await?;
        ResourceList::from_document(endpoint, &doc)
    }
}
