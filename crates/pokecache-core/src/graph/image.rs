use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::{CatalogClient, SpriteFile};
use crate::endpoint::{SpriteCategory, SpriteKey, SpriteOptions};
use crate::error::Result;

struct ImageInner {
    client: CatalogClient,
    key: SpriteKey,
    url: String,
    force: bool,
    file: Mutex<Option<SpriteFile>>,
}

/// One sprite image, downloaded on first access of its path or bytes.
#[derive(Clone)]
pub struct ImageResource {
    inner: Arc<ImageInner>,
}

impl ImageResource {
    /// Build a handle without any I/O. Fails only on contradictory options.
    pub fn new(
        client: &CatalogClient,
        category: SpriteCategory,
        id: i64,
        options: SpriteOptions,
    ) -> Result<Self> {
        let key = SpriteKey::new(category, id, options)?;
        Ok(Self::from_key(client, key, false))
    }

    pub fn from_key(client: &CatalogClient, key: SpriteKey, force: bool) -> Self {
        let url = key.url(client.sprite_base_url());
        Self {
            inner: Arc::new(ImageInner {
                client: client.clone(),
                key,
                url,
                force,
                file: Mutex::new(None),
            }),
        }
    }

    pub fn key(&self) -> &SpriteKey {
        &self.inner.key
    }

    pub fn category(&self) -> SpriteCategory {
        self.inner.key.category()
    }

    pub fn id(&self) -> i64 {
        self.inner.key.id()
    }

    pub fn options(&self) -> SpriteOptions {
        self.inner.key.options()
    }

    /// Remote location of the image.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub async fn is_loaded(&self) -> bool {
        self.inner.file.lock().await.is_some()
    }

    /// Fetch (cache first) and remember the image, replacing any earlier copy.
    pub async fn load(&self) -> Result<()> {
        let mut file = self.inner.file.lock().await;
        *file = Some(self.inner.client.get_image(&self.inner.key, self.inner.force).await?);
        Ok(())
    }

    pub async fn file(&self) -> Result<SpriteFile> {
        let mut file = self.inner.file.lock().await;
        if let Some(ref loaded) = *file {
            return Ok(loaded.clone());
        }
        let loaded = self.inner.client.get_image(&self.inner.key, self.inner.force).await?;
        *file = Some(loaded.clone());
        Ok(loaded)
    }

    /// Absolute path of the cached image file.
    pub async fn path(&self) -> Result<PathBuf> {
        Ok(self.file().await?.path)
    }

    pub async fn bytes(&self) -> Result<Arc<[u8]>> {
        Ok(self.file().await?.bytes)
    }
}

impl fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResource")
            .field("key", &self.inner.key.cache_key())
            .field("url", &self.inner.url)
            .finish()
    }
}

impl fmt::Display for ImageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner.key.cache_key())
    }
}
