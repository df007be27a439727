//! Convenience constructors on `CatalogClient`, one per endpoint.
//!
//! `client.berry("cheri")` is `Resource::construct(&client, Endpoint::Berry,
//! "cheri", ResourceOptions::default())`: the identity is resolved from the
//! cached listing and the entry document is left for the first field access.

use crate::api::CatalogClient;
use crate::endpoint::{with_endpoint_table, Endpoint, SpriteCategory, SpriteOptions};
use crate::error::Result;
use crate::graph::{ImageResource, NameOrId, Resource, ResourceOptions};

impl CatalogClient {
    /// Lazy handle on an entry of a dynamically chosen endpoint.
    pub async fn resource(&self, endpoint: Endpoint, name_or_id: impl Into<NameOrId>) -> Result<Resource> {
        Resource::construct(self, endpoint, name_or_id, ResourceOptions::default()).await
    }

    pub async fn resource_with(
        &self,
        endpoint: Endpoint,
        name_or_id: impl Into<NameOrId>,
        options: ResourceOptions,
    ) -> Result<Resource> {
        Resource::construct(self, endpoint, name_or_id, options).await
    }

    /// Lazy handle on a sprite image. No I/O until the path or bytes are read.
    pub fn sprite(&self, category: SpriteCategory, id: i64, options: SpriteOptions) -> Result<ImageResource> {
        ImageResource::new(self, category, id, options)
    }

    pub fn pokemon_sprite(&self, id: i64, options: SpriteOptions) -> Result<ImageResource> {
        self.sprite(SpriteCategory::Pokemon, id, options)
    }
}

macro_rules! define_accessors {
    ($($variant:ident => $name:literal, $accessor:ident;)*) => {
        impl CatalogClient {
            $(
                #[doc = concat!("Lazy handle on a `", $name, "` entry, by name or id.")]
                pub async fn $accessor(&self, name_or_id: impl Into<NameOrId>) -> Result<Resource> {
                    self.resource(Endpoint::$variant, name_or_id).await
                }
            )*
        }
    };
}

with_endpoint_table!(define_accessors);
