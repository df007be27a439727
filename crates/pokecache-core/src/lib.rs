//! pokecache - a lazy, cache-first client for the PokeAPI catalog.
//!
//! Entries are exposed as `Resource` handles that fetch their document on
//! first field access. Documents and sprite images are kept in a local
//! cache (`api.cache` plus a `sprite/` tree), so anything read once is
//! available offline afterwards.
//!
//! ```no_run
//! # async fn demo() -> pokecache_core::Result<()> {
//! use pokecache_core::{CatalogClient, Config};
//!
//! let client = CatalogClient::new(&Config::load()?)?;
//! let cheri = client.berry("cheri").await?;
//! let size = cheri.fields().await?.get_i64("size")?;
//! let item = cheri.field("item").await?;
//! # let _ = (size, item);
//! # Ok(())
//! # }
//! ```

mod accessors;
pub mod api;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod graph;

pub use api::{ApiError, CatalogClient, SpriteFile};
pub use cache::{CacheError, CacheStore};
pub use config::Config;
pub use endpoint::{DocumentKey, Endpoint, ResourceRef, SpriteCategory, SpriteKey, SpriteOptions};
pub use error::{CatalogError, Result};
pub use graph::{Fields, ImageResource, ListEntry, NameOrId, Resource, ResourceList, ResourceOptions, Value};
