//! REST API client module for the PokeAPI catalog.
//!
//! This module provides the `CatalogClient` for fetching catalog documents
//! and sprite images, cache first.
//!
//! The API is public and unauthenticated; every request is a plain GET.

pub mod client;
pub mod error;

pub use client::{CatalogClient, SpriteFile};
pub use error::ApiError;
