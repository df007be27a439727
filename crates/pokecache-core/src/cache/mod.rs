//! Local caching module for offline data access.
//!
//! This module provides the `CacheStore` for keeping catalog documents and
//! sprite images on disk. Documents live in a single SQLite file
//! (`api.cache`) keyed by their cache key; sprites are plain files under
//! `sprite/`, laid out exactly like their keys.
//!
//! A locked store never fails the caller: a busy save is skipped and a busy
//! load reads as a miss.

pub mod store;

pub use store::{CacheEntryInfo, CacheError, CachePaths, CacheStats, CacheStore, CacheValue};
