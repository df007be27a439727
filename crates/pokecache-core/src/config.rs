//! Client configuration management.
//!
//! Configuration is read from `~/.config/pokecache/config.json` when it
//! exists; every field is optional and falls back to the defaults below.
//!
//! The cache root defaults to the platform cache directory
//! (`~/.cache/pokecache` on Linux). A pre-existing `~/.pokecache` takes
//! precedence so caches created by older releases keep being used.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pokecache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cache directory used before the platform cache directory was adopted
const LEGACY_CACHE_DIR: &str = ".pokecache";

pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";

pub const DEFAULT_SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub sprite_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

fn no_dir(kind: &str) -> CatalogError {
    CatalogError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("Could not find {} directory", kind),
    ))
}

impl Config {
    /// Load the config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| no_dir("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Configured cache root, or the default one.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match self.cache_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => default_cache_root(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn sprite_base_url(&self) -> &str {
        self.sprite_base_url
            .as_deref()
            .unwrap_or(DEFAULT_SPRITE_BASE_URL)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Same config with the cache root pinned to `dir`.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}

/// `~/.pokecache` if it already exists, otherwise the platform cache dir.
pub fn default_cache_root() -> Result<PathBuf> {
    let home = dirs::home_dir();
    let cache = dirs::cache_dir();
    resolve_cache_root(home, cache).ok_or_else(|| no_dir("cache"))
}

fn resolve_cache_root(home: Option<PathBuf>, cache: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(legacy) = home.map(|h| h.join(LEGACY_CACHE_DIR)) {
        if legacy.is_dir() {
            return Some(legacy);
        }
    }
    cache.map(|c| c.join(APP_NAME))
}
