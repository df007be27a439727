use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use thiserror::Error;
use tracing::debug;

/// Document store file name inside the cache root
const API_CACHE_FILE: &str = "api.cache";

/// Sprite directory name inside the cache root
const SPRITE_DIR: &str = "sprite";

/// Suffix of a sprite file still being written
const PARTIAL_SUFFIX: &str = ".part";

/// How long a store call waits on another writer before giving up.
const BUSY_TIMEOUT_MS: u64 = 250;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No cache entry for '{0}'")]
    NotFound(String),

    #[error("Cannot cache value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cached document is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Value handed to `CacheStore::save`.
#[derive(Debug, Clone, Copy)]
pub enum CacheValue<'a> {
    Document(&'a serde_json::Value),
    Blob(&'a [u8]),
}

impl CacheValue<'_> {
    /// Nothing worth persisting.
    fn is_empty(&self) -> bool {
        match self {
            CacheValue::Document(serde_json::Value::Null) => true,
            CacheValue::Document(serde_json::Value::Object(map)) => map.is_empty(),
            CacheValue::Document(serde_json::Value::Array(items)) => items.is_empty(),
            CacheValue::Document(_) => false,
            CacheValue::Blob(bytes) => bytes.is_empty(),
        }
    }
}

/// Resolved absolute locations of the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub root: PathBuf,
    pub api_cache: PathBuf,
    pub sprite_cache: PathBuf,
}

impl CachePaths {
    fn resolve(root: &Path) -> Result<Self, CacheError> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        let sprite_cache = root.join(SPRITE_DIR);
        std::fs::create_dir_all(&sprite_cache)?;
        Ok(Self {
            api_cache: root.join(API_CACHE_FILE),
            sprite_cache,
            root,
        })
    }
}

/// When a document was written to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub key: String,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntryInfo {
    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub documents: usize,
    pub sprites: usize,
    pub last_cached_at: Option<DateTime<Utc>>,
}

/// Persistent key-value cache rooted at one directory.
///
/// Every call opens its own connection and drops it before returning, so
/// several stores (or processes) may point at the same root.
#[derive(Debug, Clone)]
pub struct CacheStore {
    paths: CachePaths,
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl CacheStore {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Result<Self, CacheError> {
        let paths = CachePaths::resolve(root.as_ref())?;
        debug!(root = %paths.root.display(), "Cache root ready");
        Ok(Self { paths })
    }

    /// Move this store to a new root. Call before the first save or load,
    /// otherwise earlier entries stay behind in the old root.
    pub fn set_root(&mut self, root: impl AsRef<Path>) -> Result<CachePaths, CacheError> {
        self.paths = CachePaths::resolve(root.as_ref())?;
        debug!(root = %self.paths.root.display(), "Cache root changed");
        Ok(self.paths.clone())
    }

    pub fn paths(&self) -> &CachePaths {
        &self.paths
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.paths.api_cache)?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                key       TEXT NOT NULL PRIMARY KEY,
                body      TEXT NOT NULL,
                cached_at TEXT NOT NULL
            );",
        )?;
        Ok(conn)
    }

    /// Store `value` under `key`.
    ///
    /// Empty values are skipped, scalar documents are rejected, and a locked
    /// store skips the save without reporting an error.
    pub fn save(&self, key: &str, value: CacheValue<'_>) -> Result<(), CacheError> {
        if value.is_empty() {
            debug!(key = key, "Skipping save of empty value");
            return Ok(());
        }

        match value {
            CacheValue::Document(doc) => {
                if !(doc.is_object() || doc.is_array()) {
                    return Err(CacheError::InvalidValue {
                        key: key.to_string(),
                        reason: "only JSON objects and arrays can be cached".to_string(),
                    });
                }
                self.save_document(key, doc)
            }
            CacheValue::Blob(bytes) => self.save_blob(key, bytes),
        }
    }

    fn save_document(&self, key: &str, doc: &serde_json::Value) -> Result<(), CacheError> {
        let body = serde_json::to_string(doc)?;
        let cached_at = Utc::now().to_rfc3339();

        let result = self.connect().and_then(|conn| {
            conn.execute(
                "INSERT INTO documents (key, body, cached_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    body      = excluded.body,
                    cached_at = excluded.cached_at",
                params![key, body, cached_at],
            )
        });

        match result {
            Ok(_) => {
                debug!(key = key, bytes = body.len(), "Cached document");
                Ok(())
            }
            Err(e) if is_busy(&e) => {
                debug!(key = key, "Cache locked, skipping save");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save_blob(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.blob_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Only complete files ever appear at the final path
        let tmp_path = partial_path(&path);
        if let Err(e) = write_synced(&tmp_path, bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        std::fs::rename(&tmp_path, &path)?;

        debug!(key = key, bytes = bytes.len(), "Cached sprite");
        Ok(())
    }

    /// Stored document for `key`. A locked store reads as `NotFound`.
    pub fn load_document(&self, key: &str) -> Result<serde_json::Value, CacheError> {
        if !self.paths.api_cache.exists() {
            return Err(CacheError::NotFound(key.to_string()));
        }

        let result = self.connect().and_then(|conn| {
            conn.query_row(
                "SELECT body FROM documents WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
        });

        match result {
            Ok(Some(body)) => Ok(serde_json::from_str(&body)?),
            Ok(None) => Err(CacheError::NotFound(key.to_string())),
            Err(e) if is_busy(&e) => {
                debug!(key = key, "Cache locked, treating as miss");
                Err(CacheError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bytes of the sprite stored under `key`; a missing file is `NotFound`.
    pub fn load_blob(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        match std::fs::read(self.blob_path(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CacheError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Absolute path a sprite key maps to, whether or not it exists yet.
    pub fn blob_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.paths.sprite_cache.clone(), |path, segment| path.join(segment))
    }

    /// When the document under `key` was cached, if it is.
    pub fn entry(&self, key: &str) -> Result<Option<CacheEntryInfo>, CacheError> {
        if !self.paths.api_cache.exists() {
            return Ok(None);
        }
        let conn = self.connect()?;
        let cached_at: Option<String> = conn
            .query_row(
                "SELECT cached_at FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(cached_at.and_then(|raw| {
            parse_timestamp(&raw).map(|cached_at| CacheEntryInfo {
                key: key.to_string(),
                cached_at,
            })
        }))
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats {
            sprites: count_files(&self.paths.sprite_cache)?,
            ..CacheStats::default()
        };

        if self.paths.api_cache.exists() {
            let conn = self.connect()?;
            let (count, latest): (i64, Option<String>) = conn.query_row(
                "SELECT COUNT(*), MAX(cached_at) FROM documents",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            stats.documents = count as usize;
            stats.last_cached_at = latest.as_deref().and_then(parse_timestamp);
        }

        Ok(stats)
    }
}

/// Sibling of `path` used while its contents are being written.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn count_files(dir: &Path) -> Result<usize, CacheError> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut total = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            total += count_files(&path)?;
        } else {
            total += 1;
        }
    }
    Ok(total)
}

// ============================================================================
// Tests
// ============================================================================
