//! File-based caching for registry responses.
//!
//! A simple file-based cache with TTL (time-to-live) support, used to
//! cache version lookups so repeated fetches do not hammer the package
//! index.
//!
//! # Cache Location
//!
//! The cache is stored in platform-specific directories:
//! - Linux: `~/.cache/pkgvet/`
//! - macOS: `~/Library/Caches/pkgvet/`
//! - Windows: `%LOCALAPPDATA%\pkgvet\`
//!
//! # Example
//!
//! ```no_run
//! use pkgvet::Cache;
//!
//! let cache = Cache::new();
//!
//! // Store a value
//! cache.set("pypi_version_flask", &"3.0.3".to_string()).unwrap();
//!
//! // Retrieve it later (within TTL)
//! let value: Option<String> = cache.get("pypi_version_flask");
//! assert_eq!(value, Some("3.0.3".to_string()));
//! ```

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Default cache TTL in seconds (24 hours).
const CACHE_TTL_SECONDS: u64 = 24 * 3600;

fn default_dir() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(env::temp_dir).join("pkgvet")
}

/// A file-based cache with TTL support.
///
/// Values are stored as JSON files in the cache directory. Each entry
/// expires after the configured TTL period, measured from the file's
/// modification time.
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    /// Creates a new cache with the default 24-hour TTL.
    pub fn new() -> Self {
        Self {
            dir: default_dir(),
            ttl: Duration::from_secs(CACHE_TTL_SECONDS),
        }
    }

    /// Creates a new cache with a custom TTL.
    ///
    /// # Example
    ///
    /// ```
    /// use pkgvet::Cache;
    ///
    /// // Cache that expires after 1 hour
    /// let cache = Cache::with_ttl_seconds(3600);
    /// ```
    pub fn with_ttl_seconds(seconds: u64) -> Self {
        Self {
            dir: default_dir(),
            ttl: Duration::from_secs(seconds),
        }
    }

    /// Creates a cache rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Ensures the cache directory exists.
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Converts a cache key to a safe filename.
    fn cache_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, has expired, or cannot
    /// be deserialized. Expired entries are removed on read.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);

        if !path.exists() {
            return None;
        }

        if let Ok(metadata) = fs::metadata(&path) {
            if let Ok(modified) = metadata.modified() {
                if let Ok(elapsed) = SystemTime::now().duration_since(modified) {
                    if elapsed > self.ttl {
                        let _ = fs::remove_file(&path);
                        return None;
                    }
                }
            }
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Stores a value in the cache.
    ///
    /// The value is serialized to JSON and written to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or
    /// the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Clears all cached entries.
    ///
    /// This removes all JSON files from the cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}
