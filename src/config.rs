//! Configuration file handling.
//!
//! This module provides loading and saving of pkgvet configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/pkgvet/config.toml`
//! - macOS: `~/Library/Application Support/pkgvet/config.toml`
//! - Windows: `%APPDATA%\pkgvet\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_format = "table"
//! download_dir = "downloaded_packages"
//! cache_ttl_seconds = 86400
//! parallel_scan = false
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// This struct represents all configurable options for pkgvet.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use pkgvet::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Cache TTL: {} seconds", config.cache_ttl_seconds);
/// println!("Downloads: {}", config.download_dir.display());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Where fetched archives are written when no `--dir` flag is
    /// provided.
    ///
    /// Default: "downloaded_packages"
    pub download_dir: PathBuf,

    /// How long to cache registry responses, in seconds.
    ///
    /// Default: 86400 (24 hours)
    pub cache_ttl_seconds: u64,

    /// Whether to scan files concurrently when no `--parallel` flag is
    /// provided.
    ///
    /// Default: false (sequential scanning)
    pub parallel_scan: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: "table".to_string(),
            download_dir: PathBuf::from("downloaded_packages"),
            cache_ttl_seconds: 24 * 3600,
            parallel_scan: false,
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pkgvet::Config;
    ///
    /// let config = Config::load()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use pkgvet::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pkgvet")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    ///
    /// This is useful for showing users what the default config looks like.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
