//! Package index client.
//!
//! Resolves package versions and downloadable artifacts against the
//! PyPI JSON API and fetches release archives to disk. Version lookups
//! go through the file cache so repeated fetches of the same package
//! stay off the network.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::cache::Cache;
use crate::error::RegistryError;

const PYPI_BASE_URL: &str = "https://pypi.org/pypi";

/// One downloadable release artifact resolved from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
    pub url: String,
    pub filename: String,
}

/// A package index that can resolve versions and serve artifacts.
///
/// The one real implementation is [`PyPiRegistry`]; the trait is the
/// seam for exercising fetch flows without a network.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Latest published version of a package.
    async fn latest_version(&self, name: &str) -> Result<String, RegistryError>;

    /// Artifact to download for one exact version. Wheels are preferred
    /// over source distributions when a release publishes both.
    async fn release_info(&self, name: &str, version: &str) -> Result<ReleaseInfo, RegistryError>;

    /// Downloads the artifact into `dir`, returning the written path.
    async fn download(&self, release: &ReleaseInfo, dir: &Path) -> Result<PathBuf, RegistryError>;
}

#[derive(Deserialize)]
struct ProjectResponse {
    info: ProjectInfo,
}

#[derive(Deserialize)]
struct ProjectInfo {
    version: String,
}

#[derive(Deserialize)]
struct ReleaseResponse {
    urls: Vec<ArtifactUrl>,
}

#[derive(Debug, Deserialize)]
struct ArtifactUrl {
    url: String,
    filename: String,
}

/// Picks the artifact to download from a release's published files:
/// the first wheel if any, else the first file listed.
fn select_artifact(urls: &[ArtifactUrl]) -> Option<&ArtifactUrl> {
    urls.iter()
        .find(|u| u.filename.ends_with(".whl"))
        .or_else(|| urls.first())
}

/// Client for the PyPI JSON API.
pub struct PyPiRegistry {
    client: reqwest::Client,
    cache: Cache,
}

impl PyPiRegistry {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Cache::new(),
        }
    }

    pub fn with_cache(cache: Cache) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, RegistryError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RegistryError::request(url, e))?
            .error_for_status()
            .map_err(|e| RegistryError::request(url, e))?;

        response
            .json()
            .await
            .map_err(|e| RegistryError::request(url, e))
    }
}

impl Default for PyPiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for PyPiRegistry {
    async fn latest_version(&self, name: &str) -> Result<String, RegistryError> {
        let cache_key = format!("pypi_version_{}", name);

        // Check cache first
        if let Some(version) = self.cache.get::<String>(&cache_key) {
            debug!(package = name, version = %version, "version from cache");
            return Ok(version);
        }

        let url = format!("{}/{}/json", PYPI_BASE_URL, name);
        let project: ProjectResponse = self.get_json(&url).await?;
        let version = project.info.version;

        // Cache the result
        let _ = self.cache.set(&cache_key, &version);

        Ok(version)
    }

    async fn release_info(&self, name: &str, version: &str) -> Result<ReleaseInfo, RegistryError> {
        let url = format!("{}/{}/{}/json", PYPI_BASE_URL, name, version);
        let release: ReleaseResponse = self.get_json(&url).await?;

        let artifact = select_artifact(&release.urls)
            .ok_or_else(|| RegistryError::no_artifacts(name, version))?;

        Ok(ReleaseInfo {
            version: version.to_string(),
            url: artifact.url.clone(),
            filename: artifact.filename.clone(),
        })
    }

    async fn download(&self, release: &ReleaseInfo, dir: &Path) -> Result<PathBuf, RegistryError> {
        let bytes = self
            .client
            .get(&release.url)
            .send()
            .await
            .map_err(|e| RegistryError::request(&release.url, e))?
            .error_for_status()
            .map_err(|e| RegistryError::request(&release.url, e))?
            .bytes()
            .await
            .map_err(|e| RegistryError::request(&release.url, e))?;

        fs::create_dir_all(dir).map_err(|e| RegistryError::write(dir, e))?;

        // The filename comes from the index; keep it a bare name.
        let name = Path::new(&release.filename)
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("artifact.bin"));
        let target = dir.join(name);

        fs::write(&target, &bytes).map_err(|e| RegistryError::write(&target, e))?;
        debug!(path = %target.display(), bytes = bytes.len(), "artifact written");

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(filename: &str) -> ArtifactUrl {
        ArtifactUrl {
            url: format!("https://files.example/{}", filename),
            filename: filename.to_string(),
        }
    }

    #[test]
    fn test_select_artifact_prefers_wheel() {
        let urls = vec![
            artifact("demo-1.0.tar.gz"),
            artifact("demo-1.0-py3-none-any.whl"),
        ];
        let picked = select_artifact(&urls).unwrap();
        assert_eq!(picked.filename, "demo-1.0-py3-none-any.whl");
    }

    #[test]
    fn test_select_artifact_falls_back_to_first() {
        let urls = vec![artifact("demo-1.0.tar.gz"), artifact("demo-1.0.zip")];
        let picked = select_artifact(&urls).unwrap();
        assert_eq!(picked.filename, "demo-1.0.tar.gz");
    }

    #[test]
    fn test_select_artifact_empty_release() {
        assert!(select_artifact(&[]).is_none());
    }

    #[test]
    fn test_release_response_shape() {
        let json = r#"{
            "info": {"version": "2.31.0"},
            "urls": [
                {"url": "https://files.example/requests-2.31.0.tar.gz",
                 "filename": "requests-2.31.0.tar.gz",
                 "size": 110794},
                {"url": "https://files.example/requests-2.31.0-py3-none-any.whl",
                 "filename": "requests-2.31.0-py3-none-any.whl",
                 "size": 62574}
            ]
        }"#;
        let release: ReleaseResponse = serde_json::from_str(json).unwrap();
        let picked = select_artifact(&release.urls).unwrap();
        assert_eq!(picked.filename, "requests-2.31.0-py3-none-any.whl");
    }

    #[test]
    fn test_project_response_shape() {
        let json = r#"{"info": {"version": "3.0.3", "name": "flask"}}"#;
        let project: ProjectResponse = serde_json::from_str(json).unwrap();
        assert_eq!(project.info.version, "3.0.3");
    }

    struct FixedRegistry;

    #[async_trait]
    impl Registry for FixedRegistry {
        async fn latest_version(&self, _name: &str) -> Result<String, RegistryError> {
            Ok("1.2.3".to_string())
        }

        async fn release_info(
            &self,
            name: &str,
            version: &str,
        ) -> Result<ReleaseInfo, RegistryError> {
            Ok(ReleaseInfo {
                version: version.to_string(),
                url: format!("https://files.example/{}-{}.tar.gz", name, version),
                filename: format!("{}-{}.tar.gz", name, version),
            })
        }

        async fn download(
            &self,
            release: &ReleaseInfo,
            dir: &Path,
        ) -> Result<PathBuf, RegistryError> {
            let target = dir.join(&release.filename);
            fs::create_dir_all(dir).map_err(|e| RegistryError::write(dir, e))?;
            fs::write(&target, b"stub").map_err(|e| RegistryError::write(&target, e))?;
            Ok(target)
        }
    }

    #[tokio::test]
    async fn test_registry_trait_fetch_flow() {
        let registry = FixedRegistry;
        let dir = tempfile::tempdir().unwrap();

        let version = registry.latest_version("demo").await.unwrap();
        let release = registry.release_info("demo", &version).await.unwrap();
        let path = registry.download(&release, dir.path()).await.unwrap();

        assert_eq!(release.filename, "demo-1.2.3.tar.gz");
        assert!(path.is_file());
    }
}
