use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning an archive into an extracted file tree.
///
/// Extraction is the only phase that aborts an analysis; parsing and
/// scanning degrade to empty results instead of failing.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported archive format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to open archive '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to unpack archive '{path}': {source}")]
    Unpack {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read archive '{path}': {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("failed to create extraction directory: {source}")]
    TempDir { source: std::io::Error },
}

impl ExtractError {
    pub fn unsupported_format(path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat { path: path.into() }
    }

    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn unpack(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unpack {
            path: path.into(),
            source,
        }
    }

    pub fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

/// Errors surfaced by the top-level analysis workflow.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("analysis cancelled")]
    Cancelled,
}

/// Errors from the package registry client.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("no downloadable artifacts for {name} {version}")]
    NoArtifacts { name: String, version: String },

    #[error("failed to write artifact '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RegistryError {
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source,
        }
    }

    pub fn no_artifacts(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NoArtifacts {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
