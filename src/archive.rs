//! Archive format detection and extraction.
//!
//! Supports the two distribution containers this tool vets: gzip
//! compressed tar source distributions (`.tar.gz`) and zip containers
//! (`.whl`, `.zip`). Extraction lands in a fresh temporary directory
//! owned by the returned [`ExtractedTree`], which removes it on drop.
//! [`read_members`] gives the metadata layer a uniform (name, text)
//! view of an archive without unpacking it.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// Maximum decompressed size per archive member (512 MB). Guards
/// against decompression bombs in attacker-supplied archives.
const MAX_MEMBER_SIZE: u64 = 512 * 1024 * 1024;

/// Archive container format, detected from the filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar source distribution.
    Sdist,
    /// Zip container holding prebuilt contents plus a metadata file.
    Wheel,
}

impl ArchiveFormat {
    /// Detects the format from a path. Returns `None` for any suffix
    /// other than `.tar.gz`, `.whl`, or `.zip`.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".tar.gz") {
            Some(ArchiveFormat::Sdist)
        } else if name.ends_with(".whl") || name.ends_with(".zip") {
            Some(ArchiveFormat::Wheel)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Sdist => "sdist",
            ArchiveFormat::Wheel => "wheel",
        }
    }
}

/// An archive's contents unpacked into a private temporary directory.
///
/// The directory is deleted when the value drops, on every exit path.
/// [`keep`](Self::keep) hands ownership of the directory to the caller
/// instead.
#[derive(Debug)]
pub struct ExtractedTree {
    dir: TempDir,
}

impl ExtractedTree {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Disables cleanup and returns the directory path, for callers
    /// that want to inspect the tree after analysis.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

/// Name and decoded text of one archive member.
#[derive(Debug, Clone)]
pub struct MemberText {
    pub name: String,
    pub text: String,
}

/// Unpacks the archive at `path` into a fresh temporary directory.
///
/// Fails when the suffix is unrecognized, the archive cannot be opened
/// or decoded, or the temporary directory cannot be created. A partial
/// tree is never returned; on failure the directory is already gone.
pub fn extract(path: &Path) -> Result<ExtractedTree, ExtractError> {
    let format =
        ArchiveFormat::detect(path).ok_or_else(|| ExtractError::unsupported_format(path))?;

    let dir = tempfile::Builder::new()
        .prefix("pkgvet-")
        .tempdir()
        .map_err(|e| ExtractError::TempDir { source: e })?;

    match format {
        ArchiveFormat::Sdist => unpack_tar_gz(path, dir.path())?,
        ArchiveFormat::Wheel => unpack_zip(path, dir.path())?,
    }

    debug!(
        archive = %path.display(),
        format = format.as_str(),
        target = %dir.path().display(),
        "extracted archive"
    );
    Ok(ExtractedTree { dir })
}

/// Reads the text of every member whose path satisfies `select`,
/// without unpacking the archive to disk.
///
/// Individual member failures (unreadable entry, undecodable name) are
/// logged and skipped; only failure to open the archive itself is an
/// error. Member text is decoded lossily and capped at
/// [`MAX_MEMBER_SIZE`].
pub fn read_members<F>(path: &Path, select: F) -> Result<Vec<MemberText>, ExtractError>
where
    F: Fn(&str) -> bool,
{
    let format =
        ArchiveFormat::detect(path).ok_or_else(|| ExtractError::unsupported_format(path))?;

    match format {
        ArchiveFormat::Sdist => read_tar_members(path, select),
        ArchiveFormat::Wheel => read_zip_members(path, select),
    }
}

fn unpack_tar_gz(path: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = fs::File::open(path).map_err(|e| ExtractError::open(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(dest).map_err(|e| ExtractError::unpack(path, e))
}

fn unpack_zip(path: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = fs::File::open(path).map_err(|e| ExtractError::open(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::zip(path, e))?;

    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| ExtractError::zip(path, e))?;
        let name = entry.name().to_string();

        if !is_safe_member_name(&name) {
            warn!(member = %name, "skipping archive member with unsafe path");
            continue;
        }
        if entry.size() > MAX_MEMBER_SIZE {
            warn!(member = %name, size = entry.size(), "skipping oversized archive member");
            continue;
        }

        let out_path = dest.join(&name);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| ExtractError::unpack(path, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExtractError::unpack(path, e))?;
        }

        let mut out = fs::File::create(&out_path).map_err(|e| ExtractError::unpack(path, e))?;
        let mut limited = entry.take(MAX_MEMBER_SIZE);
        io::copy(&mut limited, &mut out).map_err(|e| ExtractError::unpack(path, e))?;
    }

    Ok(())
}

/// Rejects member names that could land outside the extraction root.
fn is_safe_member_name(name: &str) -> bool {
    !(name.contains("..") || name.starts_with('/') || name.starts_with('\\'))
}

fn read_tar_members<F>(path: &Path, select: F) -> Result<Vec<MemberText>, ExtractError>
where
    F: Fn(&str) -> bool,
{
    let file = fs::File::open(path).map_err(|e| ExtractError::open(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let entries = archive.entries().map_err(|e| ExtractError::unpack(path, e))?;

    let mut members = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "skipping unreadable tar member");
                continue;
            }
        };
        let name = match entry.path() {
            Ok(p) => p.to_string_lossy().into_owned(),
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "skipping tar member with bad path");
                continue;
            }
        };
        if !select(&name) {
            continue;
        }

        let mut buf = Vec::new();
        match entry.take(MAX_MEMBER_SIZE).read_to_end(&mut buf) {
            Ok(_) => members.push(MemberText {
                name,
                text: String::from_utf8_lossy(&buf).into_owned(),
            }),
            Err(e) => {
                warn!(member = %name, error = %e, "skipping unreadable tar member");
            }
        }
    }

    Ok(members)
}

fn read_zip_members<F>(path: &Path, select: F) -> Result<Vec<MemberText>, ExtractError>
where
    F: Fn(&str) -> bool,
{
    let file = fs::File::open(path).map_err(|e| ExtractError::open(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::zip(path, e))?;

    let mut members = Vec::new();
    for i in 0..archive.len() {
        let entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(archive = %path.display(), error = %e, "skipping unreadable zip member");
                continue;
            }
        };
        let name = entry.name().to_string();
        if entry.is_dir() || !select(&name) {
            continue;
        }

        let mut buf = Vec::new();
        match entry.take(MAX_MEMBER_SIZE).read_to_end(&mut buf) {
            Ok(_) => members.push(MemberText {
                name,
                text: String::from_utf8_lossy(&buf).into_owned(),
            }),
            Err(e) => {
                warn!(member = %name, error = %e, "skipping unreadable zip member");
            }
        }
    }

    Ok(members)
}

/// Fixture builders shared by tests across the crate.
#[cfg(test)]
pub(crate) mod testutil {
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    pub fn write_sdist(path: &Path, files: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    pub fn write_wheel(path: &Path, files: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
}
