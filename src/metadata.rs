//! Metadata and dependency extraction from package archives.
//!
//! Three semi-structured text formats feed this module: requirements
//! files, `setup.py` build scripts, and the RFC-822 style descriptor
//! blocks in `PKG-INFO` / `METADATA` members. All parsing degrades to
//! empty results on malformed input; registries are full of partial
//! archives and partial metadata is still worth reporting.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::archive::{self, ArchiveFormat};
use crate::model::PackageMetadata;

static INSTALL_REQUIRES_RE: OnceLock<Regex> = OnceLock::new();

fn install_requires_re() -> &'static Regex {
    INSTALL_REQUIRES_RE.get_or_init(|| {
        Regex::new(r"(?s)install_requires\s*=\s*\[(.*?)\]").expect("static pattern compiles")
    })
}

/// Parses a requirements file: one dependency per non-empty,
/// non-comment line, trimmed.
pub fn parse_requirements(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Pulls dependencies out of the first `install_requires = [...]`
/// literal in a build script. This is pattern matching, not Python
/// parsing: only the first list is read, entries are comma-split, and
/// surrounding whitespace and quotes are stripped.
pub fn parse_setup_script(text: &str) -> Vec<String> {
    let list = match install_requires_re().captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => return Vec::new(),
    };

    list.split(',')
        .map(|entry| entry.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses wheel metadata dependency lines: everything after the
/// `Requires-Dist: ` prefix, kept verbatim.
pub fn parse_wheel_requires(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("Requires-Dist: "))
        .map(str::to_string)
        .collect()
}

/// Parses the descriptive fields of a `PKG-INFO` / `METADATA` block.
///
/// Recognized prefixes are `Name: `, `Version: `, `Author: `,
/// `Maintainer: `, and `Summary: `; anything else is ignored. For every
/// field the first usable value wins. The author is the first non-empty,
/// non-`UNKNOWN` `Author:` value, falling back to `Maintainer:` under
/// the same rule, else absent.
pub fn parse_descriptor(text: &str) -> PackageMetadata {
    let mut metadata = PackageMetadata::default();
    let mut author: Option<String> = None;
    let mut maintainer: Option<String> = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Name: ") {
            set_field(&mut metadata.name, rest);
        } else if let Some(rest) = line.strip_prefix("Version: ") {
            set_field(&mut metadata.version, rest);
        } else if let Some(rest) = line.strip_prefix("Author: ") {
            set_person(&mut author, rest);
        } else if let Some(rest) = line.strip_prefix("Maintainer: ") {
            set_person(&mut maintainer, rest);
        } else if let Some(rest) = line.strip_prefix("Summary: ") {
            set_field(&mut metadata.description, rest);
        }
    }

    metadata.author = author.or(maintainer);
    metadata
}

fn set_field(slot: &mut Option<String>, value: &str) {
    if slot.is_some() {
        return;
    }
    let value = value.trim();
    if !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

fn set_person(slot: &mut Option<String>, value: &str) {
    if slot.is_some() {
        return;
    }
    let value = value.trim();
    if !value.is_empty() && value != "UNKNOWN" {
        *slot = Some(value.to_string());
    }
}

/// Extracts metadata and declared dependencies from an archive.
///
/// For source distributions the members whose paths contain
/// `requirements.txt`, `setup.py`, or `PKG-INFO` contribute; for
/// wheels, every member ending in `METADATA`. Dependencies from all
/// contributing members are unioned. This never fails: an unreadable
/// archive or one with no matching members yields empty metadata,
/// logged rather than raised.
pub fn extract_metadata(path: &Path) -> PackageMetadata {
    match ArchiveFormat::detect(path) {
        Some(ArchiveFormat::Sdist) => sdist_metadata(path),
        Some(ArchiveFormat::Wheel) => wheel_metadata(path),
        None => {
            warn!(archive = %path.display(), "unrecognized archive format, no metadata");
            PackageMetadata::default()
        }
    }
}

fn sdist_metadata(path: &Path) -> PackageMetadata {
    let members = match archive::read_members(path, |name| {
        name.contains("requirements.txt") || name.contains("setup.py") || name.contains("PKG-INFO")
    }) {
        Ok(members) => members,
        Err(e) => {
            warn!(archive = %path.display(), error = %e, "could not read members for metadata");
            return PackageMetadata::default();
        }
    };

    let mut metadata = PackageMetadata::default();
    for member in &members {
        if member.name.contains("requirements.txt") {
            metadata.dependencies.extend(parse_requirements(&member.text));
        } else if member.name.contains("setup.py") {
            metadata.dependencies.extend(parse_setup_script(&member.text));
        } else if member.name.contains("PKG-INFO") {
            merge_descriptor(&mut metadata, parse_descriptor(&member.text));
        }
    }
    metadata
}

fn wheel_metadata(path: &Path) -> PackageMetadata {
    let members = match archive::read_members(path, |name| name.ends_with("METADATA")) {
        Ok(members) => members,
        Err(e) => {
            warn!(archive = %path.display(), error = %e, "could not read members for metadata");
            return PackageMetadata::default();
        }
    };

    let mut metadata = PackageMetadata::default();
    for member in &members {
        metadata
            .dependencies
            .extend(parse_wheel_requires(&member.text));
        merge_descriptor(&mut metadata, parse_descriptor(&member.text));
    }
    metadata
}

/// Folds a descriptor fragment into the accumulated metadata; the
/// first member to supply a field keeps it.
fn merge_descriptor(metadata: &mut PackageMetadata, fragment: PackageMetadata) {
    metadata.name = metadata.name.take().or(fragment.name);
    metadata.version = metadata.version.take().or(fragment.version);
    metadata.author = metadata.author.take().or(fragment.author);
    metadata.description = metadata.description.take().or(fragment.description);
}
