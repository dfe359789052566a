use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::risk::RiskScore;

/// Descriptive fields and declared dependencies extracted from a package
/// archive. Every field is optional: registries hold plenty of partial or
/// malformed archives, and partial metadata is still worth reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Resolved with Author taking precedence over Maintainer; absent when
    /// neither field carried a usable value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deduplicated union across all declaring members, in stable order.
    pub dependencies: BTreeSet<String>,
}

impl PackageMetadata {
    pub fn author_or_default(&self) -> &str {
        self.author.as_deref().unwrap_or("Not specified")
    }
}

/// One indicator pattern detected in one file. Only the first occurrence
/// is kept, with a context window of the line before, the matching line,
/// and the line after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFinding {
    pub pattern: String,
    /// 1-based line number of the first occurrence.
    pub first_line: usize,
    pub context: String,
}

impl ScanFinding {
    pub fn new(pattern: impl Into<String>, first_line: usize, context: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            first_line,
            context: context.into(),
        }
    }
}

/// Findings for a single file. Files with no findings never appear in a
/// report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Path relative to the extraction root.
    pub file_path: String,
    pub findings: Vec<ScanFinding>,
}

impl FileReport {
    pub fn new(file_path: impl Into<String>, findings: Vec<ScanFinding>) -> Self {
        Self {
            file_path: file_path.into(),
            findings,
        }
    }
}

/// All implicated files plus the risk score derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub files: Vec<FileReport>,
    pub risk: RiskScore,
}

impl ScanReport {
    /// Builds a report from per-file findings, deriving the risk score.
    /// The score is never stored apart from the findings it came from.
    pub fn new(files: Vec<FileReport>) -> Self {
        let risk = crate::risk::score(&files);
        Self { files, risk }
    }

    pub fn total_findings(&self) -> usize {
        self.files.iter().map(|f| f.findings.len()).sum()
    }
}

/// Complete output of one analysis invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub archive: PathBuf,
    pub metadata: PackageMetadata,
    pub scan: ScanReport,
    pub analyzed_at: DateTime<Utc>,
    /// Set when the caller asked to keep the extracted tree on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retained_tree: Option<PathBuf>,
}

impl AnalysisReport {
    pub fn new(archive: PathBuf, metadata: PackageMetadata, scan: ScanReport) -> Self {
        Self {
            archive,
            metadata,
            scan,
            analyzed_at: Utc::now(),
            retained_tree: None,
        }
    }

    pub fn with_retained_tree(mut self, path: PathBuf) -> Self {
        self.retained_tree = Some(path);
        self
    }
}
