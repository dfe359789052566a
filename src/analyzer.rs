//! End-to-end analysis of a single package archive.
//!
//! [`analyze`] is the one entry point the CLI and library callers use:
//! extract the archive into a scoped temp directory, pull metadata out
//! of the declaring members, scan the extracted sources, and assemble
//! everything into an [`AnalysisReport`]. The temp directory is removed
//! when analysis finishes, including on every error path, unless the
//! caller explicitly asks to keep it.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AnalyzeError;
use crate::model::AnalysisReport;
use crate::{archive, metadata, scanner};

/// Knobs for a single [`analyze`] call.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Scan files concurrently instead of one at a time. The report is
    /// identical either way.
    pub parallel: bool,
    /// Keep the extracted tree on disk and record its path in the
    /// report instead of removing it.
    pub keep_tree: bool,
    /// Cooperative cancellation flag, checked between files during the
    /// scan.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Analyzes one package archive: extraction, metadata, scan, score.
///
/// Metadata extraction never fails; a malformed or partial archive
/// yields empty metadata and the scan still runs. Extraction and scan
/// errors abort the analysis, dropping the temp tree on the way out.
pub async fn analyze(
    archive_path: &Path,
    options: &AnalyzeOptions,
) -> Result<AnalysisReport, AnalyzeError> {
    info!(archive = %archive_path.display(), "analyzing package archive");

    let tree = archive::extract(archive_path)?;
    let package = metadata::extract_metadata(archive_path);

    let cancel = options.cancel.as_deref();
    let scan = if options.parallel {
        scanner::scan_tree_concurrent(tree.path(), cancel).await?
    } else {
        scanner::scan_tree(tree.path(), cancel)?
    };

    info!(
        files = scan.files.len(),
        findings = scan.total_findings(),
        risk = %scan.risk,
        "analysis complete"
    );

    let report = AnalysisReport::new(archive_path.to_path_buf(), package, scan);
    if options.keep_tree {
        let retained = tree.keep();
        debug!(path = %retained.display(), "retained extracted tree");
        return Ok(report.with_retained_tree(retained));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::testutil::{write_sdist, write_wheel};
    use crate::error::ExtractError;
    use crate::risk::RiskScore;
    use std::sync::atomic::Ordering;

    fn risky_sdist(dir: &Path) -> std::path::PathBuf {
        let archive = dir.join("demo-1.0.tar.gz");
        write_sdist(
            &archive,
            &[
                (
                    "demo-1.0/PKG-INFO",
                    "Name: demo\nVersion: 1.0\nAuthor: Jane Doe\nSummary: Demo\n",
                ),
                ("demo-1.0/requirements.txt", "requests>=2.0\n"),
                (
                    "demo-1.0/demo/loader.py",
                    "import base64\npayload = input()\neval(payload)\n",
                ),
            ],
        );
        archive
    }

    #[tokio::test]
    async fn test_analyze_sdist_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let archive = risky_sdist(dir.path());

        let report = analyze(&archive, &AnalyzeOptions::default()).await.unwrap();
        assert_eq!(report.metadata.name.as_deref(), Some("demo"));
        assert!(report.metadata.dependencies.contains("requests>=2.0"));
        assert_eq!(report.scan.files.len(), 1);
        assert_eq!(report.scan.files[0].file_path, "demo-1.0/demo/loader.py");
        assert_eq!(report.scan.risk, RiskScore::High);
        assert_eq!(report.retained_tree, None);
    }

    #[tokio::test]
    async fn test_analyze_wheel_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("demo-1.0-py3-none-any.whl");
        write_wheel(
            &archive,
            &[
                (
                    "demo-1.0.dist-info/METADATA",
                    "Name: demo\nVersion: 1.0\nRequires-Dist: click\n",
                ),
                ("demo/__init__.py", "VERSION = \"1.0\"\n"),
            ],
        );

        let report = analyze(&archive, &AnalyzeOptions::default()).await.unwrap();
        assert_eq!(report.metadata.version.as_deref(), Some("1.0"));
        assert!(report.scan.files.is_empty());
        assert_eq!(report.scan.risk, RiskScore::Moderate);
    }

    #[tokio::test]
    async fn test_analyze_parallel_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let archive = risky_sdist(dir.path());

        let sequential = analyze(&archive, &AnalyzeOptions::default()).await.unwrap();
        let parallel = analyze(
            &archive,
            &AnalyzeOptions {
                parallel: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(sequential.scan.files, parallel.scan.files);
        assert_eq!(sequential.scan.risk, parallel.scan.risk);
    }

    #[tokio::test]
    async fn test_analyze_keep_tree_retains_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let archive = risky_sdist(dir.path());

        let report = analyze(
            &archive,
            &AnalyzeOptions {
                keep_tree: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let retained = report.retained_tree.expect("tree path recorded");
        assert!(retained.join("demo-1.0/demo/loader.py").is_file());
        std::fs::remove_dir_all(&retained).unwrap();
    }

    #[tokio::test]
    async fn test_analyze_missing_archive_errors() {
        let err = analyze(
            Path::new("/nonexistent/demo.tar.gz"),
            &AnalyzeOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::Extract(ExtractError::Open { .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze_unsupported_format_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.rar");
        std::fs::write(&path, b"not an archive").unwrap();

        let err = analyze(&path, &AnalyzeOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::Extract(ExtractError::UnsupportedFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze_cancelled_before_scan() {
        let dir = tempfile::tempdir().unwrap();
        let archive = risky_sdist(dir.path());

        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);

        let err = analyze(
            &archive,
            &AnalyzeOptions {
                cancel: Some(flag),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalyzeError::Cancelled));
    }
}
