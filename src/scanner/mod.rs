//! Static keyword scanning over an extracted package tree.
//!
//! The scanner walks every Python source file under a root, tests each
//! line for the literal substrings in [`patterns::INDICATORS`], and
//! reports the first occurrence of each pattern per file together with a
//! three-line context window.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = pkgvet::scanner::scan_tree(Path::new("/tmp/extracted"), None)?;
//! for file in &report.files {
//!     println!("{}: {} findings", file.file_path, file.findings.len());
//! }
//! # Ok::<(), pkgvet::error::AnalyzeError>(())
//! ```

pub mod patterns;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::AnalyzeError;
use crate::model::{FileReport, ScanFinding, ScanReport};

/// Only files with this suffix are scanned; binaries and data files in
/// the archive are ignored.
const SOURCE_SUFFIX: &str = ".py";

/// Scans a single file, returning at most one finding per pattern.
///
/// The content is decoded lossily so undecodable bytes never abort a
/// scan. A file that cannot be read at all is logged and skipped,
/// yielding an empty result.
pub fn scan_file(path: &Path) -> Vec<ScanFinding> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable file");
            return Vec::new();
        }
    };
    scan_text(&String::from_utf8_lossy(&bytes))
}

/// Line loop behind [`scan_file`]: substring containment of every
/// indicator, first occurrence per pattern wins, context is the
/// previous, matching, and next line joined and trimmed.
fn scan_text(text: &str) -> Vec<ScanFinding> {
    let lines: Vec<&str> = text.lines().collect();
    let mut findings: Vec<ScanFinding> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for indicator in &patterns::INDICATORS {
            if !line.contains(indicator.pattern) {
                continue;
            }
            if findings.iter().any(|f| f.pattern == indicator.pattern) {
                continue;
            }
            let start = idx.saturating_sub(1);
            let end = (idx + 2).min(lines.len());
            let context = lines[start..end].join("\n").trim().to_string();
            findings.push(ScanFinding::new(indicator.pattern, idx + 1, context));
        }
    }

    findings
}

/// Scans every source file under `root` sequentially.
///
/// The cancellation flag, when given, is checked between files; a
/// tripped flag aborts with [`AnalyzeError::Cancelled`] instead of
/// returning a partially scored report.
pub fn scan_tree(root: &Path, cancel: Option<&AtomicBool>) -> Result<ScanReport, AnalyzeError> {
    let files = source_files(root);
    let mut reports = Vec::new();

    for path in &files {
        if is_cancelled(cancel) {
            return Err(AnalyzeError::Cancelled);
        }
        let findings = scan_file(path);
        if !findings.is_empty() {
            reports.push(FileReport::new(relative_display(root, path), findings));
        }
    }
    if is_cancelled(cancel) {
        return Err(AnalyzeError::Cancelled);
    }

    Ok(ScanReport::new(reports))
}

/// Concurrent variant of [`scan_tree`]. Each file is independent, and
/// `join_all` keeps input order, so the report is identical to the
/// sequential scan.
pub async fn scan_tree_concurrent(
    root: &Path,
    cancel: Option<&AtomicBool>,
) -> Result<ScanReport, AnalyzeError> {
    let files = source_files(root);

    let scans: Vec<_> = files
        .iter()
        .map(|path| async move {
            if is_cancelled(cancel) {
                return None;
            }
            let findings = scan_file(path);
            if findings.is_empty() {
                None
            } else {
                Some(FileReport::new(relative_display(root, path), findings))
            }
        })
        .collect();

    let results = join_all(scans).await;

    if is_cancelled(cancel) {
        return Err(AnalyzeError::Cancelled);
    }

    Ok(ScanReport::new(results.into_iter().flatten().collect()))
}

/// Scannable files under `root` in lexical order, for reproducible
/// reports.
fn source_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(SOURCE_SUFFIX))
        })
        .collect();
    files.sort();
    files
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_text_first_occurrence_wins() {
        let text = "import sys\nprint('hi')\nx = eval(a) + eval(b)\nexec(y)\nprint('bye')\n";
        let findings = scan_text(text);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].pattern, "eval");
        assert_eq!(findings[0].first_line, 3);
        assert_eq!(findings[0].context, "print('hi')\nx = eval(a) + eval(b)\nexec(y)");
        assert_eq!(findings[1].pattern, "exec");
        assert_eq!(findings[1].first_line, 4);
        assert_eq!(findings[1].context, "x = eval(a) + eval(b)\nexec(y)\nprint('bye')");
    }

    #[test]
    fn test_scan_text_context_clipped_at_boundaries() {
        let findings = scan_text("eval(x)\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].first_line, 1);
        assert_eq!(findings[0].context, "eval(x)");

        let findings = scan_text("a = 1\nb = 2\nsocket.connect()");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].first_line, 3);
        assert_eq!(findings[0].context, "b = 2\nsocket.connect()");
    }

    #[test]
    fn test_scan_text_repeated_pattern_on_later_lines() {
        let text = "eval(a)\nplain\neval(b)\n";
        let findings = scan_text(text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].first_line, 1);
    }

    #[test]
    fn test_scan_text_clean_input() {
        assert!(scan_text("x = 1\ny = x + 2\n").is_empty());
        assert!(scan_text("").is_empty());
    }

    #[test]
    fn test_scan_file_missing_file_is_empty() {
        let findings = scan_file(Path::new("/nonexistent/module.py"));
        assert!(findings.is_empty());
    }

    #[test]
    fn test_scan_tree_collects_only_files_with_findings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("pkg/clean.py"), "x = 1\n").unwrap();
        std::fs::write(
            dir.path().join("pkg/risky.py"),
            "import socket\ndata = eval(blob)\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "eval everywhere\n").unwrap();

        let report = scan_tree(dir.path(), None).unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].file_path, "pkg/risky.py");
        assert_eq!(report.files[0].findings.len(), 2);
    }

    #[test]
    fn test_scan_tree_deterministic_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.py"), "import pickle\n").unwrap();
        std::fs::write(dir.path().join("a.py"), "import socket\n").unwrap();
        std::fs::write(dir.path().join("c.py"), "import base64\n").unwrap();

        let report = scan_tree(dir.path(), None).unwrap();
        let order: Vec<&str> = report.files.iter().map(|f| f.file_path.as_str()).collect();
        assert_eq!(order, vec!["a.py", "b.py", "c.py"]);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "import socket\neval(x)\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "import pickle\n").unwrap();
        std::fs::write(dir.path().join("c.py"), "clean = True\n").unwrap();

        let sequential = scan_tree(dir.path(), None).unwrap();
        let concurrent = scan_tree_concurrent(dir.path(), None).await.unwrap();

        assert_eq!(sequential.files, concurrent.files);
        assert_eq!(sequential.risk, concurrent.risk);
    }

    #[test]
    fn test_scan_tree_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "eval(x)\n").unwrap();

        let cancel = AtomicBool::new(true);
        let result = scan_tree(dir.path(), Some(&cancel));
        assert!(matches!(result, Err(AnalyzeError::Cancelled)));
    }
}
