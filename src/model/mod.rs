//! Core data types for package metadata, scan findings, and reports.
//!
//! This module contains the fundamental types used throughout pkgvet:
//!
//! - [`PackageMetadata`] - Descriptive fields and declared dependencies
//! - [`ScanFinding`] - One detected indicator pattern in one file
//! - [`FileReport`] - All findings for a single file
//! - [`ScanReport`] - Findings across the whole tree plus the derived risk
//! - [`AnalysisReport`] - Complete analysis output for one archive
//!
//! # Example
//!
//! ```
//! use pkgvet::model::{FileReport, ScanFinding, ScanReport};
//!
//! let finding = ScanFinding::new("eval", 3, "data = eval(payload)");
//! let report = ScanReport::new(vec![FileReport::new("setup.py", vec![finding])]);
//!
//! println!("{} findings, risk {}", report.total_findings(), report.risk);
//! ```

mod report;

pub use report::*;
