use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use crate::model::AnalysisReport;
use crate::risk::RiskScore;
use crate::scanner::patterns;

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Line")]
    line: usize,
    #[tabled(rename = "Context")]
    context: String,
}

#[derive(Tabled)]
struct PatternRow {
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Critical")]
    critical: String,
}

pub fn print_cli_table(report: &AnalysisReport) -> Result<()> {
    println!();
    println!(
        "Analyzed at: {}",
        report.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Archive: {}", report.archive.display());
    println!();

    print_metadata(report);

    // Findings table
    if report.scan.files.is_empty() {
        println!("No suspicious patterns found.");
    } else {
        println!(
            "Found {} suspicious patterns in {} files:",
            report.scan.total_findings(),
            report.scan.files.len()
        );
        println!();

        let rows: Vec<FindingRow> = report
            .scan
            .files
            .iter()
            .flat_map(|file| {
                file.findings.iter().map(move |finding| FindingRow {
                    file: truncate(&file.file_path, 32),
                    pattern: finding.pattern.clone(),
                    category: category_name(&finding.pattern),
                    line: finding.first_line,
                    context: truncate(&single_line(&finding.context), 48),
                })
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    if let Some(tree) = &report.retained_tree {
        println!();
        println!("Extracted tree kept at: {}", tree.display());
    }

    // Summary
    println!();
    print_summary(report);

    Ok(())
}

/// Prints the indicator table for the `patterns` subcommand.
pub fn print_patterns() {
    let rows: Vec<PatternRow> = patterns::INDICATORS
        .iter()
        .map(|indicator| PatternRow {
            pattern: indicator.pattern.to_string(),
            category: indicator.category.as_str().to_string(),
            critical: if patterns::is_critical(indicator.pattern) {
                "yes".to_string()
            } else {
                "-".to_string()
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    println!(
        "{} patterns, {} critical.",
        patterns::INDICATORS.len(),
        patterns::CRITICAL_PATTERNS.len()
    );
}

fn print_metadata(report: &AnalysisReport) {
    let metadata = &report.metadata;

    println!("Package information:");
    println!("  Name: {}", metadata.name.as_deref().unwrap_or("-"));
    println!("  Version: {}", metadata.version.as_deref().unwrap_or("-"));
    println!("  Author: {}", metadata.author_or_default());
    if let Some(description) = &metadata.description {
        println!("  Description: {}", truncate(description, 70));
    }

    if metadata.dependencies.is_empty() {
        println!("  Dependencies: none declared");
    } else {
        println!("  Dependencies ({}):", metadata.dependencies.len());
        for dep in &metadata.dependencies {
            println!("    {}", dep);
        }
    }
    println!();
}

fn print_summary(report: &AnalysisReport) {
    let critical = report
        .scan
        .files
        .iter()
        .flat_map(|f| &f.findings)
        .filter(|finding| patterns::is_critical(&finding.pattern))
        .count();

    println!("Summary:");
    println!("  Files with findings: {}", report.scan.files.len());
    println!("  Total findings: {}", report.scan.total_findings());
    if critical > 0 {
        println!("  Critical patterns: {}", critical);
    }
    println!();
    println!("Risk Level: {}", format_risk(report.scan.risk));
}

fn format_risk(risk: RiskScore) -> String {
    match risk {
        RiskScore::High => "\x1b[31mHIGH\x1b[0m".to_string(),
        RiskScore::Moderate => "\x1b[33mMODERATE\x1b[0m".to_string(),
        RiskScore::Safe => "\x1b[32mSAFE\x1b[0m".to_string(),
    }
}

fn category_name(pattern: &str) -> String {
    patterns::category_of(pattern)
        .map(|c| c.as_str().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Char-based truncation; scanned content is lossily decoded and can
/// hold multibyte text, so byte slicing is not safe here.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate("eval", 10), "eval");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let s = "päckæge näme with ünicode";
        let cut = truncate(s, 10);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 10);
    }

    #[test]
    fn test_single_line_collapses_whitespace() {
        assert_eq!(
            single_line("import os\nos.system(cmd)\n  # done"),
            "import os os.system(cmd) # done"
        );
    }

    #[test]
    fn test_format_risk_colors() {
        assert!(format_risk(RiskScore::High).contains("\x1b[31m"));
        assert!(format_risk(RiskScore::Moderate).contains("\x1b[33m"));
        assert!(format_risk(RiskScore::Safe).contains("\x1b[32m"));
    }

    #[test]
    fn test_category_name_unknown_pattern() {
        assert_eq!(category_name("not_a_pattern"), "-");
    }
}
