mod cli;
mod json;

pub use cli::{print_cli_table, print_patterns};
pub use json::print_json;

use crate::model::AnalysisReport;
use anyhow::Result;

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

pub fn print_report(report: &AnalysisReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Json => print_json(report),
    }
}

/// Format report to string for file output
pub fn format_report_to_string(report: &AnalysisReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => {
            // For table format, just use JSON as the file output
            Ok(serde_json::to_string_pretty(report)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
    }

    #[test]
    fn test_format_from_str_unknown() {
        let err = OutputFormat::from_str("yaml").unwrap_err();
        assert!(err.contains("table"));
        assert!(err.contains("json"));
    }
}
