use crate::model::AnalysisReport;
use anyhow::Result;

pub fn print_json(report: &AnalysisReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}
