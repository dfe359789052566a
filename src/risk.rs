//! Risk scoring over scan findings.
//!
//! Reduces the per-file findings of a scan to one of three coarse levels
//! using a critical-pattern escalation rule.

use serde::{Deserialize, Serialize};

use crate::model::FileReport;
use crate::scanner::patterns;

/// Overall risk level derived from a scan. Ordered from least to most
/// severe so threshold comparisons work with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskScore {
    Safe,
    Moderate,
    High,
}

impl RiskScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskScore::Safe => "Safe",
            RiskScore::Moderate => "Moderate",
            RiskScore::High => "High",
        }
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derives the risk level for a set of per-file findings.
///
/// The rule is evaluated strictly in order: any finding whose pattern is
/// in the critical set forces `High`; otherwise a total of two or fewer
/// findings is `Moderate`, and anything above that is `Safe`. Note the
/// inversion this produces: heavy non-critical noise scores `Safe`, and
/// an empty scan scores `Moderate`. That is the documented behavior of
/// the scoring rule, kept as is rather than smoothed over.
pub fn score(files: &[FileReport]) -> RiskScore {
    let mut total = 0usize;
    let mut critical = 0usize;

    for file in files {
        for finding in &file.findings {
            total += 1;
            if patterns::is_critical(&finding.pattern) {
                critical += 1;
            }
        }
    }

    if critical > 0 {
        RiskScore::High
    } else if total <= 2 {
        RiskScore::Moderate
    } else {
        RiskScore::Safe
    }
}
