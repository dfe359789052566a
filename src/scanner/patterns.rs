//! The fixed indicator table driving the keyword scan.
//!
//! Detection is literal substring containment, not parsing: `eval` also
//! fires on `literal_eval`, and `open(` fires inside comments. The table
//! trades precision for predictability and zero execution of scanned
//! code.

/// Class of risky construct an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorCategory {
    ProcessExecution,
    DynamicEvaluation,
    AttributeAccess,
    NativeCode,
    NetworkIo,
    Serialization,
    Encoding,
    UserInput,
}

impl IndicatorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorCategory::ProcessExecution => "process execution",
            IndicatorCategory::DynamicEvaluation => "dynamic evaluation",
            IndicatorCategory::AttributeAccess => "attribute access",
            IndicatorCategory::NativeCode => "native code",
            IndicatorCategory::NetworkIo => "network/io",
            IndicatorCategory::Serialization => "serialization",
            IndicatorCategory::Encoding => "encoding",
            IndicatorCategory::UserInput => "user input",
        }
    }
}

/// One literal indicator substring and the category it maps to.
#[derive(Debug, Clone, Copy)]
pub struct Indicator {
    pub pattern: &'static str,
    pub category: IndicatorCategory,
}

const fn indicator(pattern: &'static str, category: IndicatorCategory) -> Indicator {
    Indicator { pattern, category }
}

/// Every substring the scanner looks for.
pub const INDICATORS: [Indicator; 19] = [
    indicator("os.system", IndicatorCategory::ProcessExecution),
    indicator("subprocess", IndicatorCategory::ProcessExecution),
    indicator("eval", IndicatorCategory::DynamicEvaluation),
    indicator("exec", IndicatorCategory::DynamicEvaluation),
    indicator("socket", IndicatorCategory::NetworkIo),
    indicator("ctypes", IndicatorCategory::NativeCode),
    indicator("base64", IndicatorCategory::Encoding),
    indicator("open(", IndicatorCategory::NetworkIo),
    indicator("wget", IndicatorCategory::NetworkIo),
    indicator("requests.get", IndicatorCategory::NetworkIo),
    indicator("input(", IndicatorCategory::UserInput),
    indicator("pickle", IndicatorCategory::Serialization),
    indicator("marshal", IndicatorCategory::Serialization),
    indicator("compile", IndicatorCategory::DynamicEvaluation),
    indicator("globals", IndicatorCategory::AttributeAccess),
    indicator("locals", IndicatorCategory::AttributeAccess),
    indicator("__import__", IndicatorCategory::DynamicEvaluation),
    indicator("getattr(", IndicatorCategory::AttributeAccess),
    indicator("setattr(", IndicatorCategory::AttributeAccess),
];

/// Patterns that alone escalate the overall risk score to High.
pub const CRITICAL_PATTERNS: [&str; 4] = ["eval", "exec", "__import__", "os.system"];

pub fn is_critical(pattern: &str) -> bool {
    CRITICAL_PATTERNS.contains(&pattern)
}

/// Category for a pattern, if it is in the table.
pub fn category_of(pattern: &str) -> Option<IndicatorCategory> {
    INDICATORS
        .iter()
        .find(|i| i.pattern == pattern)
        .map(|i| i.category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_critical_patterns() {
        assert!(is_critical("eval"));
        assert!(is_critical("os.system"));
        assert!(!is_critical("socket"));
        assert!(!is_critical("pickle"));
    }

    #[test]
    fn test_critical_patterns_are_indicators() {
        for pattern in CRITICAL_PATTERNS {
            assert!(
                category_of(pattern).is_some(),
                "critical pattern {} missing from table",
                pattern
            );
        }
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(
            category_of("eval"),
            Some(IndicatorCategory::DynamicEvaluation)
        );
        assert_eq!(category_of("ctypes"), Some(IndicatorCategory::NativeCode));
        assert_eq!(category_of("not_a_pattern"), None);
    }

    #[test]
    fn test_no_duplicate_patterns() {
        let unique: HashSet<&str> = INDICATORS.iter().map(|i| i.pattern).collect();
        assert_eq!(unique.len(), INDICATORS.len());
    }
}
