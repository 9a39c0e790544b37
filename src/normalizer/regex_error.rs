// Regex error handling for lazily compiled rewrite rules
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RegexError {
    #[error("Regex compilation failed for rule '{name}' (pattern: {pattern}): {source}")]
    CompilationFailed {
        pattern: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rule index out of bounds: {index} >= {max}")]
    IndexOutOfBounds { index: usize, max: usize },

    #[error("Rule not found: {name}")]
    RuleNotFound { name: String },
}

impl RegexError {
    /// Runtime fallback strategy for rule failures
    pub fn fallback_strategy(&self) -> FallbackStrategy {
        match self {
            RegexError::CompilationFailed { .. } => FallbackStrategy::SkipRuleSet,
            RegexError::IndexOutOfBounds { .. } | RegexError::RuleNotFound { .. } => {
                FallbackStrategy::SkipRule
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackStrategy {
    /// Leave the text untouched by the whole rule set.
    SkipRuleSet,
    /// Ignore the single rule and keep applying the others.
    SkipRule,
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_compilation_failed_fallback_strategy() {
        let invalid_pattern = r"[invalid regex pattern";
        let result = Regex::new(invalid_pattern);
        assert!(result.is_err());

        let error = RegexError::CompilationFailed {
            pattern: invalid_pattern.to_string(),
            name: "test_rule".to_string(),
            source: result.unwrap_err(),
        };

        assert_eq!(error.fallback_strategy(), FallbackStrategy::SkipRuleSet);
        assert!(error.to_string().contains("test_rule"));
    }

    #[test]
    fn test_index_out_of_bounds_fallback_strategy() {
        let error = RegexError::IndexOutOfBounds { index: 5, max: 3 };

        assert_eq!(error.fallback_strategy(), FallbackStrategy::SkipRule);
    }

    #[test]
    fn test_rule_not_found_fallback_strategy() {
        let error = RegexError::RuleNotFound {
            name: "nonexistent_rule".to_string(),
        };

        assert_eq!(error.fallback_strategy(), FallbackStrategy::SkipRule);
    }
}
