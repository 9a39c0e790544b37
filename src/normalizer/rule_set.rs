// Lazily compiled, ordered rewrite rules
use super::regex_error::RegexError;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// One rewrite: every match of `pattern` is replaced by `replacement`
/// (`$1`-style group references are expanded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
}

impl Rule {
    pub const fn new(name: &'static str, pattern: &'static str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern,
            replacement,
        }
    }
}

/// Zero-cost static rule set, compiled on first use.
///
/// Rules are applied in declaration order; a compilation failure disables the
/// whole set rather than panicking.
pub struct RuleSet {
    name: &'static str,
    rules: &'static [Rule],
    compiled: OnceLock<Result<Vec<Regex>, RegexError>>,
}

impl RuleSet {
    pub const fn new(name: &'static str, rules: &'static [Rule]) -> Self {
        Self {
            name,
            rules,
            compiled: OnceLock::new(),
        }
    }

    fn compiled(&self) -> Result<&[Regex], RegexError> {
        let compiled = self.compiled.get_or_init(|| {
            let mut regexes = Vec::with_capacity(self.rules.len());

            for rule in self.rules {
                match Regex::new(rule.pattern) {
                    Ok(regex) => regexes.push(regex),
                    Err(e) => {
                        return Err(RegexError::CompilationFailed {
                            pattern: rule.pattern.to_string(),
                            name: rule.name.to_string(),
                            source: e,
                        });
                    }
                }
            }

            Ok(regexes)
        });

        match compiled {
            Ok(regexes) => Ok(regexes.as_slice()),
            Err(e) => Err(e.clone()),
        }
    }

    /// Compile every rule, reporting the first failure.
    pub fn validate(&self) -> Result<(), RegexError> {
        self.compiled().map(|_| ())
    }

    pub fn get(&self, index: usize) -> Result<&Regex, RegexError> {
        let regexes = self.compiled()?;
        regexes.get(index).ok_or(RegexError::IndexOutOfBounds {
            index,
            max: regexes.len(),
        })
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Regex, RegexError> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.name == name)
            .ok_or(RegexError::RuleNotFound {
                name: name.to_string(),
            })?;

        self.get(index)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    /// Apply every rule once, in order. Borrows when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let regexes = match self.compiled() {
            Ok(regexes) => regexes,
            Err(e) => {
                tracing::warn!(
                    rule_set = self.name,
                    error = %e,
                    fallback = ?e.fallback_strategy(),
                    "Rule set unavailable, text left unchanged"
                );
                return Cow::Borrowed(text);
            }
        };

        let mut current = Cow::Borrowed(text);

        for (rule, regex) in self.rules.iter().zip(regexes) {
            let rewritten = match regex.replace_all(&current, rule.replacement) {
                Cow::Borrowed(_) => None,
                Cow::Owned(rewritten) => Some(rewritten),
            };

            if let Some(rewritten) = rewritten {
                current = Cow::Owned(rewritten);
            }
        }

        current
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("rules", &self.rule_names())
            .finish()
    }
}
