use super::Canonicalizer;
use super::rule_set::RuleSet;
use std::borrow::Cow;

/// Upper bound on rewrite passes before a chain gives up on converging.
pub const MAX_PASSES: usize = 8;

/// Ordered composition of rule sets.
///
/// The chain is re-applied until the output stops changing, so a rewrite that
/// exposes a new match (two quoted spans merging after an escape is removed,
/// a nested release path) is still folded and the result is idempotent.
#[derive(Debug, Clone)]
pub struct RuleChain {
    name: &'static str,
    sets: Vec<&'static RuleSet>,
    trim: bool,
}

impl RuleChain {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            sets: Vec::new(),
            trim: false,
        }
    }

    /// Append a rule set; sets run in the order they were added.
    #[must_use]
    pub fn then(mut self, set: &'static RuleSet) -> Self {
        self.sets.push(set);
        self
    }

    /// Strip leading and trailing whitespace after every pass.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rule_sets(&self) -> impl Iterator<Item = &'static RuleSet> + '_ {
        self.sets.iter().copied()
    }

    pub fn apply(&self, text: &str) -> String {
        let mut current = self.pass(text);

        for _ in 1..MAX_PASSES {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }

        tracing::debug!(chain = self.name, "Rule chain did not settle within pass limit");
        current
    }

    fn pass(&self, text: &str) -> String {
        let mut current = Cow::Borrowed(text);

        for set in &self.sets {
            let rewritten = match set.apply(&current) {
                Cow::Borrowed(_) => None,
                Cow::Owned(rewritten) => Some(rewritten),
            };

            if let Some(rewritten) = rewritten {
                current = Cow::Owned(rewritten);
            }
        }

        if self.trim {
            current.trim().to_string()
        } else {
            current.into_owned()
        }
    }
}

impl Canonicalizer for RuleChain {
    fn name(&self) -> &str {
        self.name
    }

    fn canonicalize(&self, text: &str) -> String {
        self.apply(text)
    }
}
