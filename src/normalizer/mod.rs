//! Rule-based text canonicalization.
//!
//! Instance-specific substrings (literals, addresses, build numbers, ids) are
//! rewritten to fixed placeholders so that recurring issues fingerprint
//! identically. Rules are plain data ([`Rule`]) grouped into lazily compiled
//! [`RuleSet`]s and composed into [`RuleChain`]s; issue categories build their
//! own chains from the shared families in [`rules`] without touching the engine.

pub mod chain;
pub mod message;
pub mod regex_error;
pub mod rule_set;
pub mod rules;
pub mod sql;

pub use chain::{MAX_PASSES, RuleChain};
pub use message::{MessageCanonicalizer, generalize_message};
pub use regex_error::{FallbackStrategy, RegexError};
pub use rule_set::{Rule, RuleSet};
pub use sql::{SqlCanonicalizer, generalize_sql, method_from_query};

/// Deterministic, idempotent text rewriting.
pub trait Canonicalizer: Send + Sync {
    fn name(&self) -> &str;

    fn canonicalize(&self, text: &str) -> String;

    /// Absent input stays absent.
    fn canonicalize_opt(&self, text: Option<&str>) -> Option<String> {
        text.map(|text| self.canonicalize(text))
    }
}
