//! SQL statement canonicalizer, after MediaWiki's `DatabaseBase::generalizeSQL`.

use super::chain::RuleChain;
use super::rules::{COMMENTS, ESCAPES, INTEGERS, IN_LISTS, QUOTED_LITERALS, WHITESPACE};
use super::Canonicalizer;
use regex::Regex;
use std::sync::LazyLock;

static SQL_CHAIN: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new("sql")
        .then(&COMMENTS)
        .then(&ESCAPES)
        .then(&QUOTED_LITERALS)
        .then(&WHITESPACE)
        .then(&INTEGERS)
        .then(&IN_LISTS)
        .trimmed()
});

static CALLER_COMMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"/\*([^*]+)\*/")
        .map_err(|e| tracing::warn!(error = %e, "caller comment pattern failed to compile"))
        .ok()
});

/// Replace the variable parts of a query with placeholders.
///
/// `SELECT * FROM t WHERE id IN ('1','2') AND name='bob'` becomes
/// `SELECT * FROM t WHERE id IN (XYZ) AND name=X`.
pub fn generalize_sql(sql: &str) -> String {
    SQL_CHAIN.apply(sql)
}

/// Calling method named in the leading query comment.
///
/// `SELECT /* Foo::bar 157.55.39.174 */ col FROM t` -> `Foo::bar`
pub fn method_from_query(sql: &str) -> Option<String> {
    let pattern = CALLER_COMMENT.as_ref()?;
    let comment = pattern.captures(sql)?.get(1)?.as_str().trim();

    comment
        .split(' ')
        .next()
        .filter(|method| !method.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlCanonicalizer;

impl Canonicalizer for SqlCanonicalizer {
    fn name(&self) -> &str {
        "sql"
    }

    fn canonicalize(&self, text: &str) -> String {
        generalize_sql(text)
    }
}
