//! Free-text message canonicalizer.

use super::Canonicalizer;
use super::chain::RuleChain;
use super::rules::{
    ESCAPES, IDENTIFIERS, INTEGERS, NETWORK_ADDRESSES, QUOTED_LITERALS, RELEASE_PATH, TEMP_FILES,
    URLS, WHITESPACE,
};
use std::sync::LazyLock;

// The release path goes before URLs and integers: both would eat the build number.
static MESSAGE_CHAIN: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new("message")
        .then(&ESCAPES)
        .then(&QUOTED_LITERALS)
        .then(&WHITESPACE)
        .then(&RELEASE_PATH)
        .then(&URLS)
        .then(&TEMP_FILES)
        .then(&NETWORK_ADDRESSES)
        .then(&IDENTIFIERS)
        .then(&INTEGERS)
        .trimmed()
});

/// Canonicalize an error message or stack frame.
pub fn generalize_message(message: &str) -> String {
    MESSAGE_CHAIN.apply(message)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCanonicalizer;

impl Canonicalizer for MessageCanonicalizer {
    fn name(&self) -> &str {
        "message"
    }

    fn canonicalize(&self, text: &str) -> String {
        generalize_message(text)
    }
}
