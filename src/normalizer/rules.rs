//! Shared rule families.
//!
//! Each family is a static [`RuleSet`]; canonicalizer variants and issue
//! categories pick the families they need and add their own.

use super::rule_set::{Rule, RuleSet};

/// Block comments, e.g. `/* CategoryDataService::getMostVisited 10.8.1.2 */`.
/// Replaced with a space so the surrounding tokens cannot fuse into a new comment.
pub static COMMENTS: RuleSet = RuleSet::new(
    "comments",
    &[Rule::new("block_comment", r"(?s)\s?/\*.*?\*/", " ")],
);

/// Escaped backslashes and quotes are dropped before literals are matched.
pub static ESCAPES: RuleSet = RuleSet::new(
    "escapes",
    &[
        Rule::new("escaped_backslash", r"\\\\", ""),
        Rule::new("escaped_single_quote", r"\\'", ""),
        Rule::new("escaped_double_quote", r#"\\""#, ""),
    ],
);

pub static QUOTED_LITERALS: RuleSet = RuleSet::new(
    "quoted_literals",
    &[
        Rule::new("single_quoted", r"'[^']*'", "X"),
        Rule::new("double_quoted", r#""[^"]*""#, "X"),
    ],
);

/// Newlines, tabs and runs of spaces become a single space.
pub static WHITESPACE: RuleSet = RuleSet::new("whitespace", &[Rule::new("whitespace", r"\s+", " ")]);

pub static INTEGERS: RuleSet = RuleSet::new("integers", &[Rule::new("integer", r"-?[0-9]+", "N")]);

/// `WHERE foo IN ('880987','882618')`
pub static IN_LISTS: RuleSet = RuleSet::new(
    "in_lists",
    &[Rule::new("in_list", r"\sIN\s*\([^)]+\)", " IN (XYZ)")],
);

/// Release checkout prefix, `/usr/wikia/slot1/3006/src`.
pub static RELEASE_PATH: RuleSet = RuleSet::new(
    "release_path",
    &[Rule::new("release_path", r"/usr/wikia/slot1/[0-9]+/src", "")],
);

pub static URLS: RuleSet = RuleSet::new("urls", &[Rule::new("url", r"https?://\S+", "<URL>")]);

pub static NETWORK_ADDRESSES: RuleSet = RuleSet::new(
    "network_addresses",
    &[
        Rule::new(
            "ipv4_port",
            r"\b[0-9]{1,3}(?:\.[0-9]{1,3}){3}:[0-9]+\b",
            "<IP>:<PORT>",
        ),
        Rule::new("ipv4", r"\b[0-9]{1,3}(?:\.[0-9]{1,3}){3}\b", "<IP>"),
    ],
);

/// `/tmp/AMInu3uOpA`, `/tmp/merge-old-8JOqT1`
pub static TEMP_FILES: RuleSet = RuleSet::new(
    "temp_files",
    &[Rule::new("temp_file", r"/tmp/[\w-]+", "/tmp/X")],
);

/// Request and error identifiers: UUIDs, long hex tokens, `Error ID: qjiyzrao131pe600`.
pub static IDENTIFIERS: RuleSet = RuleSet::new(
    "identifiers",
    &[
        Rule::new(
            "uuid",
            r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
            "<ID>",
        ),
        Rule::new("hex_token", r"\b[0-9a-fA-F]{16,}\b", "<ID>"),
        Rule::new("labelled_id", r"\b(Error|Request) ID: \w+", "$1 ID: X"),
    ],
);
