//! Text canonicalization for merge keys and fingerprints.
//!
//! All functions here are pure, total, and idempotent:
//! `normalize(normalize(x)) == normalize(x)`. They must be applied *before*
//! a value enters an equality key or a hash, never after.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a backtick-quoted identifier in the standard scanner phrasing
/// "function argument `name`".
static VAR_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"function argument `[^`]+`").unwrap());

/// Trims and collapses internal whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Replaces variable names in "function argument `x`" phrasing with a fixed
/// `<VAR>` placeholder, so findings that differ only in an argument name
/// collapse to one identity.
pub fn normalize_title(title: &str) -> String {
    VAR_ARG
        .replace_all(title, "function argument `<VAR>`")
        .into_owned()
}
