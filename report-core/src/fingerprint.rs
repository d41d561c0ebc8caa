//! Content-addressed fingerprint used as the recommendation cache key.
//!
//! The fingerprint is a SHA-256 digest over the *semantic identity* of a
//! finding — normalized rule, title, and description — and deliberately
//! excludes severity, file, and line. Structurally distinct findings that
//! describe the same underlying pattern share one fingerprint, so the
//! enrichment cost is paid once per issue pattern, not once per location.
//! Collision resistance only guards against accidental cache aliasing;
//! this is not a security boundary.

use sha2::{Digest, Sha256};

use crate::model::CanonicalFinding;
use crate::normalize::{normalize_text, normalize_title};

/// Computes the 64-hex-char cache key for a canonical finding.
///
/// Deterministic across runs: identical normalized
/// `(rule, title, description)` always yields the same digest.
pub fn fingerprint(finding: &CanonicalFinding) -> String {
    let input = format!(
        "{}|{}|{}",
        normalize_text(&finding.rule),
        normalize_text(&normalize_title(&finding.title)),
        normalize_text(&finding.description),
    );
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn finding(rule: &str, title: &str, desc: &str) -> CanonicalFinding {
        CanonicalFinding {
            severity: Severity::High,
            rule: rule.into(),
            title: title.into(),
            file: "a.js".into(),
            description: desc.into(),
            cwe: String::new(),
            occurrences: Vec::new(),
            recommendation: None,
        }
    }

    #[test]
    fn pinned_digest_for_fixed_input() {
        // SHA-256("R1|Unsafe eval on function argument `<VAR>`|Avoid eval.")
        let f = finding("R1", "Unsafe eval on function argument `x`", "Avoid eval.");
        assert_eq!(
            fingerprint(&f),
            "c719c076c4a9a70fbd9d9a254ee6763f3610ec6278bf491ed36274ed21c8a38e"
        );
    }

    #[test]
    fn pinned_digest_with_empty_description() {
        // SHA-256("rules.eval|Unsafe eval|")
        let f = finding("rules.eval", "Unsafe eval", "");
        assert_eq!(
            fingerprint(&f),
            "85070e34f3622ed99560993fb60baf94d24d2e91380377165abccd6dd26a3da9"
        );
    }

    #[test]
    fn independent_of_severity_file_and_line() {
        let mut a = finding("R1", "title", "desc");
        let mut b = finding("R1", "title", "desc");
        a.severity = Severity::High;
        a.file = "a.js".into();
        b.severity = Severity::Low;
        b.file = "deep/nested/b.js".into();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn whitespace_and_var_names_do_not_split_keys() {
        let a = finding("R1", "eval on function argument `x`", "  bad   thing ");
        let b = finding("R1", "eval  on function argument `y`", "bad thing");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn digest_shape() {
        let h = fingerprint(&finding("r", "t", "d"));
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
