//! Collapse raw occurrences into canonical findings.
//!
//! Identity key: `rule|normalized title|severity`. Severity is taken as
//! already normalized on the raw finding (the ingest layer guarantees
//! this); merge never re-normalizes it.
//!
//! The accumulator is an explicit insertion-order-preserving mapping
//! (`Vec` of findings plus a key → index map), so output order is the
//! first-seen order of identity keys regardless of hash iteration order.

use std::collections::HashMap;

use tracing::debug;

use crate::model::{CanonicalFinding, Occurrence, RawFinding};
use crate::normalize::normalize_title;

/// Builds the merge identity key for a raw finding.
fn identity_key(f: &RawFinding) -> String {
    format!(
        "{}|{}|{}",
        f.rule,
        normalize_title(&f.title),
        f.severity.as_str()
    )
}

/// Groups raw findings by identity key, preserving first-seen order.
///
/// Scalar fields (title, description, cwe, primary file) come from the
/// first occurrence under each key; later duplicates contribute only their
/// `(file, line, snippet)` occurrence. Empty snippets are recorded, not
/// dropped.
pub fn merge(raw: Vec<RawFinding>) -> Vec<CanonicalFinding> {
    let mut findings: Vec<CanonicalFinding> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for f in raw {
        let key = identity_key(&f);
        let occurrence = Occurrence {
            file: f.file.clone(),
            line: f.line,
            code_snippet: f.code_snippet.clone(),
        };

        match index.get(&key) {
            Some(&i) => findings[i].occurrences.push(occurrence),
            None => {
                index.insert(key, findings.len());
                findings.push(CanonicalFinding {
                    severity: f.severity,
                    rule: f.rule,
                    title: normalize_title(&f.title),
                    file: f.file,
                    description: f.description,
                    cwe: f.cwe,
                    occurrences: vec![occurrence],
                    recommendation: None,
                });
            }
        }
    }

    debug!(unique = findings.len(), "merged raw findings");
    findings
}
