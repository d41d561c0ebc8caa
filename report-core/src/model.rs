//! Data model: severities, raw and canonical findings, run summary.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Triage severity on a fixed three-level scale.
///
/// Scanner vocabularies are mapped onto this scale at ingestion time
/// ([`Severity::from_scanner`]); everything downstream (merge keys,
/// enrichment policy, report ordering) sees only these three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Maps a raw scanner severity string onto the three-level scale.
    ///
    /// Unrecognized or empty input defaults to `Medium`: severity drives
    /// triage order, not correctness, so the mapping fails open.
    pub fn from_scanner(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Severity::High,
            "WARNING" => Severity::Medium,
            "INFO" => Severity::Low,
            _ => Severity::Medium,
        }
    }

    /// Sort rank, higher is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    /// Lowercase form used in merge keys and summary lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// One reported occurrence from the scanner, immutable once ingested.
///
/// Severity is already normalized here; merge relies on that precondition
/// and never re-normalizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFinding {
    pub severity: Severity,
    /// Rule identifier (Semgrep `check_id`).
    pub rule: String,
    /// Finding message as reported.
    pub title: String,
    /// Repo-relative path of the file the occurrence was found in.
    pub file: String,
    /// 1-based line number; `None` when the scanner did not report one.
    pub line: Option<u64>,
    /// Matched source lines; may be empty.
    pub code_snippet: String,
    pub description: String,
    /// CWE reference; empty when the scanner supplied none.
    pub cwe: String,
}

/// A single `(file, line, snippet)` occurrence attached to a canonical
/// finding. Empty snippets are kept; they still mark a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub file: String,
    pub line: Option<u64>,
    pub code_snippet: String,
}

impl Occurrence {
    /// `file:line` display form; unknown lines render as `?`, never as a
    /// formatting-breaking null.
    pub fn location(&self) -> String {
        match self.line {
            Some(n) => format!("{}:{}", self.file, n),
            None => format!("{}:?", self.file),
        }
    }
}

/// The merged identity for all raw findings sharing the same
/// `(rule, normalized title, severity)` triple.
///
/// Created once during merge, enriched at most once (recommendation
/// assigned), never deleted within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalFinding {
    pub severity: Severity,
    pub rule: String,
    /// Title with incidental variation collapsed (`<VAR>` placeholder).
    pub title: String,
    /// First-seen file, kept for context; the full location list lives in
    /// `occurrences`.
    pub file: String,
    pub description: String,
    pub cwe: String,
    /// Every occurrence mapped to this identity, in encounter order.
    pub occurrences: Vec<Occurrence>,
    /// Remediation text; `None` until enrichment runs.
    pub recommendation: Option<String>,
}

/// Derived aggregate over canonical findings; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Count of unique (canonical) findings.
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Distinct files across all occurrences.
    pub files: usize,
}

/// Computes the run summary over merged findings.
pub fn summarize(findings: &[CanonicalFinding]) -> Summary {
    let count = |s: Severity| findings.iter().filter(|f| f.severity == s).count();
    let files: HashSet<&str> = findings
        .iter()
        .flat_map(|f| f.occurrences.iter().map(|o| o.file.as_str()))
        .collect();
    Summary {
        total: findings.len(),
        high: count(Severity::High),
        medium: count(Severity::Medium),
        low: count(Severity::Low),
        files: files.len(),
    }
}
