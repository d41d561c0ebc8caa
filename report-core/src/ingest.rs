//! Semgrep-style scan report adapter.
//!
//! Input shape: a JSON document with a `results` array; each element carries
//! `check_id`, `path`, `start.line`, and an `extra` object with `severity`,
//! `message`, `lines`, and `metadata.{short_description, cwe}`.
//!
//! Only structural failures (unreadable file, invalid JSON, missing
//! `results`) are errors. Missing *optional* fields degrade to empty
//! strings or an unknown-line marker — a half-filled result still becomes
//! a usable finding.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::errors::CoreResult;
use crate::model::{RawFinding, Severity};

#[derive(Debug, Deserialize)]
struct ScanReport {
    results: Vec<ScanResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScanResult {
    check_id: String,
    path: String,
    start: Start,
    extra: Extra,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Start {
    line: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Extra {
    severity: String,
    message: String,
    lines: String,
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Metadata {
    short_description: String,
    cwe: CweField,
}

/// Semgrep emits `cwe` either as a single string or as a list; only the
/// first entry is kept.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CweField {
    One(String),
    Many(Vec<String>),
}

impl Default for CweField {
    fn default() -> Self {
        CweField::One(String::new())
    }
}

impl CweField {
    fn into_first(self) -> String {
        match self {
            CweField::One(s) => s,
            CweField::Many(v) => v.into_iter().next().unwrap_or_default(),
        }
    }
}

impl ScanResult {
    fn into_raw_finding(self) -> RawFinding {
        // Message falls back to the rule id so a finding is never untitled.
        let title = if self.extra.message.is_empty() {
            self.check_id.clone()
        } else {
            self.extra.message
        };
        RawFinding {
            severity: Severity::from_scanner(&self.extra.severity),
            rule: self.check_id,
            title,
            file: self.path,
            line: self.start.line,
            code_snippet: self.extra.lines,
            description: self.extra.metadata.short_description,
            cwe: self.extra.metadata.cwe.into_first(),
        }
    }
}

/// Parses a scan report document into raw findings.
///
/// # Errors
/// Returns [`crate::CoreError::Decode`] when the document is not valid JSON
/// or lacks the `results` array.
pub fn parse_scan_report(json: &str) -> CoreResult<Vec<RawFinding>> {
    let report: ScanReport = serde_json::from_str(json)?;
    let findings: Vec<RawFinding> = report
        .results
        .into_iter()
        .map(ScanResult::into_raw_finding)
        .collect();
    debug!(raw = findings.len(), "parsed scan report");
    Ok(findings)
}

/// Reads and parses a scan report file.
///
/// # Errors
/// Returns [`crate::CoreError::Io`] when the file cannot be read, or the
/// parse errors of [`parse_scan_report`].
pub fn load_scan_report(path: &Path) -> CoreResult<Vec<RawFinding>> {
    let raw = fs::read_to_string(path)?;
    parse_scan_report(&raw)
}
