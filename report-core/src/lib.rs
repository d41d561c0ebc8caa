//! Core data model and deterministic logic for the scan-report pipeline.
//!
//! This crate is pure and synchronous: it knows nothing about HTTP, caches,
//! or LLM providers. It covers:
//!
//! 1) **Ingest** — adapt a Semgrep-style JSON report into [`RawFinding`]s,
//!    normalizing severity at construction time.
//! 2) **Normalize** — canonicalize free-text fields so that findings
//!    differing only in incidental text (variable names, whitespace)
//!    compare and hash equal.
//! 3) **Merge** — collapse raw occurrences into [`CanonicalFinding`]s keyed
//!    by `rule|normalized title|severity`, preserving first-seen order.
//! 4) **Fingerprint** — derive the SHA-256 content address used as the
//!    recommendation cache key (location-independent by design).
//! 5) **Render** — produce the deterministic Markdown report.
//!
//! Everything downstream (cache, enrichment, provider I/O) lives in
//! `report-gen` and `llm-service`.

pub mod errors;
pub mod fingerprint;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod render;

pub use errors::{CoreError, CoreResult};
pub use model::{CanonicalFinding, Occurrence, RawFinding, Severity, Summary};

#[cfg(test)]
mod tests {
    use super::*;

    // Full deterministic path: ingest → merge → summarize → render.
    #[test]
    fn scan_json_to_report_orders_by_severity() {
        let json = r#"{ "results": [
            { "check_id": "r.info", "path": "a.js", "start": { "line": 1 },
              "extra": { "severity": "INFO", "message": "info issue", "lines": "x" } },
            { "check_id": "r.warn", "path": "b.js", "start": { "line": 2 },
              "extra": { "severity": "WARNING", "message": "warning issue", "lines": "y" } },
            { "check_id": "r.err", "path": "c.js", "start": { "line": 3 },
              "extra": { "severity": "ERROR", "message": "error issue", "lines": "z" } }
        ] }"#;

        let raw = ingest::parse_scan_report(json).unwrap();
        let raw_total = raw.len();
        let findings = merge::merge(raw);
        let summary = model::summarize(&findings);
        assert_eq!(summary, Summary { total: 3, high: 1, medium: 1, low: 1, files: 3 });

        let report = render::render(&findings, &summary, raw_total);
        let err = report.find("### 1. error issue").unwrap();
        let warn = report.find("### 2. warning issue").unwrap();
        let info = report.find("### 3. info issue").unwrap();
        assert!(err < warn && warn < info);

        // Deterministic: same input, same bytes.
        assert_eq!(report, render::render(&findings, &summary, raw_total));
    }
}
