//! Public entry for the scan-report pipeline.
//!
//! Single high-level function to turn a Semgrep-style scan JSON into an
//! enriched Markdown report:
//!
//! 1) **Step 1 — Ingest**: read the scan JSON, normalize severities,
//!    produce raw findings (structural failures are fatal here).
//! 2) **Step 2 — Merge**: collapse duplicate occurrences into canonical
//!    findings keyed by `rule|normalized title|severity`.
//! 3) **Step 3 — Enrich**: per finding, cache lookup by content
//!    fingerprint, else one provider call under bounded backoff; failures
//!    degrade to a placeholder, never abort the report.
//! 4) **Step 4 — Render**: summary + deterministic Markdown, written to
//!    the output path and returned in memory.
//!
//! The pipeline uses `tracing` for step logging and avoids `async-trait`
//! and heap trait objects; the orchestrator is generic over its store and
//! backend.

pub mod cache;
pub mod enrich;
pub mod errors;
pub mod prompt;

pub use enrich::NO_RECOMMENDATION;
pub use errors::{CacheError, Error};

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use llm_service::{LlmModelConfig, OpenAiService};
use report_core::model::{CanonicalFinding, Summary, summarize};
use report_core::{ingest, merge, render};

use cache::D1Cache;
use enrich::{DEFAULT_MAX_ATTEMPTS, Enricher};
use errors::ReportResult;

/// Final output of a pipeline run, returned in memory alongside the
/// written report file. `summary.total` is the unique-findings count the
/// calling wrapper reports as its metric.
#[derive(Debug)]
pub struct ReportOutcome {
    pub findings: Vec<CanonicalFinding>,
    pub summary: Summary,
}

/// Runs the whole pipeline: scan JSON in, Markdown report out.
///
/// Configuration comes from the environment: provider selection and
/// credential (see [`LlmModelConfig::from_env`]), cache coordinates (see
/// [`D1Cache::from_env`]), and `ENRICH_MAX_ATTEMPTS` (default 5). All of
/// these are validated up front, before any finding is processed.
///
/// # Errors
/// Fatal: unreadable/invalid scan JSON, missing provider or cache
/// configuration, cache transport failures, or an unwritable output path.
/// Provider failures are not fatal; affected findings carry the
/// placeholder text instead.
pub async fn process_report(scan_json_path: &Path, output_path: &Path) -> ReportResult<ReportOutcome> {
    // ---------------------------
    // Startup: fail fast on config
    // ---------------------------
    let llm_cfg = LlmModelConfig::from_env()?;
    let backend = OpenAiService::new(llm_cfg)?;
    let store = D1Cache::from_env()?;
    let max_attempts = max_attempts_from_env();

    // ---------------------------
    // Step 1: ingest
    // ---------------------------
    let t0 = Instant::now();
    debug!(path = %scan_json_path.display(), "step1: load scan report");
    let raw = ingest::load_scan_report(scan_json_path)?;
    let raw_total = raw.len();
    debug!(raw_total, "step1: done in {} ms", t0.elapsed().as_millis());

    // ---------------------------
    // Step 2: merge
    // ---------------------------
    let mut findings = merge::merge(raw);
    debug!(unique = findings.len(), "step2: merged");

    // ---------------------------
    // Step 3: enrich
    // ---------------------------
    let t3 = Instant::now();
    store.ensure_table().await?;
    let enricher = Enricher::new(&store, &backend, max_attempts);
    enricher.enrich(&mut findings).await?;
    debug!(
        "step3: enriched {} findings in {} ms",
        findings.len(),
        t3.elapsed().as_millis()
    );

    // ---------------------------
    // Step 4: summarize + render
    // ---------------------------
    let summary = summarize(&findings);
    let report = render::render(&findings, &summary, raw_total);
    tokio::fs::write(output_path, &report).await?;
    info!(
        path = %output_path.display(),
        unique = summary.total,
        high = summary.high,
        medium = summary.medium,
        low = summary.low,
        "report written"
    );

    Ok(ReportOutcome { findings, summary })
}

/// Attempt cap for the enrichment retry machine (`ENRICH_MAX_ATTEMPTS`,
/// default 5). Unparseable values fall back to the default; the cap is
/// an operational knob, not a correctness input.
fn max_attempts_from_env() -> u32 {
    std::env::var("ENRICH_MAX_ATTEMPTS")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|&n| n >= 1)
        .unwrap_or(DEFAULT_MAX_ATTEMPTS)
}
