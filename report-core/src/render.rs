//! Deterministic Markdown rendering of enriched findings.
//!
//! Output is a pure function of its inputs: findings are ordered by
//! severity rank (high → low) with a *stable* sort, so ties keep the
//! merge's first-seen relative order and repeated runs produce
//! byte-identical reports.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{CanonicalFinding, Summary};

/// Leading "**Recommendation:**" label in provider output; stripped to
/// avoid double-labeling in the rendered entry.
static REC_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\*{2}recommendation:\*{2}\s*").unwrap());

/// Renders the full Markdown report.
///
/// `raw_total` is the pre-merge occurrence count; `summary` is the
/// aggregate over the (post-merge) `findings`.
pub fn render(findings: &[CanonicalFinding], summary: &Summary, raw_total: usize) -> String {
    let mut report = String::new();

    report.push_str("# Security Scan Report\n\n");
    report.push_str("## Summary\n");
    let _ = writeln!(report, "- Total Raw Findings: {raw_total}");
    let _ = writeln!(report, "- Unique Issues: {}", summary.total);
    let _ = writeln!(report, "- High: {}", summary.high);
    let _ = writeln!(report, "- Medium: {}", summary.medium);
    let _ = writeln!(report, "- Low: {}", summary.low);
    let _ = writeln!(report, "- Files Affected: {}", summary.files);
    report.push_str("\n---\n\n## Findings\n\n");

    // Severity rank alone is not a total order; the stable sort preserves
    // merge order within a rank.
    let mut sorted: Vec<&CanonicalFinding> = findings.iter().collect();
    sorted.sort_by_key(|f| std::cmp::Reverse(f.severity.rank()));

    for (index, finding) in sorted.iter().enumerate() {
        let _ = writeln!(report, "### {}. {}", index + 1, finding.title);
        let _ = writeln!(
            report,
            "- **Severity:** {}",
            finding.severity.as_str().to_uppercase()
        );
        let _ = writeln!(report, "- **Rule:** {}", finding.rule);
        let _ = writeln!(report, "- **Line(s):** {}", location_list(finding));

        if finding.occurrences.iter().any(|o| !o.code_snippet.is_empty()) {
            report.push_str("- **Code:**\n\n```js\n");
            for occurrence in &finding.occurrences {
                let _ = writeln!(
                    report,
                    "{:<25} | {}",
                    occurrence.location(),
                    occurrence.code_snippet.trim()
                );
            }
            report.push_str("```\n");
        }

        if let Some(recommendation) = &finding.recommendation {
            let text = REC_LABEL.replace(recommendation.trim(), "");
            let _ = writeln!(report, "- **Recommendation:** {text}");
        }

        report.push_str("\n---\n\n");
    }

    report
}

/// Deduplicated `file:line` display list, first-seen order preserved.
fn location_list(finding: &CanonicalFinding) -> String {
    let mut seen = HashSet::new();
    let mut locations = Vec::new();
    for occurrence in &finding.occurrences {
        let loc = occurrence.location();
        if seen.insert(loc.clone()) {
            locations.push(loc);
        }
    }
    locations.join(", ")
}
