//! Remediation prompt builder.

use report_core::CanonicalFinding;

/// Builds the remediation prompt for one canonical finding.
///
/// The prompt carries only the semantic identity fields (rule, title,
/// description) — the same fields the fingerprint hashes — so a cached
/// recommendation is always an answer to the same question.
pub fn build_prompt(finding: &CanonicalFinding) -> String {
    format!(
        "\nYou are a senior DevSecOps assistant.\n\
         For the following security issue, provide a short, actionable remediation recommendation and a reference link if possible.\n\
         \n\
         Rule: {}\n\
         Title: {}\n\
         Description: {}\n\
         \n\
         Recommendation:\n",
        finding.rule, finding.title, finding.description
    )
}
