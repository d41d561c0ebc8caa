//! Enrichment orchestrator: resolve a recommendation for every canonical
//! finding above the severity threshold.
//!
//! Resolution order per finding:
//! 1. Low severity → fixed placeholder, no cache or provider traffic
//!    (enrichment spend is reserved for actionable findings).
//! 2. Cache lookup by fingerprint → hit uses the stored text.
//! 3. Provider call under the bounded retry machine → success writes
//!    through the cache ("already present" is success) and uses the fresh
//!    text; exhaustion or a non-retryable failure logs a warning and falls
//!    back to the placeholder.
//!
//! Enrichment failure for a single finding is never fatal: the report is
//! always produced if merge succeeded. Cache *transport* failures, by
//! contrast, abort the run — they are indistinguishable from flying blind.
//!
//! Retry machine (per finding, initial call is attempt 1):
//! - attempt n fails with a rate-limit signal and n < max → sleep
//!   `2^n` seconds plus up to 500 ms of jitter, try attempt n+1;
//! - attempt n fails with any other error → stop immediately (assumed
//!   non-transient: bad credentials, malformed request);
//! - attempt max fails → stop.
//!
//! Findings are processed strictly sequentially; no two in-flight
//! operations can target the same fingerprint within one run.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use llm_service::LlmError;
use report_core::model::{CanonicalFinding, Severity};
use report_core::fingerprint::fingerprint;

use crate::errors::{CacheError, ReportResult};
use crate::prompt::build_prompt;

/// Placeholder shown when no recommendation was obtained or attempted.
pub const NO_RECOMMENDATION: &str = "No recommendation available.";

/// Default attempt cap for the retry machine.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Persistent fingerprint → recommendation store.
///
/// `get` returning `Ok(None)` means "no entry"; transport failures must
/// surface as `Err`, never as a miss. `put` has insert-if-absent
/// semantics: an already-present key is success.
pub trait RecommendationStore {
    fn get(
        &self,
        fingerprint: &str,
    ) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;
    fn put(
        &self,
        fingerprint: &str,
        recommendation: &str,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// Text-generation backend producing one recommendation per prompt.
pub trait CompletionBackend {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}

impl RecommendationStore for crate::cache::D1Cache {
    async fn get(&self, fingerprint: &str) -> Result<Option<String>, CacheError> {
        crate::cache::D1Cache::get(self, fingerprint).await
    }

    async fn put(&self, fingerprint: &str, recommendation: &str) -> Result<(), CacheError> {
        crate::cache::D1Cache::put(self, fingerprint, recommendation).await
    }
}

impl CompletionBackend for llm_service::OpenAiService {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        llm_service::OpenAiService::complete(self, prompt).await
    }
}

/// Sequential enrichment orchestrator over a store and a backend.
///
/// Borrows both collaborators; the caller keeps ownership (the store may
/// outlive several pipeline stages).
#[derive(Debug)]
pub struct Enricher<'a, S, P> {
    store: &'a S,
    backend: &'a P,
    max_attempts: u32,
}

impl<'a, S: RecommendationStore, P: CompletionBackend> Enricher<'a, S, P> {
    pub fn new(store: &'a S, backend: &'a P, max_attempts: u32) -> Self {
        Self {
            store,
            backend,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Assigns a recommendation to every finding, in place.
    ///
    /// Each finding's `recommendation` is set exactly once and never
    /// cleared.
    ///
    /// # Errors
    /// Only cache transport failures propagate; provider failures degrade
    /// to the placeholder.
    pub async fn enrich(&self, findings: &mut [CanonicalFinding]) -> ReportResult<()> {
        for finding in findings.iter_mut() {
            if finding.severity == Severity::Low {
                finding.recommendation = Some(NO_RECOMMENDATION.to_string());
                continue;
            }
            let text = self.resolve(finding).await?;
            finding.recommendation = Some(text);
        }
        Ok(())
    }

    /// Resolves the recommendation text for one high/medium finding.
    async fn resolve(&self, finding: &CanonicalFinding) -> ReportResult<String> {
        let key = fingerprint(finding);
        debug!(
            rule = %finding.rule,
            title = %title_preview(&finding.title),
            cache_key = %&key[..8],
            "resolving recommendation"
        );

        if let Some(stored) = self.store.get(&key).await? {
            debug!(cache_key = %&key[..8], "cache hit");
            return Ok(stored);
        }

        debug!(cache_key = %&key[..8], "cache miss — calling provider");
        let prompt = build_prompt(finding);

        match self.complete_with_retry(&prompt).await {
            Some(text) => {
                // First successful writer wins; a concurrent run having
                // stored this key already is still success.
                self.store.put(&key, &text).await?;
                info!(cache_key = %&key[..8], "recommendation stored");
                Ok(text)
            }
            None => {
                warn!(
                    rule = %finding.rule,
                    cache_key = %&key[..8],
                    "failed to obtain recommendation; using placeholder"
                );
                Ok(NO_RECOMMENDATION.to_string())
            }
        }
    }

    /// Bounded retry loop; `None` is the terminal `Failed` state.
    async fn complete_with_retry(&self, prompt: &str) -> Option<String> {
        for attempt in 1..=self.max_attempts {
            match self.backend.complete(prompt).await {
                Ok(text) => return Some(text),
                Err(err) if err.is_rate_limited() && attempt < self.max_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "provider rate limited; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    // Non-retryable, or the attempt cap was reached on a
                    // rate limit.
                    warn!(attempt, error = %err, "provider call failed; giving up");
                    return None;
                }
            }
        }
        None
    }
}

/// Exponential backoff for attempt `n`: `2^n` seconds plus up to 500 ms of
/// jitter to de-synchronize parallel CI runs.
fn backoff_delay(attempt: u32) -> Duration {
    let base = Duration::from_secs(1u64 << attempt.min(16));
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
    base + jitter
}

/// First 60 chars of a title for log lines.
fn title_preview(title: &str) -> String {
    if title.chars().count() > 60 {
        let head: String = title.chars().take(60).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use llm_service::ProviderError;
    use report_core::model::Occurrence;

    /// In-memory store with first-write-wins puts, mirroring the D1
    /// `ON CONFLICT DO NOTHING` semantics.
    #[derive(Default)]
    struct MemStore {
        entries: Mutex<HashMap<String, String>>,
        gets: Mutex<u32>,
        puts: Mutex<u32>,
    }

    impl MemStore {
        fn with(key: &str, value: &str) -> Self {
            let store = Self::default();
            store
                .entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            store
        }
    }

    impl RecommendationStore for MemStore {
        async fn get(&self, fingerprint: &str) -> Result<Option<String>, CacheError> {
            *self.gets.lock().unwrap() += 1;
            Ok(self.entries.lock().unwrap().get(fingerprint).cloned())
        }

        async fn put(&self, fingerprint: &str, recommendation: &str) -> Result<(), CacheError> {
            *self.puts.lock().unwrap() += 1;
            self.entries
                .lock()
                .unwrap()
                .entry(fingerprint.to_string())
                .or_insert_with(|| recommendation.to_string());
            Ok(())
        }
    }

    /// Backend double with a scripted outcome and a call counter.
    struct ScriptedBackend {
        calls: Mutex<u32>,
        outcome: Outcome,
    }

    enum Outcome {
        Succeed(&'static str),
        RateLimit,
        Unauthorized,
    }

    impl ScriptedBackend {
        fn new(outcome: Outcome) -> Self {
            Self {
                calls: Mutex::new(0),
                outcome,
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            match &self.outcome {
                Outcome::Succeed(text) => Ok(text.to_string()),
                Outcome::RateLimit => Err(ProviderError::RateLimited {
                    retry_after_secs: None,
                }
                .into()),
                Outcome::Unauthorized => Err(ProviderError::Unauthorized.into()),
            }
        }
    }

    fn finding(sev: Severity, rule: &str) -> CanonicalFinding {
        CanonicalFinding {
            severity: sev,
            rule: rule.into(),
            title: "Unsafe eval".into(),
            file: "a.js".into(),
            description: "desc".into(),
            cwe: String::new(),
            occurrences: vec![Occurrence {
                file: "a.js".into(),
                line: Some(1),
                code_snippet: "eval(x)".into(),
            }],
            recommendation: None,
        }
    }

    #[tokio::test]
    async fn low_severity_skips_cache_and_provider() {
        let store = MemStore::default();
        let backend = ScriptedBackend::new(Outcome::Succeed("never"));
        let enricher = Enricher::new(&store, &backend, DEFAULT_MAX_ATTEMPTS);

        let mut findings = vec![finding(Severity::Low, "R1")];
        enricher.enrich(&mut findings).await.unwrap();

        assert_eq!(findings[0].recommendation.as_deref(), Some(NO_RECOMMENDATION));
        assert_eq!(*store.gets.lock().unwrap(), 0);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_provider() {
        let mut findings = vec![finding(Severity::Medium, "R1")];
        let key = fingerprint(&findings[0]);
        let store = MemStore::with(&key, "cached advice");
        let backend = ScriptedBackend::new(Outcome::Succeed("fresh advice"));
        let enricher = Enricher::new(&store, &backend, DEFAULT_MAX_ATTEMPTS);

        enricher.enrich(&mut findings).await.unwrap();

        assert_eq!(findings[0].recommendation.as_deref(), Some("cached advice"));
        assert_eq!(backend.calls(), 0);
        assert_eq!(*store.puts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn cache_miss_calls_provider_and_writes_through() {
        let store = MemStore::default();
        let backend = ScriptedBackend::new(Outcome::Succeed("fresh advice"));
        let enricher = Enricher::new(&store, &backend, DEFAULT_MAX_ATTEMPTS);

        let mut findings = vec![finding(Severity::High, "R1")];
        enricher.enrich(&mut findings).await.unwrap();

        assert_eq!(findings[0].recommendation.as_deref(), Some("fresh advice"));
        assert_eq!(backend.calls(), 1);
        assert_eq!(*store.puts.lock().unwrap(), 1);

        let key = fingerprint(&findings[0]);
        assert_eq!(
            store.entries.lock().unwrap().get(&key).map(String::as_str),
            Some("fresh advice")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_is_bounded_then_falls_back() {
        let store = MemStore::default();
        let backend = ScriptedBackend::new(Outcome::RateLimit);
        let enricher = Enricher::new(&store, &backend, DEFAULT_MAX_ATTEMPTS);

        let mut findings = vec![finding(Severity::High, "R1")];
        enricher.enrich(&mut findings).await.unwrap();

        assert_eq!(backend.calls(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(findings[0].recommendation.as_deref(), Some(NO_RECOMMENDATION));
        assert_eq!(*store.puts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn non_retryable_error_fails_after_one_call() {
        let store = MemStore::default();
        let backend = ScriptedBackend::new(Outcome::Unauthorized);
        let enricher = Enricher::new(&store, &backend, DEFAULT_MAX_ATTEMPTS);

        let mut findings = vec![finding(Severity::High, "R1")];
        enricher.enrich(&mut findings).await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(findings[0].recommendation.as_deref(), Some(NO_RECOMMENDATION));
    }

    #[tokio::test]
    async fn shared_fingerprint_is_enriched_once() {
        // Same rule/title/description, different severity and location:
        // the second finding must be served from the write-through of the
        // first.
        let store = MemStore::default();
        let backend = ScriptedBackend::new(Outcome::Succeed("shared advice"));
        let enricher = Enricher::new(&store, &backend, DEFAULT_MAX_ATTEMPTS);

        let mut findings = vec![finding(Severity::High, "R1"), finding(Severity::Medium, "R1")];
        findings[1].file = "elsewhere.js".into();
        assert_eq!(fingerprint(&findings[0]), fingerprint(&findings[1]));

        enricher.enrich(&mut findings).await.unwrap();

        assert_eq!(backend.calls(), 1);
        assert_eq!(findings[0].recommendation.as_deref(), Some("shared advice"));
        assert_eq!(findings[1].recommendation.as_deref(), Some("shared advice"));
    }

    #[tokio::test]
    async fn store_round_trip_is_first_write_wins() {
        let store = MemStore::default();
        store.put("k", "first").await.unwrap();
        store.put("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn backoff_grows_exponentially_with_bounded_jitter() {
        for attempt in 1..=4u32 {
            let base = Duration::from_secs(1 << attempt);
            let d = backoff_delay(attempt);
            assert!(d >= base, "attempt {attempt}: {d:?} < {base:?}");
            assert!(d < base + Duration::from_millis(500));
        }
    }

    #[test]
    fn title_preview_truncates() {
        let long = "x".repeat(80);
        let p = title_preview(&long);
        assert_eq!(p.chars().count(), 63);
        assert!(p.ends_with("..."));
        assert_eq!(title_preview("short"), "short");
    }
}
