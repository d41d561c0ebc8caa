//! Remote recommendation cache backed by Cloudflare D1.
//!
//! Why cache?
//! - Scans repeat across CI runs and branches; the same issue pattern
//!   re-appears with different locations.
//! - Provider calls are slow and rate limited; a content-addressed cache
//!   amortizes them to one call per unique pattern, ever.
//!
//! Key: the 64-hex SHA-256 fingerprint of the finding's semantic identity.
//! Table: `recommendations (cache_key UNIQUE, recommendation TEXT)`,
//! provisioned idempotently on startup. Writes use
//! `INSERT ... ON CONFLICT(cache_key) DO NOTHING`, so the first successful
//! writer wins and concurrent writers from parallel CI runs never error.
//!
//! Transport/auth failures are hard errors ([`CacheError`]), never
//! interpreted as a miss.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::CacheError;

const ENSURE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS recommendations (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, \
     cache_key TEXT UNIQUE, \
     recommendation TEXT\
 );";
const GET_SQL: &str =
    "SELECT recommendation FROM recommendations WHERE cache_key = ? LIMIT 1";
const PUT_SQL: &str = "INSERT INTO recommendations (cache_key, recommendation) \
     VALUES (?, ?) ON CONFLICT(cache_key) DO NOTHING";

/// HTTP client for the D1 query endpoint.
#[derive(Debug)]
pub struct D1Cache {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl D1Cache {
    /// Builds the cache client from environment variables:
    /// `CLOUDFLARE_ACCOUNT_ID`, `D1_DATABASE_ID`, `D1_API_KEY`.
    ///
    /// # Errors
    /// Returns [`CacheError::MissingVar`] when any coordinate or the
    /// credential is absent — fatal at startup, before any processing.
    pub fn from_env() -> Result<Self, CacheError> {
        let account_id = must_env("CLOUDFLARE_ACCOUNT_ID")?;
        let database_id = must_env("D1_DATABASE_ID")?;
        let api_key = must_env("D1_API_KEY")?;

        let endpoint = format!(
            "https://api.cloudflare.com/client/v4/accounts/{account_id}/d1/database/{database_id}/query"
        );
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        })
    }

    /// Idempotently provisions the `recommendations` table. An
    /// already-existing table is success, not an error.
    pub async fn ensure_table(&self) -> Result<(), CacheError> {
        self.query(ENSURE_TABLE_SQL, &[]).await?;
        debug!("recommendations table ready");
        Ok(())
    }

    /// Point lookup by fingerprint. `Ok(None)` is a miss, not an error.
    pub async fn get(&self, fingerprint: &str) -> Result<Option<String>, CacheError> {
        let rows = self.query(GET_SQL, &[fingerprint]).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("recommendation"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Insert-if-absent. If another writer already stored this fingerprint
    /// the call succeeds without overwriting.
    pub async fn put(&self, fingerprint: &str, recommendation: &str) -> Result<(), CacheError> {
        self.query(PUT_SQL, &[fingerprint, recommendation]).await?;
        Ok(())
    }

    /// Runs one parameterized query and returns its result rows.
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Value>, CacheError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&QueryRequest { sql, params })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(CacheError::HttpStatus {
                status: status.as_u16(),
                message: first_error_message(&body),
            });
        }
        parse_rows(&body)
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    sql: &'a str,
    params: &'a [&'a str],
}

/// D1 query envelope: `result[0].results` holds the rows.
#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Vec<QueryResult>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

/// Decodes a successful D1 response body into rows.
fn parse_rows(body: &str) -> Result<Vec<Value>, CacheError> {
    let envelope: QueryEnvelope = serde_json::from_str(body)?;
    if !envelope.success {
        return Err(CacheError::InvalidResponse(
            envelope
                .errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "success=false with no error message".to_string()),
        ));
    }
    Ok(envelope
        .result
        .into_iter()
        .next()
        .map(|r| r.results)
        .unwrap_or_default())
}

/// Best-effort extraction of the API error message from a failure body.
fn first_error_message(body: &str) -> String {
    serde_json::from_str::<QueryEnvelope>(body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| {
            let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
            flat.chars().take(200).collect()
        })
}

fn must_env(name: &'static str) -> Result<String, CacheError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CacheError::MissingVar(name)),
    }
}
