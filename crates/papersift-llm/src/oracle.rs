//! The semantic scoring oracle: contract, failure taxonomy and the
//! LLM-backed adapter.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use papersift_common::config::KeywordSet;
use papersift_common::models::ArticleBatch;
use papersift_common::text::truncate_chars;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::backend::{LlmBackend, LlmError, LlmRequest, Message};
use crate::sanitize::{has_commentary, strip_commentary};

/// Raw oracle payloads are cut to this many characters before logging.
pub const RAW_PAYLOAD_LOG_CHARS: usize = 500;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleFailureKind {
    RateLimit,
    TokenLimit,
    Auth,
    Network,
    Malformed,
    Unknown,
}

impl OracleFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleFailureKind::RateLimit  => "rate_limit",
            OracleFailureKind::TokenLimit => "token_limit",
            OracleFailureKind::Auth       => "auth",
            OracleFailureKind::Network    => "network",
            OracleFailureKind::Malformed  => "malformed",
            OracleFailureKind::Unknown    => "unknown",
        }
    }

    /// Authentication failures will not fix themselves.
    pub fn is_retryable(&self) -> bool {
        *self != OracleFailureKind::Auth
    }
}

impl fmt::Display for OracleFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind} oracle failure: {message}")]
pub struct OracleError {
    pub kind: OracleFailureKind,
    pub message: String,
    /// Offending response, truncated, for `Malformed` failures.
    pub raw_payload: Option<String>,
    /// Server-requested wait before the next call (`Retry-After`).
    pub retry_after: Option<Duration>,
}

impl OracleError {
    pub fn new(kind: OracleFailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), raw_payload: None, retry_after: None }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn malformed(message: impl Into<String>, raw: &str) -> Self {
        Self {
            kind: OracleFailureKind::Malformed,
            message: message.into(),
            raw_payload: Some(truncate_chars(raw, RAW_PAYLOAD_LOG_CHARS)),
            retry_after: None,
        }
    }
}

fn mentions_token_limit(message: &str) -> bool {
    let m = message.to_lowercase();
    ["context length", "context window", "too many tokens", "maximum context", "max_tokens", "prompt is too long"]
        .iter()
        .any(|p| m.contains(p))
}

impl From<LlmError> for OracleError {
    fn from(err: LlmError) -> Self {
        use OracleFailureKind::*;
        let kind = match &err {
            LlmError::RateLimitExceeded { .. } => RateLimit,
            LlmError::ApiError { status, message } => match *status {
                401 | 403 => Auth,
                429 => RateLimit,
                413 => TokenLimit,
                400 if mentions_token_limit(message) => TokenLimit,
                500..=599 => Network,
                _ => Unknown,
            },
            LlmError::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() => Network,
            LlmError::Http(_) => Unknown,
            LlmError::Unavailable(_) => Network,
            LlmError::Serde(_) | LlmError::EmptyResponse => Malformed,
        };
        let retry_after = match &err {
            LlmError::RateLimitExceeded { retry_after_secs } => retry_after_secs.map(Duration::from_secs),
            _ => None,
        };
        OracleError::new(kind, err.to_string()).with_retry_after(retry_after)
    }
}

// ── Contract ──────────────────────────────────────────────────────────────────

/// One paper as judged by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleJudgment {
    /// Zero-based position of the article within its batch, when the
    /// oracle reported one that exists.
    pub index: Option<usize>,
    pub title: String,
    pub authors: Option<String>,
    pub venue: Option<String>,
    /// Semantic relevance in [0, 100].
    pub base_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredBatch {
    pub judgments: Vec<OracleJudgment>,
    /// Optional prose literature summary of the batch.
    pub review: Option<String>,
}

/// Assigns a base relevance score to every article in a batch.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(&self, batch: &ArticleBatch, keywords: &KeywordSet) -> Result<ScoredBatch, OracleError>;

    fn name(&self) -> &str {
        "oracle"
    }
}

#[async_trait]
impl<T: ScoringOracle + ?Sized> ScoringOracle for Arc<T> {
    async fn score(&self, batch: &ArticleBatch, keywords: &KeywordSet) -> Result<ScoredBatch, OracleError> {
        (**self).score(batch, keywords).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ── LLM adapter ───────────────────────────────────────────────────────────────

const SYSTEM_PROMPT: &str = "\
You rate newly published research articles for a researcher. \
For every numbered article, judge how relevant it is to the research interests \
and return a JSON object of the form \
{\"papers\": [{\"index\": <article number>, \"title\": <title copied exactly>, \
\"authors\": <author line or null>, \"venue\": <journal or server>, \"score\": <0-100>}], \
\"review\": <two or three sentence overview of the batch>}. \
Copy titles character for character. Never add notes, scores or reasons to a title. \
Include every article exactly once. Respond with JSON only.";

pub struct LlmScoringOracle<B: LlmBackend> {
    backend: B,
    max_output_tokens: u32,
    temperature: f32,
}

impl<B: LlmBackend> LlmScoringOracle<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, max_output_tokens: 4096, temperature: 0.1 }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn build_request(&self, batch: &ArticleBatch, keywords: &KeywordSet) -> LlmRequest {
        LlmRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(user_prompt(batch, keywords))],
            model: None,
            max_tokens: Some(self.max_output_tokens),
            temperature: Some(self.temperature),
            json_mode: true,
        }
    }
}

fn user_prompt(batch: &ArticleBatch, keywords: &KeywordSet) -> String {
    let mut out = String::new();
    out.push_str("Research interests: ");
    out.push_str(&keywords.positive.join(", "));
    if !keywords.penalty.is_empty() {
        out.push_str("\nDe-prioritise: ");
        out.push_str(&keywords.penalty.join(", "));
    }
    out.push_str("\n\nArticles:\n");
    for (i, article) in batch.articles.iter().enumerate() {
        out.push_str(&format!("\n[{}] {}\n", i + 1, article.oracle_text()));
    }
    out
}

#[async_trait]
impl<B: LlmBackend> ScoringOracle for LlmScoringOracle<B> {
    async fn score(&self, batch: &ArticleBatch, keywords: &KeywordSet) -> Result<ScoredBatch, OracleError> {
        let req = self.build_request(batch, keywords);
        let resp = self.backend.complete(req).await?;
        debug!(
            batch = batch.index,
            model = %resp.model,
            prompt_tokens = resp.prompt_tokens,
            completion_tokens = resp.completion_tokens,
            "Oracle responded"
        );
        parse_response(&resp.content, batch.len())
    }

    fn name(&self) -> &str {
        self.backend.model_id()
    }
}

// ── Response parsing ──────────────────────────────────────────────────────────

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap())
}

/// Cut the JSON document out of a response that may be wrapped in a code
/// fence or surrounded by prose.
fn json_region(content: &str) -> Option<&str> {
    let inner = code_fence_regex()
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(content);

    let start = inner.find(['{', '['])?;
    let close = if inner[start..].starts_with('{') { '}' } else { ']' };
    let end = inner.rfind(close)?;
    (end > start).then(|| &inner[start..=end])
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn text_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match &item[*k] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(parts) => {
            let joined: Vec<&str> = parts.iter().filter_map(Value::as_str).collect();
            (!joined.is_empty()).then(|| joined.join(", "))
        }
        _ => None,
    })
}

fn judgment_from(item: &Value, batch_len: usize) -> Option<OracleJudgment> {
    let base_score = ["score", "relevance", "base_score", "relevance_score"]
        .iter()
        .find_map(|k| number(&item[*k]))?;

    // Articles are numbered from 1 in the prompt.
    let index = ["index", "id", "number"]
        .iter()
        .find_map(|k| number(&item[*k]))
        .filter(|n| n.fract() == 0.0 && *n >= 1.0)
        .map(|n| n as usize - 1)
        .filter(|i| *i < batch_len);

    let title = match text_field(item, &["title"]) {
        Some(raw) => {
            if has_commentary(&raw) {
                debug!(title = %raw, "Stripped commentary from oracle title");
            }
            strip_commentary(&raw)
        }
        None => String::new(),
    };
    if title.is_empty() && index.is_none() {
        return None;
    }

    Some(OracleJudgment {
        index,
        title,
        authors: text_field(item, &["authors", "author"]),
        venue: text_field(item, &["venue", "source", "journal"]),
        base_score,
    })
}

/// Parse an oracle completion into judgments. Accepts either a bare JSON
/// array of papers or an object with a `papers` array and optional `review`.
pub fn parse_response(content: &str, batch_len: usize) -> Result<ScoredBatch, OracleError> {
    let region = json_region(content)
        .ok_or_else(|| OracleError::malformed("no JSON found in oracle response", content))?;
    let value: Value = serde_json::from_str(region)
        .map_err(|e| OracleError::malformed(format!("invalid JSON: {e}"), content))?;

    let (items, review) = match &value {
        Value::Array(items) => (items.as_slice(), None),
        Value::Object(obj) => {
            let items = ["papers", "articles", "results", "judgments"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array))
                .map(Vec::as_slice)
                .ok_or_else(|| OracleError::malformed("response object has no papers array", content))?;
            let review = obj
                .get("review")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            (items, review)
        }
        _ => return Err(OracleError::malformed("response is not an array or object", content)),
    };

    let judgments: Vec<OracleJudgment> = items.iter().filter_map(|i| judgment_from(i, batch_len)).collect();
    if judgments.len() < items.len() {
        debug!(skipped = items.len() - judgments.len(), "Oracle items without a usable score skipped");
    }
    Ok(ScoredBatch { judgments, review })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
