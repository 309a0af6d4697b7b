//! Data models shared by every pipeline stage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Titles shorter than this are never accepted anywhere in the pipeline.
pub const MIN_TITLE_LEN: usize = 10;

/// Body encoding of an inbound alert message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    Html,
    #[serde(alias = "text", alias = "plain")]
    PlainText,
}

impl BodyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyFormat::Html      => "html",
            BodyFormat::PlainText => "plaintext",
        }
    }
}

/// An alert message as handed over by the ingestion collaborator.
/// Never mutated by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub sender_address: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
    pub body: String,
    pub body_format: BodyFormat,
}

/// A candidate paper pulled out of one alert message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedArticle {
    pub title: String,
    pub authors: Option<String>,
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    /// Venue label (journal, preprint server, or aggregator fallback).
    pub source_name: String,
    /// De-tagged text of the region the article was found in.
    pub origin_fragment: String,
    pub estimated_tokens: usize,
    /// Id of the RawMessage this article came from.
    pub message_id: String,
}

impl ExtractedArticle {
    /// Text submitted to the oracle for this article.
    pub fn oracle_text(&self) -> String {
        let mut out = self.title.clone();
        if let Some(ref a) = self.authors {
            out.push_str("\nAuthors: ");
            out.push_str(a);
        }
        out.push_str("\nVenue: ");
        out.push_str(&self.source_name);
        if let Some(ref abs) = self.abstract_text {
            out.push('\n');
            out.push_str(abs);
        } else if self.authors.is_none() {
            // Fallback articles carry the whole message in the fragment.
            out.push('\n');
            out.push_str(&self.origin_fragment);
        }
        out
    }

    /// Snippet used for keyword scoring: abstract if present, else fragment.
    pub fn snippet(&self, max_chars: usize) -> String {
        let src = self.abstract_text.as_deref().unwrap_or(&self.origin_fragment);
        crate::text::truncate_chars(src, max_chars)
    }
}

/// One group of articles submitted to the oracle in a single call.
/// `index` is the batch's position in the plan, stable across retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticleBatch {
    pub index: usize,
    pub articles: Vec<ExtractedArticle>,
}

impl ArticleBatch {
    pub fn total_tokens(&self) -> usize {
        self.articles.iter().map(|a| a.estimated_tokens).sum()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// A paper accepted after scoring; the unit persisted downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPaper {
    pub id: Uuid,
    pub title: String,
    pub authors: Vec<String>,
    pub snippet: String,
    pub source_name: String,
    pub publication_date: NaiveDate,
    /// Always within [0, 100].
    pub relevance_score: u8,
    pub matched_keywords: Vec<String>,
    pub matched_penalties: Vec<String>,
}

/// How strongly a title was found in the original source text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrength {
    None,
    Partial,
    Normalized,
    Exact,
}

impl MatchStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrength::Exact      => "exact",
            MatchStrength::Normalized => "normalized",
            MatchStrength::Partial    => "partial",
            MatchStrength::None       => "none",
        }
    }

    pub fn is_verified(&self) -> bool {
        *self != MatchStrength::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub paper: ScoredPaper,
    pub match_strength: MatchStrength,
    pub evidence: String,
}

/// Degrees and fellowships that follow names in clinical-journal bylines.
const CREDENTIALS: &[&str] = &[
    "md", "phd", "mph", "ms", "msc", "mscr", "mba", "mbbs", "mbchb", "bsc", "dphil", "drph", "pharmd",
    "rn", "frcp", "frcpc", "facc", "faha", "mhs",
];

fn is_credential(word: &str) -> bool {
    let bare: String = word.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase();
    CREDENTIALS.contains(&bare.as_str())
}

fn strip_et_al(name: &str) -> &str {
    let trimmed = name.trim().trim_end_matches(['…', '.']).trim_end();
    let cut = trimmed.len().saturating_sub("et al".len());
    match (trimmed.get(..cut), trimmed.get(cut..)) {
        (Some(rest), Some(tail)) if tail.eq_ignore_ascii_case("et al") && (rest.is_empty() || rest.ends_with(' ')) => {
            rest.trim_end()
        }
        _ => trimmed,
    }
}

/// Split a free-text author line into individual names. Trailing
/// "et al." and degree suffixes ("MD", "PhD") are not names.
pub fn split_authors(line: &str) -> Vec<String> {
    line.split([',', ';'])
        .flat_map(|part| part.split(" and "))
        .flat_map(|part| part.split(" & "))
        .filter_map(|part| {
            let mut words: Vec<&str> = strip_et_al(part).split_whitespace().collect();
            while words.last().is_some_and(|w| is_credential(w)) {
                words.pop();
            }
            (!words.is_empty()).then(|| words.join(" "))
        })
        .collect()
}
