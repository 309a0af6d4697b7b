//! Structural article extraction.
//!
//! Each alert layout has one [`ExtractionStrategy`]. [`strategies_for`] maps
//! a classified source to the strategies to run: the publisher's own for a
//! known source, all of them for `Unknown`. When nothing is found the
//! message becomes a single fallback article so no alert is ever lost.

use std::collections::HashSet;

use papersift_common::models::{BodyFormat, ExtractedArticle, RawMessage, MIN_TITLE_LEN};
use papersift_common::text::{
    collapse_whitespace, element_text, estimate_tokens, find_doi, html_to_lines, html_to_text, title_key,
    truncate_chars,
};
use scraper::{ElementRef, Html};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::classifier::{AlertSource, Publisher};

macro_rules! selector {
    ($css:expr) => {{
        static SEL: std::sync::OnceLock<scraper::Selector> = std::sync::OnceLock::new();
        SEL.get_or_init(|| scraper::Selector::parse($css).unwrap())
    }};
}
pub(crate) use selector;

pub mod aha;
pub mod jama;
pub mod nature;
pub mod preprint;
pub mod scholar;
pub mod style;

/// Characters of de-tagged context kept on each article.
pub const FRAGMENT_CHARS: usize = 1_500;
/// The fallback article carries more of the body since it is all there is.
pub const FALLBACK_FRAGMENT_CHARS: usize = 6_000;
/// Per-strategy duplicate key length.
pub const DEDUP_KEY_CHARS: usize = 60;

// ── Strategy contract ─────────────────────────────────────────────────────────

/// Parsed views of one message shared by every strategy.
pub struct MessageContext<'a> {
    pub message: &'a RawMessage,
    /// Present for HTML bodies only.
    pub document: Option<Html>,
    /// De-tagged body split into trimmed lines.
    pub lines: Vec<String>,
}

impl<'a> MessageContext<'a> {
    pub fn new(message: &'a RawMessage) -> Self {
        match message.body_format {
            BodyFormat::Html => Self {
                message,
                document: Some(Html::parse_document(&message.body)),
                lines: html_to_lines(&message.body),
            },
            BodyFormat::PlainText => Self {
                message,
                document: None,
                lines: message.body.lines().map(|l| l.trim().to_string()).collect(),
            },
        }
    }

    pub fn subject(&self) -> &str {
        &self.message.subject
    }

    pub fn sender(&self) -> &str {
        &self.message.sender_address
    }
}

/// One article as found by a strategy, before it becomes an
/// [`ExtractedArticle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub authors: Option<String>,
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub venue: String,
    pub fragment: String,
}

#[derive(Debug, Default)]
pub struct StrategyOutput {
    pub candidates: Vec<Candidate>,
    /// Set by strategies that narrow the document before parsing:
    /// `Some(false)` means narrowing found nothing and the whole document
    /// was parsed instead.
    pub narrowed: Option<bool>,
}

impl From<Vec<Candidate>> for StrategyOutput {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self { candidates, narrowed: None }
    }
}

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, ctx: &MessageContext<'_>) -> StrategyOutput;
}

/// The one dispatch point from source to strategies.
pub fn strategies_for(source: AlertSource) -> Vec<Box<dyn ExtractionStrategy>> {
    match source {
        AlertSource::Known(p) => vec![strategy_for(p)],
        AlertSource::Unknown => Publisher::ALL.iter().map(|p| strategy_for(*p)).collect(),
    }
}

fn strategy_for(publisher: Publisher) -> Box<dyn ExtractionStrategy> {
    match publisher {
        Publisher::GoogleScholar   => Box::new(scholar::ScholarDigest),
        Publisher::AhaJournals     => Box::new(aha::AhaDigest),
        Publisher::NaturePortfolio => Box::new(nature::NatureDigest),
        Publisher::Preprint        => Box::new(preprint::PreprintDigest),
        Publisher::JamaNetwork     => Box::new(jama::JamaDigest),
    }
}

// ── Result types ──────────────────────────────────────────────────────────────

/// Structural assumptions did not hold; the message was kept as one
/// whole-message article instead.
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
#[error("no articles extracted from message {message_id} ({alert_source}): {reason}")]
pub struct ExtractionFailure {
    pub message_id: String,
    pub alert_source: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub articles: Vec<ExtractedArticle>,
    pub fallback: Option<ExtractionFailure>,
    pub strategies: Vec<&'static str>,
    pub narrowed: Option<bool>,
}

impl Extraction {
    pub fn used_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Extract every article from one message. Pure.
pub fn extract(message: &RawMessage, source: AlertSource) -> Extraction {
    let ctx = MessageContext::new(message);
    let strategies = strategies_for(source);

    let mut candidates = Vec::new();
    let mut narrowed = None;
    let mut names = Vec::with_capacity(strategies.len());
    for strategy in &strategies {
        let out = strategy.extract(&ctx);
        debug!(
            message_id = %message.id,
            strategy = strategy.name(),
            candidates = out.candidates.len(),
            "Strategy finished"
        );
        if out.narrowed == Some(false) {
            debug!(message_id = %message.id, "No research section heading matched; parsed whole document");
        }
        narrowed = narrowed.or(out.narrowed);
        names.push(strategy.name());
        candidates.extend(out.candidates);
    }

    let articles = finish(&message.id, dedup_candidates(candidates));
    if !articles.is_empty() {
        return Extraction { articles, fallback: None, strategies: names, narrowed };
    }

    let reason = match source {
        AlertSource::Known(_) => format!("{} found no article structure", names.join(", ")),
        AlertSource::Unknown => "unrecognised sender; no strategy matched".to_string(),
    };
    Extraction {
        articles: vec![fallback_article(message, source)],
        fallback: Some(ExtractionFailure {
            message_id: message.id.clone(),
            alert_source: source.label().to_string(),
            reason,
        }),
        strategies: names,
        narrowed,
    }
}

/// Drop too-short titles and repeats of the same truncated title key,
/// keeping the first occurrence.
pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|mut c| {
            c.title = clean_title(&c.title);
            if c.title.chars().count() < MIN_TITLE_LEN {
                return None;
            }
            let key = truncate_chars(&title_key(&c.title), DEDUP_KEY_CHARS);
            seen.insert(key).then_some(c)
        })
        .collect()
}

fn finish(message_id: &str, candidates: Vec<Candidate>) -> Vec<ExtractedArticle> {
    candidates
        .into_iter()
        .map(|c| {
            let mut article = ExtractedArticle {
                title: c.title,
                authors: c.authors.map(|a| collapse_whitespace(&a)).filter(|a| !a.is_empty()),
                abstract_text: c.abstract_text.map(|a| collapse_whitespace(&a)).filter(|a| !a.is_empty()),
                doi: c.doi,
                source_name: c.venue,
                origin_fragment: truncate_chars(&collapse_whitespace(&c.fragment), FRAGMENT_CHARS),
                estimated_tokens: 0,
                message_id: message_id.to_string(),
            };
            article.estimated_tokens = estimate_tokens(&article.oracle_text());
            article
        })
        .collect()
}

/// Whole-message article: subject as title, de-tagged body as fragment.
pub fn fallback_article(message: &RawMessage, source: AlertSource) -> ExtractedArticle {
    let body = match message.body_format {
        BodyFormat::Html => html_to_text(&message.body),
        BodyFormat::PlainText => message.body.clone(),
    };
    let mut article = ExtractedArticle {
        title: strip_reply_prefixes(&message.subject),
        authors: None,
        abstract_text: None,
        doi: find_doi(&body),
        source_name: source.default_venue().to_string(),
        origin_fragment: truncate_chars(&collapse_whitespace(&body), FALLBACK_FRAGMENT_CHARS),
        estimated_tokens: 0,
        message_id: message.id.clone(),
    };
    article.estimated_tokens = estimate_tokens(&article.oracle_text());
    article
}

/// Remove any number of leading "Re:", "Fwd:", "FW:" markers.
pub fn strip_reply_prefixes(subject: &str) -> String {
    let mut s = subject.trim();
    loop {
        let lower = s.to_lowercase();
        let cut = ["re:", "fwd:", "fw:", "aw:", "[ext]"]
            .iter()
            .find(|p| lower.starts_with(*p))
            .map(|p| p.len());
        match cut {
            Some(n) => s = s[n..].trim_start(),
            None => break,
        }
    }
    collapse_whitespace(s)
}

// ── Shared helpers for strategies ─────────────────────────────────────────────

/// Link texts that are never article titles.
const LINK_LABELS: &[&str] = &[
    "full text", "pdf", "abstract", "view article", "view abstract", "read more",
    "read the article", "download pdf", "supplemental material", "unsubscribe",
];

pub(crate) fn clean_title(raw: &str) -> String {
    collapse_whitespace(&raw.replace('\u{a0}', " "))
        .trim_matches(|c: char| c == '"' || c == '“' || c == '”')
        .trim()
        .to_string()
}

pub(crate) fn is_link_label(text: &str) -> bool {
    let t = text.trim().trim_matches(|c: char| c == '[' || c == ']').trim().to_lowercase();
    LINK_LABELS.contains(&t.as_str())
}

/// Collapsed text of an element, NBSP treated as space.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&element_text(el).replace('\u{a0}', " "))
}

/// Nearest ancestor element with the given tag name.
pub(crate) fn ancestor_named<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == tag)
}

/// Nearest `<td>` ancestor, or the parent element.
pub(crate) fn container_of(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    ancestor_named(el, "td").or_else(|| el.parent().and_then(ElementRef::wrap))
}

/// True when `node` is `ancestor` or lies inside it.
pub(crate) fn is_within(node: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    node.id() == ancestor.id() || node.ancestors().any(|a| a.id() == ancestor.id())
}

/// Pick the longest name from `names` found (case-insensitively) in `text`.
pub(crate) fn longest_name_in<'n>(text: &str, names: &[&'n str]) -> Option<&'n str> {
    let lower = text.to_lowercase();
    let mut sorted: Vec<&'n str> = names.to_vec();
    sorted.sort_by_key(|n| std::cmp::Reverse(n.len()));
    sorted.into_iter().find(|n| lower.contains(&n.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(subject: &str, body: &str, format: BodyFormat) -> RawMessage {
        RawMessage {
            id: "m1".to_string(),
            sender_address: "someone@example.com".to_string(),
            subject: subject.to_string(),
            received_at: Utc::now(),
            body: body.to_string(),
            body_format: format,
        }
    }

    #[test]
    fn test_known_source_runs_one_strategy() {
        assert_eq!(strategies_for(AlertSource::Known(Publisher::JamaNetwork)).len(), 1);
        let all: Vec<&str> = strategies_for(AlertSource::Unknown).iter().map(|s| s.name()).collect();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_fallback_keeps_whole_message() {
        let msg = message(
            "Fwd: RE: Weekly research roundup",
            "<html><body><p>Nothing structured here, doi 10.1161/CIR.0000000000001234.</p></body></html>",
            BodyFormat::Html,
        );
        let out = extract(&msg, AlertSource::Unknown);
        assert!(out.used_fallback());
        assert_eq!(out.articles.len(), 1);
        let a = &out.articles[0];
        assert_eq!(a.title, "Weekly research roundup");
        assert!(a.origin_fragment.contains("Nothing structured here"));
        assert_eq!(a.doi.as_deref(), Some("10.1161/CIR.0000000000001234"));
        assert!(a.estimated_tokens > 0);
    }

    #[test]
    fn test_candidate_dedup_uses_truncated_key() {
        let long = "A very long title about cardiac organoids that keeps going well past sixty characters";
        let c = |t: &str| Candidate { title: t.to_string(), ..Default::default() };
        let out = dedup_candidates(vec![
            c(long),
            c(&format!("{long} (extended)")),
            c("Short"),
            c("Another distinct article title"),
        ]);
        let titles: Vec<&str> = out.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec![long, "Another distinct article title"]);
    }

    #[test]
    fn test_strip_reply_prefixes() {
        assert_eq!(strip_reply_prefixes("RE: Fwd:  FW: New  results"), "New results");
        assert_eq!(strip_reply_prefixes("Research digest"), "Research digest");
    }

    #[test]
    fn test_link_labels() {
        assert!(is_link_label("[Full Text]"));
        assert!(is_link_label(" PDF "));
        assert!(!is_link_label("Cardiac organoids model fibrosis"));
    }
}
