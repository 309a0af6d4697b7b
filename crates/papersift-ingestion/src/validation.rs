//! Hallucination validation.
//!
//! After scoring, every surviving title must be traceable to the original
//! message text of the session. Matching runs in order of decreasing
//! strength and the first success wins:
//!
//! 1. exact containment after matching normalisation
//! 2. containment after stripping everything but alphanumerics
//! 3. ≥70% of significant words present, two of them within 500 chars
//! 4. the first four significant words present as a phrase
//!
//! A paper with no match is removed from the refined output.

use papersift_common::models::{BodyFormat, MatchStrength, RawMessage, ScoredPaper, ValidationResult, MIN_TITLE_LEN};
use papersift_common::text::{alnum_only, html_to_text, normalize_for_matching, truncate_chars};
use serde::Serialize;
use tracing::{debug, warn};

/// Share of significant title words that must appear in the source.
pub const WORD_COVERAGE: f64 = 0.70;
/// Two matched words must occur within this many characters of each other.
pub const PROXIMITY_CHARS: usize = 500;
const MIN_SIGNIFICANT_LEN: usize = 4;
const EVIDENCE_CHARS: usize = 160;

/// Words never counted as significant.
pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "among", "been", "before", "being",
    "between", "both", "does", "during", "each", "from", "have", "having", "into", "more",
    "most", "only", "other", "over", "same", "should", "some", "such", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "under", "until",
    "upon", "very", "were", "what", "when", "where", "which", "while", "with", "within",
    "without", "would", "your", "study", "using", "based", "novel", "new",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationVerdict {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl ValidationVerdict {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.95 {
            Self::Excellent
        } else if rate >= 0.85 {
            Self::Good
        } else if rate >= 0.70 {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good      => "good",
            Self::Warning   => "warning",
            Self::Critical  => "critical",
        }
    }

}

impl std::fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovedPaper {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
    pub kept: Vec<ScoredPaper>,
    pub removed: Vec<RemovedPaper>,
    /// Share of papers with a match; 1.0 for empty input.
    pub rate: f64,
    pub verdict: ValidationVerdict,
}

/// Rewrites ascending byte offsets into `text` as char offsets in one pass.
fn to_char_offsets(text: &str, occurrences: &mut [(usize, usize)]) {
    let (mut last_byte, mut chars) = (0, 0);
    for (pos, _) in occurrences.iter_mut() {
        chars += text.get(last_byte..*pos).map_or(0, |gap| gap.chars().count());
        last_byte = *pos;
        *pos = chars;
    }
}

/// Outcome of matching one title, before it is attached to a paper.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    pub strength: MatchStrength,
    pub evidence: String,
}

impl TitleMatch {
    fn new(strength: MatchStrength, evidence: impl Into<String>) -> Self {
        Self { strength, evidence: evidence.into() }
    }
}

/// Holds the session's source text, normalised once.
pub struct Validator {
    source: String,
    source_alnum: String,
}

impl Validator {
    pub fn new(source_text: &str) -> Self {
        let source = normalize_for_matching(source_text);
        let source_alnum = alnum_only(&source);
        Self { source, source_alnum }
    }

    /// Source text is every subject line plus every de-tagged body.
    pub fn from_messages(messages: &[RawMessage]) -> Self {
        let text = messages
            .iter()
            .map(|m| {
                let body = match m.body_format {
                    BodyFormat::Html => html_to_text(&m.body),
                    BodyFormat::PlainText => m.body.clone(),
                };
                format!("{}\n{}", m.subject, body)
            })
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(&text)
    }

    pub fn check(&self, title: &str) -> TitleMatch {
        if title.trim().chars().count() < MIN_TITLE_LEN {
            return TitleMatch::new(MatchStrength::None, format!("title shorter than {MIN_TITLE_LEN} characters"));
        }
        let norm = normalize_for_matching(title);

        if let Some(pos) = self.source.find(&norm) {
            return TitleMatch::new(MatchStrength::Exact, self.excerpt(pos));
        }

        let alnum = alnum_only(&norm);
        if !alnum.is_empty() && self.source_alnum.contains(&alnum) {
            return TitleMatch::new(MatchStrength::Normalized, "matched after stripping non-alphanumerics");
        }

        let words = significant_words(&norm);
        if words.len() >= 3 {
            if let Some(evidence) = self.word_coverage(&words) {
                return TitleMatch::new(MatchStrength::Partial, evidence);
            }
        }

        if words.len() >= 4 {
            let phrase = words[..4].join(" ");
            if let Some(pos) = self.source.find(&phrase) {
                return TitleMatch::new(MatchStrength::Partial, format!("leading words \"{phrase}\": {}", self.excerpt(pos)));
            }
        }

        TitleMatch::new(
            MatchStrength::None,
            format!("not found in source text ({} significant words)", words.len()),
        )
    }

    /// Step 3: coverage plus proximity of two distinct matched words.
    fn word_coverage(&self, words: &[String]) -> Option<String> {
        let mut occurrences: Vec<(usize, usize)> = Vec::new();
        let mut matched = 0usize;
        for (i, word) in words.iter().enumerate() {
            let before = occurrences.len();
            occurrences.extend(self.source.match_indices(word.as_str()).map(|(pos, _)| (pos, i)));
            if occurrences.len() > before {
                matched += 1;
            }
        }

        let coverage = matched as f64 / words.len() as f64;
        if coverage < WORD_COVERAGE {
            return None;
        }

        // Sorted by position, the closest pair of different words is adjacent.
        occurrences.sort_unstable();
        to_char_offsets(&self.source, &mut occurrences);
        let closest = occurrences
            .windows(2)
            .filter(|w| w[0].1 != w[1].1)
            .map(|w| w[1].0 - w[0].0)
            .min()?;
        (closest <= PROXIMITY_CHARS).then(|| {
            format!("{matched}/{} significant words present, nearest pair {closest} chars apart", words.len())
        })
    }

    fn excerpt(&self, byte_pos: usize) -> String {
        let tail = self.source.get(byte_pos..).unwrap_or_default();
        truncate_chars(tail, EVIDENCE_CHARS)
    }

    /// Validate every paper; unverifiable ones are removed.
    pub fn validate(&self, papers: Vec<ScoredPaper>) -> ValidationReport {
        let total = papers.len();
        let mut results = Vec::with_capacity(total);
        let mut kept = Vec::new();
        let mut removed = Vec::new();

        for paper in papers {
            let m = self.check(&paper.title);
            if m.strength.is_verified() {
                debug!(title = %paper.title, strength = m.strength.as_str(), "Title verified");
                kept.push(paper.clone());
            } else {
                warn!(title = %paper.title, reason = %m.evidence, "Removing unverifiable paper");
                removed.push(RemovedPaper { title: paper.title.clone(), reason: m.evidence.clone() });
            }
            results.push(ValidationResult { paper, match_strength: m.strength, evidence: m.evidence });
        }

        let rate = if total == 0 { 1.0 } else { kept.len() as f64 / total as f64 };
        ValidationReport { results, kept, removed, rate, verdict: ValidationVerdict::from_rate(rate) }
    }
}

/// Significant words: alphanumeric runs longer than three characters that
/// are not stop words, in title order.
pub fn significant_words(normalised_title: &str) -> Vec<String> {
    normalised_title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_LEN && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}
