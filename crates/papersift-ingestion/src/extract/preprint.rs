//! Preprint-server alerts (bioRxiv / medRxiv).
//!
//! Two passes whose results are unioned: HTML links into the servers, and a
//! plain-text scan that walks upward from each DOI line to find the author
//! line and, above it, the title.

use std::sync::OnceLock;

use papersift_common::text::find_doi;
use regex::Regex;
use scraper::ElementRef;

use super::style::{host_of, resolve_href};
use super::{is_link_label, selector, text_of, Candidate, ExtractionStrategy, MessageContext, StrategyOutput};

/// Lines scanned above a DOI before giving up.
pub const LOOKBACK_LINES: usize = 8;
pub const MIN_TEXT_TITLE_CHARS: usize = 20;

pub struct PreprintDigest;

impl ExtractionStrategy for PreprintDigest {
    fn name(&self) -> &'static str {
        "preprint"
    }

    fn extract(&self, ctx: &MessageContext<'_>) -> StrategyOutput {
        let mut out = anchor_pass(ctx);
        out.extend(text_pass(ctx));
        out.into()
    }
}

fn version_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"v\d+$").unwrap())
}

/// Drop the `v2` style revision suffix servers append to DOIs.
pub fn strip_version(doi: &str) -> String {
    version_suffix_regex().replace(doi, "").into_owned()
}

fn server_venue(haystack: &str) -> &'static str {
    if haystack.to_lowercase().contains("medrxiv") {
        "medRxiv"
    } else {
        "bioRxiv"
    }
}

fn is_server_host(host: &str) -> bool {
    host.ends_with("biorxiv.org") || host.ends_with("medrxiv.org")
}

// ── HTML links ───────────────────────────────────────────────────────────────

fn anchor_pass(ctx: &MessageContext<'_>) -> Vec<Candidate> {
    let Some(doc) = &ctx.document else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for a in doc.select(selector!("a[href]")) {
        let href = resolve_href(a.value().attr("href").unwrap_or_default());
        if !host_of(&href).is_some_and(|h| is_server_host(&h)) {
            continue;
        }
        let title = text_of(a);
        if title.is_empty() || is_link_label(&title) {
            continue;
        }
        let authors = block_of(a)
            .and_then(|b| b.next_siblings().find_map(ElementRef::wrap))
            .map(text_of)
            .filter(|t| is_author_line(t));

        let mut fragment = title.clone();
        if let Some(ref au) = authors {
            fragment.push('\n');
            fragment.push_str(au);
        }
        out.push(Candidate {
            venue: server_venue(&format!("{href} {}", ctx.sender())).to_string(),
            doi: find_doi(&href).map(|d| strip_version(&d)),
            title,
            authors,
            abstract_text: None,
            fragment,
        });
    }
    out
}

/// Closest block-level ancestor of a link.
fn block_of(a: ElementRef<'_>) -> Option<ElementRef<'_>> {
    a.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "p" | "div" | "li" | "tr" | "td" | "h2" | "h3" | "h4"))
}

// ── Plain text ───────────────────────────────────────────────────────────────

fn text_pass(ctx: &MessageContext<'_>) -> Vec<Candidate> {
    let lines = &ctx.lines;
    let mut out = Vec::new();
    // The walk never crosses the previous article's DOI line.
    let mut floor = 0;
    for (i, line) in lines.iter().enumerate() {
        let Some(doi) = find_doi(line) else { continue };
        let window_start = i.saturating_sub(LOOKBACK_LINES).max(floor);
        floor = i + 1;
        let window = &lines[window_start..i];

        let Some(author_idx) = window
            .iter()
            .rposition(|l| !is_skippable(l) && is_author_line(l))
        else {
            continue;
        };
        let Some(title) = window[..author_idx]
            .iter()
            .rev()
            .find(|l| !is_skippable(l) && l.chars().count() >= MIN_TEXT_TITLE_CHARS)
        else {
            continue;
        };

        let context = format!("{} {} {}", window.join(" "), line, ctx.sender());
        out.push(Candidate {
            title: title.clone(),
            authors: Some(window[author_idx].clone()),
            abstract_text: None,
            doi: Some(strip_version(&doi)),
            venue: server_venue(&context).to_string(),
            fragment: lines[window_start..=i].join("\n"),
        });
    }
    out
}

/// Blank lines, "posted on bioRxiv" notices, `[label]` lines and bare
/// URL/DOI lines never hold a title or an author list.
fn is_skippable(line: &str) -> bool {
    let l = line.trim();
    if l.is_empty() {
        return true;
    }
    let lower = l.to_lowercase();
    (lower.starts_with("posted") && lower.contains("rxiv"))
        || (l.starts_with('[') && l.ends_with(']'))
        || lower.starts_with("http")
        || lower.starts_with("doi")
        || find_doi(l).is_some_and(|d| l.len() <= d.len() + 20)
}

/// "A, B and C" or at least three commas.
pub fn is_author_line(line: &str) -> bool {
    let commas = line.matches(',').count();
    (line.contains(" and ") && commas >= 1) || commas >= 3
}
