//! Aggregator digests (Google Scholar alerts).
//!
//! Each article is an `<h3>` holding a styled title link, followed by a
//! green citation line ("authors - venue, year - host") and a snippet.

use std::sync::OnceLock;

use papersift_common::text::find_doi;
use regex::Regex;
use scraper::ElementRef;

use super::style::{has_color, has_style, resolve_href, style_of};
use super::{selector, text_of, Candidate, ExtractionStrategy, MessageContext, StrategyOutput};

/// Colour of the citation line in Scholar alert templates.
pub const CITATION_COLOR: &str = "#006621";
pub const FALLBACK_VENUE: &str = "Google Scholar";

pub struct ScholarDigest;

impl ExtractionStrategy for ScholarDigest {
    fn name(&self) -> &'static str {
        "scholar"
    }

    fn extract(&self, ctx: &MessageContext<'_>) -> StrategyOutput {
        let Some(doc) = &ctx.document else {
            return StrategyOutput::default();
        };

        let mut out = Vec::new();
        for h3 in doc.select(selector!("h3")) {
            let Some(link) = h3.select(selector!("a")).find(|a| is_title_link(*a)) else {
                continue;
            };
            let title = text_of(link);
            let href = link.value().attr("href").map(resolve_href).unwrap_or_default();

            let (citation, snippet) = citation_and_snippet(h3);
            let (authors, venue) = citation.as_deref().map(parse_citation).unwrap_or((None, None));

            let fragment = [Some(title.as_str()), citation.as_deref(), snippet.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("\n");

            out.push(Candidate {
                title,
                authors,
                abstract_text: snippet,
                doi: find_doi(&href),
                venue: venue.unwrap_or_else(|| FALLBACK_VENUE.to_string()),
                fragment,
            });
        }
        out.into()
    }
}

fn is_title_link(a: ElementRef<'_>) -> bool {
    let class_match = a
        .value()
        .attr("class")
        .is_some_and(|c| c.contains("gse_alrt_title"));
    class_match || has_style(a)
}

fn is_citation(el: ElementRef<'_>) -> bool {
    has_color(&style_of(el), CITATION_COLOR)
        || el
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|d| has_color(&style_of(d), CITATION_COLOR))
}

/// Walk the heading's following siblings up to the next heading.
fn citation_and_snippet(h3: ElementRef<'_>) -> (Option<String>, Option<String>) {
    let mut citation = None;
    let mut snippet = None;
    for sib in h3.next_siblings().filter_map(ElementRef::wrap) {
        if sib.value().name() == "h3" || sib.select(selector!("h3")).next().is_some() {
            break;
        }
        let text = text_of(sib);
        if text.is_empty() {
            continue;
        }
        if citation.is_none() && is_citation(sib) {
            citation = Some(text);
        } else if snippet.is_none() {
            snippet = Some(text);
        }
        if citation.is_some() && snippet.is_some() {
            break;
        }
    }
    (citation, snippet)
}

fn trailing_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[,\s]*\b(?:19|20)\d{2}\s*$").unwrap())
}

/// "A Author, B Author - Venue Name, 2024 - host.com" → (authors, venue).
/// Unusable venues come back as `None`.
pub fn parse_citation(line: &str) -> (Option<String>, Option<String>) {
    let line = line.replace('\u{a0}', " ");
    let parts: Vec<&str> = line.split(" - ").map(str::trim).collect();

    let authors = parts.first().filter(|a| !a.is_empty()).map(|a| a.to_string());
    let venue = parts
        .get(1)
        .map(|v| trailing_year_regex().replace(v, "").trim().trim_end_matches(',').trim().to_string())
        .filter(|v| acceptable_venue(v));
    (authors, venue)
}

/// Rejects truncated ("…") or junk venue strings.
pub fn acceptable_venue(venue: &str) -> bool {
    venue.chars().count() >= 4
        && venue.chars().any(|c| c.is_alphabetic())
        && !venue.contains('…')
        && !venue.contains("...")
}
