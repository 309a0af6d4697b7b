//! Medical-association network digests (JAMA and its sub-journals).
//!
//! Two template generations are in circulation: titles as bold or large
//! links, and plain links wrapping a styled `<span>`. The sub-journal is
//! taken from the link, then the surrounding cell, then the subject.

use papersift_common::text::find_doi;
use scraper::ElementRef;

use super::style::{element_font_px, is_bold, resolve_href, style_of};
use super::{
    ancestor_named, container_of, is_link_label, is_within, selector, text_of, Candidate, ExtractionStrategy,
    MessageContext, StrategyOutput,
};

pub const DEFAULT_VENUE: &str = "JAMA";
pub const TITLE_MIN_PX: f32 = 16.0;
const MAX_AUTHOR_CHARS: usize = 300;
/// Enclosing tables searched for the author line beyond the link's cell.
const AUTHOR_TABLE_DEPTH: usize = 2;

const SUB_JOURNALS: &[&str] = &[
    "JAMA Cardiology",
    "JAMA Internal Medicine",
    "JAMA Network Open",
    "JAMA Neurology",
    "JAMA Oncology",
    "JAMA Pediatrics",
    "JAMA Psychiatry",
    "JAMA Surgery",
    "JAMA Health Forum",
    "JAMA Dermatology",
    "JAMA Ophthalmology",
    "JAMA Otolaryngology",
];

pub struct JamaDigest;

impl ExtractionStrategy for JamaDigest {
    fn name(&self) -> &'static str {
        "jama"
    }

    fn extract(&self, ctx: &MessageContext<'_>) -> StrategyOutput {
        let Some(doc) = &ctx.document else {
            return StrategyOutput::default();
        };

        let mut out = Vec::new();
        for a in doc.select(selector!("a[href]")) {
            let Some(title) = title_of(a) else { continue };
            if title.is_empty() || is_link_label(&title) {
                continue;
            }
            let href = resolve_href(a.value().attr("href").unwrap_or_default());
            let cell = container_of(a);
            let cell_text = cell.map(text_of).unwrap_or_default();

            let venue = sub_journal(&href)
                .or_else(|| sub_journal(&cell_text))
                .or_else(|| sub_journal(ctx.subject()))
                .unwrap_or(DEFAULT_VENUE);
            let authors = find_authors(a, &title);

            let mut fragment = if cell_text.is_empty() { title.clone() } else { cell_text };
            if let Some(ref au) = authors {
                if !fragment.contains(au.as_str()) {
                    fragment.push('\n');
                    fragment.push_str(au);
                }
            }

            out.push(Candidate {
                title,
                authors,
                abstract_text: None,
                doi: find_doi(&href),
                venue: venue.to_string(),
                fragment,
            });
        }
        out.into()
    }
}

fn is_emphasised(el: ElementRef<'_>) -> bool {
    let style = style_of(el);
    is_bold(&style) || element_font_px(el).is_some_and(|px| px >= TITLE_MIN_PX)
}

/// Title text for either template generation, `None` for other links.
fn title_of(a: ElementRef<'_>) -> Option<String> {
    if is_emphasised(a) {
        return Some(text_of(a));
    }
    a.select(selector!("span"))
        .find(|s| is_emphasised(*s))
        .map(text_of)
}

/// Longest sub-journal named in `text`, tried with and without spaces so
/// URL slugs like `jamacardiology` match.
pub fn sub_journal(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let squashed: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
    let mut names: Vec<&'static str> = SUB_JOURNALS.to_vec();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    names.into_iter().find(|name| {
        let n = name.to_lowercase();
        let n_squashed: String = n.chars().filter(|c| !c.is_whitespace()).collect();
        lower.contains(&n) || squashed.contains(&n_squashed)
    })
}

/// Author line after the link: first in its cell, then in up to two
/// enclosing tables.
fn find_authors(link: ElementRef<'_>, title: &str) -> Option<String> {
    let mut scopes: Vec<ElementRef<'_>> = container_of(link).into_iter().collect();
    let mut cursor = link;
    for _ in 0..AUTHOR_TABLE_DEPTH {
        match ancestor_named(cursor, "table") {
            Some(table) => {
                scopes.push(table);
                cursor = table;
            }
            None => break,
        }
    }
    scopes.into_iter().find_map(|scope| find_author_after(scope, link, title))
}

fn find_author_after(scope: ElementRef<'_>, link: ElementRef<'_>, title: &str) -> Option<String> {
    let mut past_link = false;
    for el in scope.descendants().filter_map(ElementRef::wrap) {
        if el.id() == link.id() {
            past_link = true;
            continue;
        }
        if !past_link || is_within(el, link) {
            continue;
        }
        // The next article's title ends this one's region.
        if el.value().name() == "a" && title_of(el).is_some() {
            return None;
        }
        // Leaf-ish blocks only, so a whole row is not read as one author line.
        if el.children().filter_map(ElementRef::wrap).any(|c| !matches!(c.value().name(), "span" | "b" | "i" | "em" | "strong" | "br")) {
            continue;
        }
        let text = text_of(el);
        if text.is_empty() || text == title || text.chars().count() >= MAX_AUTHOR_CHARS {
            continue;
        }
        if text.to_lowercase().contains("et al") || text.matches(',').count() >= 2 {
            return Some(text);
        }
    }
    None
}
