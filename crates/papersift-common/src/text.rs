//! Text normalisation helpers shared by extraction, dedup and validation.

use regex::Regex;
use scraper::{ElementRef, Html};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Elements whose boundaries end a visual line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "div", "dl", "dt", "dd", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre",
    "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "head", "title", "noscript"];

/// Strip tags and decode entities, keeping one line per block element.
pub fn html_to_lines(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut buf = String::new();
    walk_text(doc.root_element(), &mut buf);
    buf.lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Strip tags and decode entities (named and numeric) into a single line.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut buf = String::new();
    walk_text(doc.root_element(), &mut buf);
    collapse_whitespace(&buf)
}

/// Text content of an element with block boundaries turned into spaces.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut buf = String::new();
    walk_text(el, &mut buf);
    collapse_whitespace(&buf)
}

fn walk_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if SKIPPED_TAGS.contains(&name) {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            walk_text(child_el, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Collapse runs of whitespace (including NBSP) to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unicode-decompose and drop combining marks ("é" → "e").
pub fn fold_diacritics(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Full matching normalisation: de-tag, decode, fold, lowercase, collapse.
pub fn normalize_for_matching(s: &str) -> String {
    let text = if looks_like_markup(s) { html_to_text(s) } else { s.to_string() };
    collapse_whitespace(&fold_diacritics(&text).to_lowercase())
}

/// Keep only alphanumeric characters.
pub fn alnum_only(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Title key used for duplicate detection: lowercase, non-word characters
/// stripped, whitespace collapsed.
pub fn title_key(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    collapse_whitespace(&stripped)
}

/// Truncate on a char boundary, appending nothing.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// ~1 token per 4 characters of de-tagged text, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// First DOI-shaped token in `s`, trailing punctuation removed.
pub fn find_doi(s: &str) -> Option<String> {
    doi_regex().find(s).map(|m| clean_doi(m.as_str()))
}

fn clean_doi(raw: &str) -> String {
    raw.trim_end_matches(['.', ',', ';', ')', ']', '>']).to_string()
}

fn doi_regex() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\b10\.\d{4,9}/[^\s"'<>]+"#).unwrap())
}

fn looks_like_markup(s: &str) -> bool {
    s.contains('<') || s.contains('&')
}
