//! Portfolio-journal digests (Nature and sister journals).
//!
//! These emails mix research content with news, jobs and events. Parsing is
//! restricted to sections under research headings; each section runs until
//! the next `h1`–`h4`. Titles are large-font links, and the abstract and
//! author line are smaller-font siblings inside the same table cell.

use papersift_common::text::find_doi;
use scraper::ElementRef;

use super::style::{element_font_px, resolve_href};
use super::{
    container_of, is_link_label, is_within, longest_name_in, text_of, Candidate, ExtractionStrategy,
    MessageContext, StrategyOutput,
};

pub const DEFAULT_VENUE: &str = "Nature";
pub const TITLE_MIN_PX: f32 = 17.0;

/// Heading vocabulary marking research sections.
pub const RESEARCH_HEADINGS: &[&str] = &[
    "articles",
    "reviews",
    "news and views",
    "news & views",
    "letters",
    "research",
    "analysis",
    "research highlights",
    "perspectives",
];

const PORTFOLIO_TITLES: &[&str] = &[
    "Nature",
    "Nature Medicine",
    "Nature Biotechnology",
    "Nature Genetics",
    "Nature Methods",
    "Nature Cell Biology",
    "Nature Metabolism",
    "Nature Aging",
    "Nature Communications",
    "Nature Cardiovascular Research",
    "Nature Reviews Cardiology",
    "Nature Reviews Drug Discovery",
    "Nature Reviews Molecular Cell Biology",
    "Communications Biology",
    "Scientific Reports",
];

pub struct NatureDigest;

impl ExtractionStrategy for NatureDigest {
    fn name(&self) -> &'static str {
        "nature"
    }

    fn extract(&self, ctx: &MessageContext<'_>) -> StrategyOutput {
        let Some(doc) = &ctx.document else {
            return StrategyOutput::default();
        };
        let venue = longest_name_in(ctx.subject(), PORTFOLIO_TITLES).unwrap_or(DEFAULT_VENUE);

        // Single document-order pass: headings switch the section state.
        let mut in_research = false;
        let mut any_research_heading = false;
        let mut links: Vec<(ElementRef<'_>, bool)> = Vec::new();
        for el in doc.root_element().descendants().filter_map(ElementRef::wrap) {
            match el.value().name() {
                "h1" | "h2" | "h3" | "h4" => {
                    in_research = is_research_heading(&text_of(el));
                    any_research_heading |= in_research;
                }
                "a" if is_title_link(el) => links.push((el, in_research)),
                _ => {}
            }
        }

        let candidates = links
            .into_iter()
            .filter(|(_, in_section)| *in_section || !any_research_heading)
            .filter_map(|(link, _)| candidate_from(link, venue))
            .collect();

        StrategyOutput { candidates, narrowed: Some(any_research_heading) }
    }
}

pub fn is_research_heading(text: &str) -> bool {
    let norm: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '&' { c } else { ' ' })
        .collect();
    let padded = format!(" {} ", norm.split_whitespace().collect::<Vec<_>>().join(" "));
    RESEARCH_HEADINGS.iter().any(|h| padded.contains(&format!(" {h} ")))
}

/// A link whose own style, or a styled descendant's, is at least 17px.
fn is_title_link(a: ElementRef<'_>) -> bool {
    std::iter::once(a)
        .chain(a.descendants().filter_map(ElementRef::wrap))
        .filter_map(element_font_px)
        .any(|px| px >= TITLE_MIN_PX)
}

fn holds_title_link(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.descendants().filter_map(ElementRef::wrap))
        .any(|e| e.value().name() == "a" && is_title_link(e))
}

fn candidate_from(link: ElementRef<'_>, venue: &str) -> Option<Candidate> {
    let title = text_of(link);
    if title.is_empty() || is_link_label(&title) {
        return None;
    }
    let href = link.value().attr("href").map(resolve_href).unwrap_or_default();
    let cell = container_of(link)?;

    // Only elements after this title and before the next one belong to it.
    let mut abstract_text = None;
    let mut authors = None;
    let mut past_link = false;
    for el in cell.descendants().filter_map(ElementRef::wrap) {
        if el.id() == link.id() {
            past_link = true;
            continue;
        }
        if !past_link || is_within(el, link) {
            continue;
        }
        if holds_title_link(el) {
            break;
        }
        let Some(px) = element_font_px(el) else { continue };
        let text = text_of(el);
        if text.is_empty() {
            continue;
        }
        if abstract_text.is_none() && (14.0..=16.0).contains(&px) {
            abstract_text = Some(text);
        } else if authors.is_none() && px <= 13.0 {
            authors = Some(text);
        }
        if abstract_text.is_some() && authors.is_some() {
            break;
        }
    }

    Some(Candidate {
        doi: doi_from_href(&href),
        fragment: text_of(cell),
        title,
        authors,
        abstract_text,
        venue: venue.to_string(),
    })
}

/// nature.com article slugs are DOI suffixes under the 10.1038 prefix.
pub fn doi_from_href(href: &str) -> Option<String> {
    if let Some(doi) = find_doi(href) {
        return Some(doi);
    }
    let (_, rest) = href.split_once("nature.com/articles/")?;
    let slug = rest.split(['?', '#', '/']).next()?;
    (!slug.is_empty()).then(|| format!("10.1038/{slug}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use papersift_common::models::{BodyFormat, RawMessage};
    use pretty_assertions::assert_eq;

    fn message(subject: &str, body: &str) -> RawMessage {
        RawMessage {
            id: "nat".into(),
            sender_address: "alerts@nature.com".into(),
            subject: subject.into(),
            received_at: Utc::now(),
            body: body.into(),
            body_format: BodyFormat::Html,
        }
    }

    fn item(title: &str, slug: &str) -> String {
        format!(
            r#"<tr><td>
<a href="https://www.nature.com/articles/{slug}" style="font-size:18px;font-weight:bold">{title}</a>
<p style="font-size:15px">Abstract for {title}.</p>
<p style="font-size:12px">A. Author, B. Author &amp; C. Author</p>
</td></tr>"#
        )
    }

    #[test]
    fn test_narrows_to_research_sections() {
        let body = format!(
            r#"<html><body>
<h2>Jobs</h2><table>{}</table>
<h2>Articles</h2><table>{}</table>
<h3>Events</h3><table>{}</table>
<h3>News &amp; Views</h3><table>{}</table>
</body></html>"#,
            item("Postdoctoral fellow in cardiology", "job1"),
            item("Cardiac organoids map fibrosis trajectories", "s41591-024-0001-1"),
            item("Conference on heart regeneration", "ev1"),
            item("Vascular ageing comes into focus", "s41591-024-0002-2"),
        );
        let msg = message("Nature Medicine Volume 30 Issue 5", &body);
        let out = NatureDigest.extract(&MessageContext::new(&msg));
        assert_eq!(out.narrowed, Some(true));

        let titles: Vec<&str> = out.candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Cardiac organoids map fibrosis trajectories", "Vascular ageing comes into focus"]
        );
        let first = &out.candidates[0];
        assert_eq!(first.venue, "Nature Medicine");
        assert_eq!(first.abstract_text.as_deref(), Some("Abstract for Cardiac organoids map fibrosis trajectories."));
        assert_eq!(first.authors.as_deref(), Some("A. Author, B. Author & C. Author"));
        assert_eq!(first.doi.as_deref(), Some("10.1038/s41591-024-0001-1"));
    }

    #[test]
    fn test_unmatched_headings_parse_whole_document() {
        let body = format!(
            "<html><body><h2>This week</h2><table>{}</table></body></html>",
            item("Single-cell atlas of the human aorta", "s41586-024-1")
        );
        let out = NatureDigest.extract(&MessageContext::new(&message("Nature briefing", &body)));
        assert_eq!(out.narrowed, Some(false));
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].venue, "Nature");
    }

    #[test]
    fn test_small_links_are_not_titles() {
        let body = r#"<html><body><h2>Articles</h2><table><tr><td>
<a href="https://www.nature.com/articles/x" style="font-size:13px">Read the full story about hearts</a>
</td></tr></table></body></html>"#;
        let out = NatureDigest.extract(&MessageContext::new(&message("Nature", body)));
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn test_shared_cell_assigns_text_per_article() {
        let body = r#"<html><body><h2>Articles</h2><table><tr><td>
<p style="font-size:12px">Article | Open Access</p>
<a href="https://www.nature.com/articles/s41591-024-0001-1" style="font-size:18px">Cardiac organoids map fibrosis trajectories</a>
<p style="font-size:15px">Abstract one about organoids.</p>
<p style="font-size:12px">A. Author &amp; B. Author</p>
<p style="font-size:12px">Article | Open Access</p>
<a href="https://www.nature.com/articles/s41591-024-0002-2" style="font-size:18px">Vascular ageing comes into focus today</a>
<p style="font-size:15px">Abstract two about arteries.</p>
</td></tr></table></body></html>"#;
        let out = NatureDigest.extract(&MessageContext::new(&message("Nature Medicine", body)));
        let got: Vec<(&str, Option<&str>, Option<&str>)> = out
            .candidates
            .iter()
            .map(|c| (c.title.as_str(), c.abstract_text.as_deref(), c.authors.as_deref()))
            .collect();
        assert_eq!(
            got,
            vec![
                (
                    "Cardiac organoids map fibrosis trajectories",
                    Some("Abstract one about organoids."),
                    Some("A. Author & B. Author"),
                ),
                ("Vascular ageing comes into focus today", Some("Abstract two about arteries."), None),
            ]
        );
    }

    #[test]
    fn test_research_heading_vocabulary() {
        assert!(is_research_heading("Research Highlights"));
        assert!(is_research_heading("NEWS & VIEWS"));
        assert!(is_research_heading("Reviews:"));
        assert!(!is_research_heading("Careers"));
    }
}
