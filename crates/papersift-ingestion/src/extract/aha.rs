//! Press-association digests (AHA journals eTOC and alerts).
//!
//! Titles are the literal text of links into ahajournals.org or the 10.1161
//! DOI prefix, often wrapped by Outlook SafeLinks. The venue comes from the
//! URL/DOI slug, overridden by a journal named in the subject line.

use papersift_common::text::find_doi;
use scraper::ElementRef;

use super::style::resolve_href;
use super::{
    ancestor_named, is_link_label, longest_name_in, selector, text_of, Candidate, ExtractionStrategy,
    MessageContext, StrategyOutput,
};

pub const DEFAULT_VENUE: &str = "AHA Journals";

/// URL path / DOI-suffix slug → journal.
const SLUGS: &[(&str, &str)] = &[
    ("circ", "Circulation"),
    ("circulationaha", "Circulation"),
    ("res", "Circulation Research"),
    ("circresaha", "Circulation Research"),
    ("hyp", "Hypertension"),
    ("hypertensionaha", "Hypertension"),
    ("str", "Stroke"),
    ("strokeaha", "Stroke"),
    ("atvb", "Arteriosclerosis, Thrombosis, and Vascular Biology"),
    ("atvbaha", "Arteriosclerosis, Thrombosis, and Vascular Biology"),
    ("jaha", "Journal of the American Heart Association"),
    ("circheartfailure", "Circulation: Heart Failure"),
    ("circhf", "Circulation: Heart Failure"),
    ("circoutcomes", "Circulation: Cardiovascular Quality and Outcomes"),
    ("circep", "Circulation: Arrhythmia and Electrophysiology"),
    ("circgen", "Circulation: Genomic and Precision Medicine"),
    ("circimaging", "Circulation: Cardiovascular Imaging"),
    ("circinterventions", "Circulation: Cardiovascular Interventions"),
];

pub struct AhaDigest;

impl ExtractionStrategy for AhaDigest {
    fn name(&self) -> &'static str {
        "aha"
    }

    fn extract(&self, ctx: &MessageContext<'_>) -> StrategyOutput {
        let Some(doc) = &ctx.document else {
            return StrategyOutput::default();
        };
        let subject_venue = subject_venue(ctx.subject());

        let mut out = Vec::new();
        for a in doc.select(selector!("a[href]")) {
            let href = resolve_href(a.value().attr("href").unwrap_or_default());
            if !is_aha_link(&href) {
                continue;
            }
            let title = text_of(a);
            if is_link_label(&title) || is_journal_name(&title) {
                continue;
            }

            let venue = subject_venue
                .or_else(|| venue_from_url(&href))
                .unwrap_or(DEFAULT_VENUE)
                .to_string();

            let row = ancestor_named(a, "tr");
            let authors = row.and_then(authors_from_next_row);
            let mut fragment = row.map(text_of).unwrap_or_else(|| title.clone());
            if let Some(ref au) = authors {
                fragment.push('\n');
                fragment.push_str(au);
            }

            out.push(Candidate {
                title,
                authors,
                abstract_text: None,
                doi: find_doi(&href),
                venue,
                fragment,
            });
        }
        out.into()
    }
}

pub fn is_aha_link(href: &str) -> bool {
    let h = href.to_lowercase();
    h.contains("ahajournals.org") || h.contains("doi.org/10.1161")
}

fn is_journal_name(text: &str) -> bool {
    SLUGS.iter().any(|(_, name)| name.eq_ignore_ascii_case(text.trim()))
}

/// Journal named in the subject line, longest name first.
pub fn subject_venue(subject: &str) -> Option<&'static str> {
    let names: Vec<&'static str> = SLUGS.iter().map(|(_, n)| *n).collect();
    longest_name_in(subject, &names)
}

/// Resolve a journal from the DOI suffix or the `/journal/<slug>` path.
pub fn venue_from_url(href: &str) -> Option<&'static str> {
    let lookup = |slug: &str| {
        let slug = slug.to_lowercase();
        SLUGS.iter().find(|(s, _)| *s == slug).map(|(_, n)| *n)
    };

    if let Some(doi) = find_doi(href) {
        if let Some(suffix) = doi.split_once('/').map(|(_, s)| s) {
            let slug = suffix.split('.').next().unwrap_or_default();
            if let Some(name) = lookup(slug) {
                return Some(name);
            }
        }
    }

    let mut segments = href.split(['/', '?', '#']);
    while let Some(seg) = segments.next() {
        if seg.eq_ignore_ascii_case("journal") || seg.eq_ignore_ascii_case("toc") {
            if let Some(name) = segments.next().and_then(lookup) {
                return Some(name);
            }
        }
    }
    None
}

/// Author line from the `<tr>` right after the title's row, accepted only
/// when it looks like a list of names.
fn authors_from_next_row(row: ElementRef<'_>) -> Option<String> {
    let next = row.next_siblings().find_map(ElementRef::wrap)?;
    if next.value().name() != "tr" {
        return None;
    }
    let text = text_of(next);
    looks_like_authors(&text).then_some(text)
}

pub fn looks_like_authors(text: &str) -> bool {
    text.to_lowercase().contains("et al") || text.matches(',').count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use papersift_common::models::{BodyFormat, RawMessage};
    use pretty_assertions::assert_eq;

    fn message(subject: &str, body: &str) -> RawMessage {
        RawMessage {
            id: "aha".into(),
            sender_address: "ahajournals@ahajournals.org".into(),
            subject: subject.into(),
            received_at: Utc::now(),
            body: body.into(),
            body_format: BodyFormat::Html,
        }
    }

    const BODY: &str = r#"<html><body><table>
<tr><td><a href="https://www.ahajournals.org/journal/res">Circulation Research</a></td></tr>
<tr><td><a href="https://nam02.safelinks.protection.outlook.com/?url=https%3A%2F%2Fwww.ahajournals.org%2Fdoi%2F10.1161%2FCIRCRESAHA.124.324567&amp;data=05">Endothelial organoids reveal shear-stress programs</a></td></tr>
<tr><td>Maria Gomez, Li Wei, Tom Baker</td></tr>
<tr><td><a href="https://doi.org/10.1161/HYPERTENSIONAHA.124.22222">Renal denervation outcomes at five years</a></td></tr>
<tr><td>Editorial commentary</td></tr>
<tr><td><a href="https://www.ahajournals.org/doi/pdf/10.1161/HYPERTENSIONAHA.124.22222">PDF</a></td></tr>
</table></body></html>"#;

    #[test]
    fn test_extracts_from_safelinks_and_doi_links() {
        let msg = message("New content online", BODY);
        let out = AhaDigest.extract(&MessageContext::new(&msg)).candidates;
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].title, "Endothelial organoids reveal shear-stress programs");
        assert_eq!(out[0].venue, "Circulation Research");
        assert_eq!(out[0].authors.as_deref(), Some("Maria Gomez, Li Wei, Tom Baker"));
        assert_eq!(out[0].doi.as_deref(), Some("10.1161/CIRCRESAHA.124.324567"));

        assert_eq!(out[1].venue, "Hypertension");
        // "Editorial commentary" has neither "et al" nor two commas.
        assert_eq!(out[1].authors, None);
    }

    #[test]
    fn test_subject_overrides_slug_longest_first() {
        let msg = message("Circulation: Heart Failure - latest articles", BODY);
        let out = AhaDigest.extract(&MessageContext::new(&msg)).candidates;
        assert!(out.iter().all(|c| c.venue == "Circulation: Heart Failure"));
    }

    #[test]
    fn test_venue_from_url_paths() {
        assert_eq!(venue_from_url("https://www.ahajournals.org/journal/jaha"), Some("Journal of the American Heart Association"));
        assert_eq!(venue_from_url("https://www.ahajournals.org/toc/str/current"), Some("Stroke"));
        assert_eq!(venue_from_url("https://www.ahajournals.org/about"), None);
    }

    #[test]
    fn test_author_heuristic() {
        assert!(looks_like_authors("Smith J et al."));
        assert!(looks_like_authors("A, B, C"));
        assert!(!looks_like_authors("Smith and Jones"));
    }
}
