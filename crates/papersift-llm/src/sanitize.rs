//! Strip model commentary from titles echoed back by the oracle.
//!
//! Models asked to "copy the title exactly" still decorate it: markdown
//! emphasis, list numbering, "(Score: 85)", "— relevant because …",
//! "[Highly relevant]". Everything here is removed so that a title either
//! matches the source text or is caught by validation.

use std::sync::OnceLock;

use regex::Regex;

struct Patterns {
    list_marker: Regex,
    bracketed_verdict: Regex,
    score_annotation: Regex,
    trailing_parenthetical: Regex,
    trailing_commentary: Regex,
}

fn patterns() -> &'static Patterns {
    static P: OnceLock<Patterns> = OnceLock::new();
    P.get_or_init(|| Patterns {
        list_marker: Regex::new(r"^\s*(?:\d{1,3}[.)]|[-*•])\s+").unwrap(),
        bracketed_verdict: Regex::new(
            r"(?i)\s*\[[^\]]*\b(?:relevant|relevance|irrelevant|score|match|verdict)\b[^\]]*\]",
        )
        .unwrap(),
        score_annotation: Regex::new(
            r"(?i)\s*[(\[]?\s*(?:relevance\s+)?(?:score|relevance|rating)\s*[:=]\s*\d{1,3}(?:\.\d+)?\s*(?:/\s*100|%)?\s*[)\]]?",
        )
        .unwrap(),
        trailing_parenthetical: Regex::new(
            r"(?i)\s*\((?:highly |very |moderately |somewhat |not |less )?(?:relevant|relevance|matches|because|related to|addresses)[^)]*\)\s*$",
        )
        .unwrap(),
        trailing_commentary: Regex::new(
            r"(?i)\s+(?:-|–|—|:|\|)\s+(?:(?:highly|very|moderately|somewhat|directly|not)\s+)?(?:relevant|relevance|matches|this (?:paper|study|article)|addresses|related to|because)\b.*$",
        )
        .unwrap(),
    })
}

/// Remove score annotations, "relevant because…" tails, markdown emphasis,
/// list numbering and bracketed verdicts from an oracle-supplied title.
pub fn strip_commentary(title: &str) -> String {
    let p = patterns();

    let mut s: String = title.replace("**", "").replace("__", "").replace('`', "");
    s = s.trim_start_matches('#').trim().to_string();
    s = p.list_marker.replace(&s, "").into_owned();
    s = p.bracketed_verdict.replace_all(&s, "").into_owned();
    s = p.score_annotation.replace_all(&s, "").into_owned();
    s = p.trailing_parenthetical.replace(&s, "").into_owned();
    s = p.trailing_commentary.replace(&s, "").into_owned();

    let s = s.trim().trim_matches(|c: char| c == '"' || c == '“' || c == '”').trim();
    let s = s.trim_end_matches([' ', '-', '–', '—', ':', '|', ',']);
    // Single-asterisk emphasis only when it wraps the whole title.
    let s = if s.len() > 2 && s.starts_with('*') && s.ends_with('*') {
        &s[1..s.len() - 1]
    } else {
        s
    };
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when sanitising changed anything beyond whitespace.
pub fn has_commentary(title: &str) -> bool {
    strip_commentary(title) != title.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_titles_pass_through() {
        let t = "Single-cell proteomics of human aortic organoids: a resource";
        assert_eq!(strip_commentary(t), t);
        assert!(!has_commentary(t));
    }

    #[test]
    fn test_strips_markdown_and_numbering() {
        assert_eq!(strip_commentary("1. **Cardiac organoids model fibrosis**"), "Cardiac organoids model fibrosis");
        assert_eq!(strip_commentary("- *Cardiac organoids model fibrosis*"), "Cardiac organoids model fibrosis");
        assert_eq!(strip_commentary("## `Cardiac organoids model fibrosis`"), "Cardiac organoids model fibrosis");
    }

    #[test]
    fn test_strips_score_annotations() {
        assert_eq!(strip_commentary("Cardiac organoids in heart failure (Score: 85)"), "Cardiac organoids in heart failure");
        assert_eq!(strip_commentary("Cardiac organoids in heart failure [relevance=72/100]"), "Cardiac organoids in heart failure");
        assert_eq!(strip_commentary("Cardiac organoids in heart failure - Score: 40"), "Cardiac organoids in heart failure");
    }

    #[test]
    fn test_strips_relevance_tails() {
        assert_eq!(
            strip_commentary("Aortic stenosis outcomes — highly relevant because it uses organoids"),
            "Aortic stenosis outcomes"
        );
        assert_eq!(
            strip_commentary("Aortic stenosis outcomes (relevant to vascular biology)"),
            "Aortic stenosis outcomes"
        );
        assert_eq!(strip_commentary("Aortic stenosis outcomes [Highly relevant]"), "Aortic stenosis outcomes");
    }

    #[test]
    fn test_keeps_legitimate_colons_and_dashes() {
        let t = "Circulation: a single-cell view - part II";
        assert_eq!(strip_commentary(t), t);
    }
}
