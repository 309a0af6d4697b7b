//! Final relevance score computation.
//!
//! score = min(100, round(clamp(base + bonus [+ no-match penalty], 0, 100) × venue multiplier))
//!
//! Keyword rules per positive keyword (lowercased, tokens = parts longer than 3 chars):
//!   title:   exact phrase +20 | single-token hit +10 | ≥2 tokens within 50 chars +10
//!   snippet: exact phrase +10 | the same partial rule +5
//! Penalty keywords: title −25, snippet −15 (independent).

use papersift_common::config::{KeywordSet, ScoringPolicy};
use serde::{Deserialize, Serialize};

use crate::normalise::{clamp_score, keyword_tokens, round_score, tokens_near};
use crate::weights::{VenueRule, VenueWeights};

pub const TITLE_EXACT_BONUS: i32 = 20;
pub const TITLE_PARTIAL_BONUS: i32 = 10;
pub const SNIPPET_EXACT_BONUS: i32 = 10;
pub const SNIPPET_PARTIAL_BONUS: i32 = 5;
pub const TITLE_PENALTY: i32 = -25;
pub const SNIPPET_PENALTY: i32 = -15;
pub const NO_MATCH_PENALTY: i32 = -20;

/// Inputs for one paper.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    /// Oracle judgment in [0, 100].
    pub base_score: f64,
    pub title: &'a str,
    pub snippet: &'a str,
    pub source_name: &'a str,
}

/// Every intermediate value, for auditing a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub score: u8,
    pub base_score: f64,
    pub bonus: i32,
    pub no_match_penalty: i32,
    pub raw_score: f64,
    pub multiplier: f64,
    pub venue_rule: VenueRule,
    pub matched_keywords: Vec<String>,
    pub matched_penalties: Vec<String>,
}

/// Keyword phase result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordOutcome {
    pub bonus: i32,
    pub matched_keywords: Vec<String>,
    pub matched_penalties: Vec<String>,
}

/// Sum keyword bonuses and penalties for a title/snippet pair.
pub fn keyword_bonus(title: &str, snippet: &str, keywords: &KeywordSet) -> KeywordOutcome {
    let title = title.to_lowercase();
    let snippet = snippet.to_lowercase();
    let mut out = KeywordOutcome::default();

    for raw in &keywords.positive {
        let kw = raw.trim().to_lowercase();
        if kw.is_empty() {
            continue;
        }
        let tokens = keyword_tokens(&kw);
        let single = tokens.len() <= 1;
        let partial_hit = |text: &str| -> bool {
            if single {
                tokens.first().is_some_and(|t| text.contains(t))
            } else {
                tokens_near(text, &tokens)
            }
        };

        let mut delta = 0;
        if title.contains(&kw) {
            delta += TITLE_EXACT_BONUS;
        } else if partial_hit(&title) {
            delta += TITLE_PARTIAL_BONUS;
        }

        if snippet.contains(&kw) {
            delta += SNIPPET_EXACT_BONUS;
        } else if partial_hit(&snippet) {
            delta += SNIPPET_PARTIAL_BONUS;
        }

        if delta > 0 {
            out.bonus += delta;
            out.matched_keywords.push(raw.trim().to_string());
        }
    }

    for raw in &keywords.penalty {
        let kw = raw.trim().to_lowercase();
        if kw.is_empty() {
            continue;
        }
        let mut delta = 0;
        if title.contains(&kw) {
            delta += TITLE_PENALTY;
        }
        if snippet.contains(&kw) {
            delta += SNIPPET_PENALTY;
        }
        if delta < 0 {
            out.bonus += delta;
            out.matched_penalties.push(raw.trim().to_string());
        }
    }

    out
}

/// Compute the final 0–100 relevance score. Pure and deterministic.
pub fn score_paper(
    input: ScoreInput<'_>,
    keywords: &KeywordSet,
    policy: &ScoringPolicy,
    venues: &VenueWeights,
) -> ScoreBreakdown {
    let outcome = keyword_bonus(input.title, input.snippet, keywords);

    let no_match_penalty = if policy.no_match_penalty
        && outcome.matched_keywords.is_empty()
        && !venues.is_preprint(input.source_name)
    {
        NO_MATCH_PENALTY
    } else {
        0
    };

    let base = clamp_score(input.base_score);
    let raw_score = clamp_score(base + f64::from(outcome.bonus) + f64::from(no_match_penalty));

    let venue = venues.resolve(input.source_name);
    let score = round_score(raw_score * venue.multiplier);

    ScoreBreakdown {
        score,
        base_score: base,
        bonus: outcome.bonus,
        no_match_penalty,
        raw_score,
        multiplier: venue.multiplier,
        venue_rule: venue.rule,
        matched_keywords: outcome.matched_keywords,
        matched_penalties: outcome.matched_penalties,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kw(pos: &[&str], neg: &[&str]) -> KeywordSet {
        KeywordSet::new(pos.iter().copied(), neg.iter().copied())
    }

    fn input<'a>(base: f64, title: &'a str, snippet: &'a str, source: &'a str) -> ScoreInput<'a> {
        ScoreInput { base_score: base, title, snippet, source_name: source }
    }

    #[test]
    fn test_exact_title_bonuses_are_additive() {
        let out = keyword_bonus(
            "Single-cell proteomics of aortic organoids",
            "",
            &kw(&["organoid", "single-cell proteomics"], &[]),
        );
        assert_eq!(out.bonus, 40);
        assert_eq!(out.matched_keywords, vec!["organoid", "single-cell proteomics"]);
    }

    #[test]
    fn test_single_token_partial_title_hit() {
        // "cardiac" is the only token longer than 3 chars in "cardiac mri"
        let out = keyword_bonus("Cardiac remodelling after infarction", "", &kw(&["cardiac mri"], &[]));
        assert_eq!(out.bonus, TITLE_PARTIAL_BONUS);
    }

    #[test]
    fn test_multi_token_partial_needs_proximity() {
        let k = kw(&["vascular smooth muscle"], &[]);
        let near = keyword_bonus("Smooth muscle cells in vascular calcification", "", &k);
        assert_eq!(near.bonus, TITLE_PARTIAL_BONUS);

        let far_title = format!("Vascular {} muscle", "padding ".repeat(10));
        let far = keyword_bonus(&far_title, "", &k);
        assert_eq!(far.bonus, 0);
    }

    #[test]
    fn test_snippet_scored_independently_of_title() {
        let out = keyword_bonus("Organoid atlas", "We profile organoid maturation.", &kw(&["organoid"], &[]));
        assert_eq!(out.bonus, TITLE_EXACT_BONUS + SNIPPET_EXACT_BONUS);

        let partial = keyword_bonus(
            "Unrelated heading for the study",
            "smooth cells and muscle fibres",
            &kw(&["smooth muscle"], &[]),
        );
        assert_eq!(partial.bonus, SNIPPET_PARTIAL_BONUS);
    }

    #[test]
    fn test_penalties_apply_to_title_and_snippet() {
        let out = keyword_bonus("A mouse model of heart failure", "in mouse hearts", &kw(&[], &["mouse"]));
        assert_eq!(out.bonus, TITLE_PENALTY + SNIPPET_PENALTY);
        assert_eq!(out.matched_penalties, vec!["mouse"]);
    }

    #[test]
    fn test_no_match_penalty_exempts_preprints() {
        let venues = VenueWeights::default();
        let policy = ScoringPolicy::default();
        let k = kw(&["organoid"], &[]);

        let journal = score_paper(input(60.0, "Unrelated topic entirely here", "", "Circulation"), &k, &policy, &venues);
        assert_eq!(journal.no_match_penalty, NO_MATCH_PENALTY);
        assert_eq!(journal.raw_score, 40.0);

        let preprint = score_paper(input(60.0, "Unrelated topic entirely here", "", "bioRxiv"), &k, &policy, &venues);
        assert_eq!(preprint.no_match_penalty, 0);
        assert_eq!(preprint.raw_score, 60.0);
    }

    #[test]
    fn test_no_match_penalty_can_be_disabled() {
        let policy = ScoringPolicy { no_match_penalty: false, ..Default::default() };
        let out = score_paper(
            input(60.0, "Unrelated topic entirely here", "", "Circulation"),
            &kw(&["organoid"], &[]),
            &policy,
            &VenueWeights::default(),
        );
        assert_eq!(out.no_match_penalty, 0);
    }

    #[test]
    fn test_score_is_clamped_and_multiplied() {
        let venues = VenueWeights::default();
        let policy = ScoringPolicy::default();
        let k = kw(&["organoid"], &[]);

        // 90 + 30 → clamp 100 → ×1.5 → 150 → clamp 100
        let high = score_paper(input(90.0, "Organoid models", "organoid work", "Nature"), &k, &policy, &venues);
        assert_eq!(high.raw_score, 100.0);
        assert_eq!(high.score, 100);

        // 10 - 25 - 20 → clamp 0
        let low = score_paper(
            input(10.0, "Retracted mouse study", "", "Circulation"),
            &KeywordSet::new(["organoid"], ["retracted"]),
            &policy,
            &venues,
        );
        assert_eq!(low.score, 0);
    }

    #[test]
    fn test_venue_multiplier_rounds() {
        let out = score_paper(
            input(52.0, "Organoid models of the aorta", "", "Circulation Research"),
            &kw(&["organoid"], &[]),
            &ScoringPolicy::default(),
            &VenueWeights::default(),
        );
        // (52 + 20) × 1.3 = 93.6 → 94
        assert_eq!(out.score, 94);
        assert_eq!(out.venue_rule, VenueRule::Exact);
    }

    #[test]
    fn test_pure_function() {
        let venues = VenueWeights::default();
        let policy = ScoringPolicy::default();
        let k = kw(&["organoid", "fibrosis"], &["mouse"]);
        let i = input(47.3, "Organoid fibrosis in mouse", "fibrosis readout", "Hypertension");
        let a = score_paper(i, &k, &policy, &venues);
        let b = score_paper(i, &k, &policy, &venues);
        assert_eq!(a, b);
        assert!(a.score <= 100);
    }
}
