//! Venue prestige multipliers.
//!
//! Venue names overlap heavily ("Circulation", "Circulation Research",
//! "Circulation: Heart Failure"), so lookup follows a strict precedence:
//! exact name → longest known name contained in the venue → fuzzy
//! name → journal family → publisher default → unknown default.

use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

/// Prestige tiers. The multiplier range is 0.2×–1.5×.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VenueTier {
    Flagship,
    Elite,
    High,
    Standard,
    Preprint,
    Low,
    Minimal,
}

impl VenueTier {
    pub fn multiplier(&self) -> f64 {
        match self {
            VenueTier::Flagship => 1.5,
            VenueTier::Elite    => 1.3,
            VenueTier::High     => 1.15,
            VenueTier::Standard => 1.0,
            VenueTier::Preprint => 0.8,
            VenueTier::Low      => 0.5,
            VenueTier::Minimal  => 0.2,
        }
    }
}

/// Which precedence rule produced a multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VenueRule {
    Exact,
    Substring,
    Fuzzy,
    Family,
    Publisher,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueMatch {
    pub multiplier: f64,
    pub rule: VenueRule,
    /// Table key that matched, if any.
    pub matched: Option<String>,
}

/// A named entry in one of the lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VenueEntry {
    pub name: String,
    pub tier: VenueTier,
}

impl VenueEntry {
    fn new(name: &str, tier: VenueTier) -> Self {
        Self { name: name.to_string(), tier }
    }
}

/// Minimum normalised Levenshtein similarity for the fuzzy rule.
const FUZZY_THRESHOLD: f64 = 0.9;

/// Venue tables used by the scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueWeights {
    /// Named venues (~30).
    pub venues: Vec<VenueEntry>,
    /// Journal families, matched as whole words anywhere in the venue.
    pub families: Vec<VenueEntry>,
    /// Publisher-level defaults.
    pub publishers: Vec<VenueEntry>,
    pub unknown: VenueTier,
}

impl Default for VenueWeights {
    fn default() -> Self {
        use VenueTier::*;
        let venues = [
            ("Nature", Flagship),
            ("Science", Flagship),
            ("Cell", Flagship),
            ("The Lancet", Flagship),
            ("New England Journal of Medicine", Flagship),
            ("JAMA", Flagship),
            ("Circulation", Flagship),
            ("Nature Medicine", Elite),
            ("Nature Biotechnology", Elite),
            ("Nature Genetics", Elite),
            ("European Heart Journal", Elite),
            ("Journal of the American College of Cardiology", Elite),
            ("Circulation Research", Elite),
            ("Nature Reviews Cardiology", Elite),
            ("Cell Stem Cell", Elite),
            ("The Lancet Oncology", Elite),
            ("JAMA Cardiology", High),
            ("JAMA Internal Medicine", High),
            ("Nature Cardiovascular Research", High),
            ("Circulation: Heart Failure", High),
            ("Arteriosclerosis, Thrombosis, and Vascular Biology", High),
            ("Nature Communications", Standard),
            ("Science Advances", Standard),
            ("JAMA Network Open", Standard),
            ("Hypertension", Standard),
            ("Stroke", Standard),
            ("Journal of the American Heart Association", Standard),
            ("bioRxiv", Preprint),
            ("medRxiv", Preprint),
            ("arXiv", Preprint),
            ("Scientific Reports", Low),
            ("PLOS ONE", Low),
            ("Research Square", Minimal),
        ];
        let families = [
            ("Nature", High),
            ("Lancet", High),
            ("JAMA", High),
            ("Circulation", High),
            ("Cell", Standard),
            ("Science", Standard),
            ("PLOS", Low),
            ("Frontiers", Low),
        ];
        let publishers = [
            ("AHA Journals", Standard),
            ("Springer Nature", Standard),
            ("Elsevier", Standard),
            ("Wiley", Standard),
            ("Oxford", Standard),
            ("Google Scholar", Preprint),
            ("MDPI", Low),
        ];
        Self {
            venues: venues.iter().map(|(n, t)| VenueEntry::new(n, *t)).collect(),
            families: families.iter().map(|(n, t)| VenueEntry::new(n, *t)).collect(),
            publishers: publishers.iter().map(|(n, t)| VenueEntry::new(n, *t)).collect(),
            unknown: Minimal,
        }
    }
}

/// Lowercase, drop punctuation, collapse whitespace.
fn venue_key(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word containment on normalised keys.
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

impl VenueWeights {
    /// Resolve the prestige multiplier for a venue name.
    pub fn resolve(&self, venue: &str) -> VenueMatch {
        let key = venue_key(venue);
        if key.is_empty() {
            return self.unknown_match();
        }

        // 1. exact
        if let Some(e) = self.venues.iter().find(|e| venue_key(&e.name) == key) {
            return Self::hit(e, VenueRule::Exact);
        }

        // 2. longest known name contained in the venue. A single word that
        //    is also a family name is left to the family rule.
        let family_keys: Vec<String> = self.families.iter().map(|f| venue_key(&f.name)).collect();
        let best_sub = self
            .venues
            .iter()
            .map(|e| (e, venue_key(&e.name)))
            .filter(|(_, k)| (k.contains(' ') || !family_keys.contains(k)) && contains_words(&key, k))
            .max_by_key(|(_, k)| k.len());
        if let Some((e, _)) = best_sub {
            return Self::hit(e, VenueRule::Substring);
        }

        // 3. near-miss spelling of a known name
        let mut best_fuzzy: Option<(&VenueEntry, f64)> = None;
        for e in &self.venues {
            let sim = normalized_levenshtein(&key, &venue_key(&e.name));
            if sim >= FUZZY_THRESHOLD && best_fuzzy.map_or(true, |(_, s)| sim > s) {
                best_fuzzy = Some((e, sim));
            }
        }
        if let Some((e, _)) = best_fuzzy {
            return Self::hit(e, VenueRule::Fuzzy);
        }

        // 4. journal family
        if let Some(e) = self.first_word_match(&self.families, &key) {
            return Self::hit(e, VenueRule::Family);
        }

        // 5. publisher default
        if let Some(e) = self.first_word_match(&self.publishers, &key) {
            return Self::hit(e, VenueRule::Publisher);
        }

        self.unknown_match()
    }

    /// Preprint servers are exempt from the no-match penalty.
    pub fn is_preprint(&self, venue: &str) -> bool {
        let key = venue_key(venue);
        ["biorxiv", "medrxiv", "arxiv", "preprint", "research square", "ssrn"]
            .iter()
            .any(|p| contains_words(&key, p))
    }

    fn first_word_match<'a>(&self, table: &'a [VenueEntry], key: &str) -> Option<&'a VenueEntry> {
        table
            .iter()
            .map(|e| (e, venue_key(&e.name)))
            .filter(|(_, k)| contains_words(key, k))
            .max_by_key(|(_, k)| k.len())
            .map(|(e, _)| e)
    }

    fn hit(e: &VenueEntry, rule: VenueRule) -> VenueMatch {
        VenueMatch {
            multiplier: e.tier.multiplier(),
            rule,
            matched: Some(e.name.clone()),
        }
    }

    fn unknown_match(&self) -> VenueMatch {
        VenueMatch {
            multiplier: self.unknown.multiplier(),
            rule: VenueRule::Unknown,
            matched: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size_and_range() {
        let w = VenueWeights::default();
        assert!(w.venues.len() >= 30);
        for e in &w.venues {
            let m = e.tier.multiplier();
            assert!((0.2..=1.5).contains(&m), "{} out of range", e.name);
        }
    }

    #[test]
    fn test_circulation_research_is_not_circulation() {
        let w = VenueWeights::default();
        let m = w.resolve("Circulation Research");
        assert_eq!(m.rule, VenueRule::Exact);
        assert_eq!(m.matched.as_deref(), Some("Circulation Research"));
        assert_eq!(m.multiplier, VenueTier::Elite.multiplier());

        let hf = w.resolve("Circulation: Heart Failure");
        assert_eq!(hf.matched.as_deref(), Some("Circulation: Heart Failure"));

        let flagship = w.resolve("circulation");
        assert_eq!(flagship.multiplier, VenueTier::Flagship.multiplier());
    }

    #[test]
    fn test_longest_substring_wins() {
        let w = VenueWeights::default();
        let m = w.resolve("Circulation Research (Online edition)");
        assert_eq!(m.rule, VenueRule::Substring);
        assert_eq!(m.matched.as_deref(), Some("Circulation Research"));
    }

    #[test]
    fn test_family_words_defer_to_family_rule() {
        let w = VenueWeights::default();
        // "Nature" is a flagship only on exact match; other Nature titles go to the family tier.
        let m = w.resolve("Nature Reviews Drug Discovery");
        assert_eq!(m.rule, VenueRule::Family);
        assert_eq!(m.multiplier, VenueTier::High.multiplier());
    }

    #[test]
    fn test_single_word_names_outside_families_match_as_substring() {
        let w = VenueWeights::default();
        for (venue, name) in [
            ("Stroke: Vascular and Interventional Neurology", "Stroke"),
            ("Hypertension Research", "Hypertension"),
        ] {
            let m = w.resolve(venue);
            assert_eq!(m.rule, VenueRule::Substring, "{venue}");
            assert_eq!(m.matched.as_deref(), Some(name));
            assert_eq!(m.multiplier, VenueTier::Standard.multiplier());
        }
        // Whole words only.
        assert_eq!(w.resolve("Strokes of Luck Quarterly").rule, VenueRule::Unknown);
    }

    #[test]
    fn test_fuzzy_spelling() {
        let w = VenueWeights::default();
        let m = w.resolve("Circulation Reserch");
        assert_eq!(m.rule, VenueRule::Fuzzy);
        assert_eq!(m.matched.as_deref(), Some("Circulation Research"));
    }

    #[test]
    fn test_publisher_and_unknown_defaults() {
        let w = VenueWeights::default();
        assert_eq!(w.resolve("AHA Journals").rule, VenueRule::Publisher);
        let unknown = w.resolve("Journal of Obscure Findings");
        assert_eq!(unknown.rule, VenueRule::Unknown);
        assert_eq!(unknown.multiplier, 0.2);
        assert_eq!(w.resolve("").rule, VenueRule::Unknown);
    }

    #[test]
    fn test_cell_does_not_match_cellular() {
        let w = VenueWeights::default();
        let m = w.resolve("Cellular Signalling");
        assert_eq!(m.rule, VenueRule::Unknown);
    }

    #[test]
    fn test_preprint_detection() {
        let w = VenueWeights::default();
        assert!(w.is_preprint("bioRxiv"));
        assert!(w.is_preprint("medRxiv (Cardiovascular Medicine)"));
        assert!(!w.is_preprint("Nature Medicine"));
    }
}
