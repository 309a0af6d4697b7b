//! Title deduplication for scored papers.
//!
//! Papers are keyed by a normalised title (lowercase, non-word characters
//! stripped, whitespace collapsed). Within each key the highest
//! `relevance_score` survives; ties keep the first seen. Output follows the
//! first-seen order of each key, which makes the pass idempotent.

use std::collections::HashMap;

use papersift_common::models::{ScoredPaper, MIN_TITLE_LEN};
use papersift_common::text::title_key;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub papers: Vec<ScoredPaper>,
    /// Titles dropped for being shorter than the minimum.
    pub removed_short: Vec<String>,
    /// Lower-scored duplicates that lost to another paper with the same key.
    pub removed_duplicates: Vec<ScoredPaper>,
}

pub fn dedup_papers(papers: Vec<ScoredPaper>) -> DedupOutcome {
    let mut outcome = DedupOutcome::default();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<ScoredPaper> = Vec::new();

    for paper in papers {
        let key = title_key(&paper.title);
        if key.chars().count() < MIN_TITLE_LEN {
            outcome.removed_short.push(paper.title);
            continue;
        }
        match slots.get(&key) {
            Some(&slot) => {
                if paper.relevance_score > kept[slot].relevance_score {
                    let loser = std::mem::replace(&mut kept[slot], paper);
                    outcome.removed_duplicates.push(loser);
                } else {
                    outcome.removed_duplicates.push(paper);
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(paper);
            }
        }
    }

    if !outcome.removed_duplicates.is_empty() || !outcome.removed_short.is_empty() {
        debug!(
            kept = kept.len(),
            duplicates = outcome.removed_duplicates.len(),
            short = outcome.removed_short.len(),
            "Deduplicated papers"
        );
    }
    outcome.papers = kept;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn paper(title: &str, score: u8) -> ScoredPaper {
        ScoredPaper {
            id: Uuid::new_v4(),
            title: title.to_string(),
            authors: Vec::new(),
            snippet: String::new(),
            source_name: "Circulation".to_string(),
            publication_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            relevance_score: score,
            matched_keywords: Vec::new(),
            matched_penalties: Vec::new(),
        }
    }

    fn scores(out: &DedupOutcome) -> Vec<(String, u8)> {
        out.papers.iter().map(|p| (p.title.clone(), p.relevance_score)).collect()
    }

    #[test]
    fn test_highest_score_survives_in_any_order() {
        let a = || paper("Cardiac Organoids in Heart Failure", 40);
        let b = || paper("cardiac organoids in heart-failure!", 85);
        let c = || paper("Unrelated vascular biology study", 60);

        for input in [vec![a(), b(), c()], vec![b(), c(), a()], vec![c(), a(), b()]] {
            let out = dedup_papers(input);
            assert_eq!(out.papers.len(), 2);
            let organoid = out.papers.iter().find(|p| p.title.to_lowercase().starts_with("cardiac")).unwrap();
            assert_eq!(organoid.relevance_score, 85);
            assert_eq!(out.removed_duplicates.len(), 1);
            assert_eq!(out.removed_duplicates[0].relevance_score, 40);
        }
    }

    #[test]
    fn test_first_seen_order_and_ties() {
        let out = dedup_papers(vec![
            paper("Second key paper title", 10),
            paper("First key paper title!", 50),
            paper("second key paper title", 10),
        ]);
        assert_eq!(
            scores(&out),
            vec![("Second key paper title".to_string(), 10), ("First key paper title!".to_string(), 50)]
        );
    }

    #[test]
    fn test_short_titles_dropped() {
        let out = dedup_papers(vec![paper("Too short", 99), paper("!!! ??? ...", 99), paper("Long enough title", 1)]);
        assert_eq!(out.papers.len(), 1);
        assert_eq!(out.removed_short, vec!["Too short".to_string(), "!!! ??? ...".to_string()]);
    }

    #[test]
    fn test_idempotent() {
        let once = dedup_papers(vec![
            paper("Alpha study of organoids", 30),
            paper("alpha study of organoids", 70),
            paper("Beta study of vessels", 50),
        ]);
        let twice = dedup_papers(once.papers.clone());
        assert_eq!(scores(&once), scores(&twice));
        assert!(twice.removed_duplicates.is_empty());
    }
}
