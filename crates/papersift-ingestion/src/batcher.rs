//! Token- and count-bounded batching for the scoring oracle.
//!
//! Articles from the same message stay in one batch when they fit, so the
//! oracle sees a digest's siblings together. Nothing is dropped or
//! duplicated; an article larger than the budget travels alone.

use std::collections::HashMap;

use papersift_common::config::BatchLimits;
use papersift_common::models::{ArticleBatch, ExtractedArticle};
use tracing::debug;

struct Planner {
    limits: BatchLimits,
    batches: Vec<ArticleBatch>,
    current: Vec<ExtractedArticle>,
    tokens: usize,
}

impl Planner {
    fn new(limits: BatchLimits) -> Self {
        Self {
            limits: BatchLimits {
                max_items: limits.max_items.max(1),
                token_budget: limits.token_budget,
            },
            batches: Vec::new(),
            current: Vec::new(),
            tokens: 0,
        }
    }

    fn fits(&self, items: usize, tokens: usize) -> bool {
        self.current.len() + items <= self.limits.max_items
            && self.tokens + tokens <= self.limits.token_budget
    }

    fn fits_empty(&self, items: usize, tokens: usize) -> bool {
        items <= self.limits.max_items && tokens <= self.limits.token_budget
    }

    fn push(&mut self, article: ExtractedArticle) {
        self.tokens += article.estimated_tokens;
        self.current.push(article);
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.batches.push(ArticleBatch {
            index: self.batches.len(),
            articles: std::mem::take(&mut self.current),
        });
        self.tokens = 0;
    }

    fn add_group(&mut self, group: Vec<ExtractedArticle>) {
        let tokens: usize = group.iter().map(|a| a.estimated_tokens).sum();
        let items = group.len();

        if self.fits(items, tokens) {
            group.into_iter().for_each(|a| self.push(a));
            return;
        }
        self.flush();
        if self.fits_empty(items, tokens) {
            group.into_iter().for_each(|a| self.push(a));
            return;
        }

        // Group too large for any batch: split article by article.
        for article in group {
            if !self.current.is_empty() && !self.fits(1, article.estimated_tokens) {
                self.flush();
            }
            self.push(article);
        }
    }

    fn finish(mut self) -> Vec<ArticleBatch> {
        self.flush();
        self.batches
    }
}

/// Plan oracle batches. Empty input yields no batches.
pub fn batch_articles(articles: Vec<ExtractedArticle>, limits: BatchLimits) -> Vec<ArticleBatch> {
    let total = articles.len();

    // Group by message, in order of each message's first article.
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<ExtractedArticle>> = Vec::new();
    for article in articles {
        let slot = *order.entry(article.message_id.clone()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(article);
    }

    let mut planner = Planner::new(limits);
    for group in groups {
        planner.add_group(group);
    }
    let batches = planner.finish();

    debug!(
        articles = total,
        batches = batches.len(),
        max_items = limits.max_items,
        token_budget = limits.token_budget,
        "Batches planned"
    );
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn article(title: &str, message_id: &str, tokens: usize) -> ExtractedArticle {
        ExtractedArticle {
            title: title.to_string(),
            authors: None,
            abstract_text: None,
            doi: None,
            source_name: "Nature".to_string(),
            origin_fragment: String::new(),
            estimated_tokens: tokens,
            message_id: message_id.to_string(),
        }
    }

    fn titles(batches: &[ArticleBatch]) -> Vec<String> {
        batches.iter().flat_map(|b| b.articles.iter().map(|a| a.title.clone())).collect()
    }

    #[test]
    fn test_ten_large_articles_respect_token_budget() {
        let input: Vec<_> = (0..10).map(|i| article(&format!("Article number {i}"), "m1", 1000)).collect();
        let expected: HashSet<String> = input.iter().map(|a| a.title.clone()).collect();

        let batches = batch_articles(input, BatchLimits { max_items: 50, token_budget: 3000 });
        assert!(batches.len() >= 4, "got {} batches", batches.len());
        assert!(batches.iter().all(|b| b.total_tokens() <= 3000 && !b.is_empty()));

        let out = titles(&batches);
        assert_eq!(out.len(), 10);
        assert_eq!(out.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_message_groups_stay_together_when_they_fit() {
        let input = vec![
            article("a1 long enough", "a", 400),
            article("b1 long enough", "b", 400),
            article("a2 long enough", "a", 400),
            article("b2 long enough", "b", 400),
        ];
        let batches = batch_articles(input, BatchLimits { max_items: 3, token_budget: 10_000 });
        let per_batch: Vec<Vec<&str>> = batches
            .iter()
            .map(|b| b.articles.iter().map(|a| a.message_id.as_str()).collect())
            .collect();
        assert_eq!(per_batch, vec![vec!["a", "a"], vec!["b", "b"]]);
        assert_eq!(batches.iter().map(|b| b.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_oversized_article_gets_own_batch() {
        let input = vec![
            article("small one here", "a", 10),
            article("huge fallback article", "b", 50_000),
            article("small two here", "c", 10),
        ];
        let batches = batch_articles(input, BatchLimits { max_items: 50, token_budget: 1000 });
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].articles[0].title, "huge fallback article");
    }

    #[test]
    fn test_item_cap_splits() {
        let input: Vec<_> = (0..7).map(|i| article(&format!("t{i} long enough"), &format!("m{i}"), 1)).collect();
        let batches = batch_articles(input, BatchLimits { max_items: 3, token_budget: 1000 });
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_empty_input_no_batches() {
        assert!(batch_articles(Vec::new(), BatchLimits::default()).is_empty());
    }
}
