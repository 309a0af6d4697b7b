use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use papersift_common::config::KeywordSet;
use papersift_common::models::ArticleBatch;
use papersift_llm::{OracleError, OracleFailureKind, OracleJudgment, ScoredBatch, ScoringOracle};

/// Stable base score in [40, 87) derived from the title and its message,
/// so the same title in two messages scores differently.
pub fn deterministic_score(title: &str, message_id: &str) -> f64 {
    let sum: u64 = title.bytes().chain(message_id.bytes()).map(u64::from).sum();
    40.0 + (sum % 47) as f64
}

/// Oracle double: judges every article of a batch by index, optionally
/// fabricating one extra paper and failing chosen batches.
#[derive(Default)]
pub struct FakeOracle {
    calls: AtomicUsize,
    hallucinated: Option<String>,
    failing: HashSet<usize>,
    fail_all: bool,
    failure_kind: Option<OracleFailureKind>,
    overrides: HashMap<String, f64>,
    review: Option<String>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paper that exists in no message to the first batch.
    pub fn with_hallucination(mut self, title: impl Into<String>) -> Self {
        self.hallucinated = Some(title.into());
        self
    }

    /// Fail every call for the given batch indices with `kind`.
    pub fn failing_batches(mut self, indices: impl IntoIterator<Item = usize>, kind: OracleFailureKind) -> Self {
        self.failing = indices.into_iter().collect();
        self.failure_kind = Some(kind);
        self
    }

    /// Fail every batch.
    pub fn always_failing(mut self, kind: OracleFailureKind) -> Self {
        self.failure_kind = Some(kind);
        self.fail_all = true;
        self
    }

    /// Pin the base score the oracle gives `title`.
    pub fn with_score(mut self, title: impl Into<String>, base: f64) -> Self {
        self.overrides.insert(title.into(), base);
        self
    }

    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.review = Some(review.into());
        self
    }

    /// Number of `score` calls made, retries included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringOracle for FakeOracle {
    async fn score(&self, batch: &ArticleBatch, _keywords: &KeywordSet) -> Result<ScoredBatch, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.failure_kind {
            if self.fail_all || self.failing.contains(&batch.index) {
                return Err(OracleError::new(kind, format!("injected failure for batch {}", batch.index)));
            }
        }

        let mut judgments: Vec<OracleJudgment> = batch
            .articles
            .iter()
            .enumerate()
            .map(|(i, a)| OracleJudgment {
                index: Some(i),
                title: a.title.clone(),
                authors: a.authors.clone(),
                venue: Some(a.source_name.clone()),
                base_score: self
                    .overrides
                    .get(&a.title)
                    .copied()
                    .unwrap_or_else(|| deterministic_score(&a.title, &a.message_id)),
            })
            .collect();

        if let Some(title) = self.hallucinated.as_ref().filter(|_| batch.index == 0) {
            judgments.push(OracleJudgment {
                index: None,
                title: title.clone(),
                authors: Some("A Nonexistent, B Imaginary".to_string()),
                venue: Some("Nature".to_string()),
                base_score: 95.0,
            });
        }

        Ok(ScoredBatch { judgments, review: self.review.clone() })
    }

    fn name(&self) -> &str {
        "fake"
    }
}
