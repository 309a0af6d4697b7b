//! End-to-end pipeline.
//!
//! Orchestrates one run over a session's alert messages:
//!   1. Classify each message by sender / subject
//!   2. Extract articles (structural strategies, whole-message fallback)
//!   3. Plan token- and count-bounded batches
//!   4. Score batches through the oracle (retry + windowed dispatch)
//!   5. Resolve judgments back to the extracted articles
//!   6. Deterministic score adjustment and min-score filter
//!   7. Deduplicate by normalised title
//!   8. Validate every title against the original message text
//!   9. Sort descending by relevance score
//!
//! Diagnostics go to the injected [`PipelineObserver`]; counters come back
//! on the report.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use papersift_common::config::PipelineConfig;
use papersift_common::models::{split_authors, ArticleBatch, RawMessage, ScoredPaper};
use papersift_common::telemetry::{PipelineEvent, PipelineMetrics, PipelineObserver, TracingObserver};
use papersift_common::{PaperSiftError, Result};
use papersift_llm::{dispatch_batches, BatchFailure, OracleJudgment, RetryPolicy, RetryingOracle, ScoringOracle};
use papersift_ranker::{score_paper, ScoreInput, VenueWeights};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::batcher::batch_articles;
use crate::classifier::{classify, AlertSource};
use crate::dedup::dedup_papers;
use crate::extract::{extract, ExtractionFailure};
use crate::validation::{RemovedPaper, ValidationVerdict, Validator};

/// Venue recorded for oracle judgments that map to no extracted article.
const UNMAPPED_VENUE: &str = "Unknown";

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub rate: f64,
    pub verdict: ValidationVerdict,
    pub checked: usize,
    pub removed: Vec<RemovedPaper>,
}

/// Everything a caller persists from one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Validated papers, highest relevance first.
    pub papers: Vec<ScoredPaper>,
    /// Literature overview assembled from the oracle's batch reviews.
    pub summary: Option<String>,
    pub validation: ValidationSummary,
    pub batch_failures: Vec<BatchFailure>,
    pub extraction_fallbacks: Vec<ExtractionFailure>,
    pub metrics: PipelineMetrics,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct Pipeline {
    oracle: Arc<dyn ScoringOracle>,
    config: PipelineConfig,
    venues: VenueWeights,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn ScoringOracle>, config: PipelineConfig) -> Self {
        Self {
            oracle,
            config,
            venues: VenueWeights::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_venues(mut self, venues: VenueWeights) -> Self {
        self.venues = venues;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }

    /// Run every stage over `messages`. Fails only when no paper survives.
    #[instrument(skip_all, fields(messages = messages.len(), oracle = self.oracle.name()))]
    pub async fn run(&self, messages: &[RawMessage]) -> Result<PipelineReport> {
        let t0 = std::time::Instant::now();
        let mut metrics = PipelineMetrics { messages: messages.len(), ..Default::default() };

        // ── 1–2. Classify and extract ─────────────────────────────────────────
        let mut articles = Vec::new();
        let mut fallbacks = Vec::new();
        for message in messages {
            let source = classify(&message.sender_address, &message.subject);
            if source == AlertSource::Unknown {
                metrics.unknown_sources += 1;
            }
            self.emit(PipelineEvent::MessageClassified {
                message_id: message.id.clone(),
                source: source.label().to_string(),
            });

            let extraction = extract(message, source);
            self.emit(PipelineEvent::ArticlesExtracted {
                message_id: message.id.clone(),
                count: extraction.articles.len(),
                strategy: extraction.strategies.join("+"),
            });
            if let Some(failure) = extraction.fallback {
                self.emit(PipelineEvent::ExtractionFallback {
                    message_id: failure.message_id.clone(),
                    reason: failure.reason.clone(),
                });
                fallbacks.push(failure);
            }
            articles.extend(extraction.articles);
        }
        metrics.fallbacks = fallbacks.len();
        metrics.articles_extracted = articles.len();

        // ── 3. Batch ──────────────────────────────────────────────────────────
        let batches = batch_articles(articles, self.config.batching);
        metrics.batches = batches.len();
        self.emit(PipelineEvent::BatchesPlanned {
            batches: batches.len(),
            articles: metrics.articles_extracted,
        });

        // ── 4. Score through the oracle ───────────────────────────────────────
        let oracle = RetryingOracle::new(self.oracle.clone(), RetryPolicy::new(self.config.retry))
            .with_observer(self.observer.clone());
        let dispatched = dispatch_batches(
            &oracle,
            batches,
            &self.config.keywords,
            &self.config.dispatch,
            self.observer.as_ref(),
        )
        .await;
        metrics.batches_failed = dispatched.failures.len();
        metrics.judgments = dispatched.judgments();

        // ── 5–6. Resolve and score ────────────────────────────────────────────
        let dates: HashMap<&str, NaiveDate> = messages
            .iter()
            .map(|m| (m.id.as_str(), m.received_at.date_naive()))
            .collect();

        let mut scored = Vec::new();
        let mut reviews = Vec::new();
        for (batch, result) in &dispatched.scored {
            if let Some(review) = result.review.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
                reviews.push(review.to_string());
            }
            for judgment in &result.judgments {
                let paper = self.score_judgment(batch, judgment, &dates);
                if paper.relevance_score < self.config.min_score {
                    debug!(title = %paper.title, score = paper.relevance_score, "Below minimum score");
                    metrics.below_min_score += 1;
                    continue;
                }
                scored.push(paper);
            }
        }

        // ── 7. Deduplicate ────────────────────────────────────────────────────
        let deduped = dedup_papers(scored);
        metrics.duplicates_removed = deduped.removed_duplicates.len();

        // ── 8. Validate ───────────────────────────────────────────────────────
        let validator = Validator::from_messages(messages);
        let report = validator.validate(deduped.papers);
        for removed in &report.removed {
            self.emit(PipelineEvent::PaperRemoved {
                title: removed.title.clone(),
                reason: removed.reason.clone(),
            });
        }
        metrics.hallucinations_removed = report.removed.len();
        if report.rate < self.config.validation.warn_below {
            warn!(
                rate = report.rate,
                verdict = %report.verdict,
                "Validation rate below threshold; treat this run with caution"
            );
        }

        // ── 9. Sort ───────────────────────────────────────────────────────────
        let mut papers = report.kept;
        papers.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        metrics.papers_out = papers.len();

        if papers.is_empty() {
            return Err(PaperSiftError::NothingExtracted {
                messages: messages.len(),
                batches: metrics.batches,
                failed_batches: metrics.batches_failed,
            });
        }

        self.emit(PipelineEvent::RunComplete { papers: papers.len(), validation_rate: report.rate });
        info!(
            papers = papers.len(),
            batches = metrics.batches,
            failed_batches = metrics.batches_failed,
            duplicates = metrics.duplicates_removed,
            removed = metrics.hallucinations_removed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineReport {
            papers,
            summary: (!reviews.is_empty()).then(|| reviews.join("\n\n")),
            validation: ValidationSummary {
                rate: report.rate,
                verdict: report.verdict,
                checked: report.results.len(),
                removed: report.removed,
            },
            batch_failures: dispatched.failures,
            extraction_fallbacks: fallbacks,
            metrics,
        })
    }

    /// Build the scored paper for one judgment. A judgment that points at a
    /// batch article takes that article's verbatim title and metadata; any
    /// other keeps the oracle's sanitised fields and is left for validation.
    fn score_judgment(
        &self,
        batch: &ArticleBatch,
        judgment: &OracleJudgment,
        dates: &HashMap<&str, NaiveDate>,
    ) -> ScoredPaper {
        let article = judgment.index.and_then(|i| batch.articles.get(i));
        let message_date = |id: &str| dates.get(id).copied();

        let (title, authors, snippet, source_name, date) = match article {
            Some(a) => (
                a.title.clone(),
                a.authors.clone().or_else(|| judgment.authors.clone()),
                a.snippet(self.config.scoring.snippet_chars),
                a.source_name.clone(),
                message_date(&a.message_id),
            ),
            None => (
                judgment.title.clone(),
                judgment.authors.clone(),
                String::new(),
                judgment.venue.clone().unwrap_or_else(|| UNMAPPED_VENUE.to_string()),
                batch.articles.first().and_then(|a| message_date(&a.message_id)),
            ),
        };

        let breakdown = score_paper(
            ScoreInput {
                base_score: judgment.base_score,
                title: &title,
                snippet: &snippet,
                source_name: &source_name,
            },
            &self.config.keywords,
            &self.config.scoring,
            &self.venues,
        );

        ScoredPaper {
            id: Uuid::new_v4(),
            authors: authors.as_deref().map(split_authors).unwrap_or_default(),
            publication_date: date.unwrap_or_else(|| Utc::now().date_naive()),
            relevance_score: breakdown.score,
            matched_keywords: breakdown.matched_keywords,
            matched_penalties: breakdown.matched_penalties,
            title,
            snippet,
            source_name,
        }
    }
}

/// One-shot convenience: build a [`Pipeline`] with the default observer and
/// venue table and run it.
pub async fn run_pipeline<O>(messages: &[RawMessage], oracle: O, config: PipelineConfig) -> Result<PipelineReport>
where
    O: ScoringOracle + 'static,
{
    Pipeline::new(Arc::new(oracle), config).run(messages).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use papersift_common::models::ExtractedArticle;
    use papersift_common::telemetry::NoopObserver;

    fn article(title: &str, authors: Option<&str>) -> ExtractedArticle {
        ExtractedArticle {
            title: title.to_string(),
            authors: authors.map(String::from),
            abstract_text: Some("Organoid models of cardiac fibrosis".to_string()),
            doi: None,
            source_name: "Circulation Research".to_string(),
            origin_fragment: String::new(),
            estimated_tokens: 10,
            message_id: "m1".to_string(),
        }
    }

    struct Never;

    #[async_trait::async_trait]
    impl ScoringOracle for Never {
        async fn score(
            &self,
            _batch: &ArticleBatch,
            _keywords: &papersift_common::config::KeywordSet,
        ) -> std::result::Result<papersift_llm::ScoredBatch, papersift_llm::OracleError> {
            Ok(Default::default())
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(Never), PipelineConfig::default()).with_observer(Arc::new(NoopObserver))
    }

    #[test]
    fn test_mapped_judgment_uses_verbatim_article() {
        let batch = ArticleBatch {
            index: 0,
            articles: vec![article("Cardiac organoids model fibrosis", Some("A Smith, B Jones"))],
        };
        let judgment = OracleJudgment {
            index: Some(0),
            title: "Cardiac organoids model fibrosis (highly relevant)".to_string(),
            authors: None,
            venue: Some("Nature".to_string()),
            base_score: 60.0,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let dates = HashMap::from([("m1", date)]);

        let paper = pipeline().score_judgment(&batch, &judgment, &dates);
        assert_eq!(paper.title, "Cardiac organoids model fibrosis");
        assert_eq!(paper.source_name, "Circulation Research");
        assert_eq!(paper.authors, vec!["A Smith".to_string(), "B Jones".to_string()]);
        assert_eq!(paper.publication_date, date);
        assert!(paper.snippet.starts_with("Organoid models"));
    }

    #[test]
    fn test_unmapped_judgment_keeps_oracle_fields() {
        let batch = ArticleBatch { index: 0, articles: vec![article("Cardiac organoids model fibrosis", None)] };
        let judgment = OracleJudgment {
            index: None,
            title: "A paper the oracle invented".to_string(),
            authors: Some("X Y".to_string()),
            venue: None,
            base_score: 90.0,
        };
        let paper = pipeline().score_judgment(&batch, &judgment, &HashMap::new());
        assert_eq!(paper.title, "A paper the oracle invented");
        assert_eq!(paper.source_name, UNMAPPED_VENUE);
        assert!(paper.snippet.is_empty());
    }

    #[tokio::test]
    async fn test_empty_session_is_nothing_extracted() {
        let err = pipeline().run(&[]).await.unwrap_err();
        assert!(matches!(err, PaperSiftError::NothingExtracted { messages: 0, .. }));
    }
}
