//! Windowed, bounded-concurrency dispatch of batches to the oracle.
//!
//! Batches run `window` at a time with a cooldown between windows. A batch
//! that fails contributes nothing and is recorded as a [`BatchFailure`];
//! it never aborts its siblings or later windows.

use futures::stream::{self, StreamExt};
use papersift_common::config::{DispatchSettings, KeywordSet};
use papersift_common::models::ArticleBatch;
use papersift_common::telemetry::{PipelineEvent, PipelineObserver};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::oracle::{OracleError, OracleFailureKind, ScoredBatch, ScoringOracle};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub articles: usize,
    pub kind: OracleFailureKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Successful results, ordered by batch index.
    pub scored: Vec<(ArticleBatch, ScoredBatch)>,
    pub failures: Vec<BatchFailure>,
}

impl DispatchReport {
    pub fn judgments(&self) -> usize {
        self.scored.iter().map(|(_, s)| s.judgments.len()).sum()
    }
}

#[instrument(skip_all, fields(batches = batches.len(), window = settings.window))]
pub async fn dispatch_batches<O>(
    oracle: &O,
    batches: Vec<ArticleBatch>,
    keywords: &KeywordSet,
    settings: &DispatchSettings,
    observer: &dyn PipelineObserver,
) -> DispatchReport
where
    O: ScoringOracle + ?Sized,
{
    let window = settings.window.max(1);
    let total = batches.len();
    let mut report = DispatchReport::default();
    let mut pending = batches.into_iter().peekable();
    let mut window_no = 0usize;

    while pending.peek().is_some() {
        if window_no > 0 && !settings.cooldown().is_zero() {
            tokio::time::sleep(settings.cooldown()).await;
        }
        let chunk: Vec<ArticleBatch> = pending.by_ref().take(window).collect();

        let outcomes: Vec<(ArticleBatch, Result<ScoredBatch, OracleError>)> = stream::iter(chunk)
            .map(|batch| async move {
                let result = oracle.score(&batch, keywords).await;
                (batch, result)
            })
            .buffer_unordered(window)
            .collect()
            .await;

        for (batch, result) in outcomes {
            match result {
                Ok(scored) => {
                    observer.on_event(&PipelineEvent::BatchScored {
                        batch_index: batch.index,
                        judgments: scored.judgments.len(),
                    });
                    report.scored.push((batch, scored));
                }
                Err(e) => {
                    if let Some(raw) = &e.raw_payload {
                        warn!(batch = batch.index, raw = %raw, "Skipping batch with malformed oracle output");
                    }
                    observer.on_event(&PipelineEvent::BatchFailed {
                        batch_index: batch.index,
                        kind: e.kind.to_string(),
                        message: e.message.clone(),
                    });
                    report.failures.push(BatchFailure {
                        batch_index: batch.index,
                        articles: batch.len(),
                        kind: e.kind,
                        message: e.message,
                    });
                }
            }
        }
        window_no += 1;
    }

    report.scored.sort_by_key(|(b, _)| b.index);
    report.failures.sort_by_key(|f| f.batch_index);

    info!(
        total,
        scored = report.scored.len(),
        failed = report.failures.len(),
        judgments = report.judgments(),
        "Oracle dispatch complete"
    );
    report
}
