//! Diagnostics interface injected into the pipeline.
//!
//! The core never logs through global counters; it reports [`PipelineEvent`]s
//! to whatever [`PipelineObserver`] the caller hands in.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Something worth reporting during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    MessageClassified { message_id: String, source: String },
    ArticlesExtracted { message_id: String, count: usize, strategy: String },
    ExtractionFallback { message_id: String, reason: String },
    BatchesPlanned { batches: usize, articles: usize },
    BatchScored { batch_index: usize, judgments: usize },
    BatchFailed { batch_index: usize, kind: String, message: String },
    OracleRetry { attempt: u32, kind: String, delay_ms: u64 },
    PaperRemoved { title: String, reason: String },
    RunComplete { papers: usize, validation_rate: f64 },
}

impl PipelineEvent {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineEvent::MessageClassified { .. }  => "classify",
            PipelineEvent::ArticlesExtracted { .. }  => "extract",
            PipelineEvent::ExtractionFallback { .. } => "extract",
            PipelineEvent::BatchesPlanned { .. }     => "batch",
            PipelineEvent::BatchScored { .. }        => "score",
            PipelineEvent::BatchFailed { .. }        => "score",
            PipelineEvent::OracleRetry { .. }        => "score",
            PipelineEvent::PaperRemoved { .. }       => "validate",
            PipelineEvent::RunComplete { .. }        => "complete",
        }
    }
}

/// Receives pipeline diagnostics.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::MessageClassified { message_id, source } => {
                debug!(message_id = %message_id, source = %source, "Message classified");
            }
            PipelineEvent::ArticlesExtracted { message_id, count, strategy } => {
                debug!(message_id = %message_id, count, strategy = %strategy, "Articles extracted");
            }
            PipelineEvent::ExtractionFallback { message_id, reason } => {
                info!(message_id = %message_id, reason = %reason, "Falling back to whole-message article");
            }
            PipelineEvent::BatchesPlanned { batches, articles } => {
                info!(batches, articles, "Oracle batches planned");
            }
            PipelineEvent::BatchScored { batch_index, judgments } => {
                debug!(batch_index, judgments, "Batch scored");
            }
            PipelineEvent::BatchFailed { batch_index, kind, message } => {
                warn!(batch_index, kind = %kind, "Batch failed, continuing: {}", message);
            }
            PipelineEvent::OracleRetry { attempt, kind, delay_ms } => {
                warn!(attempt, kind = %kind, delay_ms, "Oracle call failed, retrying");
            }
            PipelineEvent::PaperRemoved { title, reason } => {
                warn!(title = %title, reason = %reason, "Paper removed by validation");
            }
            PipelineEvent::RunComplete { papers, validation_rate } => {
                info!(papers, validation_rate, "Pipeline run complete");
            }
        }
    }
}

/// Progress event sent over a broadcast channel (cloneable for fan-out).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineProgress {
    pub stage: String,
    pub event: PipelineEvent,
}

/// Publishes every event to a broadcast channel, e.g. for a live UI.
/// Sending never blocks; lagging receivers lose events.
#[derive(Debug, Clone)]
pub struct ProgressBroadcaster {
    tx: broadcast::Sender<PipelineProgress>,
}

impl ProgressBroadcaster {
    pub fn new(tx: broadcast::Sender<PipelineProgress>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineProgress> {
        self.tx.subscribe()
    }
}

impl PipelineObserver for ProgressBroadcaster {
    fn on_event(&self, event: &PipelineEvent) {
        let _ = self.tx.send(PipelineProgress {
            stage: event.stage().to_string(),
            event: event.clone(),
        });
    }
}

/// Fan-out to several observers.
pub struct ObserverSet(pub Vec<Box<dyn PipelineObserver>>);

impl PipelineObserver for ObserverSet {
    fn on_event(&self, event: &PipelineEvent) {
        for o in &self.0 {
            o.on_event(event);
        }
    }
}

/// Counters accumulated over one run and returned on the report.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PipelineMetrics {
    pub messages: usize,
    pub unknown_sources: usize,
    pub fallbacks: usize,
    pub articles_extracted: usize,
    pub batches: usize,
    pub batches_failed: usize,
    pub judgments: usize,
    pub below_min_score: usize,
    pub duplicates_removed: usize,
    pub hallucinations_removed: usize,
    pub papers_out: usize,
}
