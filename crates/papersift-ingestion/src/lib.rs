//! papersift-ingestion — turns publication alert messages into a ranked,
//! validated paper list.
//!
//! - Source classification (sender / subject rules)
//! - Structural article extraction, one strategy per alert layout
//! - Token- and count-bounded batching for the scoring oracle
//! - Title deduplication
//! - Hallucination validation against the original message text
//! - Pipeline orchestration

pub mod classifier;
pub mod extract;
pub mod batcher;
pub mod dedup;
pub mod validation;
pub mod pipeline;

pub use classifier::{classify, AlertSource, Publisher};
pub use extract::{extract, strategies_for, Extraction, ExtractionFailure, ExtractionStrategy};
pub use batcher::batch_articles;
pub use dedup::{dedup_papers, DedupOutcome};
pub use validation::{ValidationReport, ValidationVerdict, Validator};
pub use pipeline::{run_pipeline, Pipeline, PipelineReport};
