//! papersift-common — Shared types, errors, configuration and text helpers
//! used across all papersift crates.

pub mod error;
pub mod models;
pub mod config;
pub mod text;
pub mod telemetry;

// Re-export commonly used types
pub use config::{PipelineConfig, KeywordSet, BatchLimits, ScoringPolicy, RetrySettings, DispatchSettings, ValidationSettings};
pub use error::{PaperSiftError, Result};
pub use models::{RawMessage, BodyFormat, ExtractedArticle, ArticleBatch, ScoredPaper, ValidationResult, MatchStrength};
