//! Shared testing utilities for the papersift workspace.
//!
//! - [`fixtures`]: alert messages in every supported layout
//! - [`oracle`]: a deterministic [`ScoringOracle`](papersift_llm::ScoringOracle)
//!   with injectable failures and fabricated papers

pub mod fixtures;
pub mod oracle;

pub use fixtures::*;
pub use oracle::{deterministic_score, FakeOracle};

use papersift_common::config::{DispatchSettings, KeywordSet, PipelineConfig, RetrySettings};

/// Pipeline config for tests: cardiovascular keywords, no retry delays and
/// no cooldown between dispatch windows.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        keywords: KeywordSet::new(["organoid", "single-cell proteomics", "fibrosis"], ["editorial", "erratum"]),
        retry: RetrySettings::immediate(2),
        dispatch: DispatchSettings { window: 2, cooldown_ms: 0 },
        ..Default::default()
    }
}
