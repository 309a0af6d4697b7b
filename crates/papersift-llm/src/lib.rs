//! papersift-llm — the semantic scoring oracle boundary.
//!
//! `oracle` defines the contract and an LLM-backed adapter, `retry` and
//! `dispatch` wrap it with backoff and bounded concurrency, `sanitize`
//! cleans titles echoed back by the model, and `backend` holds the
//! chat-completion clients.

pub mod backend;
pub mod dispatch;
pub mod oracle;
pub mod retry;
pub mod sanitize;

pub use backend::{AnthropicBackend, LlmBackend, LlmError, OllamaBackend, OpenAiCompatibleBackend};
pub use dispatch::{dispatch_batches, BatchFailure, DispatchReport};
pub use oracle::{
    LlmScoringOracle, OracleError, OracleFailureKind, OracleJudgment, ScoredBatch, ScoringOracle,
};
pub use retry::{RetryPolicy, RetryingOracle};
pub use sanitize::strip_commentary;
