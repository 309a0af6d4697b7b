//! Retry with per-failure-kind backoff around any [`ScoringOracle`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use papersift_common::config::{KeywordSet, RetrySettings};
use papersift_common::models::ArticleBatch;
use papersift_common::telemetry::{PipelineEvent, PipelineObserver};
use tracing::warn;

use crate::oracle::{OracleError, OracleFailureKind, ScoredBatch, ScoringOracle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    settings: RetrySettings,
}

impl RetryPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    pub fn max_attempts(&self) -> u32 {
        self.settings.max_attempts.max(1)
    }

    /// Delay before the next attempt after `attempt` (1-based) failed with
    /// `kind`, or `None` when the failure must not be retried.
    pub fn delay_for(&self, kind: OracleFailureKind, attempt: u32) -> Option<Duration> {
        let s = &self.settings;
        let ms = match kind {
            OracleFailureKind::Auth => return None,
            OracleFailureKind::RateLimit => doubling(s.rate_limit_base_ms, s.rate_limit_cap_ms, attempt),
            OracleFailureKind::Network => doubling(s.network_base_ms, s.network_cap_ms, attempt),
            OracleFailureKind::TokenLimit | OracleFailureKind::Malformed | OracleFailureKind::Unknown => {
                s.linear_step_ms.saturating_mul(u64::from(attempt))
            }
        };
        Some(Duration::from_millis(ms))
    }

    /// [`delay_for`](Self::delay_for), raised to any wait the server asked for.
    pub fn delay_after(&self, err: &OracleError, attempt: u32) -> Option<Duration> {
        let delay = self.delay_for(err.kind, attempt)?;
        Some(err.retry_after.map_or(delay, |wait| delay.max(wait)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetrySettings::default())
    }
}

fn doubling(base_ms: u64, cap_ms: u64, attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(20);
    base_ms.saturating_mul(1u64 << shift).min(cap_ms)
}

/// Wraps an oracle so that transient failures are retried.
pub struct RetryingOracle<O> {
    inner: O,
    policy: RetryPolicy,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl<O: ScoringOracle> RetryingOracle<O> {
    pub fn new(inner: O, policy: RetryPolicy) -> Self {
        Self { inner, policy, observer: None }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

#[async_trait]
impl<O: ScoringOracle> ScoringOracle for RetryingOracle<O> {
    async fn score(&self, batch: &ArticleBatch, keywords: &KeywordSet) -> Result<ScoredBatch, OracleError> {
        let max = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            let err = match self.inner.score(batch, keywords).await {
                Ok(scored) => return Ok(scored),
                Err(e) => e,
            };

            let delay = match self.policy.delay_after(&err, attempt) {
                Some(d) if attempt < max => d,
                _ => return Err(err),
            };

            warn!(
                batch = batch.index,
                attempt,
                kind = %err.kind,
                delay_ms = delay.as_millis() as u64,
                "Oracle call failed: {}", err.message
            );
            if let Some(obs) = &self.observer {
                obs.on_event(&PipelineEvent::OracleRetry {
                    attempt,
                    kind: err.kind.to_string(),
                    delay_ms: delay.as_millis() as u64,
                });
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
