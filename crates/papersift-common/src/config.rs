//! Pipeline configuration supplied by the caller.
//!
//! Everything the core needs to make decisions lives here: keyword lists,
//! the minimum accepted score, batch caps for the oracle, retry and
//! dispatch tuning. Loaded from TOML (default), YAML or JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub keywords: KeywordSet,

    /// Papers scoring below this after adjustment are dropped.
    #[serde(default)]
    pub min_score: u8,

    #[serde(default)]
    pub batching: BatchLimits,

    #[serde(default)]
    pub scoring: ScoringPolicy,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub dispatch: DispatchSettings,

    #[serde(default)]
    pub validation: ValidationSettings,
}

// ── Keywords ──────────────────────────────────────────────────────────────────

/// Positive and penalty keyword lists.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KeywordSet {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub penalty: Vec<String>,
}

impl KeywordSet {
    pub fn new<P, N>(positive: P, penalty: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            positive: positive.into_iter().map(Into::into).collect(),
            penalty: penalty.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Batching ──────────────────────────────────────────────────────────────────

/// Caps applied to every batch sent to the oracle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BatchLimits {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,
}

fn default_max_items() -> usize { 50 }
fn default_token_budget() -> usize { 12_000 }

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            token_budget: default_token_budget(),
        }
    }
}

// ── Scoring policy ────────────────────────────────────────────────────────────

/// Knobs for the deterministic score adjustment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoringPolicy {
    /// Apply the flat -20 when no positive keyword matched.
    /// Preprint sources are always exempt.
    #[serde(default = "default_true")]
    pub no_match_penalty: bool,

    /// Characters of abstract/fragment used as the scoring snippet.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_true() -> bool { true }
fn default_snippet_chars() -> usize { 600 }

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            no_match_penalty: default_true(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

// ── Oracle retry ──────────────────────────────────────────────────────────────

/// Retry/backoff settings for oracle calls (milliseconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_rate_limit_base")]
    pub rate_limit_base_ms: u64,
    #[serde(default = "default_rate_limit_cap")]
    pub rate_limit_cap_ms: u64,
    #[serde(default = "default_network_base")]
    pub network_base_ms: u64,
    #[serde(default = "default_network_cap")]
    pub network_cap_ms: u64,
    #[serde(default = "default_linear_step")]
    pub linear_step_ms: u64,
}

fn default_max_attempts()    -> u32 { 4 }
fn default_rate_limit_base() -> u64 { 2_000 }
fn default_rate_limit_cap()  -> u64 { 30_000 }
fn default_network_base()    -> u64 { 5_000 }
fn default_network_cap()     -> u64 { 60_000 }
fn default_linear_step()     -> u64 { 1_000 }

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            rate_limit_base_ms: default_rate_limit_base(),
            rate_limit_cap_ms: default_rate_limit_cap(),
            network_base_ms: default_network_base(),
            network_cap_ms: default_network_cap(),
            linear_step_ms: default_linear_step(),
        }
    }
}

impl RetrySettings {
    /// Zero-delay settings, handy for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            rate_limit_base_ms: 0,
            rate_limit_cap_ms: 0,
            network_base_ms: 0,
            network_cap_ms: 0,
            linear_step_ms: 0,
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Bounded-concurrency window for multi-batch runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DispatchSettings {
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_cooldown")]
    pub cooldown_ms: u64,
}

fn default_window() -> usize { 5 }
fn default_cooldown() -> u64 { 2_000 }

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
            cooldown_ms: default_cooldown(),
        }
    }
}

impl DispatchSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValidationSettings {
    /// A run whose validation rate falls below this is logged at warn.
    #[serde(default = "default_warn_below")]
    pub warn_below: f64,
}

fn default_warn_below() -> f64 { 0.85 }

impl Default for ValidationSettings {
    fn default() -> Self {
        Self { warn_below: default_warn_below() }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load from papersift.toml, or the path in PAPERSIFT_CONFIG.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PAPERSIFT_CONFIG")
            .unwrap_or_else(|_| "papersift.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!("Config file not found: {}", path);
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from YAML file
    pub fn from_yaml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline unable to progress.
    pub fn validate(&self) -> Result<(), crate::error::PaperSiftError> {
        use crate::error::PaperSiftError;
        if self.batching.max_items == 0 {
            return Err(PaperSiftError::Config("batching.max_items must be > 0".into()));
        }
        if self.batching.token_budget == 0 {
            return Err(PaperSiftError::Config("batching.token_budget must be > 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(PaperSiftError::Config("retry.max_attempts must be > 0".into()));
        }
        if self.dispatch.window == 0 {
            return Err(PaperSiftError::Config("dispatch.window must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.validation.warn_below) {
            return Err(PaperSiftError::Config("validation.warn_below must be within 0.0..=1.0".into()));
        }
        if self.min_score > 100 {
            return Err(PaperSiftError::Config("min_score must be within 0..=100".into()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
