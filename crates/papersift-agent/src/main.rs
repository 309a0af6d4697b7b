//! papersift — ranks the papers announced in a batch of alert emails.
//!
//! Usage: `papersift <messages.json>` where the file holds a JSON array of
//! raw alert messages. The ranked report is printed to stdout as JSON.

mod config;

use std::sync::Arc;

use papersift_common::models::RawMessage;
use papersift_ingestion::Pipeline;
use papersift_llm::{
    AnthropicBackend, LlmBackend, LlmScoringOracle, OllamaBackend, OpenAiCompatibleBackend,
    ScoringOracle,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{resolve_key, Config, LlmConfig};

fn wrap<B: LlmBackend + 'static>(backend: B, llm: &LlmConfig) -> Arc<dyn ScoringOracle> {
    Arc::new(
        LlmScoringOracle::new(backend)
            .with_max_output_tokens(llm.max_output_tokens)
            .with_temperature(llm.temperature),
    )
}

/// Build the scoring oracle for the provider named in `llm.backend`.
fn build_oracle(llm: &LlmConfig) -> anyhow::Result<Arc<dyn ScoringOracle>> {
    match llm.backend.as_str() {
        "ollama" => {
            let ollama = llm.ollama.clone().unwrap_or_default();
            Ok(wrap(OllamaBackend::new(ollama.base_url, ollama.model), llm))
        }
        "openai" => {
            let Some(openai) = llm.openai.as_ref() else {
                anyhow::bail!("llm.backend is \"openai\" but [llm.openai] is missing");
            };
            let Some(key) = resolve_key(openai.api_key.as_deref(), "PAPERSIFT_OPENAI_API_KEY") else {
                anyhow::bail!("OpenAI selected but no API key found (set llm.openai.api_key or PAPERSIFT_OPENAI_API_KEY)");
            };
            Ok(wrap(OpenAiCompatibleBackend::openai(key, openai.model.clone()), llm))
        }
        "anthropic" => {
            let Some(anthropic) = llm.anthropic.as_ref() else {
                anyhow::bail!("llm.backend is \"anthropic\" but [llm.anthropic] is missing");
            };
            let Some(key) = resolve_key(anthropic.api_key.as_deref(), "PAPERSIFT_ANTHROPIC_API_KEY") else {
                anyhow::bail!("Anthropic selected but no API key found (set llm.anthropic.api_key or PAPERSIFT_ANTHROPIC_API_KEY)");
            };
            Ok(wrap(AnthropicBackend::new(key, anthropic.model.clone()), llm))
        }
        "openai_compatible" => {
            let Some(compat) = llm.openai_compatible.as_ref() else {
                anyhow::bail!("llm.backend is \"openai_compatible\" but [llm.openai_compatible] is missing");
            };
            let key = resolve_key(compat.api_key.as_deref(), "PAPERSIFT_COMPAT_API_KEY");
            if key.is_none() {
                warn!("No API key for {}; sending unauthenticated requests", compat.base_url);
            }
            Ok(wrap(
                OpenAiCompatibleBackend::new(compat.base_url.clone(), compat.model.clone(), key),
                llm,
            ))
        }
        other => anyhow::bail!(
            "Unknown llm.backend \"{other}\" (expected ollama, openai, anthropic or openai_compatible)"
        ),
    }
}

fn read_messages(path: &str) -> anyhow::Result<Vec<RawMessage>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Could not read {path}: {e}"))?;
    Ok(serde_json::from_str(&content)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("papersift=debug,info")),
        )
        .init();

    info!("papersift {}", env!("CARGO_PKG_VERSION"));

    let Some(input) = std::env::args().nth(1) else {
        anyhow::bail!("usage: papersift <messages.json>");
    };

    let config = match Config::load() {
        Ok(c) => {
            info!(backend = %c.llm.backend, keywords = c.pipeline.keywords.positive.len(), "Configuration loaded");
            c
        }
        Err(e) => {
            warn!("Could not load papersift.toml ({e}); using defaults");
            Config::default()
        }
    };

    let oracle = build_oracle(&config.llm)?;
    info!(oracle = oracle.name(), "Scoring oracle ready");

    let messages = read_messages(&input)?;
    info!(messages = messages.len(), path = %input, "Messages loaded");

    let report = Pipeline::new(oracle, config.pipeline).run(&messages).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
