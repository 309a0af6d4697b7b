//! Configuration loading for the papersift binary.
//! Reads papersift.toml from the current directory or the path in PAPERSIFT_CONFIG.

use papersift_common::config::PipelineConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which configured provider scores the batches.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<LlmBackendConfig>,
    pub anthropic: Option<LlmBackendConfig>,
    pub openai_compatible: Option<CompatConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            ollama: None,
            openai: None,
            anthropic: None,
            openai_compatible: None,
        }
    }
}

fn default_backend()           -> String { "ollama".to_string() }
fn default_max_output_tokens() -> u32    { 4096 }
fn default_temperature()       -> f32    { 0.1 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { base_url: default_ollama_url(), model: default_ollama_model() }
    }
}

fn default_ollama_url()   -> String { "http://localhost:11434".to_string() }
fn default_ollama_model() -> String { "llama3:8b".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmBackendConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// Resolve an API key from the config value, falling back to `env_var`.
/// Empty strings count as absent.
pub fn resolve_key(configured: Option<&str>, env_var: &str) -> Option<SecretString> {
    configured
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|k| !k.trim().is_empty()))
        .map(SecretString::from)
}

mod tests;

impl Config {
    /// Load configuration from papersift.toml.
    /// Checks PAPERSIFT_CONFIG env var first, then current directory.
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
        let config: Config = toml::from_str(content)?;
        config.pipeline.validate()?;
        Ok(config)
    }
}
