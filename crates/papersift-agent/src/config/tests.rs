#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.llm.backend, "ollama");
        assert_eq!(config.pipeline.batching.max_items, 50);
        assert!(config.llm.openai.is_none());
    }

    #[test]
    fn test_sections_parse() {
        let config = Config::from_toml_str(
            r#"
            [pipeline]
            min_score = 30

            [pipeline.keywords]
            positive = ["organoid"]
            penalty = ["erratum"]

            [llm]
            backend = "openai_compatible"

            [llm.openai_compatible]
            base_url = "http://localhost:8000"
            model = "qwen2.5-7b-instruct"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.min_score, 30);
        assert_eq!(config.pipeline.keywords.positive, vec!["organoid".to_string()]);
        let compat = config.llm.openai_compatible.unwrap();
        assert_eq!(compat.model, "qwen2.5-7b-instruct");
        assert_eq!(compat.api_key, None);
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_toml_str(include_str!("../../../../papersift.example.toml")).unwrap();
        assert_eq!(config.llm.backend, "ollama");
        assert_eq!(config.llm.ollama.unwrap().model, "llama3:8b");
        assert_eq!(config.pipeline.keywords.penalty, vec!["erratum".to_string(), "editorial".to_string()]);
    }

    #[test]
    fn test_invalid_pipeline_settings_are_rejected() {
        let err = Config::from_toml_str("[pipeline.batching]\nmax_items = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_items"));
    }

    #[test]
    fn test_configured_key_wins_over_env() {
        let key = resolve_key(Some("sk-config"), "PAPERSIFT_TEST_UNSET_KEY").unwrap();
        assert_eq!(key.expose_secret(), "sk-config");
    }

    #[test]
    fn test_blank_key_is_absent() {
        assert!(resolve_key(Some("  "), "PAPERSIFT_TEST_UNSET_KEY").is_none());
        assert!(resolve_key(None, "PAPERSIFT_TEST_UNSET_KEY").is_none());
    }
}
