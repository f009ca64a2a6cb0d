use sl_domain::config::{Config, GenerationConfig};

#[test]
fn empty_file_yields_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert!(config.generation.is_empty());
    assert!(config.providers.gemini.enabled);
    assert_eq!(config.providers.gemini.api_keys_env, "GENAI_API_KEYS");
    assert!(!config.providers.openrouter.enabled);
}

#[test]
fn generation_defaults_parse() {
    let toml_str = r#"
[generation]
temperature = 0.2
output_length = 256
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(
        config.generation,
        GenerationConfig::default()
            .with_temperature(0.2)
            .with_output_length(256)
    );
}

#[test]
fn provider_sections_parse() {
    let toml_str = r#"
[providers.gemini]
enabled = false

[providers.openrouter]
enabled = true
api_keys_env = "OR_KEYS"
models = ["z-ai/glm-4.5-air:free"]
stream_buffer = 4
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(!config.providers.gemini.enabled);
    assert!(config.providers.openrouter.enabled);
    assert_eq!(config.providers.openrouter.api_keys_env, "OR_KEYS");
    assert_eq!(config.providers.openrouter.models, vec!["z-ai/glm-4.5-air:free"]);
    assert_eq!(config.providers.openrouter.stream_buffer, 4);
    assert_eq!(
        config.providers.openrouter.base_url,
        "https://openrouter.ai/api/v1"
    );
}

#[test]
fn default_gemini_model_list() {
    let config = Config::default();
    let models = &config.providers.gemini.models;
    assert!(models.contains(&"gemini-2.5-flash".to_string()));
    assert!(models.contains(&"gemma-3-27b-it".to_string()));
}

#[test]
fn connect_timeout_defaults_and_overrides() {
    let config = Config::default();
    assert_eq!(config.providers.gemini.connect_timeout_ms, 10_000);
    assert_eq!(config.providers.openrouter.connect_timeout_ms, 10_000);

    let config: Config = toml::from_str("[providers.gemini]\nconnect_timeout_ms = 2500\n").unwrap();
    assert_eq!(config.providers.gemini.connect_timeout_ms, 2_500);
    assert_eq!(config.providers.openrouter.connect_timeout_ms, 10_000);
}
