use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider system
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which providers contribute models to the registry.
///
/// Credentials are never stored here: each provider names the environment
/// variable holding its comma-separated API keys, and that variable is read
/// when the provider's factory runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
}

/// Google Gemini (Generative Language API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "d_gemini_keys_env")]
    pub api_keys_env: String,
    #[serde(default = "d_gemini_models")]
    pub models: Vec<String>,
    /// TCP/TLS connect timeout. Requests themselves have no deadline; callers
    /// bound them through their cancellation token.
    #[serde(default = "d_10000u")]
    pub connect_timeout_ms: u64,
    /// Capacity of the data channel of each stream session.
    #[serde(default = "d_16")]
    pub stream_buffer: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: d_gemini_base_url(),
            api_keys_env: d_gemini_keys_env(),
            models: d_gemini_models(),
            connect_timeout_ms: 10_000,
            stream_buffer: 16,
        }
    }
}

/// OpenRouter (OpenAI-compatible chat completions). Disabled by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "d_openrouter_base_url")]
    pub base_url: String,
    #[serde(default = "d_openrouter_keys_env")]
    pub api_keys_env: String,
    #[serde(default = "d_openrouter_models")]
    pub models: Vec<String>,
    #[serde(default = "d_10000u")]
    pub connect_timeout_ms: u64,
    #[serde(default = "d_16")]
    pub stream_buffer: usize,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: d_openrouter_base_url(),
            api_keys_env: d_openrouter_keys_env(),
            models: d_openrouter_models(),
            connect_timeout_ms: 10_000,
            stream_buffer: 16,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_10000u() -> u64 {
    10_000
}
fn d_16() -> usize {
    16
}
fn d_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_gemini_keys_env() -> String {
    "GENAI_API_KEYS".into()
}
fn d_gemini_models() -> Vec<String> {
    [
        "gemini-2.5-pro",
        "gemini-2.5-flash",
        "gemini-2.5-flash-lite",
        "gemini-2.0-flash",
        "gemini-2.0-flash-lite",
        "gemma-3-27b-it",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn d_openrouter_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn d_openrouter_keys_env() -> String {
    "OPENROUTER_API_KEYS".into()
}
fn d_openrouter_models() -> Vec<String> {
    vec![
        "z-ai/glm-4.5-air:free".into(),
        "deepseek/deepseek-chat-v3.1:free".into(),
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_enabled_openrouter_disabled_by_default() {
        let cfg = ProvidersConfig::default();
        assert!(cfg.gemini.enabled);
        assert!(!cfg.openrouter.enabled);
    }

    #[test]
    fn partial_section_keeps_field_defaults() {
        let json = r#"{ "gemini": { "api_keys_env": "MY_KEYS" } }"#;
        let cfg: ProvidersConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.gemini.api_keys_env, "MY_KEYS");
        assert!(cfg.gemini.enabled);
        assert_eq!(cfg.gemini.models.len(), 6);
        assert_eq!(cfg.gemini.stream_buffer, 16);
        assert_eq!(cfg.openrouter.api_keys_env, "OPENROUTER_API_KEYS");
    }
}
