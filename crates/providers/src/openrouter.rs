//! OpenRouter adapter.
//!
//! OpenRouter follows the OpenAI chat completions contract:
//! `POST {base_url}/chat/completions` with `Authorization: Bearer <key>`,
//! streaming as SSE terminated by a `[DONE]` sentinel.

use crate::auth::CredentialSet;
use crate::factory::{build_model_map, ModelMap, ProviderFactory};
use crate::traits::CompletionBackend;
use crate::util::{from_reqwest, status_error};
use sl_domain::config::{GenerationConfig, OpenRouterConfig};
use sl_domain::error::{Error, Result};
use sl_domain::stream::ChunkStream;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "openrouter";

/// Single-key transport for the OpenRouter API.
pub struct OpenRouterBackend {
    base_url: String,
    client: reqwest::Client,
}

impl OpenRouterBackend {
    /// `connect_timeout` bounds connection setup only; requests and streams
    /// have no deadline of their own.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn post(&self, api_key: &str, body: &Value) -> Result<reqwest::Response> {
        let url = self.completions_url();
        tracing::debug!(provider = PROVIDER, url = %url, "openrouter request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;
        if !resp.status().is_success() {
            return Err(status_error(PROVIDER, resp).await);
        }
        Ok(resp)
    }
}

fn build_body(model: &str, prompt: &str, config: &GenerationConfig, stream: bool) -> Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "stream": stream,
    });
    if let Some(t) = config.temperature {
        body["temperature"] = serde_json::json!(t);
    }
    if let Some(p) = config.top_p {
        body["top_p"] = serde_json::json!(p);
    }
    if let Some(k) = config.top_k {
        body["top_k"] = serde_json::json!(k);
    }
    if let Some(max) = config.output_length {
        body["max_tokens"] = serde_json::json!(max);
    }
    body
}

/// Text of the first choice's message, `None` when absent or empty.
fn parse_choice_text(body: &Value) -> Option<String> {
    let text = body
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()?;
    (!text.is_empty()).then(|| text.to_string())
}

/// Parse a single SSE data line, handling the `[DONE]` sentinel.
fn parse_sse_data(data: &str) -> Vec<Result<String>> {
    if data.trim() == "[DONE]" {
        return Vec::new();
    }

    let v: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return vec![Err(Error::Json(e))],
    };

    if let Some(err) = v.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown stream error");
        return vec![Err(Error::Provider {
            provider: PROVIDER.into(),
            message: message.to_string(),
        })];
    }

    v.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|c| c.as_str())
        .filter(|t| !t.is_empty())
        .map(|t| vec![Ok(t.to_string())])
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl CompletionBackend for OpenRouterBackend {
    async fn send_prompt(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Option<String>> {
        let resp = self
            .post(api_key, &build_body(model, prompt, config, false))
            .await?;
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        let resp_json: Value = serde_json::from_str(&resp_text)?;
        Ok(parse_choice_text(&resp_json))
    }

    async fn open_stream(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<ChunkStream> {
        let resp = self
            .post(api_key, &build_body(model, prompt, config, true))
            .await?;
        Ok(crate::sse::sse_text_stream(resp, parse_sse_data))
    }

    fn provider_id(&self) -> &str {
        PROVIDER
    }
}

/// Build one client per configured OpenRouter model.
pub fn build_openrouter_models(cfg: &OpenRouterConfig) -> Result<ModelMap> {
    let credentials = Arc::new(CredentialSet::from_env(&cfg.api_keys_env)?);
    let backend = Arc::new(OpenRouterBackend::new(
        &cfg.base_url,
        Duration::from_millis(cfg.connect_timeout_ms),
    )?);
    build_model_map(&cfg.models, credentials, backend, cfg.stream_buffer)
}

/// A [`ProviderFactory`] over [`build_openrouter_models`]. The environment is read each
/// time the factory runs, never at registration.
pub fn openrouter_factory(cfg: OpenRouterConfig) -> ProviderFactory {
    Box::new(move || build_openrouter_models(&cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_model_prompt_and_params() {
        let cfg = GenerationConfig::default()
            .with_temperature(0.25)
            .with_output_length(64);
        let body = build_body("z-ai/glm-4.5-air:free", "hi", &cfg, true);
        assert_eq!(body["model"], "z-ai/glm-4.5-air:free");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["stream"], true);
        assert_eq!(body["temperature"], 0.25);
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn choice_text_extracted() {
        let body = serde_json::json!({"choices": [{"message": {"role": "assistant", "content": "ok"}}]});
        assert_eq!(parse_choice_text(&body).as_deref(), Some("ok"));
    }

    #[test]
    fn empty_choices_is_no_content() {
        assert_eq!(parse_choice_text(&serde_json::json!({"choices": []})), None);
        let empty = serde_json::json!({"choices": [{"message": {"content": ""}}]});
        assert_eq!(parse_choice_text(&empty), None);
    }

    #[test]
    fn sse_delta_yields_text() {
        let items = parse_sse_data(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap(), "Hi");
    }

    #[test]
    fn sse_done_and_role_only_deltas_yield_nothing() {
        assert!(parse_sse_data("[DONE]").is_empty());
        assert!(parse_sse_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).is_empty());
    }

    #[test]
    fn sse_error_payload_is_provider_error() {
        let items = parse_sse_data(r#"{"error":{"message":"rate limited"}}"#);
        assert!(items[0].as_ref().unwrap_err().to_string().contains("rate limited"));
    }
}
