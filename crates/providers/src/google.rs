//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` and `streamGenerateContent` APIs.
//! Auth is via an API key passed as a query parameter (`key={api_key}`), so
//! URLs are always redacted before they reach a log line.

use crate::auth::CredentialSet;
use crate::factory::{build_model_map, ModelMap, ProviderFactory};
use crate::traits::CompletionBackend;
use crate::util::{from_reqwest, redact_url_key, status_error};
use sl_domain::config::{GeminiConfig, GenerationConfig};
use sl_domain::error::{Error, Result};
use sl_domain::stream::ChunkStream;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "gemini";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Single-key transport for the Gemini API. Holds no credentials; the key
/// for each request is chosen by the caller.
pub struct GeminiBackend {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiBackend {
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

    fn generate_url(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, api_key
        )
    }

    fn stream_url(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, api_key
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response> {
        let resp = self
            .client
            .post(url)
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

/// Build the request body for a single-turn user prompt.
fn build_body(prompt: &str, config: &GenerationConfig) -> Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{"text": prompt}],
        }],
    });

    let mut gen_config = serde_json::json!({});
    if let Some(t) = config.temperature {
        gen_config["temperature"] = serde_json::json!(t);
    }
    if let Some(p) = config.top_p {
        gen_config["topP"] = serde_json::json!(p);
    }
    if let Some(k) = config.top_k {
        gen_config["topK"] = serde_json::json!(k);
    }
    if let Some(max) = config.output_length {
        gen_config["maxOutputTokens"] = serde_json::json!(max);
    }
    if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
        body["generationConfig"] = gen_config;
    }

    body
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Concatenated text of the first candidate, or `None` when the response
/// has no candidate or the candidate has no parts (e.g. a blocked prompt).
/// Parts whose text is empty still count as content.
fn parse_candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    if parts.is_empty() {
        return None;
    }

    let mut text = String::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(|v| v.as_str()) {
            text.push_str(t);
        }
    }
    Some(text)
}

/// Parse one streaming SSE data payload into its text chunk.
fn parse_sse_data(data: &str) -> Vec<Result<String>> {
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

    parse_candidate_text(&v).map(Ok).into_iter().collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl CompletionBackend for GeminiBackend {
    async fn send_prompt(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Option<String>> {
        let url = self.generate_url(model, api_key);
        tracing::debug!(provider = PROVIDER, url = %redact_url_key(&url), "gemini generate request");

        let resp = self.post(&url, &build_body(prompt, config)).await?;
        let resp_text = resp.text().await.map_err(from_reqwest)?;
        let resp_json: Value = serde_json::from_str(&resp_text)?;
        Ok(parse_candidate_text(&resp_json))
    }

    async fn open_stream(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<ChunkStream> {
        let url = self.stream_url(model, api_key);
        tracing::debug!(provider = PROVIDER, url = %redact_url_key(&url), "gemini stream request");

        let resp = self.post(&url, &build_body(prompt, config)).await?;
        Ok(crate::sse::sse_text_stream(resp, parse_sse_data))
    }

    fn provider_id(&self) -> &str {
        PROVIDER
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Factory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build one client per configured Gemini model, all sharing the key set
/// read from `cfg.api_keys_env`.
pub fn build_gemini_models(cfg: &GeminiConfig) -> Result<ModelMap> {
    let credentials = Arc::new(CredentialSet::from_env(&cfg.api_keys_env)?);
    let backend = Arc::new(GeminiBackend::new(
        &cfg.base_url,
        Duration::from_millis(cfg.connect_timeout_ms),
    )?);
    build_model_map(&cfg.models, credentials, backend, cfg.stream_buffer)
}

/// A [`ProviderFactory`] over [`build_gemini_models`]. The environment is read each
/// time the factory runs, never at registration.
pub fn gemini_factory(cfg: GeminiConfig) -> ProviderFactory {
    Box::new(move || build_gemini_models(&cfg))
}
