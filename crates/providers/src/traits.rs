use crate::relay::StreamSession;
use sl_domain::config::GenerationConfig;
use sl_domain::error::Result;
use sl_domain::stream::ChunkStream;
use tokio_util::sync::CancellationToken;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Caller-facing capability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A named model as seen by callers of the registry.
///
/// Implementations hide which provider and which credential serve a call.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single-shot generation. Resolves once with the full text.
    ///
    /// `cancel` aborts the in-flight attempt; the call then returns
    /// [`Error::Cancelled`](sl_domain::error::Error::Cancelled) without
    /// trying further credentials.
    async fn generate(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String>;

    /// Streaming generation. Returns immediately; a background task feeds
    /// the session. Must be called from within a tokio runtime.
    fn generate_stream(
        &self,
        cancel: CancellationToken,
        prompt: &str,
        config: &GenerationConfig,
    ) -> StreamSession;

    /// Count the tokens of `prompt`. Never touches credentials.
    fn count_tokens(&self, prompt: &str) -> Result<usize>;

    /// The provider-side model identifier (e.g. `"gemini-2.0-flash"`).
    fn model_code(&self) -> &str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider-facing capability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The wire protocol of one provider, driven with one API key at a time.
///
/// Adapters (Gemini, OpenRouter) implement this; the key-rotation logic in
/// [`KeyRotatingModel`](crate::client::KeyRotatingModel) is shared.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync + 'static {
    /// Send a prompt and wait for the full response.
    ///
    /// `Ok(None)` means the provider answered successfully but with no
    /// candidate output (e.g. blocked by a content filter).
    async fn send_prompt(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<Option<String>>;

    /// Open a streaming response. Errors before the first chunk (transport
    /// setup, HTTP status) are returned here; errors afterwards arrive as
    /// stream items.
    async fn open_stream(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<ChunkStream>;

    /// A unique identifier for this provider (used in logs and traces).
    fn provider_id(&self) -> &str;
}

/// A tokenizer shared by every model of a provider family.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> Result<usize>;
}
