//! Key-rotating generation client.
//!
//! [`KeyRotatingModel`] serves one model of one provider. It owns the
//! provider's [`CredentialSet`] and, on every call, walks a fresh random
//! permutation of it: a credential that fails at the transport or API level
//! is logged and skipped, and only when every credential has failed does the
//! caller see an error.
//!
//! Two outcomes are never retried with another credential:
//! - an empty-but-successful response (`no content in response`), since a
//!   content-policy verdict does not depend on which key asked;
//! - cancellation by the caller.

use crate::auth::{CredentialSet, KeyEntry};
use crate::relay::{self, ChunkSink, StreamSession, DEFAULT_STREAM_BUFFER};
use crate::traits::{CompletionBackend, LanguageModel, TokenCounter};
use crate::util::cancellable;
use futures_util::StreamExt;
use sl_domain::config::GenerationConfig;
use sl_domain::error::{Error, Result};
use sl_domain::trace::TraceEvent;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One model of one provider, with failover across the provider's keys.
pub struct KeyRotatingModel<B: CompletionBackend> {
    model: String,
    credentials: Arc<CredentialSet>,
    backend: Arc<B>,
    tokenizer: Arc<dyn TokenCounter>,
    stream_buffer: usize,
}

impl<B: CompletionBackend> KeyRotatingModel<B> {
    /// Create a client. Performs no network I/O.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `model` is blank or `credentials` holds
    /// no keys.
    pub fn new(
        model: impl Into<String>,
        credentials: Arc<CredentialSet>,
        backend: Arc<B>,
        tokenizer: Arc<dyn TokenCounter>,
    ) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(Error::Config("model code must not be empty".into()));
        }
        if credentials.is_empty() {
            return Err(Error::Config(format!(
                "at least one API key is required for model '{model}'"
            )));
        }
        Ok(Self {
            model,
            credentials,
            backend,
            tokenizer,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        })
    }

    /// Set the data-channel capacity of stream sessions.
    pub fn with_stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity.max(1);
        self
    }

    fn provider(&self) -> &str {
        self.backend.provider_id()
    }
}

impl<B: CompletionBackend> std::fmt::Debug for KeyRotatingModel<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRotatingModel")
            .field("provider", &self.provider())
            .field("model", &self.model)
            .field("credentials", &self.credentials)
            .field("stream_buffer", &self.stream_buffer)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl<B: CompletionBackend> LanguageModel for KeyRotatingModel<B> {
    async fn generate(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let start = Instant::now();
        let mut last_err: Option<Error> = None;
        let keys = self.credentials.shuffled();

        for (attempt, entry) in keys.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let result = cancellable(
                cancel,
                self.backend
                    .send_prompt(&entry.key, &self.model, prompt, config),
            )
            .await?;

            match result {
                Ok(Some(text)) => {
                    TraceEvent::LlmRequest {
                        provider: self.provider().to_string(),
                        model: self.model.clone(),
                        streaming: false,
                        duration_ms: start.elapsed().as_millis() as u64,
                        attempts: attempt + 1,
                        key_index: entry.index,
                    }
                    .emit();
                    return Ok(text);
                }
                Ok(None) => {
                    tracing::warn!(
                        provider = %self.provider(),
                        model = %self.model,
                        key_index = entry.index,
                        "response carried no content, not retrying"
                    );
                    return Err(Error::no_content());
                }
                Err(e) => {
                    self.record_failover(entry, attempt, false, &e);
                    last_err = Some(e);
                }
            }
        }

        TraceEvent::KeysExhausted {
            provider: self.provider().to_string(),
            model: self.model.clone(),
            streaming: false,
            attempts: keys.len(),
        }
        .emit();
        Err(Error::all_keys_failed(last_err))
    }

    fn generate_stream(
        &self,
        cancel: CancellationToken,
        prompt: &str,
        config: &GenerationConfig,
    ) -> StreamSession {
        let job = StreamJob {
            backend: self.backend.clone(),
            model: self.model.clone(),
            prompt: prompt.to_string(),
            config: *config,
            keys: self.credentials.shuffled(),
        };
        relay::spawn(cancel, self.stream_buffer, move |sink| job.run(sink))
    }

    fn count_tokens(&self, prompt: &str) -> Result<usize> {
        self.tokenizer.count_tokens(prompt)
    }

    fn model_code(&self) -> &str {
        &self.model
    }
}

impl<B: CompletionBackend> KeyRotatingModel<B> {
    fn record_failover(&self, entry: &KeyEntry, attempt: usize, streaming: bool, e: &Error) {
        record_failover(self.provider(), &self.model, entry, attempt, streaming, e);
    }
}

fn record_failover(
    provider: &str,
    model: &str,
    entry: &KeyEntry,
    attempt: usize,
    streaming: bool,
    e: &Error,
) {
    tracing::warn!(
        provider = %provider,
        model = %model,
        key_index = entry.index,
        attempt = attempt + 1,
        streaming,
        error = %e,
        "API key failed, trying next"
    );
    TraceEvent::KeyFailover {
        provider: provider.to_string(),
        model: model.to_string(),
        key_index: entry.index,
        attempt: attempt + 1,
        streaming,
        error: e.to_string(),
    }
    .emit();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Streaming
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything the background task of one streaming call owns.
struct StreamJob<B: CompletionBackend> {
    backend: Arc<B>,
    model: String,
    prompt: String,
    config: GenerationConfig,
    keys: Vec<KeyEntry>,
}

impl<B: CompletionBackend> StreamJob<B> {
    async fn run(self, mut sink: ChunkSink) -> Result<()> {
        let start = Instant::now();
        let provider = self.backend.provider_id().to_string();
        let mut last_err: Option<Error> = None;

        for (attempt, entry) in self.keys.iter().enumerate() {
            if sink.is_cancelled() {
                return Err(self.cancelled(&provider, &sink));
            }

            // Chunks delivered before a mid-stream failure stay delivered;
            // the next credential restarts the answer from the beginning.
            match self.attempt(entry, &mut sink).await {
                Ok(()) => {
                    TraceEvent::LlmRequest {
                        provider,
                        model: self.model.clone(),
                        streaming: true,
                        duration_ms: start.elapsed().as_millis() as u64,
                        attempts: attempt + 1,
                        key_index: entry.index,
                    }
                    .emit();
                    return Ok(());
                }
                Err(Error::Cancelled) => return Err(self.cancelled(&provider, &sink)),
                Err(e) => {
                    record_failover(&provider, &self.model, entry, attempt, true, &e);
                    last_err = Some(e);
                }
            }
        }

        TraceEvent::KeysExhausted {
            provider,
            model: self.model.clone(),
            streaming: true,
            attempts: self.keys.len(),
        }
        .emit();
        Err(Error::all_keys_failed(last_err))
    }

    /// Stream the whole answer under one credential.
    async fn attempt(&self, entry: &KeyEntry, sink: &mut ChunkSink) -> Result<()> {
        let mut stream = sink
            .race(self.backend.open_stream(
                &entry.key,
                &self.model,
                &self.prompt,
                &self.config,
            ))
            .await??;

        while let Some(item) = sink.race(stream.next()).await? {
            let chunk = item?;
            if !chunk.is_empty() {
                sink.push(chunk).await?;
            }
        }
        Ok(())
    }

    fn cancelled(&self, provider: &str, sink: &ChunkSink) -> Error {
        tracing::debug!(
            provider = %provider,
            model = %self.model,
            chunks_sent = sink.sent(),
            "stream cancelled"
        );
        TraceEvent::StreamCancelled {
            provider: provider.to_string(),
            model: self.model.clone(),
            chunks_sent: sink.sent(),
        }
        .emit();
        Error::Cancelled
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
