//! Scripted backends for unit tests.

use crate::traits::{CompletionBackend, TokenCounter};
use sl_domain::config::GenerationConfig;
use sl_domain::error::{Error, Result};
use sl_domain::stream::ChunkStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the fake provider answers for one key.
#[derive(Clone)]
pub(crate) enum Script {
    Text(String),
    /// Success with no candidate content.
    Empty,
    /// Never answers.
    Hang,
    Chunks(Vec<String>),
    /// Streams the chunks, then fails.
    FailAfter(Vec<String>),
    /// Streams `"tick"` forever.
    Endless,
}

impl Script {
    pub(crate) fn text(s: &str) -> Self {
        Script::Text(s.to_string())
    }
}

/// Keys without a script are rejected like invalid API keys.
pub(crate) struct FakeBackend {
    scripts: HashMap<String, Script>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_key(mut self, key: &str, script: Script) -> Self {
        self.scripts.insert(key.to_string(), script);
        self
    }

    /// Keys used, in call order.
    pub(crate) fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    fn lookup(&self, key: &str) -> Result<Script> {
        self.calls.lock().unwrap().push(key.to_string());
        self.scripts.get(key).cloned().ok_or_else(|| Error::Provider {
            provider: "fake".into(),
            message: "HTTP 400 - API key not valid".into(),
        })
    }
}

#[async_trait::async_trait]
impl CompletionBackend for FakeBackend {
    async fn send_prompt(
        &self,
        api_key: &str,
        _model: &str,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<Option<String>> {
        match self.lookup(api_key)? {
            Script::Text(t) => Ok(Some(t)),
            Script::Empty => Ok(None),
            Script::Hang => std::future::pending().await,
            Script::Chunks(c) => Ok(Some(c.concat())),
            Script::FailAfter(_) => Err(Error::Http("connection reset".into())),
            Script::Endless => Ok(Some("tick".into())),
        }
    }

    async fn open_stream(
        &self,
        api_key: &str,
        _model: &str,
        _prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<ChunkStream> {
        let stream: ChunkStream = match self.lookup(api_key)? {
            Script::Text(t) => Box::pin(futures_util::stream::iter(vec![Ok(t)])),
            Script::Empty => Box::pin(futures_util::stream::empty()),
            Script::Hang => return std::future::pending().await,
            Script::Chunks(c) => Box::pin(futures_util::stream::iter(c.into_iter().map(Ok))),
            Script::FailAfter(c) => Box::pin(async_stream::stream! {
                for chunk in c {
                    yield Ok(chunk);
                }
                yield Err(Error::Http("connection reset".into()));
            }),
            Script::Endless => Box::pin(async_stream::stream! {
                loop {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    yield Ok("tick".to_string());
                }
            }),
        };
        Ok(stream)
    }

    fn provider_id(&self) -> &str {
        "fake"
    }
}

/// Returns the same count for every input.
pub(crate) struct FixedCounter(pub usize);

impl TokenCounter for FixedCounter {
    fn count_tokens(&self, _text: &str) -> Result<usize> {
        Ok(self.0)
    }
}
