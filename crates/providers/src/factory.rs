//! Provider factory registry.
//!
//! Each provider contributes one constructor closure that, when invoked,
//! reads its credentials and returns a client per model it serves. The
//! registry only knows the closures, never the concrete client types.

use crate::auth::CredentialSet;
use crate::client::KeyRotatingModel;
use crate::google::gemini_factory;
use crate::openrouter::openrouter_factory;
use crate::tokenizer::TiktokenCounter;
use crate::traits::{CompletionBackend, LanguageModel, TokenCounter};
use sl_domain::config::ProvidersConfig;
use sl_domain::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Model name to client.
pub type ModelMap = HashMap<String, Arc<dyn LanguageModel>>;

/// Builds every model of one provider. Reads the environment when invoked.
pub type ProviderFactory = Box<dyn Fn() -> Result<ModelMap> + Send + Sync>;

/// Ordered list of named provider factories.
///
/// [`build_all`](Self::build_all) consumes the list, so every registration
/// happens before the first build.
#[derive(Default)]
pub struct ProviderFactories {
    factories: Vec<(String, ProviderFactory)>,
}

impl ProviderFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// The factory of every enabled provider in `cfg`.
    pub fn from_config(cfg: &ProvidersConfig) -> Self {
        let mut factories = Self::new();
        if cfg.gemini.enabled {
            factories.register("gemini", gemini_factory(cfg.gemini.clone()));
        }
        if cfg.openrouter.enabled {
            factories.register("openrouter", openrouter_factory(cfg.openrouter.clone()));
        }
        factories
    }

    /// Append a factory. Factories run in registration order.
    pub fn register(&mut self, name: impl Into<String>, factory: ProviderFactory) -> &mut Self {
        self.factories.push((name.into(), factory));
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Provider names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }

    /// Invoke every factory in order and merge their models.
    ///
    /// Stops at the first factory error. A model name produced by two
    /// factories keeps the later client.
    pub fn build_all(self) -> Result<ModelMap> {
        let mut models = ModelMap::new();
        for (provider, factory) in self.factories {
            let built = factory()?;
            tracing::debug!(provider = %provider, models = built.len(), "provider factory built");
            for (name, model) in built {
                if models.insert(name.clone(), model).is_some() {
                    tracing::warn!(
                        provider = %provider,
                        model = %name,
                        "model registered twice, keeping the later provider's client"
                    );
                }
            }
        }
        Ok(models)
    }
}

impl std::fmt::Debug for ProviderFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// One [`KeyRotatingModel`] per model code, sharing credentials, transport
/// and tokenizer.
pub(crate) fn build_model_map<B: CompletionBackend>(
    models: &[String],
    credentials: Arc<CredentialSet>,
    backend: Arc<B>,
    stream_buffer: usize,
) -> Result<ModelMap> {
    let tokenizer: Arc<dyn TokenCounter> = Arc::new(TiktokenCounter::new());
    let mut map = ModelMap::new();
    for code in models {
        let client = KeyRotatingModel::new(
            code.clone(),
            credentials.clone(),
            backend.clone(),
            tokenizer.clone(),
        )?
        .with_stream_buffer(stream_buffer);
        map.insert(code.clone(), Arc::new(client) as Arc<dyn LanguageModel>);
    }
    Ok(map)
}
