//! Model registry.
//!
//! Built once from the provider factories at startup and read-only
//! afterwards, so lookups need no locking and clients can be shared freely
//! across tasks.

use crate::factory::{ModelMap, ProviderFactories};
use crate::traits::LanguageModel;
use sl_domain::error::{Error, Result};
use sl_domain::trace::TraceEvent;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ModelRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Every model served by every registered provider, keyed by model name.
pub struct ModelRegistry {
    models: ModelMap,
}

impl ModelRegistry {
    /// Run every factory and merge the results.
    ///
    /// Fails with the first factory error; no partial registry is returned.
    pub fn build(factories: ProviderFactories) -> Result<Self> {
        let factory_count = factories.len();
        let models = factories.build_all()?;

        tracing::info!(
            factories = factory_count,
            models = models.len(),
            "model registry built"
        );
        TraceEvent::RegistryBuilt {
            factories: factory_count,
            models: models.len(),
        }
        .emit();

        Ok(Self { models })
    }

    /// Wrap an already-built map.
    pub fn from_models(models: ModelMap) -> Self {
        Self { models }
    }

    /// Look up a model by exact name.
    pub fn get_model(&self, name: &str) -> Result<Arc<dyn LanguageModel>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ModelNotFound(name.to_string()))
    }

    /// Names of every registered model, sorted.
    pub fn list_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn LanguageModel>)> {
        self.models.iter().map(|(name, model)| (name.as_str(), model))
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.list_models())
            .finish()
    }
}
