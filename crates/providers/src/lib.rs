pub mod auth;
pub mod client;
pub mod factory;
pub mod google;
pub mod openrouter;
pub mod registry;
pub mod relay;
pub mod tokenizer;
pub mod traits;
pub(crate) mod sse;
pub(crate) mod util;

#[cfg(test)]
mod testing;

// Re-exports for convenience.
pub use auth::CredentialSet;
pub use client::KeyRotatingModel;
pub use factory::{ModelMap, ProviderFactories, ProviderFactory};
pub use registry::ModelRegistry;
pub use relay::StreamSession;
pub use traits::{CompletionBackend, LanguageModel, TokenCounter};
