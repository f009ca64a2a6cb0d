//! `sllmi models` and `sllmi count-tokens`.

use sl_domain::config::Config;
use sl_providers::{ModelRegistry, ProviderFactories};

/// Build the registry from every enabled provider in `config`.
pub fn build_registry(config: &Config) -> anyhow::Result<ModelRegistry> {
    let factories = ProviderFactories::from_config(&config.providers);
    if factories.is_empty() {
        anyhow::bail!("no providers enabled; enable one under [providers] in the config file");
    }
    Ok(ModelRegistry::build(factories)?)
}

/// Print one model name per line.
pub fn list(registry: &ModelRegistry) {
    for name in registry.list_models() {
        println!("{name}");
    }
}

pub fn count_tokens(registry: &ModelRegistry, model: &str, prompt: &str) -> anyhow::Result<()> {
    let count = registry.get_model(model)?.count_tokens(prompt)?;
    println!("{count}");
    Ok(())
}
