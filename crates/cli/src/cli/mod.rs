pub mod generate;
pub mod models;

use clap::{Args, Parser, Subcommand};
use sl_domain::config::{Config, GenerationConfig};
use std::path::Path;

/// Model used when `--model` is not given.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// sllmi: multi-provider LLM access with API-key failover.
#[derive(Debug, Parser)]
#[command(name = "sllmi", version, about)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every model the configured providers serve.
    Models,
    /// Send a prompt and print the response.
    Generate {
        /// The prompt to send.
        prompt: String,
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
        /// Print chunks as they arrive.
        #[arg(long)]
        stream: bool,
        #[command(flatten)]
        params: GenerationArgs,
    },
    /// Count the tokens of a prompt locally.
    CountTokens {
        prompt: String,
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
    },
    /// Print version information.
    Version,
}

/// Per-call sampling overrides.
#[derive(Debug, Clone, Default, Args)]
pub struct GenerationArgs {
    #[arg(long)]
    pub temperature: Option<f32>,
    #[arg(long)]
    pub top_p: Option<f32>,
    #[arg(long)]
    pub top_k: Option<u32>,
    /// Maximum number of output tokens.
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

impl GenerationArgs {
    /// Flag values, falling back to the config file's `[generation]`.
    pub fn resolve(&self, defaults: &GenerationConfig) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            output_length: self.max_tokens,
        }
        .or(defaults)
    }
}

/// Load the configuration from the path specified by `SLLMI_CONFIG` (or
/// `sllmi.toml` by default). Returns the parsed [`Config`] and the path that
/// was used. A missing file yields the defaults.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("SLLMI_CONFIG").unwrap_or_else(|_| "sllmi.toml".into());
    let config = load_config_from(Path::new(&config_path))?;
    Ok((config, config_path))
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "sllmi",
            "generate",
            "hello",
            "--model",
            "gemini-2.5-pro",
            "--stream",
            "--temperature",
            "0.3",
            "--max-tokens",
            "100",
        ])
        .unwrap();
        match cli.command {
            Command::Generate {
                prompt,
                model,
                stream,
                params,
            } => {
                assert_eq!(prompt, "hello");
                assert_eq!(model, "gemini-2.5-pro");
                assert!(stream);
                assert_eq!(params.temperature, Some(0.3));
                assert_eq!(params.max_tokens, Some(100));
                assert_eq!(params.top_k, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn model_defaults_and_global_json_flag() {
        let cli = Cli::try_parse_from(["sllmi", "count-tokens", "hi", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Command::CountTokens { model, .. } => assert_eq!(model, DEFAULT_MODEL),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config_defaults() {
        let defaults = GenerationConfig::default()
            .with_temperature(0.9)
            .with_top_k(20);
        let args = GenerationArgs {
            temperature: Some(0.1),
            ..GenerationArgs::default()
        };
        let cfg = args.resolve(&defaults);
        assert_eq!(cfg.temperature, Some(0.1));
        assert_eq!(cfg.top_k, Some(20));
        assert_eq!(cfg.top_p, None);
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.providers.gemini.enabled);
        assert!(!cfg.providers.openrouter.enabled);
    }

    #[test]
    fn config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sllmi.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[generation]\ntemperature = 0.2\n\n[providers.openrouter]\nenabled = true\n"
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.generation.temperature, Some(0.2));
        assert!(cfg.providers.openrouter.enabled);
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[generation\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("parsing "));
    }
}
