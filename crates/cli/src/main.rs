use clap::Parser;
use tracing_subscriber::EnvFilter;

use sl_cli::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(cli.json);

    match cli.command {
        Command::Version => {
            println!("sllmi {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Models => {
            let (config, _) = cli::load_config()?;
            let registry = cli::models::build_registry(&config)?;
            cli::models::list(&registry);
            Ok(())
        }
        Command::CountTokens { prompt, model } => {
            let (config, _) = cli::load_config()?;
            let registry = cli::models::build_registry(&config)?;
            cli::models::count_tokens(&registry, &model, &prompt)
        }
        Command::Generate {
            prompt,
            model,
            stream,
            params,
        } => {
            let (config, config_path) = cli::load_config()?;
            tracing::debug!(config = %config_path, "loaded config");
            let registry = cli::models::build_registry(&config)?;
            let generation = params.resolve(&config.generation);
            let cancel = cli::generate::cancel_on_ctrl_c();
            cli::generate::run(&registry, &model, &prompt, &generation, stream, cancel).await
        }
    }
}

/// Initialize stderr-only tracing for the CLI.
///
/// Defaults to `warn` level so diagnostic output does not pollute stdout.
/// `--json` switches to one JSON object per line.
fn init_cli_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
