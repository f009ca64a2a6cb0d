//! `sllmi generate`: one-shot or streamed generation.
//!
//! Output goes to stdout; diagnostics go to stderr through `tracing`. Ctrl-C
//! cancels the in-flight call through its token.

use std::io::Write;

use sl_domain::config::GenerationConfig;
use sl_providers::ModelRegistry;
use tokio_util::sync::CancellationToken;

/// Run one generation and print the result.
pub async fn run(
    registry: &ModelRegistry,
    model: &str,
    prompt: &str,
    config: &GenerationConfig,
    stream: bool,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let model = registry.get_model(model)?;
    tracing::debug!(model = %model.model_code(), stream, "generate");

    if !stream {
        let text = model.generate(&cancel, prompt, config).await?;
        println!("{text}");
        return Ok(());
    }

    let mut session = model.generate_stream(cancel, prompt, config);
    let mut stdout = std::io::stdout();
    let mut printed = false;
    while let Some(chunk) = session.next_chunk().await {
        print!("{chunk}");
        stdout.flush().ok();
        printed = true;
    }
    let outcome = session.finish().await;
    if printed {
        // Trailing newline after streamed chunks.
        println!();
    }
    Ok(outcome?)
}

/// A token that fires on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}
