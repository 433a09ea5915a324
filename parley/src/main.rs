#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod session;

use args::Args;
use clap::Parser;
use parley_anthropic::{AnthropicClient, ChatCompleterOptions};
use parley_config::Config;
use session::Session;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(model) = &args.model {
        config.anthropic.model.clone_from(model);
    }

    let _telemetry_guard = parley_telemetry::init(config.telemetry.as_ref(), &args.log)?;

    tracing::info!(
        config_path = %args.config.display(),
        model = %config.anthropic.model,
        "starting parley"
    );

    let client = AnthropicClient::from_config(&config.anthropic)?;
    let completer = client.chat_completer(ChatCompleterOptions::from_config(&config.anthropic));
    let mut session = Session::new(completer, args.system.clone(), args.temperature);

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let mut stdout = tokio::io::stdout();

    if let Some(prompt) = args.prompt() {
        return session.turn(prompt, &mut stdout, &shutdown).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break;
        };

        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }

        if let Err(e) = session.turn(prompt.to_owned(), &mut stdout, &shutdown).await {
            tracing::error!(error = %e, "completion failed");
            eprintln!("error: {e}");
        }

        if shutdown.is_cancelled() {
            break;
        }
    }

    tracing::info!("parley stopped");
    Ok(())
}

/// Wait for `SIGINT` or `SIGTERM`
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
