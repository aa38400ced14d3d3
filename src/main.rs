use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;

use postbox::cli::Cli;
use postbox::config::Config;
use postbox::interpreter::LiveHost;
use postbox::logging::init_tracing;
use postbox::post::PostOffice;
use postbox::runtime::{feed_lines, Runtime};
use postbox::shutdown::ShutdownHandle;

const INPUT_QUEUE_SIZE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let host = LiveHost::new(&config).context("Failed to create HTTP client")?;
    tracing::info!(base_url = host.base_url(), "Starting post office");

    let state = PostOffice::new(config.postcode_directory(), config.retry_policy());
    let mut runtime = Runtime::new(state, Arc::new(host));
    if cli.transcript {
        runtime = runtime.with_transcript();
    }

    let shutdown = ShutdownHandle::new();
    let signal_handle = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_handle.signal();
        }
    });

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open script '{}'", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (tx, rx) = mpsc::channel(INPUT_QUEUE_SIZE);
    let feeder = tokio::spawn(async move {
        let result = feed_lines(input, &tx).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to read input");
        }
        result
    });

    let outcome = runtime.run(rx, shutdown).await;
    // A drained loop means the feeder already finished.
    let input_result = if outcome.interrupted {
        feeder.abort();
        Ok(0)
    } else {
        feeder.await.context("Input task failed")?
    };

    let output = if cli.transcript {
        json!({ "state": outcome.state, "transcript": outcome.transcript })
    } else {
        serde_json::to_value(&outcome.state)?
    };
    if cli.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if outcome.interrupted {
        std::process::exit(130);
    }
    let sent = input_result.context("Failed to read input")?;
    tracing::debug!(lines = sent, "Input finished");
    Ok(())
}
