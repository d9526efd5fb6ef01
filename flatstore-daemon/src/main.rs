use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use flatstore_core::config::FlatstoreConfig;
use flatstore_daemon::cli::DaemonCli;
use flatstore_daemon::logging;
use flatstore_daemon::orchestrator::{self, Orchestrator};
use flatstore_parquet_sink::LineSource;

/// Grace period for blocking reader threads after the pipeline finishes.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));

    // stdin 읽기는 블로킹 스레드에서 돌아가므로 취소 후에도 남아 있을 수 있습니다.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run(cli: DaemonCli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => FlatstoreConfig::load(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => FlatstoreConfig::from_env()
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
    };
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "flatstore-daemon starting");

    let cancel = CancellationToken::new();
    let signal_task = orchestrator::spawn_signal_watcher(cancel.clone());

    let source = LineSource::from_arg(Some(cli.input.as_str()));
    let reader = source
        .open()
        .await
        .map_err(|e| anyhow::anyhow!("failed to open input {}: {}", source.describe(), e))?;
    tracing::info!(input = source.describe().as_str(), "reading events");

    let outcome = match &cli.output_file {
        Some(path) => orchestrator::convert_to_file(
            reader,
            path,
            config.storage.include_payloads(),
            config.batch.queue_capacity,
            &cancel,
        )
        .await
        .map(|_| ()),
        None => {
            let orchestrator = Orchestrator::build_from_config(config)?;
            orchestrator.run(reader, cancel.clone()).await.map(|summary| {
                tracing::info!(
                    lines = summary.pump.lines,
                    skipped = summary.pump.skipped,
                    rows_written = summary.controller.rows_written,
                    rows_dropped = summary.controller.rows_dropped,
                    batches_uploaded = summary.controller.batches_uploaded,
                    batches_failed = summary.controller.batches_failed,
                    "pipeline finished"
                );
            })
        }
    };

    cancel.cancel();
    if let Err(e) = signal_task.await {
        tracing::warn!(error = %e, "signal watcher task failed");
    }

    tracing::info!("flatstore-daemon shut down");
    outcome
}
