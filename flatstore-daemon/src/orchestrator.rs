//! Pipeline orchestration -- assembly, task wiring, and shutdown ordering.
//!
//! The [`Orchestrator`] owns the validated configuration and the blob store
//! client. [`Orchestrator::run`] wires the ingest path:
//!
//! ```text
//! reader -> pump_lines -> Ingestor -> IngestQueue -> BatchController -> ObjectBlobStore
//! ```
//!
//! # Shutdown Order
//!
//! 1. Input pump stops (end of input or cancellation)
//! 2. The last ingest handle is dropped, closing the queue
//! 3. Batch controller drains the queue and exits
//! 4. Depth reporter is cancelled

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;

use flatstore_core::config::FlatstoreConfig;
use flatstore_parquet_sink::queue::spawn_depth_reporter;
use flatstore_parquet_sink::{
    BatchController, BatchSettings, ControllerStats, Ingestor, ObjectBlobStore,
    ParquetRowWriter, ParquetWriterFactory, PumpStats, WriterOptions, ingest_queue, pump_lines,
};

use crate::metrics_server;

/// Depth gauge refresh interval when queue logging is disabled.
const DEPTH_GAUGE_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Input pump statistics.
    pub pump: PumpStats,
    /// Batch controller statistics.
    pub controller: ControllerStats,
}

/// The main daemon orchestrator.
pub struct Orchestrator {
    config: FlatstoreConfig,
    store: ObjectBlobStore,
}

impl Orchestrator {
    /// Build from an already-loaded configuration.
    ///
    /// Validates the configuration, installs the metrics recorder when enabled,
    /// and creates the blob store client for `storage.platform`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the storage client cannot be created.
    pub fn build_from_config(config: FlatstoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let store = ObjectBlobStore::from_config(&config.storage)
            .map_err(|e| anyhow::anyhow!("failed to create storage client: {}", e))?;

        Ok(Self { config, store })
    }

    /// Build with an explicit blob store, ignoring `storage.platform`.
    pub fn with_store(config: FlatstoreConfig, store: ObjectBlobStore) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        Ok(Self { config, store })
    }

    /// The validated configuration.
    pub fn config(&self) -> &FlatstoreConfig {
        &self.config
    }

    /// Run the pipeline until `reader` ends or `cancel` fires.
    pub async fn run<R>(self, reader: R, cancel: CancellationToken) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let settings = BatchSettings::from_config(&self.config.batch, &self.config.storage);
        let include_payloads = self.config.storage.include_payloads();

        let (queue, rx) = ingest_queue(self.config.batch.queue_capacity);
        let controller = BatchController::new(settings, ParquetWriterFactory::default(), self.store)
            .map_err(|e| anyhow::anyhow!("failed to create batch writer: {}", e))?;
        let controller_task = controller.spawn(rx);

        let reporter_cancel = cancel.child_token();
        let report_secs = self.config.batch.queue_report_secs;
        let reporter_task = spawn_depth_reporter(
            &queue,
            if report_secs > 0 {
                Duration::from_secs(report_secs)
            } else {
                DEPTH_GAUGE_INTERVAL
            },
            report_secs > 0,
            reporter_cancel.clone(),
        );

        tracing::info!(
            platform = self.config.storage.platform.as_str(),
            include_payloads,
            queue_capacity = self.config.batch.queue_capacity,
            "pipeline started"
        );

        let ingestor = Ingestor::new(queue, include_payloads);
        let pumped = pump_lines(reader, &ingestor, &cancel).await;

        // 마지막 송신 핸들을 닫아야 컨트롤러가 큐를 비우고 종료합니다.
        drop(ingestor);
        let controller = controller_task
            .await
            .map_err(|e| anyhow::anyhow!("batch controller task failed: {}", e))?;

        reporter_cancel.cancel();
        if let Err(e) = reporter_task.await {
            tracing::warn!(error = %e, "depth reporter task failed");
        }

        let pump = pumped.map_err(|e| anyhow::anyhow!("input failed: {}", e))?;
        Ok(RunSummary { pump, controller })
    }
}

/// Convert an input stream into a single local Parquet file.
///
/// Rows pass through the ingest queue to a writer task. There is no size or
/// age rotation; the file is closed when the input ends or `cancel` fires.
/// Returns the number of rows written.
pub async fn convert_to_file<R>(
    reader: R,
    path: &Path,
    include_payloads: bool,
    queue_capacity: usize,
    cancel: &CancellationToken,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut writer = ParquetRowWriter::to_file(path, WriterOptions::default())
        .map_err(|e| anyhow::anyhow!("failed to create '{}': {}", path.display(), e))?;

    let (queue, mut rx) = ingest_queue(queue_capacity);
    let writer_task = tokio::spawn(async move {
        let mut rows = 0u64;
        while let Some(item) = rx.recv().await {
            match writer.write_row(item.row) {
                Ok(()) => rows += 1,
                Err(e) => tracing::warn!(error = %e, "failed to write row to file"),
            }
        }
        writer.close().map(|_| rows)
    });

    let ingestor = Ingestor::new(queue, include_payloads);
    let pumped = pump_lines(reader, &ingestor, cancel).await;
    drop(ingestor);

    let rows = writer_task
        .await
        .map_err(|e| anyhow::anyhow!("file writer task failed: {}", e))?
        .map_err(|e| anyhow::anyhow!("failed to finalize '{}': {}", path.display(), e))?;
    let pump = pumped.map_err(|e| anyhow::anyhow!("input failed: {}", e))?;

    tracing::info!(
        path = %path.display(),
        rows,
        skipped = pump.skipped,
        "parquet file written"
    );
    Ok(rows)
}

/// Wait for SIGTERM or SIGINT.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl+C.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to listen for Ctrl+C: {}", e))?;
    Ok("CTRL_C")
}

/// Cancel `cancel` when a shutdown signal arrives.
pub fn spawn_signal_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = wait_for_shutdown_signal() => match result {
                Ok(signal) => tracing::info!(signal, "shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "signal handler failed, shutting down"),
            },
            _ = cancel.cancelled() => return,
        }
        cancel.cancel();
    })
}
