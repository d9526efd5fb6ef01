//! 배치 컨트롤러 -- 수집 큐의 단일 소비자
//!
//! 컨트롤러는 활성 writer, 누적 바이트, 항목 수, 마지막 회전 시각을 단독으로 소유합니다.
//! 상태를 공유하지 않으므로 잠금이 없습니다.
//!
//! # 상태 전이
//! ```text
//! Accumulating --(bytes > max_batch || age > max_time)--> Rotating --> Accumulating
//! ```
//!
//! 회전 판정은 항목을 꺼낸 직후, 기록하기 전에 합니다. 회전을 일으킨 항목은
//! 새 배치에 기록되지 않고 버려지며 `flatstore_batch_rows_dropped_total`로 집계됩니다.
//!
//! 타이머 기반 회전은 없습니다. 유휴 배치는 다음 항목이 도착할 때까지 열려 있습니다.

use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use flatstore_core::config::{BatchConfig, StorageConfig};
use flatstore_core::metrics as m;

use crate::error::SinkError;
use crate::queue::{QueueItem, QueueReceiver};
use crate::store::BlobStore;
use crate::writer::{ColumnarWriter, WriterFactory};

/// 회전 임계값과 업로드 경로 설정
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// 누적 원본 바이트가 이 값을 넘으면 회전
    pub max_batch_bytes: u64,
    /// 마지막 회전 후 이 시간이 지나면 회전
    pub max_age: Duration,
    /// 업로드 경로 접두어
    pub basedir: String,
    /// 큐가 닫힐 때 열린 배치를 업로드할지 여부
    pub flush_on_shutdown: bool,
}

impl BatchSettings {
    /// 설정 섹션에서 컨트롤러 설정을 만듭니다.
    pub fn from_config(batch: &BatchConfig, storage: &StorageConfig) -> Self {
        Self {
            max_batch_bytes: batch.max_batch.bytes(),
            max_age: Duration::try_from_secs_f64(batch.max_time_secs)
                .unwrap_or(Duration::from_secs(1800)),
            basedir: storage.basedir.clone(),
            flush_on_shutdown: batch.flush_on_shutdown,
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::from_config(&BatchConfig::default(), &StorageConfig::default())
    }
}

/// 컨트롤러 실행 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerStats {
    /// writer에 기록된 행 수
    pub rows_written: u64,
    /// writer가 거부한 행 수
    pub write_errors: u64,
    /// 회전을 일으켜 버려진 행 수
    pub rows_dropped: u64,
    /// 회전 횟수
    pub rotations: u64,
    /// 업로드에 성공한 배치 수
    pub batches_uploaded: u64,
    /// 업로드 또는 마무리에 실패한 배치 수
    pub batches_failed: u64,
}

/// 업로드 경로: `<basedir>/<YYYY-MM-DD>/<HH-MM>/<id>.parquet` (UTC)
pub fn batch_path(basedir: &str, now: DateTime<Utc>, id: Uuid) -> String {
    format!(
        "{}/{}/{}.parquet",
        basedir.trim_end_matches('/'),
        now.format("%Y-%m-%d/%H-%M"),
        id
    )
}

/// 배치 컨트롤러
pub struct BatchController<F: WriterFactory, S: BlobStore> {
    settings: BatchSettings,
    factory: F,
    store: S,
    writer: F::Writer,
    bytes: u64,
    items: u64,
    last_rotation: Instant,
    stats: ControllerStats,
}

impl<F: WriterFactory, S: BlobStore> BatchController<F, S> {
    /// 첫 배치 writer를 열고 컨트롤러를 생성합니다.
    ///
    /// writer를 열 수 없으면 시작 실패로 에러를 반환합니다.
    pub fn new(settings: BatchSettings, factory: F, store: S) -> Result<Self, SinkError> {
        let writer = factory.create()?;
        Ok(Self {
            settings,
            factory,
            store,
            writer,
            bytes: 0,
            items: 0,
            last_rotation: Instant::now(),
            stats: ControllerStats::default(),
        })
    }

    /// 현재 배치의 누적 원본 바이트
    pub fn batch_bytes(&self) -> u64 {
        self.bytes
    }

    /// 현재 배치의 항목 수
    pub fn batch_items(&self) -> u64 {
        self.items
    }

    /// 지금까지의 실행 통계
    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    fn should_rotate(&self) -> bool {
        self.bytes > self.settings.max_batch_bytes
            || self.last_rotation.elapsed() > self.settings.max_age
    }

    /// 큐 항목 하나를 처리합니다.
    pub async fn handle(&mut self, item: QueueItem) {
        if self.should_rotate() {
            self.stats.rows_dropped += 1;
            counter!(m::BATCH_ROWS_DROPPED_TOTAL).increment(1);
            debug!(
                id = item.row.id.as_str(),
                size = item.size,
                "row triggered rotation and is discarded"
            );
            self.rotate().await;
            return;
        }

        self.bytes = self.bytes.saturating_add(item.size as u64);
        self.items += 1;

        match self.writer.write_row(item.row) {
            Ok(()) => {
                self.stats.rows_written += 1;
                counter!(m::BATCH_ROWS_WRITTEN_TOTAL).increment(1);
            }
            Err(e) => {
                self.stats.write_errors += 1;
                counter!(m::BATCH_ROW_WRITE_ERRORS_TOTAL).increment(1);
                warn!(error = %e, "failed to write row to columnar writer");
            }
        }
    }

    /// 활성 배치를 봉인하고 업로드한 뒤 새 배치를 시작합니다.
    ///
    /// 새 writer를 열 수 없으면 현재 배치를 유지하고 다음 항목에서 다시 시도합니다.
    /// 항목이 없는 배치도 봉인하여 행이 없는 파일로 업로드합니다.
    pub async fn rotate(&mut self) {
        let next = match self.factory.create() {
            Ok(writer) => writer,
            Err(e) => {
                error!(error = %e, "failed to open a new batch writer, keeping current batch");
                return;
            }
        };

        let sealed = std::mem::replace(&mut self.writer, next);
        let items = self.items;
        let source_bytes = self.bytes;
        self.items = 0;
        self.bytes = 0;
        self.last_rotation = Instant::now();
        self.stats.rotations += 1;
        counter!(m::BATCH_ROTATIONS_TOTAL).increment(1);

        if items == 0 {
            debug!("rotating empty batch, uploading a file with no rows");
        }

        let data = match sealed.finish() {
            Ok(data) => data,
            Err(e) => {
                self.stats.batches_failed += 1;
                counter!(m::BATCH_FINALIZE_FAILURES_TOTAL).increment(1);
                error!(error = %e, items, "failed to finalize batch, discarding it");
                return;
            }
        };

        let path = batch_path(&self.settings.basedir, Utc::now(), Uuid::new_v4());
        let size = data.len();
        let started = std::time::Instant::now();
        let result = self.store.put(&path, data).await;
        histogram!(m::UPLOAD_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                self.stats.batches_uploaded += 1;
                counter!(m::UPLOAD_BYTES_TOTAL).increment(size as u64);
                info!(
                    path = path.as_str(),
                    items,
                    source_bytes,
                    size,
                    "batch uploaded"
                );
            }
            Err(e) => {
                self.stats.batches_failed += 1;
                counter!(m::UPLOAD_FAILURES_TOTAL).increment(1);
                error!(error = %e, path = path.as_str(), items, "batch upload failed");
            }
        }
    }

    /// 큐가 닫힐 때까지 항목을 처리합니다.
    ///
    /// `flush_on_shutdown`이 켜져 있으면 마지막으로 열린 배치를 업로드합니다.
    pub async fn run(mut self, mut rx: QueueReceiver) -> ControllerStats {
        info!(
            max_batch_bytes = self.settings.max_batch_bytes,
            max_age_secs = self.settings.max_age.as_secs_f64(),
            basedir = self.settings.basedir.as_str(),
            "batch controller started"
        );

        while let Some(item) = rx.recv().await {
            self.handle(item).await;
        }

        if self.items > 0 {
            if self.settings.flush_on_shutdown {
                info!(items = self.items, "flushing open batch on shutdown");
                self.rotate().await;
            } else {
                warn!(
                    items = self.items,
                    bytes = self.bytes,
                    "ingest queue closed, open batch is discarded"
                );
            }
        }

        info!(
            rows_written = self.stats.rows_written,
            batches_uploaded = self.stats.batches_uploaded,
            "batch controller stopped"
        );
        self.stats
    }

    /// 컨트롤러를 tokio 태스크로 실행합니다.
    pub fn spawn(self, rx: QueueReceiver) -> JoinHandle<ControllerStats>
    where
        F::Writer: 'static,
    {
        tokio::spawn(self.run(rx))
    }
}
