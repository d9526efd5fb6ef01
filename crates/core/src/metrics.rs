//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 싱크 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `flatstore_`
//! - 단계명: `ingest_`, `projection_`, `batch_`, `upload_`, `queue_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use flatstore_core::metrics;
//! use metrics::counter;
//!
//! counter!(metrics::INGEST_EVENTS_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 투영 기본값 대체 원인 레이블 키 (timestamp, port, base64)
pub const LABEL_KIND: &str = "kind";

/// 투영 기본값 원인: 타임스탬프 파싱 실패
pub const KIND_TIMESTAMP: &str = "timestamp";

/// 투영 기본값 원인: 포트 파싱 실패
pub const KIND_PORT: &str = "port";

/// 투영 기본값 원인: base64 디코딩 실패
pub const KIND_BASE64: &str = "base64";

// ─── Ingest 메트릭 ──────────────────────────────────────────────────

/// Ingest: 수신한 원본 메시지 수 (counter)
pub const INGEST_EVENTS_RECEIVED_TOTAL: &str = "flatstore_ingest_events_received_total";

/// Ingest: JSON 디코딩 실패 수 (counter)
pub const INGEST_DECODE_ERRORS_TOTAL: &str = "flatstore_ingest_decode_errors_total";

// ─── Projection 메트릭 ──────────────────────────────────────────────

/// Projection: 파싱 실패로 기본값이 사용된 횟수 (counter, label: kind)
pub const PROJECTION_DEFAULTS_TOTAL: &str = "flatstore_projection_defaults_total";

// ─── Batch 메트릭 ───────────────────────────────────────────────────

/// Batch: writer에 기록된 행 수 (counter)
pub const BATCH_ROWS_WRITTEN_TOTAL: &str = "flatstore_batch_rows_written_total";

/// Batch: 행 기록 실패 수 (counter)
pub const BATCH_ROW_WRITE_ERRORS_TOTAL: &str = "flatstore_batch_row_write_errors_total";

/// Batch: 회전을 유발하여 버려진 행 수 (counter)
pub const BATCH_ROWS_DROPPED_TOTAL: &str = "flatstore_batch_rows_dropped_total";

/// Batch: 회전 횟수 (counter)
pub const BATCH_ROTATIONS_TOTAL: &str = "flatstore_batch_rotations_total";

/// Batch: writer 마무리(finalize) 실패 수 (counter)
pub const BATCH_FINALIZE_FAILURES_TOTAL: &str = "flatstore_batch_finalize_failures_total";

// ─── Upload 메트릭 ──────────────────────────────────────────────────

/// Upload: 업로드된 바이트 수 (counter)
pub const UPLOAD_BYTES_TOTAL: &str = "flatstore_upload_bytes_total";

/// Upload: 업로드 실패 수 (counter)
pub const UPLOAD_FAILURES_TOTAL: &str = "flatstore_upload_failures_total";

/// Upload: 업로드 소요 시간 (histogram, 초)
pub const UPLOAD_DURATION_SECONDS: &str = "flatstore_upload_duration_seconds";

// ─── Queue 메트릭 ───────────────────────────────────────────────────

/// Queue: 현재 큐에 대기 중인 항목 수 (gauge)
pub const QUEUE_DEPTH: &str = "flatstore_queue_depth";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 업로드 소요 시간 히스토그램 버킷 (초)
///
/// 10ms ~ 120s 범위 (배치 하나가 수백 MiB까지 커질 수 있음)
pub const UPLOAD_DURATION_BUCKETS: [f64; 10] =
    [0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 120.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `flatstore-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Ingest
    describe_counter!(
        INGEST_EVENTS_RECEIVED_TOTAL,
        "Total number of raw event messages received"
    );
    describe_counter!(
        INGEST_DECODE_ERRORS_TOTAL,
        "Total number of event messages that failed JSON decoding"
    );

    // Projection
    describe_counter!(
        PROJECTION_DEFAULTS_TOTAL,
        "Field values replaced by defaults after a parse failure, by kind"
    );

    // Batch
    describe_counter!(
        BATCH_ROWS_WRITTEN_TOTAL,
        "Total number of flat rows written into the active batch"
    );
    describe_counter!(
        BATCH_ROW_WRITE_ERRORS_TOTAL,
        "Total number of flat rows the columnar writer rejected"
    );
    describe_counter!(
        BATCH_ROWS_DROPPED_TOTAL,
        "Total number of rows discarded because they triggered a rotation"
    );
    describe_counter!(BATCH_ROTATIONS_TOTAL, "Total number of batch rotations");
    describe_counter!(
        BATCH_FINALIZE_FAILURES_TOTAL,
        "Total number of batches whose writer failed to finalize"
    );

    // Upload
    describe_counter!(UPLOAD_BYTES_TOTAL, "Total bytes uploaded to blob storage");
    describe_counter!(
        UPLOAD_FAILURES_TOTAL,
        "Total number of failed batch uploads"
    );
    describe_histogram!(
        UPLOAD_DURATION_SECONDS,
        "Time to upload a single sealed batch in seconds"
    );

    // Queue
    describe_gauge!(
        QUEUE_DEPTH,
        "Current number of rows waiting in the ingest queue"
    );
}
