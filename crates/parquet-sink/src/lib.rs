#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`projector`]: 계층형 이벤트를 고정 폭 평면 행으로 투영
//! - [`row`]: 평면 행 구조체와 Arrow 스키마
//! - [`writer`]: Snappy 압축 Parquet writer와 writer 팩토리
//! - [`store`]: 블롭 스토리지 trait과 `object_store` 기반 구현
//! - [`queue`]: 생산자와 컨트롤러 사이의 유한 FIFO 큐
//! - [`controller`]: 배치 회전/봉인/업로드를 담당하는 단일 소비자
//! - [`ingest`]: 원본 JSON 메시지 디코딩 후 큐에 제출
//! - [`source`]: 표준 입력/파일 NDJSON 입력
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LineSource -> Ingestor -> EventProjector -> IngestQueue -> BatchController -> BlobStore
//!                  |                              |               |
//!            JSON decode                   bounded mpsc     ParquetRowWriter
//! ```

pub mod controller;
pub mod error;
pub mod ingest;
pub mod projector;
pub mod queue;
pub mod row;
pub mod source;
pub mod store;
pub mod writer;

// --- 주요 타입 re-export ---

// 컨트롤러
pub use controller::{BatchController, BatchSettings, ControllerStats};

// 에러
pub use error::SinkError;

// 수집
pub use ingest::{Ingested, Ingestor};
pub use queue::{IngestQueue, QueueItem, QueueReceiver, ingest_queue};
pub use source::{LineSource, PumpStats, pump_lines};

// 투영
pub use projector::EventProjector;
pub use row::FlatRow;

// 인코딩 / 저장
pub use store::{BlobStore, ObjectBlobStore};
pub use writer::{
    ColumnarWriter, ParquetRowWriter, ParquetWriterFactory, WriterFactory, WriterOptions,
};
