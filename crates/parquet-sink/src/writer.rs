//! 컬럼형 writer -- 평면 행을 Snappy 압축 Parquet으로 인코딩합니다.
//!
//! [`ColumnarWriter`]는 배치 컨트롤러가 사용하는 writer 추상화이고,
//! [`WriterFactory`]는 회전할 때마다 새 writer를 만드는 생성기입니다.
//! 기본 구현은 메모리 버퍼에 쓰는 [`ParquetRowWriter`]입니다.
//!
//! 행은 `encode_batch_rows`개씩 모아 하나의 `RecordBatch`로 변환된 뒤
//! `ArrowWriter`에 전달되고, 진행 중인 row group이 `row_group_bytes`에 도달하면
//! row group을 닫습니다.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::schema::types::ColumnPath;

use crate::error::SinkError;
use crate::row::{FlatRow, flat_schema, to_record_batch};

/// 기본 row group 목표 크기 (128 MiB)
pub const DEFAULT_ROW_GROUP_BYTES: usize = 128 * 1024 * 1024;

/// 기본 인코딩 단위 행 수
pub const DEFAULT_ENCODE_BATCH_ROWS: usize = 8192;

/// row group당 최대 행 수 (바이트 목표보다 먼저 닿지 않도록 크게 잡음)
const MAX_ROW_GROUP_ROWS: usize = 16 * 1024 * 1024;

/// 컬럼형 writer 추상화
///
/// 행을 하나씩 받아 버퍼링하고, `finish`에서 완성된 파일 바이트를 반환합니다.
pub trait ColumnarWriter: Send {
    /// 행 하나를 기록합니다.
    fn write_row(&mut self, row: FlatRow) -> Result<(), SinkError>;

    /// 지금까지 받은 행 수를 반환합니다.
    fn rows(&self) -> usize;

    /// writer를 닫고 완성된 파일 바이트를 반환합니다.
    fn finish(self) -> Result<Bytes, SinkError>;
}

/// 새 배치마다 writer를 생성하는 팩토리
pub trait WriterFactory: Send + Sync + 'static {
    /// 생성되는 writer 타입
    type Writer: ColumnarWriter;

    /// 비어 있는 새 writer를 생성합니다.
    fn create(&self) -> Result<Self::Writer, SinkError>;
}

/// Parquet writer 옵션
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// row group 목표 크기 (바이트)
    pub row_group_bytes: usize,
    /// 한 번에 RecordBatch로 변환할 행 수
    pub encode_batch_rows: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            row_group_bytes: DEFAULT_ROW_GROUP_BYTES,
            encode_batch_rows: DEFAULT_ENCODE_BATCH_ROWS,
        }
    }
}

fn writer_properties() -> WriterProperties {
    let mut builder = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(true)
        .set_max_row_group_size(MAX_ROW_GROUP_ROWS)
        .set_created_by(format!("flatstore {}", env!("CARGO_PKG_VERSION")));
    for (name, kind) in FlatRow::COLUMNS {
        if !kind.is_dictionary_encoded() {
            builder = builder.set_column_dictionary_enabled(ColumnPath::from(*name), false);
        }
    }
    builder.build()
}

/// 평면 행 Parquet writer
///
/// `W`는 메모리 버퍼(`Vec<u8>`, 배치 업로드용) 또는 파일(로컬 변환용)입니다.
pub struct ParquetRowWriter<W: Write + Send = Vec<u8>> {
    inner: ArrowWriter<W>,
    pending: Vec<FlatRow>,
    options: WriterOptions,
    rows: usize,
}

impl ParquetRowWriter<Vec<u8>> {
    /// 메모리 버퍼에 쓰는 writer를 생성합니다.
    pub fn in_memory(options: WriterOptions) -> Result<Self, SinkError> {
        Self::try_new(Vec::new(), options)
    }
}

impl ParquetRowWriter<File> {
    /// 로컬 파일에 쓰는 writer를 생성합니다. 파일이 있으면 덮어씁니다.
    pub fn to_file(path: impl AsRef<Path>, options: WriterOptions) -> Result<Self, SinkError> {
        let file = File::create(path.as_ref())?;
        Self::try_new(file, options)
    }
}

impl<W: Write + Send> ParquetRowWriter<W> {
    /// 임의의 출력 대상으로 writer를 생성합니다.
    pub fn try_new(sink: W, options: WriterOptions) -> Result<Self, SinkError> {
        let inner = ArrowWriter::try_new(sink, flat_schema(), Some(writer_properties()))?;
        Ok(Self {
            inner,
            pending: Vec::with_capacity(options.encode_batch_rows.max(1)),
            options,
            rows: 0,
        })
    }

    /// 행 하나를 버퍼에 추가하고, 버퍼가 차면 인코딩합니다.
    pub fn write_row(&mut self, row: FlatRow) -> Result<(), SinkError> {
        self.pending.push(row);
        self.rows += 1;
        if self.pending.len() >= self.options.encode_batch_rows.max(1) {
            self.encode_pending()?;
        }
        Ok(())
    }

    /// 기록된 행 수
    pub fn rows(&self) -> usize {
        self.rows
    }

    fn encode_pending(&mut self) -> Result<(), SinkError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // 변환에 실패해도 같은 행을 다시 시도하지 않도록 먼저 비웁니다.
        let rows = std::mem::take(&mut self.pending);
        let batch = to_record_batch(&rows)?;
        self.inner.write(&batch)?;
        if self.inner.in_progress_size() >= self.options.row_group_bytes {
            self.inner.flush()?;
        }
        Ok(())
    }

    /// 남은 행을 인코딩하고 footer를 기록한 뒤 출력 대상을 돌려줍니다.
    pub fn close(mut self) -> Result<W, SinkError> {
        self.encode_pending()?;
        Ok(self.inner.into_inner()?)
    }
}

impl ColumnarWriter for ParquetRowWriter<Vec<u8>> {
    fn write_row(&mut self, row: FlatRow) -> Result<(), SinkError> {
        ParquetRowWriter::write_row(self, row)
    }

    fn rows(&self) -> usize {
        ParquetRowWriter::rows(self)
    }

    fn finish(self) -> Result<Bytes, SinkError> {
        self.close().map(Bytes::from)
    }
}

/// 메모리 버퍼 Parquet writer 팩토리
#[derive(Debug, Clone, Default)]
pub struct ParquetWriterFactory {
    options: WriterOptions,
}

impl ParquetWriterFactory {
    /// 주어진 옵션으로 팩토리를 생성합니다.
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }
}

impl WriterFactory for ParquetWriterFactory {
    type Writer = ParquetRowWriter<Vec<u8>>;

    fn create(&self) -> Result<Self::Writer, SinkError> {
        ParquetRowWriter::in_memory(self.options.clone())
    }
}
