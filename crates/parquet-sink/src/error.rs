//! 싱크 에러 타입
//!
//! [`SinkError`]는 컬럼형 writer, 오브젝트 스토리지, 수집 큐에서 발생하는 에러를
//! 표현합니다. `From<SinkError> for FlatstoreError` 변환이 구현되어 있어 데몬에서
//! `?` 연산자로 전파할 수 있습니다.

use flatstore_core::error::{FlatstoreError, PipelineError, StorageError};

/// 싱크 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 컬럼형 writer 에러 (행 변환, Parquet 인코딩, 마무리)
    #[error("writer error: {0}")]
    Writer(String),

    /// 스토리지 클라이언트 초기화 실패
    #[error("storage init error: {platform}: {reason}")]
    StorageInit {
        /// 플랫폼 이름 (gcp, aws, local, memory)
        platform: String,
        /// 실패 사유
        reason: String,
    },

    /// 업로드 실패
    #[error("upload error: {path}: {reason}")]
    Upload {
        /// 대상 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 큐 소비자가 종료됨
    #[error("queue closed: {0}")]
    QueueClosed(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<parquet::errors::ParquetError> for SinkError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        SinkError::Writer(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for SinkError {
    fn from(err: arrow::error::ArrowError) -> Self {
        SinkError::Writer(err.to_string())
    }
}

impl From<SinkError> for FlatstoreError {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::Writer(reason) => FlatstoreError::Pipeline(PipelineError::Writer(reason)),
            SinkError::QueueClosed(reason) => {
                FlatstoreError::Pipeline(PipelineError::QueueClosed(reason))
            }
            SinkError::StorageInit { platform, reason } => {
                FlatstoreError::Storage(StorageError::Init(format!("{platform}: {reason}")))
            }
            SinkError::Upload { path, reason } => {
                FlatstoreError::Storage(StorageError::Upload { path, reason })
            }
            SinkError::Io(e) => FlatstoreError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_display() {
        let err = SinkError::Upload {
            path: "parquet/2024-01-01/00-00/x.parquet".to_owned(),
            reason: "403".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("x.parquet"));
        assert!(msg.contains("403"));
    }

    #[test]
    fn writer_error_converts_to_pipeline_error() {
        let err: FlatstoreError = SinkError::Writer("bad batch".to_owned()).into();
        assert!(matches!(
            err,
            FlatstoreError::Pipeline(PipelineError::Writer(_))
        ));
    }

    #[test]
    fn storage_init_converts_to_storage_error() {
        let err: FlatstoreError = SinkError::StorageInit {
            platform: "gcp".to_owned(),
            reason: "no credentials".to_owned(),
        }
        .into();
        assert!(matches!(err, FlatstoreError::Storage(StorageError::Init(_))));
        assert!(err.to_string().contains("gcp"));
    }

    #[test]
    fn parquet_error_becomes_writer_error() {
        let err: SinkError = parquet::errors::ParquetError::General("boom".to_owned()).into();
        assert!(matches!(err, SinkError::Writer(_)));
    }
}
