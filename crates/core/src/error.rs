//! 에러 타입 -- 도메인별 에러 정의

/// Flatstore 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FlatstoreError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 큐 전송 실패 (소비자 종료)
    #[error("queue send failed: {0}")]
    QueueClosed(String),

    /// 컬럼형 writer 에러
    #[error("columnar writer error: {0}")]
    Writer(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 스토리지 클라이언트 생성 실패
    #[error("storage client init failed: {0}")]
    Init(String),

    /// 업로드 실패
    #[error("upload failed: {path}: {reason}")]
    Upload { path: String, reason: String },
}
