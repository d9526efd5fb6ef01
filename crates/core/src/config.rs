//! 설정 관리 -- flatstore.toml 파싱 및 런타임 설정
//!
//! [`FlatstoreConfig`]는 데몬과 싱크 크레이트가 사용하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수
//! 3. 설정 파일 (`flatstore.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! # 환경변수
//! 배치/스토리지 설정은 접두어 없는 이름을 사용합니다.
//!
//! | 환경변수 | 필드 |
//! |---|---|
//! | `MAX_BATCH` | `batch.max_batch` (`256M`, `512K` 등 접미어 허용) |
//! | `MAX_TIME` | `batch.max_time_secs` |
//! | `PLATFORM` | `storage.platform` |
//! | `STORAGE_BUCKET` | `storage.bucket` |
//! | `STORAGE_PROJECT` | `storage.project` |
//! | `STORAGE_BASEDIR` | `storage.basedir` |
//! | `STRIP_PAYLOAD` | `storage.strip_payload` |
//!
//! 나머지 필드는 `FLATSTORE_{SECTION}_{FIELD}` 형식을 따릅니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), flatstore_core::error::FlatstoreError> {
//! use flatstore_core::config::FlatstoreConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FlatstoreConfig::load("flatstore.toml").await?;
//!
//! // 파일 없이 기본값 + 환경변수
//! let config = FlatstoreConfig::from_env()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FlatstoreError};

/// 기본 최대 배치 크기 (256 MiB)
pub const DEFAULT_MAX_BATCH_BYTES: u64 = 256 * 1024 * 1024;

/// 기본 최대 배치 수명 (30분)
pub const DEFAULT_MAX_TIME_SECS: f64 = 1800.0;

/// 기본 수집 큐 용량
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// 지원하는 스토리지 플랫폼
pub const PLATFORMS: [&str; 4] = ["local", "memory", "gcp", "aws"];

/// Flatstore 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatstoreConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 배치 회전 설정
    #[serde(default)]
    pub batch: BatchConfig,
    /// 스토리지 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FlatstoreConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FlatstoreError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlatstoreError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FlatstoreError::Io(e)
            }
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일 없이 기본값에 환경변수만 적용합니다.
    pub fn from_env() -> Result<Self, FlatstoreError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FlatstoreError> {
        toml::from_str(toml_str).map_err(|e| {
            FlatstoreError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FLATSTORE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FLATSTORE_GENERAL_LOG_FORMAT");

        // Batch
        if let Ok(val) = std::env::var("MAX_BATCH") {
            self.batch.max_batch = match parse_max_batch(&val) {
                Some(bytes) => ByteSize(bytes),
                None => {
                    warn!(
                        value = val.as_str(),
                        default = DEFAULT_MAX_BATCH_BYTES,
                        "couldn't parse MAX_BATCH, using default"
                    );
                    ByteSize(DEFAULT_MAX_BATCH_BYTES)
                }
            };
        }
        if let Ok(val) = std::env::var("MAX_TIME") {
            self.batch.max_time_secs = match parse_max_time(&val) {
                Some(secs) => secs,
                None => {
                    warn!(
                        value = val.as_str(),
                        default = DEFAULT_MAX_TIME_SECS,
                        "couldn't parse MAX_TIME, using default"
                    );
                    DEFAULT_MAX_TIME_SECS
                }
            };
        }
        override_usize(
            &mut self.batch.queue_capacity,
            "FLATSTORE_BATCH_QUEUE_CAPACITY",
        );
        override_bool(
            &mut self.batch.flush_on_shutdown,
            "FLATSTORE_BATCH_FLUSH_ON_SHUTDOWN",
        );
        override_u64(
            &mut self.batch.queue_report_secs,
            "FLATSTORE_BATCH_QUEUE_REPORT_SECS",
        );

        // Storage
        override_string(&mut self.storage.platform, "PLATFORM");
        override_string(&mut self.storage.bucket, "STORAGE_BUCKET");
        override_string(&mut self.storage.project, "STORAGE_PROJECT");
        override_string(&mut self.storage.basedir, "STORAGE_BASEDIR");
        override_bool(&mut self.storage.strip_payload, "STRIP_PAYLOAD");

        // Metrics
        override_bool(&mut self.metrics.enabled, "FLATSTORE_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "FLATSTORE_METRICS_LISTEN_ADDR",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FlatstoreError> {
        const MAX_QUEUE_CAPACITY: usize = 1_000_000;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.batch.max_batch.bytes() == 0 {
            return Err(invalid("batch.max_batch", "must be greater than 0"));
        }

        if !self.batch.max_time_secs.is_finite() || self.batch.max_time_secs <= 0.0 {
            return Err(invalid(
                "batch.max_time_secs",
                "must be a finite number greater than 0",
            ));
        }

        if self.batch.queue_capacity == 0 || self.batch.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(invalid(
                "batch.queue_capacity",
                format!("must be 1-{}", MAX_QUEUE_CAPACITY),
            ));
        }

        if !PLATFORMS.contains(&self.storage.platform.as_str()) {
            return Err(invalid(
                "storage.platform",
                format!("must be one of: {}", PLATFORMS.join(", ")),
            ));
        }

        if matches!(self.storage.platform.as_str(), "gcp" | "aws") && self.storage.bucket.is_empty()
        {
            return Err(invalid(
                "storage.bucket",
                format!(
                    "bucket must not be empty for platform '{}'",
                    self.storage.platform
                ),
            ));
        }

        if self.storage.basedir.trim_matches('/').is_empty() {
            return Err(invalid("storage.basedir", "must not be empty"));
        }

        if self.metrics.enabled && self.metrics.listen_addr.is_empty() {
            return Err(invalid(
                "metrics.listen_addr",
                "listen address must not be empty when metrics are enabled",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> FlatstoreError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 배치 회전 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 누적 원본 메시지 바이트가 이 값을 넘으면 회전
    pub max_batch: ByteSize,
    /// 마지막 회전 후 이 시간(초)이 지나면 회전
    pub max_time_secs: f64,
    /// 수집 큐 용량 (가득 차면 제출자가 대기)
    pub queue_capacity: usize,
    /// 모든 생산자가 종료되면 열린 배치를 마지막으로 업로드할지 여부
    pub flush_on_shutdown: bool,
    /// 큐 길이 보고 주기 (초, 0이면 비활성화)
    pub queue_report_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch: ByteSize(DEFAULT_MAX_BATCH_BYTES),
            max_time_secs: DEFAULT_MAX_TIME_SECS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_on_shutdown: false,
            queue_report_secs: 0,
        }
    }
}

/// 스토리지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 백엔드 플랫폼 (local, memory, gcp, aws)
    pub platform: String,
    /// 버킷 이름 (local 플랫폼에서는 루트 디렉토리)
    pub bucket: String,
    /// 클라우드 프로젝트 ID
    pub project: String,
    /// 업로드 경로 접두어
    pub basedir: String,
    /// 페이로드 필드(HTTP 본문, ICMP/미인식 페이로드)를 비울지 여부
    pub strip_payload: bool,
}

impl StorageConfig {
    /// 투영 시 페이로드를 포함할지 여부를 반환합니다.
    pub fn include_payloads(&self) -> bool {
        !self.strip_payload
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            platform: "local".to_owned(),
            bucket: "/var/lib/flatstore".to_owned(),
            project: String::new(),
            basedir: "parquet".to_owned(),
            strip_payload: true,
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1:9100".to_owned(),
        }
    }
}

/// 바이트 크기
///
/// TOML에서는 정수(`268435456`) 또는 접미어 문자열(`"256M"`, `"512K"`)로 지정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawByteSize", into = "u64")]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// 바이트 값을 반환합니다.
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ByteSize> for u64 {
    fn from(size: ByteSize) -> Self {
        size.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawByteSize {
    Bytes(u64),
    Text(String),
}

impl TryFrom<RawByteSize> for ByteSize {
    type Error = String;

    fn try_from(raw: RawByteSize) -> Result<Self, Self::Error> {
        match raw {
            RawByteSize::Bytes(n) => Ok(ByteSize(n)),
            RawByteSize::Text(s) => parse_max_batch(&s)
                .map(ByteSize)
                .ok_or_else(|| format!("invalid byte size '{}'", s)),
        }
    }
}

/// `MAX_BATCH` 값을 바이트 수로 변환합니다.
///
/// 따옴표와 공백은 제거하고, 대소문자 무관하게 `M`이 있으면 MiB, 그렇지 않고 `K`가
/// 있으면 KiB 단위로 해석합니다. 숫자가 아니거나 곱셈이 넘치면 `None`입니다.
pub fn parse_max_batch(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '"' && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let (digits, multiplier) = if cleaned.contains('M') {
        (cleaned.replace('M', ""), 1024 * 1024)
    } else if cleaned.contains('K') {
        (cleaned.replace('K', ""), 1024)
    } else {
        (cleaned, 1)
    };

    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

/// `MAX_TIME` 값을 초 단위 실수로 변환합니다.
pub fn parse_max_time(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '"' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
