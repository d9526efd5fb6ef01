//! 줄 단위 JSON 입력 소스
//!
//! 표준 입력 또는 파일에서 한 줄에 이벤트 하나씩(NDJSON) 읽어
//! [`Ingestor`]에 넘깁니다. 빈 줄은 건너뛰며, 취소 토큰으로 중단할 수 있습니다.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::SinkError;
use crate::ingest::{Ingested, Ingestor};

/// 입력 소스 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    /// 표준 입력
    Stdin,
    /// 파일 경로
    File(PathBuf),
}

impl LineSource {
    /// `-`는 표준 입력, 그 외는 파일 경로로 해석합니다.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("-") => Self::Stdin,
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }

    /// 소스를 열어 버퍼 리더를 반환합니다.
    pub async fn open(&self) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, SinkError> {
        match self {
            Self::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
            Self::File(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// 로그용 설명
    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_owned(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// 입력 처리 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// 읽은 비어 있지 않은 줄 수
    pub lines: u64,
    /// 큐에 들어간 이벤트 수
    pub queued: u64,
    /// 디코딩 실패로 건너뛴 줄 수
    pub skipped: u64,
}

/// 리더가 끝나거나 취소될 때까지 줄을 읽어 수집기에 넘깁니다.
///
/// 줄은 바이트 그대로 넘기므로 UTF-8이 아닌 줄은 디코딩 실패로 건너뛰고
/// 다음 줄을 계속 읽습니다.
pub async fn pump_lines<R>(
    mut reader: R,
    ingestor: &Ingestor,
    cancel: &CancellationToken,
) -> Result<PumpStats, SinkError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut stats = PumpStats::default();

    loop {
        buf.clear();
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => {
                if read? == 0 {
                    debug!("input reached end of stream");
                    break;
                }
                let line = trim_line_end(&buf);
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                stats.lines += 1;
                match ingestor.handle(line).await? {
                    Ingested::Queued => stats.queued += 1,
                    Ingested::Skipped => stats.skipped += 1,
                }
            }
            _ = cancel.cancelled() => {
                info!("input pump received shutdown signal");
                break;
            }
        }
    }

    Ok(stats)
}

/// 줄 끝의 `\n`과 `\r\n`을 떼어냅니다.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
