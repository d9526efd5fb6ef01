//! 이벤트 수집기 -- 원본 JSON 메시지를 투영해 수집 큐에 넣습니다.
//!
//! 디코딩에 실패한 메시지는 로그를 남기고 건너뜁니다. 큐에 넣을 때는
//! 원본 메시지 길이를 배치 크기 계산용으로 함께 전달합니다.

use metrics::counter;
use tracing::warn;

use flatstore_core::event::Event;
use flatstore_core::metrics as m;

use crate::error::SinkError;
use crate::projector::EventProjector;
use crate::queue::IngestQueue;

/// 원본 메시지 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// 투영되어 큐에 들어감
    Queued,
    /// 디코딩 실패로 건너뜀
    Skipped,
}

/// 이벤트 수집기
///
/// 생산자마다 복제해서 사용할 수 있습니다.
#[derive(Debug, Clone)]
pub struct Ingestor {
    projector: EventProjector,
    queue: IngestQueue,
}

impl Ingestor {
    /// 새 수집기를 생성합니다.
    pub fn new(queue: IngestQueue, include_payloads: bool) -> Self {
        Self {
            projector: EventProjector::new(include_payloads),
            queue,
        }
    }

    /// 원본 메시지 하나를 처리합니다.
    ///
    /// 큐가 닫혀 있을 때만 에러를 반환합니다.
    pub async fn handle(&self, msg: &[u8]) -> Result<Ingested, SinkError> {
        counter!(m::INGEST_EVENTS_RECEIVED_TOTAL).increment(1);

        let event: Event = match serde_json::from_slice(msg) {
            Ok(event) => event,
            Err(e) => {
                counter!(m::INGEST_DECODE_ERRORS_TOTAL).increment(1);
                warn!(error = %e, len = msg.len(), "couldn't decode event, skipping");
                return Ok(Ingested::Skipped);
            }
        };

        let row = self.projector.project(&event);
        self.queue.submit(row, msg.len()).await?;
        Ok(Ingested::Queued)
    }

    /// 내부 큐 핸들
    pub fn queue(&self) -> &IngestQueue {
        &self.queue
    }
}
