//! 수집 큐 -- 생산자와 배치 컨트롤러 사이의 유한 FIFO 버퍼
//!
//! 여러 생산자가 [`IngestQueue::submit`]으로 행을 넣고, 단일 소비자인
//! 배치 컨트롤러가 수신측을 소유합니다. 큐가 가득 차면 `submit`은 자리가 날 때까지
//! 대기하며, 이것이 파이프라인의 유일한 배압(backpressure) 수단입니다.
//!
//! 모든 [`IngestQueue`] 핸들이 drop되면 수신측은 남은 항목을 모두 꺼낸 뒤 `None`을
//! 반환하고, 컨트롤러는 종료합니다.

use std::time::Duration;

use metrics::gauge;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use flatstore_core::metrics as m;

use crate::error::SinkError;
use crate::row::FlatRow;

/// 큐 항목: 투영된 행과 원본 메시지 바이트 크기
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// 투영된 평면 행
    pub row: FlatRow,
    /// 원본 메시지 크기 (배치 크기 계산용)
    pub size: usize,
}

/// 수집 큐 송신 핸들
///
/// `Clone`으로 여러 생산자에게 나눠줄 수 있습니다.
#[derive(Debug, Clone)]
pub struct IngestQueue {
    tx: mpsc::Sender<QueueItem>,
}

/// 수집 큐 수신측 (배치 컨트롤러 전용)
pub type QueueReceiver = mpsc::Receiver<QueueItem>;

/// 용량 `capacity`의 수집 큐를 생성합니다.
///
/// `capacity`가 0이면 1로 보정합니다.
pub fn ingest_queue(capacity: usize) -> (IngestQueue, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (IngestQueue { tx }, rx)
}

impl IngestQueue {
    /// 행을 큐에 넣습니다. 큐가 가득 차면 자리가 날 때까지 대기합니다.
    pub async fn submit(&self, row: FlatRow, size: usize) -> Result<(), SinkError> {
        self.tx
            .send(QueueItem { row, size })
            .await
            .map_err(|_| SinkError::QueueClosed("batch controller has stopped".to_owned()))
    }

    /// 동기 컨텍스트용 `submit`. 비동기 런타임 워커 스레드에서 호출하면 panic합니다.
    pub fn blocking_submit(&self, row: FlatRow, size: usize) -> Result<(), SinkError> {
        self.tx
            .blocking_send(QueueItem { row, size })
            .map_err(|_| SinkError::QueueClosed("batch controller has stopped".to_owned()))
    }

    /// 현재 대기 중인 항목 수
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// 큐 최대 용량
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// 소비자가 종료되었는지 여부
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// 큐 길이를 주기적으로 gauge에 기록하는 태스크를 시작합니다.
///
/// `log_depth`가 true면 길이가 0이 아닐 때 로그도 남깁니다.
/// 송신 핸들을 약한 참조로만 보관하므로 큐 종료를 막지 않습니다.
pub fn spawn_depth_reporter(
    queue: &IngestQueue,
    every: Duration,
    log_depth: bool,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let weak = queue.tx.downgrade();
    let every = every.max(Duration::from_millis(100));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(tx) = weak.upgrade() else {
                        debug!("ingest queue closed, depth reporter exiting");
                        break;
                    };
                    let depth = tx.max_capacity() - tx.capacity();
                    drop(tx);

                    gauge!(m::QUEUE_DEPTH).set(depth as f64);
                    if log_depth && depth > 0 {
                        info!(depth, "ingest queue length");
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("depth reporter received shutdown signal");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn row(id: &str) -> FlatRow {
        FlatRow {
            id: id.to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn items_come_out_in_fifo_order() {
        let (queue, mut rx) = ingest_queue(8);
        for id in ["a", "b", "c"] {
            queue.submit(row(id), 10).await.unwrap();
        }
        assert_eq!(queue.depth(), 3);

        let ids: Vec<String> = [
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
            rx.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|item| item.row.id)
        .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn full_queue_blocks_submit() {
        let (queue, mut rx) = ingest_queue(2);
        queue.submit(row("1"), 1).await.unwrap();
        queue.submit(row("2"), 1).await.unwrap();

        let blocked = timeout(Duration::from_millis(50), queue.submit(row("3"), 1)).await;
        assert!(blocked.is_err(), "third submit should block at capacity");

        // 소비자가 하나 꺼내면 다시 진행됩니다.
        rx.recv().await.unwrap();
        timeout(Duration::from_millis(50), queue.submit(row("3"), 1))
            .await
            .expect("submit should proceed after a slot frees")
            .unwrap();
    }

    #[tokio::test]
    async fn submit_after_receiver_dropped_is_queue_closed() {
        let (queue, rx) = ingest_queue(2);
        drop(rx);
        assert!(queue.is_closed());
        let err = queue.submit(row("x"), 1).await.unwrap_err();
        assert!(matches!(err, SinkError::QueueClosed(_)));
    }

    #[tokio::test]
    async fn receiver_drains_then_ends_when_producers_drop() {
        let (queue, mut rx) = ingest_queue(4);
        let producer = queue.clone();
        producer.submit(row("last"), 1).await.unwrap();
        drop(producer);
        drop(queue);

        assert_eq!(rx.recv().await.unwrap().row.id, "last");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn blocking_submit_from_plain_thread() {
        let (queue, mut rx) = ingest_queue(1);
        std::thread::spawn(move || queue.blocking_submit(row("sync"), 4))
            .join()
            .unwrap()
            .unwrap();
        let item = rx.try_recv().unwrap();
        assert_eq!(item.row.id, "sync");
        assert_eq!(item.size, 4);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (queue, _rx) = ingest_queue(0);
        assert_eq!(queue.capacity(), 1);
    }

    #[tokio::test]
    async fn depth_reporter_does_not_keep_queue_open() {
        let (queue, mut rx) = ingest_queue(4);
        let cancel = CancellationToken::new();
        let reporter = spawn_depth_reporter(&queue, Duration::from_millis(100), true, cancel);

        drop(queue);
        assert!(rx.recv().await.is_none());
        timeout(Duration::from_secs(2), reporter)
            .await
            .expect("reporter should exit after the queue closes")
            .unwrap();
    }

    #[tokio::test]
    async fn depth_reporter_stops_on_cancel() {
        let (queue, _rx) = ingest_queue(4);
        let cancel = CancellationToken::new();
        let reporter =
            spawn_depth_reporter(&queue, Duration::from_secs(60), false, cancel.clone());
        cancel.cancel();
        timeout(Duration::from_secs(1), reporter)
            .await
            .expect("reporter should stop on cancel")
            .unwrap();
    }
}
