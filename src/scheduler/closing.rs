/// 경매 종료 스케줄러
/// 1. 시작 시간이 된 PENDING 상품을 ACTIVE 로 전환
/// 2. 종료 시간이 지난 ACTIVE 상품을 종료하고 낙찰자 통계와 수수료 기록을 함께 반영
// region:    --- Imports
use super::spawn_periodic;
use crate::clock::Clock;
use crate::error::StoreError;
use crate::store::AuctionStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
// endregion: --- Imports

// region:    --- Closing Scheduler
/// 한 주기의 처리 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosingReport {
    pub activated: u64,
    pub closed: usize,
    pub closed_with_winner: usize,
    pub failed: usize,
}

pub struct ClosingScheduler {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
}

impl ClosingScheduler {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// 경매 종료 스케줄러 시작
    pub fn start(self: Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        spawn_periodic("경매 종료 스케줄러", period, cancel, move || {
            let scheduler = Arc::clone(&self);
            async move {
                if let Err(e) = scheduler.run_cycle().await {
                    error!(
                        "{:<12} --> 경매 종료 처리 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 주기 실행
    /// 개별 상품의 종료 실패는 기록만 하고 다음 주기에 다시 시도한다.
    pub async fn run_cycle(&self) -> Result<ClosingReport, StoreError> {
        let now = self.clock.now();
        let mut report = ClosingReport {
            activated: self.store.activate_due_items(now).await?,
            ..ClosingReport::default()
        };

        for item_id in self.store.due_item_ids(now).await? {
            match self.store.close_item(item_id, now).await {
                Ok(Some(outcome)) => {
                    report.closed += 1;
                    if let Some(record) = &outcome.commission {
                        report.closed_with_winner += 1;
                        info!(
                            "{:<12} --> 낙찰 처리: item={}, winner={:?}, 낙찰가 {}, 수수료 {}",
                            "Scheduler",
                            item_id,
                            outcome.item.current_bidder_id,
                            outcome.item.current_bid,
                            record.amount_owed
                        );
                    } else if outcome.item.current_bidder_id.is_some() {
                        // 수수료 기록이 이미 있는 경우 (재시도된 종료)
                        report.closed_with_winner += 1;
                    } else {
                        info!("{:<12} --> 유찰 처리: item={}", "Scheduler", item_id);
                    }
                }
                Ok(None) => {
                    debug!("{:<12} --> 이미 종료된 경매: item={}", "Scheduler", item_id);
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "{:<12} --> 경매 종료 실패, 다음 주기에 재시도: item={}, {:?}",
                        "Scheduler", item_id, e
                    );
                }
            }
        }

        if report == ClosingReport::default() {
            debug!("{:<12} --> 처리할 경매 없음", "Scheduler");
        } else {
            info!("{:<12} --> 경매 종료 주기 완료: {:?}", "Scheduler", report);
        }
        Ok(report)
    }
}
// endregion: --- Closing Scheduler

// endregion: --- Tests
