/// 수수료 검증 스케줄러
/// 증빙이 제출된 미검증/거절 기록을 오라클에 확인하고 결과를 원장에 반영한다.
// region:    --- Imports
use super::spawn_periodic;
use crate::clock::Clock;
use crate::commission::model::{Resolution, Verdict};
use crate::commission::oracle::VerificationOracle;
use crate::error::StoreError;
use crate::store::AuctionStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
// endregion: --- Imports

// region:    --- Verification Scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub examined: usize,
    pub verified: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct VerificationScheduler {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    oracle: Arc<dyn VerificationOracle>,
}

impl VerificationScheduler {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn VerificationOracle>,
    ) -> Self {
        Self {
            store,
            clock,
            oracle,
        }
    }

    /// 수수료 검증 스케줄러 시작
    pub fn start(self: Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        spawn_periodic("수수료 검증 스케줄러", period, cancel, move || {
            let scheduler = Arc::clone(&self);
            async move {
                if let Err(e) = scheduler.run_cycle().await {
                    error!(
                        "{:<12} --> 수수료 검증 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 주기 실행
    /// 오라클 호출 전에 읽은 제출 시각을 조건으로 판정을 반영하므로
    /// 호출 도중 재제출된 증빙은 다음 주기에 다시 검증된다.
    pub async fn run_cycle(&self) -> Result<VerificationReport, StoreError> {
        let mut report = VerificationReport::default();

        for record in self.store.proofs_awaiting_review().await? {
            report.examined += 1;
            let Some(observed_proof_at) = record.proof_submitted_at else {
                report.skipped += 1;
                continue;
            };

            let verdict = match self.oracle.verify(&record).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "{:<12} --> 오라클 검증 실패, 다음 주기에 재시도: commission={}, {}",
                        "Scheduler", record.id, e
                    );
                    continue;
                }
            };

            let resolution = Resolution {
                commission_id: record.id,
                observed_proof_at,
                verdict,
                reviewed_at: self.clock.now(),
            };
            match self.store.resolve_commission(resolution).await {
                Ok(Some(resolved)) => {
                    match verdict {
                        Verdict::Verified => report.verified += 1,
                        Verdict::Rejected => report.rejected += 1,
                    }
                    info!(
                        "{:<12} --> 수수료 판정 반영: commission={}, {:?}",
                        "Scheduler", resolved.id, resolved.status
                    );
                }
                Ok(None) => {
                    report.skipped += 1;
                    debug!(
                        "{:<12} --> 검증 중 증빙이 바뀌어 판정 보류: commission={}",
                        "Scheduler", record.id
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "{:<12} --> 수수료 판정 반영 실패: commission={}, {:?}",
                        "Scheduler", record.id, e
                    );
                }
            }
        }

        if report.examined > 0 {
            info!("{:<12} --> 수수료 검증 주기 완료: {:?}", "Scheduler", report);
        }
        Ok(report)
    }
}
// endregion: --- Verification Scheduler

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::commands::{handle_create_auction, CreateAuctionCommand};
    use crate::auction::model::{CommissionRate, NewAuctionItem};
    use crate::bidding::model::BidAttempt;
    use crate::clock::ManualClock;
    use crate::commission::model::{CommissionRecord, CommissionStatus};
    use crate::commission::oracle::OracleError;
    use crate::config::MarketRules;
    use crate::error::MarketError;
    use crate::state::AppState;
    use crate::store::MemoryStore;
    use crate::users::model::{NewUser, Role};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// "paid-" 증빙은 통과, "offline" 은 장애, 나머지는 거절
    /// resubmit 이 있으면 판정 직전에 같은 기록에 증빙을 다시 제출한다.
    #[derive(Default)]
    struct ScriptedOracle {
        calls: AtomicUsize,
        resubmit: Option<(Arc<MemoryStore>, Arc<ManualClock>)>,
    }

    #[async_trait]
    impl VerificationOracle for ScriptedOracle {
        async fn verify(&self, record: &CommissionRecord) -> Result<Verdict, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((store, clock)) = &self.resubmit {
                clock.advance(chrono::Duration::seconds(1));
                store
                    .submit_proof(
                        record.id,
                        record.auctioneer_id,
                        "paid-late".to_string(),
                        clock.now(),
                    )
                    .await
                    .unwrap();
            }
            match record.proof_ref.as_deref() {
                Some(proof) if proof.starts_with("paid-") => Ok(Verdict::Verified),
                Some("offline") => Err(OracleError::Timeout),
                Some(_) => Ok(Verdict::Rejected),
                None => Err(OracleError::MissingProof),
            }
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        seller_id: i64,
        commission_id: i64,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap()
    }

    /// 낙찰가 500, 수수료율 10% 로 종료된 경매 하나
    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let seller = store
            .insert_user(
                NewUser {
                    user_name: "seller".to_string(),
                    email: "seller@example.com".to_string(),
                    role: Role::Auctioneer,
                },
                t0(),
            )
            .await
            .unwrap();
        let bidder = store
            .insert_user(
                NewUser {
                    user_name: "bidder".to_string(),
                    email: "bidder@example.com".to_string(),
                    role: Role::Bidder,
                },
                t0(),
            )
            .await
            .unwrap();
        let item = store
            .insert_item_if_clear(NewAuctionItem {
                title: "도자기".to_string(),
                description: String::new(),
                starting_bid: 100,
                auctioneer_id: seller.id,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
                start_time: t0(),
                end_time: t0() + chrono::Duration::hours(1),
                created_at: t0(),
            })
            .await
            .unwrap()
            .unwrap();
        store
            .commit_bid(BidAttempt {
                auction_item_id: item.id,
                bidder_id: bidder.id,
                amount: 500,
                min_increment: 10,
                placed_at: t0(),
            })
            .await
            .unwrap()
            .unwrap();
        clock.set(item.end_time);
        let record = store
            .close_item(item.id, item.end_time)
            .await
            .unwrap()
            .unwrap()
            .commission
            .unwrap();

        Fixture {
            store,
            clock,
            seller_id: seller.id,
            commission_id: record.id,
        }
    }

    impl Fixture {
        fn scheduler(&self, oracle: Arc<ScriptedOracle>) -> VerificationScheduler {
            VerificationScheduler::new(self.store.clone(), self.clock.clone(), oracle)
        }

        async fn submit(&self, proof: &str) {
            self.clock.advance(chrono::Duration::minutes(1));
            self.store
                .submit_proof(
                    self.commission_id,
                    self.seller_id,
                    proof.to_string(),
                    self.clock.now(),
                )
                .await
                .unwrap();
        }

        async fn record(&self) -> CommissionRecord {
            self.store
                .get_commission(self.commission_id)
                .await
                .unwrap()
                .unwrap()
        }

        async fn unpaid(&self) -> i64 {
            self.store
                .get_user(self.seller_id)
                .await
                .unwrap()
                .unwrap()
                .unpaid_commission
        }
    }

    #[tokio::test]
    async fn records_without_proof_are_not_examined() {
        let f = fixture().await;
        let oracle = Arc::new(ScriptedOracle::default());
        let report = f.scheduler(oracle.clone()).run_cycle().await.unwrap();

        assert_eq!(report, VerificationReport::default());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.unpaid().await, 50);
    }

    #[tokio::test]
    async fn rejection_then_verified_resubmission_lifts_hold() {
        let f = fixture().await;
        let oracle = Arc::new(ScriptedOracle::default());
        let scheduler = f.scheduler(oracle.clone());

        f.submit("blurry-receipt").await;
        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.rejected, 1);

        let record = f.record().await;
        assert_eq!(record.status, CommissionStatus::Rejected);
        assert_eq!(record.proof_submitted_at, None);
        assert!(record.reviewed_at.is_some());
        assert_eq!(f.unpaid().await, 50);

        // 거절된 증빙은 다시 검사하지 않는다
        assert_eq!(scheduler.run_cycle().await.unwrap().examined, 0);

        f.submit("paid-20241001").await;
        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.verified, 1);
        assert_eq!(f.record().await.status, CommissionStatus::Verified);
        assert_eq!(f.unpaid().await, 0);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);

        // 미납이 사라지면 새 경매를 등록할 수 있다
        let state = AppState::new(
            f.store.clone(),
            f.clock.clone(),
            MarketRules {
                min_bid_increment: 10,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
            },
        );
        let item = handle_create_auction(
            CreateAuctionCommand {
                auctioneer_id: f.seller_id,
                title: "두 번째 도자기".to_string(),
                description: String::new(),
                starting_bid: 100,
                start_time: f.clock.now() + chrono::Duration::minutes(5),
                end_time: f.clock.now() + chrono::Duration::hours(2),
            },
            &state,
        )
        .await
        .unwrap();
        assert_eq!(item.auctioneer_id, f.seller_id);
    }

    #[tokio::test]
    async fn outstanding_commission_blocks_creation() {
        let f = fixture().await;
        let state = AppState::new(
            f.store.clone(),
            f.clock.clone(),
            MarketRules {
                min_bid_increment: 10,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
            },
        );
        let err = handle_create_auction(
            CreateAuctionCommand {
                auctioneer_id: f.seller_id,
                title: "차단될 경매".to_string(),
                description: String::new(),
                starting_bid: 100,
                start_time: f.clock.now() + chrono::Duration::minutes(5),
                end_time: f.clock.now() + chrono::Duration::hours(2),
            },
            &state,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MarketError::CommissionOwed { outstanding: 50 }));
    }

    #[tokio::test]
    async fn oracle_failure_leaves_record_for_next_cycle() {
        let f = fixture().await;
        let oracle = Arc::new(ScriptedOracle::default());
        let scheduler = f.scheduler(oracle.clone());

        f.submit("offline").await;
        let report = scheduler.run_cycle().await.unwrap();
        assert_eq!(report.failed, 1);

        let record = f.record().await;
        assert_eq!(record.status, CommissionStatus::Unverified);
        assert!(record.proof_submitted_at.is_some());
        assert_eq!(record.reviewed_at, None);

        assert_eq!(scheduler.run_cycle().await.unwrap().failed, 1);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resubmission_during_review_is_not_overwritten() {
        let f = fixture().await;
        f.submit("blurry-receipt").await;

        let racing = Arc::new(ScriptedOracle {
            calls: AtomicUsize::new(0),
            resubmit: Some((f.store.clone(), f.clock.clone())),
        });
        let report = f.scheduler(racing).run_cycle().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.rejected, 0);

        let record = f.record().await;
        assert_eq!(record.status, CommissionStatus::Unverified);
        assert_eq!(record.proof_ref.as_deref(), Some("paid-late"));

        let report = f
            .scheduler(Arc::new(ScriptedOracle::default()))
            .run_cycle()
            .await
            .unwrap();
        assert_eq!(report.verified, 1);
        assert_eq!(f.unpaid().await, 0);
    }
}
// endregion: --- Tests
