/// 수수료 관련 커맨드 처리
/// 1. 경매 등록 가능 여부 (미납 수수료 확인)
/// 2. 납부 증빙 제출
// region:    --- Imports
use crate::commission::model::{CommissionRecord, ProofOutcome, UnpaidCommission};
use crate::error::MarketError;
use crate::state::AppState;
use crate::users::authorize;
use crate::users::model::Action;
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// 증빙 제출 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubmitProofCommand {
    pub commission_id: i64,
    pub auctioneer_id: i64,
    pub proof_ref: String,
}

/// 1. 경매 등록 가능 여부
pub async fn can_create_auction(
    state: &AppState,
    auctioneer_id: i64,
) -> Result<UnpaidCommission, MarketError> {
    let outstanding = state.store.unpaid_commission(auctioneer_id).await?;
    Ok(UnpaidCommission::new(auctioneer_id, outstanding))
}

/// 2. 납부 증빙 제출
pub async fn handle_submit_proof(
    cmd: SubmitProofCommand,
    state: &AppState,
) -> Result<CommissionRecord, MarketError> {
    info!("{:<12} --> 수수료 증빙 제출 처리 시작: {:?}", "Command", cmd);

    let proof_ref = cmd.proof_ref.trim();
    if proof_ref.is_empty() {
        return Err(MarketError::InvalidRequest(
            "납부 증빙을 입력해야 합니다.".to_string(),
        ));
    }
    // 다른 사람의 기록은 역할과 무관하게 존재하지 않는 것으로 응답한다.
    match state.store.get_commission(cmd.commission_id).await? {
        Some(record) if record.auctioneer_id == cmd.auctioneer_id => {}
        _ => return Err(MarketError::NotFound),
    }
    authorize(state, cmd.auctioneer_id, Action::SubmitCommissionProof).await?;

    let now = state.clock.now();
    match state
        .store
        .submit_proof(
            cmd.commission_id,
            cmd.auctioneer_id,
            proof_ref.to_string(),
            now,
        )
        .await?
    {
        ProofOutcome::Submitted(record) => {
            info!(
                "{:<12} --> 수수료 증빙 제출 완료: commission={}",
                "Command", record.id
            );
            Ok(record)
        }
        ProofOutcome::NotFound => Err(MarketError::NotFound),
        ProofOutcome::AlreadyVerified => Err(MarketError::CommissionAlreadyVerified),
    }
}
// endregion: --- Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{CommissionRate, NewAuctionItem};
    use crate::bidding::model::BidAttempt;
    use crate::clock::ManualClock;
    use crate::commission::model::{CommissionStatus, Resolution, Verdict};
    use crate::config::MarketRules;
    use crate::store::{AuctionStore, MemoryStore};
    use crate::users::model::{NewUser, Role};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()
    }

    /// 낙찰된 경매 하나와 그 수수료 기록을 만든다.
    async fn sold_auction() -> (AppState, i64, i64, i64) {
        let store = Arc::new(MemoryStore::new());
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
        let other = store
            .insert_user(
                NewUser {
                    user_name: "other".to_string(),
                    email: "other@example.com".to_string(),
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
                title: "그림".to_string(),
                description: String::new(),
                starting_bid: 100,
                auctioneer_id: seller.id,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
                start_time: t0(),
                end_time: t0() + Duration::hours(1),
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
        let record = store
            .close_item(item.id, item.end_time)
            .await
            .unwrap()
            .unwrap()
            .commission
            .unwrap();

        let state = AppState::new(
            store,
            Arc::new(ManualClock::new(t0() + Duration::hours(2))),
            MarketRules {
                min_bid_increment: 10,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
            },
        );
        (state, seller.id, other.id, record.id)
    }

    fn proof(commission_id: i64, auctioneer_id: i64) -> SubmitProofCommand {
        SubmitProofCommand {
            commission_id,
            auctioneer_id,
            proof_ref: "bank-transfer-0001".to_string(),
        }
    }

    #[tokio::test]
    async fn hold_reflects_outstanding_commission() {
        let (state, seller_id, other_id, _) = sold_auction().await;

        let unpaid = can_create_auction(&state, seller_id).await.unwrap();
        assert_eq!(unpaid.outstanding, 50);
        assert!(!unpaid.can_create_auction);

        let clear = can_create_auction(&state, other_id).await.unwrap();
        assert!(clear.can_create_auction);
    }

    #[tokio::test]
    async fn proof_is_recorded_for_owner_only() {
        let (state, seller_id, other_id, commission_id) = sold_auction().await;

        assert!(matches!(
            handle_submit_proof(proof(commission_id, other_id), &state).await,
            Err(MarketError::NotFound)
        ));
        assert!(matches!(
            handle_submit_proof(proof(commission_id + 100, seller_id), &state).await,
            Err(MarketError::NotFound)
        ));

        let record = handle_submit_proof(proof(commission_id, seller_id), &state)
            .await
            .unwrap();
        assert_eq!(record.status, CommissionStatus::Unverified);
        assert_eq!(record.proof_ref.as_deref(), Some("bank-transfer-0001"));
        assert_eq!(record.proof_submitted_at, Some(t0() + Duration::hours(2)));
    }

    #[tokio::test]
    async fn foreign_record_is_not_found_for_any_role() {
        let (state, _, _, commission_id) = sold_auction().await;
        let bidder = state
            .store
            .insert_user(
                NewUser {
                    user_name: "curious".to_string(),
                    email: "curious@example.com".to_string(),
                    role: Role::Bidder,
                },
                t0(),
            )
            .await
            .unwrap();

        assert!(matches!(
            handle_submit_proof(proof(commission_id, bidder.id), &state).await,
            Err(MarketError::NotFound)
        ));
        assert!(matches!(
            handle_submit_proof(proof(commission_id, 9_999), &state).await,
            Err(MarketError::NotFound)
        ));
        let record = state.store.get_commission(commission_id).await.unwrap().unwrap();
        assert!(record.proof_ref.is_none());
    }

    #[tokio::test]
    async fn empty_proof_is_rejected() {
        let (state, seller_id, _, commission_id) = sold_auction().await;
        let mut cmd = proof(commission_id, seller_id);
        cmd.proof_ref = "  ".to_string();
        assert!(matches!(
            handle_submit_proof(cmd, &state).await,
            Err(MarketError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn verified_record_cannot_be_resubmitted() {
        let (state, seller_id, _, commission_id) = sold_auction().await;
        let record = handle_submit_proof(proof(commission_id, seller_id), &state)
            .await
            .unwrap();
        state
            .store
            .resolve_commission(Resolution {
                commission_id,
                observed_proof_at: record.proof_submitted_at.unwrap(),
                verdict: Verdict::Verified,
                reviewed_at: t0() + Duration::hours(3),
            })
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            handle_submit_proof(proof(commission_id, seller_id), &state).await,
            Err(MarketError::CommissionAlreadyVerified)
        ));
    }
}
// endregion: --- Tests
