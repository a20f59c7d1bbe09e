/// 입찰 관련 커맨드 처리
/// 1. 입찰
// region:    --- Imports
use crate::bidding::model::{check_admission, Bid, BidAttempt};
use crate::error::MarketError;
use crate::state::AppState;
use crate::users::authorize;
use crate::users::model::Action;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub item_id: i64,
    pub bidder_id: i64,
    pub bid_amount: i64,
}

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 16;

/// 1. 입찰
/// 경합으로 조건부 반영이 실패하면 갱신된 상태를 다시 읽어 판정한다.
pub async fn handle_place_bid(cmd: PlaceBidCommand, state: &AppState) -> Result<Bid, MarketError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    let item = state
        .store
        .get_item(cmd.item_id)
        .await?
        .ok_or(MarketError::AuctionNotFound)?;
    if item.auctioneer_id == cmd.bidder_id {
        return Err(MarketError::SelfBidRejected);
    }
    authorize(state, cmd.bidder_id, Action::PlaceBid).await?;

    let min_increment = state.rules.min_bid_increment;
    let mut item = item;
    let mut retries = 0;

    while retries < MAX_RETRIES {
        let now = state.clock.now();
        check_admission(&item, cmd.bidder_id, cmd.bid_amount, now, min_increment)?;

        let attempt = BidAttempt {
            auction_item_id: cmd.item_id,
            bidder_id: cmd.bidder_id,
            amount: cmd.bid_amount,
            min_increment,
            placed_at: now,
        };
        if let Some(bid) = state.store.commit_bid(attempt).await? {
            info!(
                "{:<12} --> 입찰 성공: item={}, 현재 가격 {}",
                "Command", bid.auction_item_id, bid.amount
            );
            return Ok(bid);
        }

        warn!(
            "{:<12} --> 동시 입찰로 인한 조건 불충족: 갱신된 상태로 재평가",
            "Command"
        );
        retries += 1;
        item = state
            .store
            .get_item(cmd.item_id)
            .await?
            .ok_or(MarketError::AuctionNotFound)?;
    }

    Err(MarketError::RetriesExhausted)
}
// endregion: --- Commands

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{AuctionStatus, CommissionRate, NewAuctionItem};
    use crate::clock::{Clock, ManualClock};
    use crate::config::MarketRules;
    use crate::store::{AuctionStore, MemoryStore};
    use crate::users::model::{NewUser, Role};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;

    struct Fixture {
        state: Arc<AppState>,
        clock: Arc<ManualClock>,
        item_id: i64,
        seller_id: i64,
        bidders: Vec<i64>,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    async fn fixture(bidder_count: usize) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let seller = store
            .insert_user(
                NewUser {
                    user_name: "seller".to_string(),
                    email: "seller@example.com".to_string(),
                    role: Role::Auctioneer,
                },
                start(),
            )
            .await
            .unwrap();
        let mut bidders = Vec::new();
        for i in 0..bidder_count {
            let bidder = store
                .insert_user(
                    NewUser {
                        user_name: format!("bidder{}", i),
                        email: format!("bidder{}@example.com", i),
                        role: Role::Bidder,
                    },
                    start(),
                )
                .await
                .unwrap();
            bidders.push(bidder.id);
        }
        let item = store
            .insert_item_if_clear(NewAuctionItem {
                title: "한정판 운동화".to_string(),
                description: "입찰 커맨드 테스트".to_string(),
                starting_bid: 100,
                auctioneer_id: seller.id,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
                start_time: start(),
                end_time: start() + Duration::hours(1),
                created_at: start(),
            })
            .await
            .unwrap()
            .unwrap();

        let clock_dyn: Arc<dyn Clock> = clock.clone();
        let state = Arc::new(AppState::new(
            store,
            clock_dyn,
            MarketRules {
                min_bid_increment: 10,
                commission_rate: CommissionRate::from_bps(1_000).unwrap(),
            },
        ));
        Fixture {
            state,
            clock,
            item_id: item.id,
            seller_id: seller.id,
            bidders,
        }
    }

    fn bid(item_id: i64, bidder_id: i64, amount: i64) -> PlaceBidCommand {
        PlaceBidCommand {
            item_id,
            bidder_id,
            bid_amount: amount,
        }
    }

    /// 최소 입찰가 시나리오: 90 거절, 110 성공, 120 과 115 중 120 만 성공
    /// 115 는 처리 순서와 관계없이 최소 입찰가 120 에 못 미친다.
    #[tokio::test]
    async fn increment_scenario() {
        let f = fixture(3).await;

        let err = handle_place_bid(bid(f.item_id, f.bidders[0], 90), &f.state)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::BidTooLow { minimum: 110, .. }));

        let accepted = handle_place_bid(bid(f.item_id, f.bidders[0], 110), &f.state)
            .await
            .unwrap();
        assert_eq!(accepted.amount, 110);

        let (high, low) = tokio::join!(
            handle_place_bid(bid(f.item_id, f.bidders[1], 120), &f.state),
            handle_place_bid(bid(f.item_id, f.bidders[2], 115), &f.state),
        );
        assert_eq!(high.unwrap().amount, 120);
        assert!(matches!(low, Err(MarketError::BidTooLow { .. })));

        let item = f.state.store.get_item(f.item_id).await.unwrap().unwrap();
        assert_eq!(item.current_bid, 120);
        assert_eq!(item.current_bidder_id, Some(f.bidders[1]));
    }

    /// 120 과 125 가 겹치면 먼저 반영된 쪽이 이기고 다른 쪽은 갱신된 최소 입찰가에 걸린다.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_bids_first_commit_wins() {
        for _ in 0..20 {
            let f = fixture(3).await;
            handle_place_bid(bid(f.item_id, f.bidders[0], 110), &f.state)
                .await
                .unwrap();

            let (a, b) = (Arc::clone(&f.state), Arc::clone(&f.state));
            let (item_id, low_bidder, high_bidder) = (f.item_id, f.bidders[1], f.bidders[2]);
            let low = tokio::spawn(async move {
                handle_place_bid(bid(item_id, low_bidder, 120), &a).await
            });
            let high = tokio::spawn(async move {
                handle_place_bid(bid(item_id, high_bidder, 125), &b).await
            });
            let results = [low.await.unwrap(), high.await.unwrap()];

            let accepted: Vec<&Bid> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(accepted.len(), 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(MarketError::BidTooLow { .. }))));

            let item = f.state.store.get_item(f.item_id).await.unwrap().unwrap();
            assert_eq!(item.current_bid, accepted[0].amount);
            assert_eq!(item.current_bidder_id, Some(accepted[0].bidder_id));
            assert_eq!(item.current_bid_id, Some(accepted[0].id));
            assert_eq!(f.state.store.list_bids(f.item_id).await.unwrap().len(), 2);
        }
    }

    /// 동시 입찰 후 최종 가격은 유효한 입찰 중 최댓값
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bids_settle_on_maximum() {
        let f = fixture(20).await;

        let mut handles = Vec::new();
        for (i, bidder_id) in f.bidders.iter().copied().enumerate() {
            let state = Arc::clone(&f.state);
            let item_id = f.item_id;
            let amount = 110 + (i as i64) * 10;
            handles.push(tokio::spawn(async move {
                handle_place_bid(bid(item_id, bidder_id, amount), &state).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(MarketError::BidTooLow { .. }) => {}
                Err(other) => panic!("예상하지 못한 오류: {:?}", other),
            }
        }
        assert!(accepted >= 1);

        let item = f.state.store.get_item(f.item_id).await.unwrap().unwrap();
        let max_amount = 110 + 19 * 10;
        assert_eq!(item.current_bid, max_amount);

        let bids = f.state.store.list_bids(f.item_id).await.unwrap();
        let holders: Vec<_> = bids.iter().filter(|b| b.amount == max_amount).collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(item.current_bid_id, Some(holders[0].id));
        assert_eq!(bids.len(), accepted);

        // 기록된 입찰은 시간 순으로 금액이 엄격히 증가한다
        let mut ascending: Vec<_> = bids.iter().map(|b| (b.id, b.amount)).collect();
        ascending.sort();
        assert!(ascending.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[tokio::test]
    async fn auctioneer_cannot_bid_on_own_item() {
        let f = fixture(1).await;
        let err = handle_place_bid(bid(f.item_id, f.seller_id, 500), &f.state)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::SelfBidRejected));
    }

    #[tokio::test]
    async fn unknown_item_and_unknown_bidder() {
        let f = fixture(1).await;
        assert!(matches!(
            handle_place_bid(bid(9_999, f.bidders[0], 500), &f.state).await,
            Err(MarketError::AuctionNotFound)
        ));
        assert!(matches!(
            handle_place_bid(bid(f.item_id, 9_999, 500), &f.state).await,
            Err(MarketError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn bid_window_is_enforced() {
        let f = fixture(1).await;

        f.clock.set(start() - Duration::seconds(1));
        assert!(matches!(
            handle_place_bid(bid(f.item_id, f.bidders[0], 500), &f.state).await,
            Err(MarketError::AuctionNotActive)
        ));

        f.clock.set(start() + Duration::hours(1));
        assert!(matches!(
            handle_place_bid(bid(f.item_id, f.bidders[0], 500), &f.state).await,
            Err(MarketError::AuctionNotActive)
        ));

        f.clock.set(start() + Duration::hours(1) - Duration::milliseconds(1));
        let accepted = handle_place_bid(bid(f.item_id, f.bidders[0], 500), &f.state)
            .await
            .unwrap();
        assert!(accepted.placed_at < start() + Duration::hours(1));

        let item = f.state.store.get_item(f.item_id).await.unwrap().unwrap();
        assert_eq!(item.status, AuctionStatus::Active);
    }
}
// endregion: --- Tests
