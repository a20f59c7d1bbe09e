use crate::auction::model::{AuctionItem, MAX_AMOUNT};
use crate::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_item_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

/// 저장소에 전달되는 입찰 시도
/// 저장소는 상품 단위 직렬화 안에서 check_admission 과 같은 조건을 다시 확인한다.
#[derive(Debug, Clone, Copy)]
pub struct BidAttempt {
    pub auction_item_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub min_increment: i64,
    pub placed_at: DateTime<Utc>,
}

/// 입찰 허용 규칙
pub fn check_admission(
    item: &AuctionItem,
    bidder_id: i64,
    amount: i64,
    now: DateTime<Utc>,
    min_increment: i64,
) -> Result<(), MarketError> {
    if !item.accepts_bids_at(now) {
        return Err(MarketError::AuctionNotActive);
    }
    if item.auctioneer_id == bidder_id {
        return Err(MarketError::SelfBidRejected);
    }
    if amount > MAX_AMOUNT {
        return Err(MarketError::InvalidRequest(format!(
            "입찰 금액은 {} 을(를) 넘을 수 없습니다.",
            MAX_AMOUNT
        )));
    }
    let minimum = item.minimum_next_bid(min_increment);
    if amount < minimum {
        return Err(MarketError::BidTooLow { amount, minimum });
    }
    Ok(())
}
