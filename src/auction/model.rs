use crate::commission::model::CommissionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 상태 (PENDING -> ACTIVE -> ENDED, 역방향 전이 없음)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Pending,
    Active,
    Ended,
}

/// 시작가와 입찰가의 상한
/// 낙찰 금액 누계와 SQL 조건식이 BIGINT 범위를 넘지 않도록 제한한다.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// 수수료율 (basis point, 1/10000 단위)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct CommissionRate(i32);

impl CommissionRate {
    pub const MAX_BPS: i32 = 10_000;

    pub fn from_bps(bps: i32) -> Option<Self> {
        (0..=Self::MAX_BPS).contains(&bps).then_some(Self(bps))
    }

    pub fn bps(&self) -> i32 {
        self.0
    }

    /// 낙찰가에 대한 수수료 (반올림)
    pub fn commission_on(&self, amount: i64) -> i64 {
        let owed = (i128::from(amount) * i128::from(self.0) + i128::from(Self::MAX_BPS / 2))
            / i128::from(Self::MAX_BPS);
        owed as i64
    }
}

// 경매 상품 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuctionItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starting_bid: i64,
    pub current_bid: i64,
    pub current_bidder_id: Option<i64>,
    pub current_bid_id: Option<i64>,
    pub auctioneer_id: i64,
    pub commission_rate: CommissionRate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
}

impl AuctionItem {
    /// 입찰 가능 구간 [start_time, end_time) 안에 있고 종료되지 않았는지 확인
    /// 시작 시간이 지난 PENDING 상품은 첫 입찰에서 ACTIVE 로 전환된다.
    pub fn accepts_bids_at(&self, now: DateTime<Utc>) -> bool {
        let in_window = self.start_time <= now && now < self.end_time;
        match self.status {
            AuctionStatus::Pending | AuctionStatus::Active => in_window,
            AuctionStatus::Ended => false,
        }
    }

    /// 종료 스케줄러가 닫아야 하는 상품인지 확인
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && self.end_time <= now
    }

    /// 다음 입찰이 넘어야 하는 최소 금액
    pub fn minimum_next_bid(&self, min_increment: i64) -> i64 {
        self.current_bid.saturating_add(min_increment)
    }

    /// 낙찰자와 수수료 (입찰이 없으면 None)
    pub fn settlement(&self) -> Option<Settlement> {
        self.current_bidder_id.map(|bidder_id| Settlement {
            winner_id: bidder_id,
            final_bid: self.current_bid,
            commission_owed: self.commission_rate.commission_on(self.current_bid),
        })
    }
}

/// 경매 종료 시 확정되는 낙찰 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub winner_id: i64,
    pub final_bid: i64,
    pub commission_owed: i64,
}

// 신규 경매 상품
#[derive(Debug, Clone)]
pub struct NewAuctionItem {
    pub title: String,
    pub description: String,
    pub starting_bid: i64,
    pub auctioneer_id: i64,
    pub commission_rate: CommissionRate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 경매 종료 처리 결과
#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub item: AuctionItem,
    pub commission: Option<CommissionRecord>,
}
