/// 경매 저장소
/// 상태를 바꾸는 메서드 하나가 곧 하나의 원자적 단위다.
/// 구현체: PostgresStore (운영), MemoryStore (테스트 및 단독 실행)
// region:    --- Imports
use crate::auction::model::{AuctionItem, AuctionStatus, CloseOutcome, NewAuctionItem};
use crate::bidding::model::{Bid, BidAttempt};
use crate::commission::model::{CommissionRecord, ProofOutcome, Resolution};
use crate::error::StoreError;
use crate::users::model::{NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
mod queries;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
// endregion: --- Modules

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    // --- 사용자
    async fn insert_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    /// money_spent > 0 인 사용자를 money_spent 내림차순으로
    async fn leaderboard(&self) -> Result<Vec<User>, StoreError>;

    // --- 경매 상품
    /// 경매인의 미납 수수료가 없을 때만 PENDING 상품을 생성한다. 미납이 있으면 None.
    async fn insert_item_if_clear(
        &self,
        item: NewAuctionItem,
    ) -> Result<Option<AuctionItem>, StoreError>;

    async fn get_item(&self, item_id: i64) -> Result<Option<AuctionItem>, StoreError>;

    async fn list_items(
        &self,
        status: Option<AuctionStatus>,
    ) -> Result<Vec<AuctionItem>, StoreError>;

    /// 입찰 이력 (최신순)
    async fn list_bids(&self, item_id: i64) -> Result<Vec<Bid>, StoreError>;

    /// 조건부 입찰 확정
    /// 현재가 갱신과 입찰 기록 추가를 함께 적용한다. 조건을 만족하지 못하면 아무것도 쓰지 않고 None.
    async fn commit_bid(&self, attempt: BidAttempt) -> Result<Option<Bid>, StoreError>;

    // --- 경매 종료
    /// 시작 시간이 지난 PENDING 상품을 ACTIVE 로 전환하고 전환된 개수를 돌려준다.
    async fn activate_due_items(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn due_item_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>, StoreError>;

    /// 조건부 종료 (ACTIVE -> ENDED)
    /// 종료, 낙찰자 통계, 수수료 기록 생성은 함께 적용되거나 전혀 적용되지 않는다.
    /// 이미 종료되었거나 아직 종료 시간이 아니면 None.
    async fn close_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<CloseOutcome>, StoreError>;

    // --- 수수료
    async fn get_commission(
        &self,
        commission_id: i64,
    ) -> Result<Option<CommissionRecord>, StoreError>;

    async fn list_commissions(
        &self,
        auctioneer_id: i64,
    ) -> Result<Vec<CommissionRecord>, StoreError>;

    /// UNVERIFIED + REJECTED 수수료 합계 (원장에서 직접 계산)
    async fn unpaid_commission(&self, auctioneer_id: i64) -> Result<i64, StoreError>;

    async fn submit_proof(
        &self,
        commission_id: i64,
        auctioneer_id: i64,
        proof_ref: String,
        now: DateTime<Utc>,
    ) -> Result<ProofOutcome, StoreError>;

    async fn proofs_awaiting_review(&self) -> Result<Vec<CommissionRecord>, StoreError>;

    /// 오라클 판정 적용
    /// 관찰한 제출 시각이 그대로이고 아직 검증 전인 기록에만 적용한다. 적용되지 않으면 None.
    async fn resolve_commission(
        &self,
        resolution: Resolution,
    ) -> Result<Option<CommissionRecord>, StoreError>;
}
// endregion: --- Auction Store Trait
