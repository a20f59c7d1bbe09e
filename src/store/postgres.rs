/// PostgreSQL 저장소
/// 상태 변경 단위마다 트랜잭션 하나를 쓰고, 조건부 UPDATE ... RETURNING 으로 경합을 판정한다.
// region:    --- Imports
use super::queries;
use super::AuctionStore;
use crate::auction::model::{AuctionItem, AuctionStatus, CloseOutcome, NewAuctionItem};
use crate::bidding::model::{Bid, BidAttempt};
use crate::commission::model::{CommissionRecord, ProofOutcome, Resolution};
use crate::database::DatabaseManager;
use crate::error::StoreError;
use crate::users::model::{NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{debug, info};
// endregion: --- Imports

// region:    --- Postgres Store
pub struct PostgresStore {
    db: Arc<DatabaseManager>,
}

impl PostgresStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn insert_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let inserted = sqlx::query_as::<_, User>(queries::INSERT_USER)
            .bind(&user.user_name)
            .bind(&user.email)
            .bind(user.role)
            .bind(now)
            .fetch_one(self.db.pool())
            .await;
        match inserted {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Duplicate(format!("email {}", user.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    async fn leaderboard(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(queries::GET_LEADERBOARD)
            .fetch_all(self.db.pool())
            .await?;
        Ok(users)
    }

    async fn insert_item_if_clear(
        &self,
        item: NewAuctionItem,
    ) -> Result<Option<AuctionItem>, StoreError> {
        let item = sqlx::query_as::<_, AuctionItem>(queries::INSERT_ITEM_IF_CLEAR)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.starting_bid)
            .bind(item.auctioneer_id)
            .bind(item.commission_rate)
            .bind(item.start_time)
            .bind(item.end_time)
            .bind(item.created_at)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(item)
    }

    async fn get_item(&self, item_id: i64) -> Result<Option<AuctionItem>, StoreError> {
        let item = sqlx::query_as::<_, AuctionItem>(queries::GET_ITEM)
            .bind(item_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(item)
    }

    async fn list_items(
        &self,
        status: Option<AuctionStatus>,
    ) -> Result<Vec<AuctionItem>, StoreError> {
        let items = sqlx::query_as::<_, AuctionItem>(queries::LIST_ITEMS)
            .bind(status)
            .fetch_all(self.db.pool())
            .await?;
        Ok(items)
    }

    async fn list_bids(&self, item_id: i64) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
            .bind(item_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(bids)
    }

    async fn commit_bid(&self, attempt: BidAttempt) -> Result<Option<Bid>, StoreError> {
        self.db
            .transaction(move |tx| Box::pin(apply_bid(&mut **tx, attempt)))
            .await
    }

    async fn activate_due_items(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(queries::ACTIVATE_DUE_ITEMS)
            .bind(now)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn due_item_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(queries::GET_DUE_ITEM_IDS)
            .bind(now)
            .fetch_all(self.db.pool())
            .await?;
        Ok(ids)
    }

    async fn close_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<CloseOutcome>, StoreError> {
        self.db
            .transaction(move |tx| Box::pin(close_due_item(&mut **tx, item_id, now)))
            .await
    }

    async fn get_commission(
        &self,
        commission_id: i64,
    ) -> Result<Option<CommissionRecord>, StoreError> {
        let record = sqlx::query_as::<_, CommissionRecord>(queries::GET_COMMISSION)
            .bind(commission_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(record)
    }

    async fn list_commissions(
        &self,
        auctioneer_id: i64,
    ) -> Result<Vec<CommissionRecord>, StoreError> {
        let records = sqlx::query_as::<_, CommissionRecord>(queries::LIST_COMMISSIONS)
            .bind(auctioneer_id)
            .fetch_all(self.db.pool())
            .await?;
        Ok(records)
    }

    async fn unpaid_commission(&self, auctioneer_id: i64) -> Result<i64, StoreError> {
        let outstanding = sqlx::query_scalar::<_, i64>(queries::GET_UNPAID_COMMISSION)
            .bind(auctioneer_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(outstanding)
    }

    async fn submit_proof(
        &self,
        commission_id: i64,
        auctioneer_id: i64,
        proof_ref: String,
        now: DateTime<Utc>,
    ) -> Result<ProofOutcome, StoreError> {
        let updated = sqlx::query_as::<_, CommissionRecord>(queries::SUBMIT_PROOF)
            .bind(commission_id)
            .bind(auctioneer_id)
            .bind(proof_ref)
            .bind(now)
            .fetch_optional(self.db.pool())
            .await?;
        if let Some(record) = updated {
            return Ok(ProofOutcome::Submitted(record));
        }

        // 갱신되지 않은 이유 확인
        match self.get_commission(commission_id).await? {
            Some(record) if record.auctioneer_id == auctioneer_id => {
                Ok(ProofOutcome::AlreadyVerified)
            }
            _ => Ok(ProofOutcome::NotFound),
        }
    }

    async fn proofs_awaiting_review(&self) -> Result<Vec<CommissionRecord>, StoreError> {
        let records = sqlx::query_as::<_, CommissionRecord>(queries::GET_PROOFS_AWAITING_REVIEW)
            .fetch_all(self.db.pool())
            .await?;
        Ok(records)
    }

    async fn resolve_commission(
        &self,
        resolution: Resolution,
    ) -> Result<Option<CommissionRecord>, StoreError> {
        self.db
            .transaction(move |tx| Box::pin(apply_resolution(&mut **tx, resolution)))
            .await
    }
}
// endregion: --- Postgres Store

// region:    --- Transaction Bodies
/// 입찰 반영: 조건부 현재가 갱신 -> 입찰 기록 추가 -> 최고 입찰 기록 연결
async fn apply_bid(
    conn: &mut PgConnection,
    attempt: BidAttempt,
) -> Result<Option<Bid>, StoreError> {
    let applied = sqlx::query_scalar::<_, i64>(queries::APPLY_BID)
        .bind(attempt.auction_item_id)
        .bind(attempt.bidder_id)
        .bind(attempt.amount)
        .bind(attempt.min_increment)
        .bind(attempt.placed_at)
        .fetch_optional(&mut *conn)
        .await?;
    if applied.is_none() {
        debug!(
            "{:<12} --> 입찰 조건 불충족: item={}, amount={}",
            "Store", attempt.auction_item_id, attempt.amount
        );
        return Ok(None);
    }

    let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
        .bind(attempt.auction_item_id)
        .bind(attempt.bidder_id)
        .bind(attempt.amount)
        .bind(attempt.placed_at)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query(queries::SET_CURRENT_BID_ID)
        .bind(attempt.auction_item_id)
        .bind(bid.id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(bid))
}

/// 경매 종료: 상태 전이 -> 낙찰자 통계 -> 수수료 기록 -> 미납 합계 갱신
async fn close_due_item(
    conn: &mut PgConnection,
    item_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<CloseOutcome>, StoreError> {
    let Some(item) = sqlx::query_as::<_, AuctionItem>(queries::CLOSE_ITEM)
        .bind(item_id)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let mut commission = None;
    if let Some(settlement) = item.settlement() {
        let updated = sqlx::query(queries::RECORD_WIN)
            .bind(settlement.winner_id)
            .bind(settlement.final_bid)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        if updated != 1 {
            return Err(StoreError::Corrupt(format!(
                "낙찰자 {} 를 찾을 수 없거나 누계가 범위를 넘습니다",
                settlement.winner_id
            )));
        }

        commission = sqlx::query_as::<_, CommissionRecord>(queries::INSERT_COMMISSION)
            .bind(item.auctioneer_id)
            .bind(item.id)
            .bind(settlement.commission_owed)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await?;

        refresh_unpaid(&mut *conn, item.auctioneer_id).await?;
    }

    info!(
        "{:<12} --> 경매 종료 반영: item={}, winner={:?}",
        "Store", item.id, item.current_bidder_id
    );
    Ok(Some(CloseOutcome { item, commission }))
}

/// 검증 결과 반영 후 미납 합계 갱신
async fn apply_resolution(
    conn: &mut PgConnection,
    resolution: Resolution,
) -> Result<Option<CommissionRecord>, StoreError> {
    let record = sqlx::query_as::<_, CommissionRecord>(queries::RESOLVE_COMMISSION)
        .bind(resolution.commission_id)
        .bind(resolution.verdict.status())
        .bind(resolution.reviewed_at)
        .bind(resolution.observed_proof_at)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(record) = &record {
        refresh_unpaid(&mut *conn, record.auctioneer_id).await?;
    }
    Ok(record)
}

async fn refresh_unpaid(conn: &mut PgConnection, auctioneer_id: i64) -> Result<(), StoreError> {
    sqlx::query(queries::REFRESH_UNPAID_COMMISSION)
        .bind(auctioneer_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
// endregion: --- Transaction Bodies
