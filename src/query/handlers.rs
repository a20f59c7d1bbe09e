// region:    --- Imports
use crate::auction::model::{AuctionItem, AuctionStatus};
use crate::bidding::model::Bid;
use crate::commission::commands::can_create_auction;
use crate::commission::model::{CommissionRecord, UnpaidCommission};
use crate::error::MarketError;
use crate::state::AppState;
use crate::users::model::User;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 상품 조회
pub async fn get_item(state: &AppState, item_id: i64) -> Result<AuctionItem, MarketError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    state
        .store
        .get_item(item_id)
        .await?
        .ok_or(MarketError::AuctionNotFound)
}

/// 상품 목록 조회 (최신 등록순)
pub async fn list_items(
    state: &AppState,
    status: Option<AuctionStatus>,
) -> Result<Vec<AuctionItem>, MarketError> {
    info!("{:<12} --> 상품 목록 조회 status: {:?}", "Query", status);
    Ok(state.store.list_items(status).await?)
}

/// 상품 입찰 이력 조회 (최신순)
pub async fn get_item_bids(state: &AppState, item_id: i64) -> Result<Vec<Bid>, MarketError> {
    info!("{:<12} --> 상품 입찰 이력 조회 id: {}", "Query", item_id);
    get_item(state, item_id).await?;
    Ok(state.store.list_bids(item_id).await?)
}

/// 수수료 기록 조회
pub async fn get_commission(
    state: &AppState,
    commission_id: i64,
) -> Result<CommissionRecord, MarketError> {
    info!("{:<12} --> 수수료 기록 조회 id: {}", "Query", commission_id);
    state
        .store
        .get_commission(commission_id)
        .await?
        .ok_or(MarketError::NotFound)
}

/// 경매인의 수수료 기록 조회
pub async fn list_commissions(
    state: &AppState,
    auctioneer_id: i64,
) -> Result<Vec<CommissionRecord>, MarketError> {
    info!(
        "{:<12} --> 경매인 수수료 기록 조회 id: {}",
        "Query", auctioneer_id
    );
    get_user(state, auctioneer_id).await?;
    Ok(state.store.list_commissions(auctioneer_id).await?)
}

/// 경매인의 미납 수수료 조회
pub async fn get_unpaid_commission(
    state: &AppState,
    auctioneer_id: i64,
) -> Result<UnpaidCommission, MarketError> {
    info!("{:<12} --> 미납 수수료 조회 id: {}", "Query", auctioneer_id);
    get_user(state, auctioneer_id).await?;
    can_create_auction(state, auctioneer_id).await
}

/// 사용자 조회
pub async fn get_user(state: &AppState, user_id: i64) -> Result<User, MarketError> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    state
        .store
        .get_user(user_id)
        .await?
        .ok_or(MarketError::UserNotFound)
}

/// 낙찰 금액 순위 조회
pub async fn get_leaderboard(state: &AppState) -> Result<Vec<User>, MarketError> {
    info!("{:<12} --> 낙찰 금액 순위 조회", "Query");
    Ok(state.store.leaderboard().await?)
}

// endregion: --- Query Handlers

// endregion: --- Tests
