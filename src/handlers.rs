// region:    --- Imports
use crate::auction::commands::{handle_create_auction, CreateAuctionCommand};
use crate::auction::model::{AuctionItem, AuctionStatus};
use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
use crate::bidding::model::Bid;
use crate::commission::commands::{handle_submit_proof, SubmitProofCommand};
use crate::commission::model::{CommissionRecord, UnpaidCommission};
use crate::error::MarketResult;
use crate::query;
use crate::state::AppState;
use crate::users::commands::{handle_register_user, RegisterUserCommand};
use crate::users::model::User;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

// endregion: --- Imports

// region:    --- Router

/// 전체 라우터 구성
pub fn routes(state: Arc<AppState>) -> Router {
    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auctions", post(handle_create).get(handle_list_items))
        .route("/auctions/:id", get(handle_get_item))
        .route("/auctions/:id/bids", get(handle_get_item_bids))
        .route("/bids", post(handle_bid))
        .route("/commissions/:id", get(handle_get_commission))
        .route("/commissions/:id/proof", post(handle_proof))
        .route(
            "/auctioneers/:id/commissions",
            get(handle_get_auctioneer_commissions),
        )
        .route(
            "/auctioneers/:id/unpaid-commission",
            get(handle_get_unpaid_commission),
        )
        .route("/users", post(handle_register))
        .route("/users/:id", get(handle_get_user))
        .route("/leaderboard", get(handle_get_leaderboard))
        .layer(cors)
        .with_state(state)
}

// endregion: --- Router

// region:    --- Command Handlers

/// 경매 등록 요청 처리
pub async fn handle_create(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<CreateAuctionCommand>,
) -> MarketResult<(StatusCode, Json<AuctionItem>)> {
    let item = handle_create_auction(cmd, &state).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<PlaceBidCommand>,
) -> MarketResult<(StatusCode, Json<Bid>)> {
    let bid = handle_place_bid(cmd, &state).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// 사용자 등록 요청 처리
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<RegisterUserCommand>,
) -> MarketResult<(StatusCode, Json<User>)> {
    let user = handle_register_user(cmd, &state).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct ProofBody {
    pub auctioneer_id: i64,
    pub proof_ref: String,
}

/// 수수료 납부 증빙 제출 처리
pub async fn handle_proof(
    State(state): State<Arc<AppState>>,
    Path(commission_id): Path<i64>,
    Json(body): Json<ProofBody>,
) -> MarketResult<Json<CommissionRecord>> {
    let cmd = SubmitProofCommand {
        commission_id,
        auctioneer_id: body.auctioneer_id,
        proof_ref: body.proof_ref,
    };
    Ok(Json(handle_submit_proof(cmd, &state).await?))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

#[derive(Debug, Deserialize)]
pub struct ListItemsParams {
    pub status: Option<AuctionStatus>,
}

/// 상품 목록 조회
pub async fn handle_list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListItemsParams>,
) -> MarketResult<Json<Vec<AuctionItem>>> {
    info!("{:<12} --> 상품 목록 조회", "HandlerQuery");
    Ok(Json(query::handlers::list_items(&state, params.status).await?))
}

/// 상품 조회
pub async fn handle_get_item(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> MarketResult<Json<AuctionItem>> {
    info!("{:<12} --> 상품 조회 id: {}", "HandlerQuery", item_id);
    Ok(Json(query::handlers::get_item(&state, item_id).await?))
}

/// 상품 입찰 이력 조회
pub async fn handle_get_item_bids(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<i64>,
) -> MarketResult<Json<Vec<Bid>>> {
    info!(
        "{:<12} --> 상품 입찰 이력 조회 id: {}",
        "HandlerQuery", item_id
    );
    Ok(Json(query::handlers::get_item_bids(&state, item_id).await?))
}

/// 수수료 기록 조회
pub async fn handle_get_commission(
    State(state): State<Arc<AppState>>,
    Path(commission_id): Path<i64>,
) -> MarketResult<Json<CommissionRecord>> {
    info!(
        "{:<12} --> 수수료 기록 조회 id: {}",
        "HandlerQuery", commission_id
    );
    Ok(Json(
        query::handlers::get_commission(&state, commission_id).await?,
    ))
}

/// 경매인 수수료 기록 조회
pub async fn handle_get_auctioneer_commissions(
    State(state): State<Arc<AppState>>,
    Path(auctioneer_id): Path<i64>,
) -> MarketResult<Json<Vec<CommissionRecord>>> {
    Ok(Json(
        query::handlers::list_commissions(&state, auctioneer_id).await?,
    ))
}

/// 미납 수수료 조회
pub async fn handle_get_unpaid_commission(
    State(state): State<Arc<AppState>>,
    Path(auctioneer_id): Path<i64>,
) -> MarketResult<Json<UnpaidCommission>> {
    Ok(Json(
        query::handlers::get_unpaid_commission(&state, auctioneer_id).await?,
    ))
}

/// 사용자 조회
pub async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> MarketResult<Json<User>> {
    Ok(Json(query::handlers::get_user(&state, user_id).await?))
}

/// 낙찰 금액 순위 조회
pub async fn handle_get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> MarketResult<Json<Vec<User>>> {
    info!("{:<12} --> 낙찰 금액 순위 조회", "HandlerQuery");
    Ok(Json(query::handlers::get_leaderboard(&state).await?))
}

// endregion: --- Query Handlers
