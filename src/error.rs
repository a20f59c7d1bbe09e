/// 도메인 오류
/// 사용자에게 돌려주는 검증 실패는 모두 MarketError 로 표현하고,
/// 저장소 내부 오류는 StoreError 로 감싼다.
// region:    --- Imports
use crate::users::model::{Action, Role};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;
// endregion: --- Imports

// region:    --- Store Error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("데이터베이스 오류: {0}")]
    Database(#[from] sqlx::Error),

    #[error("저장소를 사용할 수 없습니다: {0}")]
    Unavailable(String),

    #[error("저장소 데이터가 손상되었습니다: {0}")]
    Corrupt(String),

    #[error("이미 존재하는 값입니다: {0}")]
    Duplicate(String),
}
// endregion: --- Store Error

// region:    --- Market Error
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("경매를 찾을 수 없습니다.")]
    AuctionNotFound,

    #[error("입찰을 받을 수 있는 경매 상태가 아닙니다.")]
    AuctionNotActive,

    #[error("입찰 금액 {amount} 이(가) 최소 입찰 금액 {minimum} 보다 낮습니다.")]
    BidTooLow { amount: i64, minimum: i64 },

    #[error("자신의 경매에는 입찰할 수 없습니다.")]
    SelfBidRejected,

    #[error("미납 수수료 {outstanding} 이(가) 남아 있어 경매를 등록할 수 없습니다.")]
    CommissionOwed { outstanding: i64 },

    #[error("수수료 기록을 찾을 수 없습니다.")]
    NotFound,

    #[error("이미 검증이 완료된 수수료 기록입니다.")]
    CommissionAlreadyVerified,

    #[error("사용자를 찾을 수 없습니다.")]
    UserNotFound,

    #[error("{} 역할은 {} 을(를) 할 수 없습니다.", .role.as_str(), .action.as_str())]
    Forbidden { role: Role, action: Action },

    #[error("잘못된 요청입니다: {0}")]
    InvalidRequest(String),

    #[error("최대 재시도 횟수 초과")]
    RetriesExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MarketError {
    /// 응답에 실리는 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::AuctionNotFound => "AUCTION_NOT_FOUND",
            MarketError::AuctionNotActive => "AUCTION_NOT_ACTIVE",
            MarketError::BidTooLow { .. } => "BID_TOO_LOW",
            MarketError::SelfBidRejected => "SELF_BID_REJECTED",
            MarketError::CommissionOwed { .. } => "COMMISSION_OWED",
            MarketError::NotFound => "NOT_FOUND",
            MarketError::CommissionAlreadyVerified => "COMMISSION_ALREADY_VERIFIED",
            MarketError::UserNotFound => "USER_NOT_FOUND",
            MarketError::Forbidden { .. } => "FORBIDDEN",
            MarketError::InvalidRequest(_) => "INVALID_REQUEST",
            MarketError::RetriesExhausted => "MAX_RETRIES_EXCEEDED",
            MarketError::Store(StoreError::Unavailable(_)) => "STORE_UNAVAILABLE",
            MarketError::Store(_) => "STORE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            MarketError::AuctionNotFound | MarketError::NotFound | MarketError::UserNotFound => {
                StatusCode::NOT_FOUND
            }
            MarketError::AuctionNotActive
            | MarketError::BidTooLow { .. }
            | MarketError::SelfBidRejected
            | MarketError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MarketError::CommissionOwed { .. }
            | MarketError::CommissionAlreadyVerified
            | MarketError::RetriesExhausted => StatusCode::CONFLICT,
            MarketError::Forbidden { .. } => StatusCode::FORBIDDEN,
            MarketError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            MarketError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{:<12} --> 요청 처리 중 내부 오류: {:?}", "Handler", self);
        }

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        match &self {
            MarketError::BidTooLow { amount, minimum } => {
                body["bid_amount"] = serde_json::json!(amount);
                body["minimum"] = serde_json::json!(minimum);
            }
            MarketError::CommissionOwed { outstanding } => {
                body["outstanding"] = serde_json::json!(outstanding);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
// endregion: --- Market Error

pub type MarketResult<T> = Result<T, MarketError>;

// endregion: --- Tests
