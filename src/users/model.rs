use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Auctioneer,
    Bidder,
    SuperAdmin,
}

/// 역할별로 허용되는 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateAuction,
    PlaceBid,
    SubmitCommissionProof,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateAuction => "create-auction",
            Action::PlaceBid => "place-bid",
            Action::SubmitCommissionProof => "submit-commission-proof",
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Auctioneer => "AUCTIONEER",
            Role::Bidder => "BIDDER",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// 경매 등록과 수수료 증빙은 경매인만, 입찰은 입찰자만 할 수 있다.
    pub fn permits(&self, action: Action) -> bool {
        match (self, action) {
            (Role::Auctioneer, Action::CreateAuction) => true,
            (Role::Auctioneer, Action::SubmitCommissionProof) => true,
            (Role::Auctioneer, Action::PlaceBid) => false,
            (Role::Bidder, Action::PlaceBid) => true,
            (Role::Bidder, Action::CreateAuction | Action::SubmitCommissionProof) => false,
            (Role::SuperAdmin, _) => false,
        }
    }
}

// 사용자 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    pub unpaid_commission: i64,
    pub auctions_won: i64,
    pub money_spent: i64,
    pub created_at: DateTime<Utc>,
}

// 신규 사용자
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub role: Role,
}
