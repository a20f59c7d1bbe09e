use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 수수료 검증 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "commission_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionStatus {
    Unverified,
    Verified,
    Rejected,
}

impl CommissionStatus {
    /// 미납 수수료 합계에 포함되는 상태
    pub fn is_outstanding(&self) -> bool {
        match self {
            CommissionStatus::Unverified | CommissionStatus::Rejected => true,
            CommissionStatus::Verified => false,
        }
    }
}

// 수수료 기록 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommissionRecord {
    pub id: i64,
    pub auctioneer_id: i64,
    pub auction_item_id: i64,
    pub amount_owed: i64,
    pub proof_ref: Option<String>,
    pub proof_submitted_at: Option<DateTime<Utc>>,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl CommissionRecord {
    /// 검증 스케줄러가 오라클에 물어봐야 하는 기록인지 확인
    pub fn awaiting_review(&self) -> bool {
        self.proof_submitted_at.is_some() && self.status.is_outstanding()
    }
}

/// 검증 오라클의 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Verified,
    Rejected,
}

impl Verdict {
    pub fn status(&self) -> CommissionStatus {
        match self {
            Verdict::Verified => CommissionStatus::Verified,
            Verdict::Rejected => CommissionStatus::Rejected,
        }
    }
}

/// 검증 판정 적용 요청
/// observed_proof_at 은 오라클 호출 전에 읽은 제출 시각으로, 그 사이 재제출이 있었으면 적용하지 않는다.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub commission_id: i64,
    pub observed_proof_at: DateTime<Utc>,
    pub verdict: Verdict,
    pub reviewed_at: DateTime<Utc>,
}

/// 증빙 제출 결과
#[derive(Debug, Clone)]
pub enum ProofOutcome {
    Submitted(CommissionRecord),
    NotFound,
    AlreadyVerified,
}

/// 경매인별 미납 수수료 현황
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpaidCommission {
    pub auctioneer_id: i64,
    pub outstanding: i64,
    pub can_create_auction: bool,
}

impl UnpaidCommission {
    pub fn new(auctioneer_id: i64, outstanding: i64) -> Self {
        Self {
            auctioneer_id,
            outstanding,
            can_create_auction: outstanding <= 0,
        }
    }
}
