/// 수수료 납부 증빙 검증 오라클
/// 외부 검증 서비스에 증빙을 보내고 검증/거절 판정을 받는다.
// region:    --- Imports
use crate::commission::model::{CommissionRecord, Verdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
// endregion: --- Imports

// region:    --- Oracle Error
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("검증 서비스 요청 실패: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("검증 서비스 응답 시간 초과")]
    Timeout,

    #[error("제출된 증빙이 없습니다")]
    MissingProof,

    #[error("검증 서비스 응답이 올바르지 않습니다: {0}")]
    BadResponse(String),
}

impl OracleError {
    fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else if err.is_decode() {
            OracleError::BadResponse(err.to_string())
        } else {
            OracleError::Transport(err)
        }
    }
}
// endregion: --- Oracle Error

// region:    --- Verification Oracle
#[async_trait]
pub trait VerificationOracle: Send + Sync {
    async fn verify(&self, record: &CommissionRecord) -> Result<Verdict, OracleError>;
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    commission_id: i64,
    auctioneer_id: i64,
    auction_item_id: i64,
    amount_owed: i64,
    proof_ref: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verified: bool,
}

/// HTTP 검증 오라클
/// `POST {url}` 로 증빙을 보내고 `{"verified": bool}` 응답을 기대한다.
pub struct HttpVerificationOracle {
    client: reqwest::Client,
    url: String,
}

impl HttpVerificationOracle {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl VerificationOracle for HttpVerificationOracle {
    async fn verify(&self, record: &CommissionRecord) -> Result<Verdict, OracleError> {
        let proof_ref = record
            .proof_ref
            .as_deref()
            .ok_or(OracleError::MissingProof)?;
        debug!(
            "{:<12} --> 증빙 검증 요청: commission={}",
            "Oracle", record.id
        );

        let response = self
            .client
            .post(&self.url)
            .json(&VerifyRequest {
                commission_id: record.id,
                auctioneer_id: record.auctioneer_id,
                auction_item_id: record.auction_item_id,
                amount_owed: record.amount_owed,
                proof_ref,
            })
            .send()
            .await
            .map_err(OracleError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::BadResponse(format!("HTTP {}", status)));
        }
        let body: VerifyResponse = response.json().await.map_err(OracleError::from_request)?;

        let verdict = if body.verified {
            Verdict::Verified
        } else {
            Verdict::Rejected
        };
        info!(
            "{:<12} --> 증빙 검증 결과: commission={}, {:?}",
            "Oracle", record.id, verdict
        );
        Ok(verdict)
    }
}
// endregion: --- Verification Oracle

// endregion: --- Tests
