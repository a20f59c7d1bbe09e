/// 경매 등록 커맨드 처리
/// 미납 수수료가 있는 경매인은 새 경매를 등록할 수 없다.
// region:    --- Imports
use crate::auction::model::{AuctionItem, NewAuctionItem, MAX_AMOUNT};
use crate::commission::commands::can_create_auction;
use crate::error::MarketError;
use crate::state::AppState;
use crate::users::authorize;
use crate::users::model::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 경매 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateAuctionCommand {
    pub auctioneer_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starting_bid: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl CreateAuctionCommand {
    fn validate(&self, now: DateTime<Utc>) -> Result<(), MarketError> {
        if self.title.trim().is_empty() {
            return Err(MarketError::InvalidRequest(
                "상품명을 입력해야 합니다.".to_string(),
            ));
        }
        if self.starting_bid <= 0 {
            return Err(MarketError::InvalidRequest(
                "시작 가격은 0보다 커야 합니다.".to_string(),
            ));
        }
        if self.starting_bid > MAX_AMOUNT {
            return Err(MarketError::InvalidRequest(format!(
                "시작 가격은 {} 을(를) 넘을 수 없습니다.",
                MAX_AMOUNT
            )));
        }
        if self.start_time < now {
            return Err(MarketError::InvalidRequest(
                "경매 시작 시간은 현재 시간 이후여야 합니다.".to_string(),
            ));
        }
        if self.end_time <= self.start_time {
            return Err(MarketError::InvalidRequest(
                "경매 종료 시간은 시작 시간 이후여야 합니다.".to_string(),
            ));
        }
        Ok(())
    }
}

/// 경매 등록
pub async fn handle_create_auction(
    cmd: CreateAuctionCommand,
    state: &AppState,
) -> Result<AuctionItem, MarketError> {
    info!("{:<12} --> 경매 등록 요청 처리 시작: {:?}", "Command", cmd);

    authorize(state, cmd.auctioneer_id, Action::CreateAuction).await?;
    let now = state.clock.now();
    cmd.validate(now)?;

    let unpaid = can_create_auction(state, cmd.auctioneer_id).await?;
    if !unpaid.can_create_auction {
        return Err(MarketError::CommissionOwed {
            outstanding: unpaid.outstanding,
        });
    }

    let new_item = NewAuctionItem {
        title: cmd.title.trim().to_string(),
        description: cmd.description,
        starting_bid: cmd.starting_bid,
        auctioneer_id: cmd.auctioneer_id,
        commission_rate: state.rules.commission_rate,
        start_time: cmd.start_time,
        end_time: cmd.end_time,
        created_at: now,
    };
    match state.store.insert_item_if_clear(new_item).await? {
        Some(item) => {
            info!("{:<12} --> 경매 등록 성공: id={}", "Command", item.id);
            Ok(item)
        }
        None => {
            // 확인과 등록 사이에 수수료가 새로 생긴 경우
            warn!(
                "{:<12} --> 등록 직전에 미납 수수료 발생: auctioneer={}",
                "Command", cmd.auctioneer_id
            );
            let outstanding = state.store.unpaid_commission(cmd.auctioneer_id).await?;
            Err(MarketError::CommissionOwed { outstanding })
        }
    }
}
// endregion: --- Commands

// endregion: --- Tests
