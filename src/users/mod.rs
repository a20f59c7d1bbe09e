pub mod commands;
pub mod model;

use crate::error::MarketError;
use crate::state::AppState;
use model::{Action, User};

/// 사용자 조회 후 역할 권한 확인
pub async fn authorize(state: &AppState, user_id: i64, action: Action) -> Result<User, MarketError> {
    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or(MarketError::UserNotFound)?;
    if !user.role.permits(action) {
        return Err(MarketError::Forbidden {
            role: user.role,
            action,
        });
    }
    Ok(user)
}
