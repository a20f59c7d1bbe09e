/// 사용자 등록 커맨드 처리
// region:    --- Imports
use crate::error::{MarketError, StoreError};
use crate::state::AppState;
use crate::users::model::{NewUser, Role, User};
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Commands
/// 사용자 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegisterUserCommand {
    pub user_name: String,
    pub email: String,
    pub role: Role,
}

impl RegisterUserCommand {
    fn validate(&self) -> Result<(), MarketError> {
        if self.user_name.trim().is_empty() {
            return Err(MarketError::InvalidRequest(
                "사용자 이름을 입력해야 합니다.".to_string(),
            ));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(MarketError::InvalidRequest(format!(
                "올바른 이메일 형식이 아닙니다: {}",
                email
            ))),
        }
    }
}

/// 사용자 등록
pub async fn handle_register_user(
    cmd: RegisterUserCommand,
    state: &AppState,
) -> Result<User, MarketError> {
    info!("{:<12} --> 사용자 등록 요청 처리 시작: {:?}", "Command", cmd);
    cmd.validate()?;

    let new_user = NewUser {
        user_name: cmd.user_name.trim().to_string(),
        email: cmd.email.trim().to_string(),
        role: cmd.role,
    };
    match state.store.insert_user(new_user, state.clock.now()).await {
        Ok(user) => {
            info!("{:<12} --> 사용자 등록 성공: id={}", "Command", user.id);
            Ok(user)
        }
        Err(StoreError::Duplicate(_)) => Err(MarketError::InvalidRequest(
            "이미 등록된 이메일입니다.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}
// endregion: --- Commands

// endregion: --- Tests
