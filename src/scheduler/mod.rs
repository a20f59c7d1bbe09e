/// 주기 작업 스케줄러
/// 경매 종료 스윕과 수수료 검증 스윕은 요청 처리와 무관하게 각자의 주기로 돈다.
// region:    --- Imports
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
pub mod closing;
pub mod verification;

pub use closing::{ClosingReport, ClosingScheduler};
pub use verification::{VerificationReport, VerificationScheduler};
// endregion: --- Modules

// region:    --- Periodic Task
/// 취소될 때까지 period 마다 cycle 을 실행한다.
/// 한 주기가 길어지면 다음 주기는 그만큼 밀린다 (겹쳐 실행되지 않음).
/// 각 주기는 별도 태스크에서 돌므로 한 주기가 panic 해도 루프는 계속된다.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut cycle: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "{:<12} --> {} 시작 (주기 {:?})",
            "Scheduler", name, period
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = tokio::spawn(cycle()).await {
                        error!("{:<12} --> {} 주기 비정상 종료: {}", "Scheduler", name, e);
                    }
                }
            }
        }
        info!("{:<12} --> {} 종료", "Scheduler", name);
    })
}
// endregion: --- Periodic Task

// endregion: --- Tests
