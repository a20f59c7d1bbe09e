// region:    --- Imports
use auction_marketplace::clock::{Clock, SystemClock};
use auction_marketplace::commission::oracle::HttpVerificationOracle;
use auction_marketplace::config::{MarketConfig, StorageBackend};
use auction_marketplace::database::DatabaseManager;
use auction_marketplace::handlers;
use auction_marketplace::scheduler::{ClosingScheduler, VerificationScheduler};
use auction_marketplace::state::AppState;
use auction_marketplace::store::{AuctionStore, MemoryStore, PostgresStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = MarketConfig::from_env()?;
    info!("{:<12} --> 설정 로드 완료: {:?}", "Main", config.storage);

    // 저장소 선택
    let store: Arc<dyn AuctionStore> = match config.storage {
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let db_manager =
                Arc::new(DatabaseManager::connect(url, config.database_max_connections).await?);

            // 데이터베이스 초기화
            if let Err(e) = db_manager.initialize_database(config.reset_database).await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(PostgresStore::new(db_manager))
        }
        StorageBackend::Memory => {
            warn!(
                "{:<12} --> 메모리 저장소 사용: 재시작하면 모든 데이터가 사라집니다",
                "Main"
            );
            Arc::new(MemoryStore::new())
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let oracle = Arc::new(HttpVerificationOracle::new(
        config.oracle_url.clone(),
        config.oracle_timeout,
    )?);

    // 스케줄러 시작
    let shutdown = CancellationToken::new();
    let closing = Arc::new(ClosingScheduler::new(Arc::clone(&store), Arc::clone(&clock)))
        .start(config.closing_interval, shutdown.child_token());
    let verification = Arc::new(VerificationScheduler::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        oracle,
    ))
    .start(config.verification_interval, shutdown.child_token());

    let state = Arc::new(AppState::new(store, clock, config.rules));
    let routes_all = handlers::routes(state);

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // Ctrl-C 수신 시 종료 신호 전파
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("{:<12} --> 종료 신호 대기 실패: {}", "Main", e);
        }
        info!("{:<12} --> 종료 신호 수신", "Main");
        signal.cancel();
    });

    // 서버 실행
    let server_shutdown = shutdown.clone();
    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    shutdown.cancel();
    let (closing, verification) = tokio::join!(closing, verification);
    for (name, result) in [("경매 종료", closing), ("수수료 검증", verification)] {
        if let Err(e) = result {
            error!("{:<12} --> {} 스케줄러 비정상 종료: {}", "Main", name, e);
        }
    }
    info!("{:<12} --> 서버 종료", "Main");
    Ok(())
}
// endregion: --- Main
