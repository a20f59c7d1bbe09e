use crate::clock::Clock;
use crate::config::MarketRules;
use crate::store::AuctionStore;
use std::sync::Arc;

/// 핸들러와 커맨드가 공유하는 상태
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub clock: Arc<dyn Clock>,
    pub rules: MarketRules,
}

impl AppState {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>, rules: MarketRules) -> Self {
        Self {
            store,
            clock,
            rules,
        }
    }
}
