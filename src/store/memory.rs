/// 메모리 저장소
/// 상품마다 별도의 뮤텍스를 두어 서로 다른 상품의 입찰은 서로를 막지 않는다.
/// 사용자와 수수료 기록은 하나의 원장 뮤텍스로 묶는다. 잠금 순서: 상품 -> 원장
// region:    --- Imports
use super::AuctionStore;
use crate::auction::model::{AuctionItem, AuctionStatus, CloseOutcome, NewAuctionItem};
use crate::bidding::model::{check_admission, Bid, BidAttempt};
use crate::commission::model::{CommissionRecord, CommissionStatus, ProofOutcome, Resolution};
use crate::error::StoreError;
use crate::users::model::{NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
// endregion: --- Imports

// region:    --- Memory Store
struct ItemSlot {
    item: AuctionItem,
    bids: Vec<Bid>,
}

#[derive(Default)]
struct Ledger {
    users: HashMap<i64, User>,
    commissions: BTreeMap<i64, CommissionRecord>,
}

impl Ledger {
    fn outstanding(&self, auctioneer_id: i64) -> i64 {
        self.commissions
            .values()
            .filter(|c| c.auctioneer_id == auctioneer_id && c.status.is_outstanding())
            .map(|c| c.amount_owed)
            .sum()
    }

    /// 사용자 집계 필드는 원장에서 다시 계산한다.
    fn refresh_unpaid(&mut self, auctioneer_id: i64) {
        let outstanding = self.outstanding(auctioneer_id);
        if let Some(user) = self.users.get_mut(&auctioneer_id) {
            user.unpaid_commission = outstanding;
        }
    }
}

pub struct MemoryStore {
    items: RwLock<HashMap<i64, Arc<Mutex<ItemSlot>>>>,
    ledger: Mutex<Ledger>,
    next_user_id: AtomicI64,
    next_item_id: AtomicI64,
    next_bid_id: AtomicI64,
    next_commission_id: AtomicI64,
    unavailable: AtomicBool,
    close_failures: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            ledger: Mutex::new(Ledger::default()),
            next_user_id: AtomicI64::new(1),
            next_item_id: AtomicI64::new(1),
            next_bid_id: AtomicI64::new(1),
            next_commission_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
            close_failures: AtomicUsize::new(0),
        }
    }

    /// 저장소 장애 흉내 (모든 연산이 Unavailable 로 실패)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 다음 n 번의 close_item 을 잠금 획득 후, 쓰기 전에 실패시킨다.
    pub fn fail_next_closes(&self, count: usize) {
        self.close_failures.store(count, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("메모리 저장소 장애".to_string()));
        }
        Ok(())
    }

    fn take_close_failure(&self) -> bool {
        self.close_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn slot(&self, item_id: i64) -> Option<Arc<Mutex<ItemSlot>>> {
        self.items.read().await.get(&item_id).cloned()
    }

    async fn all_slots(&self) -> Vec<Arc<Mutex<ItemSlot>>> {
        self.items.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn insert_user(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.lock().await;
        if ledger.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        let user = User {
            id: self.next_user_id.fetch_add(1, Ordering::SeqCst),
            user_name: user.user_name,
            email: user.email,
            role: user.role,
            unpaid_commission: 0,
            auctions_won: 0,
            money_spent: 0,
            created_at: now,
        };
        ledger.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        self.ensure_available()?;
        Ok(self.ledger.lock().await.users.get(&user_id).cloned())
    }

    async fn leaderboard(&self) -> Result<Vec<User>, StoreError> {
        self.ensure_available()?;
        let ledger = self.ledger.lock().await;
        let mut users: Vec<User> = ledger
            .users
            .values()
            .filter(|u| u.money_spent > 0)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.money_spent.cmp(&a.money_spent).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert_item_if_clear(
        &self,
        item: NewAuctionItem,
    ) -> Result<Option<AuctionItem>, StoreError> {
        self.ensure_available()?;
        let ledger = self.ledger.lock().await;
        if ledger.outstanding(item.auctioneer_id) > 0 {
            return Ok(None);
        }

        let item = AuctionItem {
            id: self.next_item_id.fetch_add(1, Ordering::SeqCst),
            title: item.title,
            description: item.description,
            starting_bid: item.starting_bid,
            current_bid: item.starting_bid,
            current_bidder_id: None,
            current_bid_id: None,
            auctioneer_id: item.auctioneer_id,
            commission_rate: item.commission_rate,
            start_time: item.start_time,
            end_time: item.end_time,
            status: AuctionStatus::Pending,
            created_at: item.created_at,
        };
        let slot = ItemSlot {
            item: item.clone(),
            bids: Vec::new(),
        };
        self.items
            .write()
            .await
            .insert(item.id, Arc::new(Mutex::new(slot)));
        drop(ledger);
        Ok(Some(item))
    }

    async fn get_item(&self, item_id: i64) -> Result<Option<AuctionItem>, StoreError> {
        self.ensure_available()?;
        match self.slot(item_id).await {
            Some(slot) => Ok(Some(slot.lock().await.item.clone())),
            None => Ok(None),
        }
    }

    async fn list_items(
        &self,
        status: Option<AuctionStatus>,
    ) -> Result<Vec<AuctionItem>, StoreError> {
        self.ensure_available()?;
        let mut items = Vec::new();
        for slot in self.all_slots().await {
            let item = slot.lock().await.item.clone();
            if status.map_or(true, |s| s == item.status) {
                items.push(item);
            }
        }
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn list_bids(&self, item_id: i64) -> Result<Vec<Bid>, StoreError> {
        self.ensure_available()?;
        let Some(slot) = self.slot(item_id).await else {
            return Ok(Vec::new());
        };
        let mut bids = slot.lock().await.bids.clone();
        bids.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));
        Ok(bids)
    }

    async fn commit_bid(&self, attempt: BidAttempt) -> Result<Option<Bid>, StoreError> {
        self.ensure_available()?;
        let Some(slot) = self.slot(attempt.auction_item_id).await else {
            return Ok(None);
        };
        let mut slot = slot.lock().await;
        if check_admission(
            &slot.item,
            attempt.bidder_id,
            attempt.amount,
            attempt.placed_at,
            attempt.min_increment,
        )
        .is_err()
        {
            return Ok(None);
        }

        let bid = Bid {
            id: self.next_bid_id.fetch_add(1, Ordering::SeqCst),
            auction_item_id: attempt.auction_item_id,
            bidder_id: attempt.bidder_id,
            amount: attempt.amount,
            placed_at: attempt.placed_at,
        };
        slot.item.current_bid = bid.amount;
        slot.item.current_bidder_id = Some(bid.bidder_id);
        slot.item.current_bid_id = Some(bid.id);
        slot.item.status = AuctionStatus::Active;
        slot.bids.push(bid.clone());
        Ok(Some(bid))
    }

    async fn activate_due_items(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let mut activated = 0;
        for slot in self.all_slots().await {
            let mut slot = slot.lock().await;
            if slot.item.status == AuctionStatus::Pending && slot.item.start_time <= now {
                slot.item.status = AuctionStatus::Active;
                activated += 1;
            }
        }
        Ok(activated)
    }

    async fn due_item_ids(&self, now: DateTime<Utc>) -> Result<Vec<i64>, StoreError> {
        self.ensure_available()?;
        let mut due = Vec::new();
        for slot in self.all_slots().await {
            let slot = slot.lock().await;
            if slot.item.is_due_at(now) {
                due.push((slot.item.end_time, slot.item.id));
            }
        }
        due.sort();
        Ok(due.into_iter().map(|(_, id)| id).collect())
    }

    async fn close_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<CloseOutcome>, StoreError> {
        self.ensure_available()?;
        let Some(slot) = self.slot(item_id).await else {
            return Ok(None);
        };
        let mut slot = slot.lock().await;
        if !slot.item.is_due_at(now) {
            return Ok(None);
        }
        let mut ledger = self.ledger.lock().await;
        if self.take_close_failure() {
            return Err(StoreError::Unavailable(format!(
                "경매 {} 종료 중 저장소 장애",
                item_id
            )));
        }

        // 모든 검증과 계산을 마친 뒤에 쓰기 시작한다.
        let settlement = slot.item.settlement();
        let mut winner_totals = None;
        if let Some(settlement) = &settlement {
            let Some(winner) = ledger.users.get(&settlement.winner_id) else {
                return Err(StoreError::Corrupt(format!(
                    "낙찰자 {} 를 찾을 수 없습니다",
                    settlement.winner_id
                )));
            };
            let won = winner.auctions_won.checked_add(1);
            let spent = winner.money_spent.checked_add(settlement.final_bid);
            let (Some(won), Some(spent)) = (won, spent) else {
                return Err(StoreError::Corrupt(format!(
                    "낙찰자 {} 의 누계가 범위를 넘습니다",
                    settlement.winner_id
                )));
            };
            winner_totals = Some((won, spent));
        }
        let already_recorded = ledger
            .commissions
            .values()
            .any(|c| c.auction_item_id == item_id);

        slot.item.status = AuctionStatus::Ended;
        let mut commission = None;
        if let Some(settlement) = settlement {
            if let (Some(winner), Some((won, spent))) =
                (ledger.users.get_mut(&settlement.winner_id), winner_totals)
            {
                winner.auctions_won = won;
                winner.money_spent = spent;
            }
            if !already_recorded {
                let record = CommissionRecord {
                    id: self.next_commission_id.fetch_add(1, Ordering::SeqCst),
                    auctioneer_id: slot.item.auctioneer_id,
                    auction_item_id: item_id,
                    amount_owed: settlement.commission_owed,
                    proof_ref: None,
                    proof_submitted_at: None,
                    status: CommissionStatus::Unverified,
                    created_at: now,
                    reviewed_at: None,
                };
                ledger.commissions.insert(record.id, record.clone());
                ledger.refresh_unpaid(slot.item.auctioneer_id);
                commission = Some(record);
            }
        }
        debug!("{:<12} --> 메모리 저장소 경매 종료: {}", "Store", item_id);

        Ok(Some(CloseOutcome {
            item: slot.item.clone(),
            commission,
        }))
    }

    async fn get_commission(
        &self,
        commission_id: i64,
    ) -> Result<Option<CommissionRecord>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .ledger
            .lock()
            .await
            .commissions
            .get(&commission_id)
            .cloned())
    }

    async fn list_commissions(
        &self,
        auctioneer_id: i64,
    ) -> Result<Vec<CommissionRecord>, StoreError> {
        self.ensure_available()?;
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .commissions
            .values()
            .rev()
            .filter(|c| c.auctioneer_id == auctioneer_id)
            .cloned()
            .collect())
    }

    async fn unpaid_commission(&self, auctioneer_id: i64) -> Result<i64, StoreError> {
        self.ensure_available()?;
        Ok(self.ledger.lock().await.outstanding(auctioneer_id))
    }

    async fn submit_proof(
        &self,
        commission_id: i64,
        auctioneer_id: i64,
        proof_ref: String,
        now: DateTime<Utc>,
    ) -> Result<ProofOutcome, StoreError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.lock().await;
        let Some(record) = ledger
            .commissions
            .get_mut(&commission_id)
            .filter(|c| c.auctioneer_id == auctioneer_id)
        else {
            return Ok(ProofOutcome::NotFound);
        };
        if !record.status.is_outstanding() {
            return Ok(ProofOutcome::AlreadyVerified);
        }
        record.proof_ref = Some(proof_ref);
        record.proof_submitted_at = Some(now);
        Ok(ProofOutcome::Submitted(record.clone()))
    }

    async fn proofs_awaiting_review(&self) -> Result<Vec<CommissionRecord>, StoreError> {
        self.ensure_available()?;
        let ledger = self.ledger.lock().await;
        let mut records: Vec<CommissionRecord> = ledger
            .commissions
            .values()
            .filter(|c| c.awaiting_review())
            .cloned()
            .collect();
        records.sort_by_key(|c| (c.proof_submitted_at, c.id));
        Ok(records)
    }

    async fn resolve_commission(
        &self,
        resolution: Resolution,
    ) -> Result<Option<CommissionRecord>, StoreError> {
        self.ensure_available()?;
        let mut ledger = self.ledger.lock().await;
        let Some(record) = ledger.commissions.get_mut(&resolution.commission_id) else {
            return Ok(None);
        };
        if record.proof_submitted_at != Some(resolution.observed_proof_at)
            || !record.status.is_outstanding()
        {
            return Ok(None);
        }

        record.status = resolution.verdict.status();
        record.reviewed_at = Some(resolution.reviewed_at);
        if record.status == CommissionStatus::Rejected {
            record.proof_submitted_at = None;
        }
        let record = record.clone();
        ledger.refresh_unpaid(record.auctioneer_id);
        Ok(Some(record))
    }
}
// endregion: --- Memory Store

// endregion: --- Tests
