// region:    --- Users
/// 사용자 등록
pub const INSERT_USER: &str = r#"
    INSERT INTO users (user_name, email, role, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, user_name, email, role, unpaid_commission, auctions_won, money_spent, created_at
"#;

/// 사용자 조회
pub const GET_USER: &str = "SELECT id, user_name, email, role, unpaid_commission, auctions_won, money_spent, created_at FROM users WHERE id = $1";

/// 리더보드 조회
pub const GET_LEADERBOARD: &str = r#"
    SELECT id, user_name, email, role, unpaid_commission, auctions_won, money_spent, created_at
    FROM users
    WHERE money_spent > 0
    ORDER BY money_spent DESC, id ASC
"#;

/// 낙찰자 통계 갱신
/// 누계가 BIGINT 범위를 넘으면 갱신하지 않는다.
pub const RECORD_WIN: &str = r#"
    UPDATE users SET auctions_won = auctions_won + 1, money_spent = money_spent + $2
    WHERE id = $1
      AND auctions_won < 9223372036854775807
      AND money_spent <= 9223372036854775807 - $2
"#;

/// 미납 수수료 집계 갱신 (원장에서 다시 계산)
pub const REFRESH_UNPAID_COMMISSION: &str = r#"
    UPDATE users SET unpaid_commission = (
        SELECT COALESCE(SUM(amount_owed), 0)::BIGINT
        FROM commission_records
        WHERE auctioneer_id = $1 AND status <> 'VERIFIED'
    )
    WHERE id = $1
"#;
// endregion: --- Users

// region:    --- Auction Items
/// 미납 수수료가 없을 때만 상품 생성
pub const INSERT_ITEM_IF_CLEAR: &str = r#"
    INSERT INTO auction_items
        (title, description, starting_bid, current_bid, auctioneer_id, commission_rate, start_time, end_time, status, created_at)
    SELECT $1, $2, $3, $3, $4, $5, $6, $7, 'PENDING'::auction_status, $8
    WHERE NOT EXISTS (
        SELECT 1 FROM commission_records
        WHERE auctioneer_id = $4 AND status <> 'VERIFIED'
    )
    RETURNING id, title, description, starting_bid, current_bid, current_bidder_id, current_bid_id,
              auctioneer_id, commission_rate, start_time, end_time, status, created_at
"#;

/// 상품 조회
pub const GET_ITEM: &str = r#"
    SELECT id, title, description, starting_bid, current_bid, current_bidder_id, current_bid_id,
           auctioneer_id, commission_rate, start_time, end_time, status, created_at
    FROM auction_items
    WHERE id = $1
"#;

/// 모든 상품 조회 ($1 이 NULL 이면 전체)
pub const LIST_ITEMS: &str = r#"
    SELECT id, title, description, starting_bid, current_bid, current_bidder_id, current_bid_id,
           auctioneer_id, commission_rate, start_time, end_time, status, created_at
    FROM auction_items
    WHERE $1::auction_status IS NULL OR status = $1
    ORDER BY created_at DESC, id DESC
"#;

/// 조건부 입찰 반영
/// 같은 행에 대한 동시 UPDATE 는 행 잠금으로 직렬화되고, 뒤에 온 쪽은 갱신된 행으로 조건을 다시 평가한다.
/// 증가폭 비교는 뺄셈으로 해서 BIGINT 덧셈 범위를 넘지 않는다.
pub const APPLY_BID: &str = r#"
    UPDATE auction_items
    SET current_bid = $3, current_bidder_id = $2, status = 'ACTIVE'
    WHERE id = $1
      AND status IN ('PENDING', 'ACTIVE')
      AND start_time <= $5
      AND end_time > $5
      AND auctioneer_id <> $2
      AND $3 - current_bid >= $4
    RETURNING id
"#;

/// 최고 입찰 기록 연결
pub const SET_CURRENT_BID_ID: &str = "UPDATE auction_items SET current_bid_id = $2 WHERE id = $1";

/// PENDING -> ACTIVE 상태 변경
pub const ACTIVATE_DUE_ITEMS: &str = r#"
    UPDATE auction_items SET status = 'ACTIVE'
    WHERE status = 'PENDING' AND start_time <= $1
"#;

/// 종료 대상 상품 조회
pub const GET_DUE_ITEM_IDS: &str = r#"
    SELECT id FROM auction_items
    WHERE status = 'ACTIVE' AND end_time <= $1
    ORDER BY end_time ASC, id ASC
"#;

/// ACTIVE -> ENDED 조건부 상태 변경
pub const CLOSE_ITEM: &str = r#"
    UPDATE auction_items SET status = 'ENDED'
    WHERE id = $1 AND status = 'ACTIVE' AND end_time <= $2
    RETURNING id, title, description, starting_bid, current_bid, current_bidder_id, current_bid_id,
              auctioneer_id, commission_rate, start_time, end_time, status, created_at
"#;
// endregion: --- Auction Items

// region:    --- Bids
/// 입찰 기록 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_item_id, bidder_id, amount, placed_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_item_id, bidder_id, amount, placed_at
"#;

/// 상품 입찰 이력 조회
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, auction_item_id, bidder_id, amount, placed_at
    FROM bids
    WHERE auction_item_id = $1
    ORDER BY placed_at DESC, id DESC
"#;
// endregion: --- Bids

// region:    --- Commission Records
/// 수수료 기록 생성 (경매당 최대 하나)
pub const INSERT_COMMISSION: &str = r#"
    INSERT INTO commission_records (auctioneer_id, auction_item_id, amount_owed, status, created_at)
    VALUES ($1, $2, $3, 'UNVERIFIED'::commission_status, $4)
    ON CONFLICT (auction_item_id) DO NOTHING
    RETURNING id, auctioneer_id, auction_item_id, amount_owed, proof_ref, proof_submitted_at, status, created_at, reviewed_at
"#;

/// 수수료 기록 조회
pub const GET_COMMISSION: &str = r#"
    SELECT id, auctioneer_id, auction_item_id, amount_owed, proof_ref, proof_submitted_at, status, created_at, reviewed_at
    FROM commission_records
    WHERE id = $1
"#;

/// 경매인별 수수료 기록 조회
pub const LIST_COMMISSIONS: &str = r#"
    SELECT id, auctioneer_id, auction_item_id, amount_owed, proof_ref, proof_submitted_at, status, created_at, reviewed_at
    FROM commission_records
    WHERE auctioneer_id = $1
    ORDER BY id DESC
"#;

/// 미납 수수료 합계
pub const GET_UNPAID_COMMISSION: &str = r#"
    SELECT COALESCE(SUM(amount_owed), 0)::BIGINT
    FROM commission_records
    WHERE auctioneer_id = $1 AND status <> 'VERIFIED'
"#;

/// 증빙 제출
pub const SUBMIT_PROOF: &str = r#"
    UPDATE commission_records SET proof_ref = $3, proof_submitted_at = $4
    WHERE id = $1 AND auctioneer_id = $2 AND status <> 'VERIFIED'
    RETURNING id, auctioneer_id, auction_item_id, amount_owed, proof_ref, proof_submitted_at, status, created_at, reviewed_at
"#;

/// 검증 대기 증빙 조회
pub const GET_PROOFS_AWAITING_REVIEW: &str = r#"
    SELECT id, auctioneer_id, auction_item_id, amount_owed, proof_ref, proof_submitted_at, status, created_at, reviewed_at
    FROM commission_records
    WHERE proof_submitted_at IS NOT NULL AND status <> 'VERIFIED'
    ORDER BY proof_submitted_at ASC, id ASC
"#;

/// 검증 결과 반영 (거절이면 제출 시각을 비워 재제출을 기다린다)
pub const RESOLVE_COMMISSION: &str = r#"
    UPDATE commission_records
    SET status = $2,
        reviewed_at = $3,
        proof_submitted_at = CASE WHEN $2 = 'REJECTED'::commission_status THEN NULL ELSE proof_submitted_at END
    WHERE id = $1 AND proof_submitted_at = $4 AND status <> 'VERIFIED'
    RETURNING id, auctioneer_id, auction_item_id, amount_owed, proof_ref, proof_submitted_at, status, created_at, reviewed_at
"#;
// endregion: --- Commission Records
