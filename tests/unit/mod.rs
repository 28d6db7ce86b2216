//! End-to-end coverage of the dispatcher's `ProcessOrder` path and the
//! quantified invariants from the design notes: order-id monotonicity,
//! settlement conservation, no-self-cross, book monotonicity on a match,
//! and cancel idempotence.

use dex_order_core::{Account, AssetKey, EngineContext, EngineError, Operation, Order, OrderEffect, Price, dispatch};
use dex_order_core::book::OrderBookStore;
use dex_order_core::fee::FeeConfig;
use dex_order_core::order::{OrderFlags, generate_order_id, parse_order_id};

fn ctx(block_num: u64) -> EngineContext {
    EngineContext::in_memory(FeeConfig::new(0), block_num, 0)
}

fn insert_resting(ctx: &mut EngineContext, seller: &str, id: &str, selling: AssetKey, buying: AssetKey, amount: i64, price: Price) {
    ctx.book
        .insert(Order {
            seller: seller.to_string(),
            order_id: id.to_string(),
            selling,
            buying,
            amount,
            price,
            fee_percent: 0,
            flags: OrderFlags::empty(),
            tx_hash: "resting".to_string(),
            op_index: 0,
            last_modified_block: 1,
        })
        .unwrap();
}

fn process(
    ctx: &mut EngineContext,
    source: &str,
    order_id: Option<&str>,
    selling: AssetKey,
    buying: AssetKey,
    amount: i64,
    price: Price,
    passive: bool,
) -> Result<dex_order_core::OperationResult, EngineError> {
    let op = Operation::ProcessOrder {
        source: source.to_string(),
        order_id: order_id.map(str::to_string),
        selling,
        buying,
        amount,
        price,
        fee_percent: 0,
        passive,
        tx_hash: "taker".to_string(),
        op_index: 0,
    };
    dispatch(&op, ctx)
}

// --- S1: simple full fill ---------------------------------------------------

#[test]
fn s1_simple_full_fill_conserves_balances() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("B", 1_000));
    let mut a = Account::new("A", 10);
    a.set_asset(sheep.clone(), dex_order_core::asset::AssetStore::new(50));
    ctx.accounts.add_entry(a);
    insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

    let result = process(&mut ctx, "A", None, sheep.clone(), wheat.clone(), 50, Price::new(2, 1), false).unwrap();

    assert_eq!(result.order_effect, Some(OrderEffect::Deleted));
    assert_eq!(result.orders_claimed.len(), 1);
    let claim = &result.orders_claimed[0];
    assert_eq!(claim.order_id, "I1");
    assert_eq!(claim.amount_sold, 100);
    assert_eq!(claim.amount_bought, 50);

    let a = ctx.accounts.get_entry("A").unwrap();
    let b = ctx.accounts.get_entry("B").unwrap();
    assert_eq!(a.balance, 110);
    assert_eq!(a.get_asset(&sheep).unwrap().amount, 0);
    assert_eq!(b.balance, 900);
    assert_eq!(b.get_asset(&sheep).unwrap().amount, 50);
    assert!(ctx.book.load_order("B", "I1").is_none());
}

// --- S2: partial fill and rest ----------------------------------------------

#[test]
fn s2_partial_fill_inserts_residual() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("B", 1_000));
    let mut a = Account::new("A", 10);
    a.set_asset(sheep.clone(), dex_order_core::asset::AssetStore::new(500));
    ctx.accounts.add_entry(a);
    insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

    let result = process(&mut ctx, "A", None, sheep.clone(), wheat.clone(), 200, Price::new(2, 1), false).unwrap();

    assert_eq!(result.orders_claimed.len(), 1);
    assert_eq!(result.orders_claimed[0].amount_sold, 100);
    assert_eq!(result.orders_claimed[0].amount_bought, 50);

    assert_eq!(result.order_effect, Some(OrderEffect::Created));
    let residual = result.order.expect("residual order attached");
    assert_eq!(residual.amount, 150);
    assert!(ctx.book.load_order("A", &residual.order_id).is_some());
}

// --- S3: passive order refuses to cross at the exact limit price -----------

#[test]
fn s3_passive_blocks_equal_price_cross() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("B", 1_000));
    let mut a = Account::new("A", 10);
    a.set_asset(sheep.clone(), dex_order_core::asset::AssetStore::new(50));
    ctx.accounts.add_entry(a);
    insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

    let result = process(&mut ctx, "A", None, sheep, wheat, 50, Price::new(2, 1), true).unwrap();

    assert!(result.orders_claimed.is_empty());
    assert_eq!(result.order_effect, Some(OrderEffect::Created));
    assert!(ctx.book.load_order("B", "I1").is_some());
}

// --- S4: self-cross stops the match and is reported, never silently fixed --
//
// The source's cross-loop filter returns `Stop` (not `Skip`) on a
// counter-seller equal to the taker, setting the cross-self result code
// first (`operation_frm.cpp`, the filter closure passed to
// `ConvertWithOrders`). That is the ground truth this core follows; a
// looser reading of the scenario table ("I1 skipped, I2 taken") would
// require `Skip` and contradicts the preserved-bug note, so the match
// halts at I1 and the operation fails with `OrderCrossSelf` — nothing
// is claimed, and I2 is never reached.
#[test]
fn s4_self_cross_stops_and_reports_cross_self() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("C", 1_000));
    // The taker is A, and A also has a resting order (I1) in the book.
    let mut a = Account::new("A", 1_000);
    a.set_asset(sheep.clone(), dex_order_core::asset::AssetStore::new(500));
    ctx.accounts.add_entry(a);

    insert_resting(&mut ctx, "A", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));
    insert_resting(&mut ctx, "C", "I2", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

    let result = process(&mut ctx, "A", None, sheep, wheat, 200, Price::new(2, 1), false);
    assert!(matches!(result, Err(EngineError::OrderCrossSelf)));

    // Neither resting order nor account state changed: the operation's
    // failure aborted before any book or balance mutation landed.
    assert!(ctx.book.load_order("A", "I1").is_some());
    assert!(ctx.book.load_order("C", "I2").is_some());
}

// --- S5: cancel --------------------------------------------------------------

#[test]
fn s5_cancel_deletes_with_no_trail() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("A", 10));
    insert_resting(&mut ctx, "A", "I1", sheep.clone(), wheat.clone(), 100, Price::new(1, 2));

    let result = process(&mut ctx, "A", Some("I1"), sheep, wheat, 0, Price::new(1, 2), false).unwrap();

    assert_eq!(result.order_effect, Some(OrderEffect::Deleted));
    assert!(result.orders_claimed.is_empty());
    assert!(ctx.book.load_order("A", "I1").is_none());
}

#[test]
fn cancel_on_missing_order_fails_not_fount() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("A", 10));

    let result = process(&mut ctx, "A", Some("ghost"), sheep, wheat, 0, Price::new(1, 2), false);
    assert!(matches!(result, Err(EngineError::OrderNotFount { .. })));
}

// --- Invariant: order-id is strictly monotone in (block, tx, op) -----------

#[test]
fn order_id_is_strictly_monotone() {
    let a = generate_order_id(10, 2, 0);
    let b = generate_order_id(10, 2, 1);
    let c = generate_order_id(10, 3, 0);
    let d = generate_order_id(11, 0, 0);
    assert!(a < b && b < c && c < d);
    assert_eq!(parse_order_id(&a), Some((10, 2, 0)));
}

// --- Invariant: committing an Environment persists across a fresh one ------

#[test]
fn committing_a_fill_persists_across_a_fresh_context() {
    use dex_order_core::book::memory::MemoryOrderBook;
    use dex_order_core::kv::MemoryKvStore;
    use std::sync::Arc;

    let store: Arc<dyn dex_order_core::kv::KvStore> = Arc::new(MemoryKvStore::new());
    let mut ctx = EngineContext::new(FeeConfig::new(0), store.clone(), Box::new(MemoryOrderBook::new()), 5, 0);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("B", 1_000));
    let mut a = Account::new("A", 10);
    a.set_asset(sheep.clone(), dex_order_core::asset::AssetStore::new(50));
    ctx.accounts.add_entry(a);
    insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

    process(&mut ctx, "A", None, sheep, wheat, 50, Price::new(2, 1), false).unwrap();
    ctx.commit();

    // A second, fresh Environment over the same backing store sees the
    // committed balances.
    let ctx2 = EngineContext::new(FeeConfig::new(0), store, Box::new(MemoryOrderBook::new()), 6, 0);
    let b = ctx2.accounts.get_entry("B").unwrap();
    assert_eq!(b.balance, 900);
}

// --- Invariant: book stays well-ordered by (price, order_id) after a match -

#[test]
fn book_remains_price_time_ordered_after_a_partial_match() {
    let mut ctx = ctx(5);
    let wheat = AssetKey::native();
    let sheep = AssetKey::issued("issuer", "USD", false);
    ctx.accounts.add_entry(Account::new("B", 1_000));
    ctx.accounts.add_entry(Account::new("C", 1_000));
    insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 40, Price::new(1, 2));
    insert_resting(&mut ctx, "C", "I2", wheat.clone(), sheep.clone(), 40, Price::new(1, 2));
    ctx.accounts.add_entry(Account::new("D", 1_000));
    insert_resting(&mut ctx, "D", "I3", wheat.clone(), sheep.clone(), 40, Price::new(2, 3));

    let mut a = Account::new("A", 10);
    a.set_asset(sheep.clone(), dex_order_core::asset::AssetStore::new(500));
    ctx.accounts.add_entry(a);

    process(&mut ctx, "A", None, sheep.clone(), wheat.clone(), 30, Price::new(2, 1), false).unwrap();

    let page = ctx.book.load_best(10, 0, &wheat, &sheep);
    for pair in page.windows(2) {
        let l = &pair[0];
        let r = &pair[1];
        let cmp = dex_order_core::price::price_cmp(&l.price, &r.price);
        assert!(cmp != std::cmp::Ordering::Greater || l.order_id <= r.order_id);
    }
}
