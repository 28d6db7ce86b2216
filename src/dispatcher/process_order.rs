//! `ProcessOrder`: validation, cancel/update/insert shape selection,
//! self-trade prevention, and post-match settlement of the taker's
//! remainder.
//!
//! Ground truth: `bumo::OperationFrm::ProcessOrder`/`CheckOrderVaild`/
//! `BuildOrder` (`operation_frm.cpp` lines ~1034-1313). The self-trade
//! filter's `Stop`-on-cross-self branch is a preserved quirk (spec §9
//! Open Question 2, marked in the original with its own puzzled comment)
//! — a correct reimplementation would plausibly `Skip` instead, but this
//! core keeps the original behavior.

use super::{OperationResult, OrderEffect, Operation, ok};
use crate::book::FilterDecision;
use crate::context::EngineContext;
use crate::error::{EngineError, ResultCode};
use crate::matcher::OrderMatcher;
use crate::order::{Order, OrderFlags, generate_order_id};
use crate::price::{Price, big_divide, price_cmp};
use crate::utils::Rounding;
use std::cmp::Ordering;

pub fn process_order(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::ProcessOrder {
        source, order_id, selling, buying, amount, price, fee_percent, passive, tx_hash, op_index,
    } = op
    else {
        unreachable!()
    };

    // --- CheckOrderVaild -------------------------------------------------
    if *amount != 0 {
        if !selling.is_native() {
            let account = ctx.accounts.get_entry(source).ok_or_else(|| EngineError::AccountNotExist(source.clone()))?;
            let store = account.get_asset(selling).ok_or_else(|| {
                EngineError::AssetInvalid(format!("account {source} does not hold asset {selling:?}"))
            })?;
            if store.amount == 0 {
                return Err(EngineError::AccountAssetLowReserve {
                    address: source.clone(),
                    asset: selling.clone(),
                    amount: 0,
                    requested: *amount,
                });
            }
        }
    }

    // --- shape selection --------------------------------------------------
    let creating_new_order;
    let mut working: Order;

    if let Some(id) = order_id {
        let existing = ctx
            .book
            .load_order(source, id)
            .ok_or_else(|| EngineError::OrderNotFount { seller: source.clone(), order_id: id.clone() })?;
        creating_new_order = false;
        working = Order {
            seller: source.clone(),
            order_id: existing.order_id.clone(),
            selling: selling.clone(),
            buying: buying.clone(),
            amount: *amount,
            price: *price,
            fee_percent: *fee_percent,
            flags: existing.flags,
            tx_hash: tx_hash.clone(),
            op_index: existing.op_index,
            last_modified_block: ctx.block_num,
        };
    } else {
        creating_new_order = true;
        let mut flags = OrderFlags::empty();
        if *passive {
            flags |= OrderFlags::PASSIVE;
        }
        working = Order {
            seller: source.clone(),
            order_id: String::new(),
            selling: selling.clone(),
            buying: buying.clone(),
            amount: *amount,
            price: *price,
            fee_percent: *fee_percent,
            flags,
            tx_hash: tx_hash.clone(),
            op_index: *op_index,
            last_modified_block: ctx.block_num,
        };
    }

    let passive = working.is_passive();
    let mut max_sheep_send = working.amount;
    let mut result = ok();

    if *amount == 0 {
        // cancel: skip matching entirely.
        working.amount = 0;
    } else {
        let max_amount_sheep_can_sell = if selling.is_native() {
            let account = ctx.accounts.get_entry(source).ok_or_else(|| EngineError::AccountNotExist(source.clone()))?;
            account.balance_above_reserve(ctx.fee_config.base_reserve)
        } else {
            ctx.accounts
                .get_entry(source)
                .and_then(|a| a.get_asset(selling).cloned())
                .map(|s| s.amount)
                .unwrap_or(0)
        };

        let max_wheat_can_buy = i64::MAX;
        let max_sheep_based_wheat =
            big_divide(max_wheat_can_buy, i64::from(price.d), i64::from(price.n), Rounding::Down).unwrap_or(i64::MAX);
        let max_amount_sheep_can_sell = max_amount_sheep_can_sell.min(max_sheep_based_wheat);
        max_sheep_send = max_sheep_send.min(max_amount_sheep_can_sell);

        let max_wheat_price = Price::new(price.d, price.n);
        let taker_order_id = working.order_id.clone();
        let taker_source = source.clone();
        let mut cross_self_detected = false;

        if max_sheep_send > 0 {
            let env = &ctx.accounts;
            let book = ctx.book.as_ref();
            let mut matcher = OrderMatcher::new(env, book, &ctx.fee_config);

            let (_convert_result, sheep_sent, wheat_received) = matcher.convert_with_orders(
                selling,
                max_sheep_send,
                buying,
                max_wheat_can_buy,
                |resting: &Order| {
                    if !taker_order_id.is_empty() && resting.order_id == taker_order_id {
                        return FilterDecision::Skip;
                    }
                    let cmp = price_cmp(&resting.price, &max_wheat_price);
                    if (passive && cmp != Ordering::Less) || cmp == Ordering::Greater {
                        return FilterDecision::Stop;
                    }
                    if resting.seller == taker_source {
                        cross_self_detected = true;
                        return FilterDecision::Stop;
                    }
                    FilterDecision::Keep
                },
            )?;

            if cross_self_detected {
                return Err(EngineError::OrderCrossSelf);
            }

            result.orders_claimed = matcher.into_trail();

            if wheat_received > 0 {
                let mut src = ctx
                    .accounts
                    .get_entry(source)
                    .ok_or_else(|| EngineError::AccountNotExist(source.clone()))?;
                src.settle(buying, wheat_received, ctx.fee_config.base_reserve)?;
                src.settle(selling, -sheep_sent, ctx.fee_config.base_reserve)?;
                ctx.accounts.set_entry(src);
            }

            working.amount = max_sheep_send - sheep_sent;
        } else {
            working.amount = max_sheep_send;
        }
    }

    // --- post-match settlement ---------------------------------------------
    if working.amount > 0 {
        if creating_new_order {
            working.order_id = generate_order_id(ctx.block_num, ctx.tx_index, *op_index);
            result.order_effect = Some(OrderEffect::Created);
            ctx.book.insert(working.clone())?;
        } else {
            result.order_effect = Some(OrderEffect::Updated);
            ctx.book.update(working.clone())?;
        }
        result.order = Some(working);
    } else {
        result.order_effect = Some(OrderEffect::Deleted);
        if !creating_new_order {
            ctx.book.delete(&working.order_id)?;
        }
    }

    result.code = ResultCode::Success;
    Ok(result)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::asset::AssetKey;
    use crate::fee::FeeConfig;

    fn ctx() -> EngineContext {
        EngineContext::in_memory(FeeConfig::new(0), 5, 0)
    }

    fn insert_resting(ctx: &mut EngineContext, seller: &str, id: &str, wheat: AssetKey, sheep: AssetKey, amount: i64, price: Price) {
        ctx.book
            .insert(Order {
                seller: seller.to_string(),
                order_id: id.to_string(),
                selling: wheat,
                buying: sheep,
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

    #[test]
    fn s1_simple_full_fill() {
        let mut ctx = ctx();
        let wheat = AssetKey::native();
        let sheep = AssetKey::issued("issuer", "USD", false);
        ctx.accounts.add_entry(Account::new("B", 1_000));
        ctx.accounts.add_entry(Account::new("A", 10));
        insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

        let op = Operation::ProcessOrder {
            source: "A".to_string(),
            order_id: None,
            selling: sheep.clone(),
            buying: wheat.clone(),
            amount: 50,
            price: Price::new(2, 1),
            fee_percent: 0,
            passive: false,
            tx_hash: "taker".to_string(),
            op_index: 0,
        };
        ctx.accounts.get_entry("A").unwrap();
        let mut a = ctx.accounts.get_entry("A").unwrap();
        a.set_asset(sheep.clone(), crate::asset::AssetStore::new(50));
        ctx.accounts.set_entry(a);

        let result = process_order(&op, &mut ctx).unwrap();
        assert_eq!(result.order_effect, Some(OrderEffect::Deleted));
        assert!(result.order.is_none());
        assert_eq!(result.orders_claimed.len(), 1);
        assert_eq!(result.orders_claimed[0].amount_sold, 100);
        assert_eq!(result.orders_claimed[0].amount_bought, 50);

        let b = ctx.accounts.get_entry("B").unwrap();
        assert_eq!(b.balance, 900);
        assert_eq!(b.get_asset(&sheep).unwrap().amount, 50);

        let a = ctx.accounts.get_entry("A").unwrap();
        assert_eq!(a.balance, 110);
        assert_eq!(a.get_asset(&sheep).unwrap().amount, 0);
        assert!(ctx.book.load_order("B", "I1").is_none());
    }

    #[test]
    fn s3_passive_blocks_equal_price_cross() {
        let mut ctx = ctx();
        let wheat = AssetKey::native();
        let sheep = AssetKey::issued("issuer", "USD", false);
        ctx.accounts.add_entry(Account::new("B", 1_000));
        ctx.accounts.add_entry(Account::new("A", 10));
        insert_resting(&mut ctx, "B", "I1", wheat.clone(), sheep.clone(), 100, Price::new(1, 2));

        let mut a = Account::new("A", 10);
        a.set_asset(sheep.clone(), crate::asset::AssetStore::new(50));
        ctx.accounts.set_entry(a);

        let op = Operation::ProcessOrder {
            source: "A".to_string(),
            order_id: None,
            selling: sheep.clone(),
            buying: wheat.clone(),
            amount: 50,
            price: Price::new(2, 1),
            fee_percent: 0,
            passive: true,
            tx_hash: "taker".to_string(),
            op_index: 0,
        };

        let result = process_order(&op, &mut ctx).unwrap();
        assert_eq!(result.order_effect, Some(OrderEffect::Created));
        assert!(result.orders_claimed.is_empty());
        assert!(ctx.book.load_order("B", "I1").is_some());
    }

    #[test]
    fn s5_cancel_deletes_with_no_trail() {
        let mut ctx = ctx();
        let wheat = AssetKey::native();
        let sheep = AssetKey::issued("issuer", "USD", false);
        ctx.accounts.add_entry(Account::new("A", 10));
        insert_resting(&mut ctx, "A", "I1", sheep.clone(), wheat.clone(), 100, Price::new(1, 2));

        let op = Operation::ProcessOrder {
            source: "A".to_string(),
            order_id: Some("I1".to_string()),
            selling: sheep,
            buying: wheat,
            amount: 0,
            price: Price::new(1, 2),
            fee_percent: 0,
            passive: false,
            tx_hash: "cancel".to_string(),
            op_index: 1,
        };
        let result = process_order(&op, &mut ctx).unwrap();
        assert_eq!(result.order_effect, Some(OrderEffect::Deleted));
        assert!(result.orders_claimed.is_empty());
        assert!(ctx.book.load_order("A", "I1").is_none());
    }

    #[test]
    fn cancel_already_cancelled_order_fails_not_fount() {
        let mut ctx = ctx();
        let wheat = AssetKey::native();
        let sheep = AssetKey::issued("issuer", "USD", false);
        ctx.accounts.add_entry(Account::new("A", 10));

        let op = Operation::ProcessOrder {
            source: "A".to_string(),
            order_id: Some("missing".to_string()),
            selling: sheep,
            buying: wheat,
            amount: 0,
            price: Price::new(1, 2),
            fee_percent: 0,
            passive: false,
            tx_hash: "cancel".to_string(),
            op_index: 1,
        };
        assert!(matches!(process_order(&op, &mut ctx), Err(EngineError::OrderNotFount { .. })));
    }
}
