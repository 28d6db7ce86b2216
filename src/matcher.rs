//! The exchange loop: walks the resting book in `(price, order_id)` order
//! and crosses the taker against it one resting order at a time.
//!
//! Ground truth: `bumo::OrderExchange::ConvertWithOrders` / `CrossOrder`
//! (`order_exchange.cpp`). `CanBuyAtMost`/`CanSellAtMost` are reproduced as
//! free functions below exactly as the original computes them — including
//! consulting a resting seller's raw asset `amount` rather than its free
//! (unfrozen) amount, which is what the original does.

use crate::account::Account;
use crate::asset::AssetKey;
use crate::book::{FilterDecision, OrderBookStore, PAGE_SIZE};
use crate::environment::Environment;
use crate::error::EngineError;
use crate::exchange::{ExchangeOutcome, exchange};
use crate::fee::FeeConfig;
use crate::order::{ClaimOrder, Order};
use crate::price::{Price, big_divide};
use crate::utils::Rounding;

/// Outcome of crossing the taker against a single resting order. Mirrors
/// `bumo::OrderExchange::CrossOrderResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossOrderResult {
    /// The resting order was fully consumed (and deleted from the book).
    Taken,
    /// The resting order was partially consumed (and updated in the book).
    Partial,
    /// The fill was reduced to nothing by the taker's own caps; no mutation
    /// occurred and the loop should stop offering more liquidity this call.
    CantConvert,
}

/// Outcome of a full [`OrderMatcher::convert_with_orders`] call. Mirrors
/// `bumo::OrderExchange::ConvertResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertResult {
    Ok,
    Partial,
    FilterStop,
}

/// `CanBuyAtMost`: how much of `wheat` the taker's `max_sheep_send` budget
/// can cover at `price`, expressed in the resting order's `wheat` units.
fn can_buy_at_most(sheep: &AssetKey, price: Price) -> i64 {
    if sheep.is_native() {
        return i64::MAX;
    }
    big_divide(i64::MAX, i64::from(price.d), i64::from(price.n), Rounding::Down).unwrap_or(i64::MAX)
}

/// `CanSellAtMost`: how much `wheat` the resting seller's account can
/// actually part with. Native coin is capped by the reserve floor; an
/// issued asset is capped by its raw stored `amount` (frozen balance is
/// not consulted, matching the original).
fn can_sell_at_most(account: &Account, asset: &AssetKey, base_reserve: i64) -> i64 {
    if asset.is_native() {
        return account.balance_above_reserve(base_reserve);
    }
    account.get_asset(asset).map(|s| s.amount).unwrap_or(0)
}

/// Crosses the taker against the resting book for `(wheat, sheep)`,
/// accumulating claims into `self.trail`.
pub struct OrderMatcher<'a> {
    env: &'a Environment,
    book: &'a dyn OrderBookStore,
    fee_config: &'a FeeConfig,
    trail: Vec<ClaimOrder>,
}

impl<'a> OrderMatcher<'a> {
    pub fn new(env: &'a Environment, book: &'a dyn OrderBookStore, fee_config: &'a FeeConfig) -> Self {
        OrderMatcher { env, book, fee_config, trail: Vec::new() }
    }

    pub fn into_trail(self) -> Vec<ClaimOrder> {
        self.trail
    }

    /// Crosses a single resting order. `max_wheat_receive`/`max_sheep_send`
    /// are the taker's remaining caps.
    fn cross_order(
        &mut self,
        mut resting: Order,
        max_wheat_receive: i64,
        max_sheep_send: i64,
    ) -> Result<(CrossOrderResult, i64, i64), EngineError> {
        debug_assert!(max_wheat_receive > 0 && max_sheep_send > 0);

        let sheep = resting.buying.clone();
        let wheat = resting.selling.clone();

        let mut account_b = self.env.get_entry(&resting.seller).ok_or_else(|| {
            EngineError::invariant(format!(
                "account {} must exist, invalid database state: order {} has no matching account",
                resting.seller, resting.order_id
            ))
        })?;

        let num_wheat_cap = can_buy_at_most(&sheep, resting.price)
            .min(can_sell_at_most(&account_b, &wheat, self.fee_config.base_reserve))
            .min(resting.amount);

        if num_wheat_cap < 0 {
            return Err(EngineError::invariant(format!(
                "num_wheat_received went negative for order {}",
                resting.order_id
            )));
        }

        resting.amount = num_wheat_cap;

        let result = exchange(num_wheat_cap, resting.price, max_wheat_receive, max_sheep_send);
        let mut num_wheat_received = result.wheat;
        let mut num_sheep_sent = result.sheep;

        let mut order_taken = false;
        match result.outcome() {
            ExchangeOutcome::ReducedToZero => return Ok((CrossOrderResult::CantConvert, 0, 0)),
            ExchangeOutcome::Bogus => {
                num_wheat_received = 0;
                num_sheep_sent = 0;
                order_taken = true;
            }
            ExchangeOutcome::Normal => {}
        }

        order_taken = order_taken || resting.amount <= num_wheat_received;

        if order_taken {
            self.book.delete(&resting.order_id)?;
        } else {
            resting.amount -= num_wheat_received;
            self.book.update(resting.clone())?;
        }

        // Fee disposition is delegated to an asset-admin collaborator out of
        // scope here (spec §4.4 step 7): the core computes the allocation
        // point but credits the resting seller's account for the full
        // `num_sheep_sent` — the actual withholding is a no-op left for that
        // collaborator to wire up, matching `CrossOrder`'s own (commented
        // out) `PayIssuerFee` call.
        let _fee = if num_sheep_sent != 0 { resting.fee_on(num_sheep_sent) } else { 0 };

        if num_sheep_sent != 0 {
            account_b.settle(&sheep, num_sheep_sent, self.fee_config.base_reserve)?;
        }
        if num_wheat_received != 0 {
            account_b.settle(&wheat, -num_wheat_received, self.fee_config.base_reserve)?;
        }
        self.env.set_entry(account_b.clone());

        self.trail.push(ClaimOrder {
            seller: account_b.address.clone(),
            order_id: resting.order_id.clone(),
            tx_hash: resting.tx_hash.clone(),
            price: resting.price,
            asset_sold: wheat,
            amount_sold: num_wheat_received,
            asset_bought: sheep,
            amount_bought: num_sheep_sent,
        });

        Ok((
            if order_taken { CrossOrderResult::Taken } else { CrossOrderResult::Partial },
            num_wheat_received,
            num_sheep_sent,
        ))
    }

    /// Walks the resting book for `(wheat, sheep)`, crossing the taker
    /// against it page by page. `filter` is consulted once per resting
    /// order before any crossing is attempted (spec §4.4).
    pub fn convert_with_orders(
        &mut self,
        sheep: &AssetKey,
        mut max_sheep_send: i64,
        wheat: &AssetKey,
        mut max_wheat_receive: i64,
        mut filter: impl FnMut(&Order) -> FilterDecision,
    ) -> Result<(ConvertResult, i64, i64), EngineError> {
        let mut sheep_sent = 0i64;
        let mut wheat_received = 0i64;
        let mut order_offset = 0usize;

        let mut need_more = max_wheat_receive > 0 && max_sheep_send > 0;
        while need_more {
            let page = self.book.load_best(PAGE_SIZE, order_offset, wheat, sheep);
            let page_len = page.len();
            order_offset += page_len;

            for resting in page {
                match filter(&resting) {
                    FilterDecision::Stop => return Ok((ConvertResult::FilterStop, sheep_sent, wheat_received)),
                    FilterDecision::Skip => continue,
                    FilterDecision::Keep => {}
                }

                let (cor, wr, ss) = self.cross_order(resting, max_wheat_receive, max_sheep_send)?;
                if cor == CrossOrderResult::CantConvert {
                    return Ok((ConvertResult::Partial, sheep_sent, wheat_received));
                }
                if cor == CrossOrderResult::Taken {
                    order_offset = order_offset.saturating_sub(1);
                }

                sheep_sent += ss;
                max_sheep_send -= ss;
                wheat_received += wr;
                max_wheat_receive -= wr;

                need_more = max_wheat_receive > 0 && max_sheep_send > 0;
                if !need_more {
                    return Ok((ConvertResult::Ok, sheep_sent, wheat_received));
                }
                if cor == CrossOrderResult::Partial {
                    return Ok((ConvertResult::Partial, sheep_sent, wheat_received));
                }
            }

            if need_more && page_len < PAGE_SIZE {
                return Ok((ConvertResult::Ok, sheep_sent, wheat_received));
            }
        }
        Ok((ConvertResult::Ok, sheep_sent, wheat_received))
    }
}
