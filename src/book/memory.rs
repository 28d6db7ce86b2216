//! In-process reference implementation of [`super::OrderBookStore`].
//!
//! Grounded in the teacher's `OrderBook::bids`/`asks`: a
//! `crossbeam_skiplist::SkipMap` keyed so iteration order is automatically
//! `(price ASC, order_id ASC)`, eliminating the sort step a `Vec`-based book
//! would need on every page read. Generalized from the teacher's two fixed
//! sides (bid/ask on one instrument) to one ordered index per
//! `(selling, buying)` pair, since spec §4.3 supports an arbitrary number of
//! asset pairs.
//!
//! This is the crate's stand-in for the SQL-backed `orders` table (spec
//! §1's external collaborator) — used by this crate's own tests, and by
//! anyone embedding the engine without wiring a real SQL/KV backend.

use super::{FilterDecision, OrderBookStore};
use crate::asset::AssetKey;
use crate::error::EngineError;
use crate::order::Order;
use crate::price::{Price, price_cmp};
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// Total-order key: rational price first (via [`price_cmp`]), `order_id`
/// (already a monotone, lexicographically-sortable string, spec §6) as the
/// tiebreaker. This is the crate's resolution of SPEC_FULL.md's open
/// question in favor of the rational key over a materialized `f64` column.
#[derive(Debug, Clone)]
struct BookKey {
    price: Price,
    order_id: String,
}

impl PartialEq for BookKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for BookKey {}

impl PartialOrd for BookKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BookKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match price_cmp(&self.price, &other.price) {
            Ordering::Equal => self.order_id.cmp(&other.order_id),
            other => other,
        }
    }
}

type Pair = (AssetKey, AssetKey);

/// In-memory order book keyed by `order_id`, with one price-ordered
/// [`SkipMap`] per `(selling, buying)` pair for paged best-price reads.
#[derive(Default)]
pub struct MemoryOrderBook {
    rows: DashMap<String, Order>,
    by_pair: DashMap<Pair, Arc<SkipMap<BookKey, ()>>>,
    modified_index: DashMap<u64, Vec<String>>,
}

impl MemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn pair_index(&self, selling: &AssetKey, buying: &AssetKey) -> Arc<SkipMap<BookKey, ()>> {
        self.by_pair
            .entry((selling.clone(), buying.clone()))
            .or_insert_with(|| Arc::new(SkipMap::new()))
            .clone()
    }

    fn record_modified(&self, block: u64, order_id: &str) {
        self.modified_index.entry(block).or_default().push(order_id.to_string());
    }

    /// Walk the book exactly as the matcher does, applying `filter` to each
    /// resting order in `(price, order_id)` order. Returns the orders kept,
    /// honoring `Stop`/`Skip` exactly like [`super::OrderBookStore::load_best`]
    /// would if called repeatedly by a crossing loop — provided as a test
    /// helper so book-ordering tests don't need a full `OrderMatcher`.
    #[cfg(test)]
    fn walk(&self, selling: &AssetKey, buying: &AssetKey, filter: impl Fn(&Order) -> FilterDecision) -> Vec<Order> {
        let mut out = Vec::new();
        for order in self.load_best(usize::MAX, 0, selling, buying) {
            match filter(&order) {
                FilterDecision::Stop => break,
                FilterDecision::Skip => continue,
                FilterDecision::Keep => out.push(order),
            }
        }
        out
    }
}

impl OrderBookStore for MemoryOrderBook {
    fn load_order(&self, seller: &str, order_id: &str) -> Option<Order> {
        self.rows.get(order_id).and_then(|o| if o.seller == seller { Some(o.clone()) } else { None })
    }

    fn insert(&self, order: Order) -> Result<(), EngineError> {
        if order.amount == 0 {
            return Err(EngineError::invariant("orders with amount == 0 never persist"));
        }
        let key = BookKey { price: order.price, order_id: order.order_id.clone() };
        let index = self.pair_index(&order.selling, &order.buying);
        index.insert(key, ());
        self.record_modified(order.last_modified_block, &order.order_id);
        self.rows.insert(order.order_id.clone(), order);
        Ok(())
    }

    fn update(&self, order: Order) -> Result<(), EngineError> {
        let Some(old) = self.rows.get(&order.order_id).map(|o| o.clone()) else {
            return Err(EngineError::invariant(format!(
                "update affected zero rows for order {}",
                order.order_id
            )));
        };

        // An update may change price and/or the (selling, buying) pair (the
        // dispatcher's update path rebuilds `working` from the operation's
        // own price/selling/buying, spec §4.5) — re-key the secondary index
        // whenever either differs from the stored row instead of assuming
        // it never does.
        let repriced = price_cmp(&old.price, &order.price) != Ordering::Equal;
        let pair_changed = old.selling != order.selling || old.buying != order.buying;
        if repriced || pair_changed {
            let old_index = self.pair_index(&old.selling, &old.buying);
            old_index.remove(&BookKey { price: old.price, order_id: old.order_id.clone() });
            let new_index = self.pair_index(&order.selling, &order.buying);
            new_index.insert(BookKey { price: order.price, order_id: order.order_id.clone() }, ());
        }

        self.record_modified(order.last_modified_block, &order.order_id);
        self.rows.insert(order.order_id.clone(), order);
        Ok(())
    }

    fn delete(&self, order_id: &str) -> Result<(), EngineError> {
        let Some((_, order)) = self.rows.remove(order_id) else {
            return Err(EngineError::invariant(format!("delete affected zero rows for order {order_id}")));
        };
        if let Some(index) = self.by_pair.get(&(order.selling.clone(), order.buying.clone())) {
            index.remove(&BookKey { price: order.price, order_id: order.order_id.clone() });
        }
        Ok(())
    }

    fn load_best(&self, n: usize, offset: usize, selling: &AssetKey, buying: &AssetKey) -> Vec<Order> {
        let Some(index) = self.by_pair.get(&(selling.clone(), buying.clone())) else {
            return Vec::new();
        };
        index
            .iter()
            .skip(offset)
            .take(n)
            .filter_map(|entry| self.rows.get(&entry.key().order_id).map(|o| o.clone()))
            .collect()
    }

    fn count(&self, from_block: u64, to_block: u64) -> u64 {
        (from_block..=to_block).map(|b| self.modified_index.get(&b).map(|v| v.len()).unwrap_or(0) as u64).sum()
    }

    fn drop_and_recreate(&self) {
        self.rows.clear();
        self.by_pair.clear();
        self.modified_index.clear();
    }
}
