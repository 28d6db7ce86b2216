//! Resting order, claim trail, and the canonical order id codec.

use crate::asset::AssetKey;
use crate::price::Price;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Order flag bits. Only one bit is defined by spec §3; the type is a
    /// bitflags set (rather than a bare `bool`) so the wire `flags: INT`
    /// column (spec §6) round-trips without reinterpretation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OrderFlags: u32 {
        /// The order refuses to take liquidity at exactly its limit price;
        /// it will only rest (spec glossary: "Passive order").
        const PASSIVE = 0b0000_0001;
    }
}

/// A resting (or about-to-rest) sell order: "sell `selling` for `buying` at
/// `price`, fee at least `fee_percent`".
///
/// Ground truth: `bumo::protocol::Order` / `OrderFrame`. Orders hold only
/// the seller's address, never a back-pointer to the `Account` itself
/// (spec §9) — the matcher resolves the account through
/// [`crate::environment::Environment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub seller: String,
    /// Empty until assigned by [`generate_order_id`] at insert time.
    pub order_id: String,
    pub selling: AssetKey,
    pub buying: AssetKey,
    pub amount: i64,
    pub price: Price,
    pub fee_percent: u32,
    pub flags: OrderFlags,
    pub tx_hash: String,
    pub op_index: u32,
    pub last_modified_block: u64,
}

impl Order {
    pub fn is_passive(&self) -> bool {
        self.flags.contains(OrderFlags::PASSIVE)
    }

    /// Fee owed on a `received` amount of the bought asset: `received *
    /// fee_percent / FEE_BASE`. Ground truth: `OrderFrame::GetFee`.
    pub fn fee_on(&self, received: i64) -> i64 {
        // received and fee_percent are both small enough in practice that
        // this cannot overflow i64, but route it through the checked path
        // used everywhere else for consistency and to catch pathological inputs.
        crate::price::big_divide(received, i64::from(self.fee_percent), crate::fee::FEE_BASE, crate::utils::Rounding::Down)
            .unwrap_or(received)
    }
}

/// One fill produced by the matcher. Created exclusively by `OrderMatcher`
/// (spec §3) and accumulated into the claim trail attached to a
/// `ProcessOrder` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimOrder {
    pub seller: String,
    pub order_id: String,
    pub tx_hash: String,
    pub price: Price,
    pub asset_sold: AssetKey,
    pub amount_sold: i64,
    pub asset_bought: AssetKey,
    pub amount_bought: i64,
}

/// Persisted book row shape (spec §6), including the `f64` materialized
/// sort column the original wire format carries for schema compatibility.
/// [`crate::book::memory::MemoryOrderBook`] never compares on `price_f64` —
/// see SPEC_FULL.md's resolution of the rational-vs-double open question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookRow {
    pub order: Order,
    pub price_f64: f64,
}

impl From<Order> for OrderBookRow {
    fn from(order: Order) -> Self {
        let price_f64 = order.price.as_f64();
        OrderBookRow { order, price_f64 }
    }
}

/// Encodes the canonical 128-bit order id:
/// `(block_num << 64) | ((tx_index + 1) << 32) | (op_index + 1)`, rendered
/// as a 128-character base-2 string so lexicographic order equals numeric
/// order (spec §6). Ground truth: `bumo::utils::generatId`.
///
/// `block_num` must be `> 0` — callers never generate an id for the genesis
/// block, matching `parseId`'s decode-side assertion.
pub fn generate_order_id(block_num: u64, tx_index: u32, op_index: u32) -> String {
    assert!(block_num > 0, "block_num must be positive");
    let value: u128 =
        (u128::from(block_num) << 64) | (u128::from(tx_index + 1) << 32) | u128::from(op_index + 1);
    format!("{value:0128b}")
}

/// Decodes an id produced by [`generate_order_id`]. Returns `(block_num,
/// tx_index, op_index)`.
pub fn parse_order_id(id: &str) -> Option<(u64, u32, u32)> {
    if id.len() != 128 {
        return None;
    }
    let value = u128::from_str_radix(id, 2).ok()?;
    let block_num = (value >> 64) as u64;
    let tx_index_plus_1 = ((value >> 32) & 0xFFFF_FFFF) as u32;
    let op_index_plus_1 = (value & 0xFFFF_FFFF) as u32;
    if block_num == 0 || tx_index_plus_1 == 0 || op_index_plus_1 == 0 {
        return None;
    }
    Some((block_num, tx_index_plus_1 - 1, op_index_plus_1 - 1))
}
