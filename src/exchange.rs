//! The pure `exchange()` function: given a candidate fill, compute the legal
//! `(wheat, sheep)` pair. No I/O, no account mutation.
//!
//! Ground truth: `bumo::Exchange` in `order_exchange.cpp`. Naming
//! ("wheat"/"sheep") is the original's convention for "asset bought"/"asset
//! sold" by the taker, preserved per spec glossary.

use crate::price::{Price, big_divide};
use crate::utils::Rounding;

/// Classification of an [`ExchangeResult`] (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Both legs of the fill are non-zero.
    Normal,
    /// A leg was clamped down to zero by one of the caps.
    ReducedToZero,
    /// A leg became zero without being clamped — a degenerate price.
    Bogus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeResult {
    pub wheat: i64,
    pub sheep: i64,
    pub reduced: bool,
}

impl ExchangeResult {
    pub fn outcome(&self) -> ExchangeOutcome {
        if self.wheat != 0 && self.sheep != 0 {
            ExchangeOutcome::Normal
        } else if self.reduced {
            ExchangeOutcome::ReducedToZero
        } else {
            ExchangeOutcome::Bogus
        }
    }
}

/// Computes the legal `(wheat, sheep)` pair for a single fill, biased
/// towards the seller on rounding (spec §4.2):
///
/// 1. `w1 = min(wheat_received, max_wheat_receive)`.
/// 2. `s1 = ceil(w1 * price.n / price.d)`, saturating to `i64::MAX` on
///    overflow.
/// 3. `s2 = min(s1, max_sheep_send)`.
/// 4. `w2 = floor(s2 * price.d / price.n)`.
/// 5. Result is `{ wheat: min(w1, w2), sheep: s2, reduced }`.
pub fn exchange(wheat_received: i64, price: Price, max_wheat_receive: i64, max_sheep_send: i64) -> ExchangeResult {
    let mut reduced = wheat_received > max_wheat_receive;
    let w1 = wheat_received.min(max_wheat_receive);

    let (s1, overflowed) = match big_divide(w1, i64::from(price.n), i64::from(price.d), Rounding::Up) {
        Some(v) => (v, false),
        None => (i64::MAX, true),
    };
    reduced = reduced || overflowed;

    reduced = reduced || s1 > max_sheep_send;
    let s2 = s1.min(max_sheep_send);

    let w2 = big_divide(s2, i64::from(price.d), i64::from(price.n), Rounding::Down).unwrap_or(i64::MAX);

    ExchangeResult { wheat: w1.min(w2), sheep: s2, reduced }
}
