//! Rational price comparison and checked 128-bit multiply-divide.
//!
//! Prices in the book are never canonicalized: two prices with the same
//! rational value but different `(n, d)` representations compare `==` under
//! [`price_cmp`] but are *not* structurally `Eq`. Order rows preserve
//! whatever `(n, d)` the submitter sent.

use crate::utils::Rounding;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A rational price `n / d`, `d > 0`.
///
/// Comparisons cross-multiply into `u128` to avoid overflow at realistic
/// market sizes — `a.n * b.d` and `a.d * b.n` can each approach `u32::MAX
/// * u32::MAX`, which already overflows `u64` once summed with rounding
/// terms elsewhere in the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Price {
    pub n: u32,
    pub d: u32,
}

impl Price {
    /// Construct a price, panicking if `d == 0`.
    ///
    /// Every call site in this crate constructs prices from already-validated
    /// operation input (`d > 0` is checked during `ProcessOrder` validation);
    /// this constructor is the last line of defense against a caller bug.
    pub fn new(n: u32, d: u32) -> Self {
        assert!(d > 0, "price denominator must be positive");
        Price { n, d }
    }

    /// `self.n as f64 / self.d as f64`, used only as a materialized sort key
    /// for wire/schema compatibility (see `OrderBookRow::price_f64`). Never
    /// used for comparisons that affect state.
    pub fn as_f64(&self) -> f64 {
        f64::from(self.n) / f64::from(self.d)
    }
}

/// `sign(a.n * b.d - a.d * b.n)` via 128-bit cross multiplication.
pub fn price_cmp(a: &Price, b: &Price) -> Ordering {
    let l = u128::from(a.n) * u128::from(b.d);
    let r = u128::from(a.d) * u128::from(b.n);
    l.cmp(&r)
}

/// Structural equality is intentionally *not* `price_cmp == Ordering::Equal`
/// here — callers that want rational equality should use [`price_cmp`].
/// This impl exists only so `Price` can sit in structures that need
/// `PartialEq` for incidental reasons (tests, debug assertions).
impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        price_cmp(self, other) == Ordering::Equal
    }
}

/// Computes `⌊a·b/c⌋` (or `⌈a·b/c⌉` under [`Rounding::Up`]), returning
/// `None` if the result does not fit in an `i64`.
///
/// All inputs must be non-negative and `c` must be positive; this is the
/// contract the engine relies on (callers never pass negative amounts).
pub fn big_divide(a: i64, b: i64, c: i64, rounding: Rounding) -> Option<i64> {
    debug_assert!(a >= 0 && b >= 0 && c > 0);
    let (a, b, c) = (a as u128, b as u128, c as u128);
    let product = a.checked_mul(b)?;
    let x = match rounding {
        Rounding::Down => product / c,
        Rounding::Up => (product + c - 1) / c,
    };
    if x <= i64::MAX as u128 { Some(x as i64) } else { None }
}
