//! Ledger-wide fee configuration, read from "the active `FeeConfig`" (spec §6).
//!
//! Styled after the teacher's `FeeSchedule` (basis-point maker/taker fees)
//! but widened to the flat per-operation fee schedule `bumo` actually uses —
//! this core only ever consults `base_reserve` directly; the rest travels
//! with `EngineContext` so a caller building a complete ledger doesn't need
//! a second config type.

use serde::{Deserialize, Serialize};

/// `FEE_BASE` denominator for `fee_percent` fields throughout the engine —
/// `fee_percent` values are parts-per-`FEE_BASE`, not literal percentages.
pub const FEE_BASE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Minimum native-coin balance every account must retain after any
    /// mutation — the solvency floor consulted by [`crate::account::Account::add_balance`]
    /// and the matcher's settlement step.
    pub base_reserve: i64,
    pub create_account_fee: i64,
    pub pay_fee: i64,
    pub process_order_fee: i64,
}

impl FeeConfig {
    pub fn new(base_reserve: i64) -> Self {
        FeeConfig { base_reserve, create_account_fee: 0, pay_fee: 0, process_order_fee: 0 }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        FeeConfig::new(0)
    }
}
