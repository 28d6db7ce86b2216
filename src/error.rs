//! Engine-wide error taxonomy.
//!
//! Styled after the teacher's `OrderBookError`: a flat, `#[non_exhaustive]`
//! enum with a hand-written `Display` rather than a `thiserror` derive, even
//! though nothing stops a `thiserror` derive from working here — the
//! original crate's own error type is hand-rolled this way, and this crate
//! follows that texture.
//!
//! Validation failures (spec §7) are returned as `Result` and never mutate
//! state. [`EngineError::Invariant`] is different: spec §7 classifies an
//! arithmetic guard firing *after* the `Exchange` step as proof that
//! `exchange()` lied about feasibility, and directs implementations to treat
//! those sites as `unreachable!()`. This crate logs the diagnostic via
//! `tracing::error!` at construction time and expects call sites to
//! `.expect()` or `panic!` immediately after — the surrounding ledger
//! transaction rolls back at a higher layer (spec §7).

use crate::asset::AssetKey;
use std::fmt;

#[derive(Debug)]
#[non_exhaustive]
pub enum EngineError {
    InvalidAddress(String),
    InvalidParameter(String),
    AssetInvalid(String),
    WeightNotValid(String),
    ThresholdNotValid(String),

    AccountNotExist(String),
    AccountDestExist(String),

    AccountLowReserve { address: String, balance: i64, base_reserve: i64 },
    AccountInitLowReserve { address: String, init_balance: i64, base_reserve: i64 },
    AccountAssetLowReserve { address: String, asset: AssetKey, amount: i64, requested: i64 },
    AccountAssetAmountTooLarge { address: String, asset: AssetKey },

    /// Preserves the original's typo (`ERRCODE_ORDER_NOT_FOUNT`) verbatim
    /// for wire compatibility (spec §7, §9).
    OrderNotFount { seller: String, order_id: String },
    OrderCrossSelf,
    OrderCantConvert,

    /// A fatal invariant violation: the matcher reached a state that
    /// `exchange()` was supposed to make unreachable. Never returned to a
    /// caller as recoverable — see module docs.
    Invariant(String),
}

impl EngineError {
    /// Construct [`EngineError::Invariant`], logging the diagnostic first —
    /// mirrors `bumo`'s `PROCESS_EXIT`, which logs before aborting.
    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "engine invariant violated");
        EngineError::Invariant(message)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidAddress(msg) => write!(f, "invalid address: {msg}"),
            EngineError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            EngineError::AssetInvalid(msg) => write!(f, "asset invalid: {msg}"),
            EngineError::WeightNotValid(msg) => write!(f, "weight not valid: {msg}"),
            EngineError::ThresholdNotValid(msg) => write!(f, "threshold not valid: {msg}"),
            EngineError::AccountNotExist(addr) => write!(f, "account does not exist: {addr}"),
            EngineError::AccountDestExist(addr) => write!(f, "destination account already exists: {addr}"),
            EngineError::AccountLowReserve { address, balance, base_reserve } => write!(
                f,
                "account {address} balance {balance} below base reserve {base_reserve}"
            ),
            EngineError::AccountInitLowReserve { address, init_balance, base_reserve } => write!(
                f,
                "account {address} init balance {init_balance} below base reserve {base_reserve}"
            ),
            EngineError::AccountAssetLowReserve { address, asset, amount, requested } => write!(
                f,
                "account {address} asset {asset:?} amount {amount} insufficient for {requested}"
            ),
            EngineError::AccountAssetAmountTooLarge { address, asset } => write!(
                f,
                "account {address} asset {asset:?} credit would overflow"
            ),
            EngineError::OrderNotFount { seller, order_id } => {
                write!(f, "order not found: seller {seller} order_id {order_id}")
            }
            EngineError::OrderCrossSelf => write!(f, "order would cross self"),
            EngineError::OrderCantConvert => write!(f, "order cannot convert"),
            EngineError::Invariant(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Operation-level result code, surfaced in `OperationResult` for receipts.
/// Mirrors spec §7's taxonomy one-to-one with [`EngineError`] so the
/// dispatcher can translate a validation failure into a wire code without
/// losing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultCode {
    Success,
    InvalidAddress,
    InvalidParameter,
    AssetInvalid,
    WeightNotValid,
    ThresholdNotValid,
    AccountNotExist,
    AccountDestExist,
    AccountLowReserve,
    AccountInitLowReserve,
    AccountAssetLowReserve,
    AccountAssetAmountTooLarge,
    /// Preserved typo, see [`EngineError::OrderNotFount`].
    OrderNotFount,
    OrderCrossSelf,
    OrderCantConvert,
}

impl From<&EngineError> for ResultCode {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::InvalidAddress(_) => ResultCode::InvalidAddress,
            EngineError::InvalidParameter(_) => ResultCode::InvalidParameter,
            EngineError::AssetInvalid(_) => ResultCode::AssetInvalid,
            EngineError::WeightNotValid(_) => ResultCode::WeightNotValid,
            EngineError::ThresholdNotValid(_) => ResultCode::ThresholdNotValid,
            EngineError::AccountNotExist(_) => ResultCode::AccountNotExist,
            EngineError::AccountDestExist(_) => ResultCode::AccountDestExist,
            EngineError::AccountLowReserve { .. } => ResultCode::AccountLowReserve,
            EngineError::AccountInitLowReserve { .. } => ResultCode::AccountInitLowReserve,
            EngineError::AccountAssetLowReserve { .. } => ResultCode::AccountAssetLowReserve,
            EngineError::AccountAssetAmountTooLarge { .. } => ResultCode::AccountAssetAmountTooLarge,
            EngineError::OrderNotFount { .. } => ResultCode::OrderNotFount,
            EngineError::OrderCrossSelf => ResultCode::OrderCrossSelf,
            EngineError::OrderCantConvert => ResultCode::OrderCantConvert,
            EngineError::Invariant(msg) => {
                unreachable!("invariant violations are never surfaced as a result code: {msg}")
            }
        }
    }
}
