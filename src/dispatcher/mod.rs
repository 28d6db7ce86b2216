//! Operation dispatch: replaces `bumo`'s per-type `OperationFrm` subclasses
//! (`CreateAccount`/`Payment`/`ProcessOrder`/…) with a tagged variant enum
//! and a single [`dispatch`] entry point (spec §9's "deep class hierarchy"
//! note).

mod account_ops;
mod process_order;

use crate::account::AccountPrivilege;
use crate::asset::{AssetKey, AssetProperty};
use crate::context::EngineContext;
use crate::error::{EngineError, ResultCode};
use crate::order::{ClaimOrder, Order};
use crate::price::Price;

/// One ledger operation, carrying only the fields this core actually acts
/// on (signature/auth checks are a collaborator's job, spec §1).
#[derive(Debug, Clone)]
pub enum Operation {
    CreateAccount {
        source: String,
        dest_address: String,
        init_balance: i64,
        priv_: AccountPrivilege,
        contract: Option<Vec<u8>>,
        metadata: Vec<(String, String, u32)>,
    },
    Payment {
        source: String,
        dest_address: String,
        amount: i64,
        asset: Option<(AssetKey, i64)>,
    },
    PayCoin {
        source: String,
        dest_address: String,
        amount: i64,
    },
    ProcessOrder {
        source: String,
        order_id: Option<String>,
        selling: AssetKey,
        buying: AssetKey,
        amount: i64,
        price: Price,
        fee_percent: u32,
        passive: bool,
        tx_hash: String,
        op_index: u32,
    },
    IssueAsset {
        source: String,
        code: String,
        amount: i64,
    },
    RegisterAsset {
        source: String,
        key: AssetKey,
        property: AssetProperty,
    },
    SetAssetFee {
        source: String,
        key: AssetKey,
        fee_percent: u32,
    },
    SetMetadata {
        source: String,
        key: String,
        value: String,
        version: Option<u32>,
    },
    SetSignerWeight {
        source: String,
        master_weight: Option<u32>,
        signers: Vec<(String, u32)>,
    },
    SetThreshold {
        source: String,
        tx_threshold: Option<u8>,
        type_thresholds: Vec<(u8, u8)>,
    },
}

/// Effect an order mutation had on the book, surfaced in
/// `OperationOrderResult` (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEffect {
    Created,
    Updated,
    Deleted,
}

/// Per-operation outcome. `code` is `ResultCode::Success` for everything
/// that isn't `ProcessOrder`/account-balance related; the order-specific
/// fields are `None` otherwise.
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub code: ResultCode,
    pub order_effect: Option<OrderEffect>,
    pub order: Option<Order>,
    pub orders_claimed: Vec<ClaimOrder>,
}

impl OperationResult {
    fn success() -> Self {
        OperationResult { code: ResultCode::Success, order_effect: None, order: None, orders_claimed: Vec::new() }
    }
}

/// Dispatches one operation against `ctx`. On `Ok`, the caller is expected
/// to call [`EngineContext::commit`]; on `Err`, the caller drops `ctx`'s
/// `Environment` overlay untouched (spec §5).
pub fn dispatch(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    match op {
        Operation::CreateAccount { .. } => account_ops::create_account(op, ctx),
        Operation::Payment { .. } => account_ops::payment(op, ctx),
        Operation::PayCoin { .. } => account_ops::pay_coin(op, ctx),
        Operation::IssueAsset { .. } | Operation::RegisterAsset { .. } | Operation::SetAssetFee { .. } => {
            account_ops::asset_admin(op, ctx)
        }
        Operation::SetMetadata { .. } => account_ops::set_metadata(op, ctx),
        Operation::SetSignerWeight { .. } => account_ops::set_signer_weight(op, ctx),
        Operation::SetThreshold { .. } => account_ops::set_threshold(op, ctx),
        Operation::ProcessOrder { .. } => process_order::process_order(op, ctx),
    }
}

pub(crate) fn ok() -> OperationResult {
    OperationResult::success()
}
