//! `CreateAccount`, `Payment`/`PayCoin`, asset administration, metadata,
//! and signer/threshold operations (spec §4.6).
//!
//! Ground truth: `bumo::OperationFrm::CheckValid`/`*Operation` case blocks
//! in `operation_frm.cpp`. Address-format and signature checks are a
//! collaborator's job (spec §1) — this module validates only the
//! ledger-state-dependent parts: existence, reserves, overflow, and the
//! bounds the spec calls out explicitly.

use super::{Operation, OperationResult, ok};
use crate::account::{Account, MetadataEntry};
use crate::asset::{AssetKey, AssetProperty, AssetStore};
use crate::context::EngineContext;
use crate::error::EngineError;

const ASSET_CODE_MAX_SIZE: usize = 64;

fn load(ctx: &EngineContext, address: &str) -> Result<Account, EngineError> {
    ctx.accounts.get_entry(address).ok_or_else(|| EngineError::AccountNotExist(address.to_string()))
}

pub fn create_account(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::CreateAccount { source, dest_address, init_balance, priv_, contract, metadata } = op else {
        unreachable!()
    };

    if ctx.accounts.get_entry(dest_address).is_some() {
        return Err(EngineError::AccountDestExist(dest_address.clone()));
    }
    if *init_balance < ctx.fee_config.base_reserve {
        return Err(EngineError::AccountInitLowReserve {
            address: dest_address.clone(),
            init_balance: *init_balance,
            base_reserve: ctx.fee_config.base_reserve,
        });
    }
    for entry in metadata {
        if entry.2 > 1 {
            return Err(EngineError::InvalidParameter(format!(
                "metadata version at creation must be 0 or 1, got {}",
                entry.2
            )));
        }
    }

    let mut src = load(ctx, source)?;
    src.add_balance(-*init_balance, ctx.fee_config.base_reserve)?;
    ctx.accounts.set_entry(src);

    let mut dest = Account::new(dest_address.clone(), *init_balance);
    dest.priv_ = priv_.clone();
    dest.contract = contract.clone();
    for (key, value, version) in metadata {
        dest.metadata.insert(key.clone(), MetadataEntry { value: value.clone(), version: *version });
    }
    ctx.accounts.add_entry(dest);

    Ok(ok())
}

fn transfer_native(ctx: &mut EngineContext, source: &str, dest: &str, amount: i64) -> Result<(), EngineError> {
    if amount <= 0 {
        return Err(EngineError::InvalidParameter("amount must be positive".to_string()));
    }
    if source == dest {
        return Err(EngineError::InvalidParameter("source and destination must differ".to_string()));
    }
    let mut src = load(ctx, source)?;
    src.add_balance(-amount, ctx.fee_config.base_reserve)?;
    let mut dst = load(ctx, dest)?;
    dst.add_balance(amount, ctx.fee_config.base_reserve)?;
    ctx.accounts.set_entry(src);
    ctx.accounts.set_entry(dst);
    Ok(())
}

pub fn pay_coin(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::PayCoin { source, dest_address, amount } = op else { unreachable!() };
    transfer_native(ctx, source, dest_address, *amount)?;
    Ok(ok())
}

/// `Payment`: native transfer when `asset` is `None`; otherwise an
/// asset transfer with the three `Limited`-asset cases the original
/// distinguishes (spec §4.6): third-party transfer, issuer→holder
/// issuance against `max_supply`, holder→issuer burn.
pub fn payment(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::Payment { source, dest_address, amount, asset } = op else { unreachable!() };

    let Some((key, asset_amount)) = asset else {
        transfer_native(ctx, source, dest_address, *amount)?;
        return Ok(ok());
    };

    if key.is_native() {
        return Err(EngineError::AssetInvalid("payment asset cannot be the native coin".to_string()));
    }
    if *asset_amount <= 0 {
        return Err(EngineError::AssetInvalid("payment amount should be bigger than 0".to_string()));
    }
    if key.code.is_empty() || key.code.len() > ASSET_CODE_MAX_SIZE {
        return Err(EngineError::AssetInvalid("asset code length should be between (0,64]".to_string()));
    }
    if source == dest_address {
        return Err(EngineError::InvalidParameter("source and destination must differ".to_string()));
    }

    let mut src = load(ctx, source)?;
    let mut dst = load(ctx, dest_address)?;

    let is_issuer_send = *source == key.issuer;
    let is_issuer_recv = *dest_address == key.issuer;

    if is_issuer_send && !is_issuer_recv {
        // issuer -> holder: issuance against max_supply
        credit_asset(&mut dst, key, *asset_amount)?;
        if let Some(store) = src.get_asset(key) {
            let mut issuer_store = store.clone();
            if let Some(prop) = &mut issuer_store.property {
                let new_issued = prop.issued_amount.checked_add(*asset_amount).ok_or_else(|| {
                    EngineError::invariant(format!("asset {key:?} issued_amount overflow"))
                })?;
                if new_issued > prop.max_supply {
                    return Err(EngineError::AccountAssetAmountTooLarge { address: source.clone(), asset: key.clone() });
                }
                prop.issued_amount = new_issued;
            }
            src.set_asset(key.clone(), issuer_store);
        }
    } else if is_issuer_recv && !is_issuer_send {
        // holder -> issuer: burn. Only the issuer's own store tracks
        // `issued_amount`; the holder's `amount` is debited separately and
        // the issuer's `amount` is left untouched (operation_frm.cpp ~L828-846).
        debit_asset(&mut src, key, *asset_amount)?;
        if let Some(mut issuer_store) = dst.get_asset(key).cloned() {
            if let Some(prop) = &mut issuer_store.property {
                let new_issued = prop.issued_amount - *asset_amount;
                if new_issued < 0 {
                    return Err(EngineError::AccountAssetLowReserve {
                        address: dest_address.clone(),
                        asset: key.clone(),
                        amount: prop.issued_amount,
                        requested: *asset_amount,
                    });
                }
                prop.issued_amount = new_issued;
            }
            dst.set_asset(key.clone(), issuer_store);
        }
    } else {
        // ordinary third-party transfer
        debit_asset(&mut src, key, *asset_amount)?;
        credit_asset(&mut dst, key, *asset_amount)?;
    }

    ctx.accounts.set_entry(src);
    ctx.accounts.set_entry(dst);
    Ok(ok())
}

fn credit_asset(account: &mut Account, key: &AssetKey, amount: i64) -> Result<(), EngineError> {
    let mut store = account.get_asset(key).cloned().unwrap_or_else(|| AssetStore::new(0));
    let new_amount = store.amount.checked_add(amount).ok_or_else(|| {
        EngineError::AccountAssetAmountTooLarge { address: account.address.clone(), asset: key.clone() }
    })?;
    if let Some(prop) = &store.property {
        if new_amount > prop.max_supply {
            return Err(EngineError::AccountAssetAmountTooLarge { address: account.address.clone(), asset: key.clone() });
        }
    }
    store.amount = new_amount;
    account.set_asset(key.clone(), store);
    Ok(())
}

fn debit_asset(account: &mut Account, key: &AssetKey, amount: i64) -> Result<(), EngineError> {
    let store = account.get_asset(key).cloned().ok_or_else(|| EngineError::AssetInvalid(format!(
        "account {} does not hold asset {key:?}", account.address
    )))?;
    if store.free_amount() < amount {
        return Err(EngineError::AccountAssetLowReserve {
            address: account.address.clone(),
            asset: key.clone(),
            amount: store.amount,
            requested: amount,
        });
    }
    let mut store = store;
    store.amount -= amount;
    account.set_asset(key.clone(), store);
    Ok(())
}

/// `IssueAsset`/`RegisterAsset`/`SetAssetFee`: create or mutate an
/// `AssetStore` row on the issuing account itself (spec §4.6).
pub fn asset_admin(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    match op {
        Operation::IssueAsset { source, code, amount } => {
            if *amount <= 0 {
                return Err(EngineError::AssetInvalid("issue amount should be bigger than 0".to_string()));
            }
            if code.is_empty() || code.len() > ASSET_CODE_MAX_SIZE {
                return Err(EngineError::AssetInvalid("asset code length should be between (0,64]".to_string()));
            }
            let key = AssetKey::issued(source.clone(), code.clone(), false);
            let mut src = load(ctx, source)?;
            let mut store = src.get_asset(&key).cloned().unwrap_or_else(|| AssetStore::new(0));
            store.amount = store.amount.checked_add(*amount).ok_or_else(|| {
                EngineError::AccountAssetAmountTooLarge { address: source.clone(), asset: key.clone() }
            })?;
            src.set_asset(key, store);
            ctx.accounts.set_entry(src);
            Ok(ok())
        }
        Operation::RegisterAsset { source, key, property } => {
            let mut src = load(ctx, source)?;
            let mut store = src.get_asset(key).cloned().unwrap_or_else(|| AssetStore::new(0));
            store.property = Some(*property);
            if !store.is_consistent() {
                return Err(EngineError::AssetInvalid(format!("asset {key:?} registration inconsistent")));
            }
            src.set_asset(key.clone(), store);
            ctx.accounts.set_entry(src);
            Ok(ok())
        }
        Operation::SetAssetFee { source, key, fee_percent } => {
            let mut src = load(ctx, source)?;
            let mut store = src.get_asset(key).cloned().ok_or_else(|| {
                EngineError::AssetInvalid(format!("account {source} does not hold asset {key:?}"))
            })?;
            let prop = store.property.get_or_insert(AssetProperty { max_supply: i64::MAX, issued_amount: 0, fee_percent: 0 });
            prop.fee_percent = *fee_percent;
            src.set_asset(key.clone(), store);
            ctx.accounts.set_entry(src);
            Ok(ok())
        }
        _ => unreachable!(),
    }
}

/// `SetMetadata`: version-monotonic (spec §4.6). `version` is required to
/// equal the stored version + 1 unless the caller supplies an explicit
/// version, matching the existing value exactly.
pub fn set_metadata(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::SetMetadata { source, key, value, version } = op else { unreachable!() };
    if key.is_empty() || key.len() > 1024 {
        return Err(EngineError::InvalidParameter("metadata key length out of bounds".to_string()));
    }

    let mut src = load(ctx, source)?;
    let old_version = src.metadata.get(key).map(|e| e.version).unwrap_or(0);
    let new_version = match version {
        Some(v) => {
            if *v != old_version + 1 {
                return Err(EngineError::InvalidParameter(format!(
                    "metadata version must be {}, got {v}",
                    old_version + 1
                )));
            }
            *v
        }
        None => old_version + 1,
    };
    src.metadata.insert(key.clone(), MetadataEntry { value: value.clone(), version: new_version });
    ctx.accounts.set_entry(src);
    Ok(ok())
}

pub fn set_signer_weight(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::SetSignerWeight { source, master_weight, signers } = op else { unreachable!() };
    let mut src = load(ctx, source)?;

    if let Some(w) = master_weight {
        src.priv_.master_weight = *w;
    }
    for (address, weight) in signers {
        if address == source {
            return Err(EngineError::InvalidAddress("signer address can't equal the source address".to_string()));
        }
        src.priv_.signers.retain(|s| &s.address != address);
        if *weight > 0 {
            src.priv_.signers.push(crate::account::Signer { address: address.clone(), weight: *weight });
        }
    }
    ctx.accounts.set_entry(src);
    Ok(ok())
}

pub fn set_threshold(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
    let Operation::SetThreshold { source, tx_threshold, type_thresholds } = op else { unreachable!() };
    let mut src = load(ctx, source)?;

    if let Some(t) = tx_threshold {
        src.priv_.thresholds.tx_threshold = *t;
    }
    for (op_type, threshold) in type_thresholds {
        if *op_type == 0 || *op_type > 100 {
            return Err(EngineError::ThresholdNotValid(format!("operation type {op_type} not supported")));
        }
        src.priv_.thresholds.type_thresholds.insert(*op_type, *threshold);
    }
    ctx.accounts.set_entry(src);
    Ok(ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::FeeConfig;

    fn ctx() -> EngineContext {
        EngineContext::in_memory(FeeConfig::new(10), 1, 0)
    }

    #[test]
    fn create_account_enforces_reserve_on_both_sides() {
        let mut ctx = ctx();
        ctx.accounts.add_entry(Account::new("src", 100));
        let op = Operation::CreateAccount {
            source: "src".to_string(),
            dest_address: "dst".to_string(),
            init_balance: 5,
            priv_: Default::default(),
            contract: None,
            metadata: Vec::new(),
        };
        assert!(matches!(dispatch_for_test(&op, &mut ctx), Err(EngineError::AccountInitLowReserve { .. })));
    }

    #[test]
    fn create_account_succeeds_and_debits_source() {
        let mut ctx = ctx();
        ctx.accounts.add_entry(Account::new("src", 100));
        let op = Operation::CreateAccount {
            source: "src".to_string(),
            dest_address: "dst".to_string(),
            init_balance: 50,
            priv_: Default::default(),
            contract: None,
            metadata: Vec::new(),
        };
        dispatch_for_test(&op, &mut ctx).unwrap();
        assert_eq!(ctx.accounts.get_entry("src").unwrap().balance, 50);
        assert_eq!(ctx.accounts.get_entry("dst").unwrap().balance, 50);
    }

    #[test]
    fn metadata_requires_exact_next_version() {
        let mut ctx = ctx();
        ctx.accounts.add_entry(Account::new("src", 100));
        let op = Operation::SetMetadata { source: "src".to_string(), key: "k".to_string(), value: "v".to_string(), version: Some(1) };
        dispatch_for_test(&op, &mut ctx).unwrap();

        let bad = Operation::SetMetadata { source: "src".to_string(), key: "k".to_string(), value: "v2".to_string(), version: Some(1) };
        assert!(dispatch_for_test(&bad, &mut ctx).is_err());

        let good = Operation::SetMetadata { source: "src".to_string(), key: "k".to_string(), value: "v2".to_string(), version: Some(2) };
        dispatch_for_test(&good, &mut ctx).unwrap();
    }

    #[test]
    fn burn_decrements_issuer_issued_amount_not_issuer_balance() {
        let mut ctx = ctx();
        let key = AssetKey::issued("issuer", "USD", true);

        let mut issuer = Account::new("issuer", 1_000);
        issuer.set_asset(key.clone(), AssetStore {
            amount: 500,
            frozen: 0,
            property: Some(AssetProperty { max_supply: 1_000, issued_amount: 200, fee_percent: 0 }),
        });
        ctx.accounts.add_entry(issuer);

        let mut holder = Account::new("holder", 100);
        holder.set_asset(key.clone(), AssetStore::new(50));
        ctx.accounts.add_entry(holder);

        let op = Operation::Payment {
            source: "holder".to_string(),
            dest_address: "issuer".to_string(),
            amount: 0,
            asset: Some((key.clone(), 30)),
        };
        dispatch_for_test(&op, &mut ctx).unwrap();

        let holder = ctx.accounts.get_entry("holder").unwrap();
        assert_eq!(holder.get_asset(&key).unwrap().amount, 20);

        let issuer = ctx.accounts.get_entry("issuer").unwrap();
        // issuer's own circulating amount is untouched by a burn; only the
        // issued-so-far counter tracked in `property` decreases.
        assert_eq!(issuer.get_asset(&key).unwrap().amount, 500);
        assert_eq!(issuer.get_asset(&key).unwrap().property.unwrap().issued_amount, 170);
    }

    #[test]
    fn burn_below_issued_amount_is_rejected_not_clamped() {
        let mut ctx = ctx();
        let key = AssetKey::issued("issuer", "USD", true);

        let mut issuer = Account::new("issuer", 1_000);
        issuer.set_asset(key.clone(), AssetStore {
            amount: 500,
            frozen: 0,
            property: Some(AssetProperty { max_supply: 1_000, issued_amount: 10, fee_percent: 0 }),
        });
        ctx.accounts.add_entry(issuer);

        let mut holder = Account::new("holder", 100);
        holder.set_asset(key.clone(), AssetStore::new(50));
        ctx.accounts.add_entry(holder);

        let op = Operation::Payment {
            source: "holder".to_string(),
            dest_address: "issuer".to_string(),
            amount: 0,
            asset: Some((key, 30)),
        };
        assert!(matches!(dispatch_for_test(&op, &mut ctx), Err(EngineError::AccountAssetLowReserve { .. })));
    }

    fn dispatch_for_test(op: &Operation, ctx: &mut EngineContext) -> Result<OperationResult, EngineError> {
        super::super::dispatch(op, ctx)
    }
}
