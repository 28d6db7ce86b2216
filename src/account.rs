//! Account state: native balance, per-asset stores, signer weights and
//! metadata.
//!
//! Ground truth: `bumo`'s `AccountFrm` (`account.cpp`, not retrieved in the
//! reference pack but named throughout `operation_frm.cpp`) — balance plus
//! `AssetStore` map plus `AccountPrivilege` (`master_weight`, `signers`,
//! `thresholds`). Cyclic order↔account references are flattened per spec
//! §9: an `Order` holds only a seller `AccountId`; the matcher looks the
//! account up through [`crate::environment::Environment`].

use crate::asset::{AssetKey, AssetStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single multi-sig signer and its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub address: String,
    pub weight: u32,
}

/// Per-operation-type signing thresholds, keyed by the operation type tag
/// `(0, 100]` (spec §3). `tx_threshold` is the default threshold for
/// operation types with no explicit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub tx_threshold: u8,
    pub type_thresholds: BTreeMap<u8, u8>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { tx_threshold: 0, type_thresholds: BTreeMap::new() }
    }
}

/// Master weight plus multi-sig configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPrivilege {
    pub master_weight: u32,
    pub signers: Vec<Signer>,
    pub thresholds: Thresholds,
}

impl Default for AccountPrivilege {
    fn default() -> Self {
        AccountPrivilege { master_weight: 1, signers: Vec::new(), thresholds: Thresholds::default() }
    }
}

/// A versioned metadata entry. `SetMetadata` requires the caller to supply
/// `version == old_version + 1` unless an explicit version is requested
/// (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub value: String,
    pub version: u32,
}

/// Opaque contract payload installed at account creation. The embedded
/// script sandbox that executes this payload is out of scope for this core
/// (spec §1); the engine only stores and returns the bytes.
pub type ContractPayload = Vec<u8>;

/// Ledger account: native balance, signer configuration, metadata, and the
/// per-asset balance stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub balance: i64,
    pub priv_: AccountPrivilege,
    pub contract: Option<ContractPayload>,
    pub metadata: BTreeMap<String, MetadataEntry>,
    pub assets: BTreeMap<AssetKey, AssetStore>,
}

impl Account {
    pub fn new(address: impl Into<String>, balance: i64) -> Self {
        Account {
            address: address.into(),
            balance,
            priv_: AccountPrivilege::default(),
            contract: None,
            metadata: BTreeMap::new(),
            assets: BTreeMap::new(),
        }
    }

    /// Balance available to spend above `base_reserve`. Never negative by
    /// construction — callers must check `balance >= base_reserve` before
    /// relying on this returning a usable amount.
    pub fn balance_above_reserve(&self, base_reserve: i64) -> i64 {
        (self.balance - base_reserve).max(0)
    }

    /// Credit (positive) or debit (negative) the native balance, enforcing
    /// `balance >= base_reserve` afterwards. Ground truth:
    /// `AccountFrm::AddBalance`.
    pub fn add_balance(&mut self, delta: i64, base_reserve: i64) -> Result<(), crate::error::EngineError> {
        let new_balance = self.balance.checked_add(delta).ok_or_else(|| {
            crate::error::EngineError::invariant(format!(
                "account {} balance overflow: {} + {delta}",
                self.address, self.balance
            ))
        })?;
        if new_balance < base_reserve {
            return Err(crate::error::EngineError::AccountLowReserve {
                address: self.address.clone(),
                balance: new_balance,
                base_reserve,
            });
        }
        self.balance = new_balance;
        Ok(())
    }

    pub fn get_asset(&self, key: &AssetKey) -> Option<&AssetStore> {
        self.assets.get(key)
    }

    pub fn set_asset(&mut self, key: AssetKey, store: AssetStore) {
        self.assets.insert(key, store);
    }

    /// Credits (positive `delta`) or debits (negative `delta`) `asset`,
    /// native coin or otherwise, after a fill the matcher already computed
    /// caps for. Any guard firing here is a fatal invariant violation —
    /// callers in the matching path should treat `Err` as `unreachable!()`
    /// (spec §4.4 step 8). Ground truth: the `AddBalance`/asset-amount
    /// update blocks inlined at both `CrossOrder` and `ProcessOrder` call
    /// sites in `order_exchange.cpp` / `operation_frm.cpp`.
    pub fn settle(&mut self, asset: &AssetKey, delta: i64, base_reserve: i64) -> Result<(), crate::error::EngineError> {
        if asset.is_native() {
            return self.add_balance(delta, base_reserve);
        }
        let mut store = self.get_asset(asset).cloned().unwrap_or_else(|| AssetStore::new(0));
        let new_amount = store.amount.checked_add(delta).ok_or_else(|| {
            crate::error::EngineError::invariant(format!("account {} asset {asset:?} amount overflow", self.address))
        })?;
        if new_amount < 0 {
            return Err(crate::error::EngineError::invariant(format!(
                "account {} asset {asset:?} would go negative",
                self.address
            )));
        }
        store.amount = new_amount;
        self.set_asset(asset.clone(), store);
        Ok(())
    }

    /// Sum of every signer's weight plus the master weight, saturating at
    /// `u32::MAX` so the invariant check in `CreateAccount` validation can
    /// compare directly (spec §3).
    pub fn total_signing_weight(&self) -> u32 {
        self.priv_
            .signers
            .iter()
            .fold(self.priv_.master_weight, |acc, s| acc.saturating_add(s.weight))
    }
}
