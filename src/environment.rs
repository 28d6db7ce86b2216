//! Transactional, per-transaction overlay of the account world (spec §3).
//!
//! Ground truth: `bumo::Environment`. One `Environment` is constructed per
//! transaction execution; [`Environment::commit`] flushes every touched
//! account to the backing [`KvStore`], and dropping the `Environment`
//! without committing discards all changes — the caller is responsible for
//! only calling `commit` when the whole operation succeeded (spec §5's
//! "SERIALIZABLE"/rollback-on-failure semantics, expressed here as an
//! explicit commit rather than an implicit transaction guard, since this
//! core has no real SQL transaction of its own to piggyback on).

use crate::account::Account;
use crate::kv::KvStore;
use dashmap::DashMap;
use std::sync::Arc;

fn account_key(address: &str) -> Vec<u8> {
    format!("account/{address}").into_bytes()
}

/// Scoped account cache backed by a durable [`KvStore`].
pub struct Environment {
    store: Arc<dyn KvStore>,
    /// Accounts read or created during this transaction. Flushed to `store`
    /// on [`Environment::commit`]; dropped otherwise.
    overlay: DashMap<String, Account>,
}

impl Environment {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Environment { store, overlay: DashMap::new() }
    }

    /// Fetch an account, checking the overlay first and falling back to the
    /// durable store. The result (if found) is cached in the overlay so
    /// subsequent lookups and eventual `commit` see the same instance.
    pub fn get_entry(&self, address: &str) -> Option<Account> {
        if let Some(acc) = self.overlay.get(address) {
            return Some(acc.clone());
        }
        let bytes = self.store.get(&account_key(address))?;
        let account: Account = serde_json::from_slice(&bytes).ok()?;
        self.overlay.insert(address.to_string(), account.clone());
        Some(account)
    }

    /// Insert a brand-new account into the overlay. Does not check for an
    /// existing row — callers validate `ACCOUNT_DEST_EXIST` themselves
    /// before calling this (spec §4.6 `CreateAccount`).
    pub fn add_entry(&self, account: Account) {
        self.overlay.insert(account.address.clone(), account);
    }

    /// Replace a cached account's state (used after a mutation). Panics if
    /// the account was never loaded via `get_entry`/`add_entry` this
    /// transaction — that would indicate a bug in the caller, not a
    /// recoverable condition.
    pub fn set_entry(&self, account: Account) {
        self.overlay.insert(account.address.clone(), account);
    }

    /// Flush every overlay entry to the backing store. Call only once the
    /// whole operation has succeeded; on any earlier failure, simply drop
    /// the `Environment` instead.
    pub fn commit(&self) {
        for entry in self.overlay.iter() {
            let bytes = serde_json::to_vec(entry.value()).expect("account always serializes");
            self.store.put(&account_key(entry.key()), &bytes);
        }
    }
}
