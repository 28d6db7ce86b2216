//! Asset identity and per-account balance store.

use serde::{Deserialize, Serialize};

/// Account address, represented as an opaque interned string everywhere in
/// this crate. Signature verification and address-format checks belong to
/// the collaborator that authenticates the `Operation` before it reaches
/// this core (spec §1).
pub type AccountId = String;

/// `kind` discriminant of an [`AssetKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// The ledger's native coin. `issuer`/`code` are ignored for this kind.
    NativeCoin,
    /// An issued asset with no supply cap.
    Unlimited,
    /// An issued asset with an enforced `max_supply`.
    Limited,
}

/// `(issuer, code, kind)` — the identity of an asset.
///
/// `NativeCoin` ignores `issuer` and `code`; callers should use
/// [`AssetKey::native`] rather than constructing one by hand, since the book
/// and account stores normalize native-coin keys for comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetKey {
    pub issuer: AccountId,
    pub code: String,
    pub kind: AssetKind,
}

impl AssetKey {
    /// The native coin asset key.
    pub fn native() -> Self {
        AssetKey {
            issuer: String::new(),
            code: String::new(),
            kind: AssetKind::NativeCoin,
        }
    }

    pub fn is_native(&self) -> bool {
        self.kind == AssetKind::NativeCoin
    }

    /// A non-native issued asset. `code` must be 1..=64 bytes (spec §4.5).
    pub fn issued(issuer: impl Into<String>, code: impl Into<String>, limited: bool) -> Self {
        AssetKey {
            issuer: issuer.into(),
            code: code.into(),
            kind: if limited { AssetKind::Limited } else { AssetKind::Unlimited },
        }
    }
}

/// Supply-cap and fee metadata for a `Limited` (or `Unlimited`, fee-only)
/// asset, stored on the issuer's own [`AssetStore`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetProperty {
    pub max_supply: i64,
    /// Amount issued so far. Lives only on the issuer's store — holder rows
    /// never carry this field (spec §3).
    pub issued_amount: i64,
    /// Minimum `fee_percent` any order buying this asset must declare,
    /// in the same `FEE_BASE`-denominated units as `Order::fee_percent`.
    pub fee_percent: u32,
}

/// Per-account, per-asset balance row.
///
/// Invariant: `0 ≤ frozen ≤ amount ≤ property.max_supply` whenever
/// `property` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStore {
    pub amount: i64,
    pub frozen: i64,
    pub property: Option<AssetProperty>,
}

impl AssetStore {
    pub fn new(amount: i64) -> Self {
        AssetStore { amount, frozen: 0, property: None }
    }

    pub fn free_amount(&self) -> i64 {
        self.amount - self.frozen
    }

    pub fn is_consistent(&self) -> bool {
        if self.frozen < 0 || self.frozen > self.amount {
            return false;
        }
        if let Some(p) = &self.property {
            return self.amount <= p.max_supply;
        }
        true
    }
}
