//! Order-book matching and settlement core for a ledger's DEX subsystem.
//!
//! Given a `ProcessOrder` operation, this crate validates it, crosses it
//! against the resting book under strict price-time priority, settles
//! fills against the account world, persists the unfilled remainder, and
//! emits the claim trail describing what happened. Network transport,
//! consensus, signature verification, and wire (de)serialization live
//! above this crate; see [`kv`], [`sql`], and [`script`] for the
//! collaborator boundaries this core expects but does not implement.
//!
//! Ground truth throughout is `bumo`'s ledger module (`order_exchange.*`,
//! `order_frm.*`, `operation_frm.cpp`, `base_int.cpp`) — see `DESIGN.md`
//! for the file-by-file grounding.

pub mod account;
pub mod asset;
pub mod book;
pub mod context;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod exchange;
pub mod fee;
pub mod kv;
pub mod matcher;
pub mod order;
pub mod price;
pub mod script;
pub mod sql;
mod utils;

pub use account::Account;
pub use asset::{AssetKey, AssetKind, AssetStore};
pub use context::EngineContext;
pub use dispatcher::{Operation, OperationResult, OrderEffect, dispatch};
pub use error::{EngineError, ResultCode};
pub use exchange::{ExchangeOutcome, ExchangeResult, exchange};
pub use order::{ClaimOrder, Order};
pub use price::Price;
