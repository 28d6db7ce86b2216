//! Replaces `bumo`'s `LedgerManager::Instance()`/`Storage::Instance()`
//! global singletons with an explicit, constructible context (spec §9).

use crate::book::OrderBookStore;
use crate::book::memory::MemoryOrderBook;
use crate::environment::Environment;
use crate::fee::FeeConfig;
use crate::kv::{KvStore, MemoryKvStore};
use std::sync::Arc;

/// Everything a [`crate::dispatcher::dispatch`] call needs: the fee
/// schedule, the account overlay, the resting book, and the block/tx
/// coordinates used to mint canonical order ids.
pub struct EngineContext {
    pub fee_config: FeeConfig,
    pub accounts: Environment,
    pub book: Box<dyn OrderBookStore>,
    pub block_num: u64,
    pub tx_index: u32,
}

impl EngineContext {
    pub fn new(
        fee_config: FeeConfig,
        store: Arc<dyn KvStore>,
        book: Box<dyn OrderBookStore>,
        block_num: u64,
        tx_index: u32,
    ) -> Self {
        EngineContext { fee_config, accounts: Environment::new(store), book, block_num, tx_index }
    }

    /// A fully in-memory context, for tests and for embedders with no
    /// durable backend of their own.
    pub fn in_memory(fee_config: FeeConfig, block_num: u64, tx_index: u32) -> Self {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        EngineContext::new(fee_config, store, Box::new(MemoryOrderBook::new()), block_num, tx_index)
    }

    /// Commits the account overlay. Callers invoke this only once the whole
    /// operation succeeded; on any earlier failure the context (and its
    /// `Environment`) is simply dropped (spec §5's "SERIALIZABLE" rollback).
    pub fn commit(&self) {
        self.accounts.commit();
    }
}
