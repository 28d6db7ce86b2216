//! Durable key/value store boundary (spec §1: external collaborator,
//! interface only).
//!
//! A real node backs this with an embedded SQL-backed store; this crate
//! only needs the contract and a minimal in-memory implementation for its
//! own tests.

use dashmap::DashMap;

/// A single batched mutation against a [`KvStore`].
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Durable key/value store contract. Network, on-disk format, and
/// compaction policy are out of scope for this core (spec §1).
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn put(&self, key: &[u8], value: &[u8]);
    fn delete(&self, key: &[u8]);
    fn batch(&self, ops: Vec<BatchOp>);
    /// Keys (and values) whose key starts with `prefix`, in key order.
    fn iterator(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// In-memory `KvStore` used by this crate's own tests and by
/// [`crate::context::EngineContext::in_memory`]. Not durable, not
/// concurrent-safe across processes — a stand-in for the real embedded
/// store named in spec §1.
#[derive(Default)]
pub struct MemoryKvStore {
    map: DashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.map.get(key).map(|v| v.clone())
    }

    fn put(&self, key: &[u8], value: &[u8]) {
        self.map.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&self, key: &[u8]) {
        self.map.remove(key);
    }

    fn batch(&self, ops: Vec<BatchOp>) {
        for op in ops {
            match op {
                BatchOp::Put(k, v) => self.put(&k, &v),
                BatchOp::Delete(k) => self.delete(&k),
            }
        }
    }

    fn iterator(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut out: Vec<_> = self
            .map
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}
