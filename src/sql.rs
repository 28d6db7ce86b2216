//! SQL session / prepared-statement boundary (spec §1, §5: external
//! collaborator, interface only).
//!
//! `bumo`'s `std::map` of prepared statements keyed by SQL text is "a
//! straightforward statement cache" (spec §9) — implementations may choose
//! any interning strategy as long as `clear()` runs before any
//! schema-altering operation. This crate never issues SQL itself; the trait
//! exists so [`crate::book::OrderBookStore`] has somewhere to say "this runs
//! inside a SQL transaction scope" without this core depending on an actual
//! database driver.

/// A session-scoped SQL transaction. Commits on `Drop` success path is left
/// to the implementation; this core's contract is only: construct one
/// around a `ProcessOrder`, and only call [`EngineContext::commit`] — never
/// `SqlSession` directly — when the operation result is `Ok`.
pub trait SqlTransaction {
    fn commit(self: Box<Self>);
    fn rollback(self: Box<Self>);
}

/// Opaque SQL session collaborator. `execute`/`query` take raw SQL text and
/// positional parameters; this crate never constructs either, since no
/// module here issues SQL (the reference `OrderBookStore` impl is in-memory).
pub trait SqlSession: Send + Sync {
    fn execute(&self, sql: &str, params: &[&str]) -> Result<u64, String>;
    fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Vec<String>>, String>;
    fn transaction(&self) -> Box<dyn SqlTransaction>;
}
