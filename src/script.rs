//! Embedded contract sandbox boundary (spec §1, §9: external collaborator,
//! interface only).
//!
//! `bumo`'s V8 sandbox can itself submit a nested transaction mid-script,
//! recursing back into the dispatcher. This crate models that re-entrancy
//! as a bounded call depth rather than executing any script: a
//! `ScriptHost` is handed a step budget and hands back at most one nested
//! submission per call.

use crate::error::EngineError;

/// Guards against unbounded script-callback recursion. Each nested
/// `submit_transaction` consumes one step; exhausting the budget is a
/// validation failure, not a fatal invariant, since a script author can
/// trigger it with untrusted input.
pub struct StepBudget {
    remaining: u32,
}

impl StepBudget {
    pub fn new(max_steps: u32) -> Self {
        StepBudget { remaining: max_steps }
    }

    pub fn consume(&mut self) -> Result<(), EngineError> {
        if self.remaining == 0 {
            return Err(EngineError::InvalidParameter("script recursion budget exhausted".to_string()));
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// Callback surface the embedded sandbox uses to re-enter the dispatcher.
/// No implementation ships in this crate — the sandbox itself is out of
/// scope (spec §1) — but the trait lets a dispatcher depend on "some
/// collaborator that can run a nested transaction" without naming a V8
/// binding.
pub trait ScriptHost: Send + Sync {
    /// Runs `payload` against `contract_address`, allowed to call back into
    /// the dispatcher at most once per step consumed from `budget`.
    fn submit_transaction(
        &self,
        contract_address: &str,
        payload: &[u8],
        budget: &mut StepBudget,
    ) -> Result<Vec<u8>, EngineError>;
}
