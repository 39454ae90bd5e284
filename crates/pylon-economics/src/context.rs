// crates/pylon-economics/src/context.rs
//
// Per-transaction environment: who is calling, which externally-owned
// account started the transaction, and the block clock. The clock never
// moves within a transaction.

use serde::{Deserialize, Serialize};

use pylon_core::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    /// Immediate caller. Changes on nested component-to-component calls.
    pub caller: Address,
    /// Account that signed the outer transaction. Never changes.
    pub origin: Address,
    /// Block timestamp in seconds.
    pub now: u64,
    /// Block height.
    pub block: u64,
}

impl TxContext {
    /// Context for a transaction sent directly by `caller`.
    pub fn new(caller: Address, now: u64, block: u64) -> Self {
        Self {
            caller,
            origin: caller,
            now,
            block,
        }
    }

    /// Same transaction with a different signing origin (relayed calls).
    pub fn with_origin(mut self, origin: Address) -> Self {
        self.origin = origin;
        self
    }

    /// Context for a nested call made by the component at `caller`.
    pub fn as_caller(&self, caller: Address) -> Self {
        Self { caller, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_call_keeps_origin_and_clock() {
        let alice = Address::from_label("alice");
        let bond = Address::from_label("bond");
        let ctx = TxContext::new(alice, 1_000, 7);
        let inner = ctx.as_caller(bond);
        assert_eq!(inner.caller, bond);
        assert_eq!(inner.origin, alice);
        assert_eq!((inner.now, inner.block), (1_000, 7));
    }
}
