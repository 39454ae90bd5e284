// crates/pylon-economics/src/ownership.rs
//
// Two-step ownership: the current owner nominates a pending owner, who must
// claim. Composed into every component that has an owner of its own.

use serde::{Deserialize, Serialize};

use pylon_core::{Address, PylonError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
    /// `Address::ZERO` when no transfer is pending.
    pending_owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            pending_owner: Address::ZERO,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending_owner(&self) -> Address {
        self.pending_owner
    }

    /// # Errors
    /// `Unauthorized` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Address) -> Result<(), PylonError> {
        if self.owner.is_zero() || *caller != self.owner {
            return Err(PylonError::Unauthorized);
        }
        Ok(())
    }

    /// Nominate `new_owner`. Replaces any earlier nomination.
    pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<(), PylonError> {
        self.require_owner(caller)?;
        self.pending_owner = new_owner;
        Ok(())
    }

    /// Complete a pending transfer. Returns `(previous, new)` owner.
    ///
    /// # Errors
    /// `Unauthorized` unless `caller` is the nominated pending owner.
    pub fn claim(&mut self, caller: &Address) -> Result<(Address, Address), PylonError> {
        if self.pending_owner.is_zero() || *caller != self.pending_owner {
            return Err(PylonError::Unauthorized);
        }
        let previous = self.owner;
        self.owner = self.pending_owner;
        self.pending_owner = Address::ZERO;
        Ok((previous, self.owner))
    }
}
