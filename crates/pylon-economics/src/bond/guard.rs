// crates/pylon-economics/src/bond/guard.rs
//
// Same-block deposit protection. An untrusted transaction origin may bond
// against a given price pool at most once per block, which keeps a single
// atomic transaction from moving the pool's price and bonding against it
// twice. Trusted origins (routers, keepers) bypass the check.

use std::collections::{BTreeMap, BTreeSet};

use pylon_core::{Address, PylonError};

#[derive(Debug, Clone, Default)]
pub struct FlashGuard {
    trusted_origins: BTreeSet<Address>,
    /// `(price pool, origin)` -> block of the last deposit.
    last_deposit_block: BTreeMap<(Address, Address), u64>,
}

impl FlashGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_trusted(&self, origin: &Address) -> bool {
        self.trusted_origins.contains(origin)
    }

    pub fn set_trusted(&mut self, origin: Address, trusted: bool) {
        if trusted {
            self.trusted_origins.insert(origin);
        } else {
            self.trusted_origins.remove(&origin);
        }
    }

    /// # Errors
    /// `FlashProtection` if `origin` already deposited against `pool` in
    /// `block`.
    pub fn check(&self, pool: &Address, origin: &Address, block: u64) -> Result<(), PylonError> {
        if self.is_trusted(origin) {
            return Ok(());
        }
        match self.last_deposit_block.get(&(*pool, *origin)) {
            Some(last) if *last == block => Err(PylonError::FlashProtection),
            _ => Ok(()),
        }
    }

    pub fn record(&mut self, pool: Address, origin: Address, block: u64) {
        if !self.is_trusted(&origin) {
            self.last_deposit_block.insert((pool, origin), block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_second_deposit_same_block_rejected() {
        let mut guard = FlashGuard::new();
        let (pool, alice) = (addr("pair"), addr("alice"));
        guard.check(&pool, &alice, 10).unwrap();
        guard.record(pool, alice, 10);
        assert_eq!(guard.check(&pool, &alice, 10), Err(PylonError::FlashProtection));
        assert!(guard.check(&pool, &alice, 11).is_ok());
        // Other origins and other pools are independent.
        assert!(guard.check(&pool, &addr("bob"), 10).is_ok());
        assert!(guard.check(&addr("other-pair"), &alice, 10).is_ok());
    }

    #[test]
    fn test_trusted_origin_bypasses() {
        let mut guard = FlashGuard::new();
        let (pool, router) = (addr("pair"), addr("router"));
        guard.set_trusted(router, true);
        guard.record(pool, router, 10);
        assert!(guard.check(&pool, &router, 10).is_ok());

        guard.set_trusted(router, false);
        guard.record(pool, router, 10);
        assert_eq!(guard.check(&pool, &router, 10), Err(PylonError::FlashProtection));
    }
}
