// crates/pylon-core/src/ledger.rs
//
// In-memory multi-token ledger. Stands in for the external token contracts:
// tests, the engine, and the CLI scenario runner all settle against it.

use std::collections::HashMap;

use crate::address::Address;
use crate::error::PylonError;
use crate::traits::TokenLedger;
use crate::units::Amount;

/// Balances and allowances for any number of tokens, keyed by token address.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(Address, Address), Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
    supplies: HashMap<Address, Amount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `token` out of thin air for `to`.
    pub fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<(), PylonError> {
        let supply = self.supplies.entry(*token).or_insert(0);
        *supply = supply.checked_add(amount).ok_or(PylonError::Overflow)?;
        let balance = self.balances.entry((*token, *to)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(PylonError::Overflow)?;
        Ok(())
    }

    /// Destroy `amount` of `from`'s `token`.
    pub fn burn(&mut self, token: &Address, from: &Address, amount: Amount) -> Result<(), PylonError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(PylonError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        self.balances.insert((*token, *from), available - amount);
        if let Some(supply) = self.supplies.get_mut(token) {
            *supply -= amount;
        }
        Ok(())
    }

    /// Total minted minus burned for `token`.
    pub fn total_supply(&self, token: &Address) -> Amount {
        self.supplies.get(token).copied().unwrap_or(0)
    }
}

impl TokenLedger for InMemoryLedger {
    fn balance_of(&self, token: &Address, who: &Address) -> Amount {
        self.balances.get(&(*token, *who)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(PylonError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(PylonError::Overflow)?;
        self.balances.insert((*token, *from), available - amount);
        self.balances.insert((*token, *to), credited);
        Ok(())
    }

    fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*token, *owner, *spender), amount);
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::tokens;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_mint_and_transfer() {
        let token = addr("token");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&token, &addr("alice"), tokens(100)).unwrap();
        ledger
            .transfer(&token, &addr("alice"), &addr("bob"), tokens(40))
            .unwrap();
        assert_eq!(ledger.balance_of(&token, &addr("alice")), tokens(60));
        assert_eq!(ledger.balance_of(&token, &addr("bob")), tokens(40));
        assert_eq!(ledger.total_supply(&token), tokens(100));
    }

    #[test]
    fn test_transfer_insufficient_leaves_state() {
        let token = addr("token");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&token, &addr("alice"), 10).unwrap();
        let result = ledger.transfer(&token, &addr("alice"), &addr("bob"), 11);
        assert!(matches!(result, Err(PylonError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(&token, &addr("alice")), 10);
        assert_eq!(ledger.balance_of(&token, &addr("bob")), 0);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let token = addr("token");
        let (alice, pool) = (addr("alice"), addr("pool"));
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&token, &alice, 100).unwrap();
        ledger.approve(&token, &alice, &pool, 60);

        ledger.transfer_from(&token, &pool, &alice, &pool, 50).unwrap();
        assert_eq!(ledger.allowance(&token, &alice, &pool), 10);
        assert_eq!(ledger.balance_of(&token, &pool), 50);

        let result = ledger.transfer_from(&token, &pool, &alice, &pool, 11);
        assert!(matches!(result, Err(PylonError::InsufficientAllowance { .. })));
    }

    #[test]
    fn test_burn() {
        let token = addr("lp");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&token, &addr("alice"), 100).unwrap();
        ledger.burn(&token, &addr("alice"), 30).unwrap();
        assert_eq!(ledger.total_supply(&token), 70);
        assert!(ledger.burn(&token, &addr("alice"), 71).is_err());
    }
}
