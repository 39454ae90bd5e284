// crates/pylon-core/src/traits.rs

use crate::address::Address;
use crate::error::PylonError;
use crate::units::Amount;

/// Fungible-token transfer primitive.
///
/// This is the external token collaborator: balances and allowances per
/// `(token, account)`. A transfer either fully succeeds or returns an error
/// with no balance touched; a `false` return from a real token contract maps
/// to `PylonError::TransferFailed`.
///
/// Implemented by `InMemoryLedger`.
pub trait TokenLedger {
    /// Balance of `who` in `token`.
    fn balance_of(&self, token: &Address, who: &Address) -> Amount;

    /// Move `amount` of `token` from `from` to `to`. The caller of this method
    /// is trusted to act with `from`'s authority.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PylonError>;

    /// Set `spender`'s allowance over `owner`'s `token` balance.
    fn approve(&mut self, token: &Address, owner: &Address, spender: &Address, amount: Amount);

    /// Remaining allowance of `spender` over `owner`'s `token`.
    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `from` to `to` consuming `spender`'s allowance.
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(PylonError::InsufficientAllowance {
                requested: amount,
                allowance,
            });
        }
        self.transfer(token, from, to, amount)?;
        self.approve(token, from, spender, allowance - amount);
        Ok(())
    }
}

/// Read-only view of a two-token reserve pool used as a price reference.
///
/// Implemented by `ConstantProductPair`.
pub trait ReservePool {
    /// Address of the pool; also the identity of its LP token.
    fn address(&self) -> Address;

    fn token0(&self) -> Address;

    fn token1(&self) -> Address;

    /// Current `(reserve0, reserve1)`.
    fn reserves(&self) -> (Amount, Amount);

    /// Outstanding LP token supply.
    fn total_supply(&self) -> Amount;

    /// Reserve held for `token`, or `NotFound` if the pool does not hold it.
    fn reserve_of(&self, token: &Address) -> Result<Amount, PylonError> {
        let (reserve0, reserve1) = self.reserves();
        if *token == self.token0() {
            Ok(reserve0)
        } else if *token == self.token1() {
            Ok(reserve1)
        } else {
            Err(PylonError::NotFound(format!(
                "token {} is not part of pool {}",
                token,
                self.address()
            )))
        }
    }

    /// The other token of the pair.
    fn counterpart(&self, token: &Address) -> Result<Address, PylonError> {
        if *token == self.token0() {
            Ok(self.token1())
        } else if *token == self.token1() {
            Ok(self.token0())
        } else {
            Err(PylonError::NotFound(format!(
                "token {} is not part of pool {}",
                token,
                self.address()
            )))
        }
    }
}
