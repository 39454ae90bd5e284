// crates/pylon-core/src/pair.rs
//
// Constant-product (x * y = k) reserve pair.
//
// Serves as the price/reserve oracle bonds read from, and lets tests and
// scenarios move the market (add liquidity, swap, donate + sync).
// First deposit mints sqrt(a * b) - MINIMUM_LIQUIDITY LP tokens and locks
// the minimum to the zero address; later deposits mint pro rata.

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::PylonError;
use crate::ledger::InMemoryLedger;
use crate::math::{checked_add, checked_sub, mul_div};
use crate::traits::{ReservePool, TokenLedger};
use crate::units::Amount;

/// LP units permanently locked on the first deposit.
pub const MINIMUM_LIQUIDITY: Amount = 1_000;

/// Swap fee in basis points (0.3%).
pub const SWAP_FEE_BPS: u128 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstantProductPair {
    address: Address,
    token0: Address,
    token1: Address,
    reserve0: Amount,
    reserve1: Amount,
}

impl ConstantProductPair {
    /// Create an empty pair. The pair's address is also its LP token.
    pub fn new(address: Address, token0: Address, token1: Address) -> Self {
        Self {
            address,
            token0,
            token1,
            reserve0: 0,
            reserve1: 0,
        }
    }

    /// Deposit both tokens from `provider` and mint LP tokens to it.
    ///
    /// Returns the LP amount minted.
    pub fn add_liquidity(
        &mut self,
        ledger: &mut InMemoryLedger,
        provider: &Address,
        amount0: Amount,
        amount1: Amount,
    ) -> Result<Amount, PylonError> {
        let supply = ledger.total_supply(&self.address);
        let minted = if supply == 0 {
            let root = (BigUint::from(amount0) * BigUint::from(amount1)).sqrt();
            let liquidity = root.to_u128().ok_or(PylonError::Overflow)?;
            if liquidity <= MINIMUM_LIQUIDITY {
                return Err(PylonError::InvalidState(
                    "Insufficient initial liquidity".to_string(),
                ));
            }
            ledger.mint(&self.address, &Address::ZERO, MINIMUM_LIQUIDITY)?;
            liquidity - MINIMUM_LIQUIDITY
        } else {
            let from0 = mul_div(amount0, supply, self.reserve0)?;
            let from1 = mul_div(amount1, supply, self.reserve1)?;
            from0.min(from1)
        };
        if minted == 0 {
            return Err(PylonError::InvalidState(
                "Insufficient liquidity minted".to_string(),
            ));
        }

        ledger.transfer(&self.token0, provider, &self.address, amount0)?;
        ledger.transfer(&self.token1, provider, &self.address, amount1)?;
        ledger.mint(&self.address, provider, minted)?;
        self.reserve0 = checked_add(self.reserve0, amount0)?;
        self.reserve1 = checked_add(self.reserve1, amount1)?;

        tracing::debug!(pair = %self.address, %provider, minted, "liquidity added");
        Ok(minted)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token0(&self) -> Address {
        self.token0
    }

    pub fn token1(&self) -> Address {
        self.token1
    }

    pub fn reserves(&self) -> (Amount, Amount) {
        (self.reserve0, self.reserve1)
    }

    /// Reserve held for `token`.
    pub fn reserve_of(&self, token: &Address) -> Result<Amount, PylonError> {
        PairView { pair: self, lp_supply: 0 }.reserve_of(token)
    }

    /// The other token of the pair.
    pub fn counterpart(&self, token: &Address) -> Result<Address, PylonError> {
        PairView { pair: self, lp_supply: 0 }.counterpart(token)
    }

    /// Quote the output of swapping `amount_in` of `token_in`.
    pub fn quote(&self, token_in: &Address, amount_in: Amount) -> Result<Amount, PylonError> {
        let reserve_in = self.reserve_of(token_in)?;
        let reserve_out = self.reserve_of(&self.counterpart(token_in)?)?;
        let in_with_fee = mul_div(amount_in, 10_000 - SWAP_FEE_BPS, 1)?;
        let denominator = checked_add(mul_div(reserve_in, 10_000, 1)?, in_with_fee)?;
        mul_div(in_with_fee, reserve_out, denominator)
    }

    /// Swap `amount_in` of `token_in` from `trader` for the other token.
    ///
    /// # Errors
    /// `InvalidState` if the output would be zero or below `min_out`.
    pub fn swap(
        &mut self,
        ledger: &mut InMemoryLedger,
        trader: &Address,
        token_in: &Address,
        amount_in: Amount,
        min_out: Amount,
    ) -> Result<Amount, PylonError> {
        let token_out = self.counterpart(token_in)?;
        let amount_out = self.quote(token_in, amount_in)?;
        if amount_out == 0 || amount_out < min_out {
            return Err(PylonError::InvalidState(format!(
                "Insufficient output amount: {} < {}",
                amount_out, min_out
            )));
        }

        ledger.transfer(token_in, trader, &self.address, amount_in)?;
        ledger.transfer(&token_out, &self.address, trader, amount_out)?;
        if *token_in == self.token0 {
            self.reserve0 = checked_add(self.reserve0, amount_in)?;
            self.reserve1 = checked_sub(self.reserve1, amount_out)?;
        } else {
            self.reserve1 = checked_add(self.reserve1, amount_in)?;
            self.reserve0 = checked_sub(self.reserve0, amount_out)?;
        }

        tracing::debug!(pair = %self.address, %trader, amount_in, amount_out, "swap");
        Ok(amount_out)
    }

    /// Force reserves to match the pair's actual token balances.
    pub fn sync(&mut self, ledger: &InMemoryLedger) {
        self.reserve0 = ledger.balance_of(&self.token0, &self.address);
        self.reserve1 = ledger.balance_of(&self.token1, &self.address);
    }

    /// Overwrite reserves directly (test fixtures).
    pub fn set_reserves(&mut self, reserve0: Amount, reserve1: Amount) {
        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
    }
}

/// A pair view that also knows its LP supply, for pricing.
#[derive(Debug, Clone, Copy)]
pub struct PairView<'a> {
    pub pair: &'a ConstantProductPair,
    pub lp_supply: Amount,
}

impl<'a> PairView<'a> {
    pub fn new(pair: &'a ConstantProductPair, ledger: &InMemoryLedger) -> Self {
        Self {
            pair,
            lp_supply: ledger.total_supply(&pair.address),
        }
    }
}

impl ReservePool for PairView<'_> {
    fn address(&self) -> Address {
        self.pair.address
    }

    fn token0(&self) -> Address {
        self.pair.token0
    }

    fn token1(&self) -> Address {
        self.pair.token1
    }

    fn reserves(&self) -> (Amount, Amount) {
        (self.pair.reserve0, self.pair.reserve1)
    }

    fn total_supply(&self) -> Amount {
        self.lp_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::tokens;

    struct Fixture {
        ledger: InMemoryLedger,
        pair: ConstantProductPair,
        payout: Address,
        weth: Address,
        lp: Address,
    }

    fn setup() -> Fixture {
        let payout = Address::from_label("payout");
        let weth = Address::from_label("weth");
        let lp = Address::from_label("pair");
        let deployer = Address::from_label("deployer");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&payout, &deployer, tokens(10_000)).unwrap();
        ledger.mint(&weth, &deployer, tokens(1_000)).unwrap();
        let mut pair = ConstantProductPair::new(lp, payout, weth);
        pair.add_liquidity(&mut ledger, &deployer, tokens(1_000), tokens(100))
            .unwrap();
        Fixture {
            ledger,
            pair,
            payout,
            weth,
            lp,
        }
    }

    #[test]
    fn test_first_deposit_locks_minimum() {
        let f = setup();
        let supply = f.ledger.total_supply(&f.lp);
        // sqrt(1000e18 * 100e18) = sqrt(1e41) ~ 316.227e18
        assert!(supply > tokens(316) && supply < tokens(317));
        assert_eq!(f.ledger.balance_of(&f.lp, &Address::ZERO), MINIMUM_LIQUIDITY);
        assert_eq!(f.pair.reserves(), (tokens(1_000), tokens(100)));
    }

    #[test]
    fn test_proportional_deposit() {
        let mut f = setup();
        let alice = Address::from_label("alice");
        f.ledger.mint(&f.payout, &alice, tokens(10)).unwrap();
        f.ledger.mint(&f.weth, &alice, tokens(1)).unwrap();
        let supply_before = f.ledger.total_supply(&f.lp);
        let minted = f
            .pair
            .add_liquidity(&mut f.ledger, &alice, tokens(10), tokens(1))
            .unwrap();
        // 1% of the pool
        assert_eq!(minted, supply_before / 100);
    }

    #[test]
    fn test_swap_moves_price() {
        let mut f = setup();
        let trader = Address::from_label("trader");
        f.ledger.mint(&f.weth, &trader, tokens(10)).unwrap();
        let out = f
            .pair
            .swap(&mut f.ledger, &trader, &f.weth, tokens(10), 0)
            .unwrap();
        assert!(out > tokens(90) && out < tokens(91));
        let (r0, r1) = f.pair.reserves();
        assert_eq!(r1, tokens(110));
        assert_eq!(r0, tokens(1_000) - out);
    }

    #[test]
    fn test_sync_after_donation() {
        let mut f = setup();
        let deployer = Address::from_label("deployer");
        f.ledger
            .transfer(&f.payout, &deployer, &f.lp, tokens(1_000))
            .unwrap();
        f.pair.sync(&f.ledger);
        assert_eq!(f.pair.reserves(), (tokens(2_000), tokens(100)));
    }

    #[test]
    fn test_view_reports_lp_supply() {
        let f = setup();
        let view = PairView::new(&f.pair, &f.ledger);
        assert_eq!(view.total_supply(), f.ledger.total_supply(&f.lp));
        assert_eq!(view.reserve_of(&f.payout).unwrap(), tokens(1_000));
        assert!(view.reserve_of(&Address::from_label("other")).is_err());
    }
}
