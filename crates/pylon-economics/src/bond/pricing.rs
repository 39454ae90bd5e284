// crates/pylon-economics/src/bond/pricing.rs
//
// Valuation of bonded assets in payout tokens.
//
// Two sources share one shape: a spot price read from a reserve pool, a
// fair value for the deposited amount, and the inverse used to cap bond
// size. LP bonds value the LP token at twice its payout-token backing;
// single-asset bonds convert through the pool's reserve ratio.

use serde::{Deserialize, Serialize};

use pylon_core::math::{checked_add, mul_div};
use pylon_core::{Address, Amount, PylonError, ReservePool, BPS_DENOMINATOR, UNIT};

/// How a bond prices what it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceSource {
    /// The bonded asset is the LP token of `pair`, which holds the payout
    /// token on one side.
    LpReserves { pair: Address },
    /// The bonded asset is `asset`, priced through `price_pair`, a pool of
    /// the payout token against `asset`.
    SingleAsset { asset: Address, price_pair: Address },
}

impl PriceSource {
    /// Token a bonder deposits.
    pub fn bond_asset(&self) -> Address {
        match self {
            PriceSource::LpReserves { pair } => *pair,
            PriceSource::SingleAsset { asset, .. } => *asset,
        }
    }

    /// Pool read for prices.
    pub fn price_pool(&self) -> Address {
        match self {
            PriceSource::LpReserves { pair } => *pair,
            PriceSource::SingleAsset { price_pair, .. } => *price_pair,
        }
    }

    fn check_pool(&self, pool: &dyn ReservePool) -> Result<(), PylonError> {
        if pool.address() != self.price_pool() {
            return Err(PylonError::InvalidState(format!(
                "price pool {} does not match bond source {}",
                pool.address(),
                self.price_pool()
            )));
        }
        Ok(())
    }

    /// Reserves as `(payout side, other side)`.
    fn reserves(
        &self,
        pool: &dyn ReservePool,
        payout_token: &Address,
    ) -> Result<(Amount, Amount), PylonError> {
        self.check_pool(pool)?;
        let other = pool.counterpart(payout_token)?;
        if let PriceSource::SingleAsset { asset, .. } = self {
            if other != *asset {
                return Err(PylonError::NotFound(format!(
                    "asset {} is not paired with the payout token in {}",
                    asset,
                    pool.address()
                )));
            }
        }
        let reserve_payout = pool.reserve_of(payout_token)?;
        let reserve_other = pool.reserve_of(&other)?;
        if reserve_payout == 0 || reserve_other == 0 {
            return Err(PylonError::InvalidState(format!(
                "pool {} has empty reserves",
                pool.address()
            )));
        }
        Ok((reserve_payout, reserve_other))
    }

    /// Payout token price in units of the paired asset, scaled by `UNIT`.
    pub fn spot_price(
        &self,
        pool: &dyn ReservePool,
        payout_token: &Address,
    ) -> Result<u128, PylonError> {
        let (reserve_payout, reserve_other) = self.reserves(pool, payout_token)?;
        mul_div(reserve_other, UNIT, reserve_payout)
    }

    /// Value of `amount` bonded assets in payout tokens, before any discount.
    pub fn fair_value(
        &self,
        pool: &dyn ReservePool,
        payout_token: &Address,
        amount: Amount,
    ) -> Result<Amount, PylonError> {
        let (reserve_payout, reserve_other) = self.reserves(pool, payout_token)?;
        match self {
            PriceSource::LpReserves { .. } => {
                let supply = lp_supply(pool)?;
                let backing = checked_add(reserve_payout, reserve_payout)?;
                mul_div(amount, backing, supply)
            }
            PriceSource::SingleAsset { .. } => mul_div(amount, reserve_payout, reserve_other),
        }
    }

    /// Largest bonded amount whose fair value does not exceed `value`.
    pub fn amount_for_value(
        &self,
        pool: &dyn ReservePool,
        payout_token: &Address,
        value: Amount,
    ) -> Result<Amount, PylonError> {
        let (reserve_payout, reserve_other) = self.reserves(pool, payout_token)?;
        match self {
            PriceSource::LpReserves { .. } => {
                let supply = lp_supply(pool)?;
                let backing = checked_add(reserve_payout, reserve_payout)?;
                mul_div(value, supply, backing)
            }
            PriceSource::SingleAsset { .. } => mul_div(value, reserve_other, reserve_payout),
        }
    }
}

fn lp_supply(pool: &dyn ReservePool) -> Result<Amount, PylonError> {
    match pool.total_supply() {
        0 => Err(PylonError::InvalidState(format!(
            "pool {} has no LP supply",
            pool.address()
        ))),
        supply => Ok(supply),
    }
}

/// `value` plus the bond discount premium.
pub fn with_discount(value: Amount, discount_bps: u32) -> Result<Amount, PylonError> {
    mul_div(value, BPS_DENOMINATOR + discount_bps as u128, BPS_DENOMINATOR)
}

/// Inverse of `with_discount`: the fair value that earns at most `payout`.
pub fn without_discount(payout: Amount, discount_bps: u32) -> Result<Amount, PylonError> {
    mul_div(payout, BPS_DENOMINATOR, BPS_DENOMINATOR + discount_bps as u128)
}
