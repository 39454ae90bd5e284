// crates/pylon-economics/src/bond/position.rs

use serde::{Deserialize, Serialize};

use pylon_core::math::{checked_add, mul_div};
use pylon_core::{Amount, PylonError};

/// One account's vesting payout in a bond.
///
/// Vesting is linear from `last_claim` to `vesting_date`. A new bond on top of
/// an open position adds to `payout` and restarts the full vesting window for
/// the combined amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BondPosition {
    /// Bonded assets deposited over the life of the position.
    pub bonded_assets: Amount,
    /// Payout tokens not yet redeemed.
    pub payout: Amount,
    /// Timestamp at which the whole remaining payout is vested.
    pub vesting_date: u64,
    /// Timestamp vesting is measured from (last bond or redeem).
    pub last_claim: u64,
}

impl BondPosition {
    /// Fold a new bond into the position.
    pub fn add(
        &mut self,
        now: u64,
        vesting_time: u64,
        bonded_assets: Amount,
        payout: Amount,
    ) -> Result<(), PylonError> {
        self.bonded_assets = checked_add(self.bonded_assets, bonded_assets)?;
        self.payout = checked_add(self.payout, payout)?;
        self.vesting_date = now.saturating_add(vesting_time);
        self.last_claim = now;
        Ok(())
    }

    /// Portion of the remaining payout vested at `now`.
    pub fn vested(&self, now: u64) -> Result<Amount, PylonError> {
        if now >= self.vesting_date {
            return Ok(self.payout);
        }
        let elapsed = now.saturating_sub(self.last_claim) as u128;
        let window = (self.vesting_date - self.last_claim) as u128;
        Ok(mul_div(self.payout, elapsed, window)?.min(self.payout))
    }

    /// Take the vested portion out of the position. Returns the amount.
    pub fn claim(&mut self, now: u64) -> Result<Amount, PylonError> {
        let vested = self.vested(now)?;
        self.payout -= vested;
        self.last_claim = now;
        Ok(vested)
    }

    pub fn vesting_remaining(&self, now: u64) -> u64 {
        self.vesting_date.saturating_sub(now)
    }

    pub fn is_settled(&self) -> bool {
        self.payout == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_core::tokens;

    const VESTING: u64 = 432_000;

    #[test]
    fn test_linear_vesting() {
        let mut position = BondPosition::default();
        position.add(1_000, VESTING, 5, tokens(22)).unwrap();

        assert_eq!(position.vested(1_000).unwrap(), 0);
        assert_eq!(position.vested(1_000 + VESTING / 2).unwrap(), tokens(11));
        assert_eq!(position.vested(1_000 + VESTING).unwrap(), tokens(22));
        assert_eq!(position.vested(1_000 + 10 * VESTING).unwrap(), tokens(22));
    }

    #[test]
    fn test_claims_sum_to_payout() {
        let mut position = BondPosition::default();
        position.add(0, VESTING, 1, tokens(10)).unwrap();

        let first = position.claim(VESTING / 2).unwrap();
        assert_eq!(first, tokens(5));
        assert_eq!(position.vesting_remaining(VESTING / 2), VESTING / 2);

        // Remaining half vests over the remaining window.
        let second = position.claim(3 * VESTING / 4).unwrap();
        assert_eq!(second, tokens(5) / 2);

        let rest = position.claim(VESTING).unwrap();
        assert_eq!(first + second + rest, tokens(10));
        assert!(position.is_settled());
    }

    #[test]
    fn test_add_restarts_window() {
        let mut position = BondPosition::default();
        position.add(0, VESTING, 1, tokens(10)).unwrap();
        position.claim(VESTING / 2).unwrap();
        position.add(VESTING / 2, VESTING, 1, tokens(10)).unwrap();

        assert_eq!(position.payout, tokens(15));
        assert_eq!(position.bonded_assets, 2);
        assert_eq!(position.vesting_date, VESTING / 2 + VESTING);
        assert_eq!(position.vested(VESTING).unwrap(), tokens(15) / 2);
    }
}
