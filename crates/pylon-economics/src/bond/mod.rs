// crates/pylon-economics/src/bond/mod.rs
//
// Discounted bond issuer.
//
// A bond sells the payout token at a premium in exchange for an asset the
// protocol wants to own: LP tokens of a payout-token pool, or a single token
// priced through such a pool. The deposited assets go straight to the
// treasury; the payout is pulled from the treasury against the bond's
// allowance and vests linearly to the bonder. At redemption the vested
// payout is either paid out or staked into the staking pool on the bonder's
// behalf.
//
// The bond's manager is the owner of its treasury.

pub mod guard;
pub mod position;
pub mod pricing;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pylon_core::{tokens, Address, Amount, PylonError, ReservePool, TokenLedger, UNIT};

use crate::context::TxContext;
use crate::events::{parameter_changed, BondCreated, BondRedeemed, EventLog};
use crate::staking::StakingPool;
use crate::treasury::Treasury;

pub use guard::FlashGuard;
pub use position::BondPosition;
pub use pricing::{with_discount, without_discount, PriceSource};

/// Default vesting window: 5 days.
pub const DEFAULT_VESTING_TIME: u64 = 432_000;

/// Default premium paid on top of fair value: 10%.
pub const DEFAULT_DISCOUNT_BPS: u32 = 1_000;

/// Economic parameters of a bond, changed together by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondTerms {
    /// Largest payout a single bond may produce.
    #[serde(with = "pylon_core::units::serde_amount")]
    pub payout_limit: Amount,
    /// Seconds over which a payout vests.
    pub vesting_time: u64,
    /// Premium over fair value, in basis points.
    pub discount_bps: u32,
    /// Floor on the payout token's spot price, scaled by `UNIT`.
    #[serde(with = "pylon_core::units::serde_amount")]
    pub min_price: u128,
}

impl Default for BondTerms {
    fn default() -> Self {
        Self {
            payout_limit: tokens(100),
            vesting_time: DEFAULT_VESTING_TIME,
            discount_bps: DEFAULT_DISCOUNT_BPS,
            min_price: UNIT / 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BondIssuer {
    address: Address,
    payout_token: Address,
    treasury: Address,
    staking: Address,
    source: PriceSource,
    terms: BondTerms,
    positions: BTreeMap<Address, BondPosition>,
    guard: FlashGuard,
}

impl BondIssuer {
    pub fn new(
        address: Address,
        payout_token: Address,
        treasury: Address,
        staking: Address,
        source: PriceSource,
        terms: BondTerms,
    ) -> Self {
        Self {
            address,
            payout_token,
            treasury,
            staking,
            source,
            terms,
            positions: BTreeMap::new(),
            guard: FlashGuard::new(),
        }
    }

    // ---- Views ----

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn payout_token(&self) -> Address {
        self.payout_token
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    pub fn staking(&self) -> Address {
        self.staking
    }

    pub fn source(&self) -> PriceSource {
        self.source
    }

    pub fn terms(&self) -> BondTerms {
        self.terms
    }

    pub fn position(&self, owner: &Address) -> Option<&BondPosition> {
        self.positions.get(owner)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&Address, &BondPosition)> {
        self.positions.iter()
    }

    pub fn is_trusted_origin(&self, origin: &Address) -> bool {
        self.guard.is_trusted(origin)
    }

    /// Payout token spot price from the price pool, scaled by `UNIT`.
    pub fn spot_price(&self, pool: &dyn ReservePool) -> Result<u128, PylonError> {
        self.source.spot_price(pool, &self.payout_token)
    }

    /// Gross payout for bonding `amount`, before the treasury fee.
    ///
    /// # Errors
    /// `PriceTooLow` when the spot price is under the bond's floor.
    pub fn estimate_reward(
        &self,
        pool: &dyn ReservePool,
        amount: Amount,
    ) -> Result<Amount, PylonError> {
        let price = self.spot_price(pool)?;
        if price < self.terms.min_price {
            return Err(PylonError::PriceTooLow {
                price,
                min_price: self.terms.min_price,
            });
        }
        let value = self.source.fair_value(pool, &self.payout_token, amount)?;
        with_discount(value, self.terms.discount_bps)
    }

    /// Largest bondable amount given the payout limit and `allowance` left in
    /// the treasury.
    pub fn max_bond_amount(
        &self,
        pool: &dyn ReservePool,
        allowance: Amount,
    ) -> Result<Amount, PylonError> {
        let payout_cap = self.terms.payout_limit.min(allowance);
        let value_cap = without_discount(payout_cap, self.terms.discount_bps)?;
        self.source
            .amount_for_value(pool, &self.payout_token, value_cap)
    }

    /// Payout tokens vested for `owner` at `now`.
    pub fn pending_payout(&self, owner: &Address, now: u64) -> Result<Amount, PylonError> {
        match self.positions.get(owner) {
            Some(position) => position.vested(now),
            None => Ok(0),
        }
    }

    // ---- Bonder operations ----

    /// Deposit `amount` of the bond asset for a vesting payout.
    ///
    /// The caller must have approved the bond for `amount`. Returns the
    /// creation record; `payout` is the caller's whole unvested position
    /// after this deposit, net of the treasury fee.
    ///
    /// # Errors
    /// - `FlashProtection` on a second deposit by an untrusted origin in one block.
    /// - `BondTooBig` when `amount` exceeds the allowance-derived cap.
    /// - `PriceTooLow` when the payout token trades under `min_price`.
    /// - `SlippageMinReward` when the gross payout is below `min_payout`.
    #[allow(clippy::too_many_arguments)]
    pub fn bond(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        treasury: &mut Treasury,
        pool: &dyn ReservePool,
        amount: Amount,
        min_payout: Amount,
        events: &mut EventLog,
    ) -> Result<BondCreated, PylonError> {
        if amount == 0 {
            return Err(PylonError::InvalidState("Cannot bond 0".to_string()));
        }
        if treasury.address() != self.treasury {
            return Err(PylonError::InvalidState(format!(
                "bond {} is not backed by treasury {}",
                self.address,
                treasury.address()
            )));
        }
        let pool_address = pool.address();
        self.guard.check(&pool_address, &ctx.origin, ctx.block)?;

        let max = self.max_bond_amount(pool, treasury.bond_allowance(&self.address))?;
        if amount > max {
            return Err(PylonError::BondTooBig {
                requested: amount,
                max,
            });
        }
        let payout = self.estimate_reward(pool, amount)?;
        if payout < min_payout {
            return Err(PylonError::SlippageMinReward { payout, min_payout });
        }

        let bonder = ctx.caller;
        ledger.transfer_from(
            &self.source.bond_asset(),
            &self.address,
            &bonder,
            &treasury.address(),
            amount,
        )?;
        let received = treasury.get_reward(&ctx.as_caller(self.address), ledger, payout, events)?;

        let position = self.positions.entry(bonder).or_default();
        position.add(ctx.now, self.terms.vesting_time, amount, received.net)?;
        let (payout, vesting_date) = (position.payout, position.vesting_date);
        self.guard.record(pool_address, ctx.origin, ctx.block);

        tracing::info!(
            bond = %self.address,
            %bonder,
            bonded_assets = amount,
            payout,
            vesting_date,
            "bond created"
        );
        let created = BondCreated {
            bond: self.address,
            owner: bonder,
            bonded_assets: amount,
            payout,
            vesting_date,
        };
        events.push(created.clone().into());
        Ok(created)
    }

    /// Release the caller's vested payout, optionally staking it.
    ///
    /// `staking` is required when `stake` is set and must be the bond's
    /// staking pool. A caller without a position gets an all-zero record.
    pub fn redeem(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        staking: Option<&mut StakingPool>,
        stake: bool,
        events: &mut EventLog,
    ) -> Result<BondRedeemed, PylonError> {
        let owner = ctx.caller;
        let Some(position) = self.positions.get_mut(&owner) else {
            return Ok(BondRedeemed {
                bond: self.address,
                owner,
                payout_redeemed: 0,
                payout_remaining: 0,
                vesting_remaining: 0,
                tokens_staked: stake,
            });
        };

        let redeemed = position.claim(ctx.now)?;
        let payout_remaining = position.payout;
        let vesting_remaining = position.vesting_remaining(ctx.now);
        if position.is_settled() {
            self.positions.remove(&owner);
        }

        if redeemed > 0 {
            if stake {
                let pool = staking.ok_or_else(|| {
                    PylonError::InvalidState("staking pool required to stake".to_string())
                })?;
                if pool.address() != self.staking || pool.staking_token() != self.payout_token {
                    return Err(PylonError::InvalidState(format!(
                        "pool {} is not the bond's staking pool",
                        pool.address()
                    )));
                }
                ledger.approve(&self.payout_token, &self.address, &pool.address(), redeemed);
                pool.stake(&ctx.as_caller(self.address), ledger, redeemed, owner, events)?;
            } else {
                ledger.transfer(&self.payout_token, &self.address, &owner, redeemed)?;
            }
        }

        tracing::info!(
            bond = %self.address,
            %owner,
            redeemed,
            payout_remaining,
            vesting_remaining,
            staked = stake,
            "bond redeemed"
        );
        let record = BondRedeemed {
            bond: self.address,
            owner,
            payout_redeemed: redeemed,
            payout_remaining,
            vesting_remaining,
            tokens_staked: stake,
        };
        events.push(record.clone().into());
        Ok(record)
    }

    // ---- Manager operations ----
    //
    // `manager` is the current owner of the bond's treasury.

    pub fn change_terms(
        &mut self,
        ctx: &TxContext,
        manager: Address,
        terms: BondTerms,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_manager(&ctx.caller, &manager)?;
        self.terms = terms;
        tracing::info!(bond = %self.address, ?terms, "bond terms changed");
        events.push(parameter_changed(
            self.address,
            "terms",
            format!(
                "payout_limit={} vesting_time={} discount_bps={} min_price={}",
                terms.payout_limit, terms.vesting_time, terms.discount_bps, terms.min_price
            ),
        ));
        Ok(())
    }

    /// Re-point a single-asset bond at another price pool.
    pub fn change_price_pair(
        &mut self,
        ctx: &TxContext,
        manager: Address,
        pair: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_manager(&ctx.caller, &manager)?;
        match &mut self.source {
            PriceSource::SingleAsset { price_pair, .. } => *price_pair = pair,
            PriceSource::LpReserves { .. } => {
                return Err(PylonError::InvalidState(
                    "LP bonds price from their own pair".to_string(),
                ))
            }
        }
        events.push(parameter_changed(self.address, "price_pair", pair));
        Ok(())
    }

    pub fn change_treasury(
        &mut self,
        ctx: &TxContext,
        manager: Address,
        treasury: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_manager(&ctx.caller, &manager)?;
        self.treasury = treasury;
        events.push(parameter_changed(self.address, "treasury", treasury));
        Ok(())
    }

    pub fn change_staking(
        &mut self,
        ctx: &TxContext,
        manager: Address,
        staking: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_manager(&ctx.caller, &manager)?;
        self.staking = staking;
        events.push(parameter_changed(self.address, "staking", staking));
        Ok(())
    }

    pub fn set_trusted_origin(
        &mut self,
        ctx: &TxContext,
        manager: Address,
        origin: Address,
        trusted: bool,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_manager(&ctx.caller, &manager)?;
        self.guard.set_trusted(origin, trusted);
        events.push(parameter_changed(
            self.address,
            "trusted_origin",
            format!("{}={}", origin, trusted),
        ));
        Ok(())
    }
}

fn require_manager(caller: &Address, manager: &Address) -> Result<(), PylonError> {
    if manager.is_zero() || caller != manager {
        return Err(PylonError::Unauthorized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ProtocolEvent;
    use crate::staking::DEFAULT_REWARDS_DURATION;
    use pylon_core::math::mul_div;
    use pylon_core::{ConstantProductPair, InMemoryLedger, PairView};

    const T0: u64 = 1_700_000_000;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn ctx(caller: &str, now: u64, block: u64) -> TxContext {
        TxContext::new(addr(caller), now, block)
    }

    struct Fixture {
        ledger: InMemoryLedger,
        treasury: Treasury,
        pair: ConstantProductPair,
        bond: BondIssuer,
        pool: StakingPool,
        events: EventLog,
    }

    /// Single-asset WETH bond priced on a 100 payout / 10 WETH pair, with a
    /// treasury holding 1,000 payout tokens and alice holding 100 WETH.
    fn fixture(fee_bps: u32) -> Fixture {
        let mut ledger = InMemoryLedger::new();
        let mut events = EventLog::new();
        let mut pair = ConstantProductPair::new(addr("pair"), addr("payout"), addr("weth"));
        ledger.mint(&addr("payout"), &addr("lp"), tokens(100)).unwrap();
        ledger.mint(&addr("weth"), &addr("lp"), tokens(10)).unwrap();
        pair.add_liquidity(&mut ledger, &addr("lp"), tokens(100), tokens(10))
            .unwrap();

        let mut treasury = Treasury::new(addr("treasury"), addr("payout"), addr("owner"), addr("dao"));
        ledger.mint(&addr("payout"), &addr("treasury"), tokens(1_000)).unwrap();
        treasury
            .set_bond_data(&ctx("owner", T0, 1), addr("bond"), true, tokens(1_000), fee_bps, &mut events)
            .unwrap();

        let bond = BondIssuer::new(
            addr("bond"),
            addr("payout"),
            addr("treasury"),
            addr("staking"),
            PriceSource::SingleAsset {
                asset: addr("weth"),
                price_pair: addr("pair"),
            },
            BondTerms::default(),
        );
        let pool = StakingPool::new(
            addr("staking"),
            addr("payout"),
            addr("payout"),
            addr("treasury"),
            DEFAULT_REWARDS_DURATION,
        );
        ledger.mint(&addr("weth"), &addr("alice"), tokens(100)).unwrap();
        ledger.approve(&addr("weth"), &addr("alice"), &addr("bond"), u128::MAX);

        Fixture {
            ledger,
            treasury,
            pair,
            bond,
            pool,
            events,
        }
    }

    impl Fixture {
        fn bond(&mut self, ctx: &TxContext, amount: Amount, min: Amount) -> Result<BondCreated, PylonError> {
            let view = PairView::new(&self.pair, &self.ledger);
            self.bond.bond(
                ctx,
                &mut self.ledger,
                &mut self.treasury,
                &view,
                amount,
                min,
                &mut self.events,
            )
        }
    }

    #[test]
    fn test_bond_single_asset() {
        let mut f = fixture(0);
        let created = f.bond(&ctx("alice", T0, 1), tokens(10), 0).unwrap();
        assert_eq!(created.payout, tokens(110));
        assert_eq!(created.vesting_date, T0 + DEFAULT_VESTING_TIME);
        assert_eq!(f.ledger.balance_of(&addr("weth"), &addr("treasury")), tokens(10));
        assert_eq!(f.ledger.balance_of(&addr("payout"), &addr("bond")), tokens(110));
        assert_eq!(f.treasury.bond_allowance(&addr("bond")), tokens(890));
    }

    #[test]
    fn test_position_records_payout_net_of_fee() {
        let mut f = fixture(1_000);
        let created = f.bond(&ctx("alice", T0, 1), tokens(10), 0).unwrap();
        assert_eq!(created.payout, tokens(99));
        assert_eq!(f.bond.position(&addr("alice")).unwrap().payout, tokens(99));
    }

    #[test]
    fn test_bond_too_big() {
        let mut f = fixture(0);
        let view = PairView::new(&f.pair, &f.ledger);
        // 100 payout limit / 1.1 = 90.9 payout of value = 9.09 WETH.
        let max = f.bond.max_bond_amount(&view, tokens(1_000)).unwrap();
        assert_eq!(max, mul_div(tokens(100), 10_000, 11_000).unwrap() / 10);
        let err = f.bond(&ctx("alice", T0, 1), max + 1, 0).unwrap_err();
        assert!(matches!(err, PylonError::BondTooBig { .. }));
        assert!(f.bond(&ctx("alice", T0, 1), max, 0).is_ok());
    }

    #[test]
    fn test_small_allowance_caps_bond() {
        let mut f = fixture(0);
        f.treasury
            .set_bond_data(&ctx("owner", T0, 1), addr("bond"), true, tokens(11), 0, &mut f.events)
            .unwrap();
        let err = f.bond(&ctx("alice", T0, 1), tokens(2), 0).unwrap_err();
        assert!(matches!(err, PylonError::BondTooBig { .. }));
        assert!(f.bond(&ctx("alice", T0, 1), tokens(1), 0).is_ok());
    }

    #[test]
    fn test_slippage() {
        let mut f = fixture(0);
        let err = f.bond(&ctx("alice", T0, 1), tokens(1), tokens(12)).unwrap_err();
        assert_eq!(
            err,
            PylonError::SlippageMinReward {
                payout: tokens(11),
                min_payout: tokens(12)
            }
        );
    }

    #[test]
    fn test_price_floor() {
        let mut f = fixture(0);
        let mut terms = BondTerms::default();
        terms.min_price = UNIT; // 1 WETH per payout token; actual is 0.1
        f.bond
            .change_terms(&ctx("owner", T0, 1), addr("owner"), terms, &mut f.events)
            .unwrap();
        let err = f.bond(&ctx("alice", T0, 1), tokens(1), 0).unwrap_err();
        assert!(matches!(err, PylonError::PriceTooLow { .. }));
        assert_eq!(err.to_string(), "Price too low for bond minting");
    }

    #[test]
    fn test_flash_protection() {
        let mut f = fixture(0);
        f.bond(&ctx("alice", T0, 5), tokens(1), 0).unwrap();
        assert_eq!(
            f.bond(&ctx("alice", T0, 5), tokens(1), 0),
            Err(PylonError::FlashProtection)
        );
        // Next block is fine.
        assert!(f.bond(&ctx("alice", T0 + 12, 6), tokens(1), 0).is_ok());

        // A trusted router may deposit repeatedly.
        f.bond
            .set_trusted_origin(&ctx("owner", T0, 6), addr("owner"), addr("alice"), true, &mut f.events)
            .unwrap();
        f.bond(&ctx("alice", T0 + 24, 7), tokens(1), 0).unwrap();
        assert!(f.bond(&ctx("alice", T0 + 24, 7), tokens(1), 0).is_ok());
    }

    #[test]
    fn test_redeem_linear_then_settled() {
        let mut f = fixture(0);
        f.bond(&ctx("alice", T0, 1), tokens(10), 0).unwrap();

        let half = f
            .bond
            .redeem(&ctx("alice", T0 + DEFAULT_VESTING_TIME / 2, 2), &mut f.ledger, None, false, &mut f.events)
            .unwrap();
        assert_eq!(half.payout_redeemed, tokens(55));
        assert_eq!(half.payout_remaining, tokens(55));
        assert_eq!(half.vesting_remaining, DEFAULT_VESTING_TIME / 2);

        let rest = f
            .bond
            .redeem(&ctx("alice", T0 + DEFAULT_VESTING_TIME, 3), &mut f.ledger, None, false, &mut f.events)
            .unwrap();
        assert_eq!(rest.payout_redeemed, tokens(55));
        assert_eq!(rest.payout_remaining, 0);
        assert!(f.bond.position(&addr("alice")).is_none());
        assert_eq!(f.ledger.balance_of(&addr("payout"), &addr("alice")), tokens(110));

        // Nothing left: zero record, no transfer.
        let again = f
            .bond
            .redeem(&ctx("alice", T0 + 2 * DEFAULT_VESTING_TIME, 4), &mut f.ledger, None, false, &mut f.events)
            .unwrap();
        assert_eq!(again.payout_redeemed, 0);
    }

    #[test]
    fn test_second_bond_blends_unvested_remainder() {
        let mut f = fixture(0);
        let first = f.bond(&ctx("alice", T0, 1), tokens(5), 0).unwrap();
        assert_eq!(first.payout, tokens(55));

        let half = T0 + DEFAULT_VESTING_TIME / 2;
        let redeemed = f
            .bond
            .redeem(&ctx("alice", half, 2), &mut f.ledger, None, false, &mut f.events)
            .unwrap();
        assert_eq!(redeemed.payout_redeemed, tokens(55) / 2);

        // 11 new on top of the 27.5 still vesting, re-vested from now.
        let second = f.bond(&ctx("alice", half, 3), tokens(1), 0).unwrap();
        assert_eq!(second.payout, tokens(77) / 2);
        assert_eq!(second.vesting_date, half + DEFAULT_VESTING_TIME);
        assert_eq!(f.events.last(), Some(&ProtocolEvent::BondCreated(second.clone())));
        let position = f.bond.position(&addr("alice")).unwrap();
        assert_eq!(position.payout, second.payout);
        assert_eq!(position.vesting_date, second.vesting_date);
        assert_eq!(position.bonded_assets, tokens(6));

        let rest = f
            .bond
            .redeem(&ctx("alice", half + DEFAULT_VESTING_TIME, 4), &mut f.ledger, None, false, &mut f.events)
            .unwrap();
        assert_eq!(rest.payout_redeemed, tokens(77) / 2);
        assert!(f.bond.position(&addr("alice")).is_none());
        assert_eq!(f.ledger.balance_of(&addr("payout"), &addr("alice")), tokens(55) + tokens(11));
    }

    #[test]
    fn test_oversize_bond_rejected_before_pricing() {
        let mut f = fixture(0);
        let mut terms = BondTerms::default();
        terms.min_price = UNIT;
        f.bond
            .change_terms(&ctx("owner", T0, 1), addr("owner"), terms, &mut f.events)
            .unwrap();
        let err = f.bond(&ctx("alice", T0, 1), tokens(50), 0).unwrap_err();
        assert!(matches!(err, PylonError::BondTooBig { .. }));
    }

    #[test]
    fn test_redeem_and_stake() {
        let mut f = fixture(0);
        f.bond(&ctx("alice", T0, 1), tokens(10), 0).unwrap();
        let record = f
            .bond
            .redeem(
                &ctx("alice", T0 + DEFAULT_VESTING_TIME, 2),
                &mut f.ledger,
                Some(&mut f.pool),
                true,
                &mut f.events,
            )
            .unwrap();
        assert!(record.tokens_staked);
        assert_eq!(f.pool.balance_of(&addr("alice")), tokens(110));
        assert_eq!(f.ledger.balance_of(&addr("payout"), &addr("alice")), 0);
        assert_eq!(f.ledger.balance_of(&addr("payout"), &addr("staking")), tokens(110));
    }

    #[test]
    fn test_manager_is_treasury_owner() {
        let mut f = fixture(0);
        assert_eq!(
            f.bond
                .change_terms(&ctx("alice", T0, 1), addr("owner"), BondTerms::default(), &mut f.events),
            Err(PylonError::Unauthorized)
        );
        assert_eq!(
            f.bond
                .change_price_pair(&ctx("alice", T0, 1), addr("owner"), addr("x"), &mut f.events),
            Err(PylonError::Unauthorized)
        );
        f.bond
            .change_price_pair(&ctx("owner", T0, 1), addr("owner"), addr("pair2"), &mut f.events)
            .unwrap();
        assert_eq!(f.bond.source().price_pool(), addr("pair2"));
    }
}
