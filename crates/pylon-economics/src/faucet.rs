// crates/pylon-economics/src/faucet.rs
//
// Rewards faucet: releases a scheduled reward budget into the staking pool
// in periodic drips.
//
// The owner schedules a budget (tokens already held by the faucet) to be
// released linearly over `duration`. Any budget not yet released is rolled
// into the new schedule. A keeper, or the owner, drips at most once per
// `drip_interval`; each drip transfers everything released since the last
// checkpoint to the staking pool and notifies the pool as a reward
// distributor, which blends it into the pool's current stream.

use serde::{Deserialize, Serialize};

use pylon_core::math::{checked_add, checked_sub, mul_div};
use pylon_core::{Address, Amount, PylonError, TokenLedger};

use crate::context::TxContext;
use crate::events::{
    parameter_changed, Dripped, EventLog, OwnershipTransferred, RewardsScheduled, TokensWithdrawn,
};
use crate::ownership::Ownable;
use crate::staking::StakingPool;

/// Default schedule length: 28 days.
pub const DEFAULT_FAUCET_DURATION: u64 = 2_419_200;

/// Default minimum time between drips: 3 days.
pub const DEFAULT_DRIP_INTERVAL: u64 = 259_200;

/// The current release schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DripSchedule {
    pub total_scheduled: Amount,
    pub released: Amount,
    pub schedule_start: u64,
    pub schedule_end: u64,
    /// Release is measured from here; advanced by every drip.
    pub checkpoint: u64,
}

impl DripSchedule {
    /// Tokens released between the checkpoint and `now`, capped at what
    /// remains. Everything remaining is releasable once the schedule ends.
    pub fn releasable(&self, now: u64) -> Result<Amount, PylonError> {
        let remaining = checked_sub(self.total_scheduled, self.released)?;
        if now >= self.schedule_end {
            return Ok(remaining);
        }
        let span = (self.schedule_end - self.schedule_start) as u128;
        let elapsed = now.saturating_sub(self.checkpoint) as u128;
        Ok(mul_div(self.total_scheduled, elapsed, span)?.min(remaining))
    }

    pub fn is_exhausted(&self) -> bool {
        self.released >= self.total_scheduled
    }
}

#[derive(Debug, Clone)]
pub struct RewardsFaucet {
    address: Address,
    reward_token: Address,
    staking: Address,
    duration: u64,
    drip_interval: u64,
    last_drip: u64,
    keeper: Address,
    ownership: Ownable,
    schedule: DripSchedule,
}

impl RewardsFaucet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: Address,
        reward_token: Address,
        staking: Address,
        owner: Address,
        keeper: Address,
        duration: u64,
        drip_interval: u64,
    ) -> Self {
        Self {
            address,
            reward_token,
            staking,
            duration,
            drip_interval,
            last_drip: 0,
            keeper,
            ownership: Ownable::new(owner),
            schedule: DripSchedule::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn reward_token(&self) -> Address {
        self.reward_token
    }

    pub fn staking(&self) -> Address {
        self.staking
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn drip_interval(&self) -> u64 {
        self.drip_interval
    }

    pub fn last_drip(&self) -> u64 {
        self.last_drip
    }

    pub fn keeper(&self) -> Address {
        self.keeper
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.ownership.pending_owner()
    }

    pub fn schedule(&self) -> DripSchedule {
        self.schedule
    }

    /// Preview of what a drip at `now` would release.
    pub fn releasable(&self, now: u64) -> Result<Amount, PylonError> {
        self.schedule.releasable(now)
    }

    /// Whether a drip at `now` passes the cadence and exhaustion gates.
    pub fn can_drip(&self, now: u64) -> bool {
        now.saturating_sub(self.last_drip) >= self.drip_interval && !self.schedule.is_exhausted()
    }

    /// Schedule `amount` new tokens, rolling in the unreleased remainder.
    ///
    /// The faucet must already hold the whole new schedule.
    pub fn added_rewards(
        &mut self,
        ctx: &TxContext,
        ledger: &dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<DripSchedule, PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        let remainder = checked_sub(self.schedule.total_scheduled, self.schedule.released)?;
        let total_scheduled = checked_add(amount, remainder)?;
        let held = ledger.balance_of(&self.reward_token, &self.address);
        if held < total_scheduled {
            return Err(PylonError::InsufficientBalance {
                requested: total_scheduled,
                available: held,
            });
        }

        self.schedule = DripSchedule {
            total_scheduled,
            released: 0,
            schedule_start: ctx.now,
            schedule_end: ctx.now + self.duration,
            checkpoint: ctx.now,
        };
        tracing::info!(
            faucet = %self.address,
            amount,
            remainder,
            total_scheduled,
            schedule_end = self.schedule.schedule_end,
            "rewards scheduled"
        );
        events.push(
            RewardsScheduled {
                faucet: self.address,
                total_scheduled,
                schedule_end: self.schedule.schedule_end,
            }
            .into(),
        );
        Ok(self.schedule)
    }

    /// Release what has accrued since the last drip into the staking pool.
    ///
    /// A drip that releases zero still consumes the interval.
    ///
    /// # Errors
    /// - `Unauthorized` unless called by the keeper or the owner.
    /// - `CannotDripNow` inside the drip interval or once the schedule is
    ///   fully released.
    pub fn drip(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        staking: &mut StakingPool,
        events: &mut EventLog,
    ) -> Result<Dripped, PylonError> {
        if ctx.caller != self.keeper && ctx.caller != self.ownership.owner() {
            return Err(PylonError::Unauthorized);
        }
        if !self.can_drip(ctx.now) {
            return Err(PylonError::CannotDripNow);
        }
        if staking.address() != self.staking {
            return Err(PylonError::InvalidState(format!(
                "faucet {} does not feed pool {}",
                self.address,
                staking.address()
            )));
        }

        let amount = self.releasable(ctx.now)?;
        self.schedule.released = checked_add(self.schedule.released, amount)?;
        self.schedule.checkpoint = ctx.now.min(self.schedule.schedule_end);
        self.last_drip = ctx.now;

        if amount > 0 {
            ledger.transfer(&self.reward_token, &self.address, &self.staking, amount)?;
            staking.distribute_reward(&ctx.as_caller(self.address), ledger, amount, events)?;
        }

        tracing::info!(
            faucet = %self.address,
            amount,
            released = self.schedule.released,
            total_scheduled = self.schedule.total_scheduled,
            "dripped"
        );
        let dripped = Dripped {
            faucet: self.address,
            amount,
            released: self.schedule.released,
            total_scheduled: self.schedule.total_scheduled,
        };
        events.push(dripped.clone().into());
        Ok(dripped)
    }

    // ---- Owner operations ----

    pub fn change_staking(
        &mut self,
        ctx: &TxContext,
        staking: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.staking = staking;
        events.push(parameter_changed(self.address, "staking", staking));
        Ok(())
    }

    pub fn change_drip_interval(
        &mut self,
        ctx: &TxContext,
        drip_interval: u64,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.drip_interval = drip_interval;
        events.push(parameter_changed(self.address, "drip_interval", drip_interval));
        Ok(())
    }

    /// Length of future schedules; the running schedule keeps its end.
    pub fn change_duration(
        &mut self,
        ctx: &TxContext,
        duration: u64,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        if duration == 0 {
            return Err(PylonError::InvalidState("faucet duration is zero".to_string()));
        }
        self.duration = duration;
        events.push(parameter_changed(self.address, "duration", duration));
        Ok(())
    }

    pub fn change_keeper(
        &mut self,
        ctx: &TxContext,
        keeper: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.keeper = keeper;
        events.push(parameter_changed(self.address, "keeper", keeper));
        Ok(())
    }

    /// Sweep any token. Withdrawing scheduled rewards makes later drips fail
    /// until the faucet is refilled.
    pub fn withdraw_tokens(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        token: Address,
        amount: Amount,
        to: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        ledger.transfer(&token, &self.address, &to, amount)?;
        events.push(
            TokensWithdrawn {
                component: self.address,
                token,
                to,
                amount,
            }
            .into(),
        );
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &TxContext,
        new_owner: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.transfer(&ctx.caller, new_owner)?;
        events.push(parameter_changed(self.address, "pending_owner", new_owner));
        Ok(())
    }

    pub fn claim_ownership(
        &mut self,
        ctx: &TxContext,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        let (previous_owner, new_owner) = self.ownership.claim(&ctx.caller)?;
        events.push(
            OwnershipTransferred {
                component: self.address,
                previous_owner,
                new_owner,
            }
            .into(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staking::DEFAULT_REWARDS_DURATION;
    use pylon_core::{tokens, InMemoryLedger};

    const T0: u64 = 1_700_000_000;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn ctx(caller: &str, now: u64) -> TxContext {
        TxContext::new(addr(caller), now, now)
    }

    fn setup(funding: Amount) -> (RewardsFaucet, StakingPool, InMemoryLedger, EventLog) {
        let mut ledger = InMemoryLedger::new();
        let mut events = EventLog::new();
        let faucet = RewardsFaucet::new(
            addr("faucet"),
            addr("payout"),
            addr("staking"),
            addr("owner"),
            addr("keeper"),
            DEFAULT_FAUCET_DURATION,
            DEFAULT_DRIP_INTERVAL,
        );
        let mut pool = StakingPool::new(
            addr("staking"),
            addr("payout"),
            addr("payout"),
            addr("treasury"),
            DEFAULT_REWARDS_DURATION,
        );
        pool.set_reward_distributor(&ctx("owner", T0), addr("owner"), addr("faucet"), true, &mut events)
            .unwrap();
        ledger.mint(&addr("payout"), &addr("faucet"), funding).unwrap();
        (faucet, pool, ledger, events)
    }

    #[test]
    fn test_drip_releases_linearly() {
        let (mut faucet, mut pool, mut ledger, mut events) = setup(tokens(2_800));
        faucet
            .added_rewards(&ctx("owner", T0), &ledger, tokens(2_800), &mut events)
            .unwrap();

        // 3 days into a 28 day schedule.
        let t1 = T0 + DEFAULT_DRIP_INTERVAL;
        let dripped = faucet
            .drip(&ctx("keeper", t1), &mut ledger, &mut pool, &mut events)
            .unwrap();
        assert_eq!(dripped.amount, tokens(300));
        assert_eq!(ledger.balance_of(&addr("payout"), &addr("staking")), tokens(300));
        assert_eq!(pool.period_finish(), t1 + DEFAULT_REWARDS_DURATION);
        assert_eq!(faucet.last_drip(), t1);
    }

    #[test]
    fn test_drip_cadence() {
        let (mut faucet, mut pool, mut ledger, mut events) = setup(tokens(2_800));
        faucet
            .added_rewards(&ctx("owner", T0), &ledger, tokens(2_800), &mut events)
            .unwrap();
        let t1 = T0 + DEFAULT_DRIP_INTERVAL;
        faucet
            .drip(&ctx("keeper", t1), &mut ledger, &mut pool, &mut events)
            .unwrap();
        assert_eq!(
            faucet.drip(&ctx("keeper", t1 + DEFAULT_DRIP_INTERVAL - 1), &mut ledger, &mut pool, &mut events),
            Err(PylonError::CannotDripNow)
        );
        assert!(faucet
            .drip(&ctx("keeper", t1 + DEFAULT_DRIP_INTERVAL), &mut ledger, &mut pool, &mut events)
            .is_ok());
    }

    #[test]
    fn test_zero_release_updates_last_drip() {
        let (mut faucet, mut pool, mut ledger, mut events) = setup(tokens(100));
        faucet
            .added_rewards(&ctx("owner", T0), &ledger, tokens(100), &mut events)
            .unwrap();
        // Initial last_drip is 0, so an immediate drip passes the cadence gate
        // and releases nothing.
        let dripped = faucet
            .drip(&ctx("keeper", T0), &mut ledger, &mut pool, &mut events)
            .unwrap();
        assert_eq!(dripped.amount, 0);
        assert_eq!(faucet.last_drip(), T0);
        assert_eq!(pool.period_finish(), 0);
    }

    #[test]
    fn test_exhausted_schedule_cannot_drip() {
        let (mut faucet, mut pool, mut ledger, mut events) = setup(tokens(100));
        faucet
            .added_rewards(&ctx("owner", T0), &ledger, tokens(100), &mut events)
            .unwrap();
        let end = T0 + DEFAULT_FAUCET_DURATION;
        let dripped = faucet
            .drip(&ctx("keeper", end), &mut ledger, &mut pool, &mut events)
            .unwrap();
        assert_eq!(dripped.amount, tokens(100));
        assert!(faucet.schedule().is_exhausted());
        assert_eq!(
            faucet.drip(&ctx("keeper", end + DEFAULT_DRIP_INTERVAL), &mut ledger, &mut pool, &mut events),
            Err(PylonError::CannotDripNow)
        );
    }

    #[test]
    fn test_reschedule_rolls_remainder() {
        let (mut faucet, mut pool, mut ledger, mut events) = setup(tokens(2_800));
        faucet
            .added_rewards(&ctx("owner", T0), &ledger, tokens(1_400), &mut events)
            .unwrap();
        let t1 = T0 + DEFAULT_FAUCET_DURATION / 2;
        faucet
            .drip(&ctx("keeper", t1), &mut ledger, &mut pool, &mut events)
            .unwrap();
        // 700 released, 700 remain; schedule 1,400 more on top.
        let schedule = faucet
            .added_rewards(&ctx("owner", t1), &ledger, tokens(1_400), &mut events)
            .unwrap();
        assert_eq!(schedule.total_scheduled, tokens(2_100));
        assert_eq!(schedule.released, 0);
        assert_eq!(schedule.schedule_end, t1 + DEFAULT_FAUCET_DURATION);
    }

    #[test]
    fn test_schedule_must_be_funded() {
        let (mut faucet, _, ledger, mut events) = setup(tokens(10));
        let err = faucet
            .added_rewards(&ctx("owner", T0), &ledger, tokens(11), &mut events)
            .unwrap_err();
        assert!(matches!(err, PylonError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_access_control() {
        let (mut faucet, mut pool, mut ledger, mut events) = setup(tokens(10));
        assert_eq!(
            faucet.added_rewards(&ctx("keeper", T0), &ledger, 1, &mut events),
            Err(PylonError::Unauthorized)
        );
        assert_eq!(
            faucet.drip(&ctx("mallory", T0), &mut ledger, &mut pool, &mut events),
            Err(PylonError::Unauthorized)
        );
        assert_eq!(
            faucet.change_keeper(&ctx("keeper", T0), addr("keeper"), &mut events),
            Err(PylonError::Unauthorized)
        );
        faucet
            .change_keeper(&ctx("owner", T0), addr("keeper2"), &mut events)
            .unwrap();
        assert_eq!(faucet.keeper(), addr("keeper2"));
    }
}
