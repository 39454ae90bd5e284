// crates/pylon-economics/src/staking.rs
//
// Streamed-reward staking pool.
//
// Stakers deposit the staking token; a reward budget is streamed linearly to
// them over a fixed period, pro-rata to stake. Accounting uses a cumulative
// reward-per-token index scaled by 10^18: each account snapshots the index
// when its balance changes, and its earnings are its balance times the index
// growth since that snapshot.
//
// The pool's owner is the owner of its treasury, so pointing the pool at a
// different treasury also changes who administers it. Reward top-ups come
// from three places: the owner (`added_reward`), authorized distributors
// such as the rewards faucet (`distribute_reward`), and the treasury itself
// when the pool is registered there as a bond (`push_reward`).

use std::collections::{BTreeMap, BTreeSet};

use pylon_core::math::{checked_add, checked_sub, mul_div};
use pylon_core::{Address, Amount, PylonError, TokenLedger, UNIT};

use crate::context::TxContext;
use crate::events::{parameter_changed, EventLog, RewardAdded, RewardPaid, Staked, Withdrawn};
use crate::treasury::Treasury;

/// Default reward period: 28 days.
pub const DEFAULT_REWARDS_DURATION: u64 = 2_419_200;

#[derive(Debug, Clone)]
pub struct StakingPool {
    address: Address,
    staking_token: Address,
    reward_token: Address,
    treasury: Address,
    duration: u64,

    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,

    /// Reward base units streamed per second during the active period.
    reward_rate: Amount,
    period_finish: u64,
    last_update_time: u64,
    /// Cumulative reward per staked token, scaled by `UNIT`.
    reward_per_token_stored: u128,
    user_reward_per_token_paid: BTreeMap<Address, u128>,
    rewards: BTreeMap<Address, Amount>,

    reward_distributors: BTreeSet<Address>,
}

impl StakingPool {
    pub fn new(
        address: Address,
        staking_token: Address,
        reward_token: Address,
        treasury: Address,
        duration: u64,
    ) -> Self {
        Self {
            address,
            staking_token,
            reward_token,
            treasury,
            duration,
            total_supply: 0,
            balances: BTreeMap::new(),
            reward_rate: 0,
            period_finish: 0,
            last_update_time: 0,
            reward_per_token_stored: 0,
            user_reward_per_token_paid: BTreeMap::new(),
            rewards: BTreeMap::new(),
            reward_distributors: BTreeSet::new(),
        }
    }

    // ---- Views ----

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn staking_token(&self) -> Address {
        self.staking_token
    }

    pub fn reward_token(&self) -> Address {
        self.reward_token
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn reward_rate(&self) -> Amount {
        self.reward_rate
    }

    pub fn period_finish(&self) -> u64 {
        self.period_finish
    }

    pub fn last_update_time(&self) -> u64 {
        self.last_update_time
    }

    pub fn is_reward_distributor(&self, who: &Address) -> bool {
        self.reward_distributors.contains(who)
    }

    pub fn last_time_reward_applicable(&self, now: u64) -> u64 {
        now.min(self.period_finish)
    }

    /// Current value of the cumulative reward-per-token index.
    pub fn reward_per_token(&self, now: u64) -> Result<u128, PylonError> {
        if self.total_supply == 0 {
            return Ok(self.reward_per_token_stored);
        }
        let elapsed = self
            .last_time_reward_applicable(now)
            .saturating_sub(self.last_update_time) as u128;
        let emitted = elapsed
            .checked_mul(self.reward_rate)
            .ok_or(PylonError::Overflow)?;
        let accrued = mul_div(emitted, UNIT, self.total_supply)?;
        checked_add(self.reward_per_token_stored, accrued)
    }

    /// Rewards `account` could claim at `now`.
    pub fn earned(&self, account: &Address, now: u64) -> Result<Amount, PylonError> {
        let paid = self
            .user_reward_per_token_paid
            .get(account)
            .copied()
            .unwrap_or(0);
        let growth = checked_sub(self.reward_per_token(now)?, paid)?;
        let fresh = mul_div(self.balance_of(account), growth, UNIT)?;
        checked_add(fresh, self.rewards.get(account).copied().unwrap_or(0))
    }

    /// Total rewards still to be streamed in the current period.
    pub fn reward_for_duration(&self) -> Amount {
        self.reward_rate.saturating_mul(self.duration as u128)
    }

    // ---- Staker operations ----

    /// Stake `amount` from the caller, credited to `on_behalf_of`.
    ///
    /// The caller must have approved the pool for `amount` of the staking
    /// token.
    pub fn stake(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        amount: Amount,
        on_behalf_of: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        if amount == 0 {
            return Err(PylonError::InvalidState("Cannot stake 0".to_string()));
        }
        self.update_reward(Some(&on_behalf_of), ctx.now)?;

        ledger.transfer_from(
            &self.staking_token,
            &self.address,
            &ctx.caller,
            &self.address,
            amount,
        )?;
        self.total_supply = checked_add(self.total_supply, amount)?;
        let balance = self.balances.entry(on_behalf_of).or_insert(0);
        *balance = checked_add(*balance, amount)?;

        tracing::debug!(pool = %self.address, payer = %ctx.caller, beneficiary = %on_behalf_of, amount, "staked");
        events.push(
            Staked {
                pool: self.address,
                payer: ctx.caller,
                beneficiary: on_behalf_of,
                amount,
            }
            .into(),
        );
        Ok(())
    }

    /// Return `amount` of the caller's stake.
    ///
    /// # Errors
    /// `WithdrawOverflow` if `amount` exceeds the caller's staked balance.
    pub fn withdraw(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        if amount == 0 {
            return Err(PylonError::InvalidState("Cannot withdraw 0".to_string()));
        }
        let account = ctx.caller;
        if amount > self.balance_of(&account) {
            return Err(PylonError::WithdrawOverflow);
        }
        self.update_reward(Some(&account), ctx.now)?;

        self.total_supply -= amount;
        if let Some(balance) = self.balances.get_mut(&account) {
            *balance -= amount;
            if *balance == 0 {
                self.balances.remove(&account);
            }
        }
        ledger.transfer(&self.staking_token, &self.address, &account, amount)?;

        tracing::debug!(pool = %self.address, %account, amount, "withdrawn");
        events.push(
            Withdrawn {
                pool: self.address,
                account,
                amount,
            }
            .into(),
        );
        Ok(())
    }

    /// Pay out the caller's accrued rewards. Returns the amount paid.
    pub fn get_reward(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        events: &mut EventLog,
    ) -> Result<Amount, PylonError> {
        let account = ctx.caller;
        self.update_reward(Some(&account), ctx.now)?;
        let reward = self.rewards.remove(&account).unwrap_or(0);
        if reward > 0 {
            ledger.transfer(&self.reward_token, &self.address, &account, reward)?;
            tracing::debug!(pool = %self.address, %account, reward, "reward paid");
            events.push(
                RewardPaid {
                    pool: self.address,
                    account,
                    reward,
                }
                .into(),
            );
        }
        Ok(reward)
    }

    /// Withdraw the full stake and claim rewards. Returns `(withdrawn, reward)`.
    pub fn exit(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        events: &mut EventLog,
    ) -> Result<(Amount, Amount), PylonError> {
        let staked = self.balance_of(&ctx.caller);
        if staked > 0 {
            self.withdraw(ctx, ledger, staked, events)?;
        }
        let reward = self.get_reward(ctx, ledger, events)?;
        Ok((staked, reward))
    }

    // ---- Reward funding ----

    /// Owner top-up. `owner` is the current owner of the pool's treasury.
    ///
    /// The reward tokens must already be held by the pool.
    pub fn added_reward(
        &mut self,
        ctx: &TxContext,
        owner: Address,
        ledger: &dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<RewardAdded, PylonError> {
        require_owner(&ctx.caller, &owner)?;
        self.notify_reward_amount(ctx.now, ledger, amount, events)
    }

    /// Top-up from an authorized distributor such as the rewards faucet.
    pub fn distribute_reward(
        &mut self,
        ctx: &TxContext,
        ledger: &dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<RewardAdded, PylonError> {
        if !self.reward_distributors.contains(&ctx.caller) {
            return Err(PylonError::Unauthorized);
        }
        self.notify_reward_amount(ctx.now, ledger, amount, events)
    }

    /// Pull the pool's entire treasury allowance and stream it.
    ///
    /// The pool must be registered as a bond in its treasury; the treasury fee
    /// applies, so the streamed amount is the net received.
    pub fn push_reward(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        treasury: &mut Treasury,
        events: &mut EventLog,
    ) -> Result<RewardAdded, PylonError> {
        if treasury.address() != self.treasury {
            return Err(PylonError::InvalidState(format!(
                "pool {} is not funded by treasury {}",
                self.address,
                treasury.address()
            )));
        }
        require_owner(&ctx.caller, &treasury.owner())?;
        let allowance = treasury.bond_allowance(&self.address);
        if allowance == 0 {
            return Err(PylonError::InvalidState(
                "no treasury allowance to push".to_string(),
            ));
        }
        let payout = treasury.get_reward(&ctx.as_caller(self.address), ledger, allowance, events)?;
        self.notify_reward_amount(ctx.now, ledger, payout.net, events)
    }

    fn notify_reward_amount(
        &mut self,
        now: u64,
        ledger: &dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<RewardAdded, PylonError> {
        if self.duration == 0 {
            return Err(PylonError::InvalidState("reward duration is zero".to_string()));
        }
        self.update_reward(None, now)?;

        let duration = self.duration as u128;
        self.reward_rate = if now >= self.period_finish {
            amount / duration
        } else {
            let remaining = (self.period_finish - now) as u128;
            let leftover = remaining
                .checked_mul(self.reward_rate)
                .ok_or(PylonError::Overflow)?;
            checked_add(amount, leftover)? / duration
        };

        // The stream must be covered by tokens the pool actually holds.
        let mut available = ledger.balance_of(&self.reward_token, &self.address);
        if self.reward_token == self.staking_token {
            available = available.saturating_sub(self.total_supply);
        }
        let required = self
            .reward_rate
            .checked_mul(duration)
            .ok_or(PylonError::Overflow)?;
        if required > available {
            return Err(PylonError::InsufficientBalance {
                requested: required,
                available,
            });
        }

        self.last_update_time = now;
        self.period_finish = now + self.duration;

        tracing::info!(
            pool = %self.address,
            amount,
            reward_rate = self.reward_rate,
            period_finish = self.period_finish,
            "reward added"
        );
        let added = RewardAdded {
            pool: self.address,
            amount,
            reward_rate: self.reward_rate,
            period_finish: self.period_finish,
        };
        events.push(added.clone().into());
        Ok(added)
    }

    fn update_reward(&mut self, account: Option<&Address>, now: u64) -> Result<(), PylonError> {
        self.reward_per_token_stored = self.reward_per_token(now)?;
        self.last_update_time = self.last_time_reward_applicable(now);
        if let Some(account) = account {
            let earned = self.earned(account, now)?;
            self.rewards.insert(*account, earned);
            self.user_reward_per_token_paid
                .insert(*account, self.reward_per_token_stored);
        }
        Ok(())
    }

    // ---- Administration ----

    /// Re-point the pool at another treasury, which also hands it to that
    /// treasury's owner.
    pub fn change_treasury(
        &mut self,
        ctx: &TxContext,
        owner: Address,
        treasury: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_owner(&ctx.caller, &owner)?;
        self.treasury = treasury;
        tracing::info!(pool = %self.address, %treasury, "staking treasury changed");
        events.push(parameter_changed(self.address, "treasury", treasury));
        Ok(())
    }

    /// Change the length of future reward periods. Rejected mid-period.
    pub fn set_rewards_duration(
        &mut self,
        ctx: &TxContext,
        owner: Address,
        duration: u64,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_owner(&ctx.caller, &owner)?;
        if ctx.now < self.period_finish {
            return Err(PylonError::InvalidState(
                "reward period still active".to_string(),
            ));
        }
        if duration == 0 {
            return Err(PylonError::InvalidState("reward duration is zero".to_string()));
        }
        self.duration = duration;
        events.push(parameter_changed(self.address, "duration", duration));
        Ok(())
    }

    pub fn set_reward_distributor(
        &mut self,
        ctx: &TxContext,
        owner: Address,
        distributor: Address,
        enabled: bool,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        require_owner(&ctx.caller, &owner)?;
        if enabled {
            self.reward_distributors.insert(distributor);
        } else {
            self.reward_distributors.remove(&distributor);
        }
        events.push(parameter_changed(
            self.address,
            "reward_distributor",
            format!("{}={}", distributor, enabled),
        ));
        Ok(())
    }
}

fn require_owner(caller: &Address, owner: &Address) -> Result<(), PylonError> {
    if owner.is_zero() || caller != owner {
        return Err(PylonError::Unauthorized);
    }
    Ok(())
}
