// crates/pylon-economics/src/engine.rs
//
// Transaction execution over a `Protocol`.
//
// Each transaction runs against the current clock with all-or-nothing
// semantics: on error the protocol is restored to its state before the
// transaction and the events it emitted are dropped. The clock only moves
// between transactions.

use serde::Deserialize;

use pylon_core::units::serde_amount;
use pylon_core::{Address, Amount, Keypair, PylonError};

use crate::bond::BondTerms;
use crate::context::TxContext;
use crate::events::ProtocolEvent;
use crate::protocol::Protocol;

/// Block clock. Seconds and height advance together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clock {
    pub now: u64,
    pub block: u64,
}

fn zero() -> Amount {
    0
}

/// A single protocol operation, as submitted in a transaction.
///
/// Amounts are decimal token strings (`"1.5"`) or whole-token integers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    // Tokens and reference pairs.
    Transfer {
        token: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    Approve {
        token: Address,
        spender: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    AddLiquidity {
        pair: Address,
        #[serde(with = "serde_amount")]
        amount0: Amount,
        #[serde(with = "serde_amount")]
        amount1: Amount,
    },
    Swap {
        pair: Address,
        token_in: Address,
        #[serde(with = "serde_amount")]
        amount_in: Amount,
        #[serde(default = "zero", with = "serde_amount")]
        min_out: Amount,
    },

    // Treasury.
    SetBondData {
        treasury: Address,
        bond: Address,
        registered: bool,
        #[serde(with = "serde_amount")]
        allowance: Amount,
        fee_bps: u32,
    },
    TreasuryGetReward {
        treasury: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    TreasuryWithdraw {
        treasury: Address,
        token: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
        to: Address,
    },
    ChangeDao {
        treasury: Address,
        dao: Address,
    },
    PassOwnership {
        component: Address,
        new_owner: Address,
    },
    AcceptOwnership {
        component: Address,
    },

    // Staking pool.
    Stake {
        pool: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
        #[serde(default)]
        on_behalf_of: Option<Address>,
    },
    Withdraw {
        pool: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    GetReward {
        pool: Address,
    },
    Exit {
        pool: Address,
    },
    AddedReward {
        pool: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    PushReward {
        pool: Address,
    },
    ChangeStakingTreasury {
        pool: Address,
        treasury: Address,
    },
    SetRewardsDuration {
        pool: Address,
        duration: u64,
    },
    SetRewardDistributor {
        pool: Address,
        distributor: Address,
        enabled: bool,
    },

    // Bonds.
    Bond {
        bond: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
        #[serde(default = "zero", with = "serde_amount")]
        min_payout: Amount,
    },
    Redeem {
        bond: Address,
        #[serde(default)]
        stake: bool,
    },
    ChangeBondTerms {
        bond: Address,
        terms: BondTerms,
    },
    ChangeBondPricePair {
        bond: Address,
        pair: Address,
    },
    ChangeBondTreasury {
        bond: Address,
        treasury: Address,
    },
    ChangeBondStaking {
        bond: Address,
        staking: Address,
    },
    SetTrustedOrigin {
        bond: Address,
        origin: Address,
        trusted: bool,
    },

    // Faucet.
    AddedRewards {
        faucet: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    Drip {
        faucet: Address,
    },
    ChangeFaucetStaking {
        faucet: Address,
        staking: Address,
    },
    ChangeDripInterval {
        faucet: Address,
        drip_interval: u64,
    },
    ChangeFaucetDuration {
        faucet: Address,
        duration: u64,
    },
    ChangeKeeper {
        faucet: Address,
        keeper: Address,
    },
    FaucetWithdraw {
        faucet: Address,
        token: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
        to: Address,
    },

    // Share vault.
    VaultStake {
        vault: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    VaultWithdraw {
        vault: Address,
        #[serde(with = "serde_amount")]
        shares: Amount,
        #[serde(default)]
        to: Option<Address>,
    },
    VaultWithdrawFor {
        vault: Address,
        owner: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        shares: Amount,
    },
    ShareTransfer {
        vault: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    ShareTransferFrom {
        vault: Address,
        from: Address,
        to: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    ShareApprove {
        vault: Address,
        spender: Address,
        #[serde(with = "serde_amount")]
        amount: Amount,
    },
    /// Submit a signed approval; `signature` is hex.
    Permit {
        vault: Address,
        owner: Address,
        spender: Address,
        #[serde(with = "serde_amount")]
        value: Amount,
        deadline: u64,
        signature: String,
    },
    /// Sign with the label-derived key of `signer` and submit in one step.
    /// Test and simulation convenience; real owners sign off-line.
    SignAndPermit {
        vault: Address,
        signer: String,
        spender: Address,
        #[serde(with = "serde_amount")]
        value: Amount,
        deadline: u64,
    },
    ChangeLockTime {
        vault: Address,
        lock_duration: u64,
    },
}

impl Command {
    /// The `op` tag of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Transfer { .. } => "transfer",
            Command::Approve { .. } => "approve",
            Command::AddLiquidity { .. } => "add_liquidity",
            Command::Swap { .. } => "swap",
            Command::SetBondData { .. } => "set_bond_data",
            Command::TreasuryGetReward { .. } => "treasury_get_reward",
            Command::TreasuryWithdraw { .. } => "treasury_withdraw",
            Command::ChangeDao { .. } => "change_dao",
            Command::PassOwnership { .. } => "pass_ownership",
            Command::AcceptOwnership { .. } => "accept_ownership",
            Command::Stake { .. } => "stake",
            Command::Withdraw { .. } => "withdraw",
            Command::GetReward { .. } => "get_reward",
            Command::Exit { .. } => "exit",
            Command::AddedReward { .. } => "added_reward",
            Command::PushReward { .. } => "push_reward",
            Command::ChangeStakingTreasury { .. } => "change_staking_treasury",
            Command::SetRewardsDuration { .. } => "set_rewards_duration",
            Command::SetRewardDistributor { .. } => "set_reward_distributor",
            Command::Bond { .. } => "bond",
            Command::Redeem { .. } => "redeem",
            Command::ChangeBondTerms { .. } => "change_bond_terms",
            Command::ChangeBondPricePair { .. } => "change_bond_price_pair",
            Command::ChangeBondTreasury { .. } => "change_bond_treasury",
            Command::ChangeBondStaking { .. } => "change_bond_staking",
            Command::SetTrustedOrigin { .. } => "set_trusted_origin",
            Command::AddedRewards { .. } => "added_rewards",
            Command::Drip { .. } => "drip",
            Command::ChangeFaucetStaking { .. } => "change_faucet_staking",
            Command::ChangeDripInterval { .. } => "change_drip_interval",
            Command::ChangeFaucetDuration { .. } => "change_faucet_duration",
            Command::ChangeKeeper { .. } => "change_keeper",
            Command::FaucetWithdraw { .. } => "faucet_withdraw",
            Command::VaultStake { .. } => "vault_stake",
            Command::VaultWithdraw { .. } => "vault_withdraw",
            Command::VaultWithdrawFor { .. } => "vault_withdraw_for",
            Command::ShareTransfer { .. } => "share_transfer",
            Command::ShareTransferFrom { .. } => "share_transfer_from",
            Command::ShareApprove { .. } => "share_approve",
            Command::Permit { .. } => "permit",
            Command::SignAndPermit { .. } => "sign_and_permit",
            Command::ChangeLockTime { .. } => "change_lock_time",
        }
    }
}

/// A signed-by-`caller` operation. `origin` defaults to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    pub caller: Address,
    #[serde(default)]
    pub origin: Option<Address>,
    #[serde(flatten)]
    pub command: Command,
}

impl Protocol {
    /// Dispatch one command. Does not roll back on its own; run it through
    /// [`Engine`] for transactional semantics.
    pub fn apply(&mut self, ctx: &TxContext, command: &Command) -> Result<(), PylonError> {
        match command.clone() {
            Command::Transfer { token, to, amount } => self.transfer(ctx, token, to, amount),
            Command::Approve { token, spender, amount } => self.approve(ctx, token, spender, amount),
            Command::AddLiquidity { pair, amount0, amount1 } => {
                self.add_liquidity(ctx, pair, amount0, amount1).map(|_| ())
            }
            Command::Swap { pair, token_in, amount_in, min_out } => {
                self.swap(ctx, pair, token_in, amount_in, min_out).map(|_| ())
            }
            Command::SetBondData { treasury, bond, registered, allowance, fee_bps } => {
                self.set_bond_data(ctx, treasury, bond, registered, allowance, fee_bps)
            }
            Command::TreasuryGetReward { treasury, amount } => {
                self.treasury_get_reward(ctx, treasury, amount).map(|_| ())
            }
            Command::TreasuryWithdraw { treasury, token, amount, to } => {
                self.treasury_withdraw(ctx, treasury, token, amount, to)
            }
            Command::ChangeDao { treasury, dao } => self.change_dao(ctx, treasury, dao),
            Command::PassOwnership { component, new_owner } => {
                self.pass_ownership(ctx, component, new_owner)
            }
            Command::AcceptOwnership { component } => self.accept_ownership(ctx, component),
            Command::Stake { pool, amount, on_behalf_of } => {
                self.stake(ctx, pool, amount, on_behalf_of.unwrap_or(ctx.caller))
            }
            Command::Withdraw { pool, amount } => self.withdraw(ctx, pool, amount),
            Command::GetReward { pool } => self.get_reward(ctx, pool).map(|_| ()),
            Command::Exit { pool } => self.exit(ctx, pool).map(|_| ()),
            Command::AddedReward { pool, amount } => self.added_reward(ctx, pool, amount),
            Command::PushReward { pool } => self.push_reward(ctx, pool),
            Command::ChangeStakingTreasury { pool, treasury } => {
                self.change_staking_treasury(ctx, pool, treasury)
            }
            Command::SetRewardsDuration { pool, duration } => {
                self.set_rewards_duration(ctx, pool, duration)
            }
            Command::SetRewardDistributor { pool, distributor, enabled } => {
                self.set_reward_distributor(ctx, pool, distributor, enabled)
            }
            Command::Bond { bond, amount, min_payout } => {
                self.bond_deposit(ctx, bond, amount, min_payout).map(|_| ())
            }
            Command::Redeem { bond, stake } => self.redeem(ctx, bond, stake).map(|_| ()),
            Command::ChangeBondTerms { bond, terms } => self.change_bond_terms(ctx, bond, terms),
            Command::ChangeBondPricePair { bond, pair } => {
                self.change_bond_price_pair(ctx, bond, pair)
            }
            Command::ChangeBondTreasury { bond, treasury } => {
                self.change_bond_treasury(ctx, bond, treasury)
            }
            Command::ChangeBondStaking { bond, staking } => {
                self.change_bond_staking(ctx, bond, staking)
            }
            Command::SetTrustedOrigin { bond, origin, trusted } => {
                self.set_trusted_origin(ctx, bond, origin, trusted)
            }
            Command::AddedRewards { faucet, amount } => self.added_rewards(ctx, faucet, amount),
            Command::Drip { faucet } => self.drip(ctx, faucet).map(|_| ()),
            Command::ChangeFaucetStaking { faucet, staking } => {
                self.change_faucet_staking(ctx, faucet, staking)
            }
            Command::ChangeDripInterval { faucet, drip_interval } => {
                self.change_drip_interval(ctx, faucet, drip_interval)
            }
            Command::ChangeFaucetDuration { faucet, duration } => {
                self.change_faucet_duration(ctx, faucet, duration)
            }
            Command::ChangeKeeper { faucet, keeper } => self.change_keeper(ctx, faucet, keeper),
            Command::FaucetWithdraw { faucet, token, amount, to } => {
                self.faucet_withdraw(ctx, faucet, token, amount, to)
            }
            Command::VaultStake { vault, amount } => self.vault_stake(ctx, vault, amount).map(|_| ()),
            Command::VaultWithdraw { vault, shares, to } => self
                .vault_withdraw(ctx, vault, to.unwrap_or(ctx.caller), shares)
                .map(|_| ()),
            Command::VaultWithdrawFor { vault, owner, to, shares } => {
                self.vault_withdraw_for(ctx, vault, owner, to, shares).map(|_| ())
            }
            Command::ShareTransfer { vault, to, amount } => self.share_transfer(ctx, vault, to, amount),
            Command::ShareTransferFrom { vault, from, to, amount } => {
                self.share_transfer_from(ctx, vault, from, to, amount)
            }
            Command::ShareApprove { vault, spender, amount } => {
                self.share_approve(ctx, vault, spender, amount)
            }
            Command::Permit { vault, owner, spender, value, deadline, signature } => {
                let signature = hex::decode(signature.trim_start_matches("0x"))
                    .map_err(|e| PylonError::Serialization(format!("Invalid signature hex: {}", e)))?;
                self.permit(ctx, vault, owner, spender, value, deadline, &signature)
            }
            Command::SignAndPermit { vault, signer, spender, value, deadline } => {
                let keypair = Keypair::from_label(&signer);
                let signature = self.vault(&vault)?.sign_permit(&keypair, &spender, value, deadline);
                self.permit(ctx, vault, keypair.address(), spender, value, deadline, &signature)
            }
            Command::ChangeLockTime { vault, lock_duration } => {
                self.change_lock_time(ctx, vault, lock_duration)
            }
        }
    }
}

/// Runs transactions against a protocol with rollback on failure.
#[derive(Debug, Clone)]
pub struct Engine {
    protocol: Protocol,
    clock: Clock,
}

impl Engine {
    pub fn new(protocol: Protocol, clock: Clock) -> Self {
        Self { protocol, clock }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Direct access for genesis setup (minting, registering components).
    pub fn protocol_mut(&mut self) -> &mut Protocol {
        &mut self.protocol
    }

    pub fn into_protocol(self) -> Protocol {
        self.protocol
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Move time forward by `seconds` and mine one block.
    pub fn advance(&mut self, seconds: u64) {
        self.clock.now += seconds;
        self.clock.block += 1;
    }

    /// Mine a block without moving time.
    pub fn mine(&mut self) {
        self.clock.block += 1;
    }

    pub fn context(&self, caller: Address, origin: Option<Address>) -> TxContext {
        TxContext::new(caller, self.clock.now, self.clock.block).with_origin(origin.unwrap_or(caller))
    }

    /// Run `f` as one transaction. Returns its result and the events it
    /// emitted; on error all of its effects are reverted.
    pub fn execute<T>(
        &mut self,
        caller: Address,
        origin: Option<Address>,
        f: impl FnOnce(&mut Protocol, &TxContext) -> Result<T, PylonError>,
    ) -> Result<(T, Vec<ProtocolEvent>), PylonError> {
        let ctx = self.context(caller, origin);
        let snapshot = self.protocol.clone();
        let mark = self.protocol.events().len();
        match f(&mut self.protocol, &ctx) {
            Ok(value) => {
                let events = self.protocol.events()[mark..].to_vec();
                tracing::debug!(
                    caller = %ctx.caller,
                    block = ctx.block,
                    events = events.len(),
                    "transaction applied"
                );
                Ok((value, events))
            }
            Err(e) => {
                self.protocol = snapshot;
                tracing::warn!(caller = %ctx.caller, block = ctx.block, error = %e, "transaction reverted");
                Err(e)
            }
        }
    }

    /// Run a deserialized transaction.
    pub fn submit(&mut self, tx: &Transaction) -> Result<Vec<ProtocolEvent>, PylonError> {
        let command = &tx.command;
        tracing::info!(op = command.name(), caller = %tx.caller, "submitting transaction");
        self.execute(tx.caller, tx.origin, |protocol, ctx| protocol.apply(ctx, command))
            .map(|(_, events)| events)
    }
}
