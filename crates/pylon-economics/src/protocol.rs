// crates/pylon-economics/src/protocol.rs
//
// The whole protocol state: the token ledger, reference pairs, and every
// deployed component, keyed by address. Operations here resolve the
// components a call touches, hand each one the disjoint pieces of state it
// needs, and append the resulting events to the log.
//
// `Protocol` is `Clone`; the engine snapshots it before each transaction and
// restores the snapshot if the transaction fails, so no operation here has
// to undo partial work itself.

use std::collections::BTreeMap;

use pylon_core::{
    Address, Amount, ConstantProductPair, InMemoryLedger, PairView, PylonError, TokenLedger,
};

use crate::bond::{BondIssuer, BondTerms, PriceSource};
use crate::config::ProtocolConfig;
use crate::context::TxContext;
use crate::events::{EventLog, LiquidityAdded, ProtocolEvent, Swapped};
use crate::faucet::RewardsFaucet;
use crate::staking::StakingPool;
use crate::treasury::Treasury;
use crate::vault::{ShareVault, VaultDomain};

#[derive(Debug, Clone, Default)]
pub struct Protocol {
    ledger: InMemoryLedger,
    pairs: BTreeMap<Address, ConstantProductPair>,
    treasuries: BTreeMap<Address, Treasury>,
    pools: BTreeMap<Address, StakingPool>,
    bonds: BTreeMap<Address, BondIssuer>,
    faucets: BTreeMap<Address, RewardsFaucet>,
    vaults: BTreeMap<Address, ShareVault>,
    events: EventLog,
}

/// Accounts that administer a standard deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roles {
    pub owner: Address,
    pub dao: Address,
    pub keeper: Address,
}

/// Addresses of a standard deployment, all derived from fixed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub payout_token: Address,
    pub paired_token: Address,
    pub pair: Address,
    pub treasury: Address,
    pub staking: Address,
    pub lp_bond: Address,
    pub asset_bond: Address,
    pub faucet: Address,
    pub vault: Address,
}

impl Deployment {
    pub fn standard() -> Self {
        Self {
            payout_token: Address::from_label("pylon"),
            paired_token: Address::from_label("weth"),
            pair: Address::from_label("pylon-weth"),
            treasury: Address::from_label("treasury"),
            staking: Address::from_label("staking"),
            lp_bond: Address::from_label("lp-bond"),
            asset_bond: Address::from_label("weth-bond"),
            faucet: Address::from_label("faucet"),
            vault: Address::from_label("vault"),
        }
    }

    /// `(label, address)` pairs, for display.
    pub fn labels(&self) -> Vec<(&'static str, Address)> {
        vec![
            ("pylon", self.payout_token),
            ("weth", self.paired_token),
            ("pylon-weth", self.pair),
            ("treasury", self.treasury),
            ("staking", self.staking),
            ("lp-bond", self.lp_bond),
            ("weth-bond", self.asset_bond),
            ("faucet", self.faucet),
            ("vault", self.vault),
        ]
    }
}

fn missing(kind: &str, address: &Address) -> PylonError {
    PylonError::NotFound(format!("{} {}", kind, address))
}

/// Owner of `treasury`, or the zero address if it is not deployed. Staking
/// pools and bonds are administered by the owner of their treasury.
fn owner_of(treasuries: &BTreeMap<Address, Treasury>, treasury: &Address) -> Address {
    treasuries
        .get(treasury)
        .map(Treasury::owner)
        .unwrap_or(Address::ZERO)
}

impl Protocol {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy and wire the standard component set.
    ///
    /// Both bonds are registered in the treasury with a zero allowance and the
    /// configured fee; the faucet is authorized to feed the staking pool.
    pub fn deploy(config: &ProtocolConfig, roles: Roles) -> Result<(Self, Deployment), PylonError> {
        config.validate()?;
        let d = Deployment::standard();
        let mut protocol = Self::new();

        protocol.add_pair(ConstantProductPair::new(d.pair, d.payout_token, d.paired_token))?;
        protocol.add_treasury(Treasury::new(d.treasury, d.payout_token, roles.owner, roles.dao))?;
        protocol.add_staking_pool(StakingPool::new(
            d.staking,
            d.payout_token,
            d.payout_token,
            d.treasury,
            config.staking.duration,
        ))?;
        let terms = config.bond.terms();
        protocol.add_bond(BondIssuer::new(
            d.lp_bond,
            d.payout_token,
            d.treasury,
            d.staking,
            PriceSource::LpReserves { pair: d.pair },
            terms,
        ))?;
        protocol.add_bond(BondIssuer::new(
            d.asset_bond,
            d.payout_token,
            d.treasury,
            d.staking,
            PriceSource::SingleAsset {
                asset: d.paired_token,
                price_pair: d.pair,
            },
            terms,
        ))?;
        protocol.add_faucet(RewardsFaucet::new(
            d.faucet,
            d.payout_token,
            d.staking,
            roles.owner,
            roles.keeper,
            config.faucet.duration,
            config.faucet.drip_interval,
        ))?;
        protocol.add_vault(ShareVault::new(
            d.vault,
            d.payout_token,
            roles.owner,
            VaultDomain {
                name: config.vault.name.clone(),
                version: config.vault.version.clone(),
                chain_id: config.chain_id,
            },
            config.vault.lock_duration,
        ))?;

        let genesis = TxContext::new(roles.owner, 0, 0);
        for bond in [d.lp_bond, d.asset_bond] {
            protocol.set_bond_data(&genesis, d.treasury, bond, true, 0, config.bond.fee_bps)?;
        }
        protocol.set_reward_distributor(&genesis, d.staking, d.faucet, true)?;
        protocol.events.clear();

        tracing::info!(
            treasury = %d.treasury,
            staking = %d.staking,
            lp_bond = %d.lp_bond,
            asset_bond = %d.asset_bond,
            faucet = %d.faucet,
            vault = %d.vault,
            "protocol deployed"
        );
        Ok((protocol, d))
    }

    // ---- Registration ----

    fn ensure_free(&self, address: &Address) -> Result<(), PylonError> {
        let taken = self.pairs.contains_key(address)
            || self.treasuries.contains_key(address)
            || self.pools.contains_key(address)
            || self.bonds.contains_key(address)
            || self.faucets.contains_key(address)
            || self.vaults.contains_key(address);
        if taken {
            return Err(PylonError::InvalidState(format!(
                "address {} already deployed",
                address
            )));
        }
        Ok(())
    }

    pub fn add_pair(&mut self, pair: ConstantProductPair) -> Result<(), PylonError> {
        self.ensure_free(&pair.address())?;
        self.pairs.insert(pair.address(), pair);
        Ok(())
    }

    pub fn add_treasury(&mut self, treasury: Treasury) -> Result<(), PylonError> {
        self.ensure_free(&treasury.address())?;
        self.treasuries.insert(treasury.address(), treasury);
        Ok(())
    }

    pub fn add_staking_pool(&mut self, pool: StakingPool) -> Result<(), PylonError> {
        self.ensure_free(&pool.address())?;
        self.pools.insert(pool.address(), pool);
        Ok(())
    }

    pub fn add_bond(&mut self, bond: BondIssuer) -> Result<(), PylonError> {
        self.ensure_free(&bond.address())?;
        self.bonds.insert(bond.address(), bond);
        Ok(())
    }

    pub fn add_faucet(&mut self, faucet: RewardsFaucet) -> Result<(), PylonError> {
        self.ensure_free(&faucet.address())?;
        self.faucets.insert(faucet.address(), faucet);
        Ok(())
    }

    pub fn add_vault(&mut self, vault: ShareVault) -> Result<(), PylonError> {
        self.ensure_free(&vault.address())?;
        self.vaults.insert(vault.address(), vault);
        Ok(())
    }

    /// Create tokens out of thin air. Genesis and test setup only; not
    /// reachable through a transaction.
    pub fn mint(&mut self, token: &Address, to: &Address, amount: Amount) -> Result<(), PylonError> {
        self.ledger.mint(token, to, amount)
    }

    // ---- Queries ----

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn balance_of(&self, token: &Address, who: &Address) -> Amount {
        self.ledger.balance_of(token, who)
    }

    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    pub fn pair(&self, address: &Address) -> Result<&ConstantProductPair, PylonError> {
        self.pairs.get(address).ok_or_else(|| missing("pair", address))
    }

    pub fn pair_view(&self, address: &Address) -> Result<PairView<'_>, PylonError> {
        Ok(PairView::new(self.pair(address)?, &self.ledger))
    }

    pub fn treasury(&self, address: &Address) -> Result<&Treasury, PylonError> {
        self.treasuries
            .get(address)
            .ok_or_else(|| missing("treasury", address))
    }

    pub fn staking_pool(&self, address: &Address) -> Result<&StakingPool, PylonError> {
        self.pools
            .get(address)
            .ok_or_else(|| missing("staking pool", address))
    }

    pub fn bond(&self, address: &Address) -> Result<&BondIssuer, PylonError> {
        self.bonds.get(address).ok_or_else(|| missing("bond", address))
    }

    pub fn faucet(&self, address: &Address) -> Result<&RewardsFaucet, PylonError> {
        self.faucets
            .get(address)
            .ok_or_else(|| missing("faucet", address))
    }

    pub fn vault(&self, address: &Address) -> Result<&ShareVault, PylonError> {
        self.vaults.get(address).ok_or_else(|| missing("vault", address))
    }

    pub fn treasuries(&self) -> impl Iterator<Item = &Treasury> {
        self.treasuries.values()
    }

    pub fn staking_pools(&self) -> impl Iterator<Item = &StakingPool> {
        self.pools.values()
    }

    pub fn bonds(&self) -> impl Iterator<Item = &BondIssuer> {
        self.bonds.values()
    }

    pub fn faucets(&self) -> impl Iterator<Item = &RewardsFaucet> {
        self.faucets.values()
    }

    pub fn vaults(&self) -> impl Iterator<Item = &ShareVault> {
        self.vaults.values()
    }

    /// Owner of a staking pool: the owner of its treasury.
    pub fn staking_owner(&self, pool: &Address) -> Result<Address, PylonError> {
        let pool = self.staking_pool(pool)?;
        Ok(owner_of(&self.treasuries, &pool.treasury()))
    }

    /// Manager of a bond: the owner of its treasury.
    pub fn bond_manager(&self, bond: &Address) -> Result<Address, PylonError> {
        let bond = self.bond(bond)?;
        Ok(owner_of(&self.treasuries, &bond.treasury()))
    }

    /// Payout token spot price seen by `bond`, scaled by `UNIT`.
    pub fn current_price(&self, bond: &Address) -> Result<u128, PylonError> {
        let bond = self.bond(bond)?;
        bond.spot_price(&self.pair_view(&bond.source().price_pool())?)
    }

    /// Gross payout `bond` would give for `amount` right now.
    pub fn estimate_reward(&self, bond: &Address, amount: Amount) -> Result<Amount, PylonError> {
        let bond = self.bond(bond)?;
        bond.estimate_reward(&self.pair_view(&bond.source().price_pool())?, amount)
    }

    /// Largest amount `bond` accepts right now.
    pub fn max_bond_amount(&self, bond: &Address) -> Result<Amount, PylonError> {
        let issuer = self.bond(bond)?;
        let allowance = self.treasury(&issuer.treasury())?.bond_allowance(bond);
        issuer.max_bond_amount(&self.pair_view(&issuer.source().price_pool())?, allowance)
    }

    // ---- Tokens and pairs ----

    pub fn transfer(
        &mut self,
        ctx: &TxContext,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        self.ledger.transfer(&token, &ctx.caller, &to, amount)
    }

    pub fn approve(
        &mut self,
        ctx: &TxContext,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        self.ledger.approve(&token, &ctx.caller, &spender, amount);
        Ok(())
    }

    pub fn add_liquidity(
        &mut self,
        ctx: &TxContext,
        pair: Address,
        amount0: Amount,
        amount1: Amount,
    ) -> Result<Amount, PylonError> {
        let pool = self.pairs.get_mut(&pair).ok_or_else(|| missing("pair", &pair))?;
        let minted = pool.add_liquidity(&mut self.ledger, &ctx.caller, amount0, amount1)?;
        self.events.push(
            LiquidityAdded {
                pair,
                provider: ctx.caller,
                amount0,
                amount1,
                minted,
            }
            .into(),
        );
        Ok(minted)
    }

    pub fn swap(
        &mut self,
        ctx: &TxContext,
        pair: Address,
        token_in: Address,
        amount_in: Amount,
        min_out: Amount,
    ) -> Result<Amount, PylonError> {
        let pool = self.pairs.get_mut(&pair).ok_or_else(|| missing("pair", &pair))?;
        let amount_out = pool.swap(&mut self.ledger, &ctx.caller, &token_in, amount_in, min_out)?;
        self.events.push(
            Swapped {
                pair,
                trader: ctx.caller,
                token_in,
                amount_in,
                amount_out,
            }
            .into(),
        );
        Ok(amount_out)
    }

    // ---- Treasury ----

    pub fn set_bond_data(
        &mut self,
        ctx: &TxContext,
        treasury: Address,
        bond: Address,
        registered: bool,
        allowance: Amount,
        fee_bps: u32,
    ) -> Result<(), PylonError> {
        let treasury = self
            .treasuries
            .get_mut(&treasury)
            .ok_or_else(|| missing("treasury", &treasury))?;
        treasury.set_bond_data(ctx, bond, registered, allowance, fee_bps, &mut self.events)
    }

    /// Direct reward pull by a registered bond contract (the caller).
    pub fn treasury_get_reward(
        &mut self,
        ctx: &TxContext,
        treasury: Address,
        amount: Amount,
    ) -> Result<Amount, PylonError> {
        let treasury = self
            .treasuries
            .get_mut(&treasury)
            .ok_or_else(|| missing("treasury", &treasury))?;
        let payout = treasury.get_reward(ctx, &mut self.ledger, amount, &mut self.events)?;
        Ok(payout.net)
    }

    pub fn treasury_withdraw(
        &mut self,
        ctx: &TxContext,
        treasury: Address,
        token: Address,
        amount: Amount,
        to: Address,
    ) -> Result<(), PylonError> {
        let treasury = self
            .treasuries
            .get_mut(&treasury)
            .ok_or_else(|| missing("treasury", &treasury))?;
        treasury.withdraw_token(ctx, &mut self.ledger, token, amount, to, &mut self.events)
    }

    pub fn change_dao(
        &mut self,
        ctx: &TxContext,
        treasury: Address,
        dao: Address,
    ) -> Result<(), PylonError> {
        let treasury = self
            .treasuries
            .get_mut(&treasury)
            .ok_or_else(|| missing("treasury", &treasury))?;
        treasury.change_dao(ctx, dao, &mut self.events)
    }

    // ---- Ownership (treasury, faucet, vault) ----

    /// Nominate a new owner of any component with its own owner.
    pub fn pass_ownership(
        &mut self,
        ctx: &TxContext,
        component: Address,
        new_owner: Address,
    ) -> Result<(), PylonError> {
        if let Some(treasury) = self.treasuries.get_mut(&component) {
            return treasury.pass_ownership(ctx, new_owner, &mut self.events);
        }
        if let Some(faucet) = self.faucets.get_mut(&component) {
            return faucet.transfer_ownership(ctx, new_owner, &mut self.events);
        }
        if let Some(vault) = self.vaults.get_mut(&component) {
            return vault.transfer_ownership(ctx, new_owner, &mut self.events);
        }
        Err(missing("owned component", &component))
    }

    pub fn accept_ownership(&mut self, ctx: &TxContext, component: Address) -> Result<(), PylonError> {
        if let Some(treasury) = self.treasuries.get_mut(&component) {
            return treasury.accept_ownership(ctx, &mut self.events);
        }
        if let Some(faucet) = self.faucets.get_mut(&component) {
            return faucet.claim_ownership(ctx, &mut self.events);
        }
        if let Some(vault) = self.vaults.get_mut(&component) {
            return vault.claim_ownership(ctx, &mut self.events);
        }
        Err(missing("owned component", &component))
    }

    // ---- Staking ----

    pub fn stake(
        &mut self,
        ctx: &TxContext,
        pool: Address,
        amount: Amount,
        on_behalf_of: Address,
    ) -> Result<(), PylonError> {
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.stake(ctx, &mut self.ledger, amount, on_behalf_of, &mut self.events)
    }

    pub fn withdraw(&mut self, ctx: &TxContext, pool: Address, amount: Amount) -> Result<(), PylonError> {
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.withdraw(ctx, &mut self.ledger, amount, &mut self.events)
    }

    pub fn get_reward(&mut self, ctx: &TxContext, pool: Address) -> Result<Amount, PylonError> {
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.get_reward(ctx, &mut self.ledger, &mut self.events)
    }

    pub fn exit(&mut self, ctx: &TxContext, pool: Address) -> Result<(Amount, Amount), PylonError> {
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.exit(ctx, &mut self.ledger, &mut self.events)
    }

    /// Owner reward top-up. The tokens must already sit in the pool.
    pub fn added_reward(&mut self, ctx: &TxContext, pool: Address, amount: Amount) -> Result<(), PylonError> {
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        let owner = owner_of(&self.treasuries, &staking.treasury());
        staking.added_reward(ctx, owner, &self.ledger, amount, &mut self.events)?;
        Ok(())
    }

    pub fn push_reward(&mut self, ctx: &TxContext, pool: Address) -> Result<(), PylonError> {
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        let treasury_address = staking.treasury();
        let treasury = self
            .treasuries
            .get_mut(&treasury_address)
            .ok_or_else(|| missing("treasury", &treasury_address))?;
        staking.push_reward(ctx, &mut self.ledger, treasury, &mut self.events)?;
        Ok(())
    }

    pub fn change_staking_treasury(
        &mut self,
        ctx: &TxContext,
        pool: Address,
        treasury: Address,
    ) -> Result<(), PylonError> {
        let owner = self.staking_owner(&pool)?;
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.change_treasury(ctx, owner, treasury, &mut self.events)
    }

    pub fn set_rewards_duration(
        &mut self,
        ctx: &TxContext,
        pool: Address,
        duration: u64,
    ) -> Result<(), PylonError> {
        let owner = self.staking_owner(&pool)?;
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.set_rewards_duration(ctx, owner, duration, &mut self.events)
    }

    pub fn set_reward_distributor(
        &mut self,
        ctx: &TxContext,
        pool: Address,
        distributor: Address,
        enabled: bool,
    ) -> Result<(), PylonError> {
        let owner = self.staking_owner(&pool)?;
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        staking.set_reward_distributor(ctx, owner, distributor, enabled, &mut self.events)
    }

    // ---- Bonds ----

    pub fn bond_deposit(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        amount: Amount,
        min_payout: Amount,
    ) -> Result<Amount, PylonError> {
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        let treasury_address = issuer.treasury();
        let treasury = self
            .treasuries
            .get_mut(&treasury_address)
            .ok_or_else(|| missing("treasury", &treasury_address))?;
        let pair_address = issuer.source().price_pool();
        let pair = self
            .pairs
            .get(&pair_address)
            .ok_or_else(|| missing("pair", &pair_address))?;
        let view = PairView::new(pair, &self.ledger);
        let created = issuer.bond(ctx, &mut self.ledger, treasury, &view, amount, min_payout, &mut self.events)?;
        Ok(created.payout)
    }

    pub fn redeem(&mut self, ctx: &TxContext, bond: Address, stake: bool) -> Result<Amount, PylonError> {
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        let staking = if stake {
            let pool = issuer.staking();
            Some(
                self.pools
                    .get_mut(&pool)
                    .ok_or_else(|| missing("staking pool", &pool))?,
            )
        } else {
            None
        };
        let redeemed = issuer.redeem(ctx, &mut self.ledger, staking, stake, &mut self.events)?;
        Ok(redeemed.payout_redeemed)
    }

    pub fn change_bond_terms(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        terms: BondTerms,
    ) -> Result<(), PylonError> {
        let manager = self.bond_manager(&bond)?;
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        issuer.change_terms(ctx, manager, terms, &mut self.events)
    }

    pub fn change_bond_price_pair(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        pair: Address,
    ) -> Result<(), PylonError> {
        let manager = self.bond_manager(&bond)?;
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        issuer.change_price_pair(ctx, manager, pair, &mut self.events)
    }

    pub fn change_bond_treasury(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        treasury: Address,
    ) -> Result<(), PylonError> {
        let manager = self.bond_manager(&bond)?;
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        issuer.change_treasury(ctx, manager, treasury, &mut self.events)
    }

    pub fn change_bond_staking(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        staking: Address,
    ) -> Result<(), PylonError> {
        let manager = self.bond_manager(&bond)?;
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        issuer.change_staking(ctx, manager, staking, &mut self.events)
    }

    pub fn set_trusted_origin(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        origin: Address,
        trusted: bool,
    ) -> Result<(), PylonError> {
        let manager = self.bond_manager(&bond)?;
        let issuer = self.bonds.get_mut(&bond).ok_or_else(|| missing("bond", &bond))?;
        issuer.set_trusted_origin(ctx, manager, origin, trusted, &mut self.events)
    }

    // ---- Faucet ----

    pub fn added_rewards(&mut self, ctx: &TxContext, faucet: Address, amount: Amount) -> Result<(), PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        dripper.added_rewards(ctx, &self.ledger, amount, &mut self.events)?;
        Ok(())
    }

    pub fn drip(&mut self, ctx: &TxContext, faucet: Address) -> Result<Amount, PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        let pool = dripper.staking();
        let staking = self
            .pools
            .get_mut(&pool)
            .ok_or_else(|| missing("staking pool", &pool))?;
        let dripped = dripper.drip(ctx, &mut self.ledger, staking, &mut self.events)?;
        Ok(dripped.amount)
    }

    pub fn change_faucet_staking(
        &mut self,
        ctx: &TxContext,
        faucet: Address,
        staking: Address,
    ) -> Result<(), PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        dripper.change_staking(ctx, staking, &mut self.events)
    }

    pub fn change_drip_interval(
        &mut self,
        ctx: &TxContext,
        faucet: Address,
        drip_interval: u64,
    ) -> Result<(), PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        dripper.change_drip_interval(ctx, drip_interval, &mut self.events)
    }

    pub fn change_faucet_duration(
        &mut self,
        ctx: &TxContext,
        faucet: Address,
        duration: u64,
    ) -> Result<(), PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        dripper.change_duration(ctx, duration, &mut self.events)
    }

    pub fn change_keeper(&mut self, ctx: &TxContext, faucet: Address, keeper: Address) -> Result<(), PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        dripper.change_keeper(ctx, keeper, &mut self.events)
    }

    pub fn faucet_withdraw(
        &mut self,
        ctx: &TxContext,
        faucet: Address,
        token: Address,
        amount: Amount,
        to: Address,
    ) -> Result<(), PylonError> {
        let dripper = self
            .faucets
            .get_mut(&faucet)
            .ok_or_else(|| missing("faucet", &faucet))?;
        dripper.withdraw_tokens(ctx, &mut self.ledger, token, amount, to, &mut self.events)
    }

    // ---- Vault ----

    pub fn vault_stake(&mut self, ctx: &TxContext, vault: Address, amount: Amount) -> Result<Amount, PylonError> {
        let shares = self
            .vaults
            .get_mut(&vault)
            .ok_or_else(|| missing("vault", &vault))?;
        shares.stake(ctx, &mut self.ledger, amount, &mut self.events)
    }

    pub fn vault_withdraw(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        to: Address,
        shares: Amount,
    ) -> Result<Amount, PylonError> {
        let sv = self
            .vaults
            .get_mut(&vault)
            .ok_or_else(|| missing("vault", &vault))?;
        sv.withdraw(ctx, &mut self.ledger, to, shares, &mut self.events)
    }

    pub fn vault_withdraw_for(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        owner: Address,
        to: Address,
        shares: Amount,
    ) -> Result<Amount, PylonError> {
        let sv = self
            .vaults
            .get_mut(&vault)
            .ok_or_else(|| missing("vault", &vault))?;
        sv.withdraw_for(ctx, &mut self.ledger, owner, to, shares, &mut self.events)
    }

    fn vault_mut(&mut self, address: &Address) -> Result<(&mut ShareVault, &mut EventLog), PylonError> {
        let vault = self
            .vaults
            .get_mut(address)
            .ok_or_else(|| missing("vault", address))?;
        Ok((vault, &mut self.events))
    }

    pub fn share_transfer(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        let (sv, events) = self.vault_mut(&vault)?;
        sv.transfer(ctx, to, amount, events)
    }

    pub fn share_transfer_from(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        let (sv, events) = self.vault_mut(&vault)?;
        sv.transfer_from(ctx, from, to, amount, events)
    }

    pub fn share_approve(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        let (sv, events) = self.vault_mut(&vault)?;
        sv.approve(ctx, spender, amount, events)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn permit(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        owner: Address,
        spender: Address,
        value: Amount,
        deadline: u64,
        signature: &[u8],
    ) -> Result<(), PylonError> {
        let (sv, events) = self.vault_mut(&vault)?;
        sv.permit(ctx, owner, spender, value, deadline, signature, events)
    }

    pub fn change_lock_time(
        &mut self,
        ctx: &TxContext,
        vault: Address,
        lock_duration: u64,
    ) -> Result<(), PylonError> {
        let (sv, events) = self.vault_mut(&vault)?;
        sv.change_lock_time(ctx, lock_duration, events)
    }
}
