// crates/pylon-economics/src/treasury.rs
//
// Protocol treasury for the Pylon bond protocol.
//
// The treasury custodies the payout token. Registered bonds (and staking
// pools, which draw their reward top-ups the same way) pull rewards from it
// against a per-bond allowance; a per-bond fee slice of every pull goes to
// the DAO address. Bonded assets are forwarded here by the bonds, and the
// owner can sweep any token out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pylon_core::math::{apply_bps, checked_sub};
use pylon_core::{Address, Amount, PylonError, TokenLedger};

use crate::context::TxContext;
use crate::events::{
    parameter_changed, BondDataSet, EventLog, OwnershipTransferred, TokensWithdrawn,
    TreasuryPayout,
};
use crate::ownership::Ownable;

/// Treasury-side registration of one bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BondEntry {
    pub registered: bool,
    /// Payout tokens the bond may still pull.
    pub allowance: Amount,
    /// Share of each pull routed to the DAO, in basis points.
    pub fee_bps: u32,
}

/// The payout-token treasury.
#[derive(Debug, Clone)]
pub struct Treasury {
    address: Address,
    token: Address,
    dao: Address,
    ownership: Ownable,
    bonds: BTreeMap<Address, BondEntry>,
}

impl Treasury {
    /// Deploy a treasury at `address` that pays out in `token`.
    pub fn new(address: Address, token: Address, owner: Address, dao: Address) -> Self {
        Self {
            address,
            token,
            dao,
            ownership: Ownable::new(owner),
            bonds: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn dao(&self) -> Address {
        self.dao
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.ownership.pending_owner()
    }

    /// Registration of `bond`, or an unregistered zero entry.
    pub fn bond_data(&self, bond: &Address) -> BondEntry {
        self.bonds.get(bond).copied().unwrap_or_default()
    }

    pub fn is_bond_registered(&self, bond: &Address) -> bool {
        self.bond_data(bond).registered
    }

    pub fn bond_allowance(&self, bond: &Address) -> Amount {
        self.bond_data(bond).allowance
    }

    pub fn bond_fee(&self, bond: &Address) -> u32 {
        self.bond_data(bond).fee_bps
    }

    /// All bond registrations, ordered by bond address.
    pub fn bonds(&self) -> impl Iterator<Item = (&Address, &BondEntry)> {
        self.bonds.iter()
    }

    /// Payout tokens currently held.
    pub fn balance(&self, ledger: &dyn TokenLedger) -> Amount {
        ledger.balance_of(&self.token, &self.address)
    }

    /// Overwrite the registration of `bond`. Not additive.
    ///
    /// # Errors
    /// `Unauthorized` unless called by the owner; `InvalidState` for a fee
    /// above 100%.
    pub fn set_bond_data(
        &mut self,
        ctx: &TxContext,
        bond: Address,
        registered: bool,
        allowance: Amount,
        fee_bps: u32,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        if fee_bps as u128 > pylon_core::BPS_DENOMINATOR {
            return Err(PylonError::InvalidState(format!(
                "fee {} bps exceeds 10000",
                fee_bps
            )));
        }
        self.bonds.insert(
            bond,
            BondEntry {
                registered,
                allowance,
                fee_bps,
            },
        );
        tracing::info!(treasury = %self.address, %bond, registered, allowance, fee_bps, "bond data set");
        events.push(
            BondDataSet {
                treasury: self.address,
                bond,
                registered,
                allowance,
                fee_bps,
            }
            .into(),
        );
        Ok(())
    }

    /// Pay `amount` to the calling bond, minus the DAO fee slice.
    ///
    /// Returns the payout record; `net` is what the bond received.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is not a registered bond.
    /// - `InsufficientBalance` if the treasury holds less than `amount`.
    /// - `AllowanceExceeded` if `amount` is above the bond's allowance.
    pub fn get_reward(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<TreasuryPayout, PylonError> {
        let bond = ctx.caller;
        let entry = self.bond_data(&bond);
        if !entry.registered {
            return Err(PylonError::Unauthorized);
        }
        let available = self.balance(ledger);
        if available < amount {
            return Err(PylonError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if amount > entry.allowance {
            return Err(PylonError::AllowanceExceeded {
                requested: amount,
                allowance: entry.allowance,
            });
        }

        let fee = apply_bps(amount, entry.fee_bps)?;
        let net = checked_sub(amount, fee)?;
        if let Some(stored) = self.bonds.get_mut(&bond) {
            stored.allowance = entry.allowance - amount;
        }
        if fee > 0 {
            ledger.transfer(&self.token, &self.address, &self.dao, fee)?;
        }
        if net > 0 {
            ledger.transfer(&self.token, &self.address, &bond, net)?;
        }

        tracing::info!(treasury = %self.address, %bond, amount, fee, net, "reward paid to bond");
        let payout = TreasuryPayout {
            treasury: self.address,
            bond,
            amount,
            fee,
            net,
        };
        events.push(payout.clone().into());
        Ok(payout)
    }

    /// Sweep `amount` of any `token` to `to`.
    pub fn withdraw_token(
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
        tracing::info!(treasury = %self.address, %token, amount, %to, "tokens withdrawn");
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

    pub fn change_dao(
        &mut self,
        ctx: &TxContext,
        dao: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.dao = dao;
        events.push(parameter_changed(self.address, "dao", dao));
        Ok(())
    }

    /// First step of an ownership hand-over.
    pub fn pass_ownership(
        &mut self,
        ctx: &TxContext,
        new_owner: Address,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.transfer(&ctx.caller, new_owner)?;
        events.push(parameter_changed(self.address, "pending_owner", new_owner));
        Ok(())
    }

    /// Second step: the nominee accepts.
    pub fn accept_ownership(
        &mut self,
        ctx: &TxContext,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        let (previous_owner, new_owner) = self.ownership.claim(&ctx.caller)?;
        tracing::info!(treasury = %self.address, %previous_owner, %new_owner, "treasury ownership transferred");
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
    use pylon_core::{tokens, InMemoryLedger, UNIT};

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn setup() -> (Treasury, InMemoryLedger) {
        let mut ledger = InMemoryLedger::new();
        let treasury = Treasury::new(addr("treasury"), addr("payout"), addr("owner"), addr("dao"));
        ledger
            .mint(&addr("payout"), &addr("treasury"), tokens(10))
            .unwrap();
        (treasury, ledger)
    }

    fn ctx(caller: &str) -> TxContext {
        TxContext::new(addr(caller), 1_000, 1)
    }

    #[test]
    fn test_get_reward_splits_fee() {
        let (mut treasury, mut ledger) = setup();
        let mut events = EventLog::new();
        treasury
            .set_bond_data(&ctx("owner"), addr("bond"), true, tokens(10), 1_000, &mut events)
            .unwrap();

        let payout = treasury
            .get_reward(&ctx("bond"), &mut ledger, tokens(6), &mut events)
            .unwrap();
        assert_eq!(payout.fee, 6 * UNIT / 10);
        assert_eq!(payout.net, 54 * UNIT / 10);
        assert_eq!(ledger.balance_of(&addr("payout"), &addr("bond")), 54 * UNIT / 10);
        assert_eq!(ledger.balance_of(&addr("payout"), &addr("dao")), 6 * UNIT / 10);
        assert_eq!(treasury.bond_allowance(&addr("bond")), tokens(4));
        assert_eq!(treasury.balance(&ledger), tokens(4));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_get_reward_beyond_allowance_sold_out() {
        let (mut treasury, mut ledger) = setup();
        let mut events = EventLog::new();
        treasury
            .set_bond_data(&ctx("owner"), addr("bond"), true, tokens(4), 0, &mut events)
            .unwrap();
        let err = treasury
            .get_reward(&ctx("bond"), &mut ledger, tokens(5), &mut events)
            .unwrap_err();
        assert!(matches!(err, PylonError::AllowanceExceeded { .. }));
        assert!(err.to_string().starts_with("Sold out"));
    }

    #[test]
    fn test_get_reward_insufficient_balance_checked_before_allowance() {
        let (mut treasury, mut ledger) = setup();
        let mut events = EventLog::new();
        treasury
            .set_bond_data(&ctx("owner"), addr("bond"), true, tokens(1), 0, &mut events)
            .unwrap();
        let err = treasury
            .get_reward(&ctx("bond"), &mut ledger, tokens(11), &mut events)
            .unwrap_err();
        assert!(matches!(err, PylonError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_unregistered_bond_unauthorized() {
        let (mut treasury, mut ledger) = setup();
        let mut events = EventLog::new();
        let err = treasury
            .get_reward(&ctx("stranger"), &mut ledger, 1, &mut events)
            .unwrap_err();
        assert_eq!(err, PylonError::Unauthorized);

        // Deregistering keeps the allowance but blocks pulls.
        treasury
            .set_bond_data(&ctx("owner"), addr("bond"), false, tokens(5), 0, &mut events)
            .unwrap();
        let err = treasury
            .get_reward(&ctx("bond"), &mut ledger, 1, &mut events)
            .unwrap_err();
        assert_eq!(err, PylonError::Unauthorized);
    }

    #[test]
    fn test_set_bond_data_overwrites() {
        let (mut treasury, _) = setup();
        let mut events = EventLog::new();
        treasury
            .set_bond_data(&ctx("owner"), addr("bond"), true, tokens(5), 100, &mut events)
            .unwrap();
        treasury
            .set_bond_data(&ctx("owner"), addr("bond"), true, tokens(2), 300, &mut events)
            .unwrap();
        let entry = treasury.bond_data(&addr("bond"));
        assert_eq!(entry.allowance, tokens(2));
        assert_eq!(entry.fee_bps, 300);
    }

    #[test]
    fn test_owner_gates() {
        let (mut treasury, mut ledger) = setup();
        let mut events = EventLog::new();
        let stranger = ctx("stranger");
        assert_eq!(
            treasury.set_bond_data(&stranger, addr("bond"), true, 1, 0, &mut events),
            Err(PylonError::Unauthorized)
        );
        assert_eq!(
            treasury.withdraw_token(&stranger, &mut ledger, addr("payout"), 1, addr("stranger"), &mut events),
            Err(PylonError::Unauthorized)
        );
        assert_eq!(
            treasury.change_dao(&stranger, addr("stranger"), &mut events),
            Err(PylonError::Unauthorized)
        );
        assert_eq!(
            treasury.set_bond_data(&ctx("owner"), addr("bond"), true, 1, 10_001, &mut events),
            Err(PylonError::InvalidState("fee 10001 bps exceeds 10000".to_string()))
        );
    }

    #[test]
    fn test_withdraw_any_token() {
        let (mut treasury, mut ledger) = setup();
        let mut events = EventLog::new();
        ledger.mint(&addr("lp"), &addr("treasury"), 7).unwrap();
        treasury
            .withdraw_token(&ctx("owner"), &mut ledger, addr("lp"), 7, addr("owner"), &mut events)
            .unwrap();
        assert_eq!(ledger.balance_of(&addr("lp"), &addr("owner")), 7);
    }

    #[test]
    fn test_ownership_handover() {
        let (mut treasury, _) = setup();
        let mut events = EventLog::new();
        treasury
            .pass_ownership(&ctx("owner"), addr("next"), &mut events)
            .unwrap();
        assert_eq!(treasury.pending_owner(), addr("next"));
        assert_eq!(
            treasury.accept_ownership(&ctx("stranger"), &mut events),
            Err(PylonError::Unauthorized)
        );
        treasury.accept_ownership(&ctx("next"), &mut events).unwrap();
        assert_eq!(treasury.owner(), addr("next"));
        assert!(treasury.pending_owner().is_zero());
    }
}
