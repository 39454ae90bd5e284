// crates/pylon-economics/src/vault.rs
//
// Share vault: wraps the payout token into a share token whose underlying
// claim grows as rewards are paid into the vault.
//
// Shares are minted pro-rata to the vault's underlying balance at stake time
// and redeemed pro-rata at withdraw time, so the share price only moves when
// underlying arrives or leaves outside stake/withdraw. Every stake (re)locks
// the staker's shares for `lock_duration`; locked shares cannot be
// withdrawn, transferred, or approved.
//
// Approvals can also be granted off-band with a signed permit. The signed
// digest binds the vault's domain (name, version, chain id, vault address),
// the owner, spender, value, the owner's current nonce, and a deadline.
// Owners sign with the ed25519 key behind their address.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pylon_core::crypto::{hash_bytes, hash_parts, verify_signature};
use pylon_core::math::{checked_add, checked_sub, mul_div};
use pylon_core::{Address, Amount, PylonError, TokenLedger, UNIT};

use crate::context::TxContext;
use crate::events::{
    parameter_changed, EventLog, OwnershipTransferred, ShareApproval, ShareTransfer, VaultStaked,
    VaultWithdrawn,
};
use crate::ownership::Ownable;

/// Default share lock after staking: 1 day.
pub const DEFAULT_LOCK_DURATION: u64 = 86_400;

pub const DEFAULT_VAULT_NAME: &str = "sPYLON";

pub const DEFAULT_VAULT_VERSION: &str = "1.0";

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const PERMIT_TYPE: &[u8] =
    b"Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// Signing domain of one vault deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
}

impl VaultDomain {
    /// Domain separator binding signatures to this vault at `vault`.
    pub fn separator(&self, vault: &Address) -> [u8; 32] {
        hash_parts(&[
            &hash_bytes(DOMAIN_TYPE),
            &hash_bytes(self.name.as_bytes()),
            &hash_bytes(self.version.as_bytes()),
            &self.chain_id.to_be_bytes(),
            vault.as_bytes(),
        ])
    }
}

/// Digest an owner signs to authorize `spender` for `value` shares.
pub fn permit_digest(
    domain_separator: &[u8; 32],
    owner: &Address,
    spender: &Address,
    value: Amount,
    nonce: u64,
    deadline: u64,
) -> [u8; 32] {
    let struct_hash = hash_parts(&[
        &hash_bytes(PERMIT_TYPE),
        owner.as_bytes(),
        spender.as_bytes(),
        &value.to_be_bytes(),
        &nonce.to_be_bytes(),
        &deadline.to_be_bytes(),
    ]);
    hash_parts(&[b"\x19\x01", domain_separator, &struct_hash])
}

#[derive(Debug, Clone)]
pub struct ShareVault {
    address: Address,
    underlying: Address,
    domain: VaultDomain,
    domain_separator: [u8; 32],
    lock_duration: u64,
    ownership: Ownable,

    total_shares: Amount,
    balances: BTreeMap<Address, Amount>,
    /// `(owner, spender)` -> remaining share allowance.
    allowances: BTreeMap<(Address, Address), Amount>,
    unlock_time: BTreeMap<Address, u64>,
    nonces: BTreeMap<Address, u64>,
}

impl ShareVault {
    pub fn new(
        address: Address,
        underlying: Address,
        owner: Address,
        domain: VaultDomain,
        lock_duration: u64,
    ) -> Self {
        let domain_separator = domain.separator(&address);
        Self {
            address,
            underlying,
            domain,
            domain_separator,
            lock_duration,
            ownership: Ownable::new(owner),
            total_shares: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            unlock_time: BTreeMap::new(),
            nonces: BTreeMap::new(),
        }
    }

    // ---- Views ----

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn underlying(&self) -> Address {
        self.underlying
    }

    pub fn name(&self) -> &str {
        &self.domain.name
    }

    pub fn domain(&self) -> &VaultDomain {
        &self.domain
    }

    pub fn domain_separator(&self) -> [u8; 32] {
        self.domain_separator
    }

    pub fn lock_duration(&self) -> u64 {
        self.lock_duration
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn pending_owner(&self) -> Address {
        self.ownership.pending_owner()
    }

    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn unlock_time(&self, account: &Address) -> u64 {
        self.unlock_time.get(account).copied().unwrap_or(0)
    }

    pub fn nonce(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    pub fn total_underlying(&self, ledger: &dyn TokenLedger) -> Amount {
        ledger.balance_of(&self.underlying, &self.address)
    }

    /// Underlying per share, scaled by `UNIT`. One before the first stake.
    pub fn share_price(&self, ledger: &dyn TokenLedger) -> Result<u128, PylonError> {
        if self.total_shares == 0 {
            return Ok(UNIT);
        }
        mul_div(self.total_underlying(ledger), UNIT, self.total_shares)
    }

    /// Underlying currently redeemable for `account`'s shares.
    pub fn underlying_of(
        &self,
        ledger: &dyn TokenLedger,
        account: &Address,
    ) -> Result<Amount, PylonError> {
        self.shares_to_underlying(ledger, self.balance_of(account))
    }

    fn shares_to_underlying(
        &self,
        ledger: &dyn TokenLedger,
        shares: Amount,
    ) -> Result<Amount, PylonError> {
        if self.total_shares == 0 {
            return Ok(0);
        }
        mul_div(shares, self.total_underlying(ledger), self.total_shares)
    }

    fn require_unlocked(&self, account: &Address, now: u64) -> Result<(), PylonError> {
        let unlock_time = self.unlock_time(account);
        if now < unlock_time {
            return Err(PylonError::TokensLocked { unlock_time });
        }
        Ok(())
    }

    // ---- Stake / withdraw ----

    /// Deposit `amount` underlying for shares, locking the caller's shares.
    ///
    /// The caller must have approved the vault for `amount`. Returns shares
    /// minted.
    pub fn stake(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<Amount, PylonError> {
        let held = self.total_underlying(ledger);
        let shares = if self.total_shares == 0 {
            amount
        } else if held == 0 {
            return Err(PylonError::InvalidState(
                "vault has shares but no underlying".to_string(),
            ));
        } else {
            mul_div(amount, self.total_shares, held)?
        };
        if shares == 0 {
            return Err(PylonError::InvalidState("stake mints zero shares".to_string()));
        }

        let account = ctx.caller;
        ledger.transfer_from(&self.underlying, &self.address, &account, &self.address, amount)?;
        self.mint(account, shares)?;
        let unlock_time = ctx.now + self.lock_duration;
        self.unlock_time.insert(account, unlock_time);

        tracing::debug!(vault = %self.address, %account, amount, shares, unlock_time, "vault stake");
        events.push(
            ShareTransfer {
                vault: self.address,
                from: Address::ZERO,
                to: account,
                amount: shares,
            }
            .into(),
        );
        events.push(
            VaultStaked {
                vault: self.address,
                account,
                underlying: amount,
                shares,
                unlock_time,
            }
            .into(),
        );
        Ok(shares)
    }

    /// Burn the caller's `shares` and send the underlying to `to`.
    pub fn withdraw(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        to: Address,
        shares: Amount,
        events: &mut EventLog,
    ) -> Result<Amount, PylonError> {
        self.require_unlocked(&ctx.caller, ctx.now)?;
        self.redeem_shares(ledger, ctx.caller, to, shares, events)
    }

    /// Burn `owner`'s shares on its behalf, consuming the caller's allowance.
    pub fn withdraw_for(
        &mut self,
        ctx: &TxContext,
        ledger: &mut dyn TokenLedger,
        owner: Address,
        to: Address,
        shares: Amount,
        events: &mut EventLog,
    ) -> Result<Amount, PylonError> {
        self.require_unlocked(&owner, ctx.now)?;
        self.spend_allowance(&owner, &ctx.caller, shares)?;
        self.redeem_shares(ledger, owner, to, shares, events)
    }

    fn redeem_shares(
        &mut self,
        ledger: &mut dyn TokenLedger,
        owner: Address,
        to: Address,
        shares: Amount,
        events: &mut EventLog,
    ) -> Result<Amount, PylonError> {
        let available = self.balance_of(&owner);
        if shares > available {
            return Err(PylonError::InsufficientBalance {
                requested: shares,
                available,
            });
        }
        let underlying = self.shares_to_underlying(ledger, shares)?;
        self.burn(owner, shares)?;
        ledger.transfer(&self.underlying, &self.address, &to, underlying)?;

        tracing::debug!(vault = %self.address, %owner, %to, shares, underlying, "vault withdraw");
        events.push(
            ShareTransfer {
                vault: self.address,
                from: owner,
                to: Address::ZERO,
                amount: shares,
            }
            .into(),
        );
        events.push(
            VaultWithdrawn {
                vault: self.address,
                owner,
                to,
                shares,
                underlying,
            }
            .into(),
        );
        Ok(underlying)
    }

    // ---- Share token ----

    pub fn transfer(
        &mut self,
        ctx: &TxContext,
        to: Address,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.require_unlocked(&ctx.caller, ctx.now)?;
        self.move_shares(ctx.caller, to, amount, events)
    }

    pub fn transfer_from(
        &mut self,
        ctx: &TxContext,
        from: Address,
        to: Address,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.require_unlocked(&from, ctx.now)?;
        self.spend_allowance(&from, &ctx.caller, amount)?;
        self.move_shares(from, to, amount, events)
    }

    pub fn approve(
        &mut self,
        ctx: &TxContext,
        spender: Address,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.require_unlocked(&ctx.caller, ctx.now)?;
        self.set_allowance(ctx.caller, spender, amount, events);
        Ok(())
    }

    /// Apply a signed approval. Anyone may submit it.
    ///
    /// # Errors
    /// - `PermitExpired` if `now` is past `deadline`.
    /// - `PermitInvalidSignature` if the signature does not verify for
    ///   `owner` at its current nonce.
    #[allow(clippy::too_many_arguments)]
    pub fn permit(
        &mut self,
        ctx: &TxContext,
        owner: Address,
        spender: Address,
        value: Amount,
        deadline: u64,
        signature: &[u8],
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        if ctx.now > deadline {
            return Err(PylonError::PermitExpired);
        }
        let nonce = self.nonce(&owner);
        let digest = permit_digest(&self.domain_separator, &owner, &spender, value, nonce, deadline);
        match verify_signature(&owner, &digest, signature) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(PylonError::PermitInvalidSignature),
        }
        self.nonces.insert(owner, nonce + 1);
        self.set_allowance(owner, spender, value, events);
        tracing::debug!(vault = %self.address, %owner, %spender, value, nonce, "permit applied");
        Ok(())
    }

    /// Sign a permit for this vault with `keypair` at the owner's current nonce.
    pub fn sign_permit(
        &self,
        keypair: &pylon_core::Keypair,
        spender: &Address,
        value: Amount,
        deadline: u64,
    ) -> Vec<u8> {
        let owner = keypair.address();
        let digest = permit_digest(
            &self.domain_separator,
            &owner,
            spender,
            value,
            self.nonce(&owner),
            deadline,
        );
        keypair.sign(&digest)
    }

    fn set_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
        events: &mut EventLog,
    ) {
        self.allowances.insert((owner, spender), amount);
        events.push(
            ShareApproval {
                vault: self.address,
                owner,
                spender,
                amount,
            }
            .into(),
        );
    }

    /// Consume allowance. `u128::MAX` is an unlimited approval.
    fn spend_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), PylonError> {
        let allowance = self.allowance(owner, spender);
        if allowance == Amount::MAX {
            return Ok(());
        }
        if allowance < amount {
            return Err(PylonError::InsufficientAllowance {
                requested: amount,
                allowance,
            });
        }
        self.allowances.insert((*owner, *spender), allowance - amount);
        Ok(())
    }

    fn move_shares(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        let available = self.balance_of(&from);
        if amount > available {
            return Err(PylonError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        self.burn(from, amount)?;
        self.mint(to, amount)?;
        events.push(
            ShareTransfer {
                vault: self.address,
                from,
                to,
                amount,
            }
            .into(),
        );
        Ok(())
    }

    fn mint(&mut self, to: Address, shares: Amount) -> Result<(), PylonError> {
        self.total_shares = checked_add(self.total_shares, shares)?;
        let balance = self.balances.entry(to).or_insert(0);
        *balance = checked_add(*balance, shares)?;
        Ok(())
    }

    fn burn(&mut self, from: Address, shares: Amount) -> Result<(), PylonError> {
        let balance = checked_sub(self.balance_of(&from), shares)?;
        self.total_shares = checked_sub(self.total_shares, shares)?;
        if balance == 0 {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, balance);
        }
        Ok(())
    }

    // ---- Owner operations ----

    pub fn change_lock_time(
        &mut self,
        ctx: &TxContext,
        lock_duration: u64,
        events: &mut EventLog,
    ) -> Result<(), PylonError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.lock_duration = lock_duration;
        tracing::info!(vault = %self.address, lock_duration, "vault lock time changed");
        events.push(parameter_changed(self.address, "lock_duration", lock_duration));
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
    use pylon_core::{tokens, InMemoryLedger, Keypair};

    const T0: u64 = 1_700_000_000;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn ctx(caller: &str, now: u64) -> TxContext {
        TxContext::new(addr(caller), now, now)
    }

    fn setup() -> (ShareVault, InMemoryLedger, EventLog) {
        let mut ledger = InMemoryLedger::new();
        let vault = ShareVault::new(
            addr("vault"),
            addr("payout"),
            addr("owner"),
            VaultDomain {
                name: DEFAULT_VAULT_NAME.to_string(),
                version: DEFAULT_VAULT_VERSION.to_string(),
                chain_id: 31_337,
            },
            DEFAULT_LOCK_DURATION,
        );
        for who in ["alice", "bob"] {
            ledger.mint(&addr("payout"), &addr(who), tokens(1_000)).unwrap();
            ledger.approve(&addr("payout"), &addr(who), &addr("vault"), u128::MAX);
        }
        (vault, ledger, EventLog::new())
    }

    #[test]
    fn test_first_stake_mints_one_to_one() {
        let (mut vault, mut ledger, mut events) = setup();
        let shares = vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(100), &mut events)
            .unwrap();
        assert_eq!(shares, tokens(100));
        assert_eq!(vault.share_price(&ledger).unwrap(), UNIT);
        assert_eq!(vault.unlock_time(&addr("alice")), T0 + DEFAULT_LOCK_DURATION);
    }

    #[test]
    fn test_rewards_raise_share_price() {
        let (mut vault, mut ledger, mut events) = setup();
        vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(100), &mut events)
            .unwrap();
        // Rewards paid into the vault outside stake/withdraw.
        ledger.mint(&addr("payout"), &addr("vault"), tokens(100)).unwrap();
        assert_eq!(vault.share_price(&ledger).unwrap(), 2 * UNIT);

        let bob_shares = vault
            .stake(&ctx("bob", T0), &mut ledger, tokens(100), &mut events)
            .unwrap();
        assert_eq!(bob_shares, tokens(50));
        assert_eq!(vault.underlying_of(&ledger, &addr("alice")).unwrap(), tokens(200));
    }

    #[test]
    fn test_lock_boundary() {
        let (mut vault, mut ledger, mut events) = setup();
        vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(100), &mut events)
            .unwrap();
        let err = vault
            .withdraw(&ctx("alice", T0 + DEFAULT_LOCK_DURATION - 1), &mut ledger, addr("alice"), tokens(1), &mut events)
            .unwrap_err();
        assert_eq!(
            err,
            PylonError::TokensLocked {
                unlock_time: T0 + DEFAULT_LOCK_DURATION
            }
        );
        let out = vault
            .withdraw(&ctx("alice", T0 + DEFAULT_LOCK_DURATION), &mut ledger, addr("alice"), tokens(100), &mut events)
            .unwrap();
        assert_eq!(out, tokens(100));
        assert_eq!(vault.total_shares(), 0);
        assert_eq!(ledger.balance_of(&addr("payout"), &addr("alice")), tokens(1_000));
    }

    #[test]
    fn test_restake_relocks() {
        let (mut vault, mut ledger, mut events) = setup();
        vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(10), &mut events)
            .unwrap();
        let later = T0 + DEFAULT_LOCK_DURATION;
        vault
            .stake(&ctx("alice", later), &mut ledger, tokens(10), &mut events)
            .unwrap();
        assert_eq!(vault.unlock_time(&addr("alice")), later + DEFAULT_LOCK_DURATION);
        assert!(vault
            .transfer(&ctx("alice", later + 1), addr("bob"), 1, &mut events)
            .is_err());
    }

    #[test]
    fn test_locked_shares_cannot_move_or_be_approved() {
        let (mut vault, mut ledger, mut events) = setup();
        vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(10), &mut events)
            .unwrap();
        let locked = ctx("alice", T0 + 1);
        assert!(matches!(
            vault.transfer(&locked, addr("bob"), 1, &mut events),
            Err(PylonError::TokensLocked { .. })
        ));
        assert!(matches!(
            vault.approve(&locked, addr("bob"), 1, &mut events),
            Err(PylonError::TokensLocked { .. })
        ));
    }

    #[test]
    fn test_transfer_and_transfer_from_after_unlock() {
        let (mut vault, mut ledger, mut events) = setup();
        vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(10), &mut events)
            .unwrap();
        let open = T0 + DEFAULT_LOCK_DURATION;
        vault
            .transfer(&ctx("alice", open), addr("bob"), tokens(4), &mut events)
            .unwrap();
        vault
            .approve(&ctx("alice", open), addr("carol"), tokens(2), &mut events)
            .unwrap();
        vault
            .transfer_from(&ctx("carol", open), addr("alice"), addr("carol"), tokens(2), &mut events)
            .unwrap();
        assert!(matches!(
            vault.transfer_from(&ctx("carol", open), addr("alice"), addr("carol"), 1, &mut events),
            Err(PylonError::InsufficientAllowance { .. })
        ));
        assert_eq!(vault.balance_of(&addr("alice")), tokens(4));
        assert_eq!(vault.balance_of(&addr("bob")), tokens(4));
        assert_eq!(vault.balance_of(&addr("carol")), tokens(2));
        assert_eq!(vault.total_shares(), tokens(10));
    }

    #[test]
    fn test_withdraw_for_with_allowance() {
        let (mut vault, mut ledger, mut events) = setup();
        vault
            .stake(&ctx("alice", T0), &mut ledger, tokens(10), &mut events)
            .unwrap();
        let open = T0 + DEFAULT_LOCK_DURATION;
        vault
            .approve(&ctx("alice", open), addr("carol"), tokens(5), &mut events)
            .unwrap();
        let out = vault
            .withdraw_for(&ctx("carol", open), &mut ledger, addr("alice"), addr("carol"), tokens(5), &mut events)
            .unwrap();
        assert_eq!(out, tokens(5));
        assert_eq!(ledger.balance_of(&addr("payout"), &addr("carol")), tokens(5));
        assert_eq!(vault.allowance(&addr("alice"), &addr("carol")), 0);
    }

    #[test]
    fn test_permit_sets_allowance_once() {
        let (mut vault, _, mut events) = setup();
        let owner = Keypair::from_label("alice");
        let signature = vault.sign_permit(&owner, &addr("bob"), tokens(7), T0 + 100);

        vault
            .permit(&ctx("relayer", T0), owner.address(), addr("bob"), tokens(7), T0 + 100, &signature, &mut events)
            .unwrap();
        assert_eq!(vault.allowance(&owner.address(), &addr("bob")), tokens(7));
        assert_eq!(vault.nonce(&owner.address()), 1);

        // Replay fails: the nonce moved on.
        assert_eq!(
            vault.permit(&ctx("relayer", T0), owner.address(), addr("bob"), tokens(7), T0 + 100, &signature, &mut events),
            Err(PylonError::PermitInvalidSignature)
        );
    }

    #[test]
    fn test_permit_expired_and_wrong_signer() {
        let (mut vault, _, mut events) = setup();
        let owner = Keypair::from_label("alice");
        let signature = vault.sign_permit(&owner, &addr("bob"), 1, T0);
        assert_eq!(
            vault.permit(&ctx("relayer", T0 + 1), owner.address(), addr("bob"), 1, T0, &signature, &mut events),
            Err(PylonError::PermitExpired)
        );
        let mallory = Keypair::from_label("mallory");
        let forged = vault.sign_permit(&mallory, &addr("bob"), 1, T0);
        assert_eq!(
            vault.permit(&ctx("relayer", T0), owner.address(), addr("bob"), 1, T0, &forged, &mut events),
            Err(PylonError::PermitInvalidSignature)
        );
        // Deadline is inclusive.
        assert!(vault
            .permit(&ctx("relayer", T0), owner.address(), addr("bob"), 1, T0, &signature, &mut events)
            .is_ok());
    }

    #[test]
    fn test_domain_separator_depends_on_chain_and_address() {
        let domain = VaultDomain {
            name: DEFAULT_VAULT_NAME.to_string(),
            version: DEFAULT_VAULT_VERSION.to_string(),
            chain_id: 31_337,
        };
        let other_chain = VaultDomain {
            chain_id: 1,
            ..domain.clone()
        };
        assert_ne!(domain.separator(&addr("vault")), other_chain.separator(&addr("vault")));
        assert_ne!(domain.separator(&addr("vault")), domain.separator(&addr("vault2")));
    }

    #[test]
    fn test_change_lock_time_owner_only() {
        let (mut vault, _, mut events) = setup();
        assert_eq!(
            vault.change_lock_time(&ctx("alice", T0), 0, &mut events),
            Err(PylonError::Unauthorized)
        );
        vault.change_lock_time(&ctx("owner", T0), 60, &mut events).unwrap();
        assert_eq!(vault.lock_duration(), 60);
    }

    #[test]
    fn test_two_step_ownership() {
        let (mut vault, _, mut events) = setup();
        assert!(vault.pending_owner().is_zero());
        vault
            .transfer_ownership(&ctx("owner", T0), addr("bob"), &mut events)
            .unwrap();
        assert_eq!(vault.pending_owner(), addr("bob"));
        assert_eq!(vault.owner(), addr("owner"));
        assert_eq!(vault.claim_ownership(&ctx("alice", T0), &mut events), Err(PylonError::Unauthorized));

        vault.claim_ownership(&ctx("bob", T0), &mut events).unwrap();
        assert_eq!(vault.owner(), addr("bob"));
        assert!(vault.pending_owner().is_zero());
        vault.change_lock_time(&ctx("bob", T0), 60, &mut events).unwrap();
    }
}
