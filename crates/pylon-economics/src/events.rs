// crates/pylon-economics/src/events.rs
//
// Observable protocol events. Every state-changing operation appends to the
// transaction's event log; the engine discards the log of a failed
// transaction along with its state changes.

use serde::Serialize;

use pylon_core::{Address, Amount};

/// Treasury paid a bond (or staking pool) its reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreasuryPayout {
    pub treasury: Address,
    pub bond: Address,
    pub amount: Amount,
    pub fee: Amount,
    pub net: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondDataSet {
    pub treasury: Address,
    pub bond: Address,
    pub registered: bool,
    pub allowance: Amount,
    pub fee_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondCreated {
    pub bond: Address,
    pub owner: Address,
    pub bonded_assets: Amount,
    pub payout: Amount,
    pub vesting_date: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BondRedeemed {
    pub bond: Address,
    pub owner: Address,
    pub payout_redeemed: Amount,
    pub payout_remaining: Amount,
    pub vesting_remaining: u64,
    pub tokens_staked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Staked {
    pub pool: Address,
    pub payer: Address,
    pub beneficiary: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Withdrawn {
    pub pool: Address,
    pub account: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardPaid {
    pub pool: Address,
    pub account: Address,
    pub reward: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardAdded {
    pub pool: Address,
    pub amount: Amount,
    pub reward_rate: Amount,
    pub period_finish: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardsScheduled {
    pub faucet: Address,
    pub total_scheduled: Amount,
    pub schedule_end: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dripped {
    pub faucet: Address,
    pub amount: Amount,
    pub released: Amount,
    pub total_scheduled: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultStaked {
    pub vault: Address,
    pub account: Address,
    pub underlying: Amount,
    pub shares: Amount,
    pub unlock_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VaultWithdrawn {
    pub vault: Address,
    pub owner: Address,
    pub to: Address,
    pub shares: Amount,
    pub underlying: Amount,
}

/// Share movement inside a vault (mint and burn use the zero address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareTransfer {
    pub vault: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareApproval {
    pub vault: Address,
    pub owner: Address,
    pub spender: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnershipTransferred {
    pub component: Address,
    pub previous_owner: Address,
    pub new_owner: Address,
}

/// A privileged setter changed a parameter. `value` is rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterChanged {
    pub component: Address,
    pub parameter: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokensWithdrawn {
    pub component: Address,
    pub token: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidityAdded {
    pub pair: Address,
    pub provider: Address,
    pub amount0: Amount,
    pub amount1: Amount,
    pub minted: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Swapped {
    pub pair: Address,
    pub trader: Address,
    pub token_in: Address,
    pub amount_in: Amount,
    pub amount_out: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProtocolEvent {
    TreasuryPayout(TreasuryPayout),
    BondDataSet(BondDataSet),
    BondCreated(BondCreated),
    BondRedeemed(BondRedeemed),
    Staked(Staked),
    Withdrawn(Withdrawn),
    RewardPaid(RewardPaid),
    RewardAdded(RewardAdded),
    RewardsScheduled(RewardsScheduled),
    Dripped(Dripped),
    VaultStaked(VaultStaked),
    VaultWithdrawn(VaultWithdrawn),
    ShareTransfer(ShareTransfer),
    ShareApproval(ShareApproval),
    OwnershipTransferred(OwnershipTransferred),
    ParameterChanged(ParameterChanged),
    TokensWithdrawn(TokensWithdrawn),
    LiquidityAdded(LiquidityAdded),
    Swapped(Swapped),
}

impl ProtocolEvent {
    /// Short snake_case name, as used in the serialized `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::TreasuryPayout(_) => "treasury_payout",
            ProtocolEvent::BondDataSet(_) => "bond_data_set",
            ProtocolEvent::BondCreated(_) => "bond_created",
            ProtocolEvent::BondRedeemed(_) => "bond_redeemed",
            ProtocolEvent::Staked(_) => "staked",
            ProtocolEvent::Withdrawn(_) => "withdrawn",
            ProtocolEvent::RewardPaid(_) => "reward_paid",
            ProtocolEvent::RewardAdded(_) => "reward_added",
            ProtocolEvent::RewardsScheduled(_) => "rewards_scheduled",
            ProtocolEvent::Dripped(_) => "dripped",
            ProtocolEvent::VaultStaked(_) => "vault_staked",
            ProtocolEvent::VaultWithdrawn(_) => "vault_withdrawn",
            ProtocolEvent::ShareTransfer(_) => "share_transfer",
            ProtocolEvent::ShareApproval(_) => "share_approval",
            ProtocolEvent::OwnershipTransferred(_) => "ownership_transferred",
            ProtocolEvent::ParameterChanged(_) => "parameter_changed",
            ProtocolEvent::TokensWithdrawn(_) => "tokens_withdrawn",
            ProtocolEvent::LiquidityAdded(_) => "liquidity_added",
            ProtocolEvent::Swapped(_) => "swapped",
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ProtocolEvent {
                fn from(event: $variant) -> Self {
                    ProtocolEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_event!(
    TreasuryPayout,
    BondDataSet,
    BondCreated,
    BondRedeemed,
    Staked,
    Withdrawn,
    RewardPaid,
    RewardAdded,
    RewardsScheduled,
    Dripped,
    VaultStaked,
    VaultWithdrawn,
    ShareTransfer,
    ShareApproval,
    OwnershipTransferred,
    ParameterChanged,
    TokensWithdrawn,
    LiquidityAdded,
    Swapped,
);

/// Append-only event sink threaded through a transaction.
pub type EventLog = Vec<ProtocolEvent>;

/// Convenience constructor for setter events.
pub fn parameter_changed(
    component: Address,
    parameter: &str,
    value: impl ToString,
) -> ProtocolEvent {
    ProtocolEvent::ParameterChanged(ParameterChanged {
        component,
        parameter: parameter.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event: ProtocolEvent = Withdrawn {
            pool: Address::from_label("staking"),
            account: Address::from_label("alice"),
            amount: 5,
        }
        .into();
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with(r#"{"event":"withdrawn""#));
        assert!(json.contains(r#""amount":5"#));
        assert_eq!(event.name(), "withdrawn");
    }
}
