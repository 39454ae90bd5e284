// crates/pylon-economics/src/lib.rs
//
// pylon-economics: treasury, streamed staking rewards, discounted vesting
// bonds, a rewards faucet, and a lockable share vault for the Pylon bond
// protocol, plus the transactional engine that drives them.
//
// All monetary values are base units of 18-decimal tokens (see
// `pylon_core::UNIT`).

pub mod bond;
pub mod config;
pub mod context;
pub mod engine;
pub mod events;
pub mod faucet;
pub mod ownership;
pub mod protocol;
pub mod staking;
pub mod treasury;
pub mod vault;

// Re-export key types for ergonomic access from downstream crates.
pub use bond::{BondIssuer, BondPosition, BondTerms, FlashGuard, PriceSource};
pub use config::ProtocolConfig;
pub use context::TxContext;
pub use engine::{Clock, Command, Engine, Transaction};
pub use events::{EventLog, ProtocolEvent};
pub use faucet::{DripSchedule, RewardsFaucet};
pub use ownership::Ownable;
pub use protocol::{Deployment, Protocol, Roles};
pub use staking::StakingPool;
pub use treasury::{BondEntry, Treasury};
pub use vault::{ShareVault, VaultDomain};
