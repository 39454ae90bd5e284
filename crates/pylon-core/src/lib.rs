// crates/pylon-core/src/lib.rs
//
// pylon-core: Core types, collaborator traits, fixed-point math, and crypto
// primitives for the Pylon bond protocol.
//
// This is the leaf crate every other crate in the workspace depends on. It
// defines account identities, the error taxonomy, the token-ledger and
// reserve-pool contracts the economics layer consumes, and in-memory
// implementations of both.

pub mod address;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod math;
pub mod pair;
pub mod traits;
pub mod units;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use pylon_core::Address;`

pub use address::Address;
pub use crypto::Keypair;
pub use error::PylonError;
pub use ledger::InMemoryLedger;
pub use pair::{ConstantProductPair, PairView};
pub use traits::{ReservePool, TokenLedger};
pub use units::{tokens, Amount, TokenAmount, BPS_DENOMINATOR, UNIT};
