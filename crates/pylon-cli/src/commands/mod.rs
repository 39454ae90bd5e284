// crates/pylon-cli/src/commands/mod.rs
//
// Command module declarations for the Pylon CLI.

pub mod address;
pub mod config;
pub mod deploy;
pub mod simulate;
