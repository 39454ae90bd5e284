// crates/pylon-economics/src/config.rs
//
// Protocol parameters for a Pylon deployment.
// Loaded from a TOML file or populated with the production defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use pylon_core::{Amount, PylonError, BPS_DENOMINATOR};

use crate::bond::{BondTerms, DEFAULT_DISCOUNT_BPS, DEFAULT_VESTING_TIME};
use crate::faucet::{DEFAULT_DRIP_INTERVAL, DEFAULT_FAUCET_DURATION};
use crate::staking::DEFAULT_REWARDS_DURATION;
use crate::vault::{DEFAULT_LOCK_DURATION, DEFAULT_VAULT_NAME, DEFAULT_VAULT_VERSION};

/// Top-level protocol configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Chain id bound into vault permit signatures.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub staking: StakingConfig,

    #[serde(default)]
    pub bond: BondConfig,

    #[serde(default)]
    pub faucet: FaucetConfig,

    #[serde(default)]
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Length of each reward period in seconds.
    #[serde(default = "default_staking_duration")]
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondConfig {
    /// Largest payout of a single bond, in payout tokens.
    #[serde(
        default = "default_payout_limit",
        with = "pylon_core::units::serde_amount"
    )]
    pub payout_limit: Amount,

    /// Vesting window in seconds.
    #[serde(default = "default_vesting_time")]
    pub vesting_time: u64,

    /// Premium over fair value, in basis points.
    #[serde(default = "default_discount_bps")]
    pub discount_bps: u32,

    /// Floor on the payout token price, in paired-asset tokens per payout token.
    #[serde(
        default = "default_min_price",
        with = "pylon_core::units::serde_amount"
    )]
    pub min_price: Amount,

    /// Treasury fee on each bond payout, in basis points.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaucetConfig {
    /// Length of a release schedule in seconds.
    #[serde(default = "default_faucet_duration")]
    pub duration: u64,

    /// Minimum seconds between drips.
    #[serde(default = "default_drip_interval")]
    pub drip_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Seconds shares stay locked after each stake.
    #[serde(default = "default_lock_duration")]
    pub lock_duration: u64,

    /// Share token name; part of the permit signing domain.
    #[serde(default = "default_vault_name")]
    pub name: String,

    /// Signing domain version.
    #[serde(default = "default_vault_version")]
    pub version: String,
}

fn default_chain_id() -> u64 {
    31_337
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_staking_duration() -> u64 {
    DEFAULT_REWARDS_DURATION
}

fn default_payout_limit() -> Amount {
    BondTerms::default().payout_limit
}

fn default_vesting_time() -> u64 {
    DEFAULT_VESTING_TIME
}

fn default_discount_bps() -> u32 {
    DEFAULT_DISCOUNT_BPS
}

fn default_min_price() -> Amount {
    BondTerms::default().min_price
}

fn default_fee_bps() -> u32 {
    100
}

fn default_faucet_duration() -> u64 {
    DEFAULT_FAUCET_DURATION
}

fn default_drip_interval() -> u64 {
    DEFAULT_DRIP_INTERVAL
}

fn default_lock_duration() -> u64 {
    DEFAULT_LOCK_DURATION
}

fn default_vault_name() -> String {
    DEFAULT_VAULT_NAME.to_string()
}

fn default_vault_version() -> String {
    DEFAULT_VAULT_VERSION.to_string()
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            log_level: default_log_level(),
            staking: StakingConfig::default(),
            bond: BondConfig::default(),
            faucet: FaucetConfig::default(),
            vault: VaultConfig::default(),
        }
    }
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            duration: default_staking_duration(),
        }
    }
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            payout_limit: default_payout_limit(),
            vesting_time: default_vesting_time(),
            discount_bps: default_discount_bps(),
            min_price: default_min_price(),
            fee_bps: default_fee_bps(),
        }
    }
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            duration: default_faucet_duration(),
            drip_interval: default_drip_interval(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            lock_duration: default_lock_duration(),
            name: default_vault_name(),
            version: default_vault_version(),
        }
    }
}

impl BondConfig {
    pub fn terms(&self) -> BondTerms {
        BondTerms {
            payout_limit: self.payout_limit,
            vesting_time: self.vesting_time,
            discount_bps: self.discount_bps,
            min_price: self.min_price,
        }
    }
}

impl ProtocolConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PylonError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| PylonError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, PylonError> {
        let config: ProtocolConfig =
            toml::from_str(contents).map_err(|e| PylonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, PylonError> {
        toml::to_string_pretty(self).map_err(|e| PylonError::Serialization(e.to_string()))
    }

    /// # Errors
    /// `PylonError::Config` for zero durations or basis points above 10,000.
    pub fn validate(&self) -> Result<(), PylonError> {
        let durations = [
            ("staking.duration", self.staking.duration),
            ("bond.vesting_time", self.bond.vesting_time),
            ("faucet.duration", self.faucet.duration),
            ("faucet.drip_interval", self.faucet.drip_interval),
            ("vault.lock_duration", self.vault.lock_duration),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(PylonError::Config(format!("{} must be non-zero", name)));
            }
        }
        for (name, bps) in [
            ("bond.discount_bps", self.bond.discount_bps),
            ("bond.fee_bps", self.bond.fee_bps),
        ] {
            if bps as u128 > BPS_DENOMINATOR {
                return Err(PylonError::Config(format!(
                    "{} is {} but may not exceed 10000",
                    name, bps
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_core::{tokens, UNIT};

    #[test]
    fn test_defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.chain_id, 31_337);
        assert_eq!(config.staking.duration, 2_419_200);
        assert_eq!(config.bond.payout_limit, tokens(100));
        assert_eq!(config.bond.vesting_time, 432_000);
        assert_eq!(config.bond.discount_bps, 1_000);
        assert_eq!(config.bond.min_price, UNIT / 20);
        assert_eq!(config.faucet.drip_interval, 259_200);
        assert_eq!(config.vault.lock_duration, 86_400);
        assert_eq!(config.vault.name, "sPYLON");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ProtocolConfig::from_toml(
            r#"
            chain_id = 1

            [bond]
            payout_limit = "250.5"
            discount_bps = 500

            [vault]
            lock_duration = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.bond.payout_limit, tokens(250) + UNIT / 2);
        assert_eq!(config.bond.discount_bps, 500);
        assert_eq!(config.bond.vesting_time, 432_000);
        assert_eq!(config.vault.lock_duration, 60);
        assert_eq!(config.vault.version, "1.0");
        assert_eq!(config.faucet, FaucetConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(ProtocolConfig::from_toml("").unwrap(), ProtocolConfig::default());
    }

    #[test]
    fn test_validation() {
        let err = ProtocolConfig::from_toml("[faucet]\ndrip_interval = 0").unwrap_err();
        assert!(matches!(err, PylonError::Config(_)));
        let err = ProtocolConfig::from_toml("[bond]\nfee_bps = 10001").unwrap_err();
        assert!(matches!(err, PylonError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ProtocolConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(ProtocolConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProtocolConfig::load("/nonexistent/pylon.toml").unwrap_err();
        assert!(matches!(err, PylonError::Config(_)));
    }
}
