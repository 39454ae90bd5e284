// crates/pylon-cli/src/commands/config.rs
//
// `pylon show-config`: print the effective protocol configuration.

use pylon_economics::ProtocolConfig;

use crate::output::{format_json, format_table, tokens, KeyValue, OutputFormat};

pub fn run(config: &ProtocolConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", format_json(config)),
        OutputFormat::Table => {
            let rows = vec![
                KeyValue::new("chain_id", config.chain_id),
                KeyValue::new("log_level", &config.log_level),
                KeyValue::new("staking.duration", config.staking.duration),
                KeyValue::new("bond.payout_limit", tokens(config.bond.payout_limit)),
                KeyValue::new("bond.vesting_time", config.bond.vesting_time),
                KeyValue::new("bond.discount_bps", config.bond.discount_bps),
                KeyValue::new("bond.min_price", tokens(config.bond.min_price)),
                KeyValue::new("bond.fee_bps", config.bond.fee_bps),
                KeyValue::new("faucet.duration", config.faucet.duration),
                KeyValue::new("faucet.drip_interval", config.faucet.drip_interval),
                KeyValue::new("vault.lock_duration", config.vault.lock_duration),
                KeyValue::new("vault.name", &config.vault.name),
                KeyValue::new("vault.version", &config.vault.version),
            ];
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}
