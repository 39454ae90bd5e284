// crates/pylon-cli/src/commands/deploy.rs
//
// `pylon deploy`: build a standard deployment and print its wiring.

use serde::Serialize;
use tabled::Tabled;

use pylon_economics::{Protocol, ProtocolConfig, Roles};

use crate::output::{format_json, format_table, tokens, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
struct ComponentRow {
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Address")]
    address: String,
}

#[derive(Debug, Serialize, Tabled)]
struct BondRow {
    #[tabled(rename = "Bond")]
    bond: String,
    #[tabled(rename = "Registered")]
    registered: bool,
    #[tabled(rename = "Allowance")]
    allowance: String,
    #[tabled(rename = "Fee (bps)")]
    fee_bps: u32,
}

pub fn run(config: &ProtocolConfig, roles: Roles, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let (protocol, deployment) = Protocol::deploy(config, roles)?;
    let components: Vec<ComponentRow> = deployment
        .labels()
        .into_iter()
        .map(|(label, address)| ComponentRow {
            label,
            address: address.to_hex(),
        })
        .collect();
    let treasury = protocol.treasury(&deployment.treasury)?;
    let bonds: Vec<BondRow> = treasury
        .bonds()
        .map(|(bond, entry)| BondRow {
            bond: bond.to_string(),
            registered: entry.registered,
            allowance: tokens(entry.allowance),
            fee_bps: entry.fee_bps,
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "components": components,
                "treasury_bonds": bonds,
            });
            println!("{}", format_json(&value));
        }
        OutputFormat::Table => {
            println!("{}", format_table(&components));
            println!();
            println!("Treasury bond registry");
            println!("{}", format_table(&bonds));
        }
    }
    Ok(())
}
