// crates/pylon-cli/src/commands/address.rs
//
// `pylon address <label>...`: resolve labels to the addresses scenarios use.

use pylon_core::Address;

use crate::output::{format_json, format_table, KeyValue, OutputFormat};

pub fn run(labels: &[String], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<KeyValue> = labels
        .iter()
        .map(|label| KeyValue::new(label.as_str(), Address::from_label(label).to_hex()))
        .collect();
    match format {
        OutputFormat::Table => println!("{}", format_table(&rows)),
        OutputFormat::Json => println!("{}", format_json(&rows)),
    }
    Ok(())
}
