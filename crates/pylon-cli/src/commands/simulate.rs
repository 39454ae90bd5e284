// crates/pylon-cli/src/commands/simulate.rs
//
// `pylon simulate <scenario.toml>`: replay a scripted run and report each
// step and the watched accounts' final positions.

use tabled::Tabled;

use pylon_economics::ProtocolConfig;

use crate::output::{format_json, format_table, OutputFormat};
use crate::scenario::{simulate, AccountReport, Scenario, StepReport};

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Block")]
    block: u64,
    #[tabled(rename = "Time")]
    time: u64,
    #[tabled(rename = "Op")]
    op: &'static str,
    #[tabled(rename = "Caller")]
    caller: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Events")]
    events: String,
}

impl From<&StepReport> for StepRow {
    fn from(step: &StepReport) -> Self {
        Self {
            index: step.index,
            block: step.block,
            time: step.time,
            op: step.op,
            caller: step.caller.to_string(),
            outcome: step.outcome.clone(),
            events: step
                .events
                .iter()
                .map(|e| e.name())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "PYLON")]
    payout_token: String,
    #[tabled(rename = "WETH")]
    paired_token: String,
    #[tabled(rename = "LP")]
    lp_tokens: String,
    #[tabled(rename = "Staked")]
    staked: String,
    #[tabled(rename = "Earned")]
    earned: String,
    #[tabled(rename = "Vault shares")]
    vault_shares: String,
    #[tabled(rename = "Vesting")]
    bond_payout: String,
}

impl From<&AccountReport> for AccountRow {
    fn from(a: &AccountReport) -> Self {
        Self {
            account: a.account.to_string(),
            payout_token: a.payout_token.clone(),
            paired_token: a.paired_token.clone(),
            lp_tokens: a.lp_tokens.clone(),
            staked: a.staked.clone(),
            earned: a.earned.clone(),
            vault_shares: a.vault_shares.clone(),
            bond_payout: a.bond_payout.clone(),
        }
    }
}

pub fn run(path: &str, config: &ProtocolConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(path)?;
    tracing::info!(path, steps = scenario.steps.len(), "replaying scenario");
    let report = simulate(&scenario, config)?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => {
            if let Some(name) = &report.name {
                println!("Scenario: {}", name);
            }
            let steps: Vec<StepRow> = report.steps.iter().map(StepRow::from).collect();
            println!("{}", format_table(&steps));
            if !report.accounts.is_empty() {
                println!();
                let accounts: Vec<AccountRow> = report.accounts.iter().map(AccountRow::from).collect();
                println!("{}", format_table(&accounts));
            }
            println!();
            println!(
                "Final clock: t={} block={}  |  {} step(s), {} failure(s)",
                report.final_clock.0,
                report.final_clock.1,
                report.steps.len(),
                report.failures
            );
        }
    }

    if report.failures > 0 {
        return Err(format!("{} scenario step(s) did not go as scripted", report.failures).into());
    }
    Ok(())
}
