// crates/pylon-cli/src/scenario.rs
//
// Scripted protocol runs: a TOML file describing genesis balances and a
// sequence of transactions, replayed against a fresh standard deployment.
//
//     start = 1700000000
//     watch = ["alice"]
//
//     [[genesis.mint]]
//     token = "pylon"
//     to = "alice"
//     amount = "100"
//
//     [[step]]
//     advance = 60
//     caller = "alice"
//     op = "vault_stake"
//     vault = "vault"
//     amount = "10"
//
// Addresses are `0x` hex or labels; the deployment's components are
// reachable by their labels ("treasury", "staking", "lp-bond", ...).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pylon_core::units::serde_amount;
use pylon_core::{Address, Amount, PylonError, TokenLedger};
use pylon_economics::{
    Clock, Deployment, Engine, Protocol, ProtocolConfig, ProtocolEvent, Roles, Transaction,
};

use crate::output::tokens;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("setup failed: {0}")]
    Setup(#[from] PylonError),
}

fn default_start() -> u64 {
    1_700_000_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    /// Timestamp of the first block.
    #[serde(default = "default_start")]
    pub start: u64,

    #[serde(default)]
    pub roles: RoleLabels,

    #[serde(default)]
    pub genesis: Genesis,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,

    /// Accounts whose positions are reported at the end.
    #[serde(default)]
    pub watch: Vec<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleLabels {
    pub owner: Option<Address>,
    pub dao: Option<Address>,
    pub keeper: Option<Address>,
}

impl RoleLabels {
    fn resolve(&self) -> Roles {
        Roles {
            owner: self.owner.unwrap_or_else(|| Address::from_label("owner")),
            dao: self.dao.unwrap_or_else(|| Address::from_label("dao")),
            keeper: self.keeper.unwrap_or_else(|| Address::from_label("keeper")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genesis {
    #[serde(default)]
    pub mint: Vec<Mint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mint {
    pub token: Address,
    pub to: Address,
    #[serde(with = "serde_amount")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Seconds to move the clock forward first; also mines a block.
    #[serde(default)]
    pub advance: u64,

    /// Mine a block first without moving time.
    #[serde(default)]
    pub mine: bool,

    /// Substring of the error this step must fail with.
    #[serde(default)]
    pub expect_error: Option<String>,

    #[serde(flatten)]
    pub tx: Transaction,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub block: u64,
    pub time: u64,
    pub op: &'static str,
    pub caller: Address,
    pub outcome: String,
    /// True when the step did not do what the scenario said it would.
    pub failed: bool,
    pub events: Vec<ProtocolEvent>,
}

/// End-of-run position of one watched account. Amounts are token strings.
#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub account: Address,
    pub payout_token: String,
    pub paired_token: String,
    pub lp_tokens: String,
    pub staked: String,
    pub earned: String,
    pub vault_shares: String,
    pub bond_payout: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub name: Option<String>,
    pub final_clock: (u64, u64),
    pub steps: Vec<StepReport>,
    pub accounts: Vec<AccountReport>,
    pub failures: usize,
}

/// Deploy, apply genesis, and replay every step. Step failures are recorded
/// in the report rather than aborting the run.
pub fn simulate(scenario: &Scenario, config: &ProtocolConfig) -> Result<SimulationReport, ScenarioError> {
    let (mut protocol, deployment) = Protocol::deploy(config, scenario.roles.resolve())?;
    for mint in &scenario.genesis.mint {
        protocol.mint(&mint.token, &mint.to, mint.amount)?;
    }
    let mut engine = Engine::new(
        protocol,
        Clock {
            now: scenario.start,
            block: 1,
        },
    );

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        if step.advance > 0 {
            engine.advance(step.advance);
        }
        if step.mine {
            engine.mine();
        }
        let clock = engine.clock();
        let result = engine.submit(&step.tx);
        let (outcome, failed, events) = match (result, &step.expect_error) {
            (Ok(events), None) => ("ok".to_string(), false, events),
            (Ok(events), Some(expected)) => (
                format!("succeeded, expected error \"{}\"", expected),
                true,
                events,
            ),
            (Err(e), Some(expected)) if e.to_string().contains(expected.as_str()) => {
                (format!("reverted as expected: {}", e), false, Vec::new())
            }
            (Err(e), _) => (format!("reverted: {}", e), true, Vec::new()),
        };
        if failed {
            tracing::warn!(step = index, %outcome, "scenario step did not go as scripted");
        }
        steps.push(StepReport {
            index,
            block: clock.block,
            time: clock.now,
            op: step.tx.command.name(),
            caller: step.tx.caller,
            outcome,
            failed,
            events,
        });
    }

    let clock = engine.clock();
    let accounts = scenario
        .watch
        .iter()
        .map(|account| account_report(engine.protocol(), &deployment, account, clock.now))
        .collect::<Result<Vec<_>, _>>()?;
    let failures = steps.iter().filter(|s| s.failed).count();

    Ok(SimulationReport {
        name: scenario.name.clone(),
        final_clock: (clock.now, clock.block),
        steps,
        accounts,
        failures,
    })
}

fn account_report(
    protocol: &Protocol,
    d: &Deployment,
    account: &Address,
    now: u64,
) -> Result<AccountReport, PylonError> {
    let ledger = protocol.ledger();
    let pool = protocol.staking_pool(&d.staking)?;
    let vault = protocol.vault(&d.vault)?;
    let bond_payout = [d.lp_bond, d.asset_bond]
        .iter()
        .filter_map(|bond| protocol.bond(bond).ok())
        .filter_map(|bond| bond.position(account))
        .map(|position| position.payout)
        .sum::<Amount>();
    Ok(AccountReport {
        account: *account,
        payout_token: tokens(ledger.balance_of(&d.payout_token, account)),
        paired_token: tokens(ledger.balance_of(&d.paired_token, account)),
        lp_tokens: tokens(ledger.balance_of(&d.pair, account)),
        staked: tokens(pool.balance_of(account)),
        earned: tokens(pool.earned(account, now)?),
        vault_shares: tokens(vault.balance_of(account)),
        bond_payout: tokens(bond_payout),
    })
}
