mod battery;
mod ledger;
mod simulate;

use clap::{Parser, Subcommand};

pub use self::{ledger::LedgerArgs, simulate::SimulateArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: run the bidding strategy over a window of settlement periods.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Inspect or modify the battery ledger directly.
    #[clap(name = "ledger")]
    Ledger(Box<LedgerArgs>),
}
