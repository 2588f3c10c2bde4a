use clap::{Parser, Subcommand};

use crate::{
    cli::battery::BatteryArgs,
    core::{period::SettlementPeriod, rejection::Outcome},
    prelude::*,
    quantity::energy::MegawattHours,
    tables::build_state_table,
};

#[derive(Parser)]
pub struct LedgerArgs {
    #[clap(flatten)]
    battery: BatteryArgs,

    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand)]
enum LedgerCommand {
    /// Show the battery state at the start of the period, deriving it when needed.
    State(StateArgs),

    /// Import energy during the period.
    Charge(TransitionArgs),

    /// Export energy during the period.
    Discharge(TransitionArgs),

    /// Wipe the entire ledger.
    Reset,
}

#[derive(Parser)]
struct StateArgs {
    /// Settlement period start, for example `2024-01-01T13:30:00`.
    #[clap(long)]
    period: SettlementPeriod,

    /// Carry the last known state over midnight if the day has no state yet.
    #[clap(long)]
    roll_over: bool,
}

#[derive(Parser)]
struct TransitionArgs {
    /// Settlement period start, for example `2024-01-01T13:30:00`.
    #[clap(long)]
    period: SettlementPeriod,

    /// Energy volume in megawatt-hours.
    #[clap(long = "volume-mwh")]
    volume: MegawattHours,
}

impl LedgerArgs {
    pub fn run(self) -> Result {
        let mut ledger = self.battery.open_ledger()?;
        match self.command {
            LedgerCommand::State(args) => {
                let state = if args.roll_over {
                    ledger.roll_over(args.period)?
                } else {
                    ledger.get_state(args.period)?
                };
                println!("{}", build_state_table(&state));
            }
            LedgerCommand::Charge(args) => {
                print_outcome(ledger.apply_charge(args.period, args.volume)?);
            }
            LedgerCommand::Discharge(args) => {
                print_outcome(ledger.apply_discharge(args.period, args.volume)?);
            }
            LedgerCommand::Reset => {
                ledger.reset()?;
            }
        }
        Ok(())
    }
}

fn print_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Applied(successor) => println!("{}", build_state_table(&successor)),
        Outcome::Rejected(rejection) => println!("rejected: {rejection}"),
    }
}
