//! Battery-related CLI arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::{
    core::{ledger::Ledger, limits::Limits},
    db::file::FileStore,
    prelude::*,
    quantity::energy::MegawattHours,
};

#[derive(Parser)]
pub struct BatteryArgs {
    /// Ledger file, created on the first write.
    #[clap(long = "ledger-path", env = "LEDGER_PATH", default_value = "ledger.toml")]
    pub ledger_path: PathBuf,

    #[clap(flatten)]
    pub limits: LimitsArgs,
}

impl BatteryArgs {
    pub fn open_ledger(&self) -> Result<Ledger<FileStore>> {
        Ok(Ledger::new(FileStore::open(&self.ledger_path)?, self.limits.into()))
    }
}

#[must_use]
#[derive(Copy, Clone, Parser)]
pub struct LimitsArgs {
    /// Battery capacity in megawatt-hours.
    #[clap(long = "capacity-mwh", default_value = "10", env = "BATTERY_CAPACITY_MWH")]
    pub capacity: MegawattHours,

    /// Maximum energy imported within a calendar day, in megawatt-hours.
    #[clap(long = "max-charge-cycle-mwh", default_value = "20", env = "MAX_CHARGE_CYCLE_MWH")]
    pub max_charge_cycle: MegawattHours,

    /// Maximum energy exported within a calendar day, in megawatt-hours.
    #[clap(
        long = "max-discharge-cycle-mwh",
        default_value = "20",
        env = "MAX_DISCHARGE_CYCLE_MWH"
    )]
    pub max_discharge_cycle: MegawattHours,

    /// Charge level of an empty ledger, in megawatt-hours.
    #[clap(
        long = "initial-charge-level-mwh",
        default_value = "5",
        env = "INITIAL_CHARGE_LEVEL_MWH"
    )]
    pub initial_charge_level: MegawattHours,
}

impl From<LimitsArgs> for Limits {
    fn from(args: LimitsArgs) -> Self {
        Self::builder()
            .capacity(args.capacity)
            .max_charge_cycle(args.max_charge_cycle)
            .max_discharge_cycle(args.max_discharge_cycle)
            .initial_charge_level(args.initial_charge_level)
            .build()
    }
}
