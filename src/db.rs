//! Ledger persistence.

use chrono::NaiveDate;

use crate::{
    core::{period::SettlementPeriod, state::BatteryState},
    prelude::*,
};

pub mod file;
pub mod memory;

/// Ordered, time-indexed storage of battery snapshots, one per settlement period.
pub trait Store {
    fn get(&self, period: SettlementPeriod) -> Result<Option<BatteryState>>;

    /// Insert or replace the snapshot under its own period.
    fn put(&mut self, state: BatteryState) -> Result;

    /// The most recent snapshot strictly before the `period`, on any day.
    fn last_before(&self, period: SettlementPeriod) -> Result<Option<BatteryState>>;

    /// Remove all snapshots.
    fn clear(&mut self) -> Result;

    /// The most recent snapshot strictly before the `period` within the specified calendar day.
    fn latest_before(
        &self,
        day: NaiveDate,
        period: SettlementPeriod,
    ) -> Result<Option<BatteryState>> {
        Ok(self.last_before(period)?.filter(|state| state.period.day() == day))
    }
}
