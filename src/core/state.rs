use serde::{Deserialize, Serialize};

use crate::{core::period::SettlementPeriod, quantity::energy::MegawattHours};

/// Battery energy snapshot at the start of a settlement period.
///
/// Snapshots are immutable once written: transitions produce a new snapshot for another period.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    #[serde(rename = "settlementPeriodStartTime")]
    pub period: SettlementPeriod,

    #[serde(rename = "chargeLevelAtPeriodStart")]
    pub charge_level: MegawattHours,

    #[serde(rename = "sameDayImportTotal")]
    pub same_day_import: MegawattHours,

    #[serde(rename = "sameDayExportTotal")]
    pub same_day_export: MegawattHours,

    #[serde(rename = "cumulativeImportTotal")]
    pub cumulative_import: MegawattHours,

    #[serde(rename = "cumulativeExportTotal")]
    pub cumulative_export: MegawattHours,
}

impl BatteryState {
    /// Very first state of a battery: no energy has flowed yet.
    #[must_use]
    pub const fn seed(period: SettlementPeriod, charge_level: MegawattHours) -> Self {
        Self {
            period,
            charge_level,
            same_day_import: MegawattHours::ZERO,
            same_day_export: MegawattHours::ZERO,
            cumulative_import: MegawattHours::ZERO,
            cumulative_export: MegawattHours::ZERO,
        }
    }

    /// The same state carried forward to a later period of the same day.
    #[must_use]
    pub const fn rekeyed(mut self, period: SettlementPeriod) -> Self {
        self.period = period;
        self
    }

    /// The state carried over into a new calendar day: the same-day totals start from zero.
    #[must_use]
    pub const fn carried_over(mut self, period: SettlementPeriod) -> Self {
        self.period = period;
        self.same_day_import = MegawattHours::ZERO;
        self.same_day_export = MegawattHours::ZERO;
        self
    }

    /// Successor state after importing the `volume` during this period.
    #[must_use]
    pub fn charged(self, volume: MegawattHours) -> Self {
        let period = self.period.next();
        Self {
            period,
            charge_level: self.charge_level + volume,
            same_day_import: if period.day() == self.period.day() {
                self.same_day_import + volume
            } else {
                volume
            },
            cumulative_import: self.cumulative_import + volume,
            ..self
        }
    }

    /// Successor state after exporting the `volume` during this period.
    #[must_use]
    pub fn discharged(self, volume: MegawattHours) -> Self {
        let period = self.period.next();
        Self {
            period,
            charge_level: self.charge_level - volume,
            same_day_export: if period.day() == self.period.day() {
                self.same_day_export + volume
            } else {
                volume
            },
            cumulative_export: self.cumulative_export + volume,
            ..self
        }
    }
}
