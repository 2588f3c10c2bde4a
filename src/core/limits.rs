use rust_decimal::dec;

use crate::{
    core::{
        rejection::{Direction, Rejection},
        state::BatteryState,
    },
    quantity::energy::MegawattHours,
};

/// Physical and contractual battery limits.
#[must_use]
#[derive(Copy, Clone, Debug, bon::Builder)]
pub struct Limits {
    #[builder(default = MegawattHours(dec!(10)))]
    pub capacity: MegawattHours,

    /// Maximum energy imported within one calendar day.
    #[builder(default = MegawattHours(dec!(20)))]
    pub max_charge_cycle: MegawattHours,

    /// Maximum energy exported within one calendar day.
    #[builder(default = MegawattHours(dec!(20)))]
    pub max_discharge_cycle: MegawattHours,

    /// Charge level of the very first recorded state.
    #[builder(default = MegawattHours(dec!(5)))]
    pub initial_charge_level: MegawattHours,
}

impl Default for Limits {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Limits {
    /// Check whether the battery in the `state` may import the `volume`.
    ///
    /// The cycle limit is checked first, so it is reported when both would be violated.
    pub fn check_charge(
        &self,
        state: &BatteryState,
        volume: MegawattHours,
    ) -> Result<(), Rejection> {
        let cycle_excess = state.same_day_import + volume - self.max_charge_cycle;
        if cycle_excess > MegawattHours::ZERO {
            return Err(Rejection::CycleLimitExceeded {
                direction: Direction::Charge,
                limit: self.max_charge_cycle,
                margin: cycle_excess,
            });
        }
        let capacity_excess = state.charge_level + volume - self.capacity;
        if capacity_excess > MegawattHours::ZERO {
            return Err(Rejection::CapacityExceeded {
                direction: Direction::Charge,
                limit: self.capacity,
                margin: capacity_excess,
            });
        }
        Ok(())
    }

    /// Check whether the battery in the `state` may export the `volume`.
    pub fn check_discharge(
        &self,
        state: &BatteryState,
        volume: MegawattHours,
    ) -> Result<(), Rejection> {
        let cycle_excess = state.same_day_export + volume - self.max_discharge_cycle;
        if cycle_excess > MegawattHours::ZERO {
            return Err(Rejection::CycleLimitExceeded {
                direction: Direction::Discharge,
                limit: self.max_discharge_cycle,
                margin: cycle_excess,
            });
        }
        let shortage = volume - state.charge_level;
        if shortage > MegawattHours::ZERO {
            return Err(Rejection::CapacityExceeded {
                direction: Direction::Discharge,
                limit: MegawattHours::ZERO,
                margin: shortage,
            });
        }
        Ok(())
    }
}
