use std::fmt::{Display, Formatter};

use crate::{core::state::BatteryState, quantity::energy::MegawattHours};

#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum Direction {
    #[display("charge")]
    Charge,

    #[display("discharge")]
    Discharge,
}

/// Business-rule refusal of a charge or discharge request.
///
/// Rejections are expected outcomes and never abort a simulation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Error)]
pub enum Rejection {
    /// The same-day import or export total would go over the daily cycle limit.
    CycleLimitExceeded { direction: Direction, limit: MegawattHours, margin: MegawattHours },

    /// The charge level would leave the `[0, capacity]` range.
    CapacityExceeded { direction: Direction, limit: MegawattHours, margin: MegawattHours },
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleLimitExceeded { direction, limit, margin } => {
                write!(f, "daily {direction} cycle limit of {limit} would be exceeded by {margin}")
            }
            Self::CapacityExceeded { direction: Direction::Charge, limit, margin } => {
                write!(f, "capacity of {limit} would be exceeded by {margin}")
            }
            Self::CapacityExceeded { direction: Direction::Discharge, limit, margin } => {
                write!(f, "charge level would drop below {limit} by {margin}")
            }
        }
    }
}

/// Result of a charge or discharge request that did not fail fatally.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The successor state has been written to the ledger.
    Applied(BatteryState),

    /// Nothing has been written.
    Rejected(Rejection),
}
