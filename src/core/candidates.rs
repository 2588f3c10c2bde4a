use std::{cmp::Reverse, collections::BTreeSet};

use itertools::Itertools;

use crate::{api::oracle::Predictions, core::period::SettlementPeriod};

/// The day's best trading opportunities.
#[must_use]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Candidates {
    /// Periods with the lowest predicted bid prices, that is the cheapest to charge.
    pub bid: BTreeSet<SettlementPeriod>,

    /// Periods with the highest predicted offer prices, that is the most profitable to discharge.
    pub offer: BTreeSet<SettlementPeriod>,
}

impl Candidates {
    /// Select up to `n` periods per side.
    ///
    /// Equal prices are resolved in favour of the earlier period.
    pub fn select(predictions: &Predictions, n: usize) -> Self {
        let bid = predictions
            .bid_prices
            .iter()
            .sorted_by_key(|(_, price)| **price)
            .take(n)
            .map(|(period, _)| *period)
            .collect();
        let offer = predictions
            .offer_prices
            .iter()
            .sorted_by_key(|(_, price)| Reverse(**price))
            .take(n)
            .map(|(period, _)| *period)
            .collect();
        Self { bid, offer }
    }
}
