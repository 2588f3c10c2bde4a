use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{core::period::SettlementPeriod, prelude::*, quantity::price::MegawattHourRate};

pub type PriceSeries = BTreeMap<SettlementPeriod, MegawattHourRate>;

/// Predicted market prices, keyed by settlement period.
#[must_use]
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub bid_prices: PriceSeries,
    pub offer_prices: PriceSeries,
}

impl Predictions {
    /// Keep only the `n_periods` periods starting with `from`.
    pub fn within(mut self, from: SettlementPeriod, n_periods: i32) -> Self {
        let until = from.offset(n_periods);
        for prices in [&mut self.bid_prices, &mut self.offer_prices] {
            prices.retain(|period, _| (from..until).contains(period));
        }
        self
    }
}

#[async_trait]
pub trait MarketOracle: Sync {
    /// Predict bid and offer prices for the periods following `from`.
    async fn predict(&self, from: SettlementPeriod) -> Result<Predictions>;
}
