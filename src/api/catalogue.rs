//! Price predictions pre-computed into a pair of JSON files.
//!
//! Each file maps the prediction request time onto the predicted prices of the following periods.

use std::{collections::BTreeMap, fmt::Debug, fs, path::Path};

use async_trait::async_trait;

use crate::{
    api::oracle::{MarketOracle, Predictions, PriceSeries},
    core::period::SettlementPeriod,
    prelude::*,
};

type PriceTable = BTreeMap<SettlementPeriod, PriceSeries>;

#[must_use]
pub struct Catalogue {
    bid_prices: PriceTable,
    offer_prices: PriceTable,
}

impl Catalogue {
    #[instrument(skip_all, fields(bid_prices = ?bid_prices, offer_prices = ?offer_prices))]
    pub fn read_from<P: AsRef<Path> + Debug>(bid_prices: P, offer_prices: P) -> Result<Self> {
        let this =
            Self { bid_prices: read_table(bid_prices)?, offer_prices: read_table(offer_prices)? };
        info!(
            n_bid_requests = this.bid_prices.len(),
            n_offer_requests = this.offer_prices.len(),
            "loaded the predictions",
        );
        Ok(this)
    }
}

fn read_table<P: AsRef<Path>>(path: P) -> Result<PriceTable> {
    let path = path.as_ref();
    serde_json::from_slice(&fs::read(path)?)
        .with_context(|| format!("failed to parse the predictions `{}`", path.display()))
}

impl From<(PriceTable, PriceTable)> for Catalogue {
    fn from((bid_prices, offer_prices): (PriceTable, PriceTable)) -> Self {
        Self { bid_prices, offer_prices }
    }
}

#[async_trait]
impl MarketOracle for Catalogue {
    async fn predict(&self, from: SettlementPeriod) -> Result<Predictions> {
        let bid_prices = self
            .bid_prices
            .get(&from)
            .with_context(|| format!("no bid price predictions requested at {from:?}"))?;
        let offer_prices = self
            .offer_prices
            .get(&from)
            .with_context(|| format!("no offer price predictions requested at {from:?}"))?;
        Ok(Predictions { bid_prices: bid_prices.clone(), offer_prices: offer_prices.clone() })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::quantity::price::MegawattHourRate;

    #[tokio::test]
    async fn predict_ok() -> Result {
        let from: SettlementPeriod = "2024-01-01T00:00:00".parse()?;
        let series: PriceSeries = [(from, MegawattHourRate(dec!(42)))].into();
        let catalogue =
            Catalogue::from(([(from, series.clone())].into(), [(from, series.clone())].into()));
        let predictions = catalogue.predict(from).await?;
        assert_eq!(predictions.bid_prices, series);
        assert_eq!(predictions.offer_prices, series);
        Ok(())
    }

    #[tokio::test]
    async fn predict_missing_request_time() -> Result {
        let catalogue = Catalogue::from((PriceTable::new(), PriceTable::new()));
        assert!(catalogue.predict("2024-01-01T00:00:00".parse()?).await.is_err());
        Ok(())
    }
}
