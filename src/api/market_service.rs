use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    api::{
        client,
        oracle::{MarketOracle, Predictions},
    },
    core::period::SettlementPeriod,
    prelude::*,
};

/// Market prediction service over HTTP.
pub struct Api {
    client: Client,
    predictions_url: Url,
}

impl Api {
    pub fn try_new(base_url: Url) -> Result<Self> {
        let predictions_url = client::endpoint(&base_url, "predictions")?;
        Ok(Self { client: client::try_new()?, predictions_url })
    }
}

#[async_trait]
impl MarketOracle for Api {
    #[instrument(skip_all, fields(from = ?from))]
    async fn predict(&self, from: SettlementPeriod) -> Result<Predictions> {
        debug!(url = %self.predictions_url, "fetching the predictions…");
        let predictions: Predictions = self
            .client
            .get(self.predictions_url.clone())
            .query(&[("timeOfPredictionRequest", from.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("failed to deserialize the predictions")?;
        debug!(
            n_bid_prices = predictions.bid_prices.len(),
            n_offer_prices = predictions.offer_prices.len(),
            "fetched",
        );
        Ok(predictions)
    }
}
