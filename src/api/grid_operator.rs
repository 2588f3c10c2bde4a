use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::{
    api::{client, counterparty::TradeCounterparty},
    core::submission::{BidOfferPair, SubmissionResult},
    prelude::*,
};

/// Grid operator accepting bid-offer submissions over HTTP.
pub struct Api {
    client: Client,
    submissions_url: Url,
}

impl Api {
    pub fn try_new(base_url: Url) -> Result<Self> {
        let submissions_url = client::endpoint(&base_url, "submissions")?;
        Ok(Self { client: client::try_new()?, submissions_url })
    }
}

#[async_trait]
impl TradeCounterparty for Api {
    #[instrument(skip_all, fields(period = ?pair.settlement_period_start_time))]
    async fn submit(&self, pair: &BidOfferPair) -> Result<SubmissionResult> {
        let result: SubmissionResult = self
            .client
            .post(self.submissions_url.clone())
            .json(pair)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("failed to deserialize the submission result")?;
        debug!(accepted = result.accepted, "submitted");
        Ok(result)
    }
}
