use async_trait::async_trait;

use crate::{
    core::submission::{BidOfferPair, SubmissionResult},
    prelude::*,
};

#[async_trait]
pub trait TradeCounterparty: Sync {
    /// Submit the pair and wait for the acceptance decision.
    async fn submit(&self, pair: &BidOfferPair) -> Result<SubmissionResult>;
}
