use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    api::counterparty::TradeCounterparty,
    core::submission::{BidOfferPair, SubmissionResult},
    prelude::*,
};

/// In-process counterparty accepting each submission with a fixed probability.
pub struct RandomCounterparty {
    acceptance_rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomCounterparty {
    /// Build the counterparty, seeding the generator from the OS if no `seed` is given.
    pub fn new(acceptance_rate: f64, seed: Option<u64>) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&acceptance_rate),
            "acceptance rate must be within [0, 1], got {acceptance_rate}"
        );
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self { acceptance_rate, rng: Mutex::new(rng) })
    }
}

#[async_trait]
impl TradeCounterparty for RandomCounterparty {
    async fn submit(&self, pair: &BidOfferPair) -> Result<SubmissionResult> {
        let accepted = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_bool(self.acceptance_rate);
        trace!(period = ?pair.settlement_period_start_time, accepted, "decided");
        Ok(SubmissionResult { pair: *pair, accepted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::period::SettlementPeriod;

    fn pair() -> BidOfferPair {
        let period: SettlementPeriod = "2024-01-01T00:00:00".parse().unwrap();
        BidOfferPair::no_trade(period, period.offset(2))
    }

    #[tokio::test]
    async fn always_accepts() -> Result {
        let counterparty = RandomCounterparty::new(1.0, Some(42))?;
        for _ in 0..10 {
            assert!(counterparty.submit(&pair()).await?.accepted);
        }
        Ok(())
    }

    #[tokio::test]
    async fn never_accepts() -> Result {
        let counterparty = RandomCounterparty::new(0.0, None)?;
        let result = counterparty.submit(&pair()).await?;
        assert!(!result.accepted);
        assert_eq!(result.pair, pair());
        Ok(())
    }

    #[tokio::test]
    async fn seeded_is_reproducible() -> Result {
        let lhs = RandomCounterparty::new(0.5, Some(7))?;
        let rhs = RandomCounterparty::new(0.5, Some(7))?;
        for _ in 0..20 {
            assert_eq!(lhs.submit(&pair()).await?.accepted, rhs.submit(&pair()).await?.accepted);
        }
        Ok(())
    }

    #[test]
    fn invalid_rate() {
        assert!(RandomCounterparty::new(1.5, None).is_err());
        assert!(RandomCounterparty::new(f64::NAN, None).is_err());
    }
}
