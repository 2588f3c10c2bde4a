use serde::{Deserialize, Serialize};

use crate::{
    core::period::SettlementPeriod,
    quantity::{energy::MegawattHours, price::MegawattHourRate},
};

/// Active side of a bid-offer pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum Side {
    /// Buying energy, that is charging the battery.
    #[display("bid")]
    Bid,

    /// Selling energy, that is discharging the battery.
    #[display("offer")]
    Offer,
}

/// Bid-offer pair submitted to the market for a single settlement period.
///
/// An inactive side carries a sentinel price with zero volume.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidOfferPair {
    pub submission_time: SettlementPeriod,

    /// The period the trade takes effect for.
    pub settlement_period_start_time: SettlementPeriod,

    pub offer_price: MegawattHourRate,
    pub offer_volume: MegawattHours,
    pub bid_price: MegawattHourRate,
    pub bid_volume: MegawattHours,
}

impl BidOfferPair {
    /// Pair with both sides inactive.
    pub const fn no_trade(submission_time: SettlementPeriod, settlement: SettlementPeriod) -> Self {
        Self {
            submission_time,
            settlement_period_start_time: settlement,
            offer_price: MegawattHourRate::OFFER_SENTINEL,
            offer_volume: MegawattHours::ZERO,
            bid_price: MegawattHourRate::BID_SENTINEL,
            bid_volume: MegawattHours::ZERO,
        }
    }

    /// Offer-only pair.
    pub const fn offer(
        submission_time: SettlementPeriod,
        settlement: SettlementPeriod,
        price: MegawattHourRate,
        volume: MegawattHours,
    ) -> Self {
        Self {
            offer_price: price,
            offer_volume: volume,
            ..Self::no_trade(submission_time, settlement)
        }
    }

    /// Bid-only pair.
    pub const fn bid(
        submission_time: SettlementPeriod,
        settlement: SettlementPeriod,
        price: MegawattHourRate,
        volume: MegawattHours,
    ) -> Self {
        Self { bid_price: price, bid_volume: volume, ..Self::no_trade(submission_time, settlement) }
    }

    /// The active side, if any. The offer side wins if both are somehow active.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        if self.offer_volume > MegawattHours::ZERO {
            Some(Side::Offer)
        } else if self.bid_volume > MegawattHours::ZERO {
            Some(Side::Bid)
        } else {
            None
        }
    }
}

/// Counterparty's answer to a submitted pair.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    #[serde(flatten)]
    pub pair: BidOfferPair,

    pub accepted: bool,
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    fn at(s: &str) -> SettlementPeriod {
        s.parse().unwrap()
    }

    #[test]
    fn side_ok() {
        let (submission, settlement) = (at("2024-01-01T10:00:00"), at("2024-01-01T11:00:00"));
        let price = MegawattHourRate(dec!(42));
        let volume = MegawattHours(dec!(5));
        assert_eq!(BidOfferPair::no_trade(submission, settlement).side(), None);
        assert_eq!(BidOfferPair::bid(submission, settlement, price, volume).side(), Some(Side::Bid));
        assert_eq!(
            BidOfferPair::offer(submission, settlement, price, volume).side(),
            Some(Side::Offer)
        );
    }

    #[test]
    fn offer_keeps_bid_sentinel() {
        let pair = BidOfferPair::offer(
            at("2024-01-01T10:00:00"),
            at("2024-01-01T11:00:00"),
            MegawattHourRate(dec!(80.5)),
            MegawattHours(dec!(5)),
        );
        assert_eq!(pair.bid_price, MegawattHourRate(dec!(-9999)));
        assert_eq!(pair.bid_volume, MegawattHours::ZERO);
    }

    #[test]
    fn deserialize_result_ok() -> Result<(), serde_json::Error> {
        let result: SubmissionResult = serde_json::from_str(
            r#"{
                "submissionTime": "2024-01-01T10:00:00",
                "settlementPeriodStartTime": "2024-01-01T11:00:00",
                "offerPrice": 9999,
                "offerVolume": 0,
                "bidPrice": "31.20",
                "bidVolume": "5",
                "accepted": true
            }"#,
        )?;
        assert!(result.accepted);
        assert_eq!(result.pair.side(), Some(Side::Bid));
        assert_eq!(result.pair.bid_price, MegawattHourRate(dec!(31.2)));
        Ok(())
    }
}
