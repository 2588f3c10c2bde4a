use bon::Builder;
use rust_decimal::{Decimal, dec};

use crate::{
    api::{
        CollaboratorUnavailable,
        counterparty::TradeCounterparty,
        oracle::{MarketOracle, Predictions},
    },
    core::{
        audit::{AuditEntry, AuditSink},
        candidates::Candidates,
        ledger::Ledger,
        period::{SettlementPeriod, Window},
        rejection::Outcome,
        state::BatteryState,
        submission::{BidOfferPair, Side},
    },
    db::Store,
    prelude::*,
    quantity::{energy::MegawattHours, price::MegawattHourRate},
};

/// Greedy bidding strategy parameters.
#[must_use]
#[derive(Copy, Clone, Debug, Builder)]
pub struct Strategy {
    /// Volume of every submitted bid or offer.
    #[builder(default = MegawattHours(dec!(5)))]
    pub trade_unit: MegawattHours,

    /// Number of candidate periods per side, selected once a day.
    #[builder(default = 5)]
    pub n_candidates: usize,

    /// Number of predicted periods to select the candidates from.
    #[builder(default = 48)]
    pub horizon: i32,

    /// Number of periods between the submission and the settlement period it targets.
    #[builder(default = 2)]
    pub gate_closure: i32,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Predictions and candidates of the current day.
struct Forecast {
    predictions: Predictions,
    candidates: Candidates,
}

/// Simulation context, scoped to a single run.
#[derive(Builder)]
pub struct Optimiser<'a, S> {
    ledger: &'a mut Ledger<S>,
    oracle: &'a dyn MarketOracle,
    counterparty: &'a dyn TradeCounterparty,
    audit_sink: &'a dyn AuditSink,

    #[builder(default)]
    strategy: Strategy,
}

impl<S: Store> Optimiser<'_, S> {
    /// Run the strategy over every period of the window, in order.
    ///
    /// Any collaborator failure aborts the run. Trades applied before the failure stay in the ledger.
    #[instrument(skip_all, fields(window = ?window))]
    pub async fn run(mut self, window: Window) -> Result<Report> {
        info!(n_periods = window.len(), strategy = ?self.strategy, "running…");
        let mut trail = Vec::with_capacity(window.len());
        let mut forecast: Option<Forecast> = None;

        for period in window.iter() {
            let forecast: &Forecast = if let Some(forecast) =
                forecast.as_ref().filter(|_| !period.is_start_of_day())
            {
                forecast
            } else {
                forecast.insert(self.refresh(period).await?)
            };
            let entry = self.step(period, forecast).await?;
            self.audit_sink.record(entry);
            trail.push(entry);

            // Give the audit consumer a chance to drain the channel.
            tokio::task::yield_now().await;
        }

        let summary = Summary::from(trail.as_slice());
        info!(
            n_bids = summary.n_bids,
            n_bids_accepted = summary.n_bids_accepted,
            n_offers = summary.n_offers,
            n_offers_accepted = summary.n_offers_accepted,
            revenue = %summary.revenue,
            "finished",
        );
        Ok(Report { trail, summary })
    }

    #[instrument(skip_all, fields(from = ?from))]
    async fn refresh(&self, from: SettlementPeriod) -> Result<Forecast> {
        let predictions = self
            .oracle
            .predict(from)
            .await
            .context(CollaboratorUnavailable::MarketOracle)?
            .within(from, self.strategy.horizon);
        let candidates = Candidates::select(&predictions, self.strategy.n_candidates);
        info!(bid = ?candidates.bid, offer = ?candidates.offer, "refreshed the candidates");
        Ok(Forecast { predictions, candidates })
    }

    #[instrument(skip_all, fields(period = ?period))]
    async fn step(&mut self, period: SettlementPeriod, forecast: &Forecast) -> Result<AuditEntry> {
        let state = self.ledger.roll_over(period)?;
        let target = period.offset(self.strategy.gate_closure);
        let target_state = self.ledger.roll_over(target)?;

        let bid_price = forecast.predictions.bid_prices.get(&target).copied();
        let offer_price = forecast.predictions.offer_prices.get(&target).copied();
        let pair = self.decide(period, &target_state, &forecast.candidates, bid_price, offer_price);

        let result = self
            .counterparty
            .submit(&pair)
            .await
            .context(CollaboratorUnavailable::TradeCounterparty)?;
        debug!(side = ?pair.side(), accepted = result.accepted, "submitted");
        if result.accepted {
            self.settle(&pair)?;
        }
        Ok(AuditEntry::new(&state, bid_price, offer_price, &result))
    }

    /// Pick a single trade for the target period: discharge first, then charge, otherwise nothing.
    fn decide(
        &self,
        submission_time: SettlementPeriod,
        target_state: &BatteryState,
        candidates: &Candidates,
        bid_price: Option<MegawattHourRate>,
        offer_price: Option<MegawattHourRate>,
    ) -> BidOfferPair {
        let target = target_state.period;
        let unit = self.strategy.trade_unit;
        let limits = self.ledger.limits();

        if let Some(price) = offer_price
            .filter(|_| candidates.offer.contains(&target))
            .filter(|_| limits.check_discharge(target_state, unit).is_ok())
        {
            return BidOfferPair::offer(submission_time, target, price, unit);
        }
        if let Some(price) = bid_price
            .filter(|_| candidates.bid.contains(&target))
            .filter(|_| limits.check_charge(target_state, unit).is_ok())
        {
            return BidOfferPair::bid(submission_time, target, price, unit);
        }
        BidOfferPair::no_trade(submission_time, target)
    }

    /// Apply the accepted pair to the ledger.
    fn settle(&mut self, pair: &BidOfferPair) -> Result {
        let period = pair.settlement_period_start_time;
        let outcome = match pair.side() {
            Some(Side::Offer) => self.ledger.apply_discharge(period, pair.offer_volume)?,
            Some(Side::Bid) => self.ledger.apply_charge(period, pair.bid_volume)?,
            None => return Ok(()),
        };
        if let Outcome::Rejected(rejection) = outcome {
            warn!(?period, %rejection, "the ledger refused the accepted trade");
        }
        Ok(())
    }
}

#[must_use]
pub struct Report {
    /// One entry per simulated period, in order.
    pub trail: Vec<AuditEntry>,

    pub summary: Summary,
}

/// Totals over an audit trail.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub n_bids: usize,
    pub n_bids_accepted: usize,
    pub n_offers: usize,
    pub n_offers_accepted: usize,

    /// Total volume of the accepted bids.
    pub imported: MegawattHours,

    /// Total volume of the accepted offers.
    pub exported: MegawattHours,

    /// Accepted offers minus accepted bids, at the submitted prices.
    pub revenue: Decimal,
}

impl From<&[AuditEntry]> for Summary {
    fn from(trail: &[AuditEntry]) -> Self {
        let mut summary = Self::default();
        for entry in trail {
            let pair = &entry.submitted_bid_offer_pair;
            match pair.side() {
                Some(Side::Bid) => {
                    summary.n_bids += 1;
                    if entry.bid_accepted {
                        summary.n_bids_accepted += 1;
                        summary.imported += pair.bid_volume;
                        summary.revenue -= pair.bid_volume * pair.bid_price;
                    }
                }
                Some(Side::Offer) => {
                    summary.n_offers += 1;
                    if entry.offer_accepted {
                        summary.n_offers_accepted += 1;
                        summary.exported += pair.offer_volume;
                        summary.revenue += pair.offer_volume * pair.offer_price;
                    }
                }
                None => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        api::oracle::PriceSeries,
        core::{audit::ChannelSink, limits::Limits, submission::SubmissionResult},
        db::memory::MemoryStore,
    };

    fn at(s: &str) -> SettlementPeriod {
        s.parse().unwrap()
    }

    fn prices(from: SettlementPeriod, prices: &[i64]) -> PriceSeries {
        (0..)
            .zip(prices)
            .map(|(index, price)| (from.offset(index), MegawattHourRate(Decimal::from(*price))))
            .collect()
    }

    #[derive(Default)]
    struct FakeOracle {
        predictions: Predictions,
        is_down: bool,
        calls: Mutex<Vec<SettlementPeriod>>,
    }

    #[async_trait]
    impl MarketOracle for FakeOracle {
        async fn predict(&self, from: SettlementPeriod) -> Result<Predictions> {
            self.calls.lock().unwrap().push(from);
            ensure!(!self.is_down, "connection refused");
            Ok(self.predictions.clone())
        }
    }

    enum FakeCounterparty {
        Accepting,
        Rejecting,
        Down,
    }

    #[async_trait]
    impl TradeCounterparty for FakeCounterparty {
        async fn submit(&self, pair: &BidOfferPair) -> Result<SubmissionResult> {
            match self {
                Self::Accepting => Ok(SubmissionResult { pair: *pair, accepted: true }),
                Self::Rejecting => Ok(SubmissionResult { pair: *pair, accepted: false }),
                Self::Down => bail!("timed out"),
            }
        }
    }

    async fn run(
        ledger: &mut Ledger<MemoryStore>,
        oracle: &FakeOracle,
        counterparty: &FakeCounterparty,
        strategy: Strategy,
        window: Window,
    ) -> Result<Report> {
        let (sink, _receiver) = ChannelSink::new(64);
        Optimiser::builder()
            .ledger(ledger)
            .oracle(oracle)
            .counterparty(counterparty)
            .audit_sink(&sink)
            .strategy(strategy)
            .build()
            .run(window)
            .await
    }

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::new(MemoryStore::default(), Limits::default())
    }

    #[tokio::test]
    async fn refreshes_once_a_day() -> Result {
        let mut ledger = ledger();
        let oracle = FakeOracle::default();
        let window = Window::new(at("2024-01-01T23:00:00"), at("2024-01-02T01:00:00"));

        let report =
            run(&mut ledger, &oracle, &FakeCounterparty::Accepting, Strategy::default(), window)
                .await?;

        assert_eq!(report.trail.len(), 5);
        assert_eq!(
            *oracle.calls.lock().unwrap(),
            [at("2024-01-01T23:00:00"), at("2024-01-02T00:00:00")]
        );
        assert!(report.trail.iter().all(|entry| entry.submitted_bid_offer_pair.side().is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_submission_leaves_ledger_untouched() -> Result {
        let mut ledger = ledger();
        let oracle = FakeOracle {
            predictions: Predictions {
                bid_prices: PriceSeries::new(),
                offer_prices: prices(at("2024-01-01T00:00:00"), &[10, 10, 100]),
            },
            ..FakeOracle::default()
        };
        let window = Window::new(at("2024-01-01T00:00:00"), at("2024-01-01T00:00:00"));

        let report =
            run(&mut ledger, &oracle, &FakeCounterparty::Rejecting, Strategy::default(), window)
                .await?;

        let entry = &report.trail[0];
        assert_eq!(entry.submitted_bid_offer_pair.side(), Some(Side::Offer));
        assert_eq!(entry.offer_price_prediction, Some(MegawattHourRate(dec!(100))));
        assert!(!entry.bid_accepted);
        assert!(!entry.offer_accepted);

        let target = ledger.store().get(at("2024-01-01T01:00:00"))?.unwrap();
        assert_eq!(target, BatteryState::seed(at("2024-01-01T01:00:00"), MegawattHours(dec!(5))));
        assert_eq!(ledger.store().get(at("2024-01-01T01:30:00"))?, None);
        Ok(())
    }

    #[tokio::test]
    async fn discharge_takes_priority_over_charge() -> Result {
        let mut ledger = ledger();
        let from = at("2024-01-01T00:00:00");
        let oracle = FakeOracle {
            predictions: Predictions {
                bid_prices: prices(from, &[50, 50, 10]),
                offer_prices: prices(from, &[20, 20, 100]),
            },
            ..FakeOracle::default()
        };
        let strategy = Strategy::builder().n_candidates(1).build();

        let report = run(
            &mut ledger,
            &oracle,
            &FakeCounterparty::Accepting,
            strategy,
            Window::new(from, from),
        )
        .await?;

        let entry = &report.trail[0];
        assert!(entry.offer_accepted);
        assert_eq!(entry.battery_state_of_charge, MegawattHours(dec!(5)));
        let successor = ledger.store().get(at("2024-01-01T01:30:00"))?.unwrap();
        assert_eq!(successor.charge_level, MegawattHours::ZERO);
        assert_eq!(successor.cumulative_export, MegawattHours(dec!(5)));
        Ok(())
    }

    #[tokio::test]
    async fn charges_when_discharge_is_not_possible() -> Result {
        let limits = Limits::builder().initial_charge_level(MegawattHours::ZERO).build();
        let mut ledger = Ledger::new(MemoryStore::default(), limits);
        let from = at("2024-01-01T00:00:00");
        let oracle = FakeOracle {
            predictions: Predictions {
                bid_prices: prices(from, &[50, 50, 10]),
                offer_prices: prices(from, &[20, 20, 100]),
            },
            ..FakeOracle::default()
        };
        let strategy = Strategy::builder().n_candidates(1).build();

        let report = run(
            &mut ledger,
            &oracle,
            &FakeCounterparty::Accepting,
            strategy,
            Window::new(from, from),
        )
        .await?;

        let entry = &report.trail[0];
        assert_eq!(entry.submitted_bid_offer_pair.side(), Some(Side::Bid));
        assert_eq!(entry.submitted_bid_offer_pair.bid_price, MegawattHourRate(dec!(10)));
        assert_eq!(entry.submitted_bid_offer_pair.offer_price, MegawattHourRate::OFFER_SENTINEL);
        assert!(entry.bid_accepted);
        let successor = ledger.store().get(at("2024-01-01T01:30:00"))?.unwrap();
        assert_eq!(successor.charge_level, MegawattHours(dec!(5)));
        assert_eq!(successor.same_day_import, MegawattHours(dec!(5)));
        Ok(())
    }

    #[tokio::test]
    async fn cycle_limits_skip_candidates() -> Result {
        let from = at("2024-01-01T00:00:00");
        let oracle = FakeOracle {
            predictions: Predictions {
                bid_prices: prices(from, &[50, 50, 10]),
                offer_prices: prices(from, &[20, 20, 100]),
            },
            ..FakeOracle::default()
        };
        let strategy = Strategy::builder().n_candidates(1).build();
        let tight = MegawattHours(dec!(4));

        // The offer breaks the discharge cycle, so the bid goes instead:
        let limits = Limits::builder().max_discharge_cycle(tight).build();
        let mut ledger = Ledger::new(MemoryStore::default(), limits);
        let report = run(
            &mut ledger,
            &oracle,
            &FakeCounterparty::Accepting,
            strategy,
            Window::new(from, from),
        )
        .await?;
        assert_eq!(report.trail[0].submitted_bid_offer_pair.side(), Some(Side::Bid));
        let successor = ledger.store().get(at("2024-01-01T01:30:00"))?.unwrap();
        assert_eq!(successor.charge_level, MegawattHours(dec!(10)));
        assert_eq!(successor.same_day_export, MegawattHours::ZERO);

        // Both sides break their cycles:
        let limits = Limits::builder().max_discharge_cycle(tight).max_charge_cycle(tight).build();
        let mut ledger = Ledger::new(MemoryStore::default(), limits);
        let report = run(
            &mut ledger,
            &oracle,
            &FakeCounterparty::Accepting,
            strategy,
            Window::new(from, from),
        )
        .await?;
        assert_eq!(report.trail[0].submitted_bid_offer_pair.side(), None);
        assert_eq!(ledger.store().get(at("2024-01-01T01:30:00"))?, None);
        Ok(())
    }

    #[tokio::test]
    async fn trades_only_at_candidates() -> Result {
        let mut ledger = ledger();
        let from = at("2024-01-01T00:00:00");
        let oracle = FakeOracle {
            predictions: Predictions {
                bid_prices: prices(from, &[50, 50, 50, 50, 10, 50]),
                offer_prices: prices(from, &[20, 20, 100, 20, 20, 20]),
            },
            ..FakeOracle::default()
        };
        let strategy = Strategy::builder().n_candidates(1).build();

        let report = run(
            &mut ledger,
            &oracle,
            &FakeCounterparty::Accepting,
            strategy,
            Window::new(from, at("2024-01-01T01:00:00")),
        )
        .await?;

        let sides = report
            .trail
            .iter()
            .map(|entry| entry.submitted_bid_offer_pair.side())
            .collect::<Vec<_>>();
        assert_eq!(sides, [Some(Side::Offer), None, Some(Side::Bid)]);
        assert_eq!(
            report.summary,
            Summary {
                n_bids: 1,
                n_bids_accepted: 1,
                n_offers: 1,
                n_offers_accepted: 1,
                imported: MegawattHours(dec!(5)),
                exported: MegawattHours(dec!(5)),
                revenue: dec!(450),
            }
        );
        assert_eq!(
            ledger.store().get(at("2024-01-01T02:30:00"))?.unwrap().charge_level,
            MegawattHours(dec!(5))
        );
        Ok(())
    }

    #[tokio::test]
    async fn oracle_failure_aborts() {
        let mut ledger = ledger();
        let oracle = FakeOracle { is_down: true, ..FakeOracle::default() };
        let window = Window::new(at("2024-01-01T00:00:00"), at("2024-01-01T02:00:00"));

        let error =
            run(&mut ledger, &oracle, &FakeCounterparty::Accepting, Strategy::default(), window)
                .await
                .err()
                .unwrap();

        assert_eq!(
            error.downcast_ref::<CollaboratorUnavailable>(),
            Some(&CollaboratorUnavailable::MarketOracle)
        );
        assert_eq!(oracle.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn counterparty_failure_aborts() {
        let mut ledger = ledger();
        let oracle = FakeOracle::default();
        let window = Window::new(at("2024-01-01T00:00:00"), at("2024-01-01T02:00:00"));

        let error = run(&mut ledger, &oracle, &FakeCounterparty::Down, Strategy::default(), window)
            .await
            .err()
            .unwrap();

        assert_eq!(
            error.downcast_ref::<CollaboratorUnavailable>(),
            Some(&CollaboratorUnavailable::TradeCounterparty)
        );
    }

    #[tokio::test]
    async fn audit_entries_are_recorded() -> Result {
        let mut ledger = ledger();
        let oracle = FakeOracle::default();
        let (sink, mut receiver) = ChannelSink::new(16);
        let window = Window::new(at("2024-01-01T00:00:00"), at("2024-01-01T01:00:00"));

        let report = Optimiser::builder()
            .ledger(&mut ledger)
            .oracle(&oracle)
            .counterparty(&FakeCounterparty::Rejecting)
            .audit_sink(&sink)
            .build()
            .run(window)
            .await?;

        for expected in &report.trail {
            assert_eq!(receiver.try_recv()?, *expected);
        }
        assert!(receiver.try_recv().is_err());
        Ok(())
    }
}
