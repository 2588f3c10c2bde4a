use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use chrono::TimeDelta;
use clap::Parser;
use reqwest::Url;

use crate::{
    api::{
        catalogue::Catalogue,
        counterparty::TradeCounterparty,
        grid_operator,
        market_service,
        oracle::MarketOracle,
        random::RandomCounterparty,
    },
    cli::battery::BatteryArgs,
    core::{
        audit::{self, ChannelSink},
        optimiser::{Optimiser, Strategy},
        period::{SettlementPeriod, Window},
    },
    prelude::*,
    quantity::energy::MegawattHours,
    tables::build_audit_table,
};

#[derive(Parser)]
pub struct SimulateArgs {
    /// First settlement period to simulate, for example `2024-01-01T00:00:00`.
    #[clap(long, env = "FIRST_SETTLEMENT_PERIOD")]
    first: SettlementPeriod,

    /// Last settlement period to simulate, inclusive.
    #[clap(long, env = "LAST_SETTLEMENT_PERIOD")]
    last: SettlementPeriod,

    /// Write the audit trail as JSON lines to the file instead of the standard output.
    #[clap(long, env = "AUDIT_LOG")]
    audit_log: Option<PathBuf>,

    /// Maximum number of audit entries waiting to be written, newer entries are dropped beyond that.
    #[clap(long, env = "AUDIT_CAPACITY", default_value = "1024")]
    audit_capacity: usize,

    #[clap(flatten)]
    oracle: OracleArgs,

    #[clap(flatten)]
    counterparty: CounterpartyArgs,

    #[clap(flatten)]
    battery: BatteryArgs,

    #[clap(flatten)]
    strategy: StrategyArgs,
}

#[derive(Parser)]
struct OracleArgs {
    /// Market prediction service base URL, for example `http://localhost:5002`.
    #[clap(
        long,
        env = "MARKET_SERVICE_URL",
        conflicts_with_all = ["bid_predictions", "offer_predictions"]
    )]
    market_service_url: Option<Url>,

    /// JSON file with the bid price predictions, keyed by the prediction request time.
    #[clap(long, env = "BID_PREDICTIONS", requires = "offer_predictions")]
    bid_predictions: Option<PathBuf>,

    /// JSON file with the offer price predictions, keyed by the prediction request time.
    #[clap(long, env = "OFFER_PREDICTIONS", requires = "bid_predictions")]
    offer_predictions: Option<PathBuf>,
}

impl OracleArgs {
    fn build(self) -> Result<Box<dyn MarketOracle>> {
        match (self.market_service_url, self.bid_predictions, self.offer_predictions) {
            (Some(base_url), None, None) => Ok(Box::new(market_service::Api::try_new(base_url)?)),
            (None, Some(bid_predictions), Some(offer_predictions)) => {
                Ok(Box::new(Catalogue::read_from(bid_predictions, offer_predictions)?))
            }
            _ => bail!(
                "specify either `--market-service-url`, \
                 or both `--bid-predictions` and `--offer-predictions`"
            ),
        }
    }
}

#[derive(Parser)]
struct CounterpartyArgs {
    /// Grid operator base URL, for example `http://localhost:5001`.
    ///
    /// Without it, submissions are accepted at random.
    #[clap(long, env = "GRID_OPERATOR_URL")]
    grid_operator_url: Option<Url>,

    /// Probability of accepting a submission when there is no grid operator.
    #[clap(long, env = "ACCEPTANCE_RATE", default_value = "0.8")]
    acceptance_rate: f64,

    /// Random seed for reproducible acceptance decisions.
    #[clap(long, env = "ACCEPTANCE_SEED")]
    seed: Option<u64>,
}

impl CounterpartyArgs {
    fn build(self) -> Result<Box<dyn TradeCounterparty>> {
        if let Some(base_url) = self.grid_operator_url {
            Ok(Box::new(grid_operator::Api::try_new(base_url)?))
        } else {
            Ok(Box::new(RandomCounterparty::new(self.acceptance_rate, self.seed)?))
        }
    }
}

#[derive(Parser)]
struct StrategyArgs {
    /// Volume of every bid or offer, in megawatt-hours.
    #[clap(long = "trade-unit-mwh", env = "TRADE_UNIT_MWH", default_value = "5")]
    trade_unit: MegawattHours,

    /// Number of candidate periods per side, selected once a day.
    #[clap(long = "n-candidates", env = "N_CANDIDATES", default_value = "5")]
    n_candidates: usize,

    /// Number of predicted periods to choose the candidates from.
    #[clap(long = "horizon", env = "PREDICTION_HORIZON", default_value = "48")]
    horizon: i32,

    /// Lead time between a submission and the settlement period it targets.
    #[clap(long = "gate-closure", env = "GATE_CLOSURE", default_value = "1h")]
    gate_closure: humantime::Duration,
}

impl TryFrom<StrategyArgs> for Strategy {
    type Error = Error;

    fn try_from(args: StrategyArgs) -> Result<Self> {
        ensure!(args.horizon > 0, "the prediction horizon must be positive, got {}", args.horizon);
        let gate_closure = TimeDelta::from_std(args.gate_closure.into())?;
        Ok(Self::builder()
            .trade_unit(args.trade_unit)
            .n_candidates(args.n_candidates)
            .horizon(args.horizon)
            .gate_closure(SettlementPeriod::n_periods_in(gate_closure)?)
            .build())
    }
}

impl SimulateArgs {
    #[instrument(skip_all, fields(first = ?self.first, last = ?self.last))]
    pub async fn run(self) -> Result {
        let window = Window::new(self.first, self.last);
        ensure!(!window.is_empty(), "the last period must not precede the first one");

        let strategy = Strategy::try_from(self.strategy)?;
        let oracle = self.oracle.build()?;
        let counterparty = self.counterparty.build()?;
        let mut ledger = self.battery.open_ledger()?;

        let writer: Box<dyn Write + Send> = match &self.audit_log {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout()),
        };
        let (sink, receiver) = ChannelSink::new(self.audit_capacity);
        let consumer = tokio::spawn(audit::consume(receiver, writer));

        let report = Optimiser::builder()
            .ledger(&mut ledger)
            .oracle(&*oracle)
            .counterparty(&*counterparty)
            .audit_sink(&sink)
            .strategy(strategy)
            .build()
            .run(window)
            .await;
        drop(sink);
        let n_audited = consumer.await??;
        let report = report?;

        println!("{}", build_audit_table(&report.trail));
        info!(
            n_periods = report.trail.len(),
            n_audited,
            imported = %report.summary.imported,
            exported = %report.summary.exported,
            revenue = %report.summary.revenue,
            "simulated",
        );
        Ok(())
    }
}
