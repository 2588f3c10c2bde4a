//! Per-period audit trail of the optimiser.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use crate::{
    core::{
        period::SettlementPeriod,
        state::BatteryState,
        submission::{BidOfferPair, Side, SubmissionResult},
    },
    prelude::*,
    quantity::{energy::MegawattHours, price::MegawattHourRate},
};

/// What the optimiser saw, submitted, and got back in a single simulation step.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub simulation_timestamp: SettlementPeriod,

    /// Charge level at the simulation timestamp, not at the target period.
    pub battery_state_of_charge: MegawattHours,

    pub total_energy_imported_from_start_to_date: MegawattHours,
    pub total_energy_exported_from_start_to_date: MegawattHours,
    pub total_energy_imported_on_current_day: MegawattHours,
    pub total_energy_exported_on_current_day: MegawattHours,

    /// Predicted bid price for the target period, if any.
    pub bid_price_prediction: Option<MegawattHourRate>,

    /// Predicted offer price for the target period, if any.
    pub offer_price_prediction: Option<MegawattHourRate>,

    pub submitted_bid_offer_pair: BidOfferPair,
    pub bid_accepted: bool,
    pub offer_accepted: bool,
}

impl AuditEntry {
    pub fn new(
        state: &BatteryState,
        bid_price: Option<MegawattHourRate>,
        offer_price: Option<MegawattHourRate>,
        result: &SubmissionResult,
    ) -> Self {
        let side = result.pair.side();
        Self {
            simulation_timestamp: state.period,
            battery_state_of_charge: state.charge_level,
            total_energy_imported_from_start_to_date: state.cumulative_import,
            total_energy_exported_from_start_to_date: state.cumulative_export,
            total_energy_imported_on_current_day: state.same_day_import,
            total_energy_exported_on_current_day: state.same_day_export,
            bid_price_prediction: bid_price,
            offer_price_prediction: offer_price,
            submitted_bid_offer_pair: result.pair,
            bid_accepted: result.accepted && side == Some(Side::Bid),
            offer_accepted: result.accepted && side == Some(Side::Offer),
        }
    }
}

/// Fire-and-forget destination of audit entries.
///
/// Implementations must not block the caller.
pub trait AuditSink: Sync {
    fn record(&self, entry: AuditEntry);
}

/// Audit sink backed by a bounded channel, dropping entries when the consumer lags behind.
pub struct ChannelSink(Sender<AuditEntry>);

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, Receiver<AuditEntry>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self(sender), receiver)
    }
}

impl AuditSink for ChannelSink {
    fn record(&self, entry: AuditEntry) {
        match self.0.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!(
                    timestamp = ?entry.simulation_timestamp,
                    "audit channel is full, dropped the entry",
                );
            }
            Err(TrySendError::Closed(entry)) => {
                debug!(timestamp = ?entry.simulation_timestamp, "audit channel is closed");
            }
        }
    }
}

/// Drain the channel into the writer, one JSON document per line.
///
/// Returns the number of written entries once all senders are gone.
#[instrument(skip_all)]
pub async fn consume<W: Write>(
    mut receiver: Receiver<AuditEntry>,
    mut writer: W,
) -> Result<usize> {
    let mut n_entries = 0;
    while let Some(entry) = receiver.recv().await {
        serde_json::to_writer(&mut writer, &entry)?;
        writeln!(writer)?;
        n_entries += 1;
    }
    writer.flush()?;
    debug!(n_entries, "audit channel drained");
    Ok(n_entries)
}
