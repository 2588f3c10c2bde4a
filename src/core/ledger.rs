use crate::{
    core::{
        limits::Limits,
        period::SettlementPeriod,
        rejection::{Direction, Outcome},
        state::BatteryState,
    },
    db::Store,
    prelude::*,
    quantity::energy::MegawattHours,
};

/// Derivation was requested with no same-day anchor, while earlier history exists.
///
/// The ledger never carries a state over midnight unless asked to via [`Ledger::roll_over`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
#[display("no prior state on the day of {period:?}, the last known state is at {last_known:?}")]
pub struct NoPriorState {
    pub period: SettlementPeriod,
    pub last_known: SettlementPeriod,
}

/// Append-only battery ledger.
///
/// Assumes a single writer: concurrent runs over the same store must be serialized by the caller.
#[must_use]
pub struct Ledger<S> {
    store: S,
    limits: Limits,
}

impl<S: Store> Ledger<S> {
    pub const fn new(store: S, limits: Limits) -> Self {
        Self { store, limits }
    }

    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Get the state at the start of the `period`, deriving and persisting it when missing.
    ///
    /// # Errors
    ///
    /// [`NoPriorState`], if there is no state earlier the same day but there is an earlier history.
    #[instrument(skip_all, fields(period = ?period))]
    pub fn get_state(&mut self, period: SettlementPeriod) -> Result<BatteryState> {
        self.resolve(period, false)
    }

    /// Same as [`Ledger::get_state`], but opens a new day by carrying the last known state over midnight.
    ///
    /// The charge level and cumulative totals are carried, while the same-day totals start from zero.
    #[instrument(skip_all, fields(period = ?period))]
    pub fn roll_over(&mut self, period: SettlementPeriod) -> Result<BatteryState> {
        self.resolve(period, true)
    }

    fn resolve(&mut self, period: SettlementPeriod, carry_over: bool) -> Result<BatteryState> {
        if let Some(state) = self.store.get(period)? {
            return Ok(state);
        }
        let state = if let Some(anchor) = self.store.latest_before(period.day(), period)? {
            debug!(anchor = ?anchor.period, "carrying forward…");
            anchor.rekeyed(period)
        } else if let Some(last_known) = self.store.last_before(period)? {
            if !carry_over {
                return Err(NoPriorState { period, last_known: last_known.period }.into());
            }
            info!(last_known = ?last_known.period, "carrying over to the new day…");
            last_known.carried_over(period)
        } else {
            info!(charge_level = %self.limits.initial_charge_level, "seeding…");
            BatteryState::seed(period, self.limits.initial_charge_level)
        };
        self.store.put(state)?;
        Ok(state)
    }

    /// Import the `volume` during the `period`.
    ///
    /// On success, the successor state for the next period is written, and the state at the `period`
    /// stays untouched.
    #[instrument(skip_all, fields(period = ?period, volume = %volume))]
    pub fn apply_charge(
        &mut self,
        period: SettlementPeriod,
        volume: MegawattHours,
    ) -> Result<Outcome> {
        self.apply(Direction::Charge, period, volume)
    }

    /// Export the `volume` during the `period`.
    #[instrument(skip_all, fields(period = ?period, volume = %volume))]
    pub fn apply_discharge(
        &mut self,
        period: SettlementPeriod,
        volume: MegawattHours,
    ) -> Result<Outcome> {
        self.apply(Direction::Discharge, period, volume)
    }

    fn apply(
        &mut self,
        direction: Direction,
        period: SettlementPeriod,
        volume: MegawattHours,
    ) -> Result<Outcome> {
        ensure!(
            volume >= MegawattHours::ZERO,
            "{direction} volume must not be negative: {volume}"
        );

        let state = self.get_state(period)?;
        let (check, successor) = match direction {
            Direction::Charge => (self.limits.check_charge(&state, volume), state.charged(volume)),
            Direction::Discharge => {
                (self.limits.check_discharge(&state, volume), state.discharged(volume))
            }
        };
        if let Err(rejection) = check {
            info!(%rejection, "rejected");
            return Ok(Outcome::Rejected(rejection));
        }

        if self.store.get(successor.period)?.is_some() {
            bail!("the ledger already holds a state at {:?}", successor.period);
        }
        self.store.put(successor)?;
        info!(charge_level = %successor.charge_level, "applied");
        Ok(Outcome::Applied(successor))
    }

    /// Wipe the entire ledger.
    #[instrument(skip_all)]
    pub fn reset(&mut self) -> Result {
        warn!("resetting the ledger…");
        self.store.clear()
    }
}
