use std::collections::BTreeMap;

use crate::{
    core::{period::SettlementPeriod, state::BatteryState},
    db::Store,
    prelude::*,
};

/// In-memory ledger store.
#[must_use]
#[derive(Clone, Default)]
pub struct MemoryStore(BTreeMap<SettlementPeriod, BatteryState>);

impl MemoryStore {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatteryState> {
        self.0.values()
    }
}

impl FromIterator<BatteryState> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = BatteryState>>(iter: T) -> Self {
        Self(iter.into_iter().map(|state| (state.period, state)).collect())
    }
}

impl Store for MemoryStore {
    fn get(&self, period: SettlementPeriod) -> Result<Option<BatteryState>> {
        Ok(self.0.get(&period).copied())
    }

    fn put(&mut self, state: BatteryState) -> Result {
        self.0.insert(state.period, state);
        Ok(())
    }

    fn last_before(&self, period: SettlementPeriod) -> Result<Option<BatteryState>> {
        Ok(self.0.range(..period).next_back().map(|(_, state)| *state))
    }

    fn clear(&mut self) -> Result {
        self.0.clear();
        Ok(())
    }
}
