use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    core::{period::SettlementPeriod, state::BatteryState},
    db::{Store, memory::MemoryStore},
    prelude::*,
};

/// Ledger store persisted as a TOML file.
///
/// The whole file is rewritten on every change: written next to the ledger first,
/// then renamed over it, so an interrupted write leaves the previous contents intact.
#[must_use]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

#[derive(Default, Serialize, Deserialize)]
struct Contents {
    #[serde(default)]
    states: Vec<BatteryState>,
}

impl FileStore {
    #[instrument(skip_all, fields(path = ?path))]
    pub fn open<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents: Contents = if path.is_file() {
            toml::from_slice(&fs::read(path)?)
                .with_context(|| format!("failed to parse the ledger `{}`", path.display()))?
        } else {
            Contents::default()
        };
        let inner: MemoryStore = contents.states.into_iter().collect();
        info!(n_states = inner.len(), "opened the ledger");
        Ok(Self { path: path.to_path_buf(), inner })
    }

    fn temporary_path(&self) -> PathBuf {
        let mut file_name = self.path.file_name().unwrap_or_default().to_os_string();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }

    fn write(&self) -> Result {
        let contents = Contents { states: self.inner.iter().copied().collect() };
        let temporary_path = self.temporary_path();
        fs::write(&temporary_path, toml::to_string(&contents)?).with_context(|| {
            format!("failed to write the ledger to `{}`", temporary_path.display())
        })?;
        fs::rename(&temporary_path, &self.path)
            .with_context(|| format!("failed to replace the ledger `{}`", self.path.display()))
    }
}

impl Store for FileStore {
    fn get(&self, period: SettlementPeriod) -> Result<Option<BatteryState>> {
        self.inner.get(period)
    }

    fn put(&mut self, state: BatteryState) -> Result {
        self.inner.put(state)?;
        self.write()
    }

    fn last_before(&self, period: SettlementPeriod) -> Result<Option<BatteryState>> {
        self.inner.last_before(period)
    }

    fn clear(&mut self) -> Result {
        self.inner.clear()?;
        self.write()
    }
}
