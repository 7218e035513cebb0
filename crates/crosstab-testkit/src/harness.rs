//! Multi-context harness
//!
//! A [`TabSet`] is a group of execution contexts ("tabs") attached to one
//! shared origin, each with its own `SharedStore`. Signals between tabs are
//! only delivered when a tab pumps, mirroring an event loop that runs between
//! script turns.

use crosstab::{SharedStore, StoreConfig, StoreResult};
use crosstab_effects::Origin;

/// Tabs sharing one origin.
pub struct TabSet {
    origin: Origin,
    tabs: Vec<SharedStore>,
}

impl TabSet {
    /// `count` tabs on a fresh in-memory origin, not yet initialized.
    pub fn uninitialized(count: usize) -> Self {
        Self::on_origin(Origin::in_memory(), count)
    }

    /// `count` tabs attached to `origin`, not yet initialized.
    pub fn on_origin(origin: Origin, count: usize) -> Self {
        let tabs = (0..count)
            .map(|i| SharedStore::new(origin.attach(format!("https://app.test/tab-{i}"))))
            .collect();
        Self { origin, tabs }
    }

    /// `count` tabs on a fresh origin, each initialized with `config` in order.
    pub fn new(count: usize, config: &StoreConfig) -> StoreResult<Self> {
        let set = Self::uninitialized(count);
        for tab in &set.tabs {
            tab.init(config.clone())?;
        }
        Ok(set)
    }

    /// Tab `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn tab(&self, index: usize) -> &SharedStore {
        &self.tabs[index]
    }

    /// All tabs.
    pub fn tabs(&self) -> &[SharedStore] {
        &self.tabs
    }

    /// Shared origin.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Attach one more tab to the origin.
    pub fn open_tab(&mut self) -> &SharedStore {
        let page = format!("https://app.test/tab-{}", self.tabs.len());
        self.tabs.push(SharedStore::new(self.origin.attach(page)));
        let last = self.tabs.len() - 1;
        &self.tabs[last]
    }

    /// Let every tab deliver its pending signals. Returns the total handled.
    pub fn pump_all(&self) -> usize {
        self.tabs.iter().map(SharedStore::process_pending).sum()
    }
}
