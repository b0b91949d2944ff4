//! In-process [`LedgerStore`] for tests and benches.
//!
//! Clones share the same backing snapshot, so a test can keep one handle to
//! inspect what the exchange saved while the exchange owns the other.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{LedgerSnapshot, LedgerStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    snapshot: LedgerSnapshot,
    saves: u64,
    fail_next_save: bool,
}

/// Snapshot store that lives in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `snapshot`.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        let store = Self::default();
        store.inner.lock().snapshot = snapshot;
        store
    }

    /// Makes the next `save` fail with [`StoreError::Simulated`] and leave
    /// the stored snapshot as it was.
    pub fn fail_next_save(&self) {
        self.inner.lock().fail_next_save = true;
    }

    /// The last successfully saved snapshot.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.lock().snapshot.clone()
    }

    /// How many saves have succeeded.
    pub fn save_count(&self) -> u64 {
        self.inner.lock().saves
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> StoreResult<LedgerSnapshot> {
        Ok(self.inner.lock().snapshot.clone())
    }

    fn save(&mut self, snapshot: &LedgerSnapshot) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        if std::mem::take(&mut inner.fail_next_save) {
            return Err(StoreError::Simulated);
        }
        inner.snapshot = snapshot.clone();
        inner.saves += 1;
        Ok(())
    }
}
