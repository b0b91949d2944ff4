//! # Storage Module
//!
//! Durable state for the exchange. Everything that must survive a restart
//! (wallets, balances, credentials, consumed voucher codes) is captured in a
//! [`LedgerSnapshot`] and handed to a [`LedgerStore`].
//!
//! ## Architecture
//!
//! ```text
//! mod.rs    — LedgerSnapshot, the LedgerStore trait, StoreError
//! file.rs   — JsonFileStore: wallet record + voucher sidecar, atomic rename
//! memory.rs — MemoryStore: in-process store for tests and benches
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Whole-snapshot writes.** Every save rewrites the full record. The
//!    ledger is small and single-writer; a snapshot is simpler to reason
//!    about than an append log.
//!
//! 2. **JSON on disk.** The wallet record is meant to be inspected by hand
//!    and has to stay readable by older tooling, so it's pretty-printed JSON
//!    with stable field names.
//!
//! 3. **Corrupt means stop.** A record that exists but can't be parsed is
//!    never silently replaced with an empty one.

pub mod file;
pub mod memory;

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::vault::Wallet;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by a [`LedgerStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying file could not be read or written.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not valid JSON of the expected shape.
    #[error("cannot parse {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The record parsed but contradicts itself.
    #[error("inconsistent record: {0}")]
    Invalid(String),

    /// The snapshot could not be serialized.
    #[error("cannot encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// A failure requested by a test through [`MemoryStore::fail_next_save`].
    #[error("simulated storage failure")]
    Simulated,
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, source: serde_json::Error) -> Self {
        StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        StoreError::Invalid(reason.into())
    }

    /// `true` if the record exists but its content is unusable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. } | StoreError::Invalid(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the exchange persists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// Every wallet, keyed by owner name.
    pub wallets: BTreeMap<String, Wallet>,
    /// Voucher codes that have been consumed.
    pub redeemed_vouchers: BTreeSet<String>,
}

impl LedgerSnapshot {
    /// `true` for a ledger nobody has used yet.
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty() && self.redeemed_vouchers.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Store Trait
// ---------------------------------------------------------------------------

/// A place to keep [`LedgerSnapshot`]s between runs.
///
/// `load` on a store that has never been saved to returns an empty snapshot.
/// `save` replaces whatever was stored before; when it returns `Ok` the
/// snapshot is durable.
pub trait LedgerStore {
    /// Reads the latest snapshot.
    fn load(&self) -> StoreResult<LedgerSnapshot>;

    /// Replaces the stored snapshot.
    fn save(&mut self, snapshot: &LedgerSnapshot) -> StoreResult<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn load(&self) -> StoreResult<LedgerSnapshot> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &LedgerSnapshot) -> StoreResult<()> {
        (**self).save(snapshot)
    }
}
