//! # JSON File Store
//!
//! Two files on disk:
//!
//! | File                     | Content                                        |
//! |--------------------------|------------------------------------------------|
//! | `wallets.json`           | owner name → `{owner_name, address, balance, password_hash}` |
//! | `wallets.vouchers.json`  | `{"redeemed": [code, ...]}`                    |
//!
//! The wallet record keeps the historical layout so existing files load
//! unchanged. Consumed voucher codes live in a sidecar next to it.
//!
//! ## Atomicity
//!
//! Each file is written to `<name>.tmp`, fsynced, and renamed over the old
//! one, so a crash leaves either the previous or the new content, never a
//! torn file. The sidecar is written first: after a crash between the two
//! renames a voucher may be marked consumed without its credit, but it can
//! never be credited twice.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LedgerSnapshot, LedgerStore, StoreError, StoreResult};
use crate::config::{TEMP_FILE_SUFFIX, VOUCHER_SIDECAR_EXTENSION};
use crate::vault::Wallet;

/// On-disk shape of the voucher sidecar.
#[derive(Debug, Default, Serialize, Deserialize)]
struct VoucherRecord {
    #[serde(default)]
    redeemed: BTreeSet<String>,
}

/// Snapshot store backed by a wallet record and a voucher sidecar.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    wallets_path: PathBuf,
    vouchers_path: PathBuf,
}

impl JsonFileStore {
    /// Stores wallets at `path` and vouchers at the matching sidecar
    /// (`wallets.json` → `wallets.vouchers.json`).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let wallets_path = path.into();
        let vouchers_path = sidecar_path(&wallets_path);
        Self {
            wallets_path,
            vouchers_path,
        }
    }

    /// Overrides the sidecar location.
    pub fn with_vouchers_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vouchers_path = path.into();
        self
    }

    /// Where wallets are kept.
    pub fn wallets_path(&self) -> &Path {
        &self.wallets_path
    }

    /// Where consumed voucher codes are kept.
    pub fn vouchers_path(&self) -> &Path {
        &self.vouchers_path
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> StoreResult<LedgerSnapshot> {
        let wallets: BTreeMap<String, Wallet> =
            read_json(&self.wallets_path)?.unwrap_or_default();
        let vouchers: VoucherRecord = read_json(&self.vouchers_path)?.unwrap_or_default();

        debug!(
            path = %self.wallets_path.display(),
            wallets = wallets.len(),
            redeemed = vouchers.redeemed.len(),
            "record loaded"
        );
        Ok(LedgerSnapshot {
            wallets,
            redeemed_vouchers: vouchers.redeemed,
        })
    }

    fn save(&mut self, snapshot: &LedgerSnapshot) -> StoreResult<()> {
        let vouchers = VoucherRecord {
            redeemed: snapshot.redeemed_vouchers.clone(),
        };
        write_json_atomic(&self.vouchers_path, &vouchers)?;
        write_json_atomic(&self.wallets_path, &snapshot.wallets)?;

        debug!(
            path = %self.wallets_path.display(),
            wallets = snapshot.wallets.len(),
            "record saved"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sidecar_path(wallets_path: &Path) -> PathBuf {
    wallets_path.with_extension(VOUCHER_SIDECAR_EXTENSION)
}

/// `wallets.json` → `wallets.json.tmp`, in the same directory so the rename
/// stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

/// Reads and parses `path`. A missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no record yet");
            return Ok(None);
        }
        Err(err) => return Err(StoreError::io(path, err)),
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| StoreError::corrupt(path, source))
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let data = serde_json::to_vec_pretty(value).map_err(StoreError::Encode)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
    }

    let tmp = temp_path(path);
    let mut file = File::create(&tmp).map_err(|err| StoreError::io(&tmp, err))?;
    file.write_all(&data)
        .and_then(|_| file.sync_all())
        .map_err(|err| StoreError::io(&tmp, err))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|err| StoreError::io(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{Address, Amount};

    fn snapshot() -> LedgerSnapshot {
        let mut wallets = BTreeMap::new();
        wallets.insert(
            "alice".to_string(),
            Wallet::new("alice", Address::from_bytes([1; 20])),
        );
        let mut redeemed = BTreeSet::new();
        redeemed.insert("Uber_Ride".to_string());
        LedgerSnapshot {
            wallets,
            redeemed_vouchers: redeemed,
        }
    }

    #[test]
    fn paths_are_derived_from_the_wallet_record() {
        let store = JsonFileStore::new("data/wallets.json");
        assert_eq!(store.vouchers_path(), Path::new("data/wallets.vouchers.json"));
        assert_eq!(
            temp_path(store.wallets_path()),
            Path::new("data/wallets.json.tmp")
        );
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("wallets.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("wallets.json"));
        let snap = snapshot();
        store.save(&snap).unwrap();

        assert_eq!(store.load().unwrap(), snap);
        assert!(!temp_path(store.wallets_path()).exists());
        assert!(store.vouchers_path().exists());
    }

    #[test]
    fn wallet_record_keeps_historical_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.json");
        let mut store = JsonFileStore::new(&path);
        store.save(&snapshot()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let alice = &raw["alice"];
        assert_eq!(alice["owner_name"], "alice");
        assert_eq!(alice["balance"], 0.0);
        assert!(alice["password_hash"].is_null());
    }

    #[test]
    fn legacy_record_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.json");
        let legacy = format!(
            r#"{{"bob": {{"owner_name": "bob", "address": "0x{}", "balance": 40.0,
                "password_hash": "{}"}}}}"#,
            "ab".repeat(20),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        fs::write(&path, legacy).unwrap();

        let snap = JsonFileStore::new(&path).load().unwrap();
        let bob = &snap.wallets["bob"];
        assert_eq!(bob.balance(), Amount::from_points(40));
        assert!(bob.credential().unwrap().is_legacy());
        assert!(snap.redeemed_vouchers.is_empty());
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn corrupt_sidecar_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("wallets.json"));
        store.save(&snapshot()).unwrap();
        fs::write(store.vouchers_path(), "[1, 2").unwrap();

        assert!(store.load().unwrap_err().is_corruption());
    }
}
