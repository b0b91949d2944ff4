//! # Voucher Ledger
//!
//! Partner brands issue voucher codes; each code can be swapped exactly once
//! for a fixed number of points. The [`VoucherCatalog`] is the list of codes
//! the exchange accepts, and the [`VoucherLedger`] remembers which ones have
//! been consumed.
//!
//! Matching is exact and case-sensitive. `Amazon_Festive` and
//! `amazon_festive` are different codes, and only one of them exists.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::StoreError;
use crate::vault::Amount;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a redemption was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoucherError {
    /// The code is not in the catalog.
    #[error("invalid voucher code '{code}'")]
    Invalid {
        /// The code as entered.
        code: String,
    },

    /// The code exists but has already been consumed.
    #[error("voucher '{code}' has already been redeemed")]
    AlreadyRedeemed {
        /// The code as entered.
        code: String,
    },
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// What a single voucher code is worth, and who issued it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherEntry {
    /// Partner brand that issued the code.
    pub issuer: String,
    /// Points credited on redemption.
    pub value: Amount,
}

/// The set of codes the exchange accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoucherCatalog {
    entries: BTreeMap<String, VoucherEntry>,
}

/// Built-in partner codes: `(code, issuer, points)`.
const BUILTIN_VOUCHERS: [(&str, &str, u32); 10] = [
    ("Startbucks_90_off", "Starbucks", 50),
    ("lenscart_try_me", "Lenskart", 30),
    ("Amazon_Festive", "Amazon", 100),
    ("Flipkart_BigBillion", "Flipkart", 90),
    ("Zomato_Gold", "Zomato", 40),
    ("Swiggy_Super", "Swiggy", 40),
    ("Myntra_Fashion", "Myntra", 60),
    ("Ajio_Trends", "Ajio", 55),
    ("Uber_Ride", "Uber", 25),
    ("Ola_Share", "Ola", 20),
];

impl Default for VoucherCatalog {
    fn default() -> Self {
        BUILTIN_VOUCHERS
            .iter()
            .map(|(code, issuer, points)| (*code, *issuer, Amount::from_points(*points)))
            .collect()
    }
}

impl<'a> FromIterator<(&'a str, &'a str, Amount)> for VoucherCatalog {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str, Amount)>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|(code, issuer, value)| {
                (
                    code.to_string(),
                    VoucherEntry {
                        issuer: issuer.to_string(),
                        value,
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

impl VoucherCatalog {
    /// Reads a catalog from a JSON object of `code -> {issuer, value}`.
    pub fn from_reader(reader: impl Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Reads a catalog file. A catalog that can't be read is an error; there
    /// is no fallback to the built-in codes.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StoreError::io(path, source))?;
        let catalog = Self::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::corrupt(path, source))?;
        debug!(path = %path.display(), codes = catalog.len(), "voucher catalog loaded");
        Ok(catalog)
    }

    /// Looks up a code. Exact match only.
    pub fn get(&self, code: &str) -> Option<&VoucherEntry> {
        self.entries.get(code)
    }

    /// Whether `code` exists in the catalog.
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Number of codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` for a catalog with no codes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Codes in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VoucherEntry)> {
        self.entries.iter().map(|(code, entry)| (code.as_str(), entry))
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A successful redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Redemption {
    pub code: String,
    pub issuer: String,
    pub value: Amount,
}

/// One catalog line plus whether it has been used, for listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VoucherStatus {
    pub code: String,
    pub issuer: String,
    pub value: Amount,
    pub redeemed: bool,
}

/// Catalog plus the set of consumed codes.
#[derive(Clone, Debug, Default)]
pub struct VoucherLedger {
    catalog: VoucherCatalog,
    redeemed: BTreeSet<String>,
}

impl VoucherLedger {
    /// Creates a ledger where nothing has been redeemed yet.
    pub fn new(catalog: VoucherCatalog) -> Self {
        Self {
            catalog,
            redeemed: BTreeSet::new(),
        }
    }

    /// Consumes `code` and returns what it was worth.
    ///
    /// # Errors
    ///
    /// [`VoucherError::Invalid`] for codes outside the catalog,
    /// [`VoucherError::AlreadyRedeemed`] for codes already consumed. Neither
    /// changes the ledger.
    pub fn redeem(&mut self, code: &str) -> Result<Redemption, VoucherError> {
        let entry = self.catalog.get(code).ok_or_else(|| VoucherError::Invalid {
            code: code.to_string(),
        })?;
        if self.redeemed.contains(code) {
            return Err(VoucherError::AlreadyRedeemed {
                code: code.to_string(),
            });
        }
        let redemption = Redemption {
            code: code.to_string(),
            issuer: entry.issuer.clone(),
            value: entry.value,
        };
        self.redeemed.insert(code.to_string());
        Ok(redemption)
    }

    /// Reverts a redemption that could not be applied to a wallet.
    pub(crate) fn unredeem(&mut self, code: &str) {
        self.redeemed.remove(code);
    }

    /// Re-seeds the consumed set from a persisted record.
    ///
    /// Codes the current catalog doesn't know are kept, so that swapping the
    /// catalog back later doesn't make them redeemable again.
    pub fn restore(&mut self, consumed: impl IntoIterator<Item = String>) {
        for code in consumed {
            if !self.catalog.contains(&code) {
                warn!(code = %code, "restored voucher is not in the current catalog");
            }
            self.redeemed.insert(code);
        }
    }

    /// Whether `code` has been consumed.
    pub fn is_redeemed(&self, code: &str) -> bool {
        self.redeemed.contains(code)
    }

    /// Consumed codes, sorted.
    pub fn redeemed(&self) -> &BTreeSet<String> {
        &self.redeemed
    }

    /// The catalog this ledger was built with.
    pub fn catalog(&self) -> &VoucherCatalog {
        &self.catalog
    }

    /// Every catalog code with its consumed flag.
    pub fn statuses(&self) -> Vec<VoucherStatus> {
        self.catalog
            .iter()
            .map(|(code, entry)| VoucherStatus {
                code: code.to_string(),
                issuer: entry.issuer.clone(),
                value: entry.value,
                redeemed: self.redeemed.contains(code),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog() {
        let catalog = VoucherCatalog::default();
        assert_eq!(catalog.len(), 10);
        let amazon = catalog.get("Amazon_Festive").unwrap();
        assert_eq!(amazon.issuer, "Amazon");
        assert_eq!(amazon.value, Amount::from_points(100));
        assert_eq!(catalog.get("Ola_Share").unwrap().value, Amount::from_points(20));
    }

    #[test]
    fn redeem_once_only() {
        let mut ledger = VoucherLedger::default();
        let first = ledger.redeem("Zomato_Gold").unwrap();
        assert_eq!(first.issuer, "Zomato");
        assert_eq!(first.value, Amount::from_points(40));
        assert!(ledger.is_redeemed("Zomato_Gold"));

        assert_eq!(
            ledger.redeem("Zomato_Gold"),
            Err(VoucherError::AlreadyRedeemed {
                code: "Zomato_Gold".into()
            })
        );
    }

    #[test]
    fn unknown_and_case_mismatched_codes_are_invalid() {
        let mut ledger = VoucherLedger::default();
        for code in ["NOPE", "amazon_festive", "", " Amazon_Festive"] {
            assert!(matches!(
                ledger.redeem(code),
                Err(VoucherError::Invalid { .. })
            ));
        }
        assert!(ledger.redeemed().is_empty());
    }

    #[test]
    fn restore_keeps_unknown_codes() {
        let mut ledger = VoucherLedger::default();
        ledger.restore(vec!["Uber_Ride".to_string(), "Retired_Code".to_string()]);
        assert!(ledger.is_redeemed("Uber_Ride"));
        assert!(ledger.is_redeemed("Retired_Code"));
        assert!(matches!(
            ledger.redeem("Uber_Ride"),
            Err(VoucherError::AlreadyRedeemed { .. })
        ));
    }

    #[test]
    fn catalog_from_json() {
        let json = r#"{"Promo_1": {"issuer": "Acme", "value": 12.5}}"#;
        let catalog = VoucherCatalog::from_reader(json.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Promo_1").unwrap().value, Amount::from_units(1_250));

        assert!(VoucherCatalog::from_reader(r#"{"x": {"issuer": "a"}}"#.as_bytes()).is_err());
    }

    #[test]
    fn statuses_reflect_redemptions() {
        let mut ledger = VoucherLedger::default();
        ledger.redeem("Ajio_Trends").unwrap();
        let statuses = ledger.statuses();
        assert_eq!(statuses.len(), 10);
        let ajio = statuses.iter().find(|s| s.code == "Ajio_Trends").unwrap();
        assert!(ajio.redeemed);
        assert_eq!(statuses.iter().filter(|s| s.redeemed).count(), 1);
    }
}
