//! # Wallet
//!
//! A [`Wallet`] is one owner's account: a unique owner name, an immutable
//! address, a point balance, and the credential that guards it.
//!
//! ## Mutation
//!
//! Everything that changes a wallet is `pub(crate)`. Callers outside the
//! crate read wallets; only the [`Exchange`](crate::exchange::Exchange)
//! moves points or swaps credentials, and it persists after each change.
//!
//! ## Persistence
//!
//! The struct is its own record entry. Field names match the wallet file
//! format (`owner_name`, `address`, `balance`, `password_hash`), and every
//! field except the address has a default so that older, thinner entries
//! still load. Older entries may also carry a blank `password_hash` (read as
//! "no credential yet") or a balance with a third decimal (rounded to the
//! nearest unit, with a warning).

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::address::Address;
use super::amount::Amount;
use crate::crypto::Credential;
use crate::error::{LedgerError, LedgerResult};

/// A named, addressable point balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique owner name. Also the key of the wallet in the record.
    #[serde(default)]
    owner_name: String,

    /// Unique, immutable address.
    address: Address,

    /// Current balance. Never negative by construction.
    #[serde(default, deserialize_with = "balance_from_record")]
    balance: Amount,

    /// `None` until the owner sets a secret. Such a wallet has to go through
    /// the bootstrap flow before it can authorize anything.
    #[serde(
        default,
        rename = "password_hash",
        alias = "credential",
        deserialize_with = "credential_from_record"
    )]
    credential: Option<Credential>,
}

fn balance_from_record<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    let (amount, rounded) = Amount::from_f64_rounded(raw).map_err(serde::de::Error::custom)?;
    if rounded {
        warn!(stored = raw, balance = %amount, "balance rounded to whole units");
    }
    Ok(amount)
}

fn credential_from_record<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Credential>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|value| !value.trim().is_empty())
        .map(Credential::from_stored))
}

impl Wallet {
    /// Creates an empty wallet with no credential.
    pub fn new(owner_name: &str, address: Address) -> Self {
        Self {
            owner_name: owner_name.to_string(),
            address,
            balance: Amount::ZERO,
            credential: None,
        }
    }

    /// Returns the owner name.
    pub fn owner(&self) -> &str {
        &self.owner_name
    }

    /// Returns the wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Returns the stored credential, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Returns `false` for wallets that still need a credential bootstrap.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// Public view: owner, address and balance, without the credential.
    pub fn details(&self) -> WalletDetails {
        WalletDetails {
            owner_name: self.owner_name.clone(),
            address: self.address,
            balance: self.balance,
        }
    }

    // -----------------------------------------------------------------------
    // Crate-internal mutation
    // -----------------------------------------------------------------------

    pub(crate) fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    /// Record entries may omit `owner_name` and rely on their key.
    pub(crate) fn adopt_owner_name(&mut self, key: &str) {
        if self.owner_name.is_empty() {
            self.owner_name = key.to_string();
        }
    }

    /// Adds `amount` and returns the new balance.
    pub(crate) fn credit(&mut self, amount: Amount) -> LedgerResult<Amount> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                owner: self.owner_name.clone(),
            })?;
        Ok(self.balance)
    }

    /// Removes `amount` and returns the new balance. Refuses to go below zero.
    pub(crate) fn debit(&mut self, amount: Amount) -> LedgerResult<Amount> {
        self.balance =
            self.balance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    owner: self.owner_name.clone(),
                    available: self.balance,
                    requested: amount,
                })?;
        Ok(self.balance)
    }
}

/// What a caller gets to see about a wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDetails {
    pub owner_name: String,
    pub address: Address,
    pub balance: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HashScheme;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn new_wallet_is_empty() {
        let w = Wallet::new("alice", addr(1));
        assert_eq!(w.owner(), "alice");
        assert_eq!(w.address(), addr(1));
        assert_eq!(w.balance(), Amount::ZERO);
        assert!(!w.has_credential());
    }

    #[test]
    fn credit_accumulates() {
        let mut w = Wallet::new("alice", addr(1));
        w.credit(Amount::from_points(10)).unwrap();
        let balance = w.credit(Amount::from_points(5)).unwrap();
        assert_eq!(balance, Amount::from_points(15));
    }

    #[test]
    fn debit_refuses_overdraft() {
        let mut w = Wallet::new("alice", addr(1));
        w.credit(Amount::from_points(10)).unwrap();

        let result = w.debit(Amount::from_points(11));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        // Balance untouched after a refused debit.
        assert_eq!(w.balance(), Amount::from_points(10));

        assert_eq!(w.debit(Amount::from_points(10)).unwrap(), Amount::ZERO);
    }

    #[test]
    fn credit_overflow_is_reported() {
        let mut w = Wallet::new("alice", addr(1));
        w.credit(Amount::MAX).unwrap();
        assert!(matches!(
            w.credit(Amount::from_units(1)),
            Err(LedgerError::BalanceOverflow { .. })
        ));
        assert_eq!(w.balance(), Amount::MAX);
    }

    #[test]
    fn record_format_field_names() {
        let mut w = Wallet::new("alice", addr(0xab));
        w.credit(Amount::from_points(60)).unwrap();
        w.set_credential(Credential::derive(HashScheme::Sha256, "pw1", b"s"));

        let value = serde_json::to_value(&w).unwrap();
        assert_eq!(value["owner_name"], "alice");
        assert_eq!(value["address"], format!("0x{}", "ab".repeat(20)));
        assert_eq!(value["balance"], 60.0);
        assert!(value["password_hash"].as_str().unwrap().starts_with("sha256$"));
    }

    #[test]
    fn older_entries_without_credential_load() {
        let json = format!(
            r#"{{"owner_name":"bob","address":"0x{}","balance":12.5}}"#,
            "01".repeat(20)
        );
        let w: Wallet = serde_json::from_str(&json).unwrap();
        assert_eq!(w.owner(), "bob");
        assert_eq!(w.balance(), Amount::from_units(1_250));
        assert!(!w.has_credential());

        let with_null = json.replace("12.5}", r#"12.5,"password_hash":null}"#);
        let w: Wallet = serde_json::from_str(&with_null).unwrap();
        assert!(!w.has_credential());
    }

    #[test]
    fn blank_password_hash_means_no_credential() {
        for stored in [r#""""#, r#""   ""#] {
            let json = format!(
                r#"{{"owner_name":"carol","address":"0x{}","balance":1,"password_hash":{stored}}}"#,
                "02".repeat(20)
            );
            let w: Wallet = serde_json::from_str(&json).unwrap();
            assert!(!w.has_credential(), "{stored} should need a bootstrap");
        }
    }

    #[test]
    fn third_decimal_in_record_is_rounded() {
        let json = format!(
            r#"{{"owner_name":"carol","address":"0x{}","balance":33.336}}"#,
            "02".repeat(20)
        );
        let w: Wallet = serde_json::from_str(&json).unwrap();
        assert_eq!(w.balance(), Amount::from_units(3_334));
    }

    #[test]
    fn negative_balance_in_record_is_rejected() {
        let json = format!(
            r#"{{"owner_name":"bob","address":"0x{}","balance":-1.0}}"#,
            "01".repeat(20)
        );
        assert!(serde_json::from_str::<Wallet>(&json).is_err());
    }

    #[test]
    fn details_hide_credential() {
        let mut w = Wallet::new("alice", addr(2));
        w.set_credential(Credential::legacy("pw1"));
        let details = w.details();
        assert_eq!(details.owner_name, "alice");
        assert_eq!(details.address, addr(2));
        let json = serde_json::to_string(&details).unwrap();
        assert!(!json.contains("password_hash"));
    }
}
