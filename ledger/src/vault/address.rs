//! # Wallet Addresses
//!
//! An [`Address`] is 160 random bits, shown as `0x` followed by 40 lowercase
//! hex digits. Addresses carry no key material; they are just unguessable
//! names that a sender can paste without knowing the recipient's owner name.
//!
//! Generation is behind the [`AddressGenerator`] trait so the registry's
//! collision handling can be exercised with a rigged source.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{ADDRESS_LENGTH, ADDRESS_PREFIX};
use crate::error::LedgerError;

/// A 160-bit wallet address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// Wraps raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    /// Draws a fresh address from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Address(bytes)
    }

    /// Borrows the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Short form used in log lines and receipts: `0xab12cd...`.
    pub fn short(&self) -> String {
        format!("{}{}...", ADDRESS_PREFIX, hex::encode(&self.0[..3]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    /// Accepts `0x` + 40 hex digits in either case. Anything else is
    /// `InvalidInput`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(ADDRESS_PREFIX)
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!("address '{s}' must start with {ADDRESS_PREFIX}"))
            })?;

        if digits.len() != ADDRESS_LENGTH * 2 {
            return Err(LedgerError::InvalidInput(format!(
                "address '{s}' must have {} hex digits",
                ADDRESS_LENGTH * 2
            )));
        }

        let mut bytes = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| LedgerError::InvalidInput(format!("address '{s}': {e}")))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Source of candidate addresses for new wallets.
pub trait AddressGenerator {
    /// Produces the next candidate. Uniqueness is the registry's problem.
    fn next_address(&mut self) -> Address;
}

/// Default generator backed by the OS RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAddresses;

impl AddressGenerator for RandomAddresses {
    fn next_address(&mut self) -> Address {
        Address::random()
    }
}

impl<F> AddressGenerator for F
where
    F: FnMut() -> Address,
{
    fn next_address(&mut self) -> Address {
        self()
    }
}
