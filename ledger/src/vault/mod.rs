//! # Vault Module — Wallets, Addresses & Balances
//!
//! The vault is where points live. Every balance in the exchange is a field
//! of some [`Wallet`], and every wallet sits in the [`WalletRegistry`].
//!
//! ## Architecture
//!
//! ```text
//! amount.rs   — Fixed-point point amounts (hundredths), parsing, serde
//! address.rs  — 160-bit addresses and pluggable address generation
//! wallet.rs   — One owner's record: name, address, balance, credential
//! registry.rs — Name and address indexes over all wallets
//! ```
//!
//! ## Design Principles
//!
//! 1. **All amounts are `u64` in hundredths.** No floating point in
//!    arithmetic. The record format stores JSON numbers, so conversion
//!    happens once, at the serde boundary, and refuses anything lossy.
//!
//! 2. **Balances never go negative.** A debit that would overdraw fails and
//!    leaves the wallet untouched.
//!
//! 3. **Mutation is crate-private.** Outside the crate, wallets are read-only;
//!    points move only through the exchange operations.

pub mod address;
pub mod amount;
pub mod registry;
pub mod wallet;

pub use address::{Address, AddressGenerator, RandomAddresses};
pub use amount::{Amount, AmountError};
pub use registry::WalletRegistry;
pub use wallet::{Wallet, WalletDetails};
