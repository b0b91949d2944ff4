// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LYC Exchange — Core Library
//!
//! A loyalty-point exchange for a single node. Partner brands hand out
//! voucher codes; owners swap them for LYC points in a wallet, and move
//! points to other wallets by address. No chain, no consensus, no network:
//! one process owns one ledger and writes it to disk after every change.
//!
//! ## Architecture
//!
//! - **crypto** — Hashing and the credential store. Secrets in, one-way
//!   credentials out.
//! - **vault** — Amounts, addresses, wallets and the wallet registry.
//! - **voucher** — The partner voucher catalog and the consumed-code ledger.
//! - **auth** — Secret prompts: login, transfer confirmation, first-time setup.
//! - **storage** — Snapshot persistence: JSON files on disk, or memory.
//! - **exchange** — The facade. Every operation that changes state lives here.
//! - **config** — Constants and runtime settings.
//! - **error** — The one error type callers see.
//!
//! ## Quick Tour
//!
//! ```no_run
//! use lyc_ledger::{Amount, Exchange, JsonFileStore, LedgerConfig, ScriptedSecrets};
//!
//! let store = JsonFileStore::new("wallets.json");
//! let mut exchange = Exchange::open(LedgerConfig::default(), store)?;
//!
//! let alice = exchange.create_wallet("alice", "pw1")?;
//! let bob = exchange.create_wallet("bob", "pw2")?;
//! exchange.redeem_voucher(&alice, "Amazon_Festive")?;
//!
//! let mut confirm = ScriptedSecrets::new(["pw1"]);
//! exchange.transfer(&alice, &bob.address(), Amount::from_points(40), &mut confirm)?;
//! # Ok::<(), lyc_ledger::LedgerError>(())
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Balances are integers. Floats only exist at the file format boundary.
//! 2. Check everything, then mutate, then save. Refusals change nothing.
//! 3. Secrets are never stored, never logged, never kept past the check.
//! 4. If it touches points, it has tests. Plural.

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod exchange;
pub mod storage;
pub mod vault;
pub mod voucher;

pub use auth::{Authenticator, Rejection, ScriptedSecrets, SecretPrompt, SecretProvider};
pub use config::LedgerConfig;
pub use crypto::{Credential, CredentialStore, HashScheme};
pub use error::{LedgerError, LedgerResult};
pub use exchange::{Exchange, RedeemReceipt, Session, TransferReceipt};
pub use storage::{JsonFileStore, LedgerSnapshot, LedgerStore, MemoryStore, StoreError};
pub use vault::{Address, AddressGenerator, Amount, AmountError, Wallet, WalletDetails, WalletRegistry};
pub use voucher::{Redemption, VoucherCatalog, VoucherError, VoucherLedger, VoucherStatus};
