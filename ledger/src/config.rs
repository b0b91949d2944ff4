//! # Ledger Configuration & Constants
//!
//! Every magic number in the exchange lives here. If you're hardcoding a
//! constant somewhere else, move it here instead.
//!
//! Compile-time constants describe the token and the on-disk layout.
//! [`LedgerConfig`] carries the handful of knobs a deployment can turn at
//! start-up (attempt limits, hash scheme, voucher catalog).

use crate::crypto::credential::HashScheme;
use crate::voucher::VoucherCatalog;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Ticker symbol shown next to every balance.
pub const TOKEN_SYMBOL: &str = "LYC";

/// Number of decimal places a balance carries.
pub const AMOUNT_DECIMALS: u32 = 2;

/// Smallest units per whole point. `1 LYC = 100` units.
///
/// Keep this in sync with [`AMOUNT_DECIMALS`].
pub const AMOUNT_SCALE: u64 = 100;

/// Largest balance, in units. Fifteen significant digits is as far as a
/// decimal survives the trip through a JSON `f64` unchanged.
pub const AMOUNT_MAX_UNITS: u64 = 999_999_999_999_999;

// ---------------------------------------------------------------------------
// Addresses & Credentials
// ---------------------------------------------------------------------------

/// Wallet addresses are 160-bit identifiers, rendered as `0x` + 40 hex digits.
pub const ADDRESS_LENGTH: usize = 20;

/// Prefix used when rendering an address.
pub const ADDRESS_PREFIX: &str = "0x";

/// How many fresh addresses we draw before giving up on a registration.
///
/// At 160 bits a single collision is already astronomically unlikely; the
/// cap only matters when a test plugs in a rigged generator.
pub const ADDRESS_RETRY_LIMIT: u32 = 16;

/// Length of the random salt mixed into every new credential.
pub const SALT_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Default number of secret entries accepted before a login is refused.
pub const DEFAULT_AUTH_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Default location of the wallet record.
pub const DEFAULT_WALLETS_FILE: &str = "wallets.json";

/// Extension appended to the wallet record's stem to name the voucher sidecar
/// (`wallets.json` -> `wallets.vouchers.json`).
pub const VOUCHER_SIDECAR_EXTENSION: &str = "vouchers.json";

/// Extension of the scratch file written before the atomic rename.
pub const TEMP_FILE_SUFFIX: &str = "tmp";

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Runtime settings for an [`Exchange`](crate::exchange::Exchange).
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Secret entries allowed per authentication (and rounds allowed for the
    /// credential bootstrap flow).
    pub auth_attempts: u32,

    /// Hash function used for credentials created from now on. Existing
    /// credentials keep verifying with whatever scheme they were made with.
    pub hash_scheme: HashScheme,

    /// Redeemable voucher codes. Fixed for the lifetime of the exchange.
    pub catalog: VoucherCatalog,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            auth_attempts: DEFAULT_AUTH_ATTEMPTS,
            hash_scheme: HashScheme::default(),
            catalog: VoucherCatalog::default(),
        }
    }
}

impl LedgerConfig {
    /// Overrides the authentication attempt limit. Zero is bumped to one so
    /// that a misconfiguration can't lock everybody out.
    pub fn with_auth_attempts(mut self, attempts: u32) -> Self {
        self.auth_attempts = attempts.max(1);
        self
    }

    /// Overrides the hash scheme used for new credentials.
    pub fn with_hash_scheme(mut self, scheme: HashScheme) -> Self {
        self.hash_scheme = scheme;
        self
    }

    /// Replaces the built-in voucher catalog.
    pub fn with_catalog(mut self, catalog: VoucherCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}
