//! Error types for the exchange core.
//!
//! Every caller-facing operation returns a [`LedgerError`]. Business-rule
//! failures leave state untouched. The two storage variants are different in
//! kind: [`LedgerError::CorruptStore`] means we refused to start, and
//! [`LedgerError::PersistenceFailed`] means memory and disk have diverged.

use thiserror::Error;

use crate::storage::StoreError;
use crate::vault::{Address, Amount, AmountError};
use crate::voucher::VoucherError;

/// Errors surfaced by the exchange.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A required field was empty or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A wallet with this owner name is already registered.
    #[error("wallet already exists for owner '{owner}'")]
    AlreadyExists {
        /// The owner name that was taken.
        owner: String,
    },

    /// No wallet is registered under this owner name.
    #[error("no wallet found for owner '{0}'")]
    NotFound(String),

    /// Credential mismatch, attempts exhausted, or the secret provider gave up.
    #[error("authentication failed for owner '{owner}'")]
    AuthFailed {
        /// The owner whose credential was challenged.
        owner: String,
    },

    /// The transfer amount is zero or could not be represented.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// The sender does not hold enough points.
    #[error("insufficient balance for '{owner}': available {available}, requested {requested}")]
    InsufficientBalance {
        /// The sender.
        owner: String,
        /// Balance at the time of the check.
        available: Amount,
        /// Amount the caller asked to move.
        requested: Amount,
    },

    /// No wallet holds the recipient address.
    #[error("recipient wallet {0} not found")]
    RecipientNotFound(Address),

    /// Sender and recipient are the same wallet.
    #[error("cannot transfer to the sending wallet")]
    SelfTransfer,

    /// Crediting would exceed the representable balance.
    #[error("balance overflow for '{owner}'")]
    BalanceOverflow {
        /// The wallet that would have overflowed.
        owner: String,
    },

    /// Address generation kept colliding with registered wallets.
    #[error("could not allocate a unique address after {attempts} attempts")]
    AddressExhausted {
        /// How many candidates were drawn.
        attempts: u32,
    },

    /// Voucher redemption was refused.
    #[error(transparent)]
    Voucher(#[from] VoucherError),

    /// The persisted record exists but cannot be read back.
    #[error("persisted record is corrupt: {0}")]
    CorruptStore(#[source] StoreError),

    /// The persisted record could not be read for a reason other than
    /// corruption (permissions, I/O).
    #[error("failed to load persisted record: {0}")]
    Storage(#[source] StoreError),

    /// State changed in memory but the flush to disk failed. In-memory and
    /// durable state no longer agree.
    #[error("state changed but could not be persisted: {0}")]
    PersistenceFailed(#[source] StoreError),
}

impl LedgerError {
    /// Classifies an error raised while loading the persisted record.
    pub(crate) fn from_load(err: StoreError) -> Self {
        if err.is_corruption() {
            LedgerError::CorruptStore(err)
        } else {
            LedgerError::Storage(err)
        }
    }

    /// Returns `true` for failures that leave the exchange in a state the
    /// caller can no longer trust.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::CorruptStore(_)
                | LedgerError::Storage(_)
                | LedgerError::PersistenceFailed(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type LedgerResult<T> = Result<T, LedgerError>;
