//! # CLI Interface
//!
//! Defines the command-line argument structure for `lyc` using `clap`
//! derive. Every global option can also come from an `LYC_*` environment
//! variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lyc_ledger::config::{DEFAULT_AUTH_ATTEMPTS, DEFAULT_WALLETS_FILE};
use lyc_ledger::{Address, Amount, HashScheme};

use crate::logging::{LogFormat, DEFAULT_LOG_FILTER};

/// LYC loyalty-point exchange.
///
/// Swap partner voucher codes for LYC points and move points between
/// wallets. Secrets are read from the terminal with echo off, or one per
/// line when stdin is piped.
#[derive(Parser, Debug)]
#[command(
    name = "lyc",
    about = "LYC loyalty-point exchange",
    version,
    propagate_version = true
)]
pub struct LycCli {
    /// Wallet record to open (created on first write).
    #[arg(long, global = true, env = "LYC_WALLETS", default_value = DEFAULT_WALLETS_FILE)]
    pub wallets: PathBuf,

    /// Consumed-voucher sidecar. Defaults to `<wallets stem>.vouchers.json`.
    #[arg(long, global = true, env = "LYC_VOUCHERS")]
    pub vouchers: Option<PathBuf>,

    /// JSON voucher catalog replacing the built-in partner codes.
    #[arg(long, global = true, env = "LYC_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Secret entries allowed per authentication.
    #[arg(
        long,
        global = true,
        env = "LYC_AUTH_ATTEMPTS",
        default_value_t = DEFAULT_AUTH_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub auth_attempts: u32,

    /// Hash scheme for newly issued credentials: sha256 or blake3.
    #[arg(long, global = true, env = "LYC_HASH_SCHEME", default_value = "sha256")]
    pub hash_scheme: HashScheme,

    /// Log filter, in `tracing` EnvFilter syntax.
    #[arg(long, global = true, env = "LYC_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `lyc` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a wallet. Reads the new secret and its confirmation.
    Create {
        /// Owner name for the new wallet.
        owner: String,
    },
    /// Log in and show owner, address and balance.
    Details {
        owner: String,
    },
    /// Log in and swap a voucher code for points.
    Redeem {
        owner: String,
        /// Voucher code, case-sensitive.
        code: String,
    },
    /// Log in and send points to another wallet's address. Asks for the
    /// secret again before anything moves.
    Transfer {
        owner: String,
        /// Recipient address, `0x` + 40 hex digits.
        recipient: Address,
        /// Amount in points, up to two decimal places.
        amount: Amount,
    },
    /// List the voucher catalog and which codes are used up.
    Vouchers,
    /// Print version information and exit.
    Version,
}
