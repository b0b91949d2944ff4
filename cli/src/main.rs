// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LYC Command-Line Front End
//!
//! Entry point for the `lyc` binary. Parses CLI arguments, initializes
//! logging, opens the exchange over the wallet file, and runs one command.
//!
//! - `create`   — register a wallet
//! - `details`  — log in and show the wallet
//! - `redeem`   — log in and swap a voucher code
//! - `transfer` — log in and send points (re-authenticates)
//! - `vouchers` — list the catalog
//! - `version`  — print build version information

mod cli;
mod logging;
mod prompt;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use lyc_ledger::config::TOKEN_SYMBOL;
use lyc_ledger::{
    Exchange, JsonFileStore, LedgerConfig, SecretPrompt, SecretProvider, VoucherCatalog,
};

use cli::{Commands, LycCli};
use prompt::StdinSecrets;

fn main() -> Result<()> {
    let cli = LycCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let mut secrets = StdinSecrets::detect();
    let stdout = io::stdout();
    run(cli, &mut secrets, &mut stdout.lock())
}

/// Builds the runtime config from the global options.
fn ledger_config(cli: &LycCli) -> Result<LedgerConfig> {
    let mut config = LedgerConfig::default()
        .with_auth_attempts(cli.auth_attempts)
        .with_hash_scheme(cli.hash_scheme);

    if let Some(path) = &cli.catalog {
        let catalog = VoucherCatalog::from_json_file(path)
            .with_context(|| format!("failed to load voucher catalog {}", path.display()))?;
        config = config.with_catalog(catalog);
    }
    Ok(config)
}

fn open_exchange(cli: &LycCli) -> Result<Exchange<JsonFileStore>> {
    let mut store = JsonFileStore::new(&cli.wallets);
    if let Some(path) = &cli.vouchers {
        store = store.with_vouchers_path(path);
    }
    let exchange = Exchange::open(ledger_config(cli)?, store)
        .with_context(|| format!("failed to open wallet record {}", cli.wallets.display()))?;

    tracing::info!(
        wallets = %cli.wallets.display(),
        count = exchange.registry().len(),
        "exchange ready"
    );
    Ok(exchange)
}

/// Runs one command. Results go to `out`; prompts go wherever `secrets`
/// sends them.
fn run(cli: LycCli, secrets: &mut dyn SecretProvider, out: &mut dyn Write) -> Result<()> {
    // `version` works even when the wallet record is unreadable.
    if let Commands::Version = cli.command {
        return print_version(out);
    }

    let mut exchange = open_exchange(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Version => {}

        Commands::Create { owner } => {
            let Some(secret) = secrets.provide(SecretPrompt::NewSecret) else {
                bail!("no secret given");
            };
            let Some(confirmation) = secrets.provide(SecretPrompt::ConfirmNewSecret) else {
                bail!("no confirmation given");
            };
            if secret != confirmation {
                bail!("secrets do not match");
            }

            let session = exchange
                .create_wallet(&owner, &secret)
                .with_context(|| format!("failed to create wallet for '{owner}'"))?;
            let details = exchange.details(&session)?;
            if json {
                emit_json(out, &details)?;
            } else {
                writeln!(out, "New wallet created for {}.", details.owner_name)?;
                writeln!(out, "Wallet Address: {}", details.address)?;
                writeln!(out, "Initial Balance: {} {TOKEN_SYMBOL}", details.balance)?;
            }
        }

        Commands::Details { owner } => {
            let session = exchange
                .login(&owner, secrets)
                .with_context(|| format!("login failed for '{owner}'"))?;
            let details = exchange.details(&session)?;
            if json {
                emit_json(out, &details)?;
            } else {
                writeln!(out, "Owner   : {}", details.owner_name)?;
                writeln!(out, "Address : {}", details.address)?;
                writeln!(out, "Balance : {} {TOKEN_SYMBOL}", details.balance)?;
            }
        }

        Commands::Redeem { owner, code } => {
            let session = exchange
                .login(&owner, secrets)
                .with_context(|| format!("login failed for '{owner}'"))?;
            let receipt = exchange
                .redeem_voucher(&session, &code)
                .with_context(|| format!("failed to redeem '{code}'"))?;
            if json {
                emit_json(out, &receipt)?;
            } else {
                writeln!(out, "{receipt}.")?;
                writeln!(out, "Balance: {} {TOKEN_SYMBOL}", receipt.balance)?;
            }
        }

        Commands::Transfer {
            owner,
            recipient,
            amount,
        } => {
            let session = exchange
                .login(&owner, secrets)
                .with_context(|| format!("login failed for '{owner}'"))?;
            let receipt = exchange
                .transfer(&session, &recipient, amount, secrets)
                .context("transfer failed")?;
            if json {
                emit_json(out, &receipt)?;
            } else {
                writeln!(out, "{receipt}")?;
                writeln!(out, "Balance: {} {TOKEN_SYMBOL}", receipt.sender_balance)?;
            }
        }

        Commands::Vouchers => {
            let statuses = exchange.vouchers();
            if json {
                emit_json(out, &statuses)?;
            } else {
                for status in &statuses {
                    let used = if status.redeemed { "redeemed" } else { "available" };
                    writeln!(
                        out,
                        "{:<22} {:<10} {:>8} {TOKEN_SYMBOL}  {used}",
                        status.code, status.issuer, status.value
                    )?;
                }
            }
        }
    }

    Ok(())
}

fn emit_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out)?;
    Ok(())
}

fn print_version(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "lyc       {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "ledger    lyc-ledger {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "rustc     {}", rustc_version())?;
    Ok(())
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyc_ledger::ScriptedSecrets;
    use std::path::Path;

    fn parse(wallets: &Path, args: &[&str]) -> LycCli {
        let wallets = wallets.to_str().unwrap();
        let mut argv = vec!["lyc", "--wallets", wallets];
        argv.extend_from_slice(args);
        LycCli::try_parse_from(argv).unwrap()
    }

    fn run_with(wallets: &Path, args: &[&str], secrets: &[&str]) -> Result<String> {
        let mut provider = ScriptedSecrets::new(secrets.iter().copied());
        let mut out = Vec::new();
        run(parse(wallets, args), &mut provider, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn create_redeem_transfer_through_the_cli() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");

        let created = run_with(&wallets, &["create", "alice"], &["pw1", "pw1"]).unwrap();
        assert!(created.contains("New wallet created for alice."));
        assert!(created.contains("Initial Balance: 0.00 LYC"));

        let bob_json = run_with(&wallets, &["--json", "create", "bob"], &["pw2", "pw2"]).unwrap();
        let bob: serde_json::Value = serde_json::from_str(&bob_json).unwrap();
        let bob_address = bob["address"].as_str().unwrap().to_string();

        let redeemed = run_with(&wallets, &["redeem", "alice", "Amazon_Festive"], &["pw1"]).unwrap();
        assert!(redeemed.contains("Voucher Amazon_Festive from Amazon redeemed for 100.00 LYC."));
        assert!(redeemed.contains("Balance: 100.00 LYC"));

        let sent = run_with(
            &wallets,
            &["transfer", "alice", bob_address.as_str(), "40"],
            &["pw1", "pw1"],
        )
        .unwrap();
        assert!(sent.contains("Balance: 60.00 LYC"));

        let details = run_with(&wallets, &["--json", "details", "bob"], &["pw2"]).unwrap();
        let bob: serde_json::Value = serde_json::from_str(&details).unwrap();
        assert_eq!(bob["balance"], 40.0);
    }

    #[test]
    fn redeem_json_reports_the_credited_voucher() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, r#"{"Spring_Sale": {"issuer": "Acme", "value": 7.5}}"#).unwrap();
        let catalog = catalog.to_str().unwrap();

        run_with(&wallets, &["--catalog", catalog, "create", "alice"], &["pw1", "pw1"]).unwrap();
        let shown = run_with(
            &wallets,
            &["--catalog", catalog, "--json", "redeem", "alice", "Spring_Sale"],
            &["pw1"],
        )
        .unwrap();
        let receipt: serde_json::Value = serde_json::from_str(&shown).unwrap();
        assert_eq!(receipt["owner"], "alice");
        assert_eq!(receipt["code"], "Spring_Sale");
        assert_eq!(receipt["issuer"], "Acme");
        assert_eq!(receipt["value"], 7.5);
        assert_eq!(receipt["balance"], 7.5);
    }

    #[test]
    fn mismatched_confirmation_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");

        let err = run_with(&wallets, &["create", "alice"], &["pw1", "pw2"]).unwrap_err();
        assert!(err.to_string().contains("do not match"));
        assert!(!wallets.exists());
    }

    #[test]
    fn wrong_secret_is_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");
        run_with(&wallets, &["create", "alice"], &["pw1", "pw1"]).unwrap();

        let err = run_with(&wallets, &["details", "alice"], &["a", "b", "c"]).unwrap_err();
        assert!(err.to_string().contains("login failed for 'alice'"));
    }

    #[test]
    fn voucher_listing_marks_consumed_codes() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");
        run_with(&wallets, &["create", "alice"], &["pw1", "pw1"]).unwrap();
        run_with(&wallets, &["redeem", "alice", "Ola_Share"], &["pw1"]).unwrap();

        let listing = run_with(&wallets, &["vouchers"], &[]).unwrap();
        let ola = listing.lines().find(|l| l.starts_with("Ola_Share")).unwrap();
        assert!(ola.ends_with("redeemed"));
        assert_eq!(listing.lines().filter(|l| l.ends_with("available")).count(), 9);
    }

    #[test]
    fn version_does_not_touch_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");
        std::fs::write(&wallets, "not json").unwrap();

        let shown = run_with(&wallets, &["version"], &[]).unwrap();
        assert!(shown.starts_with("lyc "));
    }
}
