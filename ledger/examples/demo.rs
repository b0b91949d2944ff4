//! Walkthrough of the LYC exchange lifecycle.
//!
//! Creates two wallets over a throwaway wallet file, swaps a partner
//! voucher, moves points between them, shows the refusals the exchange
//! enforces, then reopens the file to prove everything survived.
//!
//! Run with:
//!   cargo run -p lyc-ledger --example demo

use std::time::Instant;

use lyc_ledger::{
    Address, Amount, Exchange, JsonFileStore, LedgerConfig, LedgerError, ScriptedSecrets,
};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!("{BG_BLUE}{BOLD}{WHITE}                                                          {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    LYC EXCHANGE  --  Loyalty Points Walkthrough          {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}                                                          {RESET}");
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]============================================{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn refused(text: &str, err: &LedgerError) {
    println!("{RED}  [REFUSED] {text}: {err}{RESET}");
}

fn balance_row(name: &str, balance: Amount, color: &str) {
    println!("  {color}{BOLD}{name:<8}{RESET}  {WHITE}{balance:>10}{RESET} {DIM}LYC{RESET}");
}

fn address_row(name: &str, address: &Address, color: &str) {
    println!("  {color}{BOLD}{name:<8}{RESET}  {DIM}{address}{RESET}");
}

fn confirm(secret: &str) -> ScriptedSecrets {
    ScriptedSecrets::new([secret])
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("wallets.json");

    banner();

    section(1, "Wallet Creation");
    let mut exchange = Exchange::open(LedgerConfig::default(), JsonFileStore::new(&path))?;
    let alice = exchange.create_wallet("alice", "pw1")?;
    let bob = exchange.create_wallet("bob", "pw2")?;
    address_row("alice", &alice.address(), BLUE);
    address_row("bob", &bob.address(), GREEN);
    success("two wallets registered, both at 0.00");

    section(2, "Voucher Swap");
    let redeemed = exchange.redeem_voucher(&alice, "Amazon_Festive")?;
    balance_row("alice", redeemed.balance, BLUE);
    if let Err(err) = exchange.redeem_voucher(&bob, "Amazon_Festive") {
        refused("bob tries the same code", &err);
    }

    section(3, "Transfer");
    let receipt = exchange.transfer(
        &alice,
        &bob.address(),
        "40".parse::<Amount>()?,
        &mut confirm("pw1"),
    )?;
    success(&receipt.to_string());
    balance_row("alice", receipt.sender_balance, BLUE);
    balance_row("bob", receipt.recipient_balance, GREEN);

    section(4, "Refusals");
    let too_much = Amount::from_points(1_000);
    if let Err(err) = exchange.transfer(&alice, &bob.address(), too_much, &mut confirm("pw1")) {
        refused("overdraft", &err);
    }
    if let Err(err) = exchange.transfer(&alice, &bob.address(), Amount::from_points(1), &mut confirm("nope")) {
        refused("wrong secret on confirmation", &err);
    }
    if let Err(err) = exchange.transfer(&alice, &alice.address(), Amount::from_points(1), &mut confirm("pw1")) {
        refused("transfer to self", &err);
    }

    section(5, "Restart");
    drop(exchange);
    let reopened = Exchange::open(LedgerConfig::default(), JsonFileStore::new(&path))?;
    for wallet in reopened.registry().iter() {
        balance_row(wallet.owner(), wallet.balance(), YELLOW);
    }
    let consumed = reopened.vouchers().into_iter().filter(|v| v.redeemed).count();
    success(&format!(
        "{} wallets and {consumed} consumed voucher reloaded from {}",
        reopened.registry().len(),
        path.display()
    ));

    println!();
    println!("{DIM}  finished in {:.2} ms{RESET}", started.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}
