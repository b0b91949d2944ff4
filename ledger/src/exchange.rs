//! # Exchange
//!
//! The [`Exchange`] is the only way state changes. It owns the wallet
//! registry, the voucher ledger, the authenticator and the store, and every
//! operation that mutates any of them ends with a save.
//!
//! ## Operation Order
//!
//! ```text
//! redeem_voucher   wallet exists → voucher valid & unused → credit → save
//! transfer         amount > 0 → recipient exists → not self
//!                  → balance covers amount → re-authenticate
//!                  → debit + credit → save
//! ```
//!
//! Every check runs before anything is touched, so a refused operation
//! leaves the ledger exactly as it was. A save that fails after the memory
//! update is reported as [`LedgerError::PersistenceFailed`].
//!
//! ## Sessions
//!
//! [`Exchange::login`] and [`Exchange::create_wallet`] hand out a
//! [`Session`]. Wallet operations take a session instead of an owner name,
//! so the type system records that the owner authenticated first. Transfers
//! still re-authenticate on top of that.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{Authenticator, SecretPrompt, SecretProvider};
use crate::config::{LedgerConfig, TOKEN_SYMBOL};
use crate::crypto::CredentialStore;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{LedgerSnapshot, LedgerStore};
use crate::vault::{
    Address, AddressGenerator, Amount, RandomAddresses, Wallet, WalletDetails, WalletRegistry,
};
use crate::voucher::{VoucherLedger, VoucherStatus};

// ---------------------------------------------------------------------------
// Session & Receipt
// ---------------------------------------------------------------------------

/// Proof that an owner authenticated against this exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    owner: String,
    address: Address,
}

impl Session {
    fn for_wallet(wallet: &Wallet) -> Self {
        Self {
            owner: wallet.owner().to_string(),
            address: wallet.address(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

/// Record of a completed voucher swap: what was credited, and to whom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedeemReceipt {
    pub owner: String,
    pub code: String,
    pub issuer: String,
    /// Points credited for the code.
    pub value: Amount,
    /// Wallet balance after the credit.
    pub balance: Amount,
}

impl fmt::Display for RedeemReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Voucher {} from {} redeemed for {} {TOKEN_SYMBOL}",
            self.code, self.issuer, self.value
        )
    }
}

/// Record of a completed transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    /// Unique id for this transfer.
    pub id: Uuid,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    /// Sender balance after the transfer.
    pub sender_balance: Amount,
    /// Recipient balance after the transfer.
    pub recipient_balance: Amount,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for TransferReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer {}: {} {TOKEN_SYMBOL} from {} to {}",
            self.id,
            self.amount,
            self.from.short(),
            self.to.short()
        )
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// The loyalty-point exchange.
pub struct Exchange<S: LedgerStore> {
    registry: WalletRegistry,
    vouchers: VoucherLedger,
    auth: Authenticator,
    store: S,
}

impl<S: LedgerStore> Exchange<S> {
    /// Loads the persisted state from `store` and opens the exchange.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CorruptStore`] if the record exists but can't be used,
    /// [`LedgerError::Storage`] if it can't be read at all.
    pub fn open(config: LedgerConfig, store: S) -> LedgerResult<Self> {
        Self::open_with_generator(config, store, RandomAddresses)
    }

    /// Like [`Exchange::open`], with a custom source of wallet addresses.
    pub fn open_with_generator(
        config: LedgerConfig,
        store: S,
        generator: impl AddressGenerator + Send + 'static,
    ) -> LedgerResult<Self> {
        let LedgerSnapshot {
            wallets,
            redeemed_vouchers,
        } = store.load().map_err(LedgerError::from_load)?;

        let registry =
            WalletRegistry::from_wallets(wallets, generator).map_err(LedgerError::from_load)?;
        let mut vouchers = VoucherLedger::new(config.catalog);
        vouchers.restore(redeemed_vouchers);

        let credentials = CredentialStore::new(config.hash_scheme);
        let auth = Authenticator::new(credentials, config.auth_attempts);

        info!(
            wallets = registry.len(),
            redeemed = vouchers.redeemed().len(),
            scheme = %credentials.scheme(),
            "exchange opened"
        );
        Ok(Self {
            registry,
            vouchers,
            auth,
            store,
        })
    }

    // -----------------------------------------------------------------------
    // Wallets & Authentication
    // -----------------------------------------------------------------------

    /// Registers a wallet for `owner`, persists it, and opens a session.
    pub fn create_wallet(&mut self, owner: &str, secret: &str) -> LedgerResult<Session> {
        let credentials = *self.auth.credentials();
        let session = Session::for_wallet(self.registry.register(owner, secret, &credentials)?);
        self.persist()?;

        info!(owner = %session.owner, address = %session.address, "wallet created");
        Ok(session)
    }

    /// Verifies `owner` through `provider` and returns the wallet.
    ///
    /// A wallet that predates credentials is made to set one first (two
    /// matching entries), which is persisted before the normal check runs.
    pub fn authenticate(
        &mut self,
        owner: &str,
        provider: &mut dyn SecretProvider,
    ) -> LedgerResult<&Wallet> {
        if !self.registry.lookup_by_name(owner)?.has_credential() {
            info!(owner, "wallet has no credential, starting setup");
            self.auth
                .bootstrap_interactive(self.registry.get_mut(owner)?, provider)?;
            self.persist()?;
            info!(owner, "credential set");
        }

        let wallet = self.registry.lookup_by_name(owner)?;
        self.auth.challenge(wallet, SecretPrompt::Login, provider)?;
        Ok(wallet)
    }

    /// Authenticates `owner` and opens a session.
    pub fn login(
        &mut self,
        owner: &str,
        provider: &mut dyn SecretProvider,
    ) -> LedgerResult<Session> {
        let session = Session::for_wallet(self.authenticate(owner, provider)?);
        info!(owner, "logged in");
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Ledger Operations
    // -----------------------------------------------------------------------

    /// Swaps a voucher code for points. The receipt carries the new balance.
    pub fn redeem_voucher(
        &mut self,
        session: &Session,
        code: &str,
    ) -> LedgerResult<RedeemReceipt> {
        self.registry.lookup_by_name(&session.owner)?;
        let redemption = self.vouchers.redeem(code)?;

        let balance = match self
            .registry
            .get_mut(&session.owner)
            .and_then(|wallet| wallet.credit(redemption.value))
        {
            Ok(balance) => balance,
            Err(err) => {
                self.vouchers.unredeem(code);
                return Err(err);
            }
        };
        self.persist()?;

        info!(
            owner = %session.owner,
            code,
            issuer = %redemption.issuer,
            value = %redemption.value,
            balance = %balance,
            "voucher redeemed"
        );
        Ok(RedeemReceipt {
            owner: session.owner.clone(),
            code: redemption.code,
            issuer: redemption.issuer,
            value: redemption.value,
            balance,
        })
    }

    /// Moves `amount` from the session's wallet to `recipient`.
    ///
    /// The sender is asked for their secret again (through `provider`) after
    /// every other check has passed and before anything moves.
    pub fn transfer(
        &mut self,
        session: &Session,
        recipient: &Address,
        amount: Amount,
        provider: &mut dyn SecretProvider,
    ) -> LedgerResult<TransferReceipt> {
        let amount = amount.ensure_positive()?;

        let recipient_owner = self
            .registry
            .lookup_by_address(recipient)
            .map_err(|_| LedgerError::RecipientNotFound(*recipient))?
            .owner()
            .to_string();
        if recipient_owner == session.owner {
            return Err(LedgerError::SelfTransfer);
        }

        let sender = self.registry.lookup_by_name(&session.owner)?;
        if sender.balance() < amount {
            return Err(LedgerError::InsufficientBalance {
                owner: session.owner.clone(),
                available: sender.balance(),
                requested: amount,
            });
        }

        self.auth
            .challenge(sender, SecretPrompt::ConfirmTransfer, provider)?;

        let (from, to) = self.registry.pair_mut(&session.owner, &recipient_owner)?;
        if to.balance().checked_add(amount).is_none() {
            return Err(LedgerError::BalanceOverflow {
                owner: recipient_owner,
            });
        }
        let sender_balance = from.debit(amount)?;
        let recipient_balance = to.credit(amount)?;

        let receipt = TransferReceipt {
            id: Uuid::new_v4(),
            from: from.address(),
            to: to.address(),
            amount,
            sender_balance,
            recipient_balance,
            timestamp: Utc::now(),
        };
        self.persist()?;

        info!(
            id = %receipt.id,
            from = %receipt.from.short(),
            to = %receipt.to.short(),
            amount = %amount,
            "transfer complete"
        );
        Ok(receipt)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// Owner, address and balance of the session's wallet.
    pub fn details(&self, session: &Session) -> LedgerResult<WalletDetails> {
        Ok(self.registry.lookup_by_name(&session.owner)?.details())
    }

    pub fn lookup_by_name(&self, owner: &str) -> LedgerResult<&Wallet> {
        self.registry.lookup_by_name(owner)
    }

    pub fn lookup_by_address(&self, address: &Address) -> LedgerResult<&Wallet> {
        self.registry.lookup_by_address(address)
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Amount {
        self.registry.total_supply()
    }

    /// The voucher catalog with consumed flags.
    pub fn vouchers(&self) -> Vec<VoucherStatus> {
        self.vouchers.statuses()
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    pub fn voucher_ledger(&self) -> &VoucherLedger {
        &self.vouchers
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the exchange and returns its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            wallets: self.registry.snapshot(),
            redeemed_vouchers: self.vouchers.redeemed().clone(),
        }
    }

    fn persist(&mut self) -> LedgerResult<()> {
        let snapshot = self.snapshot();
        self.store.save(&snapshot).map_err(|err| {
            error!(error = %err, "state changed but could not be saved");
            LedgerError::PersistenceFailed(err)
        })
    }
}

impl<S: LedgerStore> fmt::Debug for Exchange<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("registry", &self.registry)
            .field("redeemed", &self.vouchers.redeemed().len())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ScriptedSecrets;
    use crate::storage::MemoryStore;
    use crate::voucher::VoucherError;

    fn open() -> (Exchange<MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        let exchange = Exchange::open(LedgerConfig::default(), store.clone()).unwrap();
        (exchange, store)
    }

    fn points(n: u32) -> Amount {
        Amount::from_points(n)
    }

    fn secrets(list: &[&str]) -> ScriptedSecrets {
        ScriptedSecrets::new(list.iter().copied())
    }

    #[test]
    fn create_wallet_persists_and_opens_session() {
        let (mut exchange, store) = open();
        let session = exchange.create_wallet("alice", "pw1").unwrap();

        assert_eq!(session.owner(), "alice");
        assert_eq!(store.save_count(), 1);
        assert!(store.snapshot().wallets.contains_key("alice"));
        assert_eq!(exchange.details(&session).unwrap().balance, Amount::ZERO);
    }

    #[test]
    fn login_checks_secret() {
        let (mut exchange, _) = open();
        exchange.create_wallet("alice", "pw1").unwrap();

        assert!(exchange.login("alice", &mut secrets(&["pw1"])).is_ok());
        assert!(matches!(
            exchange.login("alice", &mut secrets(&["a", "b", "c"])),
            Err(LedgerError::AuthFailed { .. })
        ));
        assert!(matches!(
            exchange.login("nobody", &mut secrets(&["pw1"])),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn redeem_credits_once_and_persists() {
        let (mut exchange, store) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();

        let receipt = exchange.redeem_voucher(&alice, "Amazon_Festive").unwrap();
        assert_eq!(receipt.owner, "alice");
        assert_eq!(receipt.issuer, "Amazon");
        assert_eq!(receipt.value, points(100));
        assert_eq!(receipt.balance, points(100));
        assert!(store.snapshot().redeemed_vouchers.contains("Amazon_Festive"));

        let err = exchange.redeem_voucher(&alice, "Amazon_Festive").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Voucher(VoucherError::AlreadyRedeemed { .. })
        ));
        assert!(matches!(
            exchange.redeem_voucher(&alice, "amazon_festive"),
            Err(LedgerError::Voucher(VoucherError::Invalid { .. }))
        ));
        assert_eq!(exchange.details(&alice).unwrap().balance, points(100));
    }

    #[test]
    fn transfer_moves_exact_amount() {
        let (mut exchange, _) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();
        let bob = exchange.create_wallet("bob", "pw2").unwrap();
        exchange.redeem_voucher(&alice, "Amazon_Festive").unwrap();

        let receipt = exchange
            .transfer(&alice, &bob.address(), points(40), &mut secrets(&["pw1"]))
            .unwrap();

        assert_eq!(receipt.from, alice.address());
        assert_eq!(receipt.to, bob.address());
        assert_eq!(receipt.sender_balance, points(60));
        assert_eq!(receipt.recipient_balance, points(40));
        assert_eq!(exchange.total_supply(), points(100));
    }

    #[test]
    fn transfer_checks_run_before_reauthentication() {
        let (mut exchange, _) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();
        let bob = exchange.create_wallet("bob", "pw2").unwrap();
        exchange.redeem_voucher(&alice, "Uber_Ride").unwrap();

        // None of these should ever reach the provider.
        let mut never = |_: SecretPrompt| -> Option<String> {
            panic!("re-authentication must not be reached")
        };

        assert!(matches!(
            exchange.transfer(&alice, &bob.address(), Amount::ZERO, &mut never),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            exchange.transfer(&alice, &Address::from_bytes([0; 20]), points(1), &mut never),
            Err(LedgerError::RecipientNotFound(_))
        ));
        assert!(matches!(
            exchange.transfer(&alice, &alice.address(), points(1), &mut never),
            Err(LedgerError::SelfTransfer)
        ));
        assert!(matches!(
            exchange.transfer(&alice, &bob.address(), points(1000), &mut never),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(exchange.details(&alice).unwrap().balance, points(25));
    }

    #[test]
    fn failed_reauthentication_moves_nothing() {
        let (mut exchange, store) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();
        let bob = exchange.create_wallet("bob", "pw2").unwrap();
        exchange.redeem_voucher(&alice, "Uber_Ride").unwrap();
        let saves = store.save_count();

        let result = exchange.transfer(&alice, &bob.address(), points(5), &mut secrets(&["pw2"]));
        assert!(matches!(result, Err(LedgerError::AuthFailed { .. })));
        assert_eq!(exchange.details(&alice).unwrap().balance, points(25));
        assert_eq!(exchange.details(&bob).unwrap().balance, Amount::ZERO);
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn failed_save_is_persistence_failed() {
        let (mut exchange, store) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();

        store.fail_next_save();
        let err = exchange.redeem_voucher(&alice, "Ola_Share").unwrap_err();
        assert!(matches!(err, LedgerError::PersistenceFailed(_)));
        assert!(err.is_fatal());
        // Memory moved on; the store did not.
        assert_eq!(exchange.details(&alice).unwrap().balance, points(20));
        assert!(store.snapshot().redeemed_vouchers.is_empty());
    }

    #[test]
    fn wallet_without_credential_sets_one_on_login() {
        let mut snapshot = LedgerSnapshot::default();
        snapshot.wallets.insert(
            "old".to_string(),
            Wallet::new("old", Address::from_bytes([5; 20])),
        );
        let store = MemoryStore::with_snapshot(snapshot);
        let mut exchange = Exchange::open(LedgerConfig::default(), store.clone()).unwrap();

        exchange
            .login("old", &mut secrets(&["new", "new", "new"]))
            .unwrap();
        assert!(store.snapshot().wallets["old"].has_credential());

        // Bootstrap happens once; afterwards only the exact secret works.
        assert!(exchange.login("old", &mut secrets(&["new"])).is_ok());
        assert!(exchange.login("old", &mut secrets(&["x", "y", "z"])).is_err());
    }

    #[test]
    fn restart_keeps_vouchers_consumed() {
        let (mut exchange, store) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();
        exchange.redeem_voucher(&alice, "Myntra_Fashion").unwrap();
        drop(exchange);

        let mut reopened = Exchange::open(LedgerConfig::default(), store).unwrap();
        let alice = reopened.login("alice", &mut secrets(&["pw1"])).unwrap();
        assert_eq!(reopened.details(&alice).unwrap().balance, points(60));
        assert!(matches!(
            reopened.redeem_voucher(&alice, "Myntra_Fashion"),
            Err(LedgerError::Voucher(VoucherError::AlreadyRedeemed { .. }))
        ));
    }

    #[test]
    fn receipt_display_uses_short_addresses() {
        let (mut exchange, _) = open();
        let alice = exchange.create_wallet("alice", "pw1").unwrap();
        let bob = exchange.create_wallet("bob", "pw2").unwrap();
        exchange.redeem_voucher(&alice, "Ola_Share").unwrap();
        let receipt = exchange
            .transfer(&alice, &bob.address(), points(5), &mut secrets(&["pw1"]))
            .unwrap();
        let line = receipt.to_string();
        assert!(line.contains("5.00 LYC"));
        assert!(line.contains(&alice.address().short()));
    }
}
